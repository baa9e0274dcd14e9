use super::client::HarvestClient;
use crate::error::HarvestError;
use crate::schema::Candidate;

/// Splits candidate ids into comma-separated `candidate_ids` filter values.
///
/// Ids are kept as given, duplicates included. Yields
/// `ceil(len / chunk_size)` chunks; an empty input yields none.
pub fn chunk_candidate_ids(ids: &[u64], chunk_size: usize) -> Vec<String> {
    ids.chunks(chunk_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect()
}

impl HarvestClient {
    /// Fetches candidates for `ids`, one paginated walk per chunk.
    ///
    /// Results are concatenated across chunks without dedup; callers
    /// key them by candidate id.
    pub async fn fetch_candidates(&self, ids: &[u64]) -> Result<Vec<Candidate>, HarvestError> {
        let chunks = chunk_candidate_ids(ids, self.config().candidate_chunk_size);
        let mut candidates = Vec::new();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let filters = [
                ("skip_count", "true".to_string()),
                ("candidate_ids", chunk),
            ];
            let label = format!("candidates (chunk {})", i + 1);

            let batch: Vec<Candidate> = self.fetch_all_pages("/candidates", &filters, &label).await?;
            candidates.extend(batch);
        }

        Ok(candidates)
    }
}
