use chrono::NaiveDate;

use super::client::HarvestClient;
use crate::error::HarvestError;
use crate::schema::Offer;

impl HarvestClient {
    /// All accepted offers starting after `start_date`, in API page order.
    pub async fn fetch_accepted_offers(&self, start_date: NaiveDate) -> Result<Vec<Offer>, HarvestError> {
        let filters = [
            ("starts_after", start_date.format("%Y-%m-%d").to_string()),
            ("status", "accepted".to_string()),
        ];

        self.fetch_all_pages("/offers", &filters, "accepted offers").await
    }
}

#[cfg(test)]
mod tests {
    use crate::harvest::client::tests::test_client;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn sends_date_and_status_filters() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/offers")
                .query_param("starts_after", "2023-07-01")
                .query_param("status", "accepted")
                .query_param("page", "1");
            then.status(200).json_body(json!([
                {"id": 1, "application_id": 10, "candidate_id": 100, "status": "accepted", "starts_at": "2023-08-01"},
                {"id": 2, "application_id": 20, "candidate_id": 200, "status": "accepted", "starts_at": "2023-09-01"}
            ]));
        });
        let last = server.mock(|when, then| {
            when.method(GET)
                .path("/offers")
                .query_param("starts_after", "2023-07-01")
                .query_param("page", "2");
            then.status(200).json_body(json!([]));
        });

        let client = test_client(&server);
        let offers = client
            .fetch_accepted_offers(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].id, 1);
        assert_eq!(offers[1].candidate_id, 200);
        first.assert();
        last.assert();
    }
}
