use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

// ------------------------------------------------------------
// Report schema
// ------------------------------------------------------------
//
// One `CollatedRecord` per accepted offer. The report file is a
// JSON object keyed by offer id; serde_json writes the integer
// keys as strings.
//
// Field order here is the field order in the file.
//

/// Whole report, ordered by offer id.
pub type Report = BTreeMap<u64, CollatedRecord>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollatedRecord {
    /// "First Last"
    pub candidate_name: String,
    pub candidate_data: CandidateData,
    pub application_id: u64,
    pub application_data: ApplicationData,
    pub scorecards_data: Vec<FormattedScorecard>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandidateData {
    pub company: Option<String>,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub recruiter_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApplicationData {
    /// Public label of the application source
    pub source: Option<String>,
    pub credited_to: Option<String>,
    /// Job names, in API order
    pub jobs: Vec<Option<String>>,
    pub prospective_department: Option<Value>,
}

/// Fixed subset of a scorecard, with references flattened to names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormattedScorecard {
    pub created_at: Option<String>,
    pub interview: Option<String>,
    pub interview_step: Option<String>,
    pub submitted_by: Option<String>,
    pub interviewer: Option<String>,
    pub overall_recommendation: Option<String>,
    pub attributes: Value,
    pub ratings: Value,
    pub questions: Vec<QuestionAnswer>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionAnswer {
    pub question: Option<String>,
    pub answer: Option<String>,
}

// ------------------------------------------------------------
// Writer
// ------------------------------------------------------------

/// Serializes the whole report to `path` in one go.
///
/// Missing parent directories are created. An existing file is
/// replaced.
pub fn write_report(path: &Path, report: &Report) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, report)
        .with_context(|| format!("serializing report to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    Ok(())
}
