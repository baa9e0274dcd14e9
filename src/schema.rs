use serde::Deserialize;
use serde_json::Value;

// ------------------------------------------------------------
// Harvest API records
// ------------------------------------------------------------
//
// Only the fields used by the report are modelled; everything
// else in the API payloads is ignored by serde.
//
// Nested objects the API may omit, send as `null`, or send
// without a `name` are `Option`s with `#[serde(default)]`, so
// a missing value becomes `None` instead of a decode error.
//

/// An accepted offer (`GET /offers`).
#[derive(Debug, Clone, Deserialize)]
pub struct Offer {
    pub id: u64,
    pub application_id: u64,
    pub candidate_id: u64,

    /// Not part of the report.
    #[allow(dead_code)]
    #[serde(default)]
    pub starts_at: Option<String>,

    #[allow(dead_code)]
    #[serde(default)]
    pub status: Option<String>,
}

/// A person-like or step-like reference that carries a display name.
///
/// Used for `recruiter`, `credited_to`, `interviewer`,
/// `submitted_by` and `interview_step`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Resolves an optional reference to its name, `None` when either
/// the reference or its name is absent.
pub fn name_of(named: &Option<NamedRef>) -> Option<String> {
    named.as_ref().and_then(|n| n.name.clone())
}

/// Candidate record (`GET /candidates`).
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub id: u64,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub company: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub recruiter: Option<NamedRef>,

    #[serde(default)]
    pub applications: Vec<Application>,
}

impl Candidate {
    /// "First Last", as shown in the report and in log lines.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// First application with the given id.
    pub fn application(&self, application_id: u64) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == application_id)
    }
}

/// One application nested inside a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: u64,

    #[serde(default)]
    pub source: Option<Source>,

    #[serde(default)]
    pub credited_to: Option<NamedRef>,

    #[serde(default)]
    pub jobs: Vec<NamedRef>,

    /// Passed through untouched; shape varies between accounts.
    #[serde(default)]
    pub prospective_department: Option<Value>,
}

/// Application source. Only the public label is reported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub public_name: Option<String>,
}

/// Interview scorecard (`GET /applications/{id}/scorecards`).
#[derive(Debug, Clone, Deserialize)]
pub struct Scorecard {
    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub interview: Option<String>,

    #[serde(default)]
    pub interview_step: Option<NamedRef>,

    #[serde(default)]
    pub submitted_by: Option<NamedRef>,

    #[serde(default)]
    pub interviewer: Option<NamedRef>,

    #[serde(default)]
    pub overall_recommendation: Option<String>,

    #[serde(default)]
    pub attributes: Value,

    #[serde(default)]
    pub ratings: Value,

    /// Kept in API order.
    #[serde(default)]
    pub questions: Vec<ScorecardQuestion>,
}

/// One question on a scorecard. Extra fields (ids etc.) are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorecardQuestion {
    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candidate_tolerates_missing_and_null_references() {
        let c: Candidate = serde_json::from_value(json!({
            "id": 7,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "company": null,
            "recruiter": {"id": 3},
            "applications": [
                {"id": 70, "credited_to": null, "source": {"id": 1}, "jobs": []}
            ]
        }))
        .unwrap();

        assert_eq!(c.full_name(), "Ada Lovelace");
        assert_eq!(name_of(&c.recruiter), None);
        assert!(c.title.is_none());

        let app = c.application(70).unwrap();
        assert!(app.credited_to.is_none());
        assert!(app.source.as_ref().unwrap().public_name.is_none());
        assert!(app.prospective_department.is_none());
        assert!(c.application(71).is_none());
    }

    #[test]
    fn application_lookup_returns_first_match() {
        let c: Candidate = serde_json::from_value(json!({
            "id": 1,
            "first_name": "A",
            "last_name": "B",
            "applications": [
                {"id": 5, "jobs": [{"name": "first"}]},
                {"id": 5, "jobs": [{"name": "second"}]}
            ]
        }))
        .unwrap();

        let app = c.application(5).unwrap();
        assert_eq!(app.jobs[0].name.as_deref(), Some("first"));
    }

    #[test]
    fn offer_ignores_unknown_fields() {
        let o: Offer = serde_json::from_value(json!({
            "id": 1,
            "application_id": 2,
            "candidate_id": 3,
            "status": "accepted",
            "custom_fields": {"salary": 1}
        }))
        .unwrap();

        assert_eq!(o.status.as_deref(), Some("accepted"));
        assert!(o.starts_at.is_none());
    }
}
