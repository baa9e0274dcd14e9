use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the Harvest API.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("API token cannot be used as a header value")]
    InvalidCredential,

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("{url} still rate limited after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Lookup failures while joining offers with candidates and scorecards.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollateError {
    #[error("offer {offer_id}: candidate {candidate_id} was not returned by the API")]
    CandidateNotFound { offer_id: u64, candidate_id: u64 },

    #[error("offer {offer_id}: candidate {candidate_id} has no application {application_id}")]
    ApplicationNotFound {
        offer_id: u64,
        candidate_id: u64,
        application_id: u64,
    },

    #[error("offer {offer_id}: no scorecards were fetched for application {application_id}")]
    MissingScorecards { offer_id: u64, application_id: u64 },
}
