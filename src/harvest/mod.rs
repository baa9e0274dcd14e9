//! Greenhouse Harvest API access
//!
//! - `client`:     authenticated HTTP wrapper and pagination
//! - `offers`:     accepted offers after a start date
//! - `candidates`: candidate records, fetched in id chunks
//! - `scorecards`: per-application scorecards with 429 handling

pub mod candidates;
pub mod client;
pub mod offers;
pub mod scorecards;

pub use client::HarvestClient;
