// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// - config:    Command line and runtime configuration
// - schema:    Harvest API records
// - error:     Typed errors for the API and the join stage
// - harvest:   Authenticated, paginated Harvest API client
// - collector: Concurrent scorecard fetching
// - collate:   Joins offers, candidates and scorecards
// - report:    Report schema and file writer
// - metrics:   Run counters
//
mod collate;
mod collector;
mod config;
mod error;
mod harvest;
mod metrics;
mod report;
mod schema;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use collate::{candidates_with_multiple_offers, collate, index_candidates};
use collector::runner::collect_scorecards;
use config::{Cli, Config, ScorecardFailurePolicy};
use harvest::HarvestClient;
use metrics::RunMetrics;
use report::write_report;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Loads `.env`, initializes logging (RUST_LOG, default `info`),
// parses the command line and runs the report once.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_cli(Cli::parse())?;
    run(config).await
}

// ------------------------------------------------------------
// Report pipeline
// ------------------------------------------------------------
//
// 1. accepted offers (sequential pages)
// 2. scorecards per application (worker pool)
// 3. candidates (sequential, chunked by id)
// 4. collation
// 5. report file
//
async fn run(config: Config) -> anyhow::Result<()> {
    let metrics = Arc::new(RunMetrics::default());
    let client = Arc::new(
        HarvestClient::new(config.harvest.clone(), metrics.clone())
            .context("building Harvest client")?,
    );

    let offers = client
        .fetch_accepted_offers(config.report.start_date)
        .await
        .context("fetching accepted offers")?;
    info!("Found {} accepted offers", offers.len());

    let batch = collect_scorecards(
        client.clone(),
        &offers,
        config.collector.workers,
        &metrics,
    )
    .await;

    if !batch.failed.is_empty() {
        match config.collector.failure_policy {
            ScorecardFailurePolicy::Abort => {
                anyhow::bail!(
                    "scorecard fetch failed for {} application(s): {:?}",
                    batch.failed.len(),
                    batch.failed
                );
            }
            ScorecardFailurePolicy::Tolerate => {
                warn!(
                    "Scorecards missing for {} application(s); those offers are reported without scorecards",
                    batch.failed.len()
                );
            }
        }
    }

    let candidate_ids: Vec<u64> = offers.iter().map(|o| o.candidate_id).collect();
    let candidates = index_candidates(
        client
            .fetch_candidates(&candidate_ids)
            .await
            .context("fetching candidates")?,
    );
    info!(
        "Found scorecards for {} applications and {} candidates",
        batch.by_application.len(),
        candidates.len()
    );

    for (name, count) in candidates_with_multiple_offers(&offers, &candidates) {
        warn!("{name} has {count} offers");
    }

    let report = collate(
        &offers,
        &candidates,
        &batch.by_application,
        config.collector.failure_policy,
    )
    .context("collating offers")?;

    write_report(&config.report.output, &report)?;
    info!(
        "Wrote {} offers to {}",
        report.len(),
        config.report.output.display()
    );
    info!("{}", metrics.summary());

    Ok(())
}
