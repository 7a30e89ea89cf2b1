//! Backfill binary - translates every event's missing locales once and exits
//!
//! Usage:
//!   cargo run --bin backfill             # Backfill all events
//!   cargo run --bin backfill -- 12 40    # Backfill only events 12 and 40
//!
//! Required environment variables:
//! - TRANSLATION_PROVIDER (google)
//! - TRANSLATION_API_KEY
//!
//! Optional:
//! - DATABASE_URL (without it there is nothing to backfill)
//! - SUPPORTED_LOCALES (defaults to en,ar,ku)
//! - GLOSSARY_PATH (defaults to the built-in glossary)
//!
//! Exits non-zero when any event is left incomplete, so it can be rerun
//! from cron until it succeeds.

use anyhow::{bail, Context, Result};
use event_localization::{config::Config, db::EventId, pipeline::LocalizationPipeline};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_localization=info".parse()?)
                .add_directive("backfill=info".parse()?),
        )
        .init();

    let ids: Vec<EventId> = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse()
                .with_context(|| format!("Invalid event id '{}'", arg))
        })
        .collect::<Result<_>>()?;

    let config = Config::from_env()?;
    if !config.provider_enabled() {
        bail!("Backfill needs TRANSLATION_PROVIDER and TRANSLATION_API_KEY");
    }

    let pipeline = LocalizationPipeline::from_config(&config).await?;

    let events = if ids.is_empty() {
        pipeline.list_events().await?
    } else {
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            match pipeline.get_event(id).await? {
                Some(event) => events.push(event),
                None => warn!("Event {} does not exist, skipping", id),
            }
        }
        events
    };

    info!("Backfilling {} events", events.len());

    let incomplete = pipeline.backfill_events(&events).await;

    let metrics = pipeline.metrics().report();
    info!(
        "Done: {} locales written, {} untranslated, {} failed to store",
        metrics.backfill_written, metrics.backfill_untranslated, metrics.backfill_persist_failures
    );

    if !incomplete.is_empty() {
        bail!("{} events still missing locales: {:?}", incomplete.len(), incomplete);
    }
    Ok(())
}
