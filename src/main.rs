use chrono::Utc;
use pma_core::config::CoreConfig;
use pma_core::constants::DEFAULT_DATA_DIR;
use pma_core::patient::elapsed_label;
use pma_core::registry::TriageRegistry;
use pma_core::store::FileStore;
use pma_core::ActorName;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Roster watch for the advanced medical post.
///
/// Periodically reloads the persisted roster and reprints it with up-to-date
/// elapsed-time labels. The refresh task is display-only: it reads the
/// current time and the store, and never mutates patient records or
/// checklist state. Cancel with Ctrl-C.
///
/// # Environment Variables
/// - `PMA_DATA_DIR`: data directory for the post's store (default: "/pma_data")
/// - `PMA_REFRESH_SECS`: refresh interval in seconds (default: 60)
/// - `PMA_ACTOR`: operator display name (default: "Duty officer")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("pma=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("PMA_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let refresh_secs: u64 = std::env::var("PMA_REFRESH_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    let actor = ActorName::new(
        std::env::var("PMA_ACTOR").unwrap_or_else(|_| "Duty officer".to_string()),
    )?;
    let config = CoreConfig::new(PathBuf::from(data_dir), None)?;

    tracing::info!(
        data_dir = %config.data_dir().display(),
        refresh_secs,
        "roster watch started; Ctrl-C to stop"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(refresh_secs.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("roster watch cancelled");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = print_roster(&config, &actor) {
                    tracing::warn!("roster refresh failed: {e}");
                }
            }
        }
    }

    Ok(())
}

/// Reloads and prints the roster with elapsed-time labels.
fn print_roster(config: &CoreConfig, actor: &ActorName) -> anyhow::Result<()> {
    let store = FileStore::open(config.data_dir())?;
    let registry = TriageRegistry::open(&store, actor.clone())?;
    let now = Utc::now();

    let records = registry.list(None, None);
    println!(
        "-- {} patient(s) at {} --",
        records.len(),
        now.format("%H:%M:%S")
    );
    for record in records {
        println!(
            "{:<4} {:<6} {:<24} {:>8}",
            record.triage_status.code(),
            record
                .bib_number
                .as_ref()
                .map(|b| b.as_str())
                .unwrap_or("-"),
            record.display_name(),
            elapsed_label(record.admitted_at, now),
        );
    }

    Ok(())
}
