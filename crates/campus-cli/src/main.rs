//! campus - terminal front-end for the campus administration dashboard.
//!
//! Lists and creates records, prints the dashboard summary and tails the
//! live-update feed. Works against the campus API when it is reachable and
//! against local fallback data when it is not.

mod format;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use campus_core::{
    CampusServices, Collection, Config, FileStore, LiveChannel, Resource, ResourceKind,
    ResourceService, Transport,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// The acting user for writes. There is no login, so it is always the
/// placeholder account.
const ACTOR_ID: i64 = 1;

/// How long `watch` runs when `--seconds` is not given.
const DEFAULT_WATCH_SECS: u64 = 30;

/// Log file written under the data directory
const LOG_FILE: &str = "campus.log";

const USAGE: &str = "\
Usage: campus <command>

Commands:
  list <events|notices|lost|found|users>   Print a collection
  create <kind> <json>                     Create a record from JSON
  dashboard                                Print the dashboard summary
  watch [--seconds N]                      Tail the live-update feed
  seed                                     Seed the local fallback data";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and to `campus.log` in the data directory. The returned
/// guard flushes the file writer when dropped.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let data_dir = config.data_dir()?;
    let _guard = init_tracing(&data_dir);

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);
    info!(command = ?command, "campus starting");

    match command {
        Some("list") => {
            let kind = parse_kind(args.get(2))?;
            list(&config, kind).await
        }
        Some("create") => {
            let kind = parse_kind(args.get(2))?;
            let json = args
                .get(3)
                .ok_or_else(|| anyhow::anyhow!("create needs a JSON record\n\n{}", USAGE))?;
            create(&config, kind, json).await
        }
        Some("dashboard") => dashboard(&config).await,
        Some("watch") => {
            let seconds = parse_seconds(&args[2..])?;
            watch(&config, Duration::from_secs(seconds)).await
        }
        Some("seed") => seed(&config),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn parse_kind(arg: Option<&String>) -> Result<ResourceKind> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("missing resource kind\n\n{}", USAGE))?;
    arg.parse::<ResourceKind>().map_err(anyhow::Error::msg)
}

fn parse_seconds(args: &[String]) -> Result<u64> {
    match args {
        [] => Ok(DEFAULT_WATCH_SECS),
        [flag, value] if flag == "--seconds" => value
            .parse()
            .with_context(|| format!("invalid --seconds value: {}", value)),
        _ => bail!("unexpected arguments: {}\n\n{}", args.join(" "), USAGE),
    }
}

async fn fetch_collection<R: Resource>(service: &ResourceService<R, FileStore>) -> Result<Collection> {
    Ok(R::into_collection(service.fetch_all().await?))
}

async fn list(config: &Config, kind: ResourceKind) -> Result<()> {
    let services = CampusServices::from_config(config)?;
    let collection = match kind {
        ResourceKind::Events => fetch_collection(&services.events).await?,
        ResourceKind::Notices => fetch_collection(&services.notices).await?,
        ResourceKind::LostItems => fetch_collection(&services.lost_items).await?,
        ResourceKind::FoundItems => fetch_collection(&services.found_items).await?,
        ResourceKind::Users => fetch_collection(&services.users).await?,
    };

    println!("{} {}", collection.len(), kind);
    for row in format::collection_rows(&collection) {
        println!("{}", row);
    }
    Ok(())
}

async fn create_record<R: Resource>(
    service: &ResourceService<R, FileStore>,
    json: &str,
) -> Result<String> {
    let draft: R = serde_json::from_str(json)
        .with_context(|| format!("Invalid {} record", R::KIND))?;
    let created = service.create(draft, ACTOR_ID).await?;
    Ok(serde_json::to_string_pretty(&created)?)
}

async fn create(config: &Config, kind: ResourceKind, json: &str) -> Result<()> {
    let services = CampusServices::from_config(config)?;
    let created = match kind {
        ResourceKind::Events => create_record(&services.events, json).await?,
        ResourceKind::Notices => create_record(&services.notices, json).await?,
        ResourceKind::LostItems => create_record(&services.lost_items, json).await?,
        ResourceKind::FoundItems => create_record(&services.found_items, json).await?,
        ResourceKind::Users => create_record(&services.users, json).await?,
    };
    println!("{}", created);
    Ok(())
}

async fn dashboard(config: &Config) -> Result<()> {
    let services = CampusServices::from_config(config)?;
    let user = services.current_user();
    let summary = services.dashboard().await?;

    println!("Signed in as {} ({})", user.name, user.role);
    println!();
    for line in format::dashboard_lines(&summary) {
        println!("{}", line);
    }
    Ok(())
}

async fn watch(config: &Config, duration: Duration) -> Result<()> {
    let transport = Transport::from_config(config.live_url());
    let channel = LiveChannel::start(transport);
    let mut messages = channel.subscribe();

    if channel.is_push() {
        eprintln!("Listening for live updates for {}s (Ctrl+C to stop)", duration.as_secs());
    } else {
        eprintln!("No live URL configured, showing simulated updates for {}s", duration.as_secs());
    }

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            received = messages.recv() => match received {
                Ok(message) => println!("{}", format::format_message(&message)),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("({} updates skipped)", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    println!("{} unread", channel.unread_count());
    channel.shutdown().await;
    Ok(())
}

fn seed(config: &Config) -> Result<()> {
    let services = CampusServices::from_config(config)?;
    let store = services.store();
    store.init().context("Failed to seed fallback data")?;

    for kind in ResourceKind::ALL {
        let collection = store.list_kind(kind)?;
        println!("{:<12} {}", kind.display_name(), collection.len());
    }
    Ok(())
}
