use pricelib::logging;
use pricelib::series::FileBackend;
use pricelib::Tracker;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Sleep granularity while waiting for the next tick, so SIGINT is noticed promptly
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Ensure the directory holding `path` exists
fn validate_output_directory(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::info!("Creating output directory at {}...", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    log::info!("Saving price history to {}...", path);
    Ok(())
}

async fn wait_for_next_tick(interval: Duration, running: &AtomicBool) {
    let mut waited = Duration::ZERO;
    while waited < interval && running.load(Ordering::SeqCst) {
        let step = POLL_INTERVAL.min(interval - waited);
        tokio::time::sleep(step).await;
        waited += step;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle SIGINT
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.json".to_string());

    // Read settings before the logger exists, the log path comes from them
    let settings = pricelib::util::read_settings(&settings_path).unwrap_or_else(|err| {
        eprintln!("Failed to read settings from {}: {}", settings_path, err);
        std::process::exit(1);
    });
    let using_defaults = settings.is_none();
    let settings = settings.unwrap_or_default();

    logging::configure_logger(&settings.log_path)?;
    if using_defaults {
        log::warn!("No settings file at {}, using defaults", settings_path);
    } else {
        log::info!("Loaded settings from {}", settings_path);
    }

    validate_output_directory(&settings.store_path)?;

    let mut tracker = Tracker::new(&settings, FileBackend::new(&settings.store_path))?;
    let interval = settings.refresh_interval();
    log::info!(
        "Tracking {} assets every {}s (auto refresh {})",
        pricelib::series::Asset::ALL.len(),
        interval.as_secs(),
        if settings.auto_refresh { "on" } else { "off" }
    );

    loop {
        let report = tracker.refresh().await;
        report.log_summary();

        if !settings.auto_refresh {
            break;
        }

        wait_for_next_tick(interval, &running).await;

        // Handle SIGINT elegantly
        if !running.load(Ordering::SeqCst) {
            log::info!("Received SIGINT, exiting...");
            break;
        }
    }

    Ok(())
}
