//! MASLD risk service entrypoint: one JSON request per stdin line, one JSON response per stdout line.
//! The model manifest and the classifier file it names are optionally polled for changes and hot-swapped.

use masld_risk::{
    config::ServiceConfig,
    logging::StructuredLogger,
    model::ModelSlot,
    service::PredictionService,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn fingerprint(slot: &ModelSlot) -> Vec<Option<SystemTime>> {
    slot.watched_paths().iter().map(|p| modified_at(p)).collect()
}

/// Poll the bundle mtimes and reload on change. Runs for the life of the process.
fn spawn_reload_watcher(slot: Arc<ModelSlot>, interval_secs: u64) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("model-reload".to_string())
        .spawn(move || {
            let mut last_seen = fingerprint(&slot);
            loop {
                std::thread::sleep(Duration::from_secs(interval_secs));
                let current = fingerprint(&slot);
                if current.first().copied().flatten().is_some() && current != last_seen {
                    last_seen = current;
                    if let Err(e) = slot.reload() {
                        warn!(error = %e, "scheduled reload failed");
                    }
                }
            }
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("MASLD_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = ServiceConfig::load(&config_path)?;

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(model_path = ?config.model_path, "MASLD risk service starting");

    // An unavailable model is not fatal: every request is answered with a model error instead.
    let slot = Arc::new(ModelSlot::open(&config.model_path));

    if config.reload_interval_secs > 0 {
        info!(interval_secs = config.reload_interval_secs, "model reload watcher enabled");
        spawn_reload_watcher(Arc::clone(&slot), config.reload_interval_secs)?;
    }

    let service = PredictionService::new(slot, config.input.clone(), config.log.audit);

    let served = service.serve(std::io::stdin().lock(), std::io::stdout().lock())?;

    info!(served, "MASLD risk service stopping");
    Ok(())
}
