use std::{any::Any, panic::Location, path::Path, sync::Arc};

use surety_common::{error::Result, SuretyConfig};
use surety_ledger::Surety;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{error, info, warn};

/// Writes a default config to `path` if none exists, then loads it.
pub fn ensure_config(path: &str) -> Result<SuretyConfig> {
    if !Path::new(path).exists() {
        info!("⚠️ Config not found. Writing defaults to {}...", path);
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        SuretyConfig::default().save_to_file(path)?;
        info!("✅ Config generated");
    }
    SuretyConfig::load_from_file(path)
}

pub fn build_engine(config: SuretyConfig) -> Result<Arc<Surety>> {
    Ok(Arc::new(Surety::new(config)?))
}

/// Mirrors every committed engine event into the log until the engine is dropped.
pub fn spawn_event_logger(surety: &Surety) -> JoinHandle<()> {
    let mut events = surety.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!("📣 {} {}", event.name(), json),
                    Err(e) => warn!("Failed to encode {}: {}", event.name(), e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// One-line crash description from a panic payload and its location.
pub fn crash_message(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    let msg = match payload.downcast_ref::<&'static str>() {
        Some(s) => *s,
        None => match payload.downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<Any>",
        },
    };
    let location = match location {
        Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
        None => "unknown location".to_string(),
    };
    format!("CRASH: {} {}", msg, location)
}

/// Sends a crash to stderr, the tracing subscribers and the file at `path`.
pub fn record_crash(message: &str, path: impl AsRef<Path>) {
    eprintln!("{}", message);
    error!(target: "surety_node::panic", "💥 {}", message);
    let _ = std::fs::write(path, format!("{}\n", message));
}
