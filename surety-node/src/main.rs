use clap::Parser;
use surety_node::{
    api::rest::{start_rest_api, AppState},
    cli::Args,
    setup::{build_engine, crash_message, ensure_config, record_crash, spawn_event_logger},
};
use tracing::{error, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    std::panic::set_hook(Box::new(|info| {
        record_crash(&crash_message(info.payload(), info.location()), "panic.log");
    }));

    // Audit file: consensus decisions and every ledger transition.
    let log_filename = format!("logs/audit-{}.log", args.name);
    let file_appender = tracing_appender::rolling::never(".", log_filename);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let audit_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == "consensus" || metadata.target().starts_with("surety_ledger")
        }));

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,surety_node=debug".into()),
    );

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(stdout_layer)
        .init();

    info!("--- STARTING SURETY NODE {} ---", args.name);
    info!("Config: {}", args.config);

    let config = match ensure_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    let surety = build_engine(config)?;
    let _events = spawn_event_logger(&surety);

    let state = AppState { surety };
    if let Err(e) = start_rest_api(args.port, state).await {
        error!("REST API stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
