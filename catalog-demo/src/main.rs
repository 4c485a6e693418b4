//! Catalog Demo Main Entry Point
//!
//! Runs the goods catalog demo against the store selected by `CATALOG_STORE`
//! and logs everything it reads back.

use catalog_demo::{run_demo, DemoError, Dependencies};
use dotenv::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_demo=info,catalog_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "catalog-demo",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "catalog-demo",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting catalog demo");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match run_demo(&deps.repository, deps.config.recreate_index).await {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => info!(report = %json, "Catalog demo completed successfully"),
                Err(e) => warn!(error = %e, "Catalog demo completed, report not serializable"),
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Catalog demo failed");
            Err(e)
        }
    }
}
