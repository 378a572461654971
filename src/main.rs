use std::process::ExitCode;

use sales_api::config::load_config;
use sales_api::lifecycle::startup;
use sales_api::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(Some(config)) => config,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.log.format) {
        eprintln!("error: initializing logging: {e}");
        return ExitCode::FAILURE;
    }

    let metrics = match metrics::install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics recorder");
            return ExitCode::FAILURE;
        }
    };

    match startup::run(&config, metrics).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Service failed");
            ExitCode::FAILURE
        }
    }
}
