mod config;
mod error;
mod logging;
pub mod poller;
pub mod render;
pub mod runtime;

pub use config::AppConfig;
pub use error::AppError;

use runtime::Command;

pub fn run() -> Result<(), AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    let config = bootstrap()?;

    runtime::run(config, command)
}

pub fn run_alarm_watch() -> Result<(), AppError> {
    let config = bootstrap()?;

    runtime::run_watch(config)
}

fn bootstrap() -> Result<AppConfig, AppError> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let config = AppConfig::from_env()?;

    tracing::info!(
        server_url = %config.server.server_url,
        api_port = config.server.api_port,
        device_filter = %config.device_filter,
        coordinate_system = config.coordinate_system.label(),
        poll_interval_ms = config.poll_interval_ms,
        alarm_log_path = %config.alarm_log_path,
        "application bootstrap initialized"
    );

    Ok(config)
}
