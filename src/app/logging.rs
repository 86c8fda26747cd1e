use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

/// HTTP client internals stay quiet unless `RUST_LOG` asks for them.
const DEFAULT_DIRECTIVES: &str = "info,reqwest=warn,hyper_util=warn,rustls=warn";

/// Logs go to stderr so command reports on stdout can be piped.
pub fn init() -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::logging_init)
}
