use thiserror::Error;

use crate::adapters::cmsv_api::ApiError;
use crate::adapters::http_transport::TransportError;
use crate::app::poller::PollerError;
use crate::domain::hierarchy::HierarchyCycleError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyCycleError),
    #[error(transparent)]
    Poller(#[from] PollerError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }

    pub fn usage<E: std::fmt::Display>(error: E) -> Self {
        Self::Usage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use crate::domain::hierarchy::HierarchyCycleError;

    #[test]
    fn maps_logging_init_error_message() {
        let err = AppError::logging_init("subscriber already set");
        assert_eq!(
            err.to_string(),
            "failed to initialize logging: subscriber already set"
        );
    }

    #[test]
    fn hierarchy_errors_pass_through_unchanged() {
        let err = AppError::from(HierarchyCycleError { company_id: 9 });
        assert_eq!(
            err.to_string(),
            "company hierarchy contains a parent cycle through company 9"
        );
    }
}
