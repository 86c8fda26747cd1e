use reqwest::Url;
use thiserror::Error;

use crate::adapters::http_transport::{
    FallbackTransport, Fetched, HttpFetcher, ReqwestFetcher, TransportError,
};
use crate::domain::cmsv_payload::{
    PayloadError, parse_alarms, parse_device_status, parse_login, parse_vehicle_info,
};
use crate::domain::models::{AlarmPage, CoordinateSystem, Device, Session, VehicleInfo};
use crate::domain::server::ServerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    DeviceStatus,
    VehicleInfo,
    Alarms,
}

impl Action {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "StandardApiAction_login.action",
            Self::DeviceStatus => "StandardApiAction_getDeviceOlStatus.action",
            Self::VehicleInfo => "StandardApiAction_queryUserVehicle.action",
            Self::Alarms => "StandardApiAction_vehicleAlarm.action",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::DeviceStatus => "device status",
            Self::VehicleInfo => "vehicle info",
            Self::Alarms => "vehicle alarms",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request URL for {action}: {message}")]
    InvalidUrl {
        action: &'static str,
        message: String,
    },
    #[error("{action} request failed: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("{action} returned a malformed response: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{action} failed (result code {code})")]
    Result { action: &'static str, code: i64 },
    #[error("authentication failed: {0}")]
    Auth(#[source] Box<ApiError>),
}

impl ApiError {
    /// Platform result code, when the failure was reported by the API itself.
    pub fn result_code(&self) -> Option<i64> {
        match self {
            Self::Result { code, .. } => Some(*code),
            Self::Auth(inner) => inner.result_code(),
            _ => None,
        }
    }

    fn from_payload(action: Action, error: PayloadError) -> Self {
        match error {
            PayloadError::Json(source) => Self::Decode {
                action: action.name(),
                source,
            },
            PayloadError::ResultCode { code } => Self::Result {
                action: action.name(),
                code,
            },
        }
    }
}

/// Authenticated access to the platform's `StandardApiAction_*` endpoints.
#[derive(Debug, Clone)]
pub struct SessionClient<F = ReqwestFetcher> {
    server: ServerConfig,
    transport: FallbackTransport<F>,
}

impl SessionClient<ReqwestFetcher> {
    pub fn connect(server: ServerConfig) -> Result<Self, TransportError> {
        Ok(Self::new(server, ReqwestFetcher::new()?))
    }
}

impl<F> SessionClient<F>
where
    F: HttpFetcher,
{
    pub fn new(server: ServerConfig, fetcher: F) -> Self {
        Self {
            server,
            transport: FallbackTransport::new(fetcher),
        }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn login(&self, account: &str, password: &str) -> Result<Fetched<Session>, ApiError> {
        self.call(
            Action::Login,
            &[("account", account), ("password", password)],
            parse_login,
        )
        .map_err(|error| ApiError::Auth(Box::new(error)))
    }

    pub fn list_devices(&self, session: &Session) -> Result<Fetched<Vec<Device>>, ApiError> {
        self.call(
            Action::DeviceStatus,
            &[("jsession", session.as_str())],
            parse_device_status,
        )
    }

    pub fn vehicle_info(&self, session: &Session) -> Result<Fetched<VehicleInfo>, ApiError> {
        self.call(
            Action::VehicleInfo,
            &[("jsession", session.as_str())],
            parse_vehicle_info,
        )
    }

    /// An empty `device_id` queries every device on the account.
    pub fn alarms(
        &self,
        session: &Session,
        device_id: &str,
        coordinates: CoordinateSystem,
    ) -> Result<Fetched<AlarmPage>, ApiError> {
        let to_map = coordinates.code().to_string();
        self.call(
            Action::Alarms,
            &[
                ("jsession", session.as_str()),
                ("DevIDNO", device_id),
                ("toMap", to_map.as_str()),
            ],
            parse_alarms,
        )
    }

    fn call<T>(
        &self,
        action: Action,
        params: &[(&str, &str)],
        parse: fn(&[u8]) -> Result<T, PayloadError>,
    ) -> Result<Fetched<T>, ApiError> {
        let url = Url::parse_with_params(&self.server.action_url(action.path()), params)
            .map_err(|error| ApiError::InvalidUrl {
                action: action.name(),
                message: error.to_string(),
            })?;

        tracing::debug!(action = action.name(), "calling platform API");

        let fetched = self
            .transport
            .get(url.as_str())
            .map_err(|source| ApiError::Transport {
                action: action.name(),
                source,
            })?;

        let trust = fetched.trust;
        let value = parse(&fetched.value).map_err(|error| {
            let error = ApiError::from_payload(action, error);
            tracing::debug!(action = action.name(), error = %error, "platform API call rejected");
            error
        })?;

        Ok(Fetched { value, trust })
    }
}
