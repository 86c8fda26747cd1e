use crate::app::AppError;
use crate::domain::models::CoordinateSystem;
use crate::domain::server::{
    DEFAULT_API_PORT, DEFAULT_HLS_PORT, DEFAULT_RTMP_PORT, DEFAULT_RTSP_PORT, DEFAULT_SERVER_URL,
    ServerConfig,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub account: Option<String>,
    pub password: Option<String>,
    pub device_filter: String,
    pub coordinate_system: CoordinateSystem,
    pub poll_interval_ms: u64,
    pub alarm_log_path: String,
    pub export_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_interval_ms = parse_or_default(&lookup, "ALARM_POLL_INTERVAL_MS", 5000_u64)?;
        if poll_interval_ms == 0 {
            return Err(AppError::config("ALARM_POLL_INTERVAL_MS must be greater than zero"));
        }

        let coordinate_code = parse_or_default(&lookup, "CMSV_COORD_SYSTEM", 0_u8)?;
        if coordinate_code > 2 {
            return Err(AppError::config("CMSV_COORD_SYSTEM must be 0, 1 or 2"));
        }

        Ok(Self {
            server: ServerConfig {
                server_url: non_empty(&lookup, "CMSV_SERVER_URL")
                    .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
                api_port: parse_or_default(&lookup, "CMSV_API_PORT", DEFAULT_API_PORT)?,
                rtmp_port: parse_or_default(&lookup, "CMSV_RTMP_PORT", DEFAULT_RTMP_PORT)?,
                rtsp_port: parse_or_default(&lookup, "CMSV_RTSP_PORT", DEFAULT_RTSP_PORT)?,
                hls_port: parse_or_default(&lookup, "CMSV_HLS_PORT", DEFAULT_HLS_PORT)?,
            },
            account: non_empty(&lookup, "CMSV_ACCOUNT"),
            password: non_empty(&lookup, "CMSV_PASSWORD"),
            device_filter: non_empty(&lookup, "CMSV_DEVICE").unwrap_or_default(),
            coordinate_system: CoordinateSystem::from_code(coordinate_code),
            poll_interval_ms,
            alarm_log_path: non_empty(&lookup, "ALARM_LOG_PATH")
                .unwrap_or_else(|| "alarms.log".to_string()),
            export_dir: non_empty(&lookup, "EXPORT_DIR").unwrap_or_else(|| ".".to_string()),
        })
    }

    pub fn credentials(&self) -> Result<(&str, &str), AppError> {
        let account = self
            .account
            .as_deref()
            .ok_or_else(|| AppError::config("CMSV_ACCOUNT is required"))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| AppError::config("CMSV_PASSWORD is required"))?;
        Ok((account, password))
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
