use std::fmt;

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing key.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Opaque `jsession` token returned by login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Session").field(&"<redacted>").finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    #[default]
    Wgs84,
    Gcj02,
    Bd09,
    Other(u8),
}

impl CoordinateSystem {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Wgs84,
            1 => Self::Gcj02,
            2 => Self::Bd09,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Wgs84 => 0,
            Self::Gcj02 => 1,
            Self::Bd09 => 2,
            Self::Other(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS84",
            Self::Gcj02 => "GCJ-02 (Google)",
            Self::Bd09 => "BD09 (Baidu)",
            Self::Other(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    #[serde(rename = "vid", default, deserialize_with = "null_default")]
    pub vehicle_id: String,
    #[serde(rename = "did", default, deserialize_with = "null_default")]
    pub device_id: String,
}

impl Device {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.vehicle_id, self.device_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Company {
    pub id: i64,
    #[serde(rename = "nm", default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "pId", default, deserialize_with = "null_default")]
    pub parent_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VehicleDevice {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(rename = "cc", default, deserialize_with = "null_default")]
    pub channels: i64,
    #[serde(rename = "cn", default, deserialize_with = "null_default")]
    pub channel_names: String,
    #[serde(default, deserialize_with = "null_default")]
    pub sim: String,
    #[serde(rename = "ist", default, deserialize_with = "null_default")]
    pub install_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    #[serde(rename = "nm", default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "pid", default, deserialize_with = "null_default")]
    pub company_id: i64,
    #[serde(rename = "pnm", default, deserialize_with = "null_default")]
    pub company_name: String,
    #[serde(rename = "dl", default, deserialize_with = "null_default")]
    pub devices: Vec<VehicleDevice>,
    #[serde(rename = "vehiType", default, deserialize_with = "null_default")]
    pub vehicle_type: String,
    #[serde(rename = "vehiColor", default, deserialize_with = "null_default")]
    pub color: String,
    #[serde(rename = "vehiBand", default, deserialize_with = "null_default")]
    pub brand: String,
    #[serde(rename = "ownerName", default, deserialize_with = "null_default")]
    pub owner_name: String,
    #[serde(rename = "engineNum", default, deserialize_with = "null_default")]
    pub engine_number: String,
    #[serde(rename = "frameNum", default, deserialize_with = "null_default")]
    pub frame_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VehicleInfo {
    pub companies: Vec<Company>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AlarmGps {
    #[serde(default, deserialize_with = "null_default")]
    pub dct: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub gd: i64,
    #[serde(rename = "gt", default, deserialize_with = "null_default")]
    pub gps_time: String,
    #[serde(rename = "hx", default, deserialize_with = "null_default")]
    pub heading: i64,
    #[serde(rename = "lat", default, deserialize_with = "null_default")]
    pub raw_latitude: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub lc: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub lid: i64,
    #[serde(rename = "lng", default, deserialize_with = "null_default")]
    pub raw_longitude: i64,
    #[serde(rename = "mlat", default, deserialize_with = "null_default")]
    pub mapped_latitude: String,
    #[serde(rename = "mlng", default, deserialize_with = "null_default")]
    pub mapped_longitude: String,
    #[serde(rename = "sp", default, deserialize_with = "null_default")]
    pub raw_speed: i64,
}

impl AlarmGps {
    /// A fix is only reported when both raw coordinates are non-zero.
    pub fn has_fix(&self) -> bool {
        self.raw_latitude != 0 && self.raw_longitude != 0
    }

    pub fn latitude(&self) -> f64 {
        self.raw_latitude as f64 / 1_000_000.0
    }

    pub fn longitude(&self) -> f64 {
        self.raw_longitude as f64 / 1_000_000.0
    }

    pub fn speed_kmh(&self) -> f64 {
        self.raw_speed as f64 / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Alarm {
    #[serde(rename = "DevIDNO", default, deserialize_with = "null_default")]
    pub device_id: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub guid: String,
    #[serde(rename = "hd", default, deserialize_with = "null_default")]
    pub handled: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub img: String,
    #[serde(default, deserialize_with = "null_default")]
    pub info: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub p1: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub p2: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub p3: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub p4: i64,
    #[serde(rename = "srcTm", default, deserialize_with = "null_default")]
    pub source_time: String,
    #[serde(rename = "stType", default, deserialize_with = "null_default")]
    pub start_type: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub time: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub alarm_type: i64,
    #[serde(rename = "Gps", default, deserialize_with = "null_default")]
    pub gps: AlarmGps,
}

impl Alarm {
    pub fn is_processed(&self) -> bool {
        self.handled == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "null_default")]
    pub total_pages: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub current_page: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub page_records: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_records: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlarmPage {
    pub alarms: Vec<Alarm>,
    pub pagination: Pagination,
}
