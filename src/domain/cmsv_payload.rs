use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::models::{
    Alarm, AlarmPage, Company, Device, Pagination, Session, Vehicle, VehicleInfo, null_default,
};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("result code {code}")]
    ResultCode { code: i64 },
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    result: i64,
    #[serde(default, deserialize_with = "null_default")]
    jsession: String,
}

#[derive(Debug, Deserialize)]
struct DeviceStatusResponse {
    result: i64,
    #[serde(default, deserialize_with = "null_default")]
    onlines: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct VehicleResponse {
    result: i64,
    #[serde(rename = "companys", default, deserialize_with = "null_default")]
    companies: Vec<Company>,
    #[serde(default, deserialize_with = "null_default")]
    vehicles: Vec<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct AlarmResponse {
    result: i64,
    #[serde(rename = "alarmlist", default, deserialize_with = "null_default")]
    alarms: Vec<Alarm>,
    #[serde(default, deserialize_with = "null_default")]
    pagination: Pagination,
}

trait ResultCode {
    fn result(&self) -> i64;
}

macro_rules! impl_result_code {
    ($($ty:ty),+) => {
        $(impl ResultCode for $ty {
            fn result(&self) -> i64 {
                self.result
            }
        })+
    };
}

impl_result_code!(
    LoginResponse,
    DeviceStatusResponse,
    VehicleResponse,
    AlarmResponse
);

fn decode_checked<T>(body: &[u8]) -> Result<T, PayloadError>
where
    T: DeserializeOwned + ResultCode,
{
    let response: T = serde_json::from_slice(body)?;
    match response.result() {
        0 => Ok(response),
        code => Err(PayloadError::ResultCode { code }),
    }
}

pub fn parse_login(body: &[u8]) -> Result<Session, PayloadError> {
    let response: LoginResponse = decode_checked(body)?;
    Ok(Session::new(response.jsession))
}

pub fn parse_device_status(body: &[u8]) -> Result<Vec<Device>, PayloadError> {
    let response: DeviceStatusResponse = decode_checked(body)?;
    Ok(response.onlines)
}

pub fn parse_vehicle_info(body: &[u8]) -> Result<VehicleInfo, PayloadError> {
    let response: VehicleResponse = decode_checked(body)?;
    Ok(VehicleInfo {
        companies: response.companies,
        vehicles: response.vehicles,
    })
}

pub fn parse_alarms(body: &[u8]) -> Result<AlarmPage, PayloadError> {
    let response: AlarmResponse = decode_checked(body)?;
    Ok(AlarmPage {
        alarms: response.alarms,
        pagination: response.pagination,
    })
}
