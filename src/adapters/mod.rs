pub mod alarm_log;
pub mod cmsv_api;
pub mod http_transport;
pub mod link_export;
