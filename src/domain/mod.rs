pub mod cmsv_payload;
pub mod equipment_status;
pub mod hierarchy;
pub mod links;
pub mod models;
pub mod server;
