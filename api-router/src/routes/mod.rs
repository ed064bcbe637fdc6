pub mod ask;
pub mod initialize;
pub mod liveness;
pub mod service_info;
pub mod status;
