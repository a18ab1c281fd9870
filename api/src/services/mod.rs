pub mod degraded;
pub mod uploads;
