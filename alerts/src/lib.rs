pub mod config;
pub mod db;
pub mod market;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod signal_state;
pub mod subscription;

pub mod error;
