pub mod orchestrator;
pub mod poller;

pub use orchestrator::{CycleReport, SignalPipeline};
pub use poller::run_signal_poller;
