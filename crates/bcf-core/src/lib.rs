pub mod config;
pub mod logging;

pub mod control;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod proxy;
pub mod queue;
pub mod report;
pub mod retry;
pub mod status;
