//! Workloads driven through the failover manager

pub mod continuous;

pub use continuous::{run_soak, SoakConfig, SoakStats};
