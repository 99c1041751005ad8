//! Configuration module

pub mod cli;
pub mod credential;
pub mod manager_config;
pub mod retry;
pub mod tls_config;

pub use cli::{CliArgs, Command};
pub use credential::Credential;
pub use manager_config::{ManagerConfig, DEFAULT_PORT};
pub use retry::RetryPolicy;
pub use tls_config::TlsConfig;
