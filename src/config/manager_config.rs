//! Manager configuration derived from CLI arguments

use std::time::Duration;

use super::cli::CliArgs;
use super::retry::RetryPolicy;
use super::tls_config::TlsConfig;

/// Default port for Enterprise-style cluster deployments (OSS default is 6379)
pub const DEFAULT_PORT: u16 = 10000;

/// Connection target and behavior for one manager instance
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub hostname: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Database to SELECT. Ignored in cluster mode.
    pub dbnum: u32,
    pub socket_timeout: Duration,
    pub connect_timeout: Duration,
    pub cluster_mode: bool,
    pub retry: RetryPolicy,
}

impl ManagerConfig {
    /// Configuration with deployment-convention defaults: port 10000, TLS on,
    /// cluster mode on, 5 s timeouts, 3 attempts with 500 ms base backoff.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            tls: Some(TlsConfig::default()),
            dbnum: 0,
            socket_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            cluster_mode: true,
            retry: RetryPolicy::default(),
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        args.validate()?;

        let tls = if args.no_tls {
            None
        } else {
            Some(TlsConfig {
                skip_verify: args.tls_skip_verify,
                ca_cert: args.tls_ca_cert.clone(),
                client_cert: args.tls_cert.clone(),
                client_key: args.tls_key.clone(),
                sni: args.tls_sni.clone(),
            })
        };

        Ok(Self {
            hostname: args.host.clone(),
            port: args.port,
            tls,
            dbnum: args.dbnum,
            socket_timeout: Duration::from_millis(args.socket_timeout_ms),
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            cluster_mode: !args.no_cluster,
            retry: RetryPolicy::new(
                args.max_retries,
                Duration::from_millis(args.base_backoff_ms),
            ),
        })
    }
}
