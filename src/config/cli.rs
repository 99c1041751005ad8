//! Command-line argument parsing
//!
//! Connection flags mirror the store's own CLI tooling; the operation to run
//! is a subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Credential-failover connection manager for clustered Valkey/Redis
#[derive(Parser, Debug, Clone)]
#[command(name = "valkey-key-rotation")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Connection Options =====
    /// Server hostname
    #[arg(long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port (Enterprise-style cluster endpoints listen on 10000)
    #[arg(short = 'p', long = "port", default_value_t = 10000)]
    pub port: u16,

    /// Primary access key
    #[arg(long = "primary-key", env = "VALKEY_PRIMARY_KEY")]
    pub primary_key: String,

    /// Secondary access key
    #[arg(long = "secondary-key", env = "VALKEY_SECONDARY_KEY")]
    pub secondary_key: String,

    /// Database number to SELECT (ignored in cluster mode)
    #[arg(long = "dbnum", default_value_t = 0)]
    pub dbnum: u32,

    /// Socket read/write timeout in milliseconds
    #[arg(long = "socket-timeout-ms", default_value_t = 5000)]
    pub socket_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds
    #[arg(long = "connect-timeout-ms", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Treat the endpoint as a standalone server instead of a cluster
    #[arg(long = "no-cluster")]
    pub no_cluster: bool,

    // ===== Retry Options =====
    /// Maximum attempts per operation
    #[arg(long = "max-retries", default_value_t = 3)]
    pub max_retries: u32,

    /// Base backoff in milliseconds (doubles per attempt)
    #[arg(long = "base-backoff-ms", default_value_t = 500)]
    pub base_backoff_ms: u64,

    // ===== TLS Options =====
    /// Disable TLS (on by default for this deployment style)
    #[arg(long = "no-tls")]
    pub no_tls: bool,

    /// Skip TLS certificate verification (insecure)
    #[arg(long = "tls-skip-verify")]
    pub tls_skip_verify: bool,

    /// CA certificate file for TLS
    #[arg(long = "tls-ca-cert")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Client certificate file for TLS
    #[arg(long = "tls-cert")]
    pub tls_cert: Option<PathBuf>,

    /// Client private key file for TLS
    #[arg(long = "tls-key")]
    pub tls_key: Option<PathBuf>,

    /// Server Name Indication for TLS
    #[arg(long = "tls-sni")]
    pub tls_sni: Option<String>,

    // ===== Output Options =====
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operation to run against the manager
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a key, optionally with a TTL
    Set {
        key: String,
        value: String,
        /// Expiry in seconds
        #[arg(long = "ttl")]
        ttl: Option<u64>,
    },
    /// Read a key
    Get { key: String },
    /// Delete a key
    Del { key: String },
    /// Replace the primary access key after an out-of-band rotation
    Rotate {
        /// The new primary access key
        new_primary_key: String,
    },
    /// Continuously write keys, riding through a rotation if one happens
    Soak {
        /// Number of writes to perform
        #[arg(long = "count", default_value_t = 100)]
        count: u64,

        /// Starting id for generated keys
        #[arg(long = "start-id", default_value_t = 0)]
        start_id: u64,

        /// Delay between writes in milliseconds
        #[arg(long = "interval-ms", default_value_t = 500)]
        interval_ms: u64,

        /// Prefix for generated keys
        #[arg(long = "key-prefix", default_value = "soak")]
        key_prefix: String,

        /// Write run statistics to this JSON file
        #[arg(long = "output")]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Parse from process arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Cross-flag validation that clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.no_tls
            && (self.tls_skip_verify
                || self.tls_ca_cert.is_some()
                || self.tls_cert.is_some()
                || self.tls_key.is_some()
                || self.tls_sni.is_some())
        {
            return Err("TLS options require TLS (drop --no-tls)".to_string());
        }
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err("--tls-cert and --tls-key must be given together".to_string());
        }
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }
        Ok(())
    }
}
