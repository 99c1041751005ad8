//! valkey-key-rotation - data operations that survive an access-key rotation
//!
//! Connects to a clustered Valkey/Redis endpoint with a primary and
//! secondary access key and runs one operation through the failover
//! manager. The `soak` subcommand writes continuously, which makes it a
//! convenient harness for rotation drills.

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use valkey_key_rotation::config::{CliArgs, Command};
use valkey_key_rotation::workload::{run_soak, SoakConfig};
use valkey_key_rotation::{Credential, FailoverManager, ManagerConfig};

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet);

    let config = ManagerConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let primary = Credential::new(args.primary_key.clone());
    let secondary = Credential::new(args.secondary_key.clone());

    info!("Connecting to {}:{}", config.hostname, config.port);
    let manager = FailoverManager::open(config, primary, secondary)?;

    match args.command {
        Command::Set { key, value, ttl } => {
            manager.write(&key, &value, ttl)?;
            println!("OK");
        }
        Command::Get { key } => match manager.read(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Command::Del { key } => {
            let removed = manager.delete(&key)?;
            println!("{}", u8::from(removed));
        }
        Command::Rotate { new_primary_key } => {
            manager.update_primary_credential(Credential::new(new_primary_key));
            println!("primary key updated; active key: {}", manager.active_key());
        }
        Command::Soak {
            count,
            start_id,
            interval_ms,
            key_prefix,
            output,
        } => {
            let soak_config = SoakConfig {
                key_prefix,
                start_id,
                count,
                interval: Duration::from_millis(interval_ms),
                ttl: None,
            };

            let bar = ProgressBar::new(count);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}",
                )
                .expect("valid progress template"),
            );

            let stats = run_soak(&manager, &soak_config, |_, _, active| {
                bar.set_message(format!("key: {}", active));
                bar.inc(1);
            });
            bar.finish();

            println!("\n====================================");
            println!("SOAK COMPLETE");
            println!("====================================");
            println!("Writes: {} ({} failed)", stats.total, stats.failed);
            println!("Key switches: {}", stats.key_switches);
            println!("Final key: {}", stats.final_key);
            println!(
                "Latency us: p50={} p99={} max={}",
                stats.p50_latency_us, stats.p99_latency_us, stats.max_latency_us
            );

            if let Some(ref path) = output {
                info!("Writing results to: {:?}", path);
                std::fs::write(path, serde_json::to_string_pretty(&stats)?)?;
            }
        }
    }

    manager.close();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
