//! Resource pool demonstration
//!
//! Borrows more resources than the pool holds and prints each grant and
//! release, so deferred grants can be observed as earlier borrowers let go.

use anyhow::{bail, Result};
use clap::Args;
use lend_pool::{Grant, PoolConfig, ResourcePool};
use log::debug;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Pool size used when neither a flag nor a config file sets one
const DEFAULT_SIZE: i64 = 2;

/// Arguments for the resource command
#[derive(Args, Debug)]
pub struct ResourceArgs {
    /// Number of resources in the pool
    #[clap(long, allow_negative_numbers = true)]
    pub size: Option<i64>,

    /// Number of borrowers to issue, in order
    #[clap(long, default_value_t = 3)]
    pub borrowers: usize,

    /// Base hold time in milliseconds; borrower k holds for k times this
    #[clap(long, default_value_t = 1000)]
    pub hold_ms: u64,

    /// Prefix for resource identifiers
    #[clap(long)]
    pub prefix: Option<String>,

    /// TOML file with pool settings; flags take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Print pool statistics as JSON when done
    #[clap(long)]
    pub stats: bool,
}

impl ResourceArgs {
    /// Build the pool configuration from the config file and flags.
    pub fn pool_config(&self) -> Result<PoolConfig> {
        let mut config = match &self.config {
            Some(path) => PoolConfig::from_file(path)?,
            None => PoolConfig::with_size(DEFAULT_SIZE),
        };
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(prefix) = &self.prefix {
            config.id_prefix = prefix.clone();
        }
        Ok(config)
    }
}

/// Implementation of the resource command
pub async fn execute(args: ResourceArgs) -> Result<()> {
    let pool = ResourcePool::with_config(args.pool_config()?)?;
    if pool.total_count() == 0 && args.borrowers > 0 {
        bail!(
            "pool has no resources; {} borrowers would wait forever",
            args.borrowers
        );
    }

    let (grants_tx, mut grants_rx) = mpsc::unbounded_channel::<(usize, Grant)>();
    println!("START");

    for borrower in 1..=args.borrowers {
        let grants_tx = grants_tx.clone();
        pool.borrow(move |resource, id| {
            println!("RES {} | Resource borrowed is: {}", borrower, id);
            // The receiver outlives every borrower
            let _ = grants_tx.send((borrower, Grant { resource, id }));
        });
    }
    drop(grants_tx);

    let mut holders = JoinSet::new();
    let mut released = 0;
    while released < args.borrowers {
        tokio::select! {
            Some((borrower, grant)) = grants_rx.recv() => {
                let hold = Duration::from_millis(hold_for(args.hold_ms, borrower));
                holders.spawn(hold_then_release(borrower, grant, hold));
            }
            Some(joined) = holders.join_next() => {
                joined?;
                released += 1;
            }
            else => break,
        }
    }

    debug!("All {} borrowers released", released);
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&pool.stats())?);
    }
    Ok(())
}

/// Hold time of borrower `k`: `k` times the base, saturating
fn hold_for(base_ms: u64, borrower: usize) -> u64 {
    base_ms.saturating_mul(borrower as u64)
}

async fn hold_then_release(borrower: usize, grant: Grant, hold: Duration) {
    tokio::time::sleep(hold).await;
    println!("RES {} | Released: {}", borrower, grant.id);
    grant.release();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_time_scales_with_borrower() {
        assert_eq!(hold_for(10, 1), 10);
        assert_eq!(hold_for(10, 3), 30);
        assert_eq!(hold_for(0, 7), 0);
    }

    #[test]
    fn test_hold_time_saturates() {
        assert_eq!(hold_for(u64::MAX, 2), u64::MAX);
        assert_eq!(hold_for(u64::MAX / 2 + 1, 3), u64::MAX);
    }
}
