//! Log output for the CLI.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! forwards those records and writes everything to stderr so stdout only
//! carries command output.

use anyhow::{anyhow, Result};
use std::str::FromStr;
use tracing::Level;

/// Install the global subscriber at the given level.
pub fn init(level: &str) -> Result<()> {
    let level = Level::from_str(level).map_err(|_| anyhow!("unknown log level: {}", level))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}
