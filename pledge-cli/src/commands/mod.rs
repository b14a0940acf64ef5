//! Command implementations

pub mod content;
pub mod goal;
pub mod query;

use anyhow::Result;
use pledge_cli::config::Config;
use std::path::Path;

/// Write the default config
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set the contract addresses in [ledger.contracts] before sending transactions.");
    Ok(())
}
