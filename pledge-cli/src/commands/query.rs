//! Subgraph queries

use anyhow::{Context, Result};
use pledge_cli::config::Config;
use pledge_cli::require_network;
use pledge_ledger::SubgraphClient;
use serde_json::Value;

pub async fn run(config: &Config, offline: bool, query: &str, vars: Option<&str>) -> Result<()> {
    require_network(offline, "query")?;

    let variables: Value = match vars {
        Some(vars) => serde_json::from_str(vars).context("Invalid --vars JSON")?,
        None => Value::Object(Default::default()),
    };

    let client = SubgraphClient::new(config.subgraph.endpoint.clone(), config.subgraph.timeout_secs)?;
    let data: Value = client.query(query, &variables).await?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
