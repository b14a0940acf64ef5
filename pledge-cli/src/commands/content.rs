//! Content store commands

use anyhow::{Context, Result};
use pledge_cli::config::Config;
use pledge_cli::require_network;
use pledge_ipfs::{
    ipfs_uri_to_http_uri, resolve_or_pending, validate_file_size, Availability, ContentStore, HttpContentStore,
    MemoryContentStore,
};
use pledge_types::{ContentReference, Payload};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub fn gateway(config: &Config, uri: &str) -> Result<()> {
    println!("{}", ipfs_uri_to_http_uri(uri, &config.ipfs.gateway)?);
    Ok(())
}

/// Store a file or a JSON document
pub async fn upload(config: &Config, offline: bool, file: Option<PathBuf>, json: Option<String>) -> Result<()> {
    let payload = match (file, json) {
        (Some(path), _) => {
            let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            validate_file_size(bytes.len())?;
            Payload::File {
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                bytes,
            }
        }
        (None, Some(json)) => Payload::Json(serde_json::from_str(&json).context("Invalid JSON payload")?),
        (None, None) => anyhow::bail!("Must specify --file or --json"),
    };

    let reference = if offline {
        store_with(&MemoryContentStore::new(), &payload).await?
    } else {
        store_with(&HttpContentStore::new(config.ipfs.clone())?, &payload).await?
    };

    println!("{}", reference);
    println!("{}", ipfs_uri_to_http_uri(reference.uri(), &config.ipfs.gateway)?);
    Ok(())
}

async fn store_with<S: ContentStore>(store: &S, payload: &Payload) -> Result<ContentReference> {
    println!("Uploading {:?} payload...", payload.kind());
    Ok(store.store(payload, &CancellationToken::new()).await?)
}

/// Print a payload, or an ellipsis while it is not available yet
pub async fn fetch(config: &Config, offline: bool, uri: &str) -> Result<()> {
    // Offline stores do not outlive the process.
    require_network(offline, "fetch")?;
    let reference = ContentReference::parse(uri)?;

    let store = HttpContentStore::new(config.ipfs.clone())?;
    match resolve_or_pending(&store, &reference, &CancellationToken::new()).await? {
        Availability::Ready(bytes) => match String::from_utf8(bytes) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("[binary content, {} bytes]", e.as_bytes().len()),
        },
        Availability::Pending => println!("…"),
    }
    Ok(())
}
