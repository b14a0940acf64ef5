//! `ipfs://` to HTTP gateway translation

use pledge_types::ContentReference;

use crate::Result;

/// Translate `ipfs://X` into `https://<gateway>/ipfs/X`.
///
/// `gateway` may be a bare host (`w3s.link`) or carry a scheme; the output is
/// always https. Anything that is not an `ipfs://` reference is an error.
pub fn ipfs_uri_to_http_uri(uri: &str, gateway: &str) -> Result<String> {
    let reference = ContentReference::parse(uri)?;
    Ok(gateway_url(&reference, gateway))
}

pub(crate) fn gateway_url(reference: &ContentReference, gateway: &str) -> String {
    let host = gateway
        .trim()
        .strip_prefix("https://")
        .or_else(|| gateway.trim().strip_prefix("http://"))
        .unwrap_or(gateway.trim())
        .trim_end_matches('/');

    format!("https://{}/ipfs/{}", host, reference.location())
}
