//! Payloads uploaded ahead of a contract call

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    File,
    Json,
    None,
}

/// Content to store before the call is prepared
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw file bytes with an optional file name
    File { name: Option<String>, bytes: Vec<u8> },
    /// A JSON document (messages, goal descriptions, profiles)
    Json(serde_json::Value),
    None,
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::File { .. } => PayloadKind::File,
            Payload::Json(_) => PayloadKind::Json,
            Payload::None => PayloadKind::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::None)
    }

    /// Serialize to the bytes that get uploaded
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Payload::File { bytes, .. } => Ok(bytes.clone()),
            Payload::Json(value) => serde_json::to_vec(value)
                .map_err(|e| TypesError::Payload(format!("Failed to encode JSON: {}", e))),
            Payload::None => Err(TypesError::Payload("Nothing to upload".to_string())),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Payload::Json(_) => "application/json",
            _ => "application/octet-stream",
        }
    }
}
