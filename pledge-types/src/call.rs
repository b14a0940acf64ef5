//! Contract call descriptions and the per-action submission request

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::content::ContentReference;
use crate::error::{Result, TypesError};
use crate::payload::Payload;

/// One positional contract argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ArgValue {
    Bool(bool),
    /// Unsigned integer, carried as a decimal string on the wire
    #[serde(with = "decimal")]
    Uint(u128),
    Address(String),
    String(String),
    #[serde(with = "hex_bytes")]
    Bytes(Vec<u8>),
    /// Placeholder for the URI of the uploaded payload
    ContentSlot,
}

impl ArgValue {
    pub fn is_content_slot(&self) -> bool {
        matches!(self, ArgValue::ContentSlot)
    }
}

/// Contract address plus function name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTarget {
    pub contract: String,
    pub function: String,
}

impl CallTarget {
    pub fn new(contract: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
        }
    }
}

/// A call with every argument known, ready for simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCall {
    pub chain: ChainId,
    pub contract: String,
    pub function: String,
    pub args: Vec<ArgValue>,
}

/// Everything one user action needs to go through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub payload: Payload,
    pub target: CallTarget,
    pub args: Vec<ArgValue>,
    pub chain: ChainId,
    /// Shown to the user once the transaction is confirmed
    pub success_message: String,
}

impl SubmissionRequest {
    pub fn new(target: CallTarget, chain: ChainId) -> Self {
        let success_message = format!("{} confirmed", target.function);
        Self {
            payload: Payload::None,
            target,
            args: Vec::new(),
            chain,
            success_message,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn arg(mut self, arg: ArgValue) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    pub fn has_content_slot(&self) -> bool {
        self.args.iter().any(ArgValue::is_content_slot)
    }

    /// Substitute the uploaded reference into every content slot.
    ///
    /// Fails if a slot remains and no reference is available.
    pub fn resolve(&self, content: Option<&ContentReference>) -> Result<ResolvedCall> {
        let args = self
            .args
            .iter()
            .map(|arg| match (arg, content) {
                (ArgValue::ContentSlot, Some(reference)) => Ok(ArgValue::String(reference.uri().to_string())),
                (ArgValue::ContentSlot, None) => {
                    Err(TypesError::UnresolvedContentSlot(self.target.function.clone()))
                }
                (other, _) => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedCall {
            chain: self.chain.clone(),
            contract: self.target.contract.clone(),
            function: self.target.function.clone(),
            args,
        })
    }
}

mod decimal {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
