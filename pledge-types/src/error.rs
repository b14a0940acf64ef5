//! Error types for pledge-types

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("Invalid CAIP-2 chain identifier: {0}")]
    InvalidChainId(String),

    #[error("Invalid content reference: {0}")]
    InvalidContentReference(String),

    #[error("Unresolved content slot in arguments of {0}")]
    UnresolvedContentSlot(String),

    #[error("Payload error: {0}")]
    Payload(String),
}

pub type Result<T> = std::result::Result<T, TypesError>;
