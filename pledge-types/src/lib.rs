//! Pledge Core Types
//!
//! Value types shared by the content store, ledger and pipeline crates.
//! Everything here is plain data: no I/O, no async.

pub mod error;
pub mod chain;
pub mod content;
pub mod payload;
pub mod call;
pub mod tx;

pub use call::{ArgValue, CallTarget, ResolvedCall, SubmissionRequest};
pub use chain::{ChainContext, ChainId, ContractBook};
pub use content::ContentReference;
pub use error::TypesError;
pub use payload::{Payload, PayloadKind};
pub use tx::{ConfirmationResult, TransactionHandle};
