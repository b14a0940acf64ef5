//! Pledge command line client
//!
//! The `pledge` binary drives the submission pipeline from a terminal. This
//! library half holds what the binary and its tests share: configuration and
//! console output.

pub mod config;
pub mod console;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} needs the network; drop --offline")]
    NeedsNetwork(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Fail for commands that only make sense against the real services
pub fn require_network(offline: bool, command: &'static str) -> Result<()> {
    if offline {
        return Err(CliError::NeedsNetwork(command));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_network() {
        assert!(require_network(false, "fetch").is_ok());

        let err = require_network(true, "fetch").unwrap_err();
        assert!(matches!(err, CliError::NeedsNetwork("fetch")));
        assert_eq!(err.to_string(), "fetch needs the network; drop --offline");
    }
}
