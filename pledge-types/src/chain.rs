//! Chain identity and the explicit network context handed to a pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// Known chain aliases that map to CAIP-2 identifiers
/// Format: (alias_namespace, alias_reference) -> (caip2_namespace, caip2_reference)
const CHAIN_ALIASES: &[(&str, &str, &str, &str)] = &[
    ("eth", "mainnet", "eip155", "1"),
    ("eth", "sepolia", "eip155", "11155111"),
    ("base", "mainnet", "eip155", "8453"),
    ("base", "sepolia", "eip155", "84532"),
    ("optimism", "mainnet", "eip155", "10"),
    ("polygon", "mainnet", "eip155", "137"),
    ("polygon", "mumbai", "eip155", "80001"),
];

/// A CAIP-2 chain identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId {
    /// Namespace (e.g., "eip155")
    pub namespace: String,
    /// Reference (e.g., "84532")
    pub reference: String,
}

impl ChainId {
    /// Parse a CAIP-2 chain identifier like "eip155:84532" or "base:sepolia".
    /// Aliases are resolved, so both forms compare equal afterwards.
    pub fn parse(s: &str) -> Result<Self> {
        let (namespace, reference) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TypesError::InvalidChainId(format!(
                "expected 'namespace:reference', got: {}",
                s
            )))?;

        if namespace.is_empty() || reference.is_empty() || reference.contains(':') {
            return Err(TypesError::InvalidChainId(format!(
                "expected 'namespace:reference', got: {}",
                s
            )));
        }

        Ok(Self {
            namespace: namespace.to_lowercase(),
            reference: reference.to_lowercase(),
        }
        .resolve())
    }

    /// An EVM chain by numeric id
    pub fn eip155(chain_id: u64) -> Self {
        Self {
            namespace: "eip155".to_string(),
            reference: chain_id.to_string(),
        }
    }

    /// Resolve aliases to canonical CAIP-2 identifiers
    pub fn resolve(&self) -> Self {
        for (alias_ns, alias_ref, caip_ns, caip_ref) in CHAIN_ALIASES {
            if self.namespace == *alias_ns && self.reference == *alias_ref {
                return Self {
                    namespace: caip_ns.to_string(),
                    reference: caip_ref.to_string(),
                };
            }
        }
        self.clone()
    }

    /// Numeric EVM chain id, if this is an eip155 chain
    pub fn evm_chain_id(&self) -> Option<u64> {
        let resolved = self.resolve();
        if resolved.namespace != "eip155" {
            return None;
        }
        resolved.reference.parse().ok()
    }

    /// Friendly alias if one is known, otherwise the CAIP-2 form
    pub fn display_name(&self) -> String {
        for (alias_ns, alias_ref, caip_ns, caip_ref) in CHAIN_ALIASES {
            if self.namespace == *caip_ns && self.reference == *caip_ref {
                return format!("{}:{}", alias_ns, alias_ref);
            }
        }
        self.to_string()
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl TryFrom<String> for ChainId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Deployed contract addresses the client talks to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBook {
    pub goal: String,
    pub profile: String,
    pub treasury: String,
}

/// Network snapshot threaded into every pipeline.
///
/// Never mutated in place; a wallet switching networks or accounts produces a
/// new context and a new pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    pub chain: ChainId,
    /// Connected wallet account, if any
    pub account: Option<String>,
    pub contracts: ContractBook,
}

impl ChainContext {
    pub fn new(chain: ChainId, contracts: ContractBook) -> Self {
        Self { chain, account: None, contracts }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alias_resolves() {
        let chain = ChainId::parse("base:sepolia").unwrap();
        assert_eq!(chain.namespace, "eip155");
        assert_eq!(chain.reference, "84532");
        assert_eq!(chain.evm_chain_id(), Some(84532));
        assert_eq!(chain.display_name(), "base:sepolia");
    }

    #[test]
    fn test_parse_caip2() {
        let chain = ChainId::parse("EIP155:10").unwrap();
        assert_eq!(chain, ChainId::eip155(10));
        assert_eq!(chain.to_string(), "eip155:10");
    }

    #[test]
    fn test_unknown_chain_keeps_caip2() {
        let chain = ChainId::parse("cosmos:osmosis-1").unwrap();
        assert_eq!(chain.display_name(), "cosmos:osmosis-1");
        assert_eq!(chain.evm_chain_id(), None);
    }

    #[test]
    fn test_invalid_chain_id() {
        assert!(ChainId::parse("eip155").is_err());
        assert!(ChainId::parse(":1").is_err());
        assert!(ChainId::parse("a:b:c").is_err());
    }

    #[test]
    fn test_chain_id_serde() {
        let chain: ChainId = serde_json::from_str(r#""base:mainnet""#).unwrap();
        assert_eq!(chain, ChainId::eip155(8453));
        assert_eq!(serde_json::to_string(&chain).unwrap(), r#""eip155:8453""#);
    }
}
