/// Registry client
///
/// Read access to the BNS registry through a Stacks node. The resolver only
/// depends on the [`RegistryClient`] trait; [`StacksApiClient`] is the HTTP
/// implementation used by the service binary.

pub mod clarity;
pub mod http;

pub use http::StacksApiClient;

use crate::error::RegistryError;
use crate::fqn::Fqn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result type alias for registry lookups
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry lookups needed by resolution
///
/// Every method is a single read. Implementations own timeouts and
/// connection reuse; the resolver never retries.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch a transaction by id (with or without `0x`)
    async fn fetch_transaction(&self, tx_id: &str) -> RegistryResult<AnchorTransaction>;

    /// Fetch the zonefile of `name.namespace`, either the one with
    /// `zonefile_hash` or the latest when no hash is given
    async fn fetch_zonefile(&self, fqn: &Fqn, zonefile_hash: Option<&str>) -> RegistryResult<String>;

    /// Names currently owned by `address`
    async fn fetch_names_owned_by(&self, address: &str) -> RegistryResult<Vec<String>>;

    /// Current registry state of `name.namespace`
    async fn fetch_name_info(&self, fqn: &Fqn) -> RegistryResult<NameInfo>;

    /// Height of the chain tip
    async fn fetch_current_block_height(&self) -> RegistryResult<u64>;

    /// Signed claim token published at `url`
    async fn fetch_signed_claim(&self, url: &str) -> RegistryResult<TokenEnvelope>;
}

#[async_trait]
impl<C: RegistryClient + ?Sized> RegistryClient for Arc<C> {
    async fn fetch_transaction(&self, tx_id: &str) -> RegistryResult<AnchorTransaction> {
        (**self).fetch_transaction(tx_id).await
    }

    async fn fetch_zonefile(&self, fqn: &Fqn, zonefile_hash: Option<&str>) -> RegistryResult<String> {
        (**self).fetch_zonefile(fqn, zonefile_hash).await
    }

    async fn fetch_names_owned_by(&self, address: &str) -> RegistryResult<Vec<String>> {
        (**self).fetch_names_owned_by(address).await
    }

    async fn fetch_name_info(&self, fqn: &Fqn) -> RegistryResult<NameInfo> {
        (**self).fetch_name_info(fqn).await
    }

    async fn fetch_current_block_height(&self) -> RegistryResult<u64> {
        (**self).fetch_current_block_height().await
    }

    async fn fetch_signed_claim(&self, url: &str) -> RegistryResult<TokenEnvelope> {
        (**self).fetch_signed_claim(url).await
    }
}

/// Transaction status as reported by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Pending,
    AbortByResponse,
    AbortByPostCondition,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Success => "success",
            TxStatus::Pending => "pending",
            TxStatus::AbortByResponse => "abort_by_response",
            TxStatus::AbortByPostCondition => "abort_by_post_condition",
            TxStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of an anchoring transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorTransaction {
    pub tx_id: String,
    pub tx_status: TxStatus,
    #[serde(default)]
    pub contract_call: Option<ContractCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract_id: String,
    pub function_name: String,
    #[serde(default)]
    pub function_args: Vec<FunctionArg>,
}

/// One argument of a contract call, consensus-serialized as hex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionArg {
    pub name: String,
    pub hex: String,
}

impl FunctionArg {
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// Current registry state of a name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameInfo {
    /// Current owner address
    #[serde(rename = "address")]
    pub owner: String,
    /// Block at which the registration lapses (0 when the namespace never expires)
    #[serde(default)]
    pub expire_block: u64,
    /// Last transaction that touched the name, `"0x"` when never updated
    #[serde(default)]
    pub last_txid: String,
    /// Last registry operation, e.g. `name-register` or `name-revoke`
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub zonefile: String,
    #[serde(default)]
    pub zonefile_hash: String,
}

/// Published signed claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_deserialize() {
        let json = serde_json::json!({
            "tx_id": "0xabc",
            "tx_status": "abort_by_post_condition",
            "tx_type": "contract_call",
            "contract_call": {
                "contract_id": "SP000000000000000000002Q6VF78.bns",
                "function_name": "name-register",
                "function_signature": "",
                "function_args": [
                    {"hex": "0x0200000005616c696365", "repr": "0x616c696365", "name": "name", "type": "(buff 48)"}
                ]
            }
        });

        let tx: AnchorTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.tx_status, TxStatus::AbortByPostCondition);
        let call = tx.contract_call.unwrap();
        assert_eq!(call.function_args[0].name, "name");
    }

    #[test]
    fn test_unknown_status_and_missing_call() {
        let json = serde_json::json!({
            "tx_id": "0xabc",
            "tx_status": "dropped_replace_by_fee",
            "tx_type": "token_transfer"
        });

        let tx: AnchorTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.tx_status, TxStatus::Unknown);
        assert!(tx.contract_call.is_none());
    }

    #[test]
    fn test_name_info_defaults() {
        let json = serde_json::json!({
            "address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "blockchain": "stacks",
            "status": "name-register",
            "last_txid": "0x"
        });

        let info: NameInfo = serde_json::from_value(json).unwrap();
        assert_eq!(info.owner, "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7");
        assert_eq!(info.expire_block, 0);
        assert!(info.zonefile.is_empty());
    }
}
