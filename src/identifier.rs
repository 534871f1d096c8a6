//! # did:stack:v2 identifiers
//!
//! A did:stack:v2 identifier binds a Stacks address to the transaction that
//! anchored it in the BNS registry:
//!
//! ```text
//! did:stack:v2:<c32-address>-<anchor-txid>
//! ```
//!
//! The version byte of the address decides two things at once: whether the
//! identity lives on-chain (a BNS name) or off-chain (a subdomain packed in a
//! parent zonefile), and which network deployment it belongs to.
//!
//! ```rust
//! use stacks_did_resolver::identifier::{Deployment, DidKind, StacksDid};
//!
//! let did: StacksDid =
//!     "did:stack:v2:SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7-0f1e2d3c".parse()?;
//!
//! assert_eq!(did.kind, DidKind::OnChain);
//! assert_eq!(did.deployment, Deployment::Main);
//! assert_eq!(did.anchor_tx_id, "0f1e2d3c");
//! # Ok::<(), stacks_did_resolver::ResolutionError>(())
//! ```

use crate::address::c32;
use crate::error::{ResolutionError, ResolveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The DID method prefix, including the trailing separator
pub const DID_PREFIX: &str = "did:stack:v2:";

/// BNS registry contract on mainnet
pub const MAINNET_REGISTRY_CONTRACT: &str = "SP000000000000000000002Q6VF78.bns";

/// BNS registry contract on testnet
pub const TESTNET_REGISTRY_CONTRACT: &str = "ST000000000000000000002AMW42H.bns";

/// Deploy transaction of the mainnet registry, used as the anchor of migrated names
pub const MAINNET_MIGRATION_TX_ID: &str =
    "d8a9a4528ae833e1894eee676af8d218f8facbf95e166472df2c1a64219b5dfb";

/// Deploy transaction of the testnet registry
pub const TESTNET_MIGRATION_TX_ID: &str =
    "55bb3a37f9b2e8c58905c95099d5fc21aa47d073a918f3b30cc5abe4e3be44c6";

/// Every well-known migration transaction id
pub const MIGRATION_TX_IDS: [&str; 2] = [MAINNET_MIGRATION_TX_ID, TESTNET_MIGRATION_TX_ID];

/// Single-signature mainnet address version (`SP...`)
pub const VERSION_MAINNET_SINGLE_SIG: u8 = 22;
/// Single-signature testnet address version (`ST...`)
pub const VERSION_TESTNET_SINGLE_SIG: u8 = 26;
/// Multi-signature mainnet address version (`SM...`), not a DID address version
pub const VERSION_MAINNET_MULTI_SIG: u8 = 20;
/// Off-chain mainnet identity version (`SH...`)
pub const VERSION_MAINNET_OFF_CHAIN: u8 = 17;
/// Off-chain testnet identity version (`SJ...`)
pub const VERSION_TESTNET_OFF_CHAIN: u8 = 18;

/// Where the identity's state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DidKind {
    /// A BNS name registered directly on chain
    OnChain,
    /// A subdomain whose state is packed into its parent name's zonefile
    OffChain,
}

impl fmt::Display for DidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DidKind::OnChain => f.write_str("on-chain"),
            DidKind::OffChain => f.write_str("off-chain"),
        }
    }
}

/// Network deployment of the registry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deployment {
    #[default]
    #[serde(rename = "mainnet")]
    Main,
    #[serde(rename = "testnet")]
    Test,
}

impl Deployment {
    /// Contract id of the BNS registry on this deployment
    pub fn registry_contract(&self) -> &'static str {
        match self {
            Deployment::Main => MAINNET_REGISTRY_CONTRACT,
            Deployment::Test => TESTNET_REGISTRY_CONTRACT,
        }
    }

    /// Address version byte for identities of `kind` on this deployment
    pub fn address_version(&self, kind: DidKind) -> u8 {
        match (kind, self) {
            (DidKind::OnChain, Deployment::Main) => VERSION_MAINNET_SINGLE_SIG,
            (DidKind::OnChain, Deployment::Test) => VERSION_TESTNET_SINGLE_SIG,
            (DidKind::OffChain, Deployment::Main) => VERSION_MAINNET_OFF_CHAIN,
            (DidKind::OffChain, Deployment::Test) => VERSION_TESTNET_OFF_CHAIN,
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deployment::Main => f.write_str("mainnet"),
            Deployment::Test => f.write_str("testnet"),
        }
    }
}

impl FromStr for Deployment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Deployment::Main),
            "testnet" | "test" => Ok(Deployment::Test),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Classify an address version byte
///
/// Returns `None` for versions outside the table; callers turn that into
/// `UnsupportedAddressVersion`.
pub fn classify_version(version: u8) -> Option<(DidKind, Deployment)> {
    match version {
        VERSION_MAINNET_SINGLE_SIG => Some((DidKind::OnChain, Deployment::Main)),
        VERSION_TESTNET_SINGLE_SIG => Some((DidKind::OnChain, Deployment::Test)),
        VERSION_MAINNET_OFF_CHAIN => Some((DidKind::OffChain, Deployment::Main)),
        VERSION_TESTNET_OFF_CHAIN => Some((DidKind::OffChain, Deployment::Test)),
        _ => None,
    }
}

/// Whether `tx_id` is one of the registry migration transactions
pub fn is_migration_tx(tx_id: &str) -> bool {
    let tx_id = strip_hex_prefix(tx_id);
    MIGRATION_TX_IDS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(tx_id))
}

/// A parsed did:stack:v2 identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StacksDid {
    /// c32 address as it appeared in the DID
    pub address: String,
    /// Anchor transaction id, without `0x`
    pub anchor_tx_id: String,
    pub kind: DidKind,
    pub deployment: Deployment,
}

impl StacksDid {
    /// Whether this DID is anchored to a registry migration transaction
    pub fn is_migrated(&self) -> bool {
        is_migration_tx(&self.anchor_tx_id)
    }
}

impl FromStr for StacksDid {
    type Err = ResolutionError;

    fn from_str(did: &str) -> Result<Self, Self::Err> {
        parse_did(did)
    }
}

impl fmt::Display for StacksDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_did(&self.address, &self.anchor_tx_id))
    }
}

/// Parse a did:stack:v2 identifier
pub fn parse_did(did: &str) -> ResolveResult<StacksDid> {
    let method_specific = did.strip_prefix(DID_PREFIX).ok_or_else(|| {
        ResolutionError::InvalidDidFormat(format!("DID must start with '{}'", DID_PREFIX))
    })?;

    let nss = method_specific
        .rsplit(':')
        .next()
        .unwrap_or(method_specific);

    let (address, tx_id) = nss.rsplit_once('-').ok_or_else(|| {
        ResolutionError::InvalidDidFormat(format!("{} has no '-' between address and txid", did))
    })?;

    let tx_id = strip_hex_prefix(tx_id);
    if address.is_empty() || tx_id.is_empty() {
        return Err(ResolutionError::InvalidDidFormat(format!(
            "{} has an empty address or txid",
            did
        )));
    }
    if !tx_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ResolutionError::InvalidDidFormat(format!(
            "anchor txid '{}' is not hex",
            tx_id
        )));
    }

    let (version, _) = c32::c32_address_decode(address)?;
    let (kind, deployment) =
        classify_version(version).ok_or_else(|| ResolutionError::UnsupportedAddressVersion {
            address: address.to_string(),
            version,
        })?;

    Ok(StacksDid {
        address: address.to_string(),
        anchor_tx_id: tx_id.to_string(),
        kind,
        deployment,
    })
}

/// Build a did:stack:v2 identifier from an address and anchor transaction id
pub fn encode_did(address: &str, anchor_tx_id: &str) -> String {
    format!("{}{}-{}", DID_PREFIX, address, strip_hex_prefix(anchor_tx_id))
}

pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
