/// Address normalization between c32 Stacks addresses and legacy base58check
///
/// Identity claims are signed by keys whose address is expressed in the legacy
/// base58check form with the mainnet single-sig version byte. Registry data
/// uses c32 addresses for either deployment. Owner comparisons go through
/// [`try_normalize`] so both encodings of the same hash160 compare equal.
pub mod c32;

use crate::error::{ResolutionError, ResolveResult};
use crate::identifier::classify_version;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub use c32::HASH160_LEN;

/// Legacy mainnet pay-to-pubkey-hash version
pub const LEGACY_MAINNET_VERSION: u8 = 0x00;

/// Legacy testnet pay-to-pubkey-hash version
pub const LEGACY_TESTNET_VERSION: u8 = 0x6f;

/// Owner address that marks a subdomain as revoked (hash160 of all zeros)
pub const SUBDOMAIN_BURN_ADDRESS: &str = "1111111111111111111114oLvT2";

/// ripemd160(sha256(data))
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    let sha = Sha256::digest(data);
    let digest = Ripemd160::digest(sha);

    let mut out = [0u8; HASH160_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Canonical address of a SEC1-encoded secp256k1 public key
pub fn public_key_to_address(public_key: &[u8]) -> ResolveResult<String> {
    k256::PublicKey::from_sec1_bytes(public_key).map_err(|_| {
        ResolutionError::InvalidAddress(format!(
            "{} is not a secp256k1 public key",
            hex::encode(public_key)
        ))
    })?;

    Ok(base58check_encode(LEGACY_MAINNET_VERSION, &hash160(public_key)))
}

/// Base58check encoding with a one-byte version prefix
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    bs58::encode(payload).with_check_version(version).into_string()
}

/// Decode base58check into its version byte and payload
pub fn base58check_decode(address: &str) -> ResolveResult<(u8, Vec<u8>)> {
    let data = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| ResolutionError::InvalidAddress(format!("{}: {}", address, e)))?;

    match data.split_first() {
        Some((version, payload)) => Ok((*version, payload.to_vec())),
        None => Err(ResolutionError::InvalidAddress(format!(
            "{} is too short for base58check",
            address
        ))),
    }
}

/// Convert an address into the canonical form used by claim signatures
///
/// Accepts c32 addresses of every version in the identifier table and
/// base58check addresses with a legacy mainnet or testnet version.
pub fn try_normalize(address: &str) -> ResolveResult<String> {
    let address = address.trim();

    if let Some(rest) = address.strip_prefix('S') {
        if !rest.is_empty() {
            let (version, hash) = c32::c32_address_decode(address)?;
            if classify_version(version).is_none() {
                return Err(ResolutionError::UnsupportedAddressVersion {
                    address: address.to_string(),
                    version,
                });
            }
            return Ok(base58check_encode(LEGACY_MAINNET_VERSION, &hash));
        }
    }

    let (version, hash) = base58check_decode(address)?;
    if hash.len() != HASH160_LEN {
        return Err(ResolutionError::InvalidAddress(format!(
            "{} does not carry a hash160",
            address
        )));
    }
    match version {
        LEGACY_MAINNET_VERSION | LEGACY_TESTNET_VERSION => {
            Ok(base58check_encode(LEGACY_MAINNET_VERSION, &hash))
        }
        other => Err(ResolutionError::UnsupportedAddressVersion {
            address: address.to_string(),
            version: other,
        }),
    }
}

/// Best-effort normalization for display and logging
///
/// Unknown addresses come back unchanged. Never use this for owner matching.
pub fn normalize(address: &str) -> String {
    try_normalize(address).unwrap_or_else(|_| address.to_string())
}

/// Whether two addresses refer to the same hash160
///
/// An address that cannot be normalized never matches anything.
pub fn addresses_match(a: &str, b: &str) -> bool {
    match (try_normalize(a), try_normalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
