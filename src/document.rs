/// DID Document output
use crate::error::{ResolutionError, ResolveResult};
use serde::{Deserialize, Serialize};

pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

pub const VERIFICATION_KEY_TYPE: &str = "EcdsaSecp256k1VerificationKey2019";

/// Fragment of the single verification method
pub const KEY_FRAGMENT: &str = "keys-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: String,

    pub id: String,

    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,

    pub authentication: Vec<String>,

    #[serde(rename = "assertionMethod")]
    pub assertion_method: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    pub controller: String,
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(rename = "publicKeyBase58")]
    pub public_key_base58: String,
}

impl DidDocument {
    /// Bind `did` to a verified secp256k1 public key (hex)
    pub fn build(did: &str, public_key_hex: &str) -> ResolveResult<Self> {
        let key_bytes = hex::decode(public_key_hex).map_err(|_| {
            ResolutionError::InvalidSignedClaim(format!(
                "public key '{}' is not hex",
                public_key_hex
            ))
        })?;

        let key_id = format!("{}#{}", did, KEY_FRAGMENT);
        Ok(Self {
            context: DID_CONTEXT.to_string(),
            id: did.to_string(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                controller: did.to_string(),
                method_type: VERIFICATION_KEY_TYPE.to_string(),
                public_key_base58: bs58::encode(key_bytes).into_string(),
            }],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
        })
    }

    /// Public key of the single verification method, base58
    pub fn public_key_base58(&self) -> Option<&str> {
        self.verification_method
            .first()
            .map(|m| m.public_key_base58.as_str())
    }
}
