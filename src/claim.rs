/// Signed claim (profile token) verification
///
/// A claim token is a compact JWS signed with ES256K:
/// `base64url(header).base64url(payload).base64url(r || s)`. The payload names
/// the subject key being vouched for and the issuer key that signed it. A
/// claim is accepted for an owner address only when the issuer key hashes to
/// that address and the signature checks out.
use crate::address;
use crate::error::{ResolutionError, ResolveResult};
use crate::registry::RegistryClient;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only accepted signing algorithm
pub const TOKEN_ALGORITHM: &str = "ES256K";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    alg: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<KeyHolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer: Option<KeyHolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claim: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyHolder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
}

/// Fetch the claim at `url` and verify it was signed by `expected_owner`
///
/// Fetch failures surface as `ClaimUnavailable`, verification failures as
/// `InvalidSignedClaim`. Returns the subject public key as hex.
pub async fn fetch_and_verify<C>(client: &C, url: &str, expected_owner: &str) -> ResolveResult<String>
where
    C: RegistryClient + ?Sized,
{
    let envelope = client
        .fetch_signed_claim(url)
        .await
        .map_err(|source| ResolutionError::ClaimUnavailable {
            url: url.to_string(),
            source,
        })?;

    verify_claim_token(&envelope.token, expected_owner)
}

/// Verify a claim token against an expected owner
///
/// `expected_owner` is either an address (any encoding the normalizer
/// understands) or the issuer's raw public key hex.
pub fn verify_claim_token(token: &str, expected_owner: &str) -> ResolveResult<String> {
    let mut segments = token.trim().split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(invalid("token must have three segments"));
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(invalid(&format!(
            "unsupported algorithm '{}', expected {}",
            header.alg, TOKEN_ALGORITHM
        )));
    }

    let payload: TokenPayload = decode_segment(payload_b64, "payload")?;
    let subject_key = payload
        .subject
        .and_then(|s| s.public_key)
        .ok_or_else(|| invalid("payload has no subject.publicKey"))?;
    let issuer_key = payload
        .issuer
        .and_then(|i| i.public_key)
        .ok_or_else(|| invalid("payload has no issuer.publicKey"))?;
    if payload.claim.is_none() {
        return Err(invalid("payload has no claim"));
    }

    let issuer_bytes = decode_public_key(&issuer_key, "issuer")?;
    if !issuer_matches(&issuer_key, &issuer_bytes, expected_owner)? {
        return Err(invalid(&format!(
            "token was not issued by {}",
            expected_owner
        )));
    }

    let verifying_key = VerifyingKey::from_sec1_bytes(&issuer_bytes)
        .map_err(|_| invalid("issuer public key is not a secp256k1 point"))?;

    let signature_bytes = URL_SAFE_NO_PAD
        .decode(signature_b64.trim_end_matches('='))
        .map_err(|_| invalid("signature is not base64url"))?;
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|_| invalid("signature must be 64 bytes r || s"))?;
    let signature = signature.normalize_s().unwrap_or(signature);

    let signing_input = format!("{}.{}", header_b64, payload_b64);
    verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| invalid("signature verification failed"))?;

    decode_public_key(&subject_key, "subject")?;
    Ok(subject_key.to_lowercase())
}

/// Produce a claim token binding `subject_public_key` under `claim`
///
/// The issuer is the signing key itself.
pub fn sign_claim_token(signing_key: &SigningKey, subject_public_key: &str, claim: Value) -> ResolveResult<String> {
    let issuer_key = hex::encode(signing_key.verifying_key().to_sec1_bytes());

    let header = TokenHeader {
        typ: Some("JWT".to_string()),
        alg: TOKEN_ALGORITHM.to_string(),
    };
    let payload = TokenPayload {
        subject: Some(KeyHolder {
            public_key: Some(subject_public_key.to_string()),
        }),
        issuer: Some(KeyHolder {
            public_key: Some(issuer_key),
        }),
        claim: Some(claim),
    };

    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&payload)?);
    let signature: Signature = signing_key.sign(signing_input.as_bytes());

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

// Legacy owners may hold the address of either SEC1 form of the same key
fn issuer_matches(issuer_key: &str, issuer_bytes: &[u8], expected_owner: &str) -> ResolveResult<bool> {
    if issuer_key.eq_ignore_ascii_case(expected_owner) {
        return Ok(true);
    }

    let Ok(expected) = address::try_normalize(expected_owner) else {
        return Ok(false);
    };
    let public_key = k256::PublicKey::from_sec1_bytes(issuer_bytes)
        .map_err(|_| invalid("issuer public key is not a secp256k1 point"))?;

    for compress in [true, false] {
        let point = public_key.to_encoded_point(compress);
        if address::public_key_to_address(point.as_bytes())? == expected {
            return Ok(true);
        }
    }
    Ok(false)
}

fn decode_public_key(key_hex: &str, role: &str) -> ResolveResult<Vec<u8>> {
    let bytes = hex::decode(key_hex)
        .map_err(|_| invalid(&format!("{} public key is not hex", role)))?;
    k256::PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| invalid(&format!("{} public key is not a secp256k1 point", role)))?;
    Ok(bytes)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> ResolveResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| invalid(&format!("{} is not base64url", what)))?;
    serde_json::from_slice(&bytes).map_err(|e| invalid(&format!("{} is not valid JSON: {}", what, e)))
}

fn encode_segment<T: Serialize>(value: &T) -> ResolveResult<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ResolutionError::InvalidSignedClaim(format!("cannot encode token: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn invalid(message: &str) -> ResolutionError {
    ResolutionError::InvalidSignedClaim(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::c32;
    use serde_json::json;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32].into()).unwrap()
    }

    fn public_hex(key: &SigningKey) -> String {
        hex::encode(key.verifying_key().to_sec1_bytes())
    }

    fn c32_owner(key: &SigningKey, version: u8) -> String {
        let hash = address::hash160(&key.verifying_key().to_sec1_bytes());
        c32::c32_address(version, &hash).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let alice = key(1);
        let token = sign_claim_token(&alice, &public_hex(&alice), json!({"@type": "Person"})).unwrap();

        // c32 mainnet, c32 testnet, legacy and raw key all identify the issuer
        for owner in [
            c32_owner(&alice, 22),
            c32_owner(&alice, 26),
            address::public_key_to_address(&alice.verifying_key().to_sec1_bytes()).unwrap(),
            public_hex(&alice),
        ] {
            assert_eq!(verify_claim_token(&token, &owner).unwrap(), public_hex(&alice), "{}", owner);
        }
    }

    #[test]
    fn test_owner_from_either_key_encoding() {
        let alice = key(1);
        let token = sign_claim_token(&alice, &public_hex(&alice), json!({})).unwrap();

        let point = alice.verifying_key().to_encoded_point(false);
        let uncompressed_owner = address::base58check_encode(
            address::LEGACY_MAINNET_VERSION,
            &address::hash160(point.as_bytes()),
        );
        assert_eq!(
            verify_claim_token(&token, &uncompressed_owner).unwrap(),
            public_hex(&alice)
        );

        let point = key(2).verifying_key().to_encoded_point(false);
        let other = address::base58check_encode(
            address::LEGACY_MAINNET_VERSION,
            &address::hash160(point.as_bytes()),
        );
        assert!(matches!(
            verify_claim_token(&token, &other),
            Err(ResolutionError::InvalidSignedClaim(_))
        ));
    }

    #[test]
    fn test_wrong_owner_rejected() {
        let alice = key(1);
        let mallory = key(2);
        let token = sign_claim_token(&alice, &public_hex(&alice), json!({})).unwrap();

        let result = verify_claim_token(&token, &c32_owner(&mallory, 22));
        assert!(matches!(result, Err(ResolutionError::InvalidSignedClaim(_))));
        assert!(verify_claim_token(&token, "not-an-address").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let alice = key(1);
        let mallory = key(2);
        let token = sign_claim_token(&alice, &public_hex(&alice), json!({})).unwrap();
        let forged = sign_claim_token(&alice, &public_hex(&mallory), json!({})).unwrap();

        // Splice the forged payload under the original signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        let result = verify_claim_token(&spliced, &c32_owner(&alice, 22));
        assert!(matches!(
            result,
            Err(ResolutionError::InvalidSignedClaim(ref m)) if m.contains("signature")
        ));
    }

    #[test]
    fn test_structural_failures() {
        let owner = c32_owner(&key(1), 22);
        assert!(verify_claim_token("only.two", &owner).is_err());
        assert!(verify_claim_token("a.b.c.d", &owner).is_err());

        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{}"#);
        let token = format!("{}.{}.AAAA", header, payload);
        assert!(matches!(
            verify_claim_token(&token, &owner),
            Err(ResolutionError::InvalidSignedClaim(ref m)) if m.contains("algorithm")
        ));

        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"ES256K"}"#);
        let token = format!("{}.{}.AAAA", header, payload);
        assert!(matches!(
            verify_claim_token(&token, &owner),
            Err(ResolutionError::InvalidSignedClaim(ref m)) if m.contains("subject")
        ));
    }

    #[test]
    fn test_missing_claim_rejected() {
        let alice = key(1);
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "subject": {"publicKey": public_hex(&alice)},
                "issuer": {"publicKey": public_hex(&alice)}
            })
            .to_string(),
        );
        let token = format!("{}.{}.AAAA", header, payload);
        assert!(matches!(
            verify_claim_token(&token, &public_hex(&alice)),
            Err(ResolutionError::InvalidSignedClaim(ref m)) if m.contains("claim")
        ));
    }
}
