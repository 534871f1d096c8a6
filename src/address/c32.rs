/// Crockford-style base32 ("c32") encoding and the c32check address format
///
/// A Stacks address is `S` followed by the c32 character of its version byte
/// and the c32 encoding of `hash160 || checksum`, where the checksum is the
/// first four bytes of a double SHA-256 over `version || hash160`.

use crate::error::{ResolutionError, ResolveResult};
use sha2::{Digest, Sha256};

pub const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of a hash160 payload in bytes
pub const HASH160_LEN: usize = 20;

const CHECKSUM_LEN: usize = 4;

/// Encode bytes as c32
///
/// Each leading zero byte becomes a leading `0` character, the remainder is a
/// big-endian base-32 number.
pub fn c32_encode(data: &[u8]) -> String {
    let mut digits = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;

    for &byte in data.iter().rev() {
        acc |= u32::from(byte) << bits;
        bits += 8;
        while bits >= 5 {
            digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
            acc >>= 5;
            bits -= 5;
        }
    }
    if bits > 0 {
        digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
    }

    while digits.last() == Some(&b'0') {
        digits.pop();
    }
    let leading_zeros = data.iter().take_while(|b| **b == 0).count();
    digits.extend(std::iter::repeat(b'0').take(leading_zeros));

    digits.iter().rev().map(|d| *d as char).collect()
}

/// Decode a c32 string
pub fn c32_decode(input: &str) -> ResolveResult<Vec<u8>> {
    let normalized = normalize(input);

    let mut bytes = Vec::with_capacity(normalized.len() * 5 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;

    for ch in normalized.chars().rev() {
        let value = c32_value(ch).ok_or_else(|| {
            ResolutionError::InvalidAddress(format!("invalid c32 character '{}' in {}", ch, input))
        })?;
        acc |= value << bits;
        bits += 5;
        while bits >= 8 {
            bytes.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 && acc != 0 {
        bytes.push(acc as u8);
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    let leading_zeros = normalized.chars().take_while(|c| *c == '0').count();
    bytes.extend(std::iter::repeat(0u8).take(leading_zeros));
    bytes.reverse();

    Ok(bytes)
}

/// Encode a version byte and payload with a c32check checksum
pub fn c32check_encode(version: u8, data: &[u8]) -> ResolveResult<String> {
    if version >= 32 {
        return Err(ResolutionError::InvalidAddress(format!(
            "version {} does not fit a c32 character",
            version
        )));
    }

    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum(version, data));

    Ok(format!(
        "{}{}",
        C32_ALPHABET[version as usize] as char,
        c32_encode(&payload)
    ))
}

/// Decode a c32check string into its version byte and payload
pub fn c32check_decode(input: &str) -> ResolveResult<(u8, Vec<u8>)> {
    let normalized = normalize(input);
    let mut chars = normalized.chars();

    let version_char = chars
        .next()
        .ok_or_else(|| ResolutionError::InvalidAddress("empty c32check string".to_string()))?;
    let version = c32_value(version_char).ok_or_else(|| {
        ResolutionError::InvalidAddress(format!("invalid version character in {}", input))
    })? as u8;

    let decoded = c32_decode(chars.as_str())?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(ResolutionError::InvalidAddress(format!(
            "c32check string {} is too short",
            input
        )));
    }

    let (data, expected) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if checksum(version, data) != expected {
        return Err(ResolutionError::InvalidAddress(format!(
            "c32check checksum mismatch in {}",
            input
        )));
    }

    Ok((version, data.to_vec()))
}

/// Build a Stacks address from a version byte and hash160
pub fn c32_address(version: u8, hash160: &[u8]) -> ResolveResult<String> {
    if hash160.len() != HASH160_LEN {
        return Err(ResolutionError::InvalidAddress(format!(
            "hash160 must be {} bytes, got {}",
            HASH160_LEN,
            hash160.len()
        )));
    }

    Ok(format!("S{}", c32check_encode(version, hash160)?))
}

/// Split a Stacks address into its version byte and hash160
pub fn c32_address_decode(address: &str) -> ResolveResult<(u8, [u8; HASH160_LEN])> {
    let body = address
        .strip_prefix(|c: char| c == 'S' || c == 's')
        .ok_or_else(|| ResolutionError::InvalidAddress(format!("{} does not start with 'S'", address)))?;

    if body.len() <= 5 {
        return Err(ResolutionError::InvalidAddress(format!(
            "{} is too short to be an address",
            address
        )));
    }

    let (version, data) = c32check_decode(body)?;
    let hash: [u8; HASH160_LEN] = data.as_slice().try_into().map_err(|_| {
        ResolutionError::InvalidAddress(format!(
            "{} carries a {} byte hash, expected {}",
            address,
            data.len(),
            HASH160_LEN
        ))
    })?;

    Ok((version, hash))
}

fn checksum(version: u8, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let first = hasher.finalize();
    let second = Sha256::digest(first);

    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&second[..CHECKSUM_LEN]);
    out
}

fn c32_value(ch: char) -> Option<u32> {
    C32_ALPHABET
        .iter()
        .position(|c| *c as char == ch)
        .map(|p| p as u32)
}

// Crockford aliases: O reads as 0, I and L read as 1.
fn normalize(input: &str) -> String {
    input
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'L' => '1',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "a46ff88886c2ef9762d970b4d2c63678835bd39d";

    #[test]
    fn test_registry_contract_addresses() {
        assert_eq!(
            c32_address(22, &[0u8; 20]).unwrap(),
            "SP000000000000000000002Q6VF78"
        );
        assert_eq!(
            c32_address(26, &[0u8; 20]).unwrap(),
            "ST000000000000000000002AMW42H"
        );
    }

    #[test]
    fn test_address_for_each_version() {
        let hash = hex::decode(HASH).unwrap();
        assert_eq!(
            c32_address(22, &hash).unwrap(),
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"
        );
        assert_eq!(
            c32_address(26, &hash).unwrap(),
            "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ"
        );
        assert_eq!(
            c32_address(17, &hash).unwrap(),
            "SH2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKPZJKGHG"
        );
        assert_eq!(
            c32_address(18, &hash).unwrap(),
            "SJ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKPVRMJHT"
        );
    }

    #[test]
    fn test_address_decode() {
        let (version, hash) =
            c32_address_decode("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7").unwrap();
        assert_eq!(version, 22);
        assert_eq!(hex::encode(hash), HASH);

        // Lowercase input is accepted
        let (version, _) =
            c32_address_decode("st2j6zy48gv1ez5v2v5rb9mp66sw86pykkqyac0rq").unwrap();
        assert_eq!(version, 26);
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(c32_encode(&[0, 0, 0xff]), "007Z");
        assert_eq!(c32_decode("007Z").unwrap(), vec![0, 0, 0xff]);
        assert_eq!(c32_encode(b"hello world"), "38CNP6RVS0EXQQ4V34");
        assert_eq!(c32_decode("38CNP6RVS0EXQQ4V34").unwrap(), b"hello world");
    }

    #[test]
    fn test_checksum_mismatch() {
        let result = c32_address_decode("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ8");
        assert!(matches!(result, Err(ResolutionError::InvalidAddress(_))));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(c32_decode("U").is_err());
        assert!(c32_address_decode("1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6d").is_err());
        assert!(c32_address_decode("SP").is_err());
    }
}
