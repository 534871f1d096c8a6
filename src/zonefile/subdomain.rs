/// Subdomain records packed into a parent zonefile
///
/// An off-chain identity is one TXT group in its parent name's zonefile:
///
/// ```text
/// bob TXT "owner=1J3P..." "seqn=0" "parts=2" "zf0=JE9SSUdJTi..." "zf1=..." "sig=..."
/// ```
///
/// The subdomain's own zonefile is base64-encoded and split over the `zfN`
/// entries, each at most [`MAX_CHUNK_LEN`] characters.
use super::{TxtGroup, Zonefile};
use crate::address;
use crate::error::{ResolutionError, ResolveResult};
use crate::fqn::Fqn;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Longest `zfN` value
pub const MAX_CHUNK_LEN: usize = 250;

const KEY_OWNER: &str = "owner";
const KEY_SEQN: &str = "seqn";
const KEY_PARTS: &str = "parts";
const KEY_SIG: &str = "sig";
const CHUNK_PREFIX: &str = "zf";

/// One subdomain's state as read from its parent zonefile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainOperation {
    pub label: String,
    /// Owner address exactly as published
    pub owner: String,
    pub sequence_number: u64,
    pub zonefile: Vec<u8>,
    pub signature: Option<String>,
}

impl SubdomainOperation {
    /// The subdomain's zonefile as text
    pub fn zonefile_text(&self) -> ResolveResult<&str> {
        std::str::from_utf8(&self.zonefile).map_err(|_| {
            ResolutionError::MalformedZonefile(format!(
                "zonefile of subdomain '{}' is not UTF-8",
                self.label
            ))
        })
    }

    /// Fully-qualified name of this subdomain under `parent`
    pub fn fqn(&self, parent: &Fqn) -> Fqn {
        parent.parent().with_subdomain(self.label.clone())
    }

    /// Whether the owner was set to the burn address
    pub fn is_revoked(&self) -> bool {
        address::addresses_match(&self.owner, address::SUBDOMAIN_BURN_ADDRESS)
    }
}

/// Rebuild a subdomain operation from its TXT group
pub fn reassemble(group: &TxtGroup) -> ResolveResult<SubdomainOperation> {
    let malformed = |message: String| {
        ResolutionError::MalformedZonefile(format!("subdomain '{}': {}", group.label, message))
    };

    let mut owner = None;
    let mut seqn = None;
    let mut parts = None;
    let mut signature = None;
    let mut chunks: Vec<(usize, &str)> = Vec::new();

    for entry in &group.entries {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        match key {
            KEY_OWNER => owner = Some(value.to_string()),
            KEY_SEQN => {
                seqn = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| malformed(format!("invalid seqn '{}'", value)))?,
                )
            }
            KEY_PARTS => {
                parts = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("invalid parts '{}'", value)))?,
                )
            }
            KEY_SIG => signature = Some(value.to_string()),
            _ => {
                if let Some(index) = key.strip_prefix(CHUNK_PREFIX) {
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("invalid chunk key '{}'", key)))?;
                    chunks.push((index, value));
                }
            }
        }
    }

    let owner = owner.ok_or_else(|| malformed("missing owner".to_string()))?;

    chunks.sort_by_key(|(index, _)| *index);
    for (expected, (index, _)) in chunks.iter().enumerate() {
        if *index != expected {
            return Err(malformed(format!("zonefile chunk zf{} is missing", expected)));
        }
    }
    if let Some(parts) = parts {
        if parts != chunks.len() {
            return Err(malformed(format!(
                "parts={} but {} chunks present",
                parts,
                chunks.len()
            )));
        }
    }

    let encoded: String = chunks.iter().map(|(_, value)| *value).collect();
    let zonefile = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| malformed(format!("zonefile is not base64: {}", e)))?;

    Ok(SubdomainOperation {
        label: group.label.clone(),
        owner,
        sequence_number: seqn.unwrap_or(0),
        zonefile,
        signature,
    })
}

/// Base64-encode `bytes` and split into `zfN` sized pieces
pub fn chunk(bytes: &[u8]) -> Vec<String> {
    let encoded = STANDARD.encode(bytes);
    if encoded.is_empty() {
        return vec![String::new()];
    }

    // base64 output is ASCII, so byte chunks are char boundaries
    encoded
        .as_bytes()
        .chunks(MAX_CHUNK_LEN)
        .map(|piece| String::from_utf8_lossy(piece).into_owned())
        .collect()
}

/// Build the TXT group publishing a subdomain operation
pub fn pack(
    label: &str,
    owner: &str,
    sequence_number: u64,
    zonefile: &[u8],
    signature: Option<&str>,
) -> TxtGroup {
    let chunks = chunk(zonefile);

    let mut entries = Vec::with_capacity(chunks.len() + 4);
    entries.push(format!("{}={}", KEY_OWNER, owner));
    entries.push(format!("{}={}", KEY_SEQN, sequence_number));
    entries.push(format!("{}={}", KEY_PARTS, chunks.len()));
    for (index, piece) in chunks.iter().enumerate() {
        entries.push(format!("{}{}={}", CHUNK_PREFIX, index, piece));
    }
    if let Some(sig) = signature {
        entries.push(format!("{}={}", KEY_SIG, sig));
    }

    TxtGroup {
        label: label.to_string(),
        ttl: None,
        entries,
    }
}

/// First subdomain record in `zonefile` owned by `owner`
///
/// Owners are compared after normalization. An owner address that cannot be
/// normalized matches nothing.
pub fn find_subdomain_by_owner(zonefile: &Zonefile, owner: &str) -> ResolveResult<SubdomainOperation> {
    let not_found = || ResolutionError::NoSubdomainForOwner(owner.to_string());

    if address::try_normalize(owner).is_err() {
        return Err(not_found());
    }

    for group in &zonefile.txt_groups {
        let Some(candidate) = group.value(KEY_OWNER) else {
            continue;
        };
        if address::addresses_match(candidate, owner) {
            return reassemble(group);
        }
    }

    Err(not_found())
}

/// Subdomain record with `label` in `zonefile`
pub fn find_subdomain_by_label(zonefile: &Zonefile, label: &str) -> ResolveResult<SubdomainOperation> {
    zonefile
        .txt_groups
        .iter()
        .find(|group| group.label == label && group.value(KEY_OWNER).is_some())
        .ok_or_else(|| ResolutionError::NoSuchSubdomain(label.to_string()))
        .and_then(reassemble)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6d";
    const OWNER_C32: &str = "SH2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKPZJKGHG";

    fn sub_zonefile() -> Vec<u8> {
        b"$ORIGIN bob.alice.id\n_http._tcp IN URI 10 1 \"https://gaia.example/bob/profile.json\"\n"
            .to_vec()
    }

    #[test]
    fn test_pack_reassemble_inverse() {
        let bytes = sub_zonefile();
        let group = pack("bob", OWNER, 3, &bytes, Some("c2ln"));
        let op = reassemble(&group).unwrap();

        assert_eq!(op.label, "bob");
        assert_eq!(op.owner, OWNER);
        assert_eq!(op.sequence_number, 3);
        assert_eq!(op.zonefile, bytes);
        assert_eq!(op.signature.as_deref(), Some("c2ln"));
        assert_eq!(
            op.fqn(&Fqn::new("alice", "id")),
            Fqn::new("alice", "id").with_subdomain("bob")
        );
    }

    #[test]
    fn test_multi_chunk_order() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let chunks = chunk(&bytes);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_LEN));

        let mut group = pack("big", OWNER, 0, &bytes, None);
        // Shuffle chunk entries; reassembly goes by index, not position
        group.entries.reverse();
        assert_eq!(reassemble(&group).unwrap().zonefile, bytes);
    }

    #[test]
    fn test_empty_zonefile_packs_one_chunk() {
        let group = pack("empty", OWNER, 0, &[], None);
        assert_eq!(group.value("parts"), Some("1"));
        assert!(reassemble(&group).unwrap().zonefile.is_empty());
    }

    #[test]
    fn test_reassemble_defaults_and_errors() {
        let group = TxtGroup {
            label: "bob".to_string(),
            ttl: None,
            entries: vec![format!("owner={}", OWNER), "zf0=YWJj".to_string()],
        };
        let op = reassemble(&group).unwrap();
        assert_eq!(op.sequence_number, 0);
        assert_eq!(op.zonefile, b"abc");
        assert!(op.signature.is_none());

        let mut bad = group.clone();
        bad.entries.push("parts=2".to_string());
        assert!(reassemble(&bad).is_err());

        let mut bad = group.clone();
        bad.entries.push("seqn=-1".to_string());
        assert!(reassemble(&bad).is_err());

        let mut bad = group.clone();
        bad.entries[1] = "zf1=YWJj".to_string();
        assert!(reassemble(&bad).is_err());

        let mut bad = group;
        bad.entries.remove(0);
        assert!(matches!(
            reassemble(&bad),
            Err(ResolutionError::MalformedZonefile(_))
        ));
    }

    #[test]
    fn test_find_by_owner_is_encoding_invariant() {
        let mut parent = Zonefile::new("alice.id");
        parent.txt_groups.push(TxtGroup {
            label: "note".to_string(),
            ttl: None,
            entries: vec!["hello world".to_string()],
        });
        parent.txt_groups.push(pack("bob", OWNER, 0, &sub_zonefile(), None));

        let op = find_subdomain_by_owner(&parent, OWNER_C32).unwrap();
        assert_eq!(op.label, "bob");
        assert_eq!(find_subdomain_by_owner(&parent, OWNER).unwrap(), op);

        let other = address::base58check_encode(0, &[9u8; 20]);
        assert!(matches!(
            find_subdomain_by_owner(&parent, &other),
            Err(ResolutionError::NoSubdomainForOwner(_))
        ));
        assert!(find_subdomain_by_owner(&parent, "garbage").is_err());
    }

    #[test]
    fn test_find_by_label() {
        let mut parent = Zonefile::new("alice.id");
        parent.txt_groups.push(pack("bob", OWNER, 1, &sub_zonefile(), None));

        assert_eq!(find_subdomain_by_label(&parent, "bob").unwrap().sequence_number, 1);
        assert!(matches!(
            find_subdomain_by_label(&parent, "carol"),
            Err(ResolutionError::NoSuchSubdomain(_))
        ));
    }

    #[test]
    fn test_burn_address_is_revoked() {
        let op = reassemble(&pack("gone", address::SUBDOMAIN_BURN_ADDRESS, 2, b"", None)).unwrap();
        assert!(op.is_revoked());

        let op = reassemble(&pack("bob", OWNER, 0, b"", None)).unwrap();
        assert!(!op.is_revoked());
    }
}
