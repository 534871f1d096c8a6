/// Zonefile model
///
/// BNS names point at a DNS-style zonefile. The resolver reads three things
/// from it: `$ORIGIN` (the name it is authoritative for), the URI record that
/// locates the signed claim, and TXT groups that carry packed subdomain
/// records.

pub mod parser;
pub mod subdomain;

pub use parser::parse_zonefile;
pub use subdomain::{
    chunk, find_subdomain_by_label, find_subdomain_by_owner, pack, reassemble,
    SubdomainOperation, MAX_CHUNK_LEN,
};

use crate::error::{ResolutionError, ResolveResult};
use crate::fqn::{parse_fqn, Fqn};
use std::fmt;
use std::str::FromStr;

/// URI record name under which profile locations are published
pub const CLAIM_URI_NAME: &str = "_http._tcp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zonefile {
    pub origin: String,
    pub ttl: Option<u32>,
    pub uri_records: Vec<UriRecord>,
    pub txt_groups: Vec<TxtGroup>,
    /// Records of any other type, kept for rendering only
    pub other_records: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriRecord {
    pub name: String,
    pub ttl: Option<u32>,
    pub priority: u16,
    pub weight: u16,
    pub target: String,
}

/// All TXT strings published under one owner name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtGroup {
    pub label: String,
    pub ttl: Option<u32>,
    pub entries: Vec<String>,
}

impl TxtGroup {
    /// Value of the first `key=value` entry with this key
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|entry| {
            let (k, v) = entry.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub ttl: Option<u32>,
    pub record_type: String,
    pub data: String,
}

impl Zonefile {
    /// An empty zonefile for `origin`
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ttl: None,
            uri_records: Vec::new(),
            txt_groups: Vec::new(),
            other_records: Vec::new(),
        }
    }

    /// Require `$ORIGIN` to be exactly `fqn`
    pub fn matches_name(&self, fqn: &Fqn) -> ResolveResult<()> {
        let mismatch = || ResolutionError::OriginMismatch {
            expected: fqn.to_string(),
            actual: self.origin.clone(),
        };

        let origin = parse_fqn(&self.origin).map_err(|_| mismatch())?;
        if origin != *fqn {
            return Err(mismatch());
        }
        Ok(())
    }

    /// Location of the signed claim
    ///
    /// Prefers the `_http._tcp` URI record and falls back to the first URI
    /// record. Targets without a scheme are treated as `https://`.
    pub fn extract_claim_url(&self) -> ResolveResult<String> {
        let record = self
            .uri_records
            .iter()
            .find(|r| r.name == CLAIM_URI_NAME)
            .or_else(|| self.uri_records.first())
            .ok_or_else(|| ResolutionError::MissingUriRecord(self.origin.clone()))?;

        let target = record.target.trim();
        if target.is_empty() {
            return Err(ResolutionError::MissingUriRecord(self.origin.clone()));
        }

        if target.contains("://") {
            Ok(target.to_string())
        } else {
            Ok(format!("https://{}", target))
        }
    }
}

impl FromStr for Zonefile {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_zonefile(s)
    }
}

impl fmt::Display for Zonefile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "$ORIGIN {}", self.origin)?;
        if let Some(ttl) = self.ttl {
            writeln!(f, "$TTL {}", ttl)?;
        }

        for group in &self.txt_groups {
            let strings: Vec<String> = group.entries.iter().map(|e| quote(e)).collect();
            writeln!(f, "{}\t{}IN\tTXT\t{}", group.label, ttl_field(group.ttl), strings.join(" "))?;
        }

        for uri in &self.uri_records {
            writeln!(
                f,
                "{}\t{}IN\tURI\t{}\t{}\t{}",
                uri.name,
                ttl_field(uri.ttl),
                uri.priority,
                uri.weight,
                quote(&uri.target)
            )?;
        }

        for record in &self.other_records {
            writeln!(
                f,
                "{}\t{}IN\t{}\t{}",
                record.name,
                ttl_field(record.ttl),
                record.record_type,
                record.data
            )?;
        }

        Ok(())
    }
}

fn ttl_field(ttl: Option<u32>) -> String {
    ttl.map(|t| format!("{}\t", t)).unwrap_or_default()
}

pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
