/// Line-oriented zonefile parser
///
/// Supports the subset of RFC 1035 master-file syntax BNS zonefiles use:
/// `$ORIGIN` / `$TTL` directives, `;` comments, quoted strings with
/// backslash escapes, and `owner [ttl] [class] TYPE rdata` records where a
/// line starting with whitespace reuses the previous owner.
use super::{ResourceRecord, TxtGroup, UriRecord, Zonefile};
use crate::error::{ResolutionError, ResolveResult};

const CLASSES: &[&str] = &["IN", "CH", "HS", "CS"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Parse zonefile text
pub fn parse_zonefile(text: &str) -> ResolveResult<Zonefile> {
    let mut origin: Option<String> = None;
    let mut ttl: Option<u32> = None;
    let mut uri_records = Vec::new();
    let mut txt_groups: Vec<TxtGroup> = Vec::new();
    let mut other_records = Vec::new();
    let mut last_owner: Option<String> = None;
    let mut last_was_txt = false;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let tokens = tokenize(line, line_no)?;
        if tokens.is_empty() {
            continue;
        }

        let first = &tokens[0];
        if !first.quoted && first.text.starts_with('$') {
            let value = tokens.get(1).map(|t| t.text.clone()).ok_or_else(|| {
                malformed(line_no, format!("{} without a value", first.text))
            })?;
            match first.text.to_uppercase().as_str() {
                "$ORIGIN" => origin = Some(value),
                "$TTL" => {
                    ttl = Some(value.parse().map_err(|_| {
                        malformed(line_no, format!("invalid $TTL '{}'", value))
                    })?)
                }
                other => return Err(malformed(line_no, format!("unsupported directive {}", other))),
            }
            last_was_txt = false;
            continue;
        }

        let inherits_owner = line.starts_with(' ') || line.starts_with('\t');
        let mut rest = tokens.as_slice();
        let owner = if inherits_owner {
            last_owner
                .clone()
                .ok_or_else(|| malformed(line_no, "record without an owner name".to_string()))?
        } else {
            let owner = rest[0].text.clone();
            rest = &rest[1..];
            owner
        };

        let mut record_ttl = None;
        for _ in 0..2 {
            match rest.first() {
                Some(t) if !t.quoted && record_ttl.is_none() && is_ttl(&t.text) => {
                    record_ttl = t.text.parse().ok();
                    rest = &rest[1..];
                }
                Some(t) if !t.quoted && CLASSES.contains(&t.text.to_uppercase().as_str()) => {
                    rest = &rest[1..];
                }
                _ => break,
            }
        }

        let record_type = rest
            .first()
            .filter(|t| !t.quoted)
            .map(|t| t.text.to_uppercase())
            .ok_or_else(|| malformed(line_no, format!("record for '{}' has no type", owner)))?;
        let rdata = &rest[1..];

        match record_type.as_str() {
            "URI" => {
                uri_records.push(parse_uri(&owner, record_ttl, rdata, line_no)?);
                last_was_txt = false;
            }
            "TXT" => {
                if rdata.is_empty() {
                    return Err(malformed(line_no, format!("TXT record for '{}' is empty", owner)));
                }
                let entries = rdata.iter().map(|t| t.text.clone());
                match txt_groups.last_mut() {
                    Some(group) if last_was_txt && group.label == owner => group.entries.extend(entries),
                    _ => txt_groups.push(TxtGroup {
                        label: owner.clone(),
                        ttl: record_ttl,
                        entries: entries.collect(),
                    }),
                }
                last_was_txt = true;
            }
            _ => {
                other_records.push(ResourceRecord {
                    name: owner.clone(),
                    ttl: record_ttl,
                    record_type,
                    data: rdata
                        .iter()
                        .map(render_token)
                        .collect::<Vec<_>>()
                        .join(" "),
                });
                last_was_txt = false;
            }
        }

        last_owner = Some(owner);
    }

    let origin = origin.ok_or_else(|| {
        ResolutionError::MalformedZonefile("missing $ORIGIN directive".to_string())
    })?;

    Ok(Zonefile {
        origin,
        ttl,
        uri_records,
        txt_groups,
        other_records,
    })
}

fn parse_uri(
    owner: &str,
    ttl: Option<u32>,
    rdata: &[Token],
    line_no: usize,
) -> ResolveResult<UriRecord> {
    let [priority, weight, target, ..] = rdata else {
        return Err(malformed(
            line_no,
            format!("URI record for '{}' needs priority, weight and target", owner),
        ));
    };

    let priority = priority
        .text
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid URI priority '{}'", priority.text)))?;
    let weight = weight
        .text
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid URI weight '{}'", weight.text)))?;

    Ok(UriRecord {
        name: owner.to_string(),
        ttl,
        priority,
        weight,
        target: target.text.clone(),
    })
}

fn tokenize(line: &str, line_no: usize) -> ResolveResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ';' {
            break;
        } else if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => text.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => text.push(other),
                }
            }
            if !closed {
                return Err(malformed(line_no, "unterminated quoted string".to_string()));
            }
            tokens.push(Token { text, quoted: true });
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == ';' || c == '"' {
                    break;
                }
                text.push(c);
                chars.next();
            }
            tokens.push(Token {
                text,
                quoted: false,
            });
        }
    }

    Ok(tokens)
}

fn render_token(token: &Token) -> String {
    if token.quoted {
        super::quote(&token.text)
    } else {
        token.text.clone()
    }
}

fn is_ttl(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn malformed(line_no: usize, message: String) -> ResolutionError {
    ResolutionError::MalformedZonefile(format!("line {}: {}", line_no, message))
}
