/// Clarity consensus serialization, enough to read BNS contract-call arguments
///
/// The node reports every function argument as a hex string of its
/// consensus-serialized value. Names and namespaces are buffers holding ASCII,
/// zonefile hashes are 20-byte buffers.
use crate::address::c32;
use crate::error::{ResolutionError, ResolveResult};

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_NONE: u8 = 0x09;
const TYPE_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

/// Deepest optional/response nesting accepted
pub const MAX_NESTING_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    StandardPrincipal {
        version: u8,
        hash160: [u8; 20],
    },
    ContractPrincipal {
        version: u8,
        hash160: [u8; 20],
        name: String,
    },
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    /// Buffer contents, or `None` for any other type
    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            ClarityValue::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Interpret a buffer or string value as ASCII text
    pub fn to_ascii(&self) -> ResolveResult<String> {
        match self {
            ClarityValue::Buffer(bytes) => {
                if !bytes.is_ascii() {
                    return Err(ResolutionError::MalformedArguments(format!(
                        "buffer 0x{} is not ASCII",
                        hex::encode(bytes)
                    )));
                }
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            ClarityValue::StringAscii(s) | ClarityValue::StringUtf8(s) => Ok(s.clone()),
            other => Err(ResolutionError::MalformedArguments(format!(
                "expected a buffer or string, got {:?}",
                other
            ))),
        }
    }

    /// Principal rendered as a c32 address (`addr` or `addr.contract`)
    pub fn to_principal(&self) -> ResolveResult<String> {
        match self {
            ClarityValue::StandardPrincipal { version, hash160 } => {
                c32::c32_address(*version, hash160)
            }
            ClarityValue::ContractPrincipal {
                version,
                hash160,
                name,
            } => Ok(format!("{}.{}", c32::c32_address(*version, hash160)?, name)),
            other => Err(ResolutionError::MalformedArguments(format!(
                "expected a principal, got {:?}",
                other
            ))),
        }
    }

    /// Consensus serialization of this value
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// Consensus serialization as `0x`-prefixed hex, the form the node API reports
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            ClarityValue::Int(v) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Buffer(bytes) => {
                out.push(TYPE_BUFFER);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            ClarityValue::Bool(true) => out.push(TYPE_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_FALSE),
            ClarityValue::StandardPrincipal { version, hash160 } => {
                out.push(TYPE_STANDARD_PRINCIPAL);
                out.push(*version);
                out.extend_from_slice(hash160);
            }
            ClarityValue::ContractPrincipal {
                version,
                hash160,
                name,
            } => {
                out.push(TYPE_CONTRACT_PRINCIPAL);
                out.push(*version);
                out.extend_from_slice(hash160);
                out.push(name.len() as u8);
                out.extend_from_slice(name.as_bytes());
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TYPE_RESPONSE_OK);
                inner.write(out);
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TYPE_RESPONSE_ERR);
                inner.write(out);
            }
            ClarityValue::OptionalNone => out.push(TYPE_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(TYPE_SOME);
                inner.write(out);
            }
            ClarityValue::StringAscii(s) => {
                out.push(TYPE_STRING_ASCII);
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            ClarityValue::StringUtf8(s) => {
                out.push(TYPE_STRING_UTF8);
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }
}

/// Decode one hex-encoded value (an optional `0x` prefix is accepted)
pub fn decode_hex(hex_value: &str) -> ResolveResult<ClarityValue> {
    let trimmed = crate::identifier::strip_hex_prefix(hex_value.trim());
    let bytes = hex::decode(trimmed).map_err(|e| {
        ResolutionError::MalformedArguments(format!("'{}' is not hex: {}", hex_value, e))
    })?;
    decode(&bytes)
}

/// Decode exactly one value from `bytes`
pub fn decode(bytes: &[u8]) -> ResolveResult<ClarityValue> {
    let mut reader = Reader {
        bytes,
        pos: 0,
        depth: 0,
    };
    let value = reader.value()?;

    if reader.pos != bytes.len() {
        return Err(ResolutionError::MalformedArguments(format!(
            "{} trailing bytes after value",
            bytes.len() - reader.pos
        )));
    }
    Ok(value)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> ResolveResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ResolutionError::MalformedArguments(format!(
                "value truncated at byte {}",
                self.pos
            ))),
        }
    }

    fn byte(&mut self) -> ResolveResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32_len(&mut self) -> ResolveResult<usize> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf) as usize)
    }

    fn bytes16(&mut self) -> ResolveResult<[u8; 16]> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn hash160(&mut self) -> ResolveResult<[u8; 20]> {
        let mut buf = [0u8; 20];
        buf.copy_from_slice(self.take(20)?);
        Ok(buf)
    }

    fn utf8(&mut self, len: usize) -> ResolveResult<String> {
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| {
            ResolutionError::MalformedArguments(format!("string is not UTF-8: {}", e))
        })
    }

    fn nested(&mut self) -> ResolveResult<ClarityValue> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ResolutionError::MalformedArguments(format!(
                "value nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let value = self.value();
        self.depth -= 1;
        value
    }

    fn value(&mut self) -> ResolveResult<ClarityValue> {
        let type_id = self.byte()?;
        let value = match type_id {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.bytes16()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.bytes16()?)),
            TYPE_BUFFER => {
                let len = self.u32_len()?;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_STANDARD_PRINCIPAL => ClarityValue::StandardPrincipal {
                version: self.byte()?,
                hash160: self.hash160()?,
            },
            TYPE_CONTRACT_PRINCIPAL => {
                let version = self.byte()?;
                let hash160 = self.hash160()?;
                let len = self.byte()? as usize;
                ClarityValue::ContractPrincipal {
                    version,
                    hash160,
                    name: self.utf8(len)?,
                }
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.nested()?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.nested()?)),
            TYPE_NONE => ClarityValue::OptionalNone,
            TYPE_SOME => ClarityValue::OptionalSome(Box::new(self.nested()?)),
            TYPE_STRING_ASCII => {
                let len = self.u32_len()?;
                let s = self.utf8(len)?;
                if !s.is_ascii() {
                    return Err(ResolutionError::MalformedArguments(
                        "string-ascii holds non-ASCII bytes".to_string(),
                    ));
                }
                ClarityValue::StringAscii(s)
            }
            TYPE_STRING_UTF8 => {
                let len = self.u32_len()?;
                ClarityValue::StringUtf8(self.utf8(len)?)
            }
            TYPE_LIST | TYPE_TUPLE => {
                return Err(ResolutionError::MalformedArguments(format!(
                    "unsupported clarity type 0x{:02x}",
                    type_id
                )))
            }
            other => {
                return Err(ResolutionError::MalformedArguments(format!(
                    "unknown clarity type 0x{:02x}",
                    other
                )))
            }
        };
        Ok(value)
    }
}
