//! `tx_extra` decoding and commitment extraction.
//!
//! `tx_extra` is a sequence of tagged fields. Two tags have fixed layouts
//! inherited from CryptoNote: `0x00` is a run of zero padding and `0x01`
//! is a bare 32-byte transaction public key. Every other tag is followed by
//! a varint length and that many payload bytes, so unknown tags can always
//! be skipped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProofError;

pub const TAG_PADDING: u8 = 0x00;
pub const TAG_PUBKEY: u8 = 0x01;
pub const TAG_NONCE: u8 = 0x02;
pub const TAG_HEAT_COMMITMENT: u8 = 0x08;

/// Fixed commitment payload size
pub const COMMITMENT_LEN: usize = 32;

const PUBKEY_LEN: usize = 32;
const MAX_PADDING: usize = 255;
const MAX_VARINT_BYTES: usize = 10;

/// One decoded `tx_extra` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraField<'a> {
    /// Number of bytes consumed, tag included
    Padding(usize),
    /// Bare 32-byte key after tag `0x01`. Neither this nor `0x00` padding
    /// carries a length prefix, so a length-prefixed `0x01` field is misread.
    PublicKey(&'a [u8]),
    Tagged { tag: u8, payload: &'a [u8] },
}

/// Borrowed view over a `tx_extra` blob
#[derive(Debug, Clone, Copy)]
pub struct TxExtra<'a> {
    data: &'a [u8],
}

impl<'a> TxExtra<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn fields(&self) -> ExtraFields<'a> {
        ExtraFields { data: self.data, pos: 0, failed: false }
    }
}

/// Iterator over fields; yields at most one error and then stops
pub struct ExtraFields<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ExtraFields<'a> {
    fn fail(&mut self, msg: String) -> Option<Result<ExtraField<'a>, ProofError>> {
        self.failed = true;
        Some(Err(ProofError::MalformedExtra(msg)))
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }
}

impl<'a> Iterator for ExtraFields<'a> {
    type Item = Result<ExtraField<'a>, ProofError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let offset = self.pos;
        let tag = self.data[offset];
        self.pos += 1;

        match tag {
            TAG_PADDING => {
                let mut consumed = 1;
                while consumed < MAX_PADDING && self.data.get(self.pos) == Some(&0) {
                    self.pos += 1;
                    consumed += 1;
                }
                Some(Ok(ExtraField::Padding(consumed)))
            }
            TAG_PUBKEY => match self.take(PUBKEY_LEN) {
                Some(key) => Some(Ok(ExtraField::PublicKey(key))),
                None => self.fail(format!("truncated public key at offset {}", offset)),
            },
            _ => {
                let Some((len, width)) = read_varint(&self.data[self.pos..]) else {
                    return self.fail(format!("bad length for tag 0x{:02x} at offset {}", tag, offset));
                };
                self.pos += width;
                let payload = usize::try_from(len).ok().and_then(|len| self.take(len));
                match payload {
                    Some(payload) => Some(Ok(ExtraField::Tagged { tag, payload })),
                    None => self.fail(format!(
                        "tag 0x{:02x} at offset {} declares {} bytes past end",
                        tag, offset, len
                    )),
                }
            }
        }
    }
}

/// Read a LEB128 varint, returning `(value, bytes_read)`
pub fn read_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, byte) in data.iter().take(MAX_VARINT_BYTES).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Append `value` as a LEB128 varint
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Protocol commitment binding a burn to its destination-chain claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment(pub [u8; COMMITMENT_LEN]);

impl Commitment {
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LEN] {
        &self.0
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = crate::hash::decode_hex(&s).map_err(serde::de::Error::custom)?;
        let arr: [u8; COMMITMENT_LEN] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("commitment must be 32 bytes"))?;
        Ok(Commitment(arr))
    }
}

/// Finds the commitment field in `tx_extra`
#[derive(Debug, Clone, Copy)]
pub struct CommitmentExtractor {
    tag: u8,
}

impl Default for CommitmentExtractor {
    fn default() -> Self {
        Self::new(TAG_HEAT_COMMITMENT)
    }
}

impl CommitmentExtractor {
    pub fn new(tag: u8) -> Self {
        Self { tag }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Scan fields in order and return the first commitment payload.
    ///
    /// Fields after the commitment are never decoded.
    pub fn extract(&self, extra: &[u8]) -> Result<Commitment, ProofError> {
        for field in TxExtra::new(extra).fields() {
            let ExtraField::Tagged { tag, payload } = field? else {
                continue;
            };
            if tag != self.tag {
                continue;
            }
            let bytes: [u8; COMMITMENT_LEN] = payload.try_into().map_err(|_| {
                ProofError::MalformedExtra(format!(
                    "commitment payload is {} bytes, expected {}",
                    payload.len(),
                    COMMITMENT_LEN
                ))
            })?;
            return Ok(Commitment(bytes));
        }

        Err(ProofError::MalformedExtra(format!(
            "commitment tag 0x{:02x} not present",
            self.tag
        )))
    }
}

/// Encode a length-prefixed field
pub fn encode_field(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    write_varint(&mut out, payload.len() as u64);
    out.extend_from_slice(payload);
    out
}
