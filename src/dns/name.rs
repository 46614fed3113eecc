//! Domain names and their wire encoding (RFC 1035 §3.1, §4.1.4).
//!
//! A name on the wire is a series of labels, each prefixed with a length
//! byte, terminated with a zero length byte. When the top two bits of a
//! length byte are set, it and the following byte form a 14 bit offset
//! into the message where the rest of the name continues.

use std::fmt;
use std::str::FromStr;

use crate::error::{ResolveError, Result};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_POINTER_HOPS: usize = 16;

const POINTER_MASK: u8 = 0xC0;

/// A validated domain name.
///
/// Labels are stored lowercased, so equality and hashing are
/// case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    pub fn root() -> Self {
        Name { labels: Vec::new() }
    }

    /// Parses dotted text such as `dns.google.com` or `dns.google.com.`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_suffix('.').unwrap_or(text);
        if text.is_empty() {
            return Ok(Name::root());
        }

        let labels: Vec<&str> = text.split('.').collect();
        Name::from_labels(&labels)
    }

    pub fn from_labels<L: AsRef<[u8]>>(labels: &[L]) -> Result<Self> {
        // validates every length invariant
        encode(labels)?;

        Ok(Name {
            labels: labels
                .iter()
                .map(|label| label.as_ref().to_ascii_lowercase())
                .collect(),
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(Vec::as_slice)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    // labels + length prefixes + terminator
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        out
    }

    /// True when `self` equals `zone` or sits below it, compared label by label.
    pub fn is_subdomain_of(&self, zone: &Name) -> bool {
        self.labels.len() >= zone.labels.len()
            && self
                .labels
                .iter()
                .rev()
                .zip(zone.labels.iter().rev())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }

        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

/// Encodes a sequence of labels into wire format, uncompressed.
pub fn encode<L: AsRef<[u8]>>(labels: &[L]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(MAX_NAME_LEN);

    for label in labels {
        let label = label.as_ref();
        if label.is_empty() {
            return Err(ResolveError::InvalidLabel("empty label".into()));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(ResolveError::InvalidLabel(format!(
                "label of {} bytes exceeds {}",
                label.len(),
                MAX_LABEL_LEN
            )));
        }

        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }

    // terminating root label
    out.push(0);

    if out.len() > MAX_NAME_LEN {
        return Err(ResolveError::InvalidLabel(format!(
            "name of {} bytes exceeds {}",
            out.len(),
            MAX_NAME_LEN
        )));
    }

    Ok(out)
}

/// Decodes the name starting at `offset` in `msg`.
///
/// Returns the name and the number of bytes it occupies at `offset`.
/// Bytes reached through compression pointers are not counted.
pub fn decode(msg: &[u8], offset: usize) -> Result<(Name, usize)> {
    let mut labels = Vec::new();
    let mut pos = offset;
    let mut wire_len = 1;

    // set once the first pointer is followed
    let mut consumed = None;
    let mut visited: Vec<usize> = Vec::new();

    loop {
        let len = *msg
            .get(pos)
            .ok_or_else(|| ResolveError::malformed(format!("name at {} runs past end", offset)))?;

        match len & POINTER_MASK {
            POINTER_MASK => {
                let low = *msg.get(pos + 1).ok_or_else(|| {
                    ResolveError::malformed(format!("truncated pointer at offset {}", pos))
                })?;
                let target = (((len & !POINTER_MASK) as usize) << 8) | low as usize;

                if consumed.is_none() {
                    consumed = Some(pos + 2 - offset);
                }

                // pointers only go backwards, never to the same place twice
                if target >= pos || visited.contains(&target) || visited.len() >= MAX_POINTER_HOPS
                {
                    return Err(ResolveError::CompressionLoop(pos));
                }
                visited.push(target);
                pos = target;
            }
            0x00 => {
                pos += 1;
                if len == 0 {
                    break;
                }

                let len = len as usize;
                let label = msg.get(pos..pos + len).ok_or_else(|| {
                    ResolveError::malformed(format!("label at offset {} runs past end", pos - 1))
                })?;

                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(ResolveError::malformed(format!(
                        "name at {} longer than {} bytes",
                        offset, MAX_NAME_LEN
                    )));
                }

                labels.push(label.to_ascii_lowercase());
                pos += len;
            }
            _ => {
                return Err(ResolveError::malformed(format!(
                    "reserved label type {:#04x} at offset {}",
                    len, pos
                )));
            }
        }
    }

    // after a jump `pos` may sit before `offset`
    let consumed = match consumed {
        Some(consumed) => consumed,
        None => pos - offset,
    };
    Ok((Name { labels }, consumed))
}
