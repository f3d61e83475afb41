// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! IPTC-IIM keywords and caption
//!
//! Photoshop stores the IPTC record stream as image resource 0x0404 inside
//! the JPEG APP13 segment. Only datasets 2:25 (keywords) and 2:120
//! (caption) are read.

use tracing::debug;

const RESOURCE_SIGNATURE: &[u8] = b"8BIM";
const IPTC_RESOURCE: u16 = 0x0404;
const TAG_MARKER: u8 = 0x1C;

const KEYWORDS: (u8, u8) = (2, 25);
const CAPTION: (u8, u8) = (2, 120);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IptcData {
    pub keywords: Vec<String>,
    pub caption: Option<String>,
}

/// IPTC block among Photoshop image resources
pub fn find_resource(resources: &[u8]) -> Option<&[u8]> {
    let mut offset = 0;
    while offset < resources.len() {
        if resources.get(offset..offset + 4)? != RESOURCE_SIGNATURE {
            debug!("Unexpected Photoshop resource signature at {}", offset);
            return None;
        }
        let id = u16::from_be_bytes(resources.get(offset + 4..offset + 6)?.try_into().ok()?);
        // Pascal string name, padded to an even size
        let name_len = usize::from(*resources.get(offset + 6)?);
        let size_at = offset + 6 + ((name_len + 2) & !1);
        let size = u32::from_be_bytes(resources.get(size_at..size_at + 4)?.try_into().ok()?);
        let start = size_at + 4;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        let body = resources.get(start..end)?;
        if id == IPTC_RESOURCE {
            return Some(body);
        }
        offset = end + (end - start) % 2;
    }
    None
}

/// Read keywords and caption from an IPTC record stream.
///
/// Parsing stops quietly at the first malformed dataset.
pub fn parse_records(data: &[u8]) -> IptcData {
    let mut iptc = IptcData::default();
    let mut offset = 0;

    while offset + 5 <= data.len() {
        if data[offset] != TAG_MARKER {
            debug!("IPTC tag marker missing at {}", offset);
            break;
        }
        let tag = (data[offset + 1], data[offset + 2]);
        let mut len = usize::from(u16::from_be_bytes([data[offset + 3], data[offset + 4]]));
        let mut start = offset + 5;

        // Extended dataset: the low bits count the length bytes that follow
        if len & 0x8000 != 0 {
            let count = len & 0x7FFF;
            let bytes = match data.get(start..start + count) {
                Some(b) if count <= 4 => b,
                _ => break,
            };
            len = bytes.iter().fold(0, |acc, b| (acc << 8) | usize::from(*b));
            start += count;
        }

        let value = match start.checked_add(len).and_then(|end| data.get(start..end)) {
            Some(v) => v,
            None => {
                debug!("Truncated IPTC dataset {}:{}", tag.0, tag.1);
                break;
            }
        };

        if tag == KEYWORDS {
            if let Some(keyword) = decode(value) {
                iptc.keywords.push(keyword);
            }
        } else if tag == CAPTION && iptc.caption.is_none() {
            iptc.caption = decode(value);
        }
        offset = start + len;
    }

    iptc
}

/// UTF-8 when valid, Latin-1 otherwise
fn decode(value: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(value) {
        Ok(s) => s.to_string(),
        Err(_) => value.iter().map(|&b| char::from(b)).collect(),
    };
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
pub(crate) fn dataset(record: u8, number: u8, value: &[u8]) -> Vec<u8> {
    let mut bytes = vec![TAG_MARKER, record, number];
    bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
    bytes.extend_from_slice(value);
    bytes
}

#[cfg(test)]
pub(crate) fn resource(id: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = RESOURCE_SIGNATURE.to_vec();
    bytes.extend_from_slice(&id.to_be_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(body);
    if body.len() % 2 == 1 {
        bytes.push(0);
    }
    bytes
}
