// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Locating XMP and IPTC blocks without reading image data
//!
//! JPEG files are walked segment by segment up to the start of scan; only
//! APP1 (XMP) and APP13 (Photoshop/IPTC) payloads are loaded. Other
//! formats are searched for an XMP packet within a bounded prefix.

use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

use super::{iptc, xmp};
use crate::Result;

/// Bytes searched for an XMP packet in files that are not JPEG
pub const SCAN_LIMIT: u64 = 1024 * 1024;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP1: u8 = 0xE1;
const APP13: u8 = 0xED;

const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const PHOTOSHOP_ID: &[u8] = b"Photoshop 3.0\0";

/// Raw metadata blocks of one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBlocks {
    /// Bytes holding the XMP packet
    pub xmp: Option<Vec<u8>>,
    /// IPTC record stream
    pub iptc: Option<Vec<u8>>,
}

/// Read the metadata blocks of a file, starting from its beginning
pub fn read_blocks<R: Read + Seek>(reader: &mut R) -> Result<MetadataBlocks> {
    reader.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 2];
    let is_jpeg = read_or_eof(reader, &mut magic)? && magic == [0xFF, SOI];

    if is_jpeg {
        read_jpeg_segments(reader)
    } else {
        reader.seek(SeekFrom::Start(0))?;
        read_prefix(reader)
    }
}

fn read_jpeg_segments<R: Read + Seek>(reader: &mut R) -> Result<MetadataBlocks> {
    let mut blocks = MetadataBlocks::default();
    let mut marker = [0u8; 2];

    loop {
        if !read_or_eof(reader, &mut marker)? {
            break;
        }
        if marker[0] != 0xFF {
            debug!("JPEG marker expected, found {:#04x}", marker[0]);
            break;
        }
        match marker[1] {
            // Fill byte: the next byte is the marker code
            0xFF => {
                reader.seek(SeekFrom::Current(-1))?;
                continue;
            }
            0x01 | 0xD0..=0xD7 => continue,
            EOI | SOS => break,
            _ => {}
        }

        let mut len = [0u8; 2];
        if !read_or_eof(reader, &mut len)? {
            break;
        }
        let Some(payload_len) = usize::from(u16::from_be_bytes(len)).checked_sub(2) else {
            debug!("Invalid JPEG segment length");
            break;
        };

        let code = marker[1];
        if code != APP1 && code != APP13 {
            reader.seek(SeekFrom::Current(payload_len as i64))?;
            continue;
        }
        let mut payload = vec![0u8; payload_len];
        if !read_or_eof(reader, &mut payload)? {
            debug!("Truncated JPEG segment {:#04x}", code);
            break;
        }

        if code == APP1 {
            if let Some(packet) = payload.strip_prefix(XMP_ID) {
                blocks.xmp.get_or_insert_with(|| packet.to_vec());
            }
        } else if let Some(resources) = payload.strip_prefix(PHOTOSHOP_ID) {
            if let Some(records) = iptc::find_resource(resources) {
                blocks
                    .iptc
                    .get_or_insert_with(Vec::new)
                    .extend_from_slice(records);
            }
        }
    }

    Ok(blocks)
}

fn read_prefix<R: Read>(reader: &mut R) -> Result<MetadataBlocks> {
    let mut prefix = Vec::new();
    reader.by_ref().take(SCAN_LIMIT).read_to_end(&mut prefix)?;
    Ok(MetadataBlocks {
        xmp: xmp::find_packet(&prefix).map(<[u8]>::to_vec),
        iptc: None,
    })
}

/// Fill `buf` completely; false if the input ends first
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// JPEG marker segment with its length header
#[cfg(test)]
pub(crate) fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFF, code];
    bytes.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[cfg(test)]
pub(crate) fn xmp_segment(packet: &str) -> Vec<u8> {
    let mut payload = XMP_ID.to_vec();
    payload.extend_from_slice(packet.as_bytes());
    segment(APP1, &payload)
}

#[cfg(test)]
pub(crate) fn iptc_segment(records: &[u8]) -> Vec<u8> {
    let mut payload = PHOTOSHOP_ID.to_vec();
    payload.extend(iptc::resource(0x0404, records));
    segment(APP13, &payload)
}
