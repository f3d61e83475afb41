// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Minimal XMP packet parsing
//!
//! Only the properties the catalog needs are extracted: `xmp:Rating`,
//! the `dc:subject` keyword bag and the default `dc:description`.
//! Elements are matched by namespace URI, so any prefix works and
//! same-named properties of other schemas (`MicrosoftPhoto:Rating`) are
//! ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::NsReader;

use crate::{PhotoViewError, Result};

const PACKET_START: &[u8] = b"<x:xmpmeta";
const PACKET_END: &[u8] = b"</x:xmpmeta>";

const XMP_NS: &[u8] = b"http://ns.adobe.com/xap/1.0/";
const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";
const RDF_NS: &[u8] = b"http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Properties read from an XMP packet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpData {
    pub rating: Option<i32>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
}

/// Locate an embedded XMP packet in raw file bytes
pub fn find_packet(data: &[u8]) -> Option<&[u8]> {
    let start = find(data, PACKET_START)?;
    let end = find(&data[start..], PACKET_END)? + start + PACKET_END.len();
    Some(&data[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse the embedded packet of a file's bytes, if there is one
pub fn read_embedded(data: &[u8]) -> Result<Option<XmpData>> {
    match find_packet(data) {
        Some(packet) => {
            let text = std::str::from_utf8(packet)
                .map_err(|e| PhotoViewError::metadata("xmp packet", e))?;
            parse_packet(text).map(Some)
        }
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Rating,
    Subject,
    Description,
    ListItem,
    Other,
}

/// Parse an XMP packet
pub fn parse_packet(packet: &str) -> Result<XmpData> {
    let mut reader = NsReader::from_str(packet);

    let mut data = XmpData::default();
    let mut path: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                read_rating_attribute(&reader, &e, &mut data)?;
                path.push(classify(&reader, e.name()));
            }
            Event::Empty(e) => read_rating_attribute(&reader, &e, &mut data)?,
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match path.last() {
                    Some(Element::Rating) => {
                        if let Ok(rating) = text.parse::<i32>() {
                            data.rating = Some(rating);
                        }
                    }
                    Some(Element::ListItem) if path.contains(&Element::Subject) => {
                        data.keywords.push(text.to_string());
                    }
                    Some(Element::ListItem) if path.contains(&Element::Description) => {
                        if data.description.is_none() {
                            data.description = Some(text.to_string());
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(data)
}

fn classify(reader: &NsReader<&[u8]>, name: QName<'_>) -> Element {
    let (ns, local) = reader.resolve_element(name);
    let ns = match ns {
        ResolveResult::Bound(Namespace(ns)) => ns,
        _ => return Element::Other,
    };
    let local = local.as_ref();
    if ns == XMP_NS && local == b"Rating" {
        Element::Rating
    } else if ns == DC_NS && local == b"subject" {
        Element::Subject
    } else if ns == DC_NS && local == b"description" {
        Element::Description
    } else if ns == RDF_NS && local == b"li" {
        Element::ListItem
    } else {
        Element::Other
    }
}

fn read_rating_attribute(
    reader: &NsReader<&[u8]>,
    e: &BytesStart<'_>,
    data: &mut XmpData,
) -> Result<()> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PhotoViewError::metadata("xmp packet", err))?;
        let is_rating = match reader.resolve_attribute(attr.key) {
            (ResolveResult::Bound(Namespace(ns)), local) => {
                ns == XMP_NS && local.as_ref() == b"Rating"
            }
            _ => false,
        };
        if is_rating {
            let value = attr.unescape_value()?;
            if let Ok(rating) = value.trim().parse::<i32>() {
                data.rating = Some(rating);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmp:Rating="4">
   <dc:subject>
    <rdf:Bag>
     <rdf:li>Scotland</rdf:li>
     <rdf:li>castle &amp; loch</rdf:li>
    </rdf:Bag>
   </dc:subject>
   <dc:description>
    <rdf:Alt>
     <rdf:li xml:lang="x-default">Eilean Donan at dusk</rdf:li>
    </rdf:Alt>
   </dc:description>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#;

    #[test]
    fn test_parse_attribute_rating_and_keywords() {
        let data = parse_packet(PACKET).unwrap();
        assert_eq!(data.rating, Some(4));
        assert_eq!(data.keywords, vec!["Scotland", "castle & loch"]);
        assert_eq!(data.description.as_deref(), Some("Eilean Donan at dusk"));
    }

    #[test]
    fn test_parse_element_rating() {
        let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
            <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
            <rdf:Description xmlns:xap="http://ns.adobe.com/xap/1.0/">
            <xap:Rating>2</xap:Rating></rdf:Description></rdf:RDF></x:xmpmeta>"#;
        let data = parse_packet(packet).unwrap();
        assert_eq!(data.rating, Some(2));
        assert!(data.keywords.is_empty());
        assert!(data.description.is_none());
    }

    #[test]
    fn test_rating_of_other_schemas_is_ignored() {
        let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
            <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
            <rdf:Description
              xmlns:xmp="http://ns.adobe.com/xap/1.0/"
              xmlns:MicrosoftPhoto="http://ns.microsoft.com/photo/1.0/"
              MicrosoftPhoto:Rating="75">
            <xmp:Rating>3</xmp:Rating>
            <MicrosoftPhoto:Rating>50</MicrosoftPhoto:Rating>
            </rdf:Description></rdf:RDF></x:xmpmeta>"#;
        assert_eq!(parse_packet(packet).unwrap().rating, Some(3));
    }

    #[test]
    fn test_undeclared_prefixes_are_ignored() {
        let packet = r#"<x:xmpmeta><rdf:RDF><rdf:Description xmp:Rating="5">
            <dc:subject><rdf:Bag><rdf:li>loch</rdf:li></rdf:Bag></dc:subject>
            </rdf:Description></rdf:RDF></x:xmpmeta>"#;
        let data = parse_packet(packet).unwrap();
        assert_eq!(data.rating, None);
        assert!(data.keywords.is_empty());
    }

    #[test]
    fn test_find_packet_in_surrounding_bytes() {
        let mut bytes = vec![0xFFu8, 0xD8, 0x00, 0x12];
        bytes.extend_from_slice(PACKET.as_bytes());
        bytes.extend_from_slice(&[0x00, 0xFF, 0xD9]);

        let packet = find_packet(&bytes).unwrap();
        assert!(packet.starts_with(PACKET_START));
        assert!(packet.ends_with(PACKET_END));

        let data = read_embedded(&bytes).unwrap().unwrap();
        assert_eq!(data.keywords.len(), 2);
    }

    #[test]
    fn test_no_packet() {
        assert!(find_packet(b"just some bytes").is_none());
        assert_eq!(read_embedded(b"").unwrap(), None);
    }
}
