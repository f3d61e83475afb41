// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! EXIF, IPTC and XMP metadata reader

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, Field, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use super::{container, iptc, xmp, FormatRegistry, MetadataReader, PhotoRecord};
use crate::config::CatalogConfig;
use crate::{PhotoViewError, Result};

/// Error kamadak-exif gives for containers it cannot hold EXIF in (GIF, BMP)
const UNKNOWN_CONTAINER: &str = "Unknown image format";

/// Reads EXIF tags with `kamadak-exif`, IPTC datasets and the embedded XMP
/// packet. Later sources win for the caption: XMP over IPTC over EXIF.
/// Keywords of IPTC and XMP are merged.
#[derive(Debug, Clone, Default)]
pub struct ExifMetadataReader {
    formats: FormatRegistry,
}

impl ExifMetadataReader {
    pub fn new(formats: FormatRegistry) -> Self {
        Self { formats }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(FormatRegistry::new(&config.extra_image_extensions))
    }

    fn apply_exif(record: &mut PhotoRecord, exif: &Exif) {
        if let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
            record.date = parse_exif_date(field);
        }
        if let Some(field) = exif.get_field(Tag::Model, In::PRIMARY) {
            record.camera_model = ascii_value(field);
        }
        if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
            if let Some(v) = field.value.get_uint(0) {
                record.orientation = u16::try_from(v).unwrap_or(0);
            }
        }
        if let Some(field) = exif.get_field(Tag::ImageDescription, In::PRIMARY) {
            record.caption = ascii_value(field);
        }
        if let Some((lat, lon)) = gps_position(exif) {
            record.lat = lat;
            record.lon = lon;
        }
    }

    fn apply_iptc(record: &mut PhotoRecord, data: iptc::IptcData) {
        if data.caption.is_some() {
            record.caption = data.caption;
        }
        record.keywords.extend(data.keywords);
    }

    fn apply_xmp(record: &mut PhotoRecord, data: xmp::XmpData) {
        if let Some(rating) = data.rating {
            // -1 marks rejected photos
            record.rating = rating.clamp(0, 5) as u8;
        }
        if data.description.is_some() {
            record.caption = data.description;
        }
        record.keywords.extend(data.keywords);
    }
}

impl MetadataReader for ExifMetadataReader {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn read(&self, path: &Path) -> Result<PhotoRecord> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PhotoViewError::metadata(path.display().to_string(), "invalid file name"))?
            .to_string();

        if !self.formats.is_supported(path) {
            return Err(PhotoViewError::UnsupportedFileType(file_name));
        }

        let mut file = BufReader::new(File::open(path)?);
        let mut record = PhotoRecord::degraded(file_name.as_str());

        match exif::Reader::new().read_from_container(&mut file) {
            Ok(exif) => Self::apply_exif(&mut record, &exif),
            Err(exif::Error::NotFound(_)) => debug!("No EXIF data in {}", file_name),
            Err(exif::Error::InvalidFormat(msg)) if msg == UNKNOWN_CONTAINER => {
                debug!("No EXIF container in {}", file_name)
            }
            Err(e) => return Err(PhotoViewError::metadata(file_name, e)),
        }

        let blocks = container::read_blocks(&mut file)?;
        if let Some(records) = blocks.iptc {
            Self::apply_iptc(&mut record, iptc::parse_records(&records));
        }
        if let Some(bytes) = blocks.xmp {
            if let Some(xmp_data) = xmp::read_embedded(&bytes)? {
                Self::apply_xmp(&mut record, xmp_data);
            }
        }

        Ok(record)
    }

    fn is_image_format_supported(&self, path: &Path) -> bool {
        self.formats.is_supported(path)
    }
}

fn ascii_value(field: &Field) -> Option<String> {
    match field.value {
        Value::Ascii(ref vec) => vec
            .first()
            .map(|v| String::from_utf8_lossy(v).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn parse_exif_date(field: &Field) -> Option<NaiveDateTime> {
    let raw = match field.value {
        Value::Ascii(ref vec) => vec.first()?,
        _ => return None,
    };
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
}

fn gps_position(exif: &Exif) -> Option<(f64, f64)> {
    let lat = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let lon = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some((lat, lon))
}

/// Degrees/minutes/seconds rationals to signed decimal degrees
fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let parts = match field.value {
        Value::Rational(ref v) if !v.is_empty() => v,
        _ => return None,
    };
    let mut degrees = 0.0;
    for (i, part) in parts.iter().take(3).enumerate() {
        if part.denom == 0 {
            return None;
        }
        degrees += part.to_f64() / 60f64.powi(i as i32);
    }
    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match f.value {
            Value::Ascii(ref vec) => vec.first().and_then(|v| v.first().copied()),
            _ => None,
        })
        .map(|c| c.to_ascii_uppercase() == negative_ref)
        .unwrap_or(false);
    Some(if negative { -degrees } else { degrees })
}
