//! # Metadata Module
//!
//! Reads the capture time of a photo.
//!
//! The capture time decides where a photo lands in the destination tree and
//! is written back onto the copy as its modification time. Lookup goes
//! through the `CaptureTimeSource` trait so tests and other front ends can
//! substitute their own source.

use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

/// EXIF wall-clock format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Supplies the capture time for an already opened photo.
pub trait CaptureTimeSource: Send + Sync {
    /// Read the capture time from `file`. The read position afterwards is
    /// unspecified.
    fn capture_time(&self, file: &mut File, path: &Path) -> Result<NaiveDateTime, MetadataError>;
}

/// Capture time from EXIF `DateTimeOriginal`, falling back to `DateTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCaptureTime;

impl CaptureTimeSource for ExifCaptureTime {
    fn capture_time(&self, file: &mut File, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        file.seek(SeekFrom::Start(0))
            .map_err(|source| MetadataError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut bufreader = BufReader::new(&*file);
        let exif_reader = Reader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| MetadataError::NoExif {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        [Tag::DateTimeOriginal, Tag::DateTime]
            .iter()
            .filter_map(|tag| exif_reader.get_field(*tag, In::PRIMARY))
            .find_map(|field| parse_exif_datetime(&field.value))
            .ok_or_else(|| MetadataError::NoCaptureTime {
                path: path.to_path_buf(),
            })
    }
}

/// Parse an EXIF ASCII date value
fn parse_exif_datetime(value: &Value) -> Option<NaiveDateTime> {
    let Value::Ascii(ref vec) = value else {
        return None;
    };
    let bytes = vec.first()?;
    let s = std::str::from_utf8(bytes).ok()?;
    NaiveDateTime::parse_from_str(s.trim_end_matches('\0').trim(), EXIF_DATETIME_FORMAT).ok()
}

/// Capture time that ignores the file and always answers the same.
///
/// Useful for dry runs over files without metadata and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedCaptureTime(pub NaiveDateTime);

impl CaptureTimeSource for FixedCaptureTime {
    fn capture_time(&self, _file: &mut File, _path: &Path) -> Result<NaiveDateTime, MetadataError> {
        Ok(self.0)
    }
}

/// Test support: minimal JPEG files carrying an EXIF capture time.
#[doc(hidden)]
pub mod testing {
    /// Build a JPEG whose only content is an APP1 segment holding
    /// `DateTimeOriginal = datetime` (format "YYYY:MM:DD HH:MM:SS"),
    /// followed by `payload` so different files hash differently.
    pub fn jpeg_with_capture_time(datetime: &str, payload: &[u8]) -> Vec<u8> {
        assert_eq!(datetime.len(), 19);

        // Little-endian TIFF: header, IFD0 with the Exif pointer,
        // Exif IFD with DateTimeOriginal, then the ASCII value.
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());

        // IFD0 at 8: one entry, ExifIFDPointer -> 26
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x8769u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        // Exif IFD at 26: one entry, DateTimeOriginal -> 44
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x9003u16.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&20u32.to_le_bytes());
        tiff.extend_from_slice(&44u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        tiff.extend_from_slice(datetime.as_bytes());
        tiff.push(0);

        let segment_len = (2 + 6 + tiff.len()) as u16;

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xFE]);
        jpeg.extend_from_slice(&((2 + payload.len()) as u16).to_be_bytes());
        jpeg.extend_from_slice(payload);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }
}
