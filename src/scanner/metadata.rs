//! Capture-time metadata extraction.
//!
//! Reads the EXIF `DateTimeOriginal` and `SubSecTimeOriginal` tags and turns
//! them into a `SortKey`. Files without a parseable original timestamp fail with
//! `MetadataUnavailable`; the orderer decides what to do with them.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};
use tracing::{debug, trace};

use crate::error::{CaptionError, Result};
use crate::models::SortKey;

/// Source of `(primary, subsecond)` capture-time strings for a file.
pub trait CaptureTimeSource {
    fn read_capture_time(&self, path: &Path) -> Result<(String, String)>;
}

/// Reads capture time from embedded EXIF data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCaptureTime;

impl ExifCaptureTime {
    /// Extract `(primary, subsecond)` from already parsed EXIF data.
    ///
    /// The primary timestamp is normalised to `YYYY:MM:DD HH:MM:SS`. A missing
    /// or non-numeric subsecond yields an empty string.
    pub fn from_exif(exif: &exif::Exif) -> std::result::Result<(String, String), String> {
        let field = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .ok_or_else(|| "no DateTimeOriginal tag".to_string())?;

        let raw = match field.value {
            Value::Ascii(ref vec) if !vec.is_empty() => &vec[0],
            _ => return Err("DateTimeOriginal is not ASCII".to_string()),
        };
        let dt = exif::DateTime::from_ascii(raw)
            .map_err(|e| format!("malformed DateTimeOriginal: {e}"))?;
        let primary = format!(
            "{:04}:{:02}:{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        );

        let subsecond = exif
            .get_field(Tag::SubSecTimeOriginal, In::PRIMARY)
            .and_then(|f| match f.value {
                Value::Ascii(ref vec) if !vec.is_empty() => {
                    std::str::from_utf8(&vec[0]).ok().map(|s| s.trim().to_string())
                }
                _ => None,
            })
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or_default();

        Ok((primary, subsecond))
    }
}

impl CaptureTimeSource for ExifCaptureTime {
    fn read_capture_time(&self, path: &Path) -> Result<(String, String)> {
        trace!(?path, "Reading capture time");

        let file = File::open(path).map_err(|e| CaptionError::metadata(path, e.to_string()))?;
        let mut reader = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| CaptionError::metadata(path, e.to_string()))?;

        Self::from_exif(&exif).map_err(|reason| CaptionError::metadata(path, reason))
    }
}

/// Builds sort keys from a capture-time source.
pub struct MetadataKeyExtractor<S = ExifCaptureTime> {
    source: S,
}

impl MetadataKeyExtractor<ExifCaptureTime> {
    pub fn new() -> Self {
        Self {
            source: ExifCaptureTime,
        }
    }
}

impl Default for MetadataKeyExtractor<ExifCaptureTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CaptureTimeSource> MetadataKeyExtractor<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    pub fn extract(&self, path: &Path) -> Result<SortKey> {
        let (primary, subsecond) = self.source.read_capture_time(path)?;
        if primary.trim().is_empty() {
            return Err(CaptionError::metadata(path, "empty capture timestamp"));
        }
        let key = SortKey::new(primary, &subsecond, path);
        debug!(?path, primary = %key.primary, subsecond = %key.subsecond, "Extracted sort key");
        Ok(key)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    /// In-memory capture times keyed by path; unknown paths fail.
    #[derive(Default)]
    pub(crate) struct FakeCaptureTimes(pub HashMap<PathBuf, (String, String)>);

    impl FakeCaptureTimes {
        pub(crate) fn with(mut self, path: &str, primary: &str, subsecond: &str) -> Self {
            self.0
                .insert(PathBuf::from(path), (primary.to_string(), subsecond.to_string()));
            self
        }
    }

    impl CaptureTimeSource for FakeCaptureTimes {
        fn read_capture_time(&self, path: &Path) -> Result<(String, String)> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| CaptionError::metadata(path, "no fixture"))
        }
    }

    fn push_entry(buf: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: [u8; 4]) {
        buf.extend_from_slice(&tag.to_le_bytes());
        buf.extend_from_slice(&typ.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&value);
    }

    /// Little-endian TIFF block with an Exif IFD holding DateTimeOriginal and
    /// (optionally) a three-character SubSecTimeOriginal.
    fn tiff_with_datetime(datetime: &[u8; 19], subsec: Option<&[u8; 3]>) -> Vec<u8> {
        let exif_ifd_offset: u32 = 26;
        let entries: u16 = if subsec.is_some() { 2 } else { 1 };
        let data_offset = exif_ifd_offset + 2 + 12 * entries as u32 + 4;

        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());

        // IFD0: pointer to the Exif IFD
        buf.extend_from_slice(&1u16.to_le_bytes());
        push_entry(&mut buf, 0x8769, 4, 1, exif_ifd_offset.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        // Exif IFD
        buf.extend_from_slice(&entries.to_le_bytes());
        push_entry(&mut buf, 0x9003, 2, 20, data_offset.to_le_bytes());
        if let Some(s) = subsec {
            push_entry(&mut buf, 0x9291, 2, 4, [s[0], s[1], s[2], 0]);
        }
        buf.extend_from_slice(&0u32.to_le_bytes());

        buf.extend_from_slice(datetime);
        buf.push(0);
        buf
    }

    #[test]
    fn test_exif_with_subsecond() {
        let raw = tiff_with_datetime(b"2020:01:02 03:04:05", Some(b"042"));
        let exif = exif::Reader::new().read_raw(raw).unwrap();
        let (primary, subsec) = ExifCaptureTime::from_exif(&exif).unwrap();
        assert_eq!(primary, "2020:01:02 03:04:05");
        assert_eq!(subsec, "042");
    }

    #[test]
    fn test_exif_without_subsecond() {
        let raw = tiff_with_datetime(b"2019:12:31 23:59:59", None);
        let exif = exif::Reader::new().read_raw(raw).unwrap();
        let (primary, subsec) = ExifCaptureTime::from_exif(&exif).unwrap();
        assert_eq!(primary, "2019:12:31 23:59:59");
        assert_eq!(subsec, "");
    }

    #[test]
    fn test_non_image_file_is_unavailable() {
        let mut temp = NamedTempFile::with_suffix(".jpg").unwrap();
        temp.write_all(b"not a real jpeg file").unwrap();

        let err = ExifCaptureTime.read_capture_time(temp.path()).unwrap_err();
        assert!(matches!(err, CaptionError::MetadataUnavailable { .. }));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = ExifCaptureTime
            .read_capture_time(Path::new("/nonexistent/image.jpg"))
            .unwrap_err();
        assert!(matches!(err, CaptionError::MetadataUnavailable { .. }));
    }

    #[test]
    fn test_extract_pads_subsecond() {
        let extractor = MetadataKeyExtractor::with_source(
            FakeCaptureTimes::default().with("a.jpg", "2020:01:01 00:00:00", "7"),
        );
        let key = extractor.extract(Path::new("a.jpg")).unwrap();
        assert_eq!(key.subsecond, "007");
        assert_eq!(key.path, PathBuf::from("a.jpg"));
    }

    #[test]
    fn test_extract_rejects_blank_timestamp() {
        let extractor =
            MetadataKeyExtractor::with_source(FakeCaptureTimes::default().with("a.jpg", "  ", ""));
        assert!(extractor.extract(Path::new("a.jpg")).is_err());
    }
}
