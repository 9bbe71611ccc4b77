use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Width that subsecond strings are left-padded to before comparison.
pub const SUBSEC_WIDTH: usize = 3;

/// Ordering key built from capture-time metadata.
///
/// Compares by primary timestamp, then zero-padded subsecond, then the path as
/// a plain string (not component-wise), so no two keys for different files are
/// ever equal.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub primary: String,
    pub subsecond: String,
    pub path: PathBuf,
}

impl SortKey {
    /// Build a key, zero-padding a non-empty subsecond to `SUBSEC_WIDTH`.
    pub fn new(primary: impl Into<String>, subsecond: &str, path: impl Into<PathBuf>) -> Self {
        let subsecond = subsecond.trim();
        let subsecond = if subsecond.is_empty() {
            String::new()
        } else {
            format!("{:0>width$}", subsecond, width = SUBSEC_WIDTH)
        };
        Self {
            primary: primary.into().trim().to_string(),
            subsecond,
            path: path.into(),
        }
    }

    fn fields(&self) -> (&str, &str, &OsStr) {
        (&self.primary, &self.subsecond, self.path.as_os_str())
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.fields() == other.fields()
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fields().cmp(&other.fields())
    }
}

/// An image in a captioning session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    path: PathBuf,
    sort_key: SortKey,
}

impl ImageAsset {
    pub fn new(sort_key: SortKey) -> Self {
        Self {
            path: sort_key.path.clone(),
            sort_key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    /// File name for list display
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl PartialOrd for ImageAsset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageAsset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key.cmp(&other.sort_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsecond_padding() {
        let key = SortKey::new("2020:01:01 00:00:00", "9", "a.jpg");
        assert_eq!(key.subsecond, "009");
        let key = SortKey::new("2020:01:01 00:00:00", "", "a.jpg");
        assert_eq!(key.subsecond, "");
    }

    #[test]
    fn test_padded_subsecond_orders_numerically() {
        let nine = SortKey::new("2020:01:01 00:00:00", "9", "z.jpg");
        let ten = SortKey::new("2020:01:01 00:00:00", "10", "a.jpg");
        assert!(nine < ten);
    }

    #[test]
    fn test_path_breaks_ties() {
        let z = ImageAsset::new(SortKey::new("2020:01:01 00:00:00", "000", "z.jpg"));
        let a = ImageAsset::new(SortKey::new("2020:01:01 00:00:00", "000", "a.jpg"));
        assert!(a < z);
        assert_ne!(a.cmp(&z), Ordering::Equal);
    }

    #[test]
    fn test_path_tie_break_is_string_order() {
        // Component-wise order would put "dir/x.jpg" first since "dir" < "dir-2".
        let nested = SortKey::new("2020:01:01 00:00:00", "000", "dir/x.jpg");
        let sibling = SortKey::new("2020:01:01 00:00:00", "000", "dir-2/a.jpg");
        assert!(sibling < nested);
    }

    #[test]
    fn test_display_name() {
        let asset = ImageAsset::new(SortKey::new("x", "", "/photos/trip/img_01.jpg"));
        assert_eq!(asset.display_name(), "img_01.jpg");
    }
}
