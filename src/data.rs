use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::sanity::{SanityLog, SanitySummary};

/// Extension shared by every COCO image file.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Prefix under which the COCO images and annotation checkouts live.
pub const DEFAULT_DATA_ROOT: &str = "/mnt/disks/nlpvnhub/dinhanhx";

/// Width COCO pads numeric image ids to in file names.
pub const IMAGE_ID_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Val => write!(f, "val"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// `42` -> `000000000042.jpg`
pub fn image_file_name(image_id: u64) -> String {
    format!("{:0width$}.{}", image_id, IMAGE_EXTENSION, width = IMAGE_ID_WIDTH)
}

pub fn resolve_image_path(img_dir: &Path, image_id: u64) -> PathBuf {
    img_dir.join(image_file_name(image_id))
}

/// Inverse of [`image_file_name`]. Only accepts a stem of exactly
/// `IMAGE_ID_WIDTH` ASCII digits followed by the image extension.
pub fn image_id_from_path(path: &Path) -> Option<u64> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    if ext != IMAGE_EXTENSION {
        return None;
    }
    let stem = path.file_stem().and_then(|s| s.to_str())?;
    if stem.len() != IMAGE_ID_WIDTH || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Common surface of the per-dataset annotation readers.
pub trait DataUnpacker {
    type Record: fmt::Display;

    /// Logger name written into the sanity log.
    fn name(&self) -> &'static str;

    /// Record at `index` of `split` and the image it refers to.
    /// `None` is the "not found" pair.
    fn get_item(
        &self,
        index: usize,
        split: Split,
    ) -> Result<Option<(Self::Record, PathBuf)>>;

    /// Walks every split and reports images that are missing or misplaced.
    fn run_sanity_check<W: Write>(&self, log: &mut SanityLog<W>) -> Result<SanitySummary>;

    /// De-duplicated, sorted image paths used for statistics.
    fn get_image_list(&self) -> Result<Vec<PathBuf>>;
}

pub(crate) fn progress_bar(len: Option<u64>, visible: bool, message: String) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = match len {
        Some(len) => ProgressBar::new(len),
        None => ProgressBar::new_spinner(),
    };
    let template = if len.is_some() {
        "{msg} [{bar:40}] {pos}/{len} ({elapsed})"
    } else {
        "{spinner} {msg} {pos} records ({elapsed})"
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_name_is_zero_padded() {
        assert_eq!(image_file_name(42), "000000000042.jpg");
        assert_eq!(image_file_name(0), "000000000000.jpg");
        assert_eq!(image_file_name(999_999_999_999), "999999999999.jpg");
    }

    #[test]
    fn test_resolve_image_path() {
        let path = resolve_image_path(Path::new("/data/train2017"), 391895);
        assert_eq!(path, PathBuf::from("/data/train2017/000000391895.jpg"));
    }

    #[test]
    fn test_path_id_round_trip() {
        let dir = Path::new("/coco/val2017");
        for id in [0u64, 1, 9, 10, 139, 391_895, 123_456_789_012, 999_999_999_999] {
            let path = resolve_image_path(dir, id);
            assert_eq!(image_id_from_path(&path), Some(id));
            assert_eq!(resolve_image_path(dir, image_id_from_path(&path).unwrap()), path);
        }
    }

    #[test]
    fn test_image_id_from_path_rejects_other_names() {
        assert_eq!(image_id_from_path(Path::new("42.jpg")), None);
        assert_eq!(image_id_from_path(Path::new("000000000042.png")), None);
        assert_eq!(image_id_from_path(Path::new("00000000004x.jpg")), None);
        assert_eq!(image_id_from_path(Path::new("000000000042")), None);
    }

    #[test]
    fn test_split_display() {
        assert_eq!(Split::Train.to_string(), "train");
        assert_eq!(Split::Val.to_string(), "val");
        assert_eq!(Split::Test.to_string(), "test");
    }
}
