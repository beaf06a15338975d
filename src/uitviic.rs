//! UIT-ViIC: Vietnamese captions over COCO train2017.
//!
//! Annotations ship as three COCO caption documents, one per split, all
//! pointing into a single image directory.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::data::{progress_bar, resolve_image_path, DataUnpacker, Split, DEFAULT_DATA_ROOT};
use crate::error::{AuditError, Result};
use crate::sanity::{SanityLog, SanitySummary};

pub const SANITY_LOG_FILE: &str = "uitviic_sanity_check.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UitViicMeta {
    /// All COCO train2017 images.
    pub img_dir: PathBuf,
    pub json_dir: PathBuf,
    pub train_file: PathBuf,
    pub val_file: PathBuf,
    pub test_file: PathBuf,
}

impl UitViicMeta {
    pub fn new(img_dir: impl Into<PathBuf>, json_dir: impl Into<PathBuf>) -> Self {
        let json_dir = json_dir.into();
        Self {
            img_dir: img_dir.into(),
            train_file: json_dir.join("uitviic_captions_train2017.json"),
            val_file: json_dir.join("uitviic_captions_val2017.json"),
            test_file: json_dir.join("uitviic_captions_test2017.json"),
            json_dir,
        }
    }

    /// Standard layout below `root`: `train2017/` and `UIT-ViIC/`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root.join("train2017"), root.join("UIT-ViIC"))
    }

    pub fn split_file(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_file,
            Split::Val => &self.val_file,
            Split::Test => &self.test_file,
        }
    }

    pub fn splits(&self) -> [Split; 3] {
        [Split::Train, Split::Val, Split::Test]
    }
}

impl Default for UitViicMeta {
    fn default() -> Self {
        Self::from_root(DEFAULT_DATA_ROOT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionAnnotation {
    pub image_id: u64,
    #[serde(default)]
    pub id: Option<u64>,
    pub caption: String,
}

impl fmt::Display for CaptionAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{'image_id': {}", self.image_id)?;
        if let Some(id) = self.id {
            write!(f, ", 'id': {}", id)?;
        }
        write!(f, ", 'caption': '{}'}}", self.caption)
    }
}

#[derive(Debug, Deserialize)]
struct CaptionFile {
    annotations: Vec<CaptionAnnotation>,
}

pub struct UitViicUnpacker {
    meta: UitViicMeta,
    show_progress: bool,
}

impl UitViicUnpacker {
    pub fn new(meta: UitViicMeta) -> Self {
        Self {
            meta,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn load_annotations(&self, split: Split) -> Result<Vec<CaptionAnnotation>> {
        load_annotations(self.meta.split_file(split))
    }

    fn image_path(&self, annotation: &CaptionAnnotation) -> PathBuf {
        resolve_image_path(&self.meta.img_dir, annotation.image_id)
    }
}

/// Reads the `annotations` array of a COCO caption document.
pub fn load_annotations(path: &Path) -> Result<Vec<CaptionAnnotation>> {
    let file = File::open(path).map_err(|e| AuditError::io(path, e))?;
    let parsed: CaptionFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| AuditError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        "Loaded {} annotations from {}",
        parsed.annotations.len(),
        path.display()
    );
    Ok(parsed.annotations)
}

impl DataUnpacker for UitViicUnpacker {
    type Record = CaptionAnnotation;

    fn name(&self) -> &'static str {
        "uitviic"
    }

    fn get_item(
        &self,
        index: usize,
        split: Split,
    ) -> Result<Option<(CaptionAnnotation, PathBuf)>> {
        let mut annotations = self.load_annotations(split)?;
        let len = annotations.len();
        if index >= len {
            return Err(AuditError::IndexOutOfRange { index, split, len });
        }
        let annotation = annotations.swap_remove(index);
        let img_file = self.image_path(&annotation);
        Ok(Some((annotation, img_file)))
    }

    fn run_sanity_check<W: Write>(&self, log: &mut SanityLog<W>) -> Result<SanitySummary> {
        let mut summary = SanitySummary::default();
        let (warnings_before, infos_before) = (log.warnings(), log.infos());

        for split in self.meta.splits() {
            let target = self.meta.split_file(split);
            let annotations = self.load_annotations(split)?;
            let pb = progress_bar(
                Some(annotations.len() as u64),
                self.show_progress,
                format!("Checking {}", split),
            );
            for annotation in &annotations {
                let img_file = self.image_path(annotation);
                if !img_file.is_file() {
                    log.warn(format_args!(
                        "{} @ {} has no image",
                        annotation,
                        target.display()
                    ))?;
                }
                summary.records += 1;
                pb.inc(1);
            }
            pb.finish_and_clear();
        }

        log.flush()?;
        summary.warnings = log.warnings() - warnings_before;
        summary.infos = log.infos() - infos_before;
        tracing::info!("UIT-ViIC sanity check: {}", summary);
        Ok(summary)
    }

    fn get_image_list(&self) -> Result<Vec<PathBuf>> {
        let mut image_set = BTreeSet::new();
        for split in self.meta.splits() {
            let annotations = self.load_annotations(split)?;
            let pb = progress_bar(
                Some(annotations.len() as u64),
                self.show_progress,
                format!("Listing {}", split),
            );
            for annotation in &annotations {
                image_set.insert(self.image_path(annotation));
                pb.inc(1);
            }
            pb.finish_and_clear();
        }
        tracing::info!("UIT-ViIC references {} distinct images", image_set.len());
        Ok(image_set.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_split(path: &Path, entries: &[(u64, u64, &str)]) {
        let annotations: Vec<serde_json::Value> = entries
            .iter()
            .map(|(image_id, id, caption)| {
                serde_json::json!({ "image_id": image_id, "id": id, "caption": caption })
            })
            .collect();
        let doc = serde_json::json!({
            "info": { "description": "UIT-ViIC" },
            "images": [],
            "annotations": annotations,
        });
        fs::write(path, serde_json::to_string(&doc).unwrap()).unwrap();
    }

    fn touch_image(meta: &UitViicMeta, image_id: u64) {
        fs::write(resolve_image_path(&meta.img_dir, image_id), b"").unwrap();
    }

    fn setup() -> (TempDir, UitViicMeta) {
        let temp_dir = TempDir::new().unwrap();
        let meta = UitViicMeta::from_root(temp_dir.path());
        fs::create_dir_all(&meta.img_dir).unwrap();
        fs::create_dir_all(&meta.json_dir).unwrap();
        write_split(
            &meta.train_file,
            &[(9, 1, "một con mèo"), (25, 2, "hai cầu thủ"), (9, 3, "con mèo nằm")],
        );
        write_split(&meta.val_file, &[(30, 4, "sân bóng chày")]);
        write_split(&meta.test_file, &[(25, 5, "cầu thủ ném bóng")]);
        (temp_dir, meta)
    }

    #[test]
    fn test_default_layout() {
        let meta = UitViicMeta::default();
        assert_eq!(meta.img_dir, PathBuf::from("/mnt/disks/nlpvnhub/dinhanhx/train2017"));
        assert_eq!(
            meta.split_file(Split::Val),
            Path::new("/mnt/disks/nlpvnhub/dinhanhx/UIT-ViIC/uitviic_captions_val2017.json")
        );
    }

    #[test]
    fn test_get_item_returns_annotation_at_index() {
        let (_temp_dir, meta) = setup();
        let unpacker = UitViicUnpacker::new(meta.clone());

        for (index, expected_id) in [(0usize, 9u64), (1, 25), (2, 9)] {
            let (annotation, img_file) = unpacker.get_item(index, Split::Train).unwrap().unwrap();
            assert_eq!(annotation.image_id, expected_id);
            assert_eq!(annotation.id, Some(index as u64 + 1));
            assert!(img_file.ends_with(format!("{:012}.jpg", expected_id)));
            assert!(img_file.starts_with(&meta.img_dir));
        }
    }

    #[test]
    fn test_get_item_past_end_is_error() {
        let (_temp_dir, meta) = setup();
        let unpacker = UitViicUnpacker::new(meta);
        let err = unpacker.get_item(1, Split::Val).unwrap_err();
        assert!(matches!(
            err,
            AuditError::IndexOutOfRange { index: 1, split: Split::Val, len: 1 }
        ));
    }

    #[test]
    fn test_missing_annotation_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let unpacker = UitViicUnpacker::new(UitViicMeta::from_root(temp_dir.path()));
        assert!(matches!(
            unpacker.get_item(0, Split::Train),
            Err(AuditError::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_annotation_file_is_json_error() {
        let (_temp_dir, meta) = setup();
        fs::write(&meta.test_file, "{\"annotations\": [").unwrap();
        let unpacker = UitViicUnpacker::new(meta);
        assert!(matches!(
            unpacker.get_item(0, Split::Test),
            Err(AuditError::Json { .. })
        ));
    }

    #[test]
    fn test_sanity_check_clean_dataset_logs_nothing() {
        let (_temp_dir, meta) = setup();
        for id in [9, 25, 30] {
            touch_image(&meta, id);
        }
        let unpacker = UitViicUnpacker::new(meta);
        let mut log = SanityLog::new(Vec::new(), unpacker.name());

        let summary = unpacker.run_sanity_check(&mut log).unwrap();
        assert_eq!(summary, SanitySummary { records: 5, warnings: 0, infos: 0 });
        assert!(log.into_inner().unwrap().is_empty());
    }

    #[test]
    fn test_sanity_check_warns_once_per_missing_record() {
        let (_temp_dir, meta) = setup();
        touch_image(&meta, 9);
        touch_image(&meta, 25);
        let unpacker = UitViicUnpacker::new(meta.clone());
        let mut log = SanityLog::new(Vec::new(), unpacker.name());

        let summary = unpacker.run_sanity_check(&mut log).unwrap();
        assert_eq!(summary.warnings, 1);

        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("uitviic - WARNING - "));
        assert!(lines[0].contains("'image_id': 30"));
        assert!(lines[0].contains(&meta.val_file.display().to_string()));
        assert!(lines[0].ends_with("has no image"));
    }

    #[test]
    fn test_image_list_is_deduplicated() {
        let (_temp_dir, meta) = setup();
        let unpacker = UitViicUnpacker::new(meta.clone());

        let images = unpacker.get_image_list().unwrap();
        assert_eq!(
            images,
            vec![
                resolve_image_path(&meta.img_dir, 9),
                resolve_image_path(&meta.img_dir, 25),
                resolve_image_path(&meta.img_dir, 30),
            ]
        );
    }
}
