//! ViVQA: Vietnamese question/answer pairs over COCO images.
//!
//! Annotations are CSV files (train/test). Images may live in either
//! `train2017` or `val2017`; `train2017` is the expected home.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::data::{progress_bar, resolve_image_path, DataUnpacker, Split, DEFAULT_DATA_ROOT};
use crate::error::{AuditError, Result};
use crate::sanity::{SanityLog, SanitySummary};

pub const SANITY_LOG_FILE: &str = "ViVQA_sanity_check.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViVqaMeta {
    /// Holds the COCO `train2017` and `val2017` directories.
    pub img_root_dir: PathBuf,
    /// Checkout of github.com/kh4nh12/ViVQA.
    pub csv_dir: PathBuf,
    pub img_train_dir: PathBuf,
    pub img_val_dir: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
}

impl ViVqaMeta {
    pub fn new(img_root_dir: impl Into<PathBuf>, csv_dir: impl Into<PathBuf>) -> Self {
        let img_root_dir = img_root_dir.into();
        let csv_dir = csv_dir.into();
        Self {
            img_train_dir: img_root_dir.join("train2017"),
            img_val_dir: img_root_dir.join("val2017"),
            train_file: csv_dir.join("train.csv"),
            test_file: csv_dir.join("test.csv"),
            img_root_dir,
            csv_dir,
        }
    }

    /// Standard layout below `root`: COCO dirs directly inside, CSVs in `ViVQA-main/`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root, root.join("ViVQA-main"))
    }

    pub fn split_file(&self, split: Split) -> Result<&Path> {
        match split {
            Split::Train => Ok(&self.train_file),
            Split::Test => Ok(&self.test_file),
            Split::Val => Err(AuditError::UnknownSplit(split)),
        }
    }

    pub fn splits(&self) -> [Split; 2] {
        [Split::Train, Split::Test]
    }

    /// Candidate image directories in lookup priority order.
    pub fn image_dirs(&self) -> [&Path; 2] {
        [self.img_train_dir.as_path(), self.img_val_dir.as_path()]
    }
}

impl Default for ViVqaMeta {
    fn default() -> Self {
        Self::from_root(DEFAULT_DATA_ROOT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: String,
    pub img_id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<i64>,
}

impl fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'question': '{}', 'answer': '{}', 'img_id': {}",
            self.question, self.answer, self.img_id
        )?;
        if let Some(kind) = self.kind {
            write!(f, ", 'type': {}", kind)?;
        }
        write!(f, "}}")
    }
}

pub struct ViVqaUnpacker {
    meta: ViVqaMeta,
    show_progress: bool,
}

impl ViVqaUnpacker {
    pub fn new(meta: ViVqaMeta) -> Self {
        Self {
            meta,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Every candidate location of `record`'s image that exists, in priority order.
    fn existing_images(&self, record: &QuestionRecord) -> Vec<(usize, PathBuf)> {
        self.meta
            .image_dirs()
            .iter()
            .enumerate()
            .map(|(rank, dir)| (rank, resolve_image_path(dir, record.img_id)))
            .filter(|(_, path)| path.is_file())
            .collect()
    }

    /// Streams `path` row by row, calling `visit` on each record.
    fn for_each_record<F>(&self, path: &Path, message: String, mut visit: F) -> Result<()>
    where
        F: FnMut(QuestionRecord) -> Result<()>,
    {
        let file = File::open(path).map_err(|e| AuditError::io(path, e))?;
        let mut rdr = csv::Reader::from_reader(BufReader::new(file));
        let pb = progress_bar(None, self.show_progress, message);
        for result in rdr.deserialize() {
            let record: QuestionRecord = result.map_err(|source| AuditError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            visit(record)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }
}

impl DataUnpacker for ViVqaUnpacker {
    type Record = QuestionRecord;

    fn name(&self) -> &'static str {
        "vivqa"
    }

    /// Rows are counted whether or not their image exists; a row whose image
    /// is in neither directory yields `None`.
    fn get_item(
        &self,
        index: usize,
        split: Split,
    ) -> Result<Option<(QuestionRecord, PathBuf)>> {
        let target = self.meta.split_file(split)?;
        let file = File::open(target).map_err(|e| AuditError::io(target, e))?;
        let mut rdr = csv::Reader::from_reader(BufReader::new(file));

        // Rows before `index` are still parsed so a malformed one is reported.
        for (i, result) in rdr.deserialize::<QuestionRecord>().enumerate() {
            let record = result.map_err(|source| AuditError::Csv {
                path: target.to_path_buf(),
                source,
            })?;
            if i == index {
                let found = self.existing_images(&record).into_iter().next();
                return Ok(found.map(|(_, img_file)| (record, img_file)));
            }
        }
        Ok(None)
    }

    fn run_sanity_check<W: Write>(&self, log: &mut SanityLog<W>) -> Result<SanitySummary> {
        let mut summary = SanitySummary::default();
        let (warnings_before, infos_before) = (log.warnings(), log.infos());

        let mut seen_dirs = BTreeSet::new();
        for dir in self.meta.image_dirs() {
            if seen_dirs.insert(dir) && !dir.exists() {
                log.warn(format_args!("{} does not exist", dir.display()))?;
            }
        }

        for split in self.meta.splits() {
            let target = self.meta.split_file(split)?;
            self.for_each_record(target, format!("Checking {}", split), |record| {
                let found = self.existing_images(&record);
                for (rank, img_file) in &found {
                    if *rank != 0 {
                        log.info(format_args!(
                            "{} @ {} has {}",
                            record,
                            target.display(),
                            img_file.display()
                        ))?;
                    }
                }
                if found.is_empty() {
                    log.warn(format_args!(
                        "{} @ {} has no image",
                        record,
                        target.display()
                    ))?;
                }
                summary.records += 1;
                Ok(())
            })?;
        }

        log.flush()?;
        summary.warnings = log.warnings() - warnings_before;
        summary.infos = log.infos() - infos_before;
        tracing::info!("ViVQA sanity check: {}", summary);
        Ok(summary)
    }

    /// Only the test split feeds the statistics.
    fn get_image_list(&self) -> Result<Vec<PathBuf>> {
        let target = self.meta.split_file(Split::Test)?;
        let mut image_set = BTreeSet::new();
        self.for_each_record(target, "Listing test".to_string(), |record| {
            image_set.extend(self.existing_images(&record).into_iter().map(|(_, p)| p));
            Ok(())
        })?;
        tracing::info!("ViVQA test split references {} images on disk", image_set.len());
        Ok(image_set.into_iter().collect())
    }
}
