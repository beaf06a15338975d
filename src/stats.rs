use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};

/// One row of the measurements CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeasurement {
    pub file_path: String,
    pub height: u32,
    pub width: u32,
}

/// Height and width of a single image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub height: u32,
    pub width: u32,
}

impl Dimensions {
    pub fn area(&self) -> u64 {
        self.height as u64 * self.width as u64
    }
}

/// Running totals over a sequence of images.
///
/// `min` starts at the first image and `max` at 0x0; both are replaced on
/// ties, so the last image with the extreme area wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionStats {
    pub count: usize,
    pub total_height: u64,
    pub total_width: u64,
    pub min: Dimensions,
    pub max: Dimensions,
}

impl DimensionStats {
    fn start(first: Dimensions) -> Self {
        Self {
            count: 0,
            total_height: 0,
            total_width: 0,
            min: first,
            max: Dimensions { height: 0, width: 0 },
        }
    }

    fn push(&mut self, dims: Dimensions) {
        self.count += 1;
        self.total_height += dims.height as u64;
        self.total_width += dims.width as u64;
        if dims.area() <= self.min.area() {
            self.min = dims;
        }
        if dims.area() >= self.max.area() {
            self.max = dims;
        }
    }

    /// Folds already-known dimensions. `None` for an empty sequence.
    pub fn from_dimensions<I>(dims: I) -> Option<Self>
    where
        I: IntoIterator<Item = Dimensions>,
    {
        let mut iter = dims.into_iter().peekable();
        let mut stats = Self::start(*iter.peek()?);
        for d in iter {
            stats.push(d);
        }
        Some(stats)
    }

    /// Reads every image's header and accumulates its dimensions. When a
    /// writer is given, one [`ImageMeasurement`] row is written per image.
    pub fn measure<P, W>(
        paths: &[P],
        mut writer: Option<&mut csv::Writer<W>>,
        progress: &ProgressBar,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        W: std::io::Write,
    {
        let first = paths.first().ok_or(AuditError::EmptyImageSet)?;
        let mut stats = Self::start(read_dimensions(first.as_ref())?);

        for path in paths {
            let path = path.as_ref();
            let dims = read_dimensions(path)?;
            stats.push(dims);

            if let Some(writer) = writer.as_deref_mut() {
                let record = ImageMeasurement {
                    file_path: path.to_string_lossy().to_string(),
                    height: dims.height,
                    width: dims.width,
                };
                writer.serialize(record).map_err(|source| AuditError::Csv {
                    path: PathBuf::from("<measurements>"),
                    source,
                })?;
            }
            progress.inc(1);
        }
        tracing::debug!("Measured {} images", stats.count);
        Ok(stats)
    }

    pub fn avg_height(&self) -> f64 {
        self.total_height as f64 / self.count as f64
    }

    pub fn avg_width(&self) -> f64 {
        self.total_width as f64 / self.count as f64
    }
}

impl fmt::Display for DimensionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of image-text pairs: {}", self.count)?;
        writeln!(f, "Average H W: {:?} {:?}", self.avg_height(), self.avg_width())?;
        writeln!(f, "Min H W: {} {}", self.min.height, self.min.width)?;
        write!(f, "Max H W: {} {}", self.max.height, self.max.width)
    }
}

/// Header-only read; pixel data is never decoded.
pub fn read_dimensions(path: &Path) -> Result<Dimensions> {
    let (width, height) = image::image_dimensions(path).map_err(|source| AuditError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Dimensions { height, width })
}
