//! Sink for the sanity check report.
//!
//! Each run builds its own [`SanityLog`] and hands it to
//! [`DataUnpacker::run_sanity_check`](crate::data::DataUnpacker::run_sanity_check).
//! Lines look like `uitviic - WARNING - <message>`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
        }
    }
}

pub struct SanityLog<W: Write> {
    logger: String,
    writer: W,
    path: Option<PathBuf>,
    infos: usize,
    warnings: usize,
}

impl SanityLog<BufWriter<File>> {
    /// Opens `path` for writing, truncating any previous run's log.
    pub fn create(path: impl AsRef<Path>, logger: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| AuditError::io(path, e))?;
        let mut log = SanityLog::new(BufWriter::new(file), logger);
        log.path = Some(path.to_path_buf());
        Ok(log)
    }
}

impl<W: Write> SanityLog<W> {
    pub fn new(writer: W, logger: &str) -> Self {
        Self {
            logger: logger.to_string(),
            writer,
            path: None,
            infos: 0,
            warnings: 0,
        }
    }

    pub fn info(&mut self, message: impl fmt::Display) -> Result<()> {
        self.infos += 1;
        self.write_line(Level::Info, message)
    }

    pub fn warn(&mut self, message: impl fmt::Display) -> Result<()> {
        self.warnings += 1;
        self.write_line(Level::Warning, message)
    }

    fn write_line(&mut self, level: Level, message: impl fmt::Display) -> Result<()> {
        tracing::debug!(logger = %self.logger, %level, "{}", message);
        writeln!(self.writer, "{} - {} - {}", self.logger, level, message)
            .map_err(|e| self.io_error(e))
    }

    pub fn infos(&self) -> usize {
        self.infos
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| self.io_error(e))
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    fn io_error(&self, source: std::io::Error) -> AuditError {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("<{} log>", self.logger)));
        AuditError::io(path, source)
    }
}

/// Counts gathered over one sanity check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitySummary {
    pub records: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl fmt::Display for SanitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records checked, {} warnings, {} infos",
            self.records, self.warnings, self.infos
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_format_and_counts() {
        let mut log = SanityLog::new(Vec::new(), "uitviic");
        log.warn("a @ b has no image").unwrap();
        log.info("c @ d has e").unwrap();
        log.warn("f does not exist").unwrap();
        assert_eq!(log.warnings(), 2);
        assert_eq!(log.infos(), 1);

        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "uitviic - WARNING - a @ b has no image",
                "uitviic - INFO - c @ d has e",
                "uitviic - WARNING - f does not exist",
            ]
        );
    }

    #[test]
    fn test_create_truncates_previous_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sanity.log");
        std::fs::write(&path, "stale line\nanother\n").unwrap();

        let mut log = SanityLog::create(&path, "vivqa").unwrap();
        log.info("fresh").unwrap();
        log.flush().unwrap();
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "vivqa - INFO - fresh\n");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("sanity.log");
        assert!(matches!(
            SanityLog::create(&path, "x"),
            Err(AuditError::Io { .. })
        ));
    }
}
