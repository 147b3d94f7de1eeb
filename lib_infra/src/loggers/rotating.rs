//! # Rotating JSON Sink
//!
//! Wraps `tracing_appender`'s daily roller. Files are named
//! `<app>-old.<YYYY-MM-DD>.json`; `<app>.json` is a symlink kept pointing at the
//! file currently being written.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

/// Upper bound on rotated files kept on disk. Age is not limited.
pub const MAX_LOG_FILES: usize = 500;

const FILE_SUFFIX: &str = "json";

/// Name of the rotated file written on `date` (UTC, as the roller uses).
pub fn rotated_file_name(app_name: &str, date: NaiveDate) -> String {
    format!("{}-old.{}.{}", app_name, date.format("%Y-%m-%d"), FILE_SUFFIX)
}

/// Name of the stable symlink.
pub fn link_file_name(app_name: &str) -> String {
    format!("{}.{}", app_name, FILE_SUFFIX)
}

/// Daily rolling writer that also maintains the `<app>.json` symlink.
pub struct LinkedRollingWriter {
    inner: RollingFileAppender,
    folder: PathBuf,
    app_name: String,
    linked_for: Option<NaiveDate>,
}

impl LinkedRollingWriter {
    /// Creates the roller in `folder`. The folder must already exist.
    pub fn new(folder: &Path, app_name: &str) -> Result<Self, InitError> {
        let inner = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(format!("{}-old", app_name))
            .filename_suffix(FILE_SUFFIX)
            .max_log_files(MAX_LOG_FILES)
            .build(folder)?;

        let mut writer = Self {
            inner,
            folder: folder.to_path_buf(),
            app_name: app_name.to_string(),
            linked_for: None,
        };
        writer.refresh_link();
        Ok(writer)
    }

    /// Re-points the symlink once per UTC day.
    fn refresh_link(&mut self) {
        let today = Utc::now().date_naive();
        if self.linked_for == Some(today) {
            return;
        }
        // Set before linking: a failure is reported once per day.
        self.linked_for = Some(today);

        let link = self.folder.join(link_file_name(&self.app_name));
        let target = rotated_file_name(&self.app_name, today);
        if let Err(e) = replace_link(&target, &link) {
            eprintln!("Error linking {} to {}: {}", link.display(), target, e);
        }
    }
}

#[cfg(unix)]
fn replace_link(target: &str, link: &Path) -> io::Result<()> {
    match std::fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn replace_link(_target: &str, _link: &Path) -> io::Result<()> {
    Ok(())
}

impl Write for LinkedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.refresh_link();
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
