use crate::record::{NormalizedRecord, COLUMNS};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};


/// Append-only CSV message log.
///
/// All writers go through one mutex, and each batch is encoded up front and
/// written with a single append, so rows never interleave mid-row and one
/// request's rows stay contiguous. Writes are blocking; call from the
/// blocking pool in async code.
pub struct MessageLog {
    path: PathBuf,
    fsync: bool,
    write_lock: Mutex<()>,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>, fsync: bool) -> Self {
        Self {
            path: path.into(),
            fsync,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with its header row if it does not exist yet.
    ///
    /// Returns true if the file was created. An existing file is left untouched.
    pub fn ensure_header(&self) -> Result<bool> {
        let _guard = self.lock();
        self.ensure_header_locked()
    }

    /// Append one request's records and return how many rows were written.
    ///
    /// Ensures the header first, even for an empty batch. No rollback: a
    /// failed write may leave a partial batch behind.
    pub fn append_batch(&self, records: &[NormalizedRecord]) -> Result<usize> {
        let encoded = encode_rows(records)?;

        let _guard = self.lock();
        self.ensure_header_locked()?;
        if records.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open message log {}", self.path.display()))?;
        file.write_all(&encoded)
            .context("Failed to append rows to message log")?;
        if self.fsync {
            file.sync_data()
                .context("Failed to sync message log to disk")?;
        }

        debug!(rows = records.len(), bytes = encoded.len(), "Rows appended");
        Ok(records.len())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded unit carries no state, so a poisoned lock is still usable
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_header_locked(&self) -> Result<bool> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        // create_new keeps header creation race-free across processes too
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create message log {}", self.path.display())
                })
            }
        };

        let mut writer = csv_writer(Vec::new());
        writer
            .write_record(COLUMNS)
            .context("Failed to encode header row")?;
        let header = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush header row: {}", e))?;

        file.write_all(&header)
            .context("Failed to write message log header")?;
        if self.fsync {
            file.sync_all()
                .context("Failed to sync message log to disk")?;
        }

        info!(path = %self.path.display(), "Message log created");
        Ok(true)
    }
}

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

/// Encode rows into one buffer so the append is a single write
fn encode_rows(records: &[NormalizedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv_writer(Vec::new());
    for record in records {
        writer
            .write_record(record.as_row())
            .context("Failed to encode message row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush encoded rows: {}", e))
}
