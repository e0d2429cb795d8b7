// SPDX-License-Identifier: Apache-2.0

//! Durable diagnostic sinks

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use gate_core::{StorageError, StorageResult};
use parking_lot::Mutex;
use tracing::debug;

/// Append-only text log
pub trait Sink: Send + Sync {
    /// Appends one already formatted entry, newline included.
    fn append(&self, entry: &str) -> StorageResult<()>;

    /// Everything written so far; empty when nothing was ever written.
    fn contents(&self) -> StorageResult<String>;
}

/// Plain text file opened in append mode for every entry
pub struct FileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }
}

impl Sink for FileSink {
    fn append(&self, entry: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(self.target(), e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(self.target(), e))?;
        file.write_all(entry.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StorageError::io(self.target(), e))?;

        debug!(path = %self.path.display(), "Diagnostic entry appended");
        Ok(())
    }

    fn contents(&self) -> StorageResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StorageError::io(self.target(), e)),
        }
    }
}
