//! Exclusive lock serializing runs that share a scanner root.

use crate::error::{Result, ScanError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the lock file inside the scanner root.
pub const LOCK_FILE_NAME: &str = ".nbscan.lock";

/// RAII guard for the run lock.
///
/// The lock file holds the PID of the owning process. The OS releases the
/// lock when the file is closed, including when the process dies, so the file
/// itself is left in place.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Acquires the lock for `dir`, failing fast if another run holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| ScanError::fs(dir, e))?;
        let path = dir.join(LOCK_FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ScanError::fs(&path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            if !is_contended(&e) {
                return Err(ScanError::fs(&path, e));
            }
            let mut content = String::new();
            let _ = file.read_to_string(&mut content);
            let pid = content.trim().parse().unwrap_or(0);
            return Err(ScanError::RunLocked { pid });
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        debug!(path = %path.display(), "acquired run lock");
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True if the lock failed because another handle holds it.
fn is_contended(err: &io::Error) -> bool {
    err.kind() == fs2::lock_contended_error().kind()
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
