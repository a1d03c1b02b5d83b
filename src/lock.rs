use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Exclusive advisory lock on `<working_dir>/.lock`
///
/// Serializes shim switching and shell profile edits between concurrent
/// brewpy invocations. The lock is released when the guard is dropped.
pub struct WorkdirLock {
    file: File,
}

impl WorkdirLock {
    /// Block until the working directory lock is acquired
    pub fn acquire(working_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(working_dir)
            .with_context(|| format!("Failed to create brewpy directory: {:?}", working_dir))?;

        let path = working_dir.join(".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {:?}", path))?;

        log::debug!("Acquired lock {:?}", path);
        Ok(Self { file })
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
