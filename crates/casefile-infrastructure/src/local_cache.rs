//! File-backed local durable cache.
//!
//! Holds a single serialized case blob. Writes go through a temporary file,
//! fsync and rename, under an exclusive lock file, so a crash never leaves a
//! half-written blob behind.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use casefile_core::CaseError;
use casefile_core::error::Result;
use casefile_core::repository::LocalCaseCache;

pub struct FileLocalCaseCache {
    path: PathBuf,
}

impl FileLocalCaseCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| CaseError::io("Cache path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| CaseError::io("Cache path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

impl LocalCaseCache for FileLocalCaseCache {
    fn load(&self) -> Result<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn save(&self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let _lock = FileLock::acquire(&self.path)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(blob.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = blob.len(), "Wrote local case cache");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exclusive lock guard released on drop.
struct FileLock {
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CaseError::io(format!("Failed to acquire cache lock: {e}")))?;
        Ok(Self { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = FileLocalCaseCache::new(dir.path().join("case_file.json"));
        assert_eq!(cache.load().unwrap(), None);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let cache = FileLocalCaseCache::new(dir.path().join("nested").join("case_file.json"));

        cache.save("{\"a\":1}").unwrap();
        cache.save("{\"a\":2}").unwrap();
        assert_eq!(cache.load().unwrap().as_deref(), Some("{\"a\":2}"));

        let names: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["case_file.json"]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = FileLocalCaseCache::new(dir.path().join("case_file.json"));
        cache.save("{}").unwrap();
        cache.clear().unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.load().unwrap(), None);
    }
}
