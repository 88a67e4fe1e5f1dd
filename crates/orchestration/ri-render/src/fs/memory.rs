//! In-memory output filesystem.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use ri_error::{Result, RiError};
use ri_traits::OutputFs;

/// Files and directories held in memory.
///
/// Writing into a directory that was never created fails, so callers must
/// create directories before writing into them.
#[derive(Debug)]
pub struct MemoryFs {
    dirs: Mutex<BTreeSet<String>>,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            dirs: Mutex::new(BTreeSet::from([String::new()])),
            files: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(normalize(path)).cloned()
    }

    pub fn read_to_string(&self, path: &str) -> Option<String> {
        self.read(path).and_then(|b| String::from_utf8(b).ok())
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.lock().contains(normalize(path))
    }

    /// Paths of all written files, sorted.
    pub fn files(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

#[async_trait]
impl OutputFs for MemoryFs {
    async fn mkdir_all(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let files = self.files.lock();
        let mut dirs = self.dirs.lock();

        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);

            if files.contains_key(&current) {
                return Err(RiError::fs(&current, "not a directory"));
            }
            dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()> {
        let path = normalize(path);
        if path.is_empty() {
            return Err(RiError::fs(path, "empty file name"));
        }

        if !self.dirs.lock().contains(parent(path)) {
            return Err(RiError::fs(path, "parent directory does not exist"));
        }
        if self.dirs.lock().contains(path) {
            return Err(RiError::fs(path, "is a directory"));
        }

        self.files.lock().insert(path.to_string(), contents);
        Ok(())
    }

    fn description(&self) -> String {
        "memory:/".to_string()
    }
}
