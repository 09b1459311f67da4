//! In-memory mock filesystem for testing samplers without real `/sys`.
//!
//! `MockFs` is cheaply cloneable and all clones share the same files, so a
//! test can rewrite or remove a stat file while a sampler holds it open.

use crate::collector::parser::FIELD_COUNT;
use crate::collector::traits::{FileSystem, StatSource};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

type Files = Arc<RwLock<HashMap<PathBuf, String>>>;

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: Files,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites a file with the given content.
    pub fn set_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Removes a file; open handles start failing with `NotFound`.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path.as_ref());
    }

    /// Sets `<sys_path>/block/<device>/stat` to the given counters.
    pub fn set_device_stat(
        &self,
        sys_path: impl AsRef<Path>,
        device: &str,
        fields: [u64; FIELD_COUNT],
    ) {
        let content = fields
            .iter()
            .map(|v| format!("{v:>8}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_file(
            sys_path.as_ref().join("block").join(device).join("stat"),
            content + "\n",
        );
    }

    fn read(files: &Files, path: &Path) -> io::Result<String> {
        files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("mock file not found: {}", path.display()),
                )
            })
    }
}

impl FileSystem for MockFs {
    type Source = MockStatSource;

    fn open(&self, path: &Path) -> io::Result<MockStatSource> {
        // Fail like File::open would.
        Self::read(&self.files, path)?;
        Ok(MockStatSource {
            files: Arc::clone(&self.files),
            path: path.to_path_buf(),
            buf: String::new(),
        })
    }
}

/// Open handle onto a `MockFs` file.
#[derive(Debug)]
pub struct MockStatSource {
    files: Files,
    path: PathBuf,
    buf: String,
}

impl StatSource for MockStatSource {
    fn read_stat(&mut self) -> io::Result<&str> {
        self.buf = MockFs::read(&self.files, &self.path)?;
        Ok(&self.buf)
    }
}
