//! Abstractions for counter source access to enable testing and mocking.
//!
//! The `FileSystem` trait opens per-device counter sources; a `StatSource` is
//! an open handle that can be re-read from the start on every tick. Sampling
//! works against the real sysfs on Linux and against `MockFs` in tests.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// An open counter source that is re-read from the beginning on each call.
pub trait StatSource: Send {
    /// Rewinds the source and returns its whole current content.
    ///
    /// The returned slice is valid until the next call.
    fn read_stat(&mut self) -> io::Result<&str>;
}

/// Opens counter sources.
pub trait FileSystem: Send + Sync {
    type Source: StatSource + 'static;

    /// Opens the counter source at `path`.
    ///
    /// # Returns
    /// An open handle, or an I/O error if the path does not exist or cannot
    /// be read.
    fn open(&self, path: &Path) -> io::Result<Self::Source>;
}

/// Real filesystem implementation backed by `std::fs`.
///
/// Use this in production to read from the actual `/sys` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    type Source = StatFile;

    fn open(&self, path: &Path) -> io::Result<StatFile> {
        StatFile::open(path)
    }
}

/// A stat pseudo-file held open for the lifetime of its sampler.
///
/// The kernel regenerates the content on every read from offset 0, so each
/// read seeks back to the start and reuses one buffer.
#[derive(Debug)]
pub struct StatFile {
    file: File,
    path: PathBuf,
    buf: String,
}

impl StatFile {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            file,
            path,
            buf: String::with_capacity(256),
        })
    }
}

impl StatSource for StatFile {
    fn read_stat(&mut self) -> io::Result<&str> {
        self.buf.clear();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut self.buf))
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", self.path.display())))?;
        Ok(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stat_file_rereads_from_start() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "1 2 3 4 5 6 7 8 9 10 11").unwrap();

        let mut source = RealFs::new().open(tmp.path()).unwrap();
        assert_eq!(source.read_stat().unwrap(), "1 2 3 4 5 6 7 8 9 10 11\n");
        // Second read must start over rather than hit EOF.
        assert_eq!(source.read_stat().unwrap(), "1 2 3 4 5 6 7 8 9 10 11\n");
    }

    #[test]
    fn test_stat_file_sees_rewritten_content() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "1 1 1 1 1 1 1 1 1 1 1\n").unwrap();

        let mut source = StatFile::open(tmp.path()).unwrap();
        assert_eq!(source.read_stat().unwrap(), "1 1 1 1 1 1 1 1 1 1 1\n");

        std::fs::write(tmp.path(), "2 2 2 2 2 2 2 2 2 2 2\n").unwrap();
        assert_eq!(source.read_stat().unwrap(), "2 2 2 2 2 2 2 2 2 2 2\n");
    }

    #[test]
    fn test_read_error_names_path() {
        // Opening a directory succeeds on Linux; reading it does not.
        let dir = tempfile::tempdir().unwrap();
        let mut source = StatFile::open(dir.path()).unwrap();
        let err = source.read_stat().unwrap_err();
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_real_fs_open_missing() {
        let err = RealFs::new()
            .open(Path::new("/nonexistent/block/sdz/stat"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
