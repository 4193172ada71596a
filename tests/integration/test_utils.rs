//! Shared fixtures for integration tests

use async_trait::async_trait;
use fsdigest::serializer::{ByteStream, StreamOpener};
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;
use tokio::sync::Semaphore;

/// sha256 of the a.txt ("x") / b.txt ("y") directory.
pub const AB_DIRECTORY_SHA256: &str =
    "4214FEF4B3C6D52E699C6C12271D62A1C5F8E0EAF64ADA0D53707EB87F57B6EF";

/// Write `files` (relative path, contents) under a fresh temp directory.
pub fn tree_with(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = temp_dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    temp_dir
}

#[cfg(unix)]
pub fn emfile() -> io::Error {
    io::Error::from_raw_os_error(libc::EMFILE)
}

/// ERROR_TOO_MANY_OPEN_FILES
#[cfg(windows)]
pub fn emfile() -> io::Error {
    io::Error::from_raw_os_error(4)
}

#[cfg(not(any(unix, windows)))]
pub fn emfile() -> io::Error {
    io::Error::from(io::ErrorKind::Other)
}

/// Reports descriptor exhaustion `failures` times, then serves `data`.
pub struct ExhaustedOpener {
    failures: AtomicU32,
    pub calls: AtomicU32,
    data: Vec<u8>,
}

impl ExhaustedOpener {
    pub fn new(failures: u32, data: &[u8]) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            data: data.to_vec(),
        }
    }
}

#[async_trait]
impl StreamOpener for ExhaustedOpener {
    async fn open(&self, _path: &Path) -> io::Result<ByteStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(emfile());
        }
        Ok(Box::pin(Cursor::new(self.data.clone())))
    }
}

/// Reads real files, but only once a permit has been released.
pub struct GatedFsOpener {
    pub gate: Semaphore,
}

impl GatedFsOpener {
    pub fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl StreamOpener for GatedFsOpener {
    async fn open(&self, path: &Path) -> io::Result<ByteStream> {
        self.gate
            .acquire()
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::Other))?
            .forget();
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::pin(file))
    }
}
