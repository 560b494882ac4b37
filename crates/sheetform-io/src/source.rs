//! Seams for the caller-owned halves of an import/export: obtaining the
//! uploaded file and presenting the generated workbook.

use crate::error::IoError;
use std::future::Future;
use std::path::{Path, PathBuf};

/// A file handle whose full contents can be loaded asynchronously.
///
/// Loading is the only suspension point of a workbook read. There is no
/// timeout; a stalled source stalls the read.
pub trait FileSource {
    fn read_bytes(self) -> impl Future<Output = Result<Vec<u8>, IoError>> + Send;
}

impl FileSource for PathBuf {
    async fn read_bytes(self) -> Result<Vec<u8>, IoError> {
        Ok(tokio::fs::read(self).await?)
    }
}

impl FileSource for &Path {
    async fn read_bytes(self) -> Result<Vec<u8>, IoError> {
        Ok(tokio::fs::read(self).await?)
    }
}

impl FileSource for Vec<u8> {
    async fn read_bytes(self) -> Result<Vec<u8>, IoError> {
        Ok(self)
    }
}

impl FileSource for &[u8] {
    async fn read_bytes(self) -> Result<Vec<u8>, IoError> {
        Ok(self.to_vec())
    }
}

/// Receives a finished workbook under its download file name.
pub trait DownloadSink {
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), IoError>;
}

impl<F> DownloadSink for F
where
    F: Fn(&str, Vec<u8>) -> Result<(), IoError>,
{
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), IoError> {
        self(filename, bytes)
    }
}

/// Saves deliveries as files inside a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), IoError> {
        let path = self.dir.join(filename);
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "saving download");
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
