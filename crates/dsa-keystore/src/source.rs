//! Where messages to sign come from

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// Source of message bytes addressed by an identifier
pub trait MessageSource: Send + Sync {
    /// Read the whole message
    fn read(&self, identifier: &str) -> io::Result<Vec<u8>>;

    /// Open the message for streaming. The default buffers [`Self::read`].
    fn open(&self, identifier: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.read(identifier)?)))
    }
}

/// Reads messages from the file system
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    /// Resolve identifiers as plain paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl MessageSource for FileSource {
    fn read(&self, identifier: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(identifier))
    }

    fn open(&self, identifier: &str) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.resolve(identifier))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
