use std::{fs::File, io::Write, path::Path};

use crate::SealingWrite;

/// File-backed [`SealingWrite`]. Sealing flushes and syncs the file; after
/// that every write fails.
pub struct FileWriter {
    file: Option<File>,
}

impl FileWriter {
    pub fn new(file: File) -> FileWriter {
        FileWriter { file: Some(file) }
    }

    /// Creates a new file at `path`, failing if it already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<FileWriter> {
        Ok(FileWriter::new(File::create_new(path)?))
    }

    /// Creates or truncates the file at `path`.
    pub fn create_or_truncate<P: AsRef<Path>>(path: P) -> std::io::Result<FileWriter> {
        Ok(FileWriter::new(File::create(path)?))
    }

    pub fn is_sealed(&self) -> bool {
        self.file.is_none()
    }
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?
            .write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}
