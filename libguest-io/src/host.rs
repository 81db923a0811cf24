//! Host storage for one guest file: a read/write, synchronously written file
//! with its own cursor.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::error::{FileIoError, IoContext, Result};

pub struct HostFileHandle {
    path: PathBuf,
    // None once released
    file: Option<File>,
}

impl HostFileHandle {
    /// Opens `path` for reading and writing, creating it and any missing parent
    /// directories first. Directories are rejected.
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Err(FileIoError::InvalidArgument(format!(
                "file is directory: {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .io_context(|| format!("create parent of {}", path.display()))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .io_context(|| format!("process file failed: {}", path.display()))?;

        trace!("opened host file {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| {
            FileIoError::io(
                format!("use of released handle {}", self.path.display()),
                io::Error::from(io::ErrorKind::NotConnected),
            )
        })
    }

    /// Current cursor. May lie beyond `length()`.
    pub fn position(&self) -> Result<u64> {
        let mut file = self.file()?;
        file.stream_position()
            .io_context(|| format!("position {}", self.path.display()))
    }

    pub fn length(&self) -> Result<u64> {
        let file = self.file()?;
        file.metadata()
            .map(|m| m.len())
            .io_context(|| format!("length {}", self.path.display()))
    }

    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(offset))
            .io_context(|| format!("seek {} to {offset}", self.path.display()))
    }

    /// Seeks to an absolute offset computed by the caller; a negative target is
    /// a host I/O failure, matching what the host does for such seeks.
    pub fn seek_to(&mut self, target: i64) -> Result<u64> {
        match u64::try_from(target) {
            Ok(offset) => self.seek(offset),
            Err(_) => Err(FileIoError::io(
                format!("seek {} to {target}", self.path.display()),
                io::Error::new(io::ErrorKind::InvalidInput, "negative seek offset"),
            )),
        }
    }

    /// Moves the cursor to the current end of file.
    pub fn seek_end(&mut self) -> Result<u64> {
        let length = self.length()?;
        self.seek(length)
    }

    /// One host read into `buf`; returns 0 at end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.file()?;
        loop {
            match file.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                res => {
                    return res.io_context(|| format!("read {}", self.path.display()));
                }
            }
        }
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut file = self.file()?;
        file.write_all(data)
            .io_context(|| format!("write {}", self.path.display()))
    }

    /// Releases the host file. A second call is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for HostFileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFileHandle")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
