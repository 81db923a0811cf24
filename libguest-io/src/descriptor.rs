//! A guest file descriptor backed by one host file.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FileIoConfig;
use crate::error::{FileIoError, Result};
use crate::file_io::{FileIo, fallback};
use crate::host::HostFileHandle;
use crate::memory::GuestMemory;
use crate::mmap;
use crate::stat::{self, StatAbi, StatSource};
use crate::tee::SharedTee;
use crate::util::inspect::inspect;
use crate::util::open_flags::{OpenFlags, Whence};

#[derive(Debug)]
pub struct VirtualFileDescriptor {
    flags: OpenFlags,
    host_path: PathBuf,
    guest_path: String,
    handle: HostFileHandle,
    tee: Option<SharedTee>,
    config: Arc<FileIoConfig>,
}

impl VirtualFileDescriptor {
    /// Opens (creating if needed) `host_path` on behalf of the guest path
    /// `guest_path`. The new descriptor is positioned at offset 0.
    pub fn open(
        flags: OpenFlags,
        host_path: impl AsRef<Path>,
        guest_path: impl Into<String>,
        config: Arc<FileIoConfig>,
    ) -> Result<Self> {
        let host_path = host_path.as_ref().to_path_buf();
        let handle = HostFileHandle::open(&host_path)?;
        let guest_path = guest_path.into();
        debug!(
            "open guest={guest_path} host={} flags={:#o}",
            host_path.display(),
            flags.bits()
        );
        Ok(Self {
            flags,
            host_path,
            guest_path,
            handle,
            tee: None,
            config,
        })
    }

    pub fn with_debug_tee(mut self, tee: impl Into<SharedTee>) -> Self {
        self.tee = Some(tee.into());
        self
    }

    pub fn set_debug_tee(&mut self, tee: Option<SharedTee>) {
        self.tee = tee;
    }

    pub fn debug_tee(&self) -> Option<&SharedTee> {
        self.tee.as_ref()
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    pub fn host_path(&self) -> &Path {
        &self.host_path
    }

    pub fn guest_path(&self) -> &str {
        &self.guest_path
    }

    pub fn config(&self) -> &Arc<FileIoConfig> {
        &self.config
    }

    pub fn position(&self) -> Result<u64> {
        self.handle.position()
    }

    pub fn length(&self) -> Result<u64> {
        self.handle.length()
    }

    /// The host file is the guest's standard output, judged by file name.
    pub fn is_stdout(&self) -> bool {
        self.host_path
            .file_name()
            .is_some_and(|name| name == self.config.stdout_name.as_str())
    }

    pub fn stat_source(&self) -> Result<StatSource> {
        Ok(StatSource {
            size: self.handle.length()?,
            block_size: self.config.page_size,
            stdout: self.is_stdout(),
        })
    }

    /// Opens a second descriptor on the same host file with the same flags,
    /// tee and configuration. The copy has its own handle and starts at 0.
    pub fn duplicate(&self) -> Result<VirtualFileDescriptor> {
        let dup = VirtualFileDescriptor::open(
            self.flags,
            &self.host_path,
            self.guest_path.clone(),
            Arc::clone(&self.config),
        )?;
        Ok(VirtualFileDescriptor {
            tee: self.tee.clone(),
            ..dup
        })
    }

    /// A seek target outside the signed 64-bit file offset range.
    fn seek_overflow(&self, base: u64, op: &str, offset: impl fmt::Display) -> FileIoError {
        FileIoError::io(
            format!("seek {} to {base} {op} {offset}", self.host_path.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "seek offset out of range"),
        )
    }

    fn read_context(&self, requested: usize) -> String {
        let fp = self.handle.position().unwrap_or_default();
        let length = self.handle.length().unwrap_or_default();
        format!(
            "read path={}, fp={fp}, _count={requested}, length={length}",
            self.host_path.display()
        )
    }
}

impl fmt::Display for VirtualFileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.guest_path)
    }
}

impl FileIo for VirtualFileDescriptor {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if let Some(tee) = &self.tee {
            if let Err(e) = tee.mirror(data) {
                warn!("debug tee for {} dropped {} bytes: {e}", self.guest_path, data.len());
            }
        }

        inspect(data, self.config.inspect_limit, "write");

        if self.flags.is_append() {
            self.handle.seek_end()?;
        }
        self.handle.write_all(data)?;
        Ok(data.len())
    }

    fn read(
        &mut self,
        memory: &mut dyn GuestMemory,
        buffer: u64,
        requested: usize,
    ) -> Result<usize> {
        let position = self.handle.position()?;
        let length = self.handle.length()?;

        // Cursor parked past EOF by lseek: the gap is a hole that was never
        // written, so there is nothing to hand back.
        let Some(available) = length.checked_sub(position) else {
            debug!("{}", self.read_context(requested));
            return Ok(0);
        };
        let capped = requested.min(self.config.read_cap);
        let count = usize::try_from(available)
            .map_or(capped, |available| capped.min(available));

        let mut data = vec![0u8; count];
        let read = self.handle.read(&mut data)?;
        if read == 0 {
            debug!("{}", self.read_context(requested));
            return Ok(0);
        }

        let position = self.handle.position()?;
        let length = self.handle.length()?;
        if position > length {
            return Err(FileIoError::InternalInconsistency { position, length });
        }

        data.truncate(read);
        if log_enabled!(log::Level::Debug) {
            inspect(&data, self.config.inspect_limit, &self.read_context(requested));
        }
        memory
            .write_bytes(buffer, &data)
            .map_err(|source| FileIoError::GuestMemory {
                address: buffer,
                source,
            })?;
        Ok(data.len())
    }

    fn lseek(&mut self, offset: i32, whence: i32) -> Result<i32> {
        let Some(whence) = Whence::from_raw(whence) else {
            return Ok(fallback::lseek(&self.guest_path, offset, whence));
        };

        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.handle.position()?,
            Whence::End => self.handle.length()?,
        };
        let target = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(i64::from(offset)))
            .ok_or_else(|| self.seek_overflow(base, "+", i64::from(offset)))?;
        let position = self.handle.seek_to(target)?;
        Ok(position as i32)
    }

    fn llseek(
        &mut self,
        memory: &mut dyn GuestMemory,
        offset_high: u32,
        offset_low: u32,
        result: u64,
        whence: i32,
    ) -> Result<i32> {
        let offset = (u64::from(offset_high) << 32) | u64::from(offset_low);
        let position = match Whence::from_raw(whence) {
            Some(Whence::Set) => self.handle.seek(offset)?,
            // from-end subtracts the offset rather than adding it
            Some(Whence::End) => {
                let length = self.handle.length()?;
                let target = i64::try_from(length)
                    .ok()
                    .zip(i64::try_from(offset).ok())
                    .and_then(|(length, offset)| length.checked_sub(offset))
                    .ok_or_else(|| self.seek_overflow(length, "-", offset))?;
                self.handle.seek_to(target)?
            }
            _ => {
                return Ok(fallback::llseek(
                    &self.guest_path,
                    offset_high,
                    offset_low,
                    whence,
                ));
            }
        };

        memory
            .write_u64_le(result, position)
            .map_err(|source| FileIoError::GuestMemory {
                address: result,
                source,
            })?;
        Ok(0)
    }

    fn fstat(&mut self, memory: &mut dyn GuestMemory, stat: u64, abi: StatAbi) -> Result<i32> {
        let view = stat::render(abi, &self.stat_source()?);
        memory
            .write_bytes(stat, view.as_bytes())
            .map_err(|source| FileIoError::GuestMemory {
                address: stat,
                source,
            })?;
        Ok(0)
    }

    fn ioctl(&mut self, request: u64, argp: u64) -> Result<i32> {
        if self.config.is_std_stream(&self.guest_path) {
            return Ok(0);
        }
        Ok(fallback::ioctl(&self.guest_path, request, argp))
    }

    fn mmap_data(&mut self, offset: u64, length: usize) -> Result<Vec<u8>> {
        mmap::read_range(&mut self.handle, offset, length, self.config.mmap_chunk_size)
    }

    fn dup(&self) -> Result<Box<dyn FileIo>> {
        Ok(Box::new(self.duplicate()?))
    }

    fn close(&mut self) {
        if let Err(e) = self.handle.close() {
            warn!("close {}: {e}", self.host_path.display());
        }

        if let Some(tee) = self.tee.take() {
            if let Err(e) = tee.flush() {
                warn!("flush debug tee for {}: {e}", self.guest_path);
            }
        }
    }
}
