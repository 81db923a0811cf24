//! The guest-facing descriptor abstraction stored in the emulator's fd table.

use std::fmt;

use crate::error::{FileIoError, Result};
use crate::memory::GuestMemory;
use crate::stat::StatAbi;

pub trait FileIo: fmt::Display + Send {
    /// Writes all of `data`, returning its length.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Reads up to `count` bytes into guest memory at `buffer`.
    fn read(&mut self, memory: &mut dyn GuestMemory, buffer: u64, count: usize) -> Result<usize>;

    /// 32-bit lseek; returns the new position truncated to 32 bits.
    fn lseek(&mut self, offset: i32, whence: i32) -> Result<i32> {
        Ok(fallback::lseek(&self.to_string(), offset, whence))
    }

    /// _llseek: stores the 64-bit position at `result`, returns a status code.
    fn llseek(
        &mut self,
        memory: &mut dyn GuestMemory,
        offset_high: u32,
        offset_low: u32,
        result: u64,
        whence: i32,
    ) -> Result<i32> {
        let _ = (memory, result);
        Ok(fallback::llseek(&self.to_string(), offset_high, offset_low, whence))
    }

    /// Renders the `stat` record for `abi` into guest memory at `stat`.
    fn fstat(&mut self, memory: &mut dyn GuestMemory, stat: u64, abi: StatAbi) -> Result<i32>;

    fn ioctl(&mut self, request: u64, argp: u64) -> Result<i32> {
        Ok(fallback::ioctl(&self.to_string(), request, argp))
    }

    /// Collects the bytes backing a mapping of `[offset, offset + length)`.
    fn mmap_data(&mut self, offset: u64, length: usize) -> Result<Vec<u8>>;

    /// Copies the mapping data into guest memory at `address`; returns the
    /// number of bytes copied, which is short when the file is.
    fn mmap(
        &mut self,
        memory: &mut dyn GuestMemory,
        address: u64,
        offset: u64,
        length: usize,
    ) -> Result<usize> {
        let data = self.mmap_data(offset, length)?;
        memory
            .write_bytes(address, &data)
            .map_err(|source| FileIoError::GuestMemory { address, source })?;
        Ok(data.len())
    }

    fn dup(&self) -> Result<Box<dyn FileIo>>;

    fn close(&mut self);
}

/// Results for requests a concrete descriptor does not handle itself.
pub mod fallback {
    /// Guest errno values (Linux generic ABI).
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;

    pub fn lseek(path: &str, offset: i32, whence: i32) -> i32 {
        warn!("lseek path={path} offset={offset} whence={whence} not supported");
        -EINVAL
    }

    pub fn llseek(path: &str, offset_high: u32, offset_low: u32, whence: i32) -> i32 {
        warn!(
            "llseek path={path} offset_high={offset_high:#x} offset_low={offset_low:#x} whence={whence} not supported"
        );
        -EINVAL
    }

    pub fn ioctl(path: &str, request: u64, argp: u64) -> i32 {
        debug!("ioctl path={path} request={request:#x} argp={argp:#x} not supported");
        -ENOTTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    /// Minimal in-memory descriptor relying on every provided method.
    struct Fixed(Vec<u8>);

    impl fmt::Display for Fixed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("/fixed")
        }
    }

    impl FileIo for Fixed {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            self.0.extend_from_slice(data);
            Ok(data.len())
        }

        fn read(
            &mut self,
            _memory: &mut dyn GuestMemory,
            _buffer: u64,
            _count: usize,
        ) -> Result<usize> {
            Ok(0)
        }

        fn fstat(
            &mut self,
            _memory: &mut dyn GuestMemory,
            _stat: u64,
            _abi: StatAbi,
        ) -> Result<i32> {
            Ok(0)
        }

        fn mmap_data(&mut self, offset: u64, length: usize) -> Result<Vec<u8>> {
            let start = (offset as usize).min(self.0.len());
            let end = (start + length).min(self.0.len());
            Ok(self.0[start..end].to_vec())
        }

        fn dup(&self) -> Result<Box<dyn FileIo>> {
            Ok(Box::new(Fixed(self.0.clone())))
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_defaults_report_errno() {
        let mut io = Fixed(Vec::new());
        let mut mem = FlatMemory::new(0, 16);
        assert_eq!(io.lseek(0, 0).unwrap(), -fallback::EINVAL);
        assert_eq!(io.llseek(&mut mem, 0, 0, 0, 0).unwrap(), -fallback::EINVAL);
        assert_eq!(io.ioctl(0x5401, 0).unwrap(), -fallback::ENOTTY);
    }

    #[test]
    fn test_default_mmap_copies_into_guest() {
        let mut io = Fixed(b"mapped bytes".to_vec());
        let mut mem = FlatMemory::new(0x4000, 32);
        assert_eq!(io.mmap(&mut mem, 0x4000, 7, 32).unwrap(), 5);
        assert_eq!(mem.read(0x4000, 5).unwrap(), b"bytes");
    }

    #[test]
    fn test_default_mmap_unmapped_target() {
        let mut io = Fixed(b"data".to_vec());
        let mut mem = FlatMemory::new(0x4000, 2);
        let err = io.mmap(&mut mem, 0x4000, 0, 4).unwrap_err();
        assert!(matches!(err, FileIoError::GuestMemory { address: 0x4000, .. }));
    }
}
