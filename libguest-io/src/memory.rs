//! Guest address-space write capability.
//!
//! The descriptor layer never owns guest memory. It is handed something that can
//! copy host bytes to a guest virtual address and uses that for read results,
//! stat records, seek results and mappings.

use std::io;

pub trait GuestMemory {
    /// Copies `data` into the guest at `address`.
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> io::Result<()>;

    fn write_u64_le(&mut self, address: u64, value: u64) -> io::Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }
}

/// A single contiguous guest region starting at `base`.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    base: u64,
    bytes: Vec<u8>,
}

impl FlatMemory {
    pub fn new(base: u64, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0u8; size],
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Returns `len` bytes at `address`, or `None` if the range is not mapped.
    pub fn read(&self, address: u64, len: usize) -> Option<&[u8]> {
        let start = self.offset_of(address, len)?;
        Some(&self.bytes[start..start + len])
    }

    fn offset_of(&self, address: u64, len: usize) -> Option<usize> {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start)
    }
}

impl GuestMemory for FlatMemory {
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> io::Result<()> {
        let start = self.offset_of(address, data.len()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "unmapped guest range {address:#x}+{:#x} (region {:#x}+{:#x})",
                    data.len(),
                    self.base,
                    self.bytes.len()
                ),
            )
        })?;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
