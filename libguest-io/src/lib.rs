//! Host-backed file descriptors for a guest process running under a CPU
//! emulator.
//!
//! The emulator's syscall dispatcher resolves a guest path to a host file and
//! hands the resulting [`VirtualFileDescriptor`] to its descriptor table as a
//! `Box<dyn FileIo>`. Reads and writes move bytes between the host file and
//! guest memory, `fstat` renders either guest `stat` shape, and `mmap` pulls
//! file ranges into guest memory.

#[macro_use]
extern crate log;

pub mod config;
pub mod descriptor;
pub mod error;
pub mod file_io;
pub mod host;
pub mod memory;
pub mod mmap;
pub mod stat;
pub mod tee;
pub mod util;

pub use config::FileIoConfig;
pub use descriptor::VirtualFileDescriptor;
pub use error::{FileIoError, Result};
pub use file_io::FileIo;
pub use memory::{FlatMemory, GuestMemory};
pub use stat::StatAbi;
pub use tee::{DebugTee, SharedTee};
pub use util::open_flags::{OpenFlags, Whence};
