//! Diagnostic sink that receives a copy of every guest write.

use std::fmt;
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex};

pub struct DebugTee {
    sink: BufWriter<Box<dyn Write + Send>>,
}

impl DebugTee {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: BufWriter::new(Box::new(sink)),
        }
    }

    /// Mirrors `data` and flushes so the sink sees writes as they happen.
    pub fn mirror(&mut self, data: &[u8]) -> io::Result<()> {
        self.sink.write_all(data)?;
        self.sink.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl fmt::Debug for DebugTee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTee")
            .field("buffered", &self.sink.buffer().len())
            .finish()
    }
}

/// A tee shared by a descriptor and its duplicates.
#[derive(Debug, Clone)]
pub struct SharedTee(Arc<Mutex<DebugTee>>);

impl SharedTee {
    pub fn new(tee: DebugTee) -> Self {
        SharedTee(Arc::new(Mutex::new(tee)))
    }

    pub fn mirror(&self, data: &[u8]) -> io::Result<()> {
        self.lock()?.mirror(data)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock()?.flush()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, DebugTee>> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("debug tee lock poisoned"))
    }

    pub fn ptr_eq(&self, other: &SharedTee) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<DebugTee> for SharedTee {
    fn from(tee: DebugTee) -> Self {
        SharedTee::new(tee)
    }
}
