use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileIoError>;

#[derive(Debug, Error)]
pub enum FileIoError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IoFailure: {context}: {source}")]
    IoFailure {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("InternalInconsistency: fp={position}, length={length}")]
    InternalInconsistency { position: u64, length: u64 },

    #[error("GuestMemory: write at {address:#x} failed: {source}")]
    GuestMemory {
        address: u64,
        #[source]
        source: io::Error,
    },
}

impl FileIoError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        FileIoError::IoFailure {
            context: context.into(),
            source,
        }
    }
}

/// Attaches a context message to host I/O results, turning them into `IoFailure`.
pub trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| FileIoError::io(f(), source))
    }
}
