use serde::{Deserialize, Serialize};

use crate::error::{FileIoError, Result};

/// No single guest `read` returns more than this many bytes.
pub const DEFAULT_READ_CAP: usize = 4096;

/// Size of each host read while collecting data for a memory mapping.
pub const DEFAULT_MMAP_CHUNK: usize = 10240;

/// Guest page alignment, reported as the stat block size.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Payloads smaller than this are hexdumped at debug level.
pub const DEFAULT_INSPECT_LIMIT: usize = 0x3000;

pub const STDOUT_NAME: &str = "stdout";
pub const STDERR_NAME: &str = "stderr";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FileIoConfig {
    pub read_cap: usize,

    pub mmap_chunk_size: usize,

    pub page_size: u32,

    pub inspect_limit: usize,

    pub stdout_name: String,

    pub stderr_name: String,
}

impl Default for FileIoConfig {
    fn default() -> Self {
        Self {
            read_cap: DEFAULT_READ_CAP,
            mmap_chunk_size: DEFAULT_MMAP_CHUNK,
            page_size: DEFAULT_PAGE_SIZE,
            inspect_limit: DEFAULT_INSPECT_LIMIT,
            stdout_name: STDOUT_NAME.into(),
            stderr_name: STDERR_NAME.into(),
        }
    }
}

impl FileIoConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: FileIoConfig = serde_json::from_str(text)
            .map_err(|e| FileIoError::InvalidArgument(format!("bad file io config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_cap == 0 {
            return Err(FileIoError::InvalidArgument("readCap must be non-zero".into()));
        }
        if self.mmap_chunk_size == 0 {
            return Err(FileIoError::InvalidArgument(
                "mmapChunkSize must be non-zero".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(FileIoError::InvalidArgument("pageSize must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether `path` names the guest's standard output or standard error.
    pub fn is_std_stream(&self, path: &str) -> bool {
        path == self.stdout_name || path == self.stderr_name
    }
}
