//! Guest `stat` record encodings.
//!
//! Two guest ABIs ask for file metadata in incompatible shapes. Both renderers
//! here are pure: they take a [`StatSource`] and produce the exact little-endian
//! bytes the guest expects, and the caller picks the shape with [`StatAbi`].

/// File type mask and the two types this layer reports (guest values).
pub const S_IFMT: u32 = 0o170000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFCHR: u32 = 0o020000;

/// Permission bits reported for regular files and the stdout device.
pub const PERM_ALL: u32 = 0o777;

/// Byte length of the legacy record.
pub const LEGACY_STAT_SIZE: usize = 0x68;

/// Byte length of the explicit-field record.
pub const EXPLICIT_STAT_SIZE: usize = 144;

/// Selects the record shape a guest calling convention expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAbi {
    /// Fixed-offset record of 32-bit guests.
    Legacy,
    /// Named-field record packed by [`ExplicitStat::pack`].
    Explicit,
}

/// What the descriptor knows about its file when asked for metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSource {
    pub size: u64,
    pub block_size: u32,
    /// The descriptor is backed by the guest's standard output.
    pub stdout: bool,
}

/// A rendered record, ready to be copied into guest memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatView {
    Legacy([u8; LEGACY_STAT_SIZE]),
    Explicit([u8; EXPLICIT_STAT_SIZE]),
}

impl StatView {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StatView::Legacy(buf) => buf,
            StatView::Explicit(buf) => buf,
        }
    }
}

pub fn render(abi: StatAbi, src: &StatSource) -> StatView {
    match abi {
        StatAbi::Legacy => StatView::Legacy(render_legacy(src)),
        StatAbi::Explicit => {
            let mut buf = [0u8; EXPLICIT_STAT_SIZE];
            ExplicitStat::from_source(src).pack(&mut buf);
            StatView::Explicit(buf)
        }
    }
}

// Legacy field offsets.
const LEGACY_DEV: usize = 0x00;
const LEGACY_MODE: usize = 0x10;
const LEGACY_UID: usize = 0x18;
const LEGACY_GID: usize = 0x1c;
const LEGACY_SIZE: usize = 0x30;
const LEGACY_BLKSIZE: usize = 0x38;
const LEGACY_INO: usize = 0x60;

/// Mode of the legacy record: the stdout device is a world-accessible
/// character device, anything else a regular file with no permission bits.
pub fn legacy_mode(stdout: bool) -> u32 {
    if stdout { S_IFCHR | PERM_ALL } else { S_IFREG }
}

/// Renders the legacy record. Block count and the time fields stay zero.
pub fn render_legacy(src: &StatSource) -> [u8; LEGACY_STAT_SIZE] {
    let mut buf = [0u8; LEGACY_STAT_SIZE];
    put(&mut buf, LEGACY_DEV, &0u64.to_le_bytes());
    put(&mut buf, LEGACY_MODE, &legacy_mode(src.stdout).to_le_bytes());
    put(&mut buf, LEGACY_UID, &0u32.to_le_bytes());
    put(&mut buf, LEGACY_GID, &0u32.to_le_bytes());
    put(&mut buf, LEGACY_SIZE, &src.size.to_le_bytes());
    put(&mut buf, LEGACY_BLKSIZE, &src.block_size.to_le_bytes());
    put(&mut buf, LEGACY_INO, &0u64.to_le_bytes());
    buf
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timespec {
    pub tv_sec: i64,
    pub tv_nsec: i64,
}

/// The explicit-field record (64-bit Darwin `stat64` shape).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitStat {
    pub st_dev: i32,
    pub st_mode: u16,
    pub st_nlink: u16,
    pub st_ino: u64,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: i32,
    pub st_atimespec: Timespec,
    pub st_mtimespec: Timespec,
    pub st_ctimespec: Timespec,
    pub st_birthtimespec: Timespec,
    pub st_size: i64,
    pub st_blocks: i64,
    pub st_blksize: i32,
    pub st_flags: u32,
    pub st_gen: u32,
}

impl ExplicitStat {
    pub fn from_source(src: &StatSource) -> Self {
        let mut stat = ExplicitStat {
            st_dev: 1,
            st_mode: (S_IFREG | PERM_ALL) as u16,
            st_ino: 1,
            st_uid: 0,
            st_gid: 0,
            st_blksize: src.block_size as i32,
            ..Default::default()
        };
        stat.set_size(src.size);
        stat.set_block_count(block_count(src.size, src.block_size));
        stat
    }

    pub fn set_size(&mut self, size: u64) {
        self.st_size = size as i64;
    }

    pub fn set_block_count(&mut self, blocks: u64) {
        self.st_blocks = blocks as i64;
    }

    /// Serializes the record into its backing buffer.
    pub fn pack(&self, buf: &mut [u8; EXPLICIT_STAT_SIZE]) {
        buf.fill(0);
        put(buf, 0, &self.st_dev.to_le_bytes());
        put(buf, 4, &self.st_mode.to_le_bytes());
        put(buf, 6, &self.st_nlink.to_le_bytes());
        put(buf, 8, &self.st_ino.to_le_bytes());
        put(buf, 16, &self.st_uid.to_le_bytes());
        put(buf, 20, &self.st_gid.to_le_bytes());
        put(buf, 24, &self.st_rdev.to_le_bytes());
        // 28..32 is alignment padding
        put_timespec(buf, 32, &self.st_atimespec);
        put_timespec(buf, 48, &self.st_mtimespec);
        put_timespec(buf, 64, &self.st_ctimespec);
        put_timespec(buf, 80, &self.st_birthtimespec);
        put(buf, 96, &self.st_size.to_le_bytes());
        put(buf, 104, &self.st_blocks.to_le_bytes());
        put(buf, 112, &self.st_blksize.to_le_bytes());
        put(buf, 116, &self.st_flags.to_le_bytes());
        put(buf, 120, &self.st_gen.to_le_bytes());
        // st_lspare and st_qspare stay zero
    }
}

/// `ceil(size / block_size)`.
pub fn block_count(size: u64, block_size: u32) -> u64 {
    let block_size = u64::from(block_size.max(1));
    size.div_ceil(block_size)
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn put_timespec(buf: &mut [u8], offset: usize, ts: &Timespec) {
    put(buf, offset, &ts.tv_sec.to_le_bytes());
    put(buf, offset + 8, &ts.tv_nsec.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(buf: &[u8], off: usize) -> u32 {
        u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
    }

    fn u64_at(buf: &[u8], off: usize) -> u64 {
        u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
    }

    #[test]
    fn test_legacy_regular_file() {
        let src = StatSource {
            size: 0x1_2345_6789,
            block_size: 4096,
            stdout: false,
        };
        let buf = render_legacy(&src);
        assert_eq!(u64_at(&buf, 0x00), 0);
        assert_eq!(u32_at(&buf, 0x10), S_IFREG);
        assert_eq!(u32_at(&buf, 0x18), 0);
        assert_eq!(u32_at(&buf, 0x1c), 0);
        assert_eq!(u64_at(&buf, 0x30), 0x1_2345_6789);
        assert_eq!(u32_at(&buf, 0x38), 4096);
        assert_eq!(u32_at(&buf, 0x3c), 0);
        assert_eq!(u64_at(&buf, 0x60), 0);
        // access/modify/change times are left zero
        assert!(buf[0x44..0x5c].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_legacy_stdout_is_char_device() {
        let src = StatSource {
            size: 0,
            block_size: 4096,
            stdout: true,
        };
        let mode = u32_at(&render_legacy(&src), 0x10);
        assert_eq!(mode & S_IFMT, S_IFCHR);
        assert_eq!(mode & 0o777, 0o777);
    }

    #[test]
    fn test_explicit_fields() {
        let src = StatSource {
            size: 4097,
            block_size: 4096,
            stdout: true,
        };
        let stat = ExplicitStat::from_source(&src);
        assert_eq!(stat.st_dev, 1);
        assert_eq!(stat.st_ino, 1);
        assert_eq!(u32::from(stat.st_mode), S_IFREG | 0o777);
        assert_eq!(stat.st_size, 4097);
        assert_eq!(stat.st_blocks, 2);
        assert_eq!(stat.st_blksize, 4096);
    }

    #[test]
    fn test_explicit_pack_offsets() {
        let src = StatSource {
            size: 10,
            block_size: 16384,
            stdout: false,
        };
        let view = render(StatAbi::Explicit, &src);
        let buf = view.as_bytes();
        assert_eq!(buf.len(), EXPLICIT_STAT_SIZE);
        assert_eq!(u32_at(buf, 0), 1);
        assert_eq!(
            u16::from_le_bytes([buf[4], buf[5]]),
            (S_IFREG | 0o777) as u16
        );
        assert_eq!(u64_at(buf, 8), 1);
        assert_eq!(u64_at(buf, 96), 10);
        assert_eq!(u64_at(buf, 104), 1);
        assert_eq!(u32_at(buf, 112), 16384);
        assert!(buf[128..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_count() {
        assert_eq!(block_count(0, 4096), 0);
        assert_eq!(block_count(1, 4096), 1);
        assert_eq!(block_count(4096, 4096), 1);
        assert_eq!(block_count(8193, 4096), 3);
    }

    #[test]
    fn test_render_selects_layout() {
        let src = StatSource {
            size: 1,
            block_size: 4096,
            stdout: false,
        };
        assert_eq!(render(StatAbi::Legacy, &src).as_bytes().len(), LEGACY_STAT_SIZE);
        assert_eq!(
            render(StatAbi::Explicit, &src).as_bytes().len(),
            EXPLICIT_STAT_SIZE
        );
    }
}
