use bitflags::bitflags;

// Guest-side open(2) flag values (Linux generic ABI). These describe what the
// guest passed, so they are fixed here rather than taken from the host libc.
const GUEST_O_WRONLY: u32 = 0o1;
const GUEST_O_RDWR: u32 = 0o2;
const GUEST_O_CREAT: u32 = 0o100;
const GUEST_O_EXCL: u32 = 0o200;
const GUEST_O_TRUNC: u32 = 0o1000;
const GUEST_O_APPEND: u32 = 0o2000;
const GUEST_O_NONBLOCK: u32 = 0o4000;

const SEEK_SET: i32 = 0;
const SEEK_CUR: i32 = 1;
const SEEK_END: i32 = 2;

bitflags! {
    /// Open flags recorded on a guest descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Write only.
        const WRONLY = GUEST_O_WRONLY;
        /// Read and write.
        const RDWR = GUEST_O_RDWR;
        /// Create the file if it does not exist.
        const CREAT = GUEST_O_CREAT;
        /// Fail if the file exists (with CREAT).
        const EXCL = GUEST_O_EXCL;
        /// Truncate on open.
        const TRUNC = GUEST_O_TRUNC;
        /// Every write goes to the current end of file.
        const APPEND = GUEST_O_APPEND;
        /// Non-blocking mode.
        const NONBLOCK = GUEST_O_NONBLOCK;
    }
}

impl OpenFlags {
    /// Keeps unknown guest bits so they survive dup.
    pub fn from_guest(raw: u32) -> Self {
        OpenFlags::from_bits_retain(raw)
    }

    pub fn is_append(&self) -> bool {
        self.contains(OpenFlags::APPEND)
    }
}

/// lseek(2) whence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

impl Whence {
    pub fn from_raw(whence: i32) -> Option<Self> {
        match whence {
            SEEK_SET => Some(Whence::Set),
            SEEK_CUR => Some(Whence::Cur),
            SEEK_END => Some(Whence::End),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Whence::Set => SEEK_SET,
            Whence::Cur => SEEK_CUR,
            Whence::End => SEEK_END,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bit() {
        let flags = OpenFlags::from_guest(0o2002);
        assert!(flags.is_append());
        assert!(flags.contains(OpenFlags::RDWR));
        assert!(!OpenFlags::from_guest(0o1).is_append());
    }

    #[test]
    fn test_unknown_bits_retained() {
        let raw = 0o2000 | 0x8000_0000;
        assert_eq!(OpenFlags::from_guest(raw).bits(), raw);
    }

    #[test]
    fn test_whence() {
        assert_eq!(Whence::from_raw(0), Some(Whence::Set));
        assert_eq!(Whence::from_raw(2), Some(Whence::End));
        assert_eq!(Whence::from_raw(3), None);
        assert_eq!(Whence::Cur.as_raw(), 1);
    }
}
