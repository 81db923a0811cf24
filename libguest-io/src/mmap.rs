use crate::error::Result;
use crate::host::HostFileHandle;

/// Reads up to `length` bytes starting at `offset`, `chunk_size` bytes per host
/// read. Stops early at end of file, so the result may be short.
pub fn read_range(
    handle: &mut HostFileHandle,
    offset: u64,
    length: usize,
    chunk_size: usize,
) -> Result<Vec<u8>> {
    handle.seek(offset)?;

    // the file may be far shorter than the guest asked for
    let mut out = Vec::with_capacity(length.min(chunk_size));
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let count = (length - out.len()).min(buf.len());
        if count == 0 {
            break;
        }

        let read = handle.read(&mut buf[..count])?;
        if read == 0 {
            break;
        }
        out.extend_from_slice(&buf[..read]);
    }

    trace!(
        "mmap range {} offset={offset} length={length} got={}",
        handle.path().display(),
        out.len()
    );
    Ok(out)
}
