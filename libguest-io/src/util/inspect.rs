//! Hexdump helper for debug-level tracing of guest I/O payloads.

const ROW: usize = 16;

/// Renders `data` as an offset/hex/ascii dump headed by `label`.
pub fn hexdump(data: &[u8], label: &str) -> String {
    let mut out = format!("{label}, size={} ({:#x})", data.len(), data.len());
    for (row, chunk) in data.chunks(ROW).enumerate() {
        let mut hex = hex::encode(chunk);
        // pad the last row so the ascii column lines up
        hex.push_str(&"  ".repeat(ROW - chunk.len()));
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        out.push_str(&format!("\n{:08x}: {hex}  {ascii}", row * ROW));
    }
    out
}

/// Logs a hexdump at debug level when the payload is smaller than `limit`.
pub fn inspect(data: &[u8], limit: usize, label: &str) {
    if log_enabled!(log::Level::Debug) && data.len() < limit {
        debug!("{}", hexdump(data, label));
    }
}
