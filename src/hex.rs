//! Hex-dump helpers for logging and diagnostics.
//!
//! Encoded frames are opaque byte strings; these helpers render them for
//! trace output and parse operator-supplied hex back into bytes.

/// Render bytes as upper-case hex pairs joined by `glue`.
///
/// `bytes_to_hex_string(&[1, 10, 255], "-")` yields `"01-0A-FF"`.
pub fn bytes_to_hex_string(bytes: &[u8], glue: &str) -> String {
    const LUT: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * (2 + glue.len()));
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(glue);
        }
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0F) as usize] as char);
    }
    out
}

/// Parse a hex string into bytes.
///
/// Permissive by design: non-hex characters act as separators, and a
/// trailing odd nibble is kept as its own byte. Returns `None` only for
/// input with no hex digits at all.
pub fn hex_string_to_bytes(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() / 2);
    let mut pending: Option<u8> = None;
    for ch in s.chars() {
        match ch.to_digit(16) {
            Some(n) => match pending.take() {
                Some(hi) => out.push((hi << 4) | n as u8),
                None => pending = Some(n as u8),
            },
            None => {
                // Separator: flush any dangling nibble as its own byte.
                if let Some(hi) = pending.take() {
                    out.push(hi);
                }
            }
        }
    }
    if let Some(hi) = pending {
        out.push(hi);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
