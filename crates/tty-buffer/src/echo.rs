//! Local echo transcoding
//!
//! Terminal input is echoed back to the originating line so the user sees
//! what they type. Printable bytes echo as themselves; C0 control bytes
//! (0x00..=0x1F) are rewritten into two-character caret notation, e.g.
//! 0x01 becomes `^A` and 0x1B becomes `^[`. A small pass-through set of
//! editing and line-movement bytes keeps its native single-byte form:
//! backspace, tab, line feed, carriage return, and record separator.
//!
//! [`transcode`] produces the complete on-wire echo image for a drained
//! input batch so the caller can issue a single device write per batch
//! instead of one write per byte.

/// Highest C0 control byte.
const CONTROL_MAX: u8 = 0x1F;

/// Control bytes echoed in their native single-byte form.
const PASSTHROUGH: [u8; 5] = [0x08, 0x09, 0x0A, 0x0D, 0x1E];

/// `true` for C0 control bytes that echo as themselves.
fn is_passthrough(byte: u8) -> bool {
    PASSTHROUGH.contains(&byte)
}

/// Build the echo image for `input`.
///
/// Runs of bytes that echo unchanged are copied as contiguous slices;
/// only control bytes outside the pass-through set expand to `^X` pairs.
/// The output written to the line is byte-identical to echoing each input
/// byte individually.
pub fn transcode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut run_start = 0;

    for (idx, &byte) in input.iter().enumerate() {
        if byte <= CONTROL_MAX && !is_passthrough(byte) {
            out.extend_from_slice(&input[run_start..idx]);
            out.push(b'^');
            out.push(byte + 0x40);
            run_start = idx + 1;
        }
    }
    out.extend_from_slice(&input[run_start..]);

    out
}
