//! Frame codec
//!
//! Length-prefixed framing, independent of payload contents.
//!
//! ## Wire Format
//! ```text
//! ┌────────────────────┬─────┬─────────────────────────────┐
//! │ Len (ASCII digits) │ ':' │     Payload (Len bytes)     │
//! └────────────────────┴─────┴─────────────────────────────┘
//! ```
//!
//! No padding and no trailing terminator. The same format is used in both
//! directions.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MarionetteError, Result};

/// Separates the length prefix from the payload
pub const DELIMITER: u8 = b':';

/// Longest accepted length prefix (u64::MAX has 20 digits)
pub const MAX_PREFIX_DIGITS: usize = 20;

/// Largest buffer growth step while reading a payload
const READ_CHUNK: usize = 64 * 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a payload into a frame
///
/// Format: decimal length + ':' + payload
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let prefix = payload.len().to_string();

    let mut frame = BytesMut::with_capacity(prefix.len() + 1 + payload.len());
    frame.put_slice(prefix.as_bytes());
    frame.put_u8(DELIMITER);
    frame.put_slice(payload);

    frame.freeze()
}

/// Write a framed payload to a stream
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(payload);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Read one frame from a stream with no size cap
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    read_frame_limited(reader, None)
}

/// Read one frame, rejecting declared lengths above `max_size`
pub fn read_frame_limited<R: Read>(reader: &mut R, max_size: Option<usize>) -> Result<Vec<u8>> {
    let len = read_length_prefix(reader)?;

    if let Some(max) = max_size {
        if len > max {
            return Err(MarionetteError::FrameTooLarge { size: len, max });
        }
    }

    read_payload(reader, len)
}

/// Scan the length prefix one byte at a time up to the delimiter.
///
/// Reading a single byte per call means nothing past the delimiter is
/// consumed, whatever the underlying stream chunking looks like.
fn read_length_prefix<R: Read>(reader: &mut R) -> Result<usize> {
    let mut digits: Vec<u8> = Vec::with_capacity(MAX_PREFIX_DIGITS);
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) if digits.is_empty() => return Err(MarionetteError::ConnectionClosed),
            Ok(0) => {
                return Err(MarionetteError::Framing(format!(
                    "stream ended inside length prefix after {} digits",
                    digits.len()
                )))
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }

        match byte[0] {
            DELIMITER => break,
            b if b.is_ascii_digit() => {
                if digits.len() == MAX_PREFIX_DIGITS {
                    return Err(MarionetteError::Framing(format!(
                        "length prefix longer than {} digits",
                        MAX_PREFIX_DIGITS
                    )));
                }
                digits.push(b);
            }
            b => {
                return Err(MarionetteError::Framing(format!(
                    "unexpected byte 0x{:02x} in length prefix",
                    b
                )))
            }
        }
    }

    if digits.is_empty() {
        return Err(MarionetteError::Framing("empty length prefix".to_string()));
    }

    digits.iter().try_fold(0usize, |len, &d| {
        len.checked_mul(10)?.checked_add(usize::from(d - b'0'))
    })
    .ok_or_else(|| {
        MarionetteError::Framing(format!(
            "length prefix {} does not fit in usize",
            String::from_utf8_lossy(&digits)
        ))
    })
}

/// Read exactly `len` payload bytes
///
/// The buffer grows as bytes arrive, so a declared length is never
/// allocated up front.
fn read_payload<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(len.min(READ_CHUNK));

    while payload.len() < len {
        let start = payload.len();
        let want = (len - start).min(READ_CHUNK);
        payload.resize(start + want, 0);

        match reader.read(&mut payload[start..]) {
            Ok(0) => {
                return Err(MarionetteError::TruncatedFrame {
                    expected: len,
                    received: start,
                })
            }
            Ok(n) => payload.truncate(start + n),
            Err(e) if e.kind() == ErrorKind::Interrupted => payload.truncate(start),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(payload)
}
