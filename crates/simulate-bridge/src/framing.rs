//! Length-prefixed framing for the wire protocol.
//!
//! Every frame on the wire is a 4-byte **little-endian** `u32` length prefix
//! followed by that many payload bytes. Requests carry UTF-8 JSON; responses
//! carry raw UTF-8 text.
//!
//! # Wire format
//!
//! ```text
//! +----------------+------------------+
//! | Length (4B LE) | Payload          |
//! +----------------+------------------+
//! ```

use std::io::{ErrorKind, Read, Write};

use crate::error::ProtocolError;
use crate::protocol::MAX_MESSAGE_SIZE;

/// Prefix `payload` with its length.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = checked_len(payload.len(), MAX_MESSAGE_SIZE)?;
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read exactly one frame, blocking until it is complete.
///
/// A stream that ends before the length prefix or the full payload has
/// been read yields [`ProtocolError::ConnectionClosed`]. Declared lengths
/// above `max_size` are rejected before any payload is read.
pub fn read_frame(reader: &mut impl Read, max_size: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    read_full(reader, &mut len_buf)?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_size {
        return Err(ProtocolError::PayloadTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; len];
    read_full(reader, &mut payload)?;
    Ok(payload)
}

/// Write one frame and flush the writer.
pub fn write_frame(writer: &mut impl Write, payload: &[u8]) -> Result<(), ProtocolError> {
    let len = checked_len(payload.len(), MAX_MESSAGE_SIZE)?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), ProtocolError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ProtocolError::ConnectionClosed),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}

fn checked_len(len: usize, max: usize) -> Result<u32, ProtocolError> {
    if len > max {
        return Err(ProtocolError::PayloadTooLarge { size: len, max });
    }
    u32::try_from(len).map_err(|_| ProtocolError::PayloadTooLarge { size: len, max })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
