//! # Varint Codec
//!
//! Unsigned integers in a 7-bit-per-byte little-endian continuation encoding.
//! Each byte carries seven value bits; the high bit (0x80) marks that another
//! byte follows. Message ids travel in this form.
//!
//! ```rust
//! use pomelo_protocol::core::varint::{decode_unsigned, encode_unsigned};
//!
//! let bytes = encode_unsigned(300);
//! assert_eq!(bytes, vec![0xAC, 0x02]);
//! assert_eq!(decode_unsigned(&bytes, 0).unwrap(), (300, 2));
//! ```

use crate::core::reader::ByteReader;
use crate::error::{ProtocolError, Result};

/// Longest encoding of a `u64` (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// Encode `value`. Always emits at least one byte.
#[must_use]
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_unsigned_into(value, &mut out);
    out
}

/// Append the encoding of `value` to `out`.
pub fn encode_unsigned_into(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value as u8) & PAYLOAD_MASK;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | CONTINUATION);
    }
}

/// Number of bytes `encode_unsigned(value)` produces.
#[must_use]
pub fn encoded_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Decode a value starting at `offset`, returning it with the offset just past it.
///
/// # Errors
/// - `TruncatedInput` if the buffer ends before a terminating byte
/// - `MalformedVarint` if the encoding runs past 64 bits
pub fn decode_unsigned(bytes: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut reader = ByteReader::at(bytes, offset);
    let value = read_unsigned(&mut reader)?;
    Ok((value, reader.position()))
}

pub(crate) fn read_unsigned(reader: &mut ByteReader<'_>) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8()?;
        let bits = u64::from(byte & PAYLOAD_MASK);
        // The tenth byte may only contribute the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && bits > 1 {
            return Err(ProtocolError::MalformedVarint);
        }
        value |= bits << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }
    Err(ProtocolError::MalformedVarint)
}
