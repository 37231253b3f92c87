//! Variable-length integer encoding (VByte)
//!
//! 7 payload bits per byte, least significant group first, high bit set on
//! every byte except the last. GroupVarint falls back to this for the tail of
//! a sequence that does not fill a group of four.

use std::io::{Read, Write};

use crate::error::{CodecError, Result};
use crate::int::{narrow, CodecInt};
use crate::io::ReadMayCopy;

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

/// Number of bytes `value` occupies once encoded.
#[inline]
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Encode u32 into `dest`, returning the bytes written
pub fn encode_varint(mut value: u32, dest: &mut [u8]) -> Result<usize> {
    let needed = encoded_len(value);
    if dest.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }
    for slot in dest.iter_mut().take(needed - 1) {
        *slot = (value & 0x7F) as u8 | 0x80; // Set continuation bit
        value >>= 7;
    }
    dest[needed - 1] = value as u8;
    Ok(needed)
}

/// Decode one varint from the front of `src`, returning (value, bytes read)
pub fn decode_varint(src: &[u8]) -> Result<(u32, usize)> {
    let mut value = 0u32;
    for (i, &byte) in src.iter().take(MAX_VARINT_LEN).enumerate() {
        let shift = 7 * i as u32;
        if i == MAX_VARINT_LEN - 1 && byte > 0x0F {
            return Err(CodecError::VarintOverflow);
        }
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::Truncated {
        needed: src.len() + 1,
        available: src.len(),
    })
}

/// Encode u32 as variable-length integer
pub fn write_varint(value: u32, writer: &mut (impl Write + ?Sized)) -> Result<usize> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut buf)?;
    writer.write_all(&buf[..len])?;
    Ok(len)
}

/// Decode variable-length integer, pulling one byte at a time
///
/// Returns the value and the bytes read, which can exceed
/// `encoded_len(value)` for padded encodings such as `[0x80, 0x00]`.
pub fn read_varint(reader: &mut (impl Read + ?Sized)) -> Result<(u32, usize)> {
    let mut value = 0u32;
    let mut buf = [0u8; 1];

    for i in 0..MAX_VARINT_LEN {
        reader.read_exact_or_truncated(&mut buf)?;
        let byte = buf[0];
        if i == MAX_VARINT_LEN - 1 && byte > 0x0F {
            return Err(CodecError::VarintOverflow);
        }
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::VarintOverflow)
}

/// Encode every value of `src` back to back, returning the bytes written
pub fn compress<T: CodecInt>(dest: &mut [u8], src: &[T]) -> Result<usize> {
    let needed: usize = src.iter().map(|v| encoded_len(v.as_())).sum();
    if dest.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }
    let mut pos = 0;
    for value in src {
        pos += encode_varint(value.as_(), &mut dest[pos..])?;
    }
    Ok(pos)
}

/// Decode `dest.len()` values, returning the bytes consumed
pub fn decompress<T: CodecInt>(dest: &mut [T], src: &[u8]) -> Result<usize> {
    let mut pos = 0;
    for slot in dest.iter_mut() {
        let (value, len) = decode_varint(&src[pos..])?;
        *slot = narrow(value)?;
        pos += len;
    }
    Ok(pos)
}
