//! GroupVarint: four integers behind one selector byte.
//!
//! Each group is a selector followed by the four values in slot order, each
//! stored little-endian in 1 to 4 bytes. Bits `2i..2i+2` of the selector hold
//! `byte_len(value_i) - 1`. A tail of fewer than four values is written with
//! the plain VByte codec and carries no selector.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};
use crate::int::{narrow, CodecInt};
use crate::io::ReadMayCopy;
use crate::vbyte;

pub const GROUP_SIZE: usize = 4;

/// Largest encoded group: selector plus four 4-byte values.
pub const MAX_GROUP_LEN: usize = 1 + 4 * GROUP_SIZE;

/// Byte length of every slot, indexed by selector.
static SELECTOR_LENS: [[u8; GROUP_SIZE]; 256] = build_selector_lens();

/// Payload bytes following each selector.
static SELECTOR_PAYLOAD: [u8; 256] = build_selector_payload();

const fn build_selector_lens() -> [[u8; GROUP_SIZE]; 256] {
    let mut table = [[0u8; GROUP_SIZE]; 256];
    let mut selector = 0;
    while selector < 256 {
        let mut slot = 0;
        while slot < GROUP_SIZE {
            table[selector][slot] = ((selector >> (2 * slot)) & 0x3) as u8 + 1;
            slot += 1;
        }
        selector += 1;
    }
    table
}

const fn build_selector_payload() -> [u8; 256] {
    let lens = build_selector_lens();
    let mut table = [0u8; 256];
    let mut selector = 0;
    while selector < 256 {
        let l = lens[selector];
        table[selector] = l[0] + l[1] + l[2] + l[3];
        selector += 1;
    }
    table
}

/// Bytes needed to store `value` inside a group.
#[inline]
fn byte_len(value: u32) -> usize {
    if value < 1 << 8 {
        1
    } else if value < 1 << 16 {
        2
    } else if value < 1 << 24 {
        3
    } else {
        4
    }
}

/// Slot byte lengths for `selector`.
#[inline]
pub fn selector_lens(selector: u8) -> [u8; GROUP_SIZE] {
    SELECTOR_LENS[selector as usize]
}

/// Encoded size of one group, selector included.
#[inline]
pub fn item_len(values: &[u32; GROUP_SIZE]) -> usize {
    1 + values.iter().map(|&v| byte_len(v)).sum::<usize>()
}

/// Exact encoded size of `src`.
pub fn compressed_len<T: CodecInt>(src: &[T]) -> usize {
    let groups = src.chunks_exact(GROUP_SIZE);
    let tail: usize = groups
        .remainder()
        .iter()
        .map(|v| vbyte::encoded_len(v.as_()))
        .sum();
    groups
        .map(|g| 1 + g.iter().map(|v| byte_len(v.as_())).sum::<usize>())
        .sum::<usize>()
        + tail
}

/// Upper bound on the encoded size of `n` values.
#[inline]
pub const fn max_compressed_len(n: usize) -> usize {
    (n / GROUP_SIZE) * MAX_GROUP_LEN + (n % GROUP_SIZE) * vbyte::MAX_VARINT_LEN
}

/// Writes one group into `dest`, returning its length.
pub fn compress_item(dest: &mut [u8], values: &[u32; GROUP_SIZE]) -> Result<usize> {
    let needed = item_len(values);
    if dest.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let mut selector = 0u8;
    let mut pos = 1;
    for (slot, &value) in values.iter().enumerate() {
        let len = byte_len(value);
        selector |= ((len - 1) as u8) << (2 * slot);
        LittleEndian::write_uint(&mut dest[pos..pos + len], value as u64, len);
        pos += len;
    }
    dest[0] = selector;
    Ok(pos)
}

/// Reads one group from the front of `src`, returning the bytes consumed.
pub fn decompress_item(dest: &mut [u32; GROUP_SIZE], src: &[u8]) -> Result<usize> {
    let Some(&selector) = src.first() else {
        return Err(CodecError::Truncated {
            needed: 1,
            available: 0,
        });
    };
    let needed = 1 + SELECTOR_PAYLOAD[selector as usize] as usize;
    if src.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            available: src.len(),
        });
    }
    Ok(1 + decode_payload(dest, selector, &src[1..needed]))
}

/// Splits a group payload according to `selector`; `payload` must be complete.
fn decode_payload(dest: &mut [u32; GROUP_SIZE], selector: u8, payload: &[u8]) -> usize {
    let mut pos = 0;
    for (slot, &len) in dest.iter_mut().zip(selector_lens(selector).iter()) {
        let len = len as usize;
        *slot = LittleEndian::read_uint(&payload[pos..pos + len], len) as u32;
        pos += len;
    }
    pos
}

/// Compresses all of `src` into `dest`, returning the bytes written.
///
/// The required size is checked up front; on `BufferTooSmall` nothing is written.
pub fn compress<T: CodecInt>(dest: &mut [u8], src: &[T]) -> Result<usize> {
    let needed = compressed_len(src);
    if dest.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let mut pos = 0;
    let groups = src.chunks_exact(GROUP_SIZE);
    let tail = groups.remainder();
    for group in groups {
        let values = [group[0].as_(), group[1].as_(), group[2].as_(), group[3].as_()];
        pos += compress_item(&mut dest[pos..], &values)?;
    }
    for value in tail {
        pos += vbyte::encode_varint(value.as_(), &mut dest[pos..])?;
    }
    Ok(pos)
}

/// Decodes `dest.len()` values from `src`.
///
/// Returns `(ints_written, bytes_consumed)`.
pub fn decompress<T: CodecInt>(dest: &mut [T], src: &[u8]) -> Result<(usize, usize)> {
    let mut pos = 0;
    let mut values = [0u32; GROUP_SIZE];

    let mut groups = dest.chunks_exact_mut(GROUP_SIZE);
    for group in &mut groups {
        pos += decompress_item(&mut values, &src[pos..])?;
        for (slot, &value) in group.iter_mut().zip(values.iter()) {
            *slot = narrow(value)?;
        }
    }
    for slot in groups.into_remainder() {
        let (value, len) = vbyte::decode_varint(&src[pos..])?;
        *slot = narrow(value)?;
        pos += len;
    }
    Ok((dest.len(), pos))
}

/// Decodes `dest.len()` values from a byte stream without reading past them.
///
/// Each group costs two reads: the selector, then exactly the payload it names.
/// Returns the bytes consumed.
pub fn read_from<R: Read + ?Sized>(reader: &mut R, dest: &mut [u32]) -> Result<usize> {
    let mut consumed = 0;
    let mut buf = [0u8; MAX_GROUP_LEN];
    let mut values = [0u32; GROUP_SIZE];

    let mut groups = dest.chunks_exact_mut(GROUP_SIZE);
    for group in &mut groups {
        reader.read_exact_or_truncated(&mut buf[..1])?;
        let selector = buf[0];
        let payload = SELECTOR_PAYLOAD[selector as usize] as usize;
        reader.read_exact_or_truncated(&mut buf[1..1 + payload])?;
        decode_payload(&mut values, selector, &buf[1..1 + payload]);
        group.copy_from_slice(&values);
        consumed += 1 + payload;
    }
    for slot in groups.into_remainder() {
        let (value, len) = vbyte::read_varint(reader)?;
        consumed += len;
        *slot = value;
    }
    Ok(consumed)
}
