//! PForDelta: patched frame-of-reference bit packing in 128-value blocks.
//!
//! A block on the wire is
//!
//! ```text
//! [num_ints u8][bit_width u8][num_exceptions u8][first_exception u8]
//! [payload: ceil(num_ints * bit_width / 32) little-endian u32 words]
//! [exception values, GroupVarint]
//! ```
//!
//! Values too large for the chosen width are exceptions. Their slots in the
//! payload hold the distance to the next exception slot (0 in the last one),
//! and their true values follow the payload in arrival order.

mod block;
mod stream;

pub use block::{decompress_block_internal, encode_block, encoded_block_len, max_bit_num};
pub use stream::{
    compress, compress_to, compressed_len, decompress, decompress_block, decompress_block_from,
    decompress_from, max_compressed_len,
};

use crate::bitpack::packed_words;
use crate::error::{CodecError, Result};
use crate::group_varint;

/// Values per block.
pub const PFOR_DELTA_BLOCK: usize = 128;

/// `first_exception` value of a block without exceptions.
pub const NO_EXCEPTION: u8 = 128;

/// Largest encoded block: header, 32-bit payload, every value an exception.
pub const MAX_BLOCK_LEN: usize =
    BlockHeader::SIZE + PFOR_DELTA_BLOCK * 4 + group_varint::max_compressed_len(PFOR_DELTA_BLOCK);

/// The fixed 4-byte block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub num_ints: u8,
    pub bit_width: u8,
    pub num_exceptions: u8,
    pub first_exception: u8,
}

impl BlockHeader {
    pub const SIZE: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        [
            self.num_ints,
            self.bit_width,
            self.num_exceptions,
            self.first_exception,
        ]
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            num_ints: bytes[0],
            bit_width: bytes[1],
            num_exceptions: bytes[2],
            first_exception: bytes[3],
        }
    }

    /// Parses the header at the front of `src`.
    pub fn parse(src: &[u8]) -> Result<Self> {
        match src.get(..Self::SIZE) {
            Some(&[a, b, c, d]) => Ok(Self::from_bytes([a, b, c, d])),
            _ => Err(CodecError::Truncated {
                needed: Self::SIZE,
                available: src.len(),
            }),
        }
    }

    /// Payload size in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        packed_words(self.num_ints as usize, self.bit_width as u32) * 4
    }

    /// Checks the fields are jointly consistent and fit a destination of `dest_len`.
    pub fn validate(&self, dest_len: usize) -> Result<()> {
        let num_ints = self.num_ints as usize;
        if num_ints > PFOR_DELTA_BLOCK {
            return Err(corrupt(format!("num_ints {} exceeds block size", num_ints)));
        }
        if !(1..=32).contains(&self.bit_width) {
            return Err(corrupt(format!("bit width {} out of range", self.bit_width)));
        }
        if self.num_exceptions > self.num_ints {
            return Err(corrupt(format!(
                "{} exceptions in a block of {}",
                self.num_exceptions, self.num_ints
            )));
        }
        if self.first_exception > self.num_ints && self.first_exception != NO_EXCEPTION {
            return Err(corrupt(format!(
                "first exception {} past block of {}",
                self.first_exception, self.num_ints
            )));
        }
        if dest_len < num_ints {
            return Err(CodecError::BufferTooSmall {
                needed: num_ints,
                available: dest_len,
            });
        }
        Ok(())
    }
}

fn corrupt(msg: String) -> CodecError {
    log::warn!("rejecting pfor block: {}", msg);
    CodecError::CorruptHeader(msg)
}
