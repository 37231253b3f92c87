//! Single-block encode and decode.

use byteorder::{ByteOrder, LittleEndian};

use super::{BlockHeader, MAX_BLOCK_LEN, NO_EXCEPTION, PFOR_DELTA_BLOCK};
use crate::bitpack::{self, high_bit_idx, low_mask, packed_words};
use crate::error::{CodecError, Result};
use crate::group_varint;
use crate::int::{narrow, CodecInt};

/// An out-of-range value and the slot it came from.
#[derive(Debug, Clone, Copy, Default)]
struct Exception {
    index: usize,
    value: u32,
}

/// Smallest bit width covering roughly 90% of `src`.
///
/// The threshold is `trunc(len * 0.9 + 0.9)` values; it is part of the wire
/// format (it decides every block's width), so it must not change.
pub fn max_bit_num(src: &[u32]) -> u32 {
    let mut histogram = [0usize; 33];
    for &value in src {
        histogram[high_bit_idx(value) as usize] += 1;
    }

    let threshold = (src.len() as f64 * 0.9 + 0.9) as usize;
    let mut covered = 0;
    for (width, &count) in histogram.iter().enumerate().skip(1) {
        covered += count;
        if covered >= threshold {
            return width as u32;
        }
    }
    32
}

/// A block with its width, gap chain and exception values worked out,
/// ready to be written.
struct BlockPlan {
    header: BlockHeader,
    base_width: u32,
    work: [u32; PFOR_DELTA_BLOCK],
    values: [u32; PFOR_DELTA_BLOCK],
    payload_len: usize,
    total: usize,
}

impl BlockPlan {
    fn new<T: CodecInt>(src: &[T]) -> Result<Self> {
        let n = src.len();
        if n > PFOR_DELTA_BLOCK {
            return Err(CodecError::BlockTooLarge {
                len: n,
                max: PFOR_DELTA_BLOCK,
            });
        }

        let mut work = [0u32; PFOR_DELTA_BLOCK];
        for (slot, value) in work.iter_mut().zip(src) {
            *slot = value.as_();
        }

        let base_width = max_bit_num(&work[..n]);
        let max_num = low_mask(base_width);

        let mut exceptions = [Exception::default(); PFOR_DELTA_BLOCK];
        let mut num_exceptions = 0;
        for (index, &value) in work[..n].iter().enumerate() {
            if value > max_num {
                exceptions[num_exceptions] = Exception { index, value };
                num_exceptions += 1;
            }
        }
        let exceptions = &exceptions[..num_exceptions];

        // Exception slots carry the gap to the next one; the last carries 0.
        let mut max_gap = 0u32;
        for pair in exceptions.windows(2) {
            let gap = (pair[1].index - pair[0].index) as u32;
            work[pair[0].index] = gap;
            max_gap = max_gap.max(gap);
        }
        if let Some(last) = exceptions.last() {
            work[last.index] = 0;
        }
        let bit_width = high_bit_idx(max_gap.max(max_num));

        let mut values = [0u32; PFOR_DELTA_BLOCK];
        for (slot, exception) in values.iter_mut().zip(exceptions) {
            *slot = exception.value;
        }

        let payload_len = packed_words(n, bit_width) * 4;
        let total = BlockHeader::SIZE
            + payload_len
            + group_varint::compressed_len(&values[..num_exceptions]);
        debug_assert!(total <= MAX_BLOCK_LEN);

        Ok(Self {
            header: BlockHeader {
                num_ints: n as u8,
                bit_width: bit_width as u8,
                num_exceptions: num_exceptions as u8,
                first_exception: exceptions.first().map_or(NO_EXCEPTION, |e| e.index as u8),
            },
            base_width,
            work,
            values,
            payload_len,
            total,
        })
    }

    fn write(&self, dest: &mut [u8]) -> Result<usize> {
        if dest.len() < self.total {
            return Err(CodecError::BufferTooSmall {
                needed: self.total,
                available: dest.len(),
            });
        }

        let header = &self.header;
        let n = header.num_ints as usize;
        let bit_width = header.bit_width as u32;
        dest[..BlockHeader::SIZE].copy_from_slice(&header.to_bytes());

        let payload_end = BlockHeader::SIZE + self.payload_len;
        let mut words = [0u32; PFOR_DELTA_BLOCK];
        let words = &mut words[..self.payload_len / 4];
        bitpack::pack(words, &self.work[..n], bit_width);
        LittleEndian::write_u32_into(words, &mut dest[BlockHeader::SIZE..payload_end]);
        group_varint::compress(
            &mut dest[payload_end..self.total],
            &self.values[..header.num_exceptions as usize],
        )?;

        log::trace!(
            "pfor block: {} ints, width {} (base {}), {} exceptions, {} bytes",
            n,
            bit_width,
            self.base_width,
            header.num_exceptions,
            self.total
        );
        Ok(self.total)
    }
}

/// Exact encoded size of one block, without writing it.
pub fn encoded_block_len<T: CodecInt>(src: &[T]) -> Result<usize> {
    Ok(BlockPlan::new(src)?.total)
}

/// Encodes one block of at most [`PFOR_DELTA_BLOCK`] values into `dest`.
///
/// Returns the bytes written. The full size is computed before anything is
/// written, so `BufferTooSmall` leaves `dest` untouched.
pub fn encode_block<T: CodecInt>(dest: &mut [u8], src: &[T]) -> Result<usize> {
    BlockPlan::new(src)?.write(dest)
}

/// Decodes the block described by `header` from `body` (the bytes after the header).
///
/// Returns `(ints_decoded, block_len)` where `block_len` counts the header too.
pub fn decompress_block_internal<T: CodecInt>(
    dest: &mut [T],
    header: BlockHeader,
    body: &[u8],
) -> Result<(usize, usize)> {
    header.validate(dest.len())?;

    let payload_len = header.payload_len();
    let payload = body.get(..payload_len).ok_or(CodecError::Truncated {
        needed: payload_len,
        available: body.len(),
    })?;
    let mut words = [0u32; PFOR_DELTA_BLOCK];
    let words = &mut words[..payload_len / 4];
    LittleEndian::read_u32_into(payload, words);

    let mut exceptions = [0u32; PFOR_DELTA_BLOCK];
    let exceptions = &mut exceptions[..header.num_exceptions as usize];
    let (_, side_len) = group_varint::decompress(exceptions, &body[payload_len..])?;

    let ints = finish_block(dest, &header, words, exceptions)?;
    Ok((ints, BlockHeader::SIZE + payload_len + side_len))
}

/// Unpacks `words`, patches the exception chain and narrows into `dest`.
///
/// `header` must already be validated against `dest`.
pub(super) fn finish_block<T: CodecInt>(
    dest: &mut [T],
    header: &BlockHeader,
    words: &[u32],
    exceptions: &[u32],
) -> Result<usize> {
    let n = header.num_ints as usize;
    let mut values = [0u32; PFOR_DELTA_BLOCK];
    let values = &mut values[..n];
    bitpack::unpack(values, words, header.bit_width as u32);
    patch_exceptions(values, header.first_exception as usize, exceptions)?;

    for (slot, &value) in dest.iter_mut().zip(values.iter()) {
        *slot = narrow(value)?;
    }
    Ok(n)
}

/// Walks the gap chain from `first`, replacing one slot per exception value.
///
/// The walk ends after `exceptions.len()` steps; a zero gap is not an end marker.
fn patch_exceptions(values: &mut [u32], first: usize, exceptions: &[u32]) -> Result<()> {
    let num_ints = values.len();
    let mut cur = first;
    for &exception in exceptions {
        let Some(slot) = values.get_mut(cur) else {
            log::warn!(
                "pfor exception chain left the block at {} (of {})",
                cur,
                num_ints
            );
            return Err(CodecError::ExceptionOutOfRange {
                index: cur,
                num_ints,
            });
        };
        let gap = *slot as usize;
        *slot = exception;
        cur = cur.saturating_add(gap);
    }
    Ok(())
}
