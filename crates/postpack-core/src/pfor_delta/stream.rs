//! Multi-block driver over slices and byte streams.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};

use super::block::{decompress_block_internal, encode_block, encoded_block_len, finish_block};
use super::{BlockHeader, MAX_BLOCK_LEN, PFOR_DELTA_BLOCK};
use crate::error::{CodecError, Result};
use crate::group_varint;
use crate::int::CodecInt;
use crate::io::ReadMayCopy;

/// Upper bound on the compressed size of `n` values.
pub const fn max_compressed_len(n: usize) -> usize {
    let rest = n % PFOR_DELTA_BLOCK;
    let mut len = (n / PFOR_DELTA_BLOCK) * MAX_BLOCK_LEN;
    if rest > 0 {
        len += BlockHeader::SIZE + rest * 4 + group_varint::max_compressed_len(rest);
    }
    len
}

/// Exact compressed size of `src`.
pub fn compressed_len<T: CodecInt>(src: &[T]) -> Result<usize> {
    src.chunks(PFOR_DELTA_BLOCK).map(encoded_block_len::<T>).sum()
}

/// Compresses `src` as consecutive blocks, returning the bytes written.
///
/// `dest` is checked against the whole output first; on `BufferTooSmall`
/// nothing has been written.
pub fn compress<T: CodecInt>(dest: &mut [u8], src: &[T]) -> Result<usize> {
    if dest.len() < max_compressed_len(src.len()) {
        let needed = compressed_len(src)?;
        if dest.len() < needed {
            return Err(CodecError::BufferTooSmall {
                needed,
                available: dest.len(),
            });
        }
    }
    let mut written = 0;
    for block in src.chunks(PFOR_DELTA_BLOCK) {
        written += encode_block(&mut dest[written..], block)?;
    }
    Ok(written)
}

/// Decodes every block in `src`, returning the ints written to `dest`.
pub fn decompress<T: CodecInt>(dest: &mut [T], src: &[u8]) -> Result<usize> {
    let mut written = 0;
    let mut pos = 0;
    while pos < src.len() {
        let (ints, len) = decompress_block(&mut dest[written..], &src[pos..])?;
        written += ints;
        pos += len;
    }
    Ok(written)
}

/// Decodes the block at the front of `src`.
///
/// Returns `(ints_written, block_len)`.
pub fn decompress_block<T: CodecInt>(dest: &mut [T], src: &[u8]) -> Result<(usize, usize)> {
    let header = BlockHeader::parse(src)?;
    decompress_block_internal(dest, header, &src[BlockHeader::SIZE..])
}

/// Compresses `src` block by block into `writer`, returning the bytes written.
pub fn compress_to<T: CodecInt, W: Write + ?Sized>(writer: &mut W, src: &[T]) -> Result<usize> {
    let mut buf = [0u8; MAX_BLOCK_LEN];
    let mut written = 0;
    for block in src.chunks(PFOR_DELTA_BLOCK) {
        let len = encode_block(&mut buf, block)?;
        writer.write_all(&buf[..len])?;
        written += len;
    }
    Ok(written)
}

/// Reads and decodes one block from `reader`.
///
/// Every read is sized from the header, so the reader is left exactly at the
/// next block. Returns `Ok(None)` on a clean end of stream before the header.
pub fn decompress_block_from<T: CodecInt, R: Read + ?Sized>(
    dest: &mut [T],
    reader: &mut R,
) -> Result<Option<usize>> {
    let mut head = [0u8; BlockHeader::SIZE];
    match reader.read_may_copy(&mut head)? {
        0 => return Ok(None),
        BlockHeader::SIZE => {}
        got => {
            log::warn!("pfor stream ended inside a block header");
            return Err(CodecError::Truncated {
                needed: BlockHeader::SIZE,
                available: got,
            });
        }
    }
    let header = BlockHeader::from_bytes(head);
    header.validate(dest.len())?;

    let payload_len = header.payload_len();
    let mut payload = [0u8; PFOR_DELTA_BLOCK * 4];
    let payload = &mut payload[..payload_len];
    reader.read_exact_or_truncated(payload)?;
    let mut words = [0u32; PFOR_DELTA_BLOCK];
    let words = &mut words[..payload_len / 4];
    LittleEndian::read_u32_into(payload, words);

    let mut exceptions = [0u32; PFOR_DELTA_BLOCK];
    let exceptions = &mut exceptions[..header.num_exceptions as usize];
    group_varint::read_from(reader, exceptions)?;

    finish_block(dest, &header, words, exceptions).map(Some)
}

/// Decodes blocks from `reader` until `dest` is full or the stream ends.
///
/// Returns the ints written.
pub fn decompress_from<T: CodecInt, R: Read + ?Sized>(
    dest: &mut [T],
    reader: &mut R,
) -> Result<usize> {
    let mut written = 0;
    while written < dest.len() {
        match decompress_block_from(&mut dest[written..], reader)? {
            Some(ints) => written += ints,
            None => break,
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn outlier_block() -> Vec<u32> {
        let mut block: Vec<u32> = (0..127).map(|i| i % 16).collect();
        block.push(0xffff);
        block
    }

    #[test]
    fn test_concatenated_blocks() {
        let mut src = outlier_block();
        src.extend(outlier_block());

        let mut buf = vec![0u8; max_compressed_len(src.len())];
        let len = compress(&mut buf, &src).unwrap();
        let block_len = BlockHeader::SIZE + 64 + 3;
        assert_eq!(len, 2 * block_len);

        let mut out = vec![0u32; src.len()];
        assert_eq!(decompress(&mut out, &buf[..len]).unwrap(), src.len());
        assert_eq!(out, src);

        let (ints, consumed) = decompress_block(&mut out, &buf[..len]).unwrap();
        assert_eq!((ints, consumed), (128, block_len));
    }

    #[test]
    fn test_partial_last_block() {
        let src: Vec<u32> = (0..300).map(|i| i * 37 % 1000).collect();
        let mut buf = vec![0u8; max_compressed_len(src.len())];
        let len = compress(&mut buf, &src).unwrap();
        let mut out = vec![0u32; src.len()];
        assert_eq!(decompress(&mut out, &buf[..len]).unwrap(), 300);
        assert_eq!(out, src);
    }

    #[test]
    fn test_empty_input() {
        let src: [u32; 0] = [];
        let mut buf = [0u8; 4];
        assert_eq!(compress(&mut buf, &src).unwrap(), 0);
        let mut out: [u32; 0] = [];
        assert_eq!(decompress(&mut out, &buf[..0]).unwrap(), 0);
    }

    #[test]
    fn test_destination_too_small_for_second_block() {
        let src: Vec<u32> = (0..200).collect();
        let mut buf = vec![0u8; max_compressed_len(src.len())];
        let len = compress(&mut buf, &src).unwrap();
        let mut out = vec![0u32; 150];
        assert!(decompress(&mut out, &buf[..len]).unwrap_err().is_capacity());
    }

    #[test]
    fn test_destination_too_small_writes_nothing() {
        let src: Vec<u32> = (0..200).collect();
        let full = compressed_len(&src).unwrap();
        let first_block = encoded_block_len(&src[..PFOR_DELTA_BLOCK]).unwrap();
        assert!(first_block < 130 && 130 < full);

        let mut buf = [0xEEu8; 130];
        let err = compress(&mut buf, &src).unwrap_err();
        match err {
            CodecError::BufferTooSmall { needed, available } => {
                assert_eq!((needed, available), (full, 130));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(buf.iter().all(|&b| b == 0xEE));

        let mut exact = vec![0u8; full];
        assert_eq!(compress(&mut exact, &src).unwrap(), full);
    }

    #[test]
    fn test_stream_roundtrip() {
        let src: Vec<u16> = (0..400u32).map(|i| (i * i % 9000) as u16).collect();
        let mut sink = Vec::new();
        let written = compress_to(&mut sink, &src).unwrap();
        assert_eq!(written, sink.len());

        let mut slice_buf = vec![0u8; max_compressed_len(src.len())];
        let len = compress(&mut slice_buf, &src).unwrap();
        assert_eq!(&slice_buf[..len], sink.as_slice());

        let mut reader = Cursor::new(sink.as_slice());
        let mut out = vec![0u16; src.len()];
        assert_eq!(decompress_from(&mut out, &mut reader).unwrap(), src.len());
        assert_eq!(out, src);
        assert_eq!(reader.position() as usize, sink.len());
    }

    #[test]
    fn test_stream_reads_exactly_one_block() {
        let mut sink = Vec::new();
        compress_to(&mut sink, &outlier_block()).unwrap();
        let first_len = sink.len();
        sink.extend_from_slice(&[0xDE, 0xAD]);

        let mut reader = Cursor::new(sink.as_slice());
        let mut out = vec![0u32; 128];
        assert_eq!(decompress_block_from(&mut out, &mut reader).unwrap(), Some(128));
        assert_eq!(reader.position() as usize, first_len);
        assert_eq!(out, outlier_block());
    }

    #[test]
    fn test_stream_clean_eof() {
        let mut reader: &[u8] = &[];
        let mut out = [0u32; 4];
        assert_eq!(decompress_block_from(&mut out, &mut reader).unwrap(), None);
        assert_eq!(decompress_from(&mut out, &mut reader).unwrap(), 0);
    }

    #[test]
    fn test_stream_truncation() {
        let mut sink = Vec::new();
        compress_to(&mut sink, &outlier_block()).unwrap();
        for cut in [2, 10, sink.len() - 1] {
            let mut reader = &sink[..cut];
            let mut out = vec![0u32; 128];
            let err = decompress_from(&mut out, &mut reader).unwrap_err();
            assert!(
                matches!(err, CodecError::Truncated { .. }),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn test_max_compressed_len_bounds_worst_case() {
        let src: Vec<u32> = (0..129u32)
            .map(|i| if i % 9 == 0 { u32::MAX } else { i % 2 })
            .collect();
        let mut buf = vec![0u8; max_compressed_len(src.len())];
        let len = compress(&mut buf, &src).unwrap();
        assert!(len <= buf.len());
    }
}
