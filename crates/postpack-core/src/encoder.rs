//! Int encoders: one posting stream, one codec.
//!
//! Writers hold a `Box<dyn IntEncoder<T>>` chosen from a [`CompressMode`] and
//! never care which codec sits behind it. Decoders are told how many values
//! to expect (`dest.len()`), as posting readers know their document
//! frequencies before touching the data.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::config::CompressMode;
use crate::error::{CodecError, Result};
use crate::group_varint;
use crate::int::{narrow, CodecInt};
use crate::io::ReadMayCopy;
use crate::pfor_delta::{self, PFOR_DELTA_BLOCK};
use crate::vbyte;

pub trait IntEncoder<T: CodecInt>: Send + Sync {
    /// Writes `src` and returns the bytes written.
    fn encode(&self, writer: &mut dyn Write, src: &[T]) -> Result<usize>;

    /// Fills `dest` from `reader` and returns the number of values read.
    fn decode(&self, dest: &mut [T], reader: &mut dyn Read) -> Result<usize>;

    fn mode(&self) -> CompressMode;
}

/// Builds the encoder for `mode`.
pub fn create_encoder<T: CodecInt>(mode: CompressMode) -> Box<dyn IntEncoder<T>> {
    match mode {
        CompressMode::NoCompress => Box::new(NoCompressIntEncoder),
        CompressMode::Vbyte => Box::new(VByteIntEncoder),
        CompressMode::GroupVarint => Box::new(GroupVarintIntEncoder),
        CompressMode::PforDelta => Box::new(PForDeltaIntEncoder),
    }
}

/// Fixed-width little-endian values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompressIntEncoder;

impl<T: CodecInt> IntEncoder<T> for NoCompressIntEncoder {
    fn encode(&self, writer: &mut dyn Write, src: &[T]) -> Result<usize> {
        let width = (T::BITS / 8) as usize;
        let mut buf = Vec::with_capacity(src.len() * width);
        for value in src {
            buf.write_uint::<LittleEndian>(value.as_() as u64, width)?;
        }
        writer.write_all(&buf)?;
        Ok(buf.len())
    }

    fn decode(&self, dest: &mut [T], reader: &mut dyn Read) -> Result<usize> {
        let width = (T::BITS / 8) as usize;
        let mut buf = vec![0u8; dest.len() * width];
        reader.read_exact_or_truncated(&mut buf)?;
        for (slot, bytes) in dest.iter_mut().zip(buf.chunks_exact(width)) {
            *slot = narrow(LittleEndian::read_uint(bytes, width) as u32)?;
        }
        Ok(dest.len())
    }

    fn mode(&self) -> CompressMode {
        CompressMode::NoCompress
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VByteIntEncoder;

impl<T: CodecInt> IntEncoder<T> for VByteIntEncoder {
    fn encode(&self, writer: &mut dyn Write, src: &[T]) -> Result<usize> {
        let mut buf = vec![0u8; src.len() * vbyte::MAX_VARINT_LEN];
        let len = vbyte::compress(&mut buf, src)?;
        writer.write_all(&buf[..len])?;
        Ok(len)
    }

    fn decode(&self, dest: &mut [T], reader: &mut dyn Read) -> Result<usize> {
        for slot in dest.iter_mut() {
            let (value, _) = vbyte::read_varint(reader)?;
            *slot = narrow(value)?;
        }
        Ok(dest.len())
    }

    fn mode(&self) -> CompressMode {
        CompressMode::Vbyte
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupVarintIntEncoder;

impl<T: CodecInt> IntEncoder<T> for GroupVarintIntEncoder {
    fn encode(&self, writer: &mut dyn Write, src: &[T]) -> Result<usize> {
        let mut buf = vec![0u8; group_varint::compressed_len(src)];
        let len = group_varint::compress(&mut buf, src)?;
        writer.write_all(&buf[..len])?;
        Ok(len)
    }

    fn decode(&self, dest: &mut [T], reader: &mut dyn Read) -> Result<usize> {
        // Chunks are multiples of the group size, so only the last one has a tail.
        let mut values = [0u32; PFOR_DELTA_BLOCK];
        for chunk in dest.chunks_mut(PFOR_DELTA_BLOCK) {
            let values = &mut values[..chunk.len()];
            group_varint::read_from(reader, values)?;
            for (slot, &value) in chunk.iter_mut().zip(values.iter()) {
                *slot = narrow(value)?;
            }
        }
        Ok(dest.len())
    }

    fn mode(&self) -> CompressMode {
        CompressMode::GroupVarint
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PForDeltaIntEncoder;

impl<T: CodecInt> IntEncoder<T> for PForDeltaIntEncoder {
    fn encode(&self, writer: &mut dyn Write, src: &[T]) -> Result<usize> {
        pfor_delta::compress_to(writer, src)
    }

    fn decode(&self, dest: &mut [T], reader: &mut dyn Read) -> Result<usize> {
        let got = pfor_delta::decompress_from(dest, reader)?;
        if got < dest.len() {
            log::warn!("pfor stream held {} of {} expected values", got, dest.len());
            return Err(CodecError::Truncated {
                needed: dest.len(),
                available: got,
            });
        }
        Ok(got)
    }

    fn mode(&self) -> CompressMode {
        CompressMode::PforDelta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODES: [CompressMode; 4] = [
        CompressMode::NoCompress,
        CompressMode::Vbyte,
        CompressMode::GroupVarint,
        CompressMode::PforDelta,
    ];

    fn roundtrip<T: CodecInt>(mode: CompressMode, src: &[T]) -> usize {
        let encoder = create_encoder::<T>(mode);
        assert_eq!(encoder.mode(), mode);

        let mut buf = Vec::new();
        let written = encoder.encode(&mut buf, src).unwrap();
        assert_eq!(written, buf.len());

        let mut out = vec![T::zero(); src.len()];
        let mut reader = buf.as_slice();
        assert_eq!(encoder.decode(&mut out, &mut reader).unwrap(), src.len());
        assert!(reader.is_empty(), "{mode:?} left {} bytes", reader.len());
        assert_eq!(out, src);
        written
    }

    #[test]
    fn test_every_mode_roundtrips() {
        let src32: Vec<u32> = (0..517u32)
            .map(|i| i.wrapping_mul(2_246_822_519) >> (i % 29))
            .collect();
        let src16: Vec<u16> = (0..300u16).map(|i| i.wrapping_mul(40503)).collect();
        let src8: Vec<u8> = (0..133u8).map(|i| i.wrapping_mul(151)).collect();
        for mode in ALL_MODES {
            roundtrip(mode, &src32);
            roundtrip(mode, &src16);
            roundtrip(mode, &src8);
            roundtrip::<u32>(mode, &[]);
        }
    }

    #[test]
    fn test_small_values_compress() {
        let src: Vec<u32> = (0..1024).map(|i| i % 7).collect();
        let raw = roundtrip(CompressMode::NoCompress, &src);
        assert_eq!(raw, 4096);
        assert!(roundtrip(CompressMode::Vbyte, &src) < raw);
        assert!(roundtrip(CompressMode::GroupVarint, &src) < raw);
        assert!(roundtrip(CompressMode::PforDelta, &src) < roundtrip(CompressMode::Vbyte, &src));
    }

    #[test]
    fn test_short_stream_is_truncation() {
        for mode in ALL_MODES {
            let encoder = create_encoder::<u32>(mode);
            let mut buf = Vec::new();
            encoder.encode(&mut buf, &[1, 2, 3, 4, 5]).unwrap();
            let mut out = [0u32; 6];
            let err = encoder.decode(&mut out, &mut buf.as_slice()).unwrap_err();
            assert!(err.is_corrupt(), "{mode:?}: {err}");
        }
    }
}
