//! Posting list compression on top of the int encoders
//!
//! Doc ids are stored as d-gaps (difference to the previous id) so sorted
//! lists turn into small numbers before hitting the codec.

use crate::config::{CodecConfig, CompressMode};
use crate::encoder::create_encoder;
use crate::error::{CodecError, Result};

/// Replace each doc id with its distance to the previous one
fn to_gaps(doc_ids: &[u32]) -> Result<Vec<u32>> {
    let mut prev = 0u32;
    doc_ids
        .iter()
        .enumerate()
        .map(|(index, &doc_id)| {
            let delta = doc_id
                .checked_sub(prev)
                .ok_or(CodecError::NotAscending { index })?;
            prev = doc_id;
            Ok(delta)
        })
        .collect()
}

/// Prefix-sum d-gaps back into doc ids
fn from_gaps(gaps: &mut [u32]) -> Result<()> {
    let mut prev = 0u32;
    for gap in gaps.iter_mut() {
        prev = prev.checked_add(*gap).ok_or(CodecError::ValueOverflow {
            value: prev as u64 + *gap as u64,
            bits: u32::BITS,
        })?;
        *gap = prev;
    }
    Ok(())
}

/// Encode delta-compressed postings list
pub fn encode_postings(doc_ids: &[u32], mode: CompressMode) -> Result<Vec<u8>> {
    let gaps = to_gaps(doc_ids)?;
    let mut buf = Vec::new();
    create_encoder::<u32>(mode).encode(&mut buf, &gaps)?;
    Ok(buf)
}

/// Decode delta-compressed postings list of `count` doc ids
pub fn decode_postings(data: &[u8], count: usize, mode: CompressMode) -> Result<Vec<u32>> {
    let mut doc_ids = vec![0u32; count];
    let mut reader = data;
    create_encoder::<u32>(mode).decode(&mut doc_ids, &mut reader)?;
    from_gaps(&mut doc_ids)?;
    Ok(doc_ids)
}

/// Encodes the three posting streams of a term with their configured codecs.
#[derive(Debug, Clone, Default)]
pub struct PostingsCodec {
    config: CodecConfig,
}

impl PostingsCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode_doc_ids(&self, doc_ids: &[u32]) -> Result<Vec<u8>> {
        encode_postings(doc_ids, self.config.doc_id_mode)
    }

    pub fn decode_doc_ids(&self, data: &[u8], count: usize) -> Result<Vec<u32>> {
        decode_postings(data, count, self.config.doc_id_mode)
    }

    pub fn encode_term_freqs(&self, freqs: &[u32]) -> Result<Vec<u8>> {
        encode_raw(freqs, self.config.term_freq_mode)
    }

    pub fn decode_term_freqs(&self, data: &[u8], count: usize) -> Result<Vec<u32>> {
        decode_raw(data, count, self.config.term_freq_mode)
    }

    /// Positions are expected already delta-encoded within each document.
    pub fn encode_positions(&self, positions: &[u32]) -> Result<Vec<u8>> {
        encode_raw(positions, self.config.position_mode)
    }

    pub fn decode_positions(&self, data: &[u8], count: usize) -> Result<Vec<u32>> {
        decode_raw(data, count, self.config.position_mode)
    }
}

fn encode_raw(values: &[u32], mode: CompressMode) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    create_encoder::<u32>(mode).encode(&mut buf, values)?;
    Ok(buf)
}

fn decode_raw(data: &[u8], count: usize, mode: CompressMode) -> Result<Vec<u32>> {
    let mut values = vec![0u32; count];
    let mut reader = data;
    create_encoder::<u32>(mode).decode(&mut values, &mut reader)?;
    Ok(values)
}
