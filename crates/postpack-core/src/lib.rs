//! Postpack Core - integer compression for search-engine posting lists
//!
//! Two codecs turn sequences of doc ids, term frequencies and positions into
//! compact byte blocks:
//!
//! - [`group_varint`]: four values behind one selector byte, byte aligned.
//! - [`pfor_delta`]: 128-value blocks bit-packed at a width that covers most
//!   values, with outliers patched in from a GroupVarint side buffer.
//!
//! All entry points are stateless and work on caller-owned buffers, so they
//! can be called from any number of threads at once.

pub mod bitpack;
pub mod config;
pub mod encoder;
pub mod error;
pub mod group_varint;
pub mod int;
pub mod io;
pub mod pfor_delta;
pub mod postings;
pub mod vbyte;

pub use config::{CodecConfig, CompressMode};
pub use encoder::{create_encoder, IntEncoder};
pub use error::{CodecError, Result};
pub use int::CodecInt;
pub use postings::{decode_postings, encode_postings, PostingsCodec};
