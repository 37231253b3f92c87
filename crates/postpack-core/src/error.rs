//! Error type shared by every codec in the crate.

use thiserror::Error;

/// Errors raised while compressing or decompressing integer sequences.
///
/// Two classes matter to callers: capacity errors (the destination was too
/// small, nothing was written) and corrupt-stream errors (the input cannot be
/// trusted past this point). See [`CodecError::is_capacity`] and
/// [`CodecError::is_corrupt`].
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("destination too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("truncated input: need {needed}, only {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("corrupt block header: {0}")]
    CorruptHeader(String),

    #[error("exception chain index {index} out of range for a block of {num_ints} ints")]
    ExceptionOutOfRange { index: usize, num_ints: usize },

    #[error("varint overflows 32 bits")]
    VarintOverflow,

    #[error("decoded value {value} does not fit in a {bits}-bit integer")]
    ValueOverflow { value: u64, bits: u32 },

    #[error("block of {len} values exceeds the {max}-value block size")]
    BlockTooLarge { len: usize, max: usize },

    #[error("doc ids must be non-decreasing (violated at index {index})")]
    NotAscending { index: usize },

    #[error("invalid codec configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// True for errors meaning the encoded input is damaged.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            CodecError::Truncated { .. }
                | CodecError::CorruptHeader(_)
                | CodecError::ExceptionOutOfRange { .. }
                | CodecError::VarintOverflow
                | CodecError::ValueOverflow { .. }
        )
    }

    /// True when the caller only needs a larger destination buffer.
    pub fn is_capacity(&self) -> bool {
        matches!(self, CodecError::BufferTooSmall { .. })
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let capacity = CodecError::BufferTooSmall { needed: 8, available: 4 };
        assert!(capacity.is_capacity());
        assert!(!capacity.is_corrupt());

        let corrupt = CodecError::ExceptionOutOfRange { index: 12, num_ints: 10 };
        assert!(corrupt.is_corrupt());
        assert!(!corrupt.is_capacity());
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::Truncated { needed: 12, available: 3 };
        assert_eq!(
            err.to_string(),
            "truncated input: need 12, only 3 available"
        );
    }
}
