//! Element types accepted by the codecs.

use std::fmt::Debug;

use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::error::{CodecError, Result};

/// An unsigned element type the codecs can compress: `u8`, `u16` or `u32`.
///
/// Every codec works on 32-bit values internally; `as_()` widens an element
/// and [`narrow`] brings a decoded value back.
pub trait CodecInt: PrimInt + Unsigned + AsPrimitive<u32> + Debug + Send + Sync + 'static {
    /// Width of the type in bits.
    const BITS: u32;
}

macro_rules! impl_codec_int {
    ($($t:ty),*) => {
        $(
            impl CodecInt for $t {
                const BITS: u32 = <$t>::BITS;
            }
        )*
    };
}

impl_codec_int!(u8, u16, u32);

/// Converts a decoded 32-bit value into `T`, refusing to truncate.
#[inline]
pub fn narrow<T: CodecInt>(value: u32) -> Result<T> {
    num_traits::cast::<u32, T>(value).ok_or(CodecError::ValueOverflow {
        value: value as u64,
        bits: T::BITS,
    })
}
