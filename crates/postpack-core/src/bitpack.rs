//! Fixed-width bit packing into little-endian 32-bit words.
//!
//! Fields are laid out LSB-first: field `i` starts at bit `i * bit_width` of
//! the word stream, and a field crossing a word boundary keeps its low bits in
//! the current word and its high bits at the bottom of the next one.
//!
//! Runs whose length is a multiple of [`FIXED_RUN`] go through a width-specialised
//! kernel (one monomorphised copy per width, selected by `match`); everything
//! else uses the generic loop. Both produce identical words.

/// Lengths divisible by this take the width-specialised path.
pub const FIXED_RUN: usize = 64;

/// Values per fixed kernel iteration; 32 fields of `W` bits fill exactly `W` words.
const LANE: usize = 32;

/// Minimum number of bits able to represent `value`; zero still takes one bit.
#[inline]
pub const fn high_bit_idx(value: u32) -> u32 {
    if value == 0 {
        1
    } else {
        32 - value.leading_zeros()
    }
}

/// Mask covering the low `bit_width` bits.
#[inline]
pub const fn low_mask(bit_width: u32) -> u32 {
    if bit_width >= 32 {
        u32::MAX
    } else {
        (1u32 << bit_width) - 1
    }
}

/// Number of 32-bit words holding `n` fields of `bit_width` bits.
#[inline]
pub const fn packed_words(n: usize, bit_width: u32) -> usize {
    (n * bit_width as usize + 31) / 32
}

/// Dispatches `$func::<W>(args)` for `W = $bw`, falling back to `$generic`.
macro_rules! dispatch_width {
    ($bw:expr, $func:ident, $generic:ident, $($arg:expr),+) => {
        match $bw {
            1 => $func::<1>($($arg),+),
            2 => $func::<2>($($arg),+),
            3 => $func::<3>($($arg),+),
            4 => $func::<4>($($arg),+),
            5 => $func::<5>($($arg),+),
            6 => $func::<6>($($arg),+),
            7 => $func::<7>($($arg),+),
            8 => $func::<8>($($arg),+),
            9 => $func::<9>($($arg),+),
            10 => $func::<10>($($arg),+),
            11 => $func::<11>($($arg),+),
            12 => $func::<12>($($arg),+),
            13 => $func::<13>($($arg),+),
            14 => $func::<14>($($arg),+),
            15 => $func::<15>($($arg),+),
            16 => $func::<16>($($arg),+),
            17 => $func::<17>($($arg),+),
            18 => $func::<18>($($arg),+),
            19 => $func::<19>($($arg),+),
            20 => $func::<20>($($arg),+),
            21 => $func::<21>($($arg),+),
            22 => $func::<22>($($arg),+),
            23 => $func::<23>($($arg),+),
            24 => $func::<24>($($arg),+),
            25 => $func::<25>($($arg),+),
            26 => $func::<26>($($arg),+),
            27 => $func::<27>($($arg),+),
            28 => $func::<28>($($arg),+),
            29 => $func::<29>($($arg),+),
            30 => $func::<30>($($arg),+),
            31 => $func::<31>($($arg),+),
            32 => $func::<32>($($arg),+),
            _ => $generic($($arg),+, $bw),
        }
    };
}

/// Packs every value of `src` into `dest` using `bit_width` bits each.
///
/// `dest` must hold at least `packed_words(src.len(), bit_width)` words and
/// `bit_width` must be in `1..=32`. Bits above `bit_width` are dropped.
pub fn pack(dest: &mut [u32], src: &[u32], bit_width: u32) {
    debug_assert!((1..=32).contains(&bit_width));
    let words = packed_words(src.len(), bit_width);
    let dest = &mut dest[..words];
    if src.len() % FIXED_RUN == 0 {
        dispatch_width!(bit_width, pack_fixed, internal_pack, dest, src)
    } else {
        internal_pack(dest, src, bit_width)
    }
}

/// Unpacks `dest.len()` fields of `bit_width` bits from `src`. Inverse of [`pack`].
pub fn unpack(dest: &mut [u32], src: &[u32], bit_width: u32) {
    debug_assert!((1..=32).contains(&bit_width));
    let src = &src[..packed_words(dest.len(), bit_width)];
    if dest.len() % FIXED_RUN == 0 {
        dispatch_width!(bit_width, unpack_fixed, internal_unpack, dest, src)
    } else {
        internal_unpack(dest, src, bit_width)
    }
}

/// Generic packing loop for arbitrary lengths.
pub fn internal_pack(dest: &mut [u32], src: &[u32], bit_width: u32) {
    let mask = low_mask(bit_width);
    dest[..packed_words(src.len(), bit_width)].fill(0);

    let mut bit = 0usize;
    for &value in src {
        let value = value & mask;
        let word = bit >> 5;
        let shift = (bit & 31) as u32;
        dest[word] |= value << shift;
        if shift + bit_width > 32 {
            dest[word + 1] |= value >> (32 - shift);
        }
        bit += bit_width as usize;
    }
}

/// Generic unpacking loop for arbitrary lengths.
pub fn internal_unpack(dest: &mut [u32], src: &[u32], bit_width: u32) {
    let mask = low_mask(bit_width);

    let mut bit = 0usize;
    for slot in dest.iter_mut() {
        let word = bit >> 5;
        let shift = (bit & 31) as u32;
        let mut value = src[word] >> shift;
        if shift + bit_width > 32 {
            value |= src[word + 1] << (32 - shift);
        }
        *slot = value & mask;
        bit += bit_width as usize;
    }
}

#[inline(always)]
fn pack_fixed<const W: u32>(dest: &mut [u32], src: &[u32]) {
    let mask = low_mask(W);
    for (out, lane) in dest
        .chunks_exact_mut(W as usize)
        .zip(src.chunks_exact(LANE))
    {
        let mut word = 0usize;
        let mut acc = 0u32;
        let mut filled = 0u32;
        for &value in lane {
            let value = value & mask;
            acc |= value << filled;
            filled += W;
            if filled >= 32 {
                out[word] = acc;
                word += 1;
                filled -= 32;
                acc = if filled > 0 { value >> (W - filled) } else { 0 };
            }
        }
    }
}

#[inline(always)]
fn unpack_fixed<const W: u32>(dest: &mut [u32], src: &[u32]) {
    let mask = low_mask(W);
    for (out, words) in dest
        .chunks_exact_mut(LANE)
        .zip(src.chunks_exact(W as usize))
    {
        let mut bit = 0u32;
        for slot in out.iter_mut() {
            let word = (bit >> 5) as usize;
            let shift = bit & 31;
            let mut value = words[word] >> shift;
            if shift + W > 32 {
                value |= words[word + 1] << (32 - shift);
            }
            *slot = value & mask;
            bit += W;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize, bit_width: u32) -> Vec<u32> {
        let mask = low_mask(bit_width);
        (0..n as u32)
            .map(|i| i.wrapping_mul(2_654_435_761).rotate_left(i % 32) & mask)
            .collect()
    }

    #[test]
    fn test_high_bit_idx() {
        assert_eq!(high_bit_idx(0), 1);
        assert_eq!(high_bit_idx(1), 1);
        assert_eq!(high_bit_idx(2), 2);
        assert_eq!(high_bit_idx(3), 2);
        assert_eq!(high_bit_idx(255), 8);
        assert_eq!(high_bit_idx(256), 9);
        assert_eq!(high_bit_idx(0xFFFF), 16);
        assert_eq!(high_bit_idx(u32::MAX), 32);
    }

    #[test]
    fn test_packed_words() {
        assert_eq!(packed_words(10, 4), 2);
        assert_eq!(packed_words(128, 7), 28);
        assert_eq!(packed_words(128, 32), 128);
        assert_eq!(packed_words(0, 5), 0);
    }

    #[test]
    fn test_fixed_kernels_match_generic_loop() {
        for bit_width in 1..=32 {
            for n in [64usize, 128] {
                let values = sample(n, bit_width);
                let words = packed_words(n, bit_width);

                let mut fixed = vec![0u32; words];
                pack(&mut fixed, &values, bit_width);
                let mut generic = vec![0u32; words];
                internal_pack(&mut generic, &values, bit_width);
                assert_eq!(fixed, generic, "pack differs at width {bit_width}");

                let mut unpacked = vec![0u32; n];
                unpack(&mut unpacked, &fixed, bit_width);
                assert_eq!(unpacked, values, "unpack differs at width {bit_width}");
            }
        }
    }

    #[test]
    fn test_generic_roundtrip_odd_lengths() {
        for bit_width in [1, 3, 7, 13, 31, 32] {
            for n in [1usize, 10, 33, 127] {
                let values = sample(n, bit_width);
                let mut words = vec![0u32; packed_words(n, bit_width)];
                pack(&mut words, &values, bit_width);
                let mut out = vec![0u32; n];
                unpack(&mut out, &words, bit_width);
                assert_eq!(out, values);
            }
        }
    }

    #[test]
    fn test_lsb_first_layout() {
        let values: Vec<u32> = (1..=9).chain([0]).collect();
        let mut words = [0u32; 2];
        pack(&mut words, &values, 4);
        assert_eq!(words, [0x8765_4321, 0x0000_0009]);
    }

    #[test]
    fn test_straddling_field() {
        // 3 fields of 12 bits: the third spans bits 24..36.
        let values = [0xABC, 0x123, 0xFED];
        let mut words = [0u32; 2];
        pack(&mut words, &values, 12);
        assert_eq!(words[0], 0xED12_3ABC);
        assert_eq!(words[1], 0x0000_000F);

        let mut out = [0u32; 3];
        unpack(&mut out, &words, 12);
        assert_eq!(out, values);
    }

    #[test]
    fn test_pack_clears_stale_words() {
        let mut words = [u32::MAX; 2];
        pack(&mut words, &[1, 2, 3], 5);
        let mut out = [0u32; 3];
        unpack(&mut out, &words, 5);
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(words[0] >> 15, 0);
    }
}
