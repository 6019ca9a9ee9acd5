//! Bit interleaver for FEC payload blocks
//!
//! Logical bit `i` of an `n`-byte block is stored at physical bit
//! `(i * stride) mod 8n`, with bits numbered LSB first inside each byte.
//! Adjacent logical bits end up far apart on air, so a burst of channel
//! errors is spread over many code words.
//!
//! Both directions must use the same [`BlockLength`]; reading a block with a
//! different length than it was written with yields garbage.

/// Block lengths are multiples of this many bytes
pub const LENGTH_STEP: usize = 3;

/// Largest supported block length in bytes
pub const MAX_BLOCK_LEN: usize = 255;

/// Permutation stride per length class, indexed by `n / 3`
///
/// Every entry is coprime with `8n`, so the permutation is a bijection.
/// Among those, each is the smallest stride maximising the minimum of
/// `|i - j| + |p(i) - p(j)|` over all pairs of bits.
pub const STRIDES: [u16; MAX_BLOCK_LEN / LENGTH_STEP + 1] = [
    0, 5, 7, 11, 11, 11, 17, 31, 29, 17, 19, 23,
    23, 23, 23, 23, 23, 23, 77, 43, 29, 79, 125, 41,
    31, 107, 109, 35, 107, 67, 37, 59, 61, 35, 53, 41,
    103, 103, 55, 149, 293, 53, 41, 53, 43, 187, 47, 97,
    47, 95, 47, 97, 47, 59, 47, 71, 47, 61, 47, 245,
    437, 317, 307, 53, 199, 137, 103, 103, 157, 65, 59, 109,
    137, 227, 491, 59, 269, 299, 301, 229, 59, 133, 77, 107,
    131, 59,
];

/// Payload length accepted by the interleaver
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockLength(u8);

impl BlockLength {
    /// Validate a length; must be a multiple of 3 no larger than 255
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(bytes: usize) -> Option<Self> {
        if bytes % LENGTH_STEP != 0 || bytes > MAX_BLOCK_LEN {
            return None;
        }
        Some(Self(bytes as u8))
    }

    /// Length in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.0 as usize
    }

    /// Length in bits
    #[must_use]
    pub const fn bits(self) -> usize {
        self.bytes() * 8
    }

    /// Stride used for this length
    #[must_use]
    pub const fn stride(self) -> u16 {
        STRIDES[self.bytes() / LENGTH_STEP]
    }

    /// Physical bit index holding logical bit `bit`
    #[must_use]
    pub const fn permute(self, bit: usize) -> usize {
        let bits = self.bits();
        if bits == 0 {
            return bit;
        }
        (bit * self.stride() as usize) % bits
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BlockLength {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}B", self.0);
    }
}

/// Stride for a block length
#[must_use]
pub const fn stride(len: BlockLength) -> u16 {
    len.stride()
}

/// Read logical bit `bit` of an interleaved block
///
/// # Panics
///
/// If `buf` is shorter than `len` or `bit` is outside the block.
#[must_use]
pub fn get_bit(len: BlockLength, buf: &[u8], bit: usize) -> bool {
    debug_assert!(bit < len.bits());
    let p = len.permute(bit);
    buf[p >> 3] & (1 << (p & 7)) != 0
}

/// Write logical bit `bit` of an interleaved block
///
/// # Panics
///
/// If `buf` is shorter than `len` or `bit` is outside the block.
pub fn set_bit(len: BlockLength, buf: &mut [u8], bit: usize, value: bool) {
    debug_assert!(bit < len.bits());
    let p = len.permute(bit);
    let mask = 1 << (p & 7);
    if value {
        buf[p >> 3] |= mask;
    } else {
        buf[p >> 3] &= !mask;
    }
}

/// Read logical byte `index` of an interleaved block
#[must_use]
pub fn get_byte(len: BlockLength, buf: &[u8], index: usize) -> u8 {
    (0..8).fold(0u8, |acc, i| {
        acc | (u8::from(get_bit(len, buf, index * 8 + i)) << i)
    })
}

/// Write logical byte `index` of an interleaved block
pub fn set_byte(len: BlockLength, buf: &mut [u8], index: usize, value: u8) {
    for i in 0..8 {
        set_bit(len, buf, index * 8 + i, (value >> i) & 1 != 0);
    }
}

/// Scatter `src` into `dst`
///
/// Only the first `len` bytes of each slice are touched.
pub fn interleave(len: BlockLength, src: &[u8], dst: &mut [u8]) {
    for (index, &byte) in src[..len.bytes()].iter().enumerate() {
        set_byte(len, dst, index, byte);
    }
}

/// Gather an interleaved `src` back into logical order in `dst`
pub fn deinterleave(len: BlockLength, src: &[u8], dst: &mut [u8]) {
    for (index, slot) in dst[..len.bytes()].iter_mut().enumerate() {
        *slot = get_byte(len, src, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_lengths() {
        assert!(BlockLength::new(4).is_none());
        assert!(BlockLength::new(258).is_none());
        assert_eq!(BlockLength::new(255).map(BlockLength::bits), Some(2040));
    }

    #[test]
    fn first_bit_stays_put() {
        let len = BlockLength::new(9).unwrap();
        let mut buf = [0u8; 9];
        set_bit(len, &mut buf, 0, true);
        assert_eq!(buf[0], 1);
    }
}
