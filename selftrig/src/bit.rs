//! Bitmask tools for fixed-width words and wide uplink buses

use awint::awi::{bw, Awi, InlAwi};
use bit_iter::BitIter;
use num_traits::{FromPrimitive, PrimInt, Unsigned};
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign};
use std::str::FromStr;
use thiserror::Error;

/// Widest channel word the model handles; words are carried in a `u64`.
pub const MAX_WORD_WIDTH: u32 = 64;

/// All-ones mask covering the low `width` bits
#[inline]
pub fn mask(width: u32) -> u64 {
    if width >= MAX_WORD_WIDTH {
        return u64::MAX;
    }
    return (1u64 << width) - 1;
}

/// Keep only the low `n` bits of `x`
#[inline]
pub fn low_bits(x: u64, n: u32) -> u64 {
    return x & mask(n);
}

/// Number of bits needed to address every position of a power-of-two width
#[inline]
pub fn index_bits(width: u32) -> u32 {
    return width.trailing_zeros();
}

/// Returns the positions of all set bits in a word, lowest first
pub fn word_to_positions(w: u64) -> Vec<u32> {
    let mut ps = Vec::new();
    for b in BitIter::from(w) {
        ps.push(b as u32);
    }
    return ps;
}

/// Bitwise set/clear/toggle/check/change operations for unsigned integers
pub trait BitOps:
    PrimInt
    + BitAndAssign
    + BitOrAssign
    + BitXorAssign
    + FromPrimitive
    + Unsigned
{
    fn set(&mut self, b: usize);
    fn clear(&mut self, b: usize);
    fn toggle(&mut self, b: usize);
    fn change(&mut self, b: usize, x: bool);
    fn check(self, b: usize) -> bool;
}

macro_rules! impl_bit_ops {
    ($($t:ty),*) => {$(
        impl BitOps for $t {
            #[inline]
            fn set(&mut self, b: usize) {
                *self |= 1 << b;
            }

            #[inline]
            fn clear(&mut self, b: usize) {
                *self &= !(1 << b);
            }

            #[inline]
            fn toggle(&mut self, b: usize) {
                *self ^= 1 << b;
            }

            #[inline]
            fn change(&mut self, b: usize, x: bool) {
                *self = (*self & !(1 << b)) | ((x as $t) << b);
            }

            #[inline]
            fn check(self, b: usize) -> bool {
                return self >> b & 1 == 1;
            }
        }
    )*};
}

impl_bit_ops!(u8, u16, u32, u64, u128);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseBusError {
    #[error("empty bus literal")]
    Empty,
    #[error("invalid hex digit '{0}'")]
    Digit(char),
    #[error("value does not fit in {0} bits")]
    Overflow(usize),
}

/// A wide bit vector, e.g. the whole uplink, backed by an [`Awi`].
///
/// Channel words are packed contiguously, word `i` of width `w` occupying
/// bits `[i*w, (i+1)*w)`. Bits past the width read as 0 and ignore writes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Bus(Awi);

impl Bus {
    /// `width` must be non-zero
    pub fn zeros(width: usize) -> Self {
        Bus(Awi::zero(bw(width)))
    }

    pub fn ones(width: usize) -> Self {
        Bus(Awi::umax(bw(width)))
    }

    /// Parse an MSB-first hex literal (optional `0x`, `_` separators allowed)
    pub fn from_hex(width: usize, s: &str) -> Result<Self, ParseBusError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s)
            .chars()
            .filter(|&c| c != '_')
            .collect::<String>();
        if digits.is_empty() {
            return Err(ParseBusError::Empty);
        }
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseBusError::Digit(c));
        }
        let w = NonZeroUsize::new(width).ok_or(ParseBusError::Overflow(width))?;
        Awi::from_str_radix(None, &digits, 16, w)
            .map(Bus)
            .map_err(|_| ParseBusError::Overflow(width))
    }

    pub fn width(&self) -> usize {
        self.0.bw()
    }

    #[inline]
    pub fn check(&self, b: usize) -> bool {
        self.0.get(b).unwrap_or(false)
    }

    #[inline]
    pub fn set(&mut self, b: usize) {
        self.change(b, true);
    }

    #[inline]
    pub fn clear(&mut self, b: usize) {
        self.change(b, false);
    }

    #[inline]
    pub fn change(&mut self, b: usize, x: bool) {
        let _ = self.0.set(b, x);
    }

    /// Extract word `index` of a `width`-bit partition; 0 if it lies past
    /// the end of the bus
    pub fn word(&self, index: usize, width: u32) -> u64 {
        let w = (width.min(MAX_WORD_WIDTH)) as usize;
        let mut word = InlAwi::from_u64(0);
        match word.field_from(&self.0, index * w, w) {
            Some(()) => word.to_u64(),
            None => 0,
        }
    }

    /// Overwrite word `index` of a `width`-bit partition
    pub fn set_word(&mut self, index: usize, width: u32, value: u64) {
        let w = (width.min(MAX_WORD_WIDTH)) as usize;
        let value = InlAwi::from_u64(value);
        let _ = self.0.field_to(index * w, &value, w);
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn count_ones(&self) -> usize {
        self.0.count_ones()
    }
}

impl fmt::Display for Bus {
    /// MSB-first hex, zero padded to the full width
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = (self.width() + 3) / 4;
        let s = Awi::bits_to_string_radix(&self.0, false, 16, false, digits)
            .map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl fmt::LowerHex for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        fmt::Display::fmt(self, f)
    }
}

/// Parses with the width implied by the number of digits
impl FromStr for Bus {
    type Err = ParseBusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let digits = t
            .strip_prefix("0x")
            .or_else(|| t.strip_prefix("0X"))
            .unwrap_or(t)
            .chars()
            .filter(|&c| c != '_')
            .count();
        Bus::from_hex(digits * 4, t)
    }
}
