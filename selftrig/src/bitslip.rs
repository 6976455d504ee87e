//! Bit-slip realignment barrel shifter
//!
//! A serializer that starts a frame `s` bits late leaves each received word
//! split across two consecutive frames. [`BitAligner`] keeps the previous
//! frame in a register and stitches the two back together.

use crate::bit::{low_bits, mask};
use crate::cfg::{AlignerConfig, ConfigError};
use crate::sim::Clocked;

/// Closed-form realignment of the `cur`/`prev` frame pair by `slip` bits.
///
/// With `low_to_high`, the low `slip` bits of the new frame become the high
/// bits of the output and the previous frame fills the rest; otherwise the
/// two frames swap roles. A zero slip forwards the previous frame.
pub fn realign(width: u32, low_to_high: bool, cur: u64, prev: u64, slip: u32) -> u64 {
    if slip == 0 {
        return low_bits(prev, width);
    }
    let (head, tail) = if low_to_high { (cur, prev) } else { (prev, cur) };
    let hi = low_bits(head, slip) << (width - slip);
    let lo = low_bits(tail, width) >> slip;
    return (hi | lo) & mask(width);
}

/// Inputs sampled by [`BitAligner`] on each edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignerInput {
    pub data: u64,
    pub slip: u32,
}

/// Registered barrel shifter: `data_o <= realign(data_i, prev, slip)`,
/// `prev <= data_i`
#[derive(Debug, Clone)]
pub struct BitAligner {
    config: AlignerConfig,
    prev: u64,
    data_o: u64,
}

impl BitAligner {
    pub fn new(config: AlignerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(BitAligner {
            config,
            prev: 0,
            data_o: 0,
        })
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.data_width
    }

    /// One edge. The shift port is `slip_bits` wide, so higher bits of `slip`
    /// are not wired and an out-of-range amount wraps modulo the width.
    pub fn tick(&mut self, data_i: u64, slip: u32) -> u64 {
        let width = self.config.data_width;
        let slip = (low_bits(slip as u64, self.config.slip_bits) % width as u64) as u32;
        let data_i = low_bits(data_i, width);
        self.data_o = realign(width, self.config.transmit_low_to_high, data_i, self.prev, slip);
        self.prev = data_i;
        self.data_o
    }

    pub fn data_o(&self) -> u64 {
        self.data_o
    }

    /// The frame captured on the last edge
    pub fn prev(&self) -> u64 {
        self.prev
    }

    pub fn clear(&mut self) {
        self.prev = 0;
        self.data_o = 0;
    }
}

impl Clocked for BitAligner {
    type Input = AlignerInput;
    type Output = u64;

    fn clock(&mut self, input: &AlignerInput) {
        self.tick(input.data, input.slip);
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn output(&self) -> u64 {
        self.data_o
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_form() {
        assert_eq!(0x4a, realign(8, true, 0xaa, 0x55, 3));
        assert_eq!(0x55, realign(8, true, 0xaa, 0x55, 0));
        assert_eq!(0x55, realign(8, false, 0xaa, 0x55, 0));
        // (0x55 & 0x07) << 5 | 0xaa >> 3
        assert_eq!(0xb5, realign(8, false, 0xaa, 0x55, 3));
        assert_eq!(0x8000_0000, realign(32, true, 1, 0, 1));
        assert_eq!(0xffff_fffc, realign(32, true, 0x7fff_fffe, 0, 31));
        assert_eq!(u64::MAX, realign(64, false, u64::MAX, u64::MAX, 63));
    }

    #[test]
    fn slip_wraps_to_port_width() {
        let cfg = AlignerConfig::new(8, true).unwrap();
        let mut a = BitAligner::new(cfg).unwrap();
        a.tick(0x55, 0);
        // only three bits of the shift port exist
        assert_eq!(0x4a, a.tick(0xaa, 3 + 8));
    }
}
