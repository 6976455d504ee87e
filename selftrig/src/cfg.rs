//! Configuration tools: declaring and validating the trigger logic parameters
//!
//! Every parameter here is an instantiation-time constant of the modelled
//! hardware. Configurations are checked once, when a component is built, and
//! a component never exists with an invalid configuration.

use crate::bit::{index_bits, MAX_WORD_WIDTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of one ETROC word at rate 0; rate `r` carries `BASE_WORD_WIDTH << r` bits.
pub const BASE_WORD_WIDTH: u32 = 8;
/// Highest rate whose words still fit in `MAX_WORD_WIDTH`
pub const MAX_RATE: u8 = (MAX_WORD_WIDTH.trailing_zeros() - BASE_WORD_WIDTH.trailing_zeros()) as u8;
/// Width of each packed channel counter in `cnts_o`
pub const COUNTER_WIDTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("data width {0} is not a power of two between 1 and 64")]
    DataWidth(u32),
    #[error("shift port of {bits} bits cannot address a {width}-bit word")]
    SlipWidth { width: u32, bits: u32 },
    #[error("uplink width {0} is not a positive multiple of 8")]
    UplinkWidth(usize),
    #[error("rate {rate} words do not tile a {uplink_width}-bit uplink")]
    Rate { rate: u8, uplink_width: usize },
    #[error("no rates configured")]
    NoRates,
    #[error("flash period must be at least one cycle")]
    FlashPeriod,
    #[error("threshold must be at least one period")]
    Threshold,
    #[error("{num_etrocs} ETROCs requested, uplink holds 1 to {max}")]
    NumEtrocs { num_etrocs: usize, max: usize },
    #[error("report window must be at least one cycle")]
    Window,
}

/// Which flashing pattern the detectors look for
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashVariant {
    /// Any single bit position may flash on its own
    Bit,
    /// The whole word flashes between all zeros and all ones
    Word,
}

/// BitAligner generics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignerConfig {
    pub data_width: u32,
    /// Width of the `slip_cnt_i` port
    pub slip_bits: u32,
    pub transmit_low_to_high: bool,
}

impl AlignerConfig {
    /// Builds a config whose shift port is exactly wide enough
    pub fn new(data_width: u32, transmit_low_to_high: bool) -> Result<Self, ConfigError> {
        check_data_width(data_width)?;
        let cfg = AlignerConfig {
            data_width,
            slip_bits: index_bits(data_width),
            transmit_low_to_high,
        };
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_data_width(self.data_width)?;
        if self.slip_bits < index_bits(self.data_width) {
            return Err(ConfigError::SlipWidth {
                width: self.data_width,
                bits: self.slip_bits,
            });
        }
        Ok(())
    }
}

/// FlashDetector generics, shared by both variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashConfig {
    pub data_width: u32,
    pub flash_period: u32,
    pub threshold: u32,
}

impl FlashConfig {
    pub fn new(data_width: u32, flash_period: u32, threshold: u32) -> Result<Self, ConfigError> {
        let cfg = FlashConfig { data_width, flash_period, threshold };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_data_width(self.data_width)?;
        if self.flash_period == 0 {
            return Err(ConfigError::FlashPeriod);
        }
        if self.threshold == 0 {
            return Err(ConfigError::Threshold);
        }
        Ok(())
    }
}

fn check_data_width(width: u32) -> Result<(), ConfigError> {
    if width == 0 || width > MAX_WORD_WIDTH || !width.is_power_of_two() {
        return Err(ConfigError::DataWidth(width));
    }
    Ok(())
}

/// Word width carried by one ETROC at `rate`, if it fits in a channel word
pub fn etroc_width(rate: u8) -> Option<u32> {
    if rate > MAX_RATE {
        return None;
    }
    return Some(BASE_WORD_WIDTH << rate);
}

/// Full self-trigger declaration, read from `.json` files.
///
/// All fields are optional in the file; missing ones take the defaults of
/// the front-end firmware: a 224-bit uplink with 28 ETROCs, rates 0 to 2, a
/// flashing bit once per LHC orbit (3564 bunch crossings), and a report
/// window of one second at 40 MHz.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TriggerConfig {
    pub name:                   String,
    pub uplink_width:           usize,
    pub flash_period:           u32,
    pub threshold:              u32,
    pub num_etrocs:             usize,
    pub transmit_low_to_high:   bool,
    pub variant:                FlashVariant,
    pub rates:                  Vec<u8>,
    /// Only links whose flashing pattern is confirmed may trigger
    pub require_lock:           bool,
    pub window_cycles:          u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            name:                   String::new(),
            uplink_width:           224,
            flash_period:           3564,
            threshold:              16,
            num_etrocs:             28,
            transmit_low_to_high:   true,
            variant:                FlashVariant::Bit,
            rates:                  vec![0, 1, 2],
            require_lock:           true,
            window_cycles:          40_000_000,
        }
    }
}

impl TriggerConfig {
    /// Number of 8-bit links, i.e. the most channels any rate can carry
    pub fn max_links(&self) -> usize {
        self.uplink_width / BASE_WORD_WIDTH as usize
    }

    /// Number of links at `rate`, or `None` if the rate is not configured
    pub fn num_links(&self, rate: u8) -> Option<usize> {
        if !self.rates.contains(&rate) {
            return None;
        }
        etroc_width(rate).map(|w| self.uplink_width / w as usize)
    }

    pub fn aligner(&self, rate: u8) -> Result<AlignerConfig, ConfigError> {
        let width = self.rate_width(rate)?;
        AlignerConfig::new(width, self.transmit_low_to_high)
    }

    pub fn flash(&self, rate: u8) -> Result<FlashConfig, ConfigError> {
        let width = self.rate_width(rate)?;
        FlashConfig::new(width, self.flash_period, self.threshold)
    }

    fn rate_width(&self, rate: u8) -> Result<u32, ConfigError> {
        match etroc_width(rate) {
            Some(w) if self.uplink_width % w as usize == 0 => Ok(w),
            _ => Err(ConfigError::Rate { rate, uplink_width: self.uplink_width }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uplink_width == 0 || self.uplink_width % BASE_WORD_WIDTH as usize != 0 {
            return Err(ConfigError::UplinkWidth(self.uplink_width));
        }
        if self.rates.is_empty() {
            return Err(ConfigError::NoRates);
        }
        for &rate in self.rates.iter() {
            self.aligner(rate)?.validate()?;
            self.flash(rate)?;
        }
        if self.num_etrocs == 0 || self.num_etrocs > self.max_links() {
            return Err(ConfigError::NumEtrocs {
                num_etrocs: self.num_etrocs,
                max: self.max_links(),
            });
        }
        if self.window_cycles == 0 {
            return Err(ConfigError::Window);
        }
        Ok(())
    }
}
