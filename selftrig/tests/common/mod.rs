#![allow(dead_code)]

use selftrig::bit::Bus;
use selftrig::cfg::{etroc_width, FlashVariant, TriggerConfig};
use selftrig::trigger::{UplinkInputs, UplinkTriggerAggregator};

pub const PERIOD: u32 = 4;
pub const THRESHOLD: u32 = 3;

/// Four 8-bit links, a short flashing period and a window that never closes
/// during a test
pub fn small_config(variant: FlashVariant) -> TriggerConfig {
    TriggerConfig {
        name: String::from("small"),
        uplink_width: 32,
        flash_period: PERIOD,
        threshold: THRESHOLD,
        num_etrocs: 4,
        transmit_low_to_high: true,
        variant,
        rates: vec![0, 1, 2],
        require_lock: true,
        window_cycles: 1_000_000,
    }
}

/// Level of the flashing pattern at `cycle`: high at even period starts, low
/// at odd period starts, `None` in between
pub fn flash_level(cycle: u64, period: u32) -> Option<bool> {
    let period = period as u64;
    if cycle % period != 0 {
        return None;
    }
    Some((cycle / period) % 2 == 0)
}

/// Uplink word at `cycle` where every link at `rate` carries the flashing
/// pattern: bit 0 of each link, or the whole link word
pub fn flashing_bus(config: &TriggerConfig, rate: u8, cycle: u64) -> Bus {
    let width = etroc_width(rate).unwrap();
    let mut bus = Bus::zeros(config.uplink_width);
    if flash_level(cycle, config.flash_period) == Some(true) {
        let links = config.uplink_width / width as usize;
        for link in 0..links {
            match config.variant {
                FlashVariant::Bit => bus.set(link * width as usize),
                FlashVariant::Word => bus.set_word(link, width, u64::MAX),
            }
        }
    }
    bus
}

pub fn flashing_inputs(config: &TriggerConfig, rate: u8, cycle: u64) -> UplinkInputs {
    UplinkInputs::new(flashing_bus(config, rate, cycle), rate)
}

/// Clock `agg` over `cycles` with the flashing pattern, letting `edit` add
/// hits or change the inputs, and return the cycles on whose edge
/// `trigger_o` was registered
pub fn run<F>(
    agg: &mut UplinkTriggerAggregator,
    rate: u8,
    cycles: std::ops::Range<u64>,
    mut edit: F,
) -> Vec<u64>
where
    F: FnMut(u64, &mut UplinkInputs),
{
    let config = agg.config().clone();
    let mut triggers = Vec::new();
    for cycle in cycles {
        let mut input = flashing_inputs(&config, rate, cycle);
        edit(cycle, &mut input);
        if agg.tick(&input, false) {
            triggers.push(cycle);
        }
    }
    triggers
}

/// Cycles needed for every flashing link to lock, with margin
pub fn warmup() -> u64 {
    (4 * PERIOD * THRESHOLD) as u64
}
