//! Generated uplink stimulus: every link flashes bit 0 (or its whole word)
//! once per period, alternating high and low, and random single-bit hits
//! arrive at a fixed interval.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use selftrig::bit::Bus;
use selftrig::cfg::{etroc_width, FlashVariant, TriggerConfig};
use tracing::debug;

pub struct Stimulus {
    uplink_width: usize,
    word_width: u32,
    flash_period: u64,
    variant: FlashVariant,
    hit_interval: u64,
    rng: StdRng,
    cycle: u64,
    hits: u64,
}

impl Stimulus {
    /// Returns `None` for a rate with no word width
    pub fn new(config: &TriggerConfig, rate: u8, hit_interval: u64, seed: u64) -> Option<Self> {
        let word_width = etroc_width(rate)?;
        Some(Stimulus {
            uplink_width: config.uplink_width,
            word_width,
            flash_period: config.flash_period as u64,
            variant: config.variant,
            hit_interval,
            rng: StdRng::seed_from_u64(seed),
            cycle: 0,
            hits: 0,
        })
    }

    /// Hits injected so far
    pub fn hits(&self) -> u64 {
        self.hits
    }

    fn num_links(&self) -> usize {
        self.uplink_width / self.word_width as usize
    }

    fn flash(&self, bus: &mut Bus) {
        let level = self.cycle % self.flash_period == 0
            && (self.cycle / self.flash_period) % 2 == 0;
        if !level {
            return;
        }
        for link in 0..self.num_links() {
            match self.variant {
                FlashVariant::Bit => bus.set(link * self.word_width as usize),
                FlashVariant::Word => bus.set_word(link, self.word_width, u64::MAX),
            }
        }
    }

    fn hit(&mut self, bus: &mut Bus) {
        let link = self.rng.gen_range(0..self.num_links());
        // bit 0 carries the flashing pattern
        let offset = self.rng.gen_range(1..self.word_width as usize);
        let b = link * self.word_width as usize + offset;
        bus.set(b);
        self.hits += 1;
        debug!(cycle = self.cycle, link, bit = b, "injected hit");
    }
}

impl Iterator for Stimulus {
    type Item = Bus;

    fn next(&mut self) -> Option<Bus> {
        let mut bus = Bus::zeros(self.uplink_width);
        self.flash(&mut bus);
        if self.hit_interval != 0 && self.cycle != 0 && self.cycle % self.hit_interval == 0 {
            self.hit(&mut bus);
        }
        self.cycle += 1;
        Some(bus)
    }
}
