//! Trigger aggregation over the uplink
//!
//! The uplink carries one word per ETROC; how wide that word is depends on the
//! rate the ETROCs run at. Every configured rate gets a lane: one BitAligner
//! and one flash filter per link. All lanes are clocked on every edge and the
//! `rate` input picks the lane whose filtered words reach `trigger_o` and the
//! counters, so switching rates needs no pipeline refill.
//!
//! A link is armed, and its hits reach the trigger, while its filter is
//! locked onto or holding a flashing pattern, or after every tracked position
//! has been waiting for `threshold * flash_period` edges with no candidate
//! open. A link that just started a candidate is neither, so the pulses of a
//! pattern being confirmed do not trigger.
//!
//! Pipeline, one register per stage:
//!
//! ```text
//! uplink ─> BitAligner ─> FlashFilter ─> enable/arm gate ─> OR ─> trigger_o
//!                                                        └─> counters ─> cnts_o
//! ```

use crate::bit::{word_to_positions, Bus};
use crate::bitslip::BitAligner;
use crate::cfg::{ConfigError, TriggerConfig, COUNTER_WIDTH};
use crate::flash::FlashFilter;
use crate::sim::Clocked;
use itertools::izip;
use tracing::debug;

/// Edges between the edge that samples an unslipped word and the edge that
/// registers its trigger: aligner output, filter, aggregator.
pub const TRIGGER_LATENCY: u64 = 3;

/// Inputs sampled by the aggregator on each edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkInputs {
    pub data: Bus,
    pub rate: u8,
    /// One enable bit per uplink bit
    pub enable: Bus,
    /// Shift amount per link; links past the end of the vector use 0
    pub slip: Vec<u32>,
}

impl UplinkInputs {
    /// Everything enabled and no slip
    pub fn new(data: Bus, rate: u8) -> Self {
        let enable = Bus::ones(data.width());
        UplinkInputs {
            data,
            rate,
            enable,
            slip: Vec::new(),
        }
    }

    pub fn idle(uplink_width: usize, rate: u8) -> Self {
        UplinkInputs::new(Bus::zeros(uplink_width), rate)
    }
}

/// Registered outputs of the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutput {
    pub trigger: bool,
    pub counts: Vec<u8>,
    /// Lock flag per link of the selected lane
    pub active: Bus,
}

/// Aligners and filters for one rate
#[derive(Debug, Clone)]
struct Lane {
    rate: u8,
    width: u32,
    aligners: Vec<BitAligner>,
    filters: Vec<FlashFilter>,
    /// Filter lock flags, one edge behind the filter outputs
    armed: Vec<bool>,
    /// Edges each filter has spent waiting
    quiet: Vec<u64>,
    /// Waiting edges after which a link is armed without a pattern
    quiet_edges: u64,
}

impl Lane {
    fn new(config: &TriggerConfig, rate: u8) -> Result<Self, ConfigError> {
        let aligner = config.aligner(rate)?;
        let flash = config.flash(rate)?;
        let num_links = config.uplink_width / aligner.data_width as usize;
        let mut aligners = Vec::with_capacity(num_links);
        let mut filters = Vec::with_capacity(num_links);
        for _ in 0..num_links {
            aligners.push(BitAligner::new(aligner)?);
            filters.push(FlashFilter::new(config.variant, flash)?);
        }
        Ok(Lane {
            rate,
            width: aligner.data_width,
            aligners,
            filters,
            armed: vec![false; num_links],
            quiet: vec![0; num_links],
            quiet_edges: flash.threshold as u64 * flash.flash_period as u64,
        })
    }

    /// Clock every stage, downstream first
    fn tick(&mut self, input: &UplinkInputs) {
        for (link, aligner, filter, armed, quiet) in izip!(
            0..,
            self.aligners.iter_mut(),
            self.filters.iter_mut(),
            self.armed.iter_mut(),
            self.quiet.iter_mut()
        ) {
            *armed = filter.active_o() || *quiet >= self.quiet_edges;
            filter.tick(aligner.data_o());
            *quiet = if filter.waiting() { quiet.saturating_add(1) } else { 0 };
            let slip = input.slip.get(link).copied().unwrap_or(0);
            aligner.tick(input.data.word(link, self.width), slip);
        }
    }

    fn clear(&mut self) {
        for a in self.aligners.iter_mut() {
            a.clear();
        }
        for f in self.filters.iter_mut() {
            f.clear();
        }
        for a in self.armed.iter_mut() {
            *a = false;
        }
        for q in self.quiet.iter_mut() {
            *q = 0;
        }
    }
}

/// Self-trigger over the whole uplink: `trigger_o`, `cnts_o` and `active_o`
#[derive(Debug, Clone)]
pub struct UplinkTriggerAggregator {
    config: TriggerConfig,
    lanes: Vec<Lane>,
    trigger_o: bool,
    counters: Vec<u8>,
    active_o: Bus,
}

impl UplinkTriggerAggregator {
    pub fn new(config: &TriggerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rates = config.rates.clone();
        rates.sort_unstable();
        rates.dedup();
        let lanes = rates
            .into_iter()
            .map(|r| Lane::new(config, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UplinkTriggerAggregator {
            config: config.clone(),
            lanes,
            trigger_o: false,
            counters: vec![0; config.num_etrocs],
            active_o: Bus::zeros(config.max_links()),
        })
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// One edge. With `clear_counts` every counter restarts from this edge's
    /// hit, which opens the next report window.
    pub fn tick(&mut self, input: &UplinkInputs, clear_counts: bool) -> bool {
        debug_assert_eq!(self.config.uplink_width, input.data.width(), "uplink data width");
        debug_assert_eq!(self.config.uplink_width, input.enable.width(), "uplink enable width");

        // Gate and fan in the filter outputs registered on the previous edge
        let mut trigger = false;
        let mut hits = vec![false; self.counters.len()];
        let mut active = Bus::zeros(self.config.max_links());
        if let Some(lane) = self.lanes.iter().find(|l| l.rate == input.rate) {
            for (link, filter, &armed) in izip!(0.., lane.filters.iter(), lane.armed.iter()) {
                let word = filter.data_o() & input.enable.word(link, lane.width);
                let hit = word != 0 && (armed || !self.config.require_lock);
                if hit {
                    debug!(link, bits = ?word_to_positions(word), "hit");
                }
                trigger |= hit;
                if let Some(h) = hits.get_mut(link) {
                    *h = hit;
                }
                active.change(link, filter.active_o());
            }
        }
        for (channel, counter, hit) in izip!(0.., self.counters.iter_mut(), hits) {
            if clear_counts {
                *counter = hit as u8;
            } else if hit {
                if *counter == u8::MAX - 1 {
                    debug!(channel, "hit counter saturated");
                }
                *counter = counter.saturating_add(1);
            }
        }
        self.trigger_o = trigger;
        self.active_o = active;

        for lane in self.lanes.iter_mut() {
            lane.tick(input);
        }
        trigger
    }

    pub fn trigger_o(&self) -> bool {
        self.trigger_o
    }

    /// Live counter values, one per ETROC
    pub fn counts(&self) -> &[u8] {
        &self.counters
    }

    /// Counters packed into one vector, channel `i` at bits `[8i, 8i+8)`
    pub fn cnts_o(&self) -> Bus {
        let mut bus = Bus::zeros(self.counters.len() * COUNTER_WIDTH);
        for (i, &c) in self.counters.iter().enumerate() {
            bus.set_word(i, COUNTER_WIDTH as u32, c as u64);
        }
        bus
    }

    pub fn active_o(&self) -> &Bus {
        &self.active_o
    }

    pub fn saturated(&self, channel: usize) -> bool {
        self.counters.get(channel) == Some(&u8::MAX)
    }

    /// Number of links at `rate`, or `None` if no lane runs at that rate
    pub fn num_links(&self, rate: u8) -> Option<usize> {
        self.lanes
            .iter()
            .find(|l| l.rate == rate)
            .map(|l| l.aligners.len())
    }

    /// Word width at `rate`, or `None` if no lane runs at that rate
    pub fn word_width(&self, rate: u8) -> Option<u32> {
        self.lanes
            .iter()
            .find(|l| l.rate == rate)
            .map(|l| l.width)
    }

    /// Times any link at `rate` dropped out of a confirmed flashing cadence
    pub fn losses(&self, rate: u8) -> u64 {
        self.lanes
            .iter()
            .filter(|l| l.rate == rate)
            .flat_map(|l| l.filters.iter())
            .map(|f| f.losses())
            .sum()
    }

    pub fn clear(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.clear();
        }
        self.trigger_o = false;
        for c in self.counters.iter_mut() {
            *c = 0;
        }
        self.active_o = Bus::zeros(self.config.max_links());
    }
}

impl Clocked for UplinkTriggerAggregator {
    type Input = UplinkInputs;
    type Output = TriggerOutput;

    fn clock(&mut self, input: &UplinkInputs) {
        self.tick(input, false);
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn output(&self) -> TriggerOutput {
        TriggerOutput {
            trigger: self.trigger_o,
            counts: self.counters.clone(),
            active: self.active_o.clone(),
        }
    }
}
