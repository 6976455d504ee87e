//! Flashing-bit detection and suppression
//!
//! The front end drives a calibration pattern at a fixed cadence: on the
//! first cycle of every period of `flash_period` cycles the pattern shows its
//! level, and it is 0 on every other cycle. The level is high at every period
//! start, or alternates 1, 0, 1, 0, ... from one period to the next; a low
//! start is only accepted after a high one. A genuine hit has no such cadence.
//!
//! Each tracked position (one bit, or the whole word) runs the same small
//! state machine, [`FlashChannelState`]. It counts consecutive on-cadence
//! periods; after `threshold` of them the position is ACTIVE and its output
//! is forced to 0. An off-cadence sample at a period start drops it back to
//! SEARCHING with a zero count. An extra pulse inside a period passes through
//! and moves the position to HOLDING, which keeps the cadence running and
//! returns to ACTIVE at the next period start that matches it.

use crate::bit::{mask, BitOps};
use crate::cfg::{ConfigError, FlashConfig, FlashVariant};
use crate::sim::Clocked;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Searching,
    Active,
    /// Locked, but a pulse arrived inside the current period; the output
    /// passes until the next period start confirms the cadence again
    Holding,
}

/// Classification of one cycle's input at a tracked position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Low,
    High,
    /// Neither level of the pattern, e.g. some but not all bits of a word
    Partial,
}

/// A change of phase reported by [`FlashChannelState::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Locked,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashChannelState {
    pub phase: Phase,
    /// Consecutive on-cadence periods, saturating at the threshold
    pub toggle_count: u32,
    /// Level presented at the start of the current period
    pub last_seen_level: bool,
    /// Position inside the current period; 0 is the period start
    pub period_cursor: u32,
}

impl Default for FlashChannelState {
    fn default() -> Self {
        FlashChannelState {
            phase: Phase::Searching,
            toggle_count: 0,
            last_seen_level: false,
            period_cursor: 0,
        }
    }
}

impl FlashChannelState {
    fn on_cadence(&self, sample: Sample) -> bool {
        match (self.period_cursor, sample) {
            (0, Sample::High) => true,
            (0, Sample::Low) => self.last_seen_level,
            (_, Sample::Low) => true,
            _ => false,
        }
    }

    fn advance(&mut self, sample: Sample, config: &FlashConfig) {
        if self.period_cursor == 0 {
            self.last_seen_level = sample == Sample::High;
            self.toggle_count = (self.toggle_count + 1).min(config.threshold);
            if self.toggle_count == config.threshold {
                self.phase = Phase::Active;
            }
        }
        self.period_cursor = (self.period_cursor + 1) % config.flash_period;
    }

    /// Feed one cycle's sample.
    ///
    /// While waiting for a pattern (count 0) the cursor holds, so the first
    /// high sample opens a candidate period. An off-cadence sample at a
    /// period start, or any off-cadence sample before lock, breaks the old
    /// cadence; a high one also opens a new candidate.
    pub fn observe(&mut self, sample: Sample, config: &FlashConfig) -> Option<Transition> {
        let before = self.phase;
        let on_cadence = self.on_cadence(sample);
        if !on_cadence && self.period_cursor != 0 && self.phase != Phase::Searching {
            self.phase = Phase::Holding;
            self.period_cursor = (self.period_cursor + 1) % config.flash_period;
        } else {
            if !on_cadence {
                *self = FlashChannelState::default();
            }
            if self.on_cadence(sample) {
                self.advance(sample, config);
            }
        }
        match (before, self.phase) {
            (Phase::Searching, Phase::Active) | (Phase::Holding, Phase::Active) => {
                Some(Transition::Locked)
            }
            (Phase::Active, Phase::Searching) | (Phase::Active, Phase::Holding) => {
                Some(Transition::Lost)
            }
            _ => None,
        }
    }

    /// Output is suppressed
    pub fn is_locked(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Locked or holding
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Searching
    }

    /// No candidate period open
    pub fn is_waiting(&self) -> bool {
        self.phase == Phase::Searching && self.toggle_count == 0
    }
}

/// Registered outputs of either detector variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashOutput {
    pub data: u64,
    pub active: bool,
}

/// Per-bit detector: every bit position of the word is tracked on its own
#[derive(Debug, Clone)]
pub struct FlashDetector {
    config: FlashConfig,
    states: Vec<FlashChannelState>,
    data_o: u64,
    locked: u64,
    waiting: bool,
    losses: u64,
}

impl FlashDetector {
    pub fn new(config: FlashConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(FlashDetector {
            config,
            states: vec![FlashChannelState::default(); config.data_width as usize],
            data_o: 0,
            locked: 0,
            waiting: true,
            losses: 0,
        })
    }

    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// One edge; returns the filtered word
    pub fn tick(&mut self, data_i: u64) -> u64 {
        let mut data_o = 0u64;
        let mut locked = 0u64;
        let mut waiting = true;
        for (b, state) in self.states.iter_mut().enumerate() {
            let hit = data_i.check(b);
            let sample = if hit { Sample::High } else { Sample::Low };
            match state.observe(sample, &self.config) {
                Some(Transition::Locked) => debug!(bit = b, "flashing bit locked"),
                Some(Transition::Lost) => {
                    self.losses += 1;
                    debug!(bit = b, "flashing bit lost cadence");
                }
                None => {}
            }
            data_o.change(b, hit && !state.is_locked());
            locked.change(b, state.is_active());
            waiting &= state.is_waiting();
        }
        self.data_o = data_o;
        self.locked = locked;
        self.waiting = waiting;
        data_o
    }

    pub fn data_o(&self) -> u64 {
        self.data_o
    }

    /// High while any bit position is locked onto a flashing pattern or
    /// holding it
    pub fn active_o(&self) -> bool {
        self.locked != 0
    }

    /// Lock flags, one per bit position, holding included
    pub fn locked(&self) -> u64 {
        self.locked
    }

    /// True while no bit position has a candidate period open
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    pub fn state(&self, bit: usize) -> &FlashChannelState {
        &self.states[bit]
    }

    /// Number of times a locked bit fell out of cadence
    pub fn losses(&self) -> u64 {
        self.losses
    }

    pub fn clear(&mut self) {
        for s in self.states.iter_mut() {
            *s = FlashChannelState::default();
        }
        self.data_o = 0;
        self.locked = 0;
        self.waiting = true;
    }
}

/// Whole-word detector: the word flashes between all zeros and all ones
#[derive(Debug, Clone)]
pub struct FlashDetectorWord {
    config: FlashConfig,
    state: FlashChannelState,
    data_o: u64,
    losses: u64,
}

impl FlashDetectorWord {
    pub fn new(config: FlashConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(FlashDetectorWord {
            config,
            state: FlashChannelState::default(),
            data_o: 0,
            losses: 0,
        })
    }

    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// The all-ones flashing pattern
    pub fn pattern(&self) -> u64 {
        mask(self.config.data_width)
    }

    pub fn tick(&mut self, data_i: u64) -> u64 {
        let data_i = data_i & self.pattern();
        let sample = if data_i == 0 {
            Sample::Low
        } else if data_i == self.pattern() {
            Sample::High
        } else {
            Sample::Partial
        };
        match self.state.observe(sample, &self.config) {
            Some(Transition::Locked) => debug!("flashing word locked"),
            Some(Transition::Lost) => {
                self.losses += 1;
                debug!(word = data_i, "flashing word lost cadence");
            }
            None => {}
        }
        self.data_o = if self.state.is_locked() { 0 } else { data_i };
        self.data_o
    }

    pub fn data_o(&self) -> u64 {
        self.data_o
    }

    pub fn active_o(&self) -> bool {
        self.state.is_active()
    }

    pub fn waiting(&self) -> bool {
        self.state.is_waiting()
    }

    pub fn state(&self) -> &FlashChannelState {
        &self.state
    }

    pub fn losses(&self) -> u64 {
        self.losses
    }

    pub fn clear(&mut self) {
        self.state = FlashChannelState::default();
        self.data_o = 0;
    }
}

/// Either detector variant, chosen by configuration
#[derive(Debug, Clone)]
pub enum FlashFilter {
    Bit(FlashDetector),
    Word(FlashDetectorWord),
}

impl FlashFilter {
    pub fn new(variant: FlashVariant, config: FlashConfig) -> Result<Self, ConfigError> {
        let f = match variant {
            FlashVariant::Bit => FlashFilter::Bit(FlashDetector::new(config)?),
            FlashVariant::Word => FlashFilter::Word(FlashDetectorWord::new(config)?),
        };
        Ok(f)
    }

    pub fn tick(&mut self, data_i: u64) -> u64 {
        match self {
            FlashFilter::Bit(d) => d.tick(data_i),
            FlashFilter::Word(d) => d.tick(data_i),
        }
    }

    pub fn data_o(&self) -> u64 {
        match self {
            FlashFilter::Bit(d) => d.data_o(),
            FlashFilter::Word(d) => d.data_o(),
        }
    }

    pub fn active_o(&self) -> bool {
        match self {
            FlashFilter::Bit(d) => d.active_o(),
            FlashFilter::Word(d) => d.active_o(),
        }
    }

    /// No tracked position has seen anything that could start a pattern
    pub fn waiting(&self) -> bool {
        match self {
            FlashFilter::Bit(d) => d.waiting(),
            FlashFilter::Word(d) => d.waiting(),
        }
    }

    pub fn losses(&self) -> u64 {
        match self {
            FlashFilter::Bit(d) => d.losses(),
            FlashFilter::Word(d) => d.losses(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            FlashFilter::Bit(d) => d.clear(),
            FlashFilter::Word(d) => d.clear(),
        }
    }
}

macro_rules! impl_clocked_filter {
    ($($t:ty),*) => {$(
        impl Clocked for $t {
            type Input = u64;
            type Output = FlashOutput;

            fn clock(&mut self, input: &u64) {
                self.tick(*input);
            }

            fn reset(&mut self) {
                self.clear();
            }

            fn output(&self) -> FlashOutput {
                FlashOutput {
                    data: self.data_o(),
                    active: self.active_o(),
                }
            }
        }
    )*};
}

impl_clocked_filter!(FlashDetector, FlashDetectorWord, FlashFilter);

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(period: u32, threshold: u32) -> FlashConfig {
        FlashConfig::new(8, period, threshold).unwrap()
    }

    #[test]
    fn waits_for_first_high() {
        let c = cfg(4, 3);
        let mut s = FlashChannelState::default();
        for _ in 0..10 {
            assert_eq!(None, s.observe(Sample::Low, &c));
            assert_eq!(FlashChannelState::default(), s);
        }
        s.observe(Sample::High, &c);
        assert_eq!(1, s.toggle_count);
        assert_eq!(1, s.period_cursor);
        assert!(s.last_seen_level);
    }

    #[test]
    fn period_of_one_alternates_every_cycle() {
        let c = cfg(1, 4);
        let mut s = FlashChannelState::default();
        let mut events = Vec::new();
        for i in 0..6 {
            let sample = if i % 2 == 0 { Sample::High } else { Sample::Low };
            events.push(s.observe(sample, &c));
        }
        assert_eq!(vec![None, None, None, Some(Transition::Locked), None, None], events);
        // a repeated low breaks the cadence
        assert_eq!(Some(Transition::Lost), s.observe(Sample::Low, &c));
        assert_eq!(0, s.toggle_count);
    }

    #[test]
    fn threshold_of_one_holds_through_early_pulse() {
        let c = cfg(4, 1);
        let mut s = FlashChannelState::default();
        assert_eq!(Some(Transition::Locked), s.observe(Sample::High, &c));
        // a pulse inside the period passes but keeps the cadence
        assert_eq!(Some(Transition::Lost), s.observe(Sample::High, &c));
        assert_eq!(Phase::Holding, s.phase);
        assert!(s.is_active());
        assert!(!s.is_locked());
        assert_eq!(2, s.period_cursor);
        assert_eq!(None, s.observe(Sample::Low, &c));
        assert_eq!(None, s.observe(Sample::Low, &c));
        assert_eq!(Some(Transition::Locked), s.observe(Sample::High, &c));
        assert!(s.is_locked());
    }

    #[test]
    fn pulse_every_period_locks() {
        let c = cfg(4, 3);
        let mut s = FlashChannelState::default();
        let mut events = Vec::new();
        for i in 0..12 {
            let sample = if i % 4 == 0 { Sample::High } else { Sample::Low };
            if let Some(t) = s.observe(sample, &c) {
                events.push((i, t));
            }
        }
        assert_eq!(vec![(8, Transition::Locked)], events);
        assert!(s.last_seen_level);
    }

    #[test]
    fn low_start_needs_high_before_it() {
        let c = cfg(2, 3);
        let mut s = FlashChannelState::default();
        s.observe(Sample::High, &c);
        s.observe(Sample::Low, &c);
        s.observe(Sample::Low, &c);
        assert_eq!(2, s.toggle_count);
        assert!(!s.last_seen_level);
        s.observe(Sample::Low, &c);
        // a second low start in a row
        s.observe(Sample::Low, &c);
        assert!(s.is_waiting());
    }

    #[test]
    fn holding_resets_on_missed_period_start() {
        let c = cfg(4, 1);
        let mut s = FlashChannelState::default();
        s.observe(Sample::High, &c);
        s.observe(Sample::Partial, &c);
        assert_eq!(Phase::Holding, s.phase);
        s.observe(Sample::High, &c);
        s.observe(Sample::Low, &c);
        assert_eq!(Phase::Holding, s.phase);
        // low after a high start is on cadence
        assert_eq!(Some(Transition::Locked), s.observe(Sample::Low, &c));
        assert_eq!(Some(Transition::Lost), s.observe(Sample::High, &c));
        // a second low start in a row is not
        for _ in 0..2 {
            s.observe(Sample::Low, &c);
        }
        assert_eq!(None, s.observe(Sample::Low, &c));
        assert_eq!(Phase::Searching, s.phase);
        assert!(s.is_waiting());
    }

    #[test]
    fn partial_never_starts_a_candidate() {
        let c = cfg(4, 2);
        let mut s = FlashChannelState::default();
        s.observe(Sample::Partial, &c);
        assert_eq!(FlashChannelState::default(), s);
    }
}
