//! Report window timing
//!
//! The counters are read out and restarted once per report window. In the
//! front end the window is one second of the 40 MHz clock; here it is a plain
//! count of cycles.

use crate::cfg::ConfigError;
use crate::sim::Clocked;

/// Emits a one-cycle `elapsed_o` pulse every `window_cycles` edges
#[derive(Debug, Clone)]
pub struct ReportWindowCounter {
    window_cycles: u64,
    count: u64,
    elapsed_o: bool,
}

impl ReportWindowCounter {
    pub fn new(window_cycles: u64) -> Result<Self, ConfigError> {
        if window_cycles == 0 {
            return Err(ConfigError::Window);
        }
        Ok(ReportWindowCounter {
            window_cycles,
            count: 0,
            elapsed_o: false,
        })
    }

    /// One-second window for a clock of `clk_frequency` Hz
    pub fn from_clock_frequency(clk_frequency: u64) -> Result<Self, ConfigError> {
        ReportWindowCounter::new(clk_frequency)
    }

    pub fn window_cycles(&self) -> u64 {
        self.window_cycles
    }

    pub fn tick(&mut self) -> bool {
        if self.count + 1 >= self.window_cycles {
            self.count = 0;
            self.elapsed_o = true;
        } else {
            self.count += 1;
            self.elapsed_o = false;
        }
        self.elapsed_o
    }

    pub fn elapsed_o(&self) -> bool {
        self.elapsed_o
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.elapsed_o = false;
    }
}

impl Clocked for ReportWindowCounter {
    type Input = ();
    type Output = bool;

    fn clock(&mut self, _input: &()) {
        self.tick();
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn output(&self) -> bool {
        self.elapsed_o
    }
}
