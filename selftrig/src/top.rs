//! Top-level self-trigger: the aggregator plus its report window.
//!
//! At every window boundary the counters are snapshotted into a [`Report`]
//! and restarted on the same edge.

use crate::cfg::{ConfigError, TriggerConfig};
use crate::sim::Clocked;
use crate::trigger::{TriggerOutput, UplinkInputs, UplinkTriggerAggregator};
use crate::window::ReportWindowCounter;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counter values accumulated over one report window
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Window index since reset, starting at 0
    pub window: u64,
    /// Edge at which the snapshot was taken, counted from reset
    pub cycle: u64,
    pub counts: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SelfTrigger {
    aggregator: UplinkTriggerAggregator,
    window: ReportWindowCounter,
    cycle: u64,
    windows: u64,
    last_report: Option<Report>,
}

impl SelfTrigger {
    pub fn new(config: &TriggerConfig) -> Result<Self, ConfigError> {
        let aggregator = UplinkTriggerAggregator::new(config)?;
        let window = ReportWindowCounter::new(config.window_cycles)?;
        Ok(SelfTrigger {
            aggregator,
            window,
            cycle: 0,
            windows: 0,
            last_report: None,
        })
    }

    /// One edge; returns the report of the window that closed on it, if any
    pub fn tick(&mut self, input: &UplinkInputs) -> Option<Report> {
        let report = if self.window.elapsed_o() {
            let r = Report {
                window: self.windows,
                cycle: self.cycle,
                counts: self.aggregator.counts().to_vec(),
            };
            self.windows += 1;
            Some(r)
        } else {
            None
        };
        self.aggregator.tick(input, report.is_some());
        self.window.tick();
        self.cycle += 1;
        if let Some(r) = &report {
            debug!(window = r.window, cycle = r.cycle, "report window closed");
            self.last_report = Some(r.clone());
        }
        report
    }

    pub fn aggregator(&self) -> &UplinkTriggerAggregator {
        &self.aggregator
    }

    pub fn trigger_o(&self) -> bool {
        self.aggregator.trigger_o()
    }

    pub fn last_report(&self) -> Option<&Report> {
        self.last_report.as_ref()
    }

    /// Edges since reset
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn clear(&mut self) {
        self.aggregator.clear();
        self.window.clear();
        self.cycle = 0;
        self.windows = 0;
        self.last_report = None;
    }
}

impl Clocked for SelfTrigger {
    type Input = UplinkInputs;
    type Output = TriggerOutput;

    fn clock(&mut self, input: &UplinkInputs) {
        self.tick(input);
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn output(&self) -> TriggerOutput {
        self.aggregator.output()
    }
}
