//! Run record written at the end of a simulation, modelled on the run
//! declarations: the configuration that was used plus what was observed.

use anyhow::Result;
use chrono::{DateTime, Local};
use selftrig::cfg::TriggerConfig;
use selftrig::top::Report;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub timestamp:          DateTime<Local>,
    pub version:            String,
    pub config:             TriggerConfig,
    pub rate:               u8,
    pub slip:               u32,
    pub cycles:             u64,
    /// Seed and hit count, when the stimulus was generated
    pub seed:               Option<u64>,
    pub hits_injected:      Option<u64>,
    pub triggers:           u64,
    pub windows:            u64,
    pub losses:             u64,
    /// Hits per channel over the whole run, partial last window included
    pub totals:             Vec<u64>,
}

impl RunRecord {
    pub fn new(config: &TriggerConfig, rate: u8, slip: u32, version: &str) -> Self {
        RunRecord {
            timestamp: Local::now(),
            version: String::from(version),
            config: config.clone(),
            rate,
            slip,
            cycles: 0,
            seed: None,
            hits_injected: None,
            triggers: 0,
            windows: 0,
            losses: 0,
            totals: vec![0; config.num_etrocs],
        }
    }

    /// Fold one closed window into the totals
    pub fn add_report(&mut self, report: &Report) {
        self.windows += 1;
        self.add_counts(&report.counts);
    }

    pub fn add_counts(&mut self, counts: &[u8]) {
        for (t, &c) in self.totals.iter_mut().zip(counts.iter()) {
            *t += c as u64;
        }
    }

    /// Write as pretty json; refuses to overwrite an existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json_record = serde_json::to_string_pretty(self)?;
        let f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        let mut wtr = BufWriter::new(f);
        wtr.write_all(json_record.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate() {
        let config = TriggerConfig { num_etrocs: 3, uplink_width: 24, ..TriggerConfig::default() };
        let mut rcd = RunRecord::new(&config, 0, 0, "test");
        rcd.add_report(&Report { window: 0, cycle: 10, counts: vec![1, 0, 255] });
        rcd.add_report(&Report { window: 1, cycle: 20, counts: vec![2, 0, 255] });
        rcd.add_counts(&[0, 4, 1]);
        assert_eq!(2, rcd.windows);
        assert_eq!(vec![3, 4, 511], rcd.totals);
    }

    #[test]
    fn json_roundtrip() {
        let rcd = RunRecord::new(&TriggerConfig::default(), 1, 2, "test");
        let ser = serde_json::to_string(&rcd).unwrap();
        let de: RunRecord = serde_json::from_str(&ser).unwrap();
        assert_eq!(rcd.config, de.config);
        assert_eq!(rcd.totals, de.totals);
        assert_eq!(rcd.timestamp, de.timestamp);
    }
}
