//! Serialization of stimulus traces and reports to tab-separated values

use crate::bit::Bus;
use crate::top::Report;
use anyhow::Result;
use csv::WriterBuilder;
use std::io::Write;

/// Tab-separated writer without headers
pub fn tsv_writer<W: Write>(wtr: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(wtr)
}

/// One hex uplink word per line
pub fn stimulus(wtr: &mut csv::Writer<impl Write>, words: &[Bus]) -> Result<()> {
    for word in words.iter() {
        wtr.write_record(&[word.to_string()])?;
    }
    Ok(())
}

/// One report: window, cycle, then every channel count
pub fn report(wtr: &mut csv::Writer<impl Write>, report: &Report) -> Result<()> {
    let mut record = Vec::with_capacity(report.counts.len() + 2);
    record.push(report.window.to_string());
    record.push(report.cycle.to_string());
    record.extend(report.counts.iter().map(|c| c.to_string()));
    wtr.write_record(&record)?;
    Ok(())
}

pub fn reports(wtr: &mut csv::Writer<impl Write>, reports: &[Report]) -> Result<()> {
    for r in reports.iter() {
        report(wtr, r)?;
    }
    Ok(())
}

/// Cycles at which `trigger_o` was asserted, one per line
pub fn triggers(wtr: &mut csv::Writer<impl Write>, cycles: &[u64]) -> Result<()> {
    for cycle in cycles.iter() {
        wtr.write_record(&[cycle.to_string()])?;
    }
    Ok(())
}
