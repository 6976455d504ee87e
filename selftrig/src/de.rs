//! Deserialization of stimulus traces and reports, supporting `.tsv` and
//! zstd-compressed `.tsv.zst`

use crate::bit::Bus;
use crate::top::Report;
use anyhow::{bail, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zstd::stream;

/// Tab-separated reader without headers; `#` starts a comment line
pub fn tsv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(rdr)
}

/// One uplink word per record, hex in the first column
pub fn stimulus(rdr: &mut csv::Reader<impl Read>, width: usize) -> Result<Vec<Bus>> {
    let mut words = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        match record.get(0) {
            Some(field) => match Bus::from_hex(width, field) {
                Ok(bus) => words.push(bus),
                Err(e) => bail!("record {}: {}", line + 1, e),
            },
            None => bail!("record {} is empty", line + 1),
        }
    }
    Ok(words)
}

/// Read a stimulus file, decompressing it if the name ends in `.zst`
pub fn stimulus_file(path: &Path, width: usize) -> Result<Vec<Bus>> {
    let f = File::open(path)?;
    let words;
    if path.extension().map_or(false, |e| e == "zst") {
        let zrdr = stream::read::Decoder::new(f)?;
        words = stimulus(&mut tsv_reader(zrdr), width)?;
    } else {
        words = stimulus(&mut tsv_reader(BufReader::new(f)), width)?;
    }
    Ok(words)
}

/// Reports as written by `ser::reports`
pub fn reports(rdr: &mut csv::Reader<impl Read>) -> Result<Vec<Report>> {
    let mut reports = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() < 2 {
            bail!("report record has {} fields, need at least 2", record.len());
        }
        let window = record[0].parse::<u64>()?;
        let cycle = record[1].parse::<u64>()?;
        let counts = record
            .iter()
            .skip(2)
            .map(|c| c.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()?;
        reports.push(Report { window, cycle, counts });
    }
    Ok(reports)
}

/// Trigger cycles as written by `ser::triggers`
pub fn triggers(rdr: &mut csv::Reader<impl Read>) -> Result<Vec<u64>> {
    let mut cycles = Vec::new();
    for result in rdr.records() {
        let record = result?;
        match record.get(0) {
            Some(c) => cycles.push(c.parse::<u64>()?),
            None => bail!("empty trigger record"),
        }
    }
    Ok(cycles)
}
