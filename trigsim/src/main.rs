use anyhow::{bail, Result};
use either::{Left, Right};
use selftrig::cfg::TriggerConfig;
use selftrig::top::SelfTrigger;
use selftrig::trigger::UplinkInputs;
use selftrig::{de, ser};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufReader, Write};
use std::path::PathBuf;
use tracing::info;
use trigsim::record::RunRecord;
use trigsim::stimulus::Stimulus;
use trigsim::{CliArgs, DEFAULT_CYCLES};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    // Reports go to stdout, so logs go to stderr
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load the trigger config
    let config = match &args.config {
        Some(c) => {
            let f = File::open(c)?;
            let rdr = BufReader::new(f);
            serde_json::from_reader(rdr)?
        },
        None => TriggerConfig::default(),
    };
    let mut top = SelfTrigger::new(&config)?;
    if top.aggregator().num_links(args.rate).is_none() {
        bail!("rate {} is not configured", args.rate);
    }
    let mut record = RunRecord::new(&config, args.rate, args.slip, GIT_VERSION);

    // Collect the stimulus
    let input = match args.input.as_deref() {
        Some("-") => Some(Left(())),
        Some(i) => match fs::metadata(i) {
            Ok(m) if m.is_file() => Some(Right(PathBuf::from(i))),
            Ok(_) => bail!("{} is not a file", i),
            Err(e) => bail!(e),
        },
        None => None,
    };
    let mut words = match input {
        Some(Left(())) => {
            let stdin = stdin();
            let stdin = stdin.lock();
            let mut rdr = de::tsv_reader(BufReader::new(stdin));
            Left(de::stimulus(&mut rdr, config.uplink_width)?.into_iter())
        },
        Some(Right(path)) => {
            Left(de::stimulus_file(&path, config.uplink_width)?.into_iter())
        },
        None => match Stimulus::new(&config, args.rate, args.hit_interval, args.seed) {
            Some(s) => {
                record.seed = Some(args.seed);
                Right(s)
            },
            None => bail!("rate {} has no word width", args.rate),
        },
    };
    let cycles = match (&args.input, args.cycles) {
        (_, Some(n)) => n,
        (Some(_), None) => u64::MAX,
        (None, None) => DEFAULT_CYCLES,
    };
    info!(
        name = %config.name,
        rate = args.rate,
        cycles,
        "starting run"
    );

    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = ser::tsv_writer(stdout);
    let mut triggers = Vec::new();
    let links = top.aggregator().num_links(args.rate).unwrap_or(0);

    for (cycle, data) in words.by_ref().take(cycles as usize).enumerate() {
        let mut input = UplinkInputs::new(data, args.rate);
        input.slip = vec![args.slip; links];
        if let Some(report) = top.tick(&input) {
            info!(window = report.window, cycle = report.cycle, "window closed");
            ser::report(&mut wtr, &report)?;
            record.add_report(&report);
        }
        if top.trigger_o() {
            info!(cycle, "trigger");
            triggers.push(cycle as u64);
        }
    }
    wtr.flush()?;

    record.cycles = top.cycle();
    record.triggers = triggers.len() as u64;
    record.losses = top.aggregator().losses(args.rate);
    record.add_counts(top.aggregator().counts());
    if let Right(stim) = &words {
        record.hits_injected = Some(stim.hits());
    }
    info!(
        cycles = record.cycles,
        triggers = record.triggers,
        windows = record.windows,
        losses = record.losses,
        "run finished"
    );

    if let Some(path) = &args.triggers {
        let f = File::create(path)?;
        let mut twtr = ser::tsv_writer(f);
        ser::triggers(&mut twtr, &triggers)?;
        twtr.flush()?;
    }

    if let Some(path) = &args.record {
        record.save(&PathBuf::from(path))?;
    }

    Ok(())
}
