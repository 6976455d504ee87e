//! `checkcfg mytrigger.json`
//!
//! Parse and validate `mytrigger.json`. No output and an exit code of 0
//! indicates success.

use anyhow::Result;
use argh::FromArgs;
use git_version::git_version;
use selftrig::cfg::TriggerConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

const GIT_VERSION: &str = git_version!(fallback = "unknown");

#[derive(FromArgs)]
/// Check a self-trigger configuration file
struct Args {
    /// print version information
    #[argh(switch, short = 'v')]
    version: bool,

    /// print the configuration with defaults filled in
    #[argh(switch, short = 'p')]
    print: bool,

    /// configuration file
    #[argh(positional)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    if args.version {
        println!("{} {}", env!("CARGO_BIN_NAME"), GIT_VERSION);
        return Ok(());
    }
    let path = match args.config {
        Some(p) => p,
        None => anyhow::bail!("no configuration file given"),
    };
    let file = File::open(&path)?;
    let rdr = BufReader::new(file);
    let config: TriggerConfig = serde_json::from_reader(rdr)?;
    config.validate()?;
    if args.print {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(())
}
