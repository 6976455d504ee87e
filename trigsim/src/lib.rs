use argh::FromArgs;

#[derive(Debug, FromArgs, Clone)]
/// Run the uplink self-trigger over a stimulus trace and print one
/// tab-separated report per window: window, cycle, and the count of every
/// channel. Without --input, a flashing pattern with random hits is
/// generated.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// trigger config file path
    #[argh(option)]
    pub config: Option<String>,
    /// rate selector, word width is 8 << rate
    #[argh(option, default = "0")]
    pub rate: u8,
    /// number of cycles to run; the whole input when reading a trace
    #[argh(option)]
    pub cycles: Option<u64>,
    /// cycles between generated hits, 0 for none
    #[argh(option, default = "1000")]
    pub hit_interval: u64,
    /// seed for the generated hits
    #[argh(option, default = "0")]
    pub seed: u64,
    /// bit slip applied to every link
    #[argh(option, default = "0")]
    pub slip: u32,
    /// stimulus trace (.tsv or .tsv.zst), '-' for standard input
    #[argh(option)]
    pub input: Option<String>,
    /// write the cycle of every trigger to this file
    #[argh(option)]
    pub triggers: Option<String>,
    /// write a json run record to this file
    #[argh(option)]
    pub record: Option<String>,
}

/// Cycles generated when neither --cycles nor --input is given
pub const DEFAULT_CYCLES: u64 = 100_000;

pub mod record;
pub mod stimulus;
