pub mod bit;
pub mod bitslip;
pub mod cfg;
pub mod de;
pub mod flash;
pub mod ser;
pub mod sim;
pub mod top;
pub mod trigger;
pub mod window;

pub use bit::Bus;
pub use bitslip::BitAligner;
pub use cfg::{ConfigError, FlashVariant, TriggerConfig};
pub use flash::{FlashDetector, FlashDetectorWord, FlashFilter};
pub use sim::{Clocked, Simulator};
pub use top::{Report, SelfTrigger};
pub use trigger::{UplinkInputs, UplinkTriggerAggregator};
pub use window::ReportWindowCounter;
