use selftrig::cfg::{AlignerConfig, ConfigError, FlashConfig, FlashVariant, TriggerConfig};
use selftrig::trigger::UplinkTriggerAggregator;
use selftrig::window::ReportWindowCounter;

fn serialize_config(config: &TriggerConfig) -> String {
    let ser = serde_json::to_string(config).unwrap();
    return ser;
}

fn deserialize_config(config: &str) -> TriggerConfig {
    let de: TriggerConfig = serde_json::from_str(config).unwrap();
    return de;
}

#[test]
fn serde_roundtrip() {
    let config = TriggerConfig {
        name: String::from("test_trigger_serde"),
        uplink_width: 64,
        flash_period: 12,
        threshold: 5,
        num_etrocs: 6,
        transmit_low_to_high: false,
        variant: FlashVariant::Word,
        rates: vec![0, 3],
        require_lock: false,
        window_cycles: 1000,
    };
    let serconfig = serialize_config(&config);
    let deconfig = deserialize_config(&serconfig);
    assert_eq!(config, deconfig);
    assert!(serconfig.contains("\"variant\":\"word\""));
}

#[test]
fn missing_fields_take_defaults() {
    let config = deserialize_config(r#"{"name": "short", "flash_period": 8, "variant": "word"}"#);
    let default = TriggerConfig::default();
    assert_eq!("short", config.name);
    assert_eq!(8, config.flash_period);
    assert_eq!(FlashVariant::Word, config.variant);
    assert_eq!(default.uplink_width, config.uplink_width);
    assert_eq!(default.rates, config.rates);
    assert_eq!(default.window_cycles, config.window_cycles);
    assert_eq!(TriggerConfig::default(), deserialize_config("{}"));
}

#[test]
fn unknown_variant_rejected() {
    let res: Result<TriggerConfig, _> = serde_json::from_str(r#"{"variant": "nibble"}"#);
    assert!(res.is_err());
}

#[test]
fn invalid_configs_rejected() {
    let base = TriggerConfig::default();

    let cfg = TriggerConfig { uplink_width: 20, ..base.clone() };
    assert_eq!(Err(ConfigError::UplinkWidth(20)), cfg.validate());

    // 224 bits hold seven 32-bit words but not 64-bit ones
    let cfg = TriggerConfig { rates: vec![0, 3], ..base.clone() };
    assert_eq!(
        Err(ConfigError::Rate { rate: 3, uplink_width: 224 }),
        cfg.validate()
    );

    let cfg = TriggerConfig { rates: vec![4], uplink_width: 256, num_etrocs: 1, ..base.clone() };
    assert_eq!(
        Err(ConfigError::Rate { rate: 4, uplink_width: 256 }),
        cfg.validate()
    );

    let cfg = TriggerConfig { rates: vec![], ..base.clone() };
    assert_eq!(Err(ConfigError::NoRates), cfg.validate());

    let cfg = TriggerConfig { flash_period: 0, ..base.clone() };
    assert_eq!(Err(ConfigError::FlashPeriod), cfg.validate());

    let cfg = TriggerConfig { threshold: 0, ..base.clone() };
    assert_eq!(Err(ConfigError::Threshold), cfg.validate());

    let cfg = TriggerConfig { num_etrocs: 29, ..base.clone() };
    assert_eq!(
        Err(ConfigError::NumEtrocs { num_etrocs: 29, max: 28 }),
        cfg.validate()
    );

    let cfg = TriggerConfig { num_etrocs: 0, ..base.clone() };
    assert!(cfg.validate().is_err());

    let cfg = TriggerConfig { window_cycles: 0, ..base.clone() };
    assert_eq!(Err(ConfigError::Window), cfg.validate());
    assert!(UplinkTriggerAggregator::new(&cfg).is_err());
}

#[test]
fn component_configs() {
    assert_eq!(Err(ConfigError::DataWidth(12)), AlignerConfig::new(12, true).map(|_| ()));
    assert_eq!(Err(ConfigError::DataWidth(0)), FlashConfig::new(0, 4, 2).map(|_| ()));
    assert_eq!(5, AlignerConfig::new(32, true).unwrap().slip_bits);

    let narrow = AlignerConfig {
        data_width: 32,
        slip_bits: 4,
        transmit_low_to_high: true,
    };
    assert_eq!(
        Err(ConfigError::SlipWidth { width: 32, bits: 4 }),
        narrow.validate()
    );

    assert_eq!(Err(ConfigError::Window), ReportWindowCounter::new(0).map(|_| ()));
    assert_eq!(
        40_000_000,
        ReportWindowCounter::from_clock_frequency(40_000_000).unwrap().window_cycles()
    );
}

#[test]
fn error_messages() {
    let e = ConfigError::NumEtrocs { num_etrocs: 30, max: 28 };
    assert_eq!("30 ETROCs requested, uplink holds 1 to 28", e.to_string());
}
