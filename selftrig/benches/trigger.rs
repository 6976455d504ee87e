use criterion::{black_box, criterion_group, criterion_main, Criterion};

use selftrig::bit::Bus;
use selftrig::cfg::{FlashVariant, TriggerConfig};
use selftrig::trigger::{UplinkInputs, UplinkTriggerAggregator};

/// Two flashing periods of the default 224-bit uplink at `rate`, with a hit on
/// link 1 halfway through
fn stimulus(config: &TriggerConfig, rate: u8) -> Vec<UplinkInputs> {
    let width = 8usize << rate;
    let links = config.uplink_width / width;
    let period = config.flash_period as usize;
    let mut words = Vec::with_capacity(2 * period);
    for cycle in 0..2 * period {
        let mut bus = Bus::zeros(config.uplink_width);
        if cycle == 0 {
            for link in 0..links {
                bus.set(link * width);
            }
        }
        if cycle == period / 2 {
            bus.set(width + 3);
        }
        words.push(UplinkInputs::new(bus, rate));
    }
    words
}

fn bench_variant(c: &mut Criterion, name: &str, variant: FlashVariant) {
    let config = TriggerConfig {
        variant,
        flash_period: 64,
        ..TriggerConfig::default()
    };
    for rate in 0..3 {
        let inputs = stimulus(&config, rate);
        let mut agg = UplinkTriggerAggregator::new(&config).unwrap();
        c.bench_function(&format!("{}_rate{}", name, rate), |b| {
            b.iter(|| {
                let mut n = 0;
                for input in inputs.iter() {
                    n += agg.tick(input, false) as u32;
                }
                black_box(n)
            })
        });
    }
}

fn aggregator_bit(c: &mut Criterion) {
    bench_variant(c, "aggregator_bit", FlashVariant::Bit);
}

fn aggregator_word(c: &mut Criterion) {
    bench_variant(c, "aggregator_word", FlashVariant::Word);
}

criterion_group!(benches, aggregator_bit, aggregator_word);
criterion_main!(benches);
