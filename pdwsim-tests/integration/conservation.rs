//! Pulse conservation and loss statistics.

use pdwsim_core::{
    GenerationMode, ParameterSpec, PulseMerger, RadarEmitter, SeedSequence, generate,
};

fn lossy_merger(seed: u64, loss_rates: &[Option<f64>]) -> PulseMerger {
    let mut seeds = SeedSequence::from_seed(seed);
    let mut merger = PulseMerger::new();
    for (id, &loss_rate) in loss_rates.iter().enumerate() {
        let radar = RadarEmitter::builder(id)
            .start_toa(id as f64)
            .pri(ParameterSpec::fixed(7.0 + 3.0 * id as f64).with_jitter_rate(0.2))
            .doa(ParameterSpec::fixed(10.0 * id as f64))
            .rf(ParameterSpec::fixed(1000.0))
            .pw(ParameterSpec::fixed(1.0))
            .loss_rate(loss_rate)
            .build(&mut seeds)
            .unwrap();
        merger.add(radar).unwrap();
    }
    merger
}

#[test]
fn test_merge_neither_drops_nor_duplicates() {
    let mut merger = lossy_merger(5, &[Some(0.25), None, Some(0.6)]);
    let mut pulses = Vec::new();
    let report = generate(&mut merger, GenerationMode::Count(5_000), &mut pulses).unwrap();

    let emitted: u64 = merger.radars().iter().map(|r| r.stats().emitted()).sum();
    assert_eq!(
        emitted,
        report.pulses_written + merger.pending_count() as u64
    );

    for radar in merger.radars() {
        let written = report.pulses_per_radar[radar.id()];
        // One pulse per radar waits in the working set.
        assert_eq!(radar.stats().emitted(), written + 1);
        assert_eq!(report.lost_per_radar[radar.id()], radar.stats().lost);
    }
    assert_eq!(report.lost_per_radar[1], 0);
}

#[test]
fn test_loss_rate_converges() {
    let p = 0.3;
    let mut merger = lossy_merger(17, &[Some(p)]);

    let mut pulses = Vec::new();
    while merger.radar(0).map_or(0, |r| r.stats().scheduled) < 100_000 {
        generate(&mut merger, GenerationMode::Count(1_000), &mut pulses).unwrap();
    }

    let stats = merger.radar(0).unwrap().stats();
    let n = stats.scheduled as f64;
    // Five standard errors of a binomial proportion.
    let tolerance = 5.0 * (p * (1.0 - p) / n).sqrt();
    assert!(
        (stats.loss_fraction() - p).abs() < tolerance,
        "observed {} over {} attempts",
        stats.loss_fraction(),
        stats.scheduled
    );
}

#[test]
fn test_losses_do_not_shift_timing_grid() {
    let mut seeds = SeedSequence::from_seed(3);
    let mut merger = PulseMerger::new();
    let radar = RadarEmitter::builder(0)
        .start_toa(2.5)
        .pri(ParameterSpec::fixed(4.0))
        .doa(ParameterSpec::fixed(0.0))
        .rf(ParameterSpec::fixed(0.0))
        .pw(ParameterSpec::fixed(0.0))
        .loss_rate(Some(0.5))
        .build(&mut seeds)
        .unwrap();
    merger.add(radar).unwrap();

    let mut pulses = Vec::new();
    generate(&mut merger, GenerationMode::Count(500), &mut pulses).unwrap();

    for pulse in &pulses {
        let slots = (pulse.toa - 2.5) / 4.0;
        assert_eq!(slots.fract(), 0.0, "toa {} off grid", pulse.toa);
    }
    let gaps = pulses.windows(2).filter(|w| w[1].toa - w[0].toa > 4.0).count();
    assert!(gaps > 0);
}
