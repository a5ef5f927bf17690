//! Property tests over randomly shaped scenarios.

use pdwsim_core::{
    GenerationMode, ParameterSpec, Pdw, PulseMerger, RadarEmitter, SeedSequence, generate,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct RadarShape {
    start_toa: f64,
    pris: Vec<f64>,
    group_size: usize,
    jitter_rate: f64,
    doa: f64,
    loss_rate: Option<f64>,
}

fn radar_shape() -> impl Strategy<Value = RadarShape> {
    (
        0.0..50.0f64,
        prop::collection::vec(0.5..40.0f64, 1..4),
        1..4usize,
        0.0..0.9f64,
        0.0..360.0f64,
        prop::option::of(0.0..0.8f64),
    )
        .prop_map(
            |(start_toa, pris, group_size, jitter_rate, doa, loss_rate)| RadarShape {
                start_toa,
                pris,
                group_size,
                jitter_rate,
                doa,
                loss_rate,
            },
        )
}

// Jitter applies to scalar values only; lists exercise grouping instead.
fn pri_spec(shape: &RadarShape) -> ParameterSpec {
    match shape.pris.as_slice() {
        [single] => ParameterSpec::fixed(*single).with_jitter_rate(shape.jitter_rate),
        pris => ParameterSpec::list(pris.to_vec()).with_group_size(shape.group_size),
    }
}

fn build_merger(seed: u64, shapes: &[RadarShape]) -> PulseMerger {
    let mut seeds = SeedSequence::from_seed(seed);
    let mut merger = PulseMerger::new();
    for (id, shape) in shapes.iter().enumerate() {
        let radar = RadarEmitter::builder(id)
            .start_toa(shape.start_toa)
            .pri(pri_spec(shape))
            .doa(ParameterSpec::fixed(shape.doa).with_std(2.0))
            .rf(ParameterSpec::list(vec![2900.0, 3000.0, 3100.0]).with_random(true))
            .pw(ParameterSpec::fixed(1.0))
            .loss_rate(shape.loss_rate)
            .build(&mut seeds)
            .unwrap();
        merger.add(radar).unwrap();
    }
    merger
}

fn run(merger: &mut PulseMerger, count: usize) -> Vec<Pdw> {
    let mut pulses = Vec::new();
    generate(merger, GenerationMode::Count(count), &mut pulses).unwrap();
    pulses
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_positive_pri_output_is_sorted(
        seed in any::<u64>(),
        shapes in prop::collection::vec(radar_shape(), 1..6),
        count in 1..600usize,
    ) {
        let mut merger = build_merger(seed, &shapes);
        let pulses = run(&mut merger, count);

        prop_assert_eq!(pulses.len(), count);
        for pair in pulses.windows(2) {
            prop_assert!(pair[0].toa <= pair[1].toa);
            prop_assert!(pair[0] <= pair[1], "{:?} before {:?}", pair[0], pair[1]);
        }
        prop_assert_eq!(merger.ordering_violations(), 0);
    }

    #[test]
    fn test_each_radar_stream_is_increasing(
        seed in any::<u64>(),
        shapes in prop::collection::vec(radar_shape(), 1..5),
    ) {
        let mut merger = build_merger(seed, &shapes);
        let pulses = run(&mut merger, 400);

        for (id, shape) in shapes.iter().enumerate() {
            let toas: Vec<f64> = pulses
                .iter()
                .filter(|p| p.radar_id == id)
                .map(|p| p.toa)
                .collect();
            if let Some(&first) = toas.first() {
                prop_assert!(first > shape.start_toa);
            }
            prop_assert!(toas.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_pulses_are_conserved(
        seed in any::<u64>(),
        shapes in prop::collection::vec(radar_shape(), 1..6),
        count in 0..500usize,
    ) {
        let mut merger = build_merger(seed, &shapes);
        let pulses = run(&mut merger, count);

        let emitted: u64 = merger.radars().iter().map(|r| r.stats().emitted()).sum();
        prop_assert_eq!(emitted, pulses.len() as u64 + merger.pending_count() as u64);
    }
}
