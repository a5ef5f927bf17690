//! Two-radar reference scenario driven through the TOML layer.

use pdwsim_core::generation::CSV_HEADER;
use pdwsim_core::{CsvPulseWriter, GenerationMode, Pdw, ScenarioConfig, SeedSequence, generate};

const TWO_RADARS: &str = r#"
[[radar]]
start_toa = 0
pri = { value = 10 }
doa = { value = 45 }
rf = { value = 9000 }
pw = { value = 1.5 }

[[radar]]
start_toa = 5
pri = { value = 17 }
doa = { value = 120 }
rf = { value = 9400 }
pw = { value = 0.8 }
"#;

fn run(mode: GenerationMode) -> Vec<Pdw> {
    let config = ScenarioConfig::from_toml_str(TWO_RADARS).unwrap();
    let mut seeds = SeedSequence::from_seed(0);
    let mut merger = config.build_merger(&mut seeds).unwrap();

    let mut pulses = Vec::new();
    generate(&mut merger, mode, &mut pulses).unwrap();
    pulses
}

fn ids_and_toas(pulses: &[Pdw]) -> Vec<(usize, f64)> {
    pulses.iter().map(|p| (p.radar_id, p.toa)).collect()
}

#[test]
fn test_first_six_merged_pulses() {
    let pulses = run(GenerationMode::Count(6));

    assert_eq!(
        ids_and_toas(&pulses),
        vec![(0, 10.0), (0, 20.0), (1, 22.0), (0, 30.0), (1, 39.0), (0, 40.0)]
    );
}

#[test]
fn test_per_radar_arrival_grids() {
    let pulses = run(GenerationMode::Count(40));

    let radar0: Vec<f64> = pulses.iter().filter(|p| p.radar_id == 0).map(|p| p.toa).collect();
    let radar1: Vec<f64> = pulses.iter().filter(|p| p.radar_id == 1).map(|p| p.toa).collect();

    assert_eq!(radar0[..5], [10.0, 20.0, 30.0, 40.0, 50.0]);
    assert_eq!(radar1[..4], [22.0, 39.0, 56.0, 73.0]);
}

#[test]
fn test_time_ceiling_is_exclusive() {
    let below_forty = run(GenerationMode::UntilToa(40.0));
    assert_eq!(
        ids_and_toas(&below_forty),
        vec![(0, 10.0), (0, 20.0), (1, 22.0), (0, 30.0), (1, 39.0)]
    );

    let below_forty_one = run(GenerationMode::UntilToa(41.0));
    assert_eq!(below_forty_one.len(), 6);
    assert_eq!(below_forty_one.last().map(|p| p.toa), Some(40.0));
}

#[test]
fn test_ceiling_before_first_pulse_yields_nothing() {
    assert!(run(GenerationMode::UntilToa(10.0)).is_empty());
}

#[test]
fn test_csv_rows_for_scenario() {
    let config = ScenarioConfig::from_toml_str(TWO_RADARS).unwrap();
    let mut seeds = SeedSequence::from_seed(0);
    let mut merger = config.build_merger(&mut seeds).unwrap();
    let mut writer = CsvPulseWriter::new(Vec::new());

    generate(&mut merger, GenerationMode::Count(3), &mut writer).unwrap();

    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(
        text,
        format!(
            "{CSV_HEADER}\n0,10.0,45.0,9000.0,1.5,-1.0\n0,20.0,45.0,9000.0,1.5,-1.0\n1,22.0,120.0,9400.0,0.8,-1.0\n"
        )
    );
}
