//! Single-radar pulse stream.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::ConfigError;
use crate::parameter::{ParameterError, ParameterSpec, ParameterStream};
use crate::pdw::Pdw;
use crate::rng::SeedSequence;

/// Amplitude reported when a radar has no PA configuration.
pub const DEFAULT_PA: f64 = -1.0;

/// Pulse counters for one radar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterStats {
    /// Pulses placed on the timing grid, lost or not
    pub scheduled: u64,
    /// Pulses suppressed by the loss model
    pub lost: u64,
}

impl EmitterStats {
    /// Pulses actually emitted.
    pub fn emitted(&self) -> u64 {
        self.scheduled - self.lost
    }

    /// Observed fraction of lost pulses.
    pub fn loss_fraction(&self) -> f64 {
        if self.scheduled == 0 {
            0.0
        } else {
            self.lost as f64 / self.scheduled as f64
        }
    }
}

/// Simulated radar producing an unbounded sequence of pulses.
///
/// The running clock starts at the configured offset and advances by one PRI
/// draw per scheduled pulse. Lost pulses still advance the clock, so losses
/// thin the pulse train without shifting the timing grid. PRI draws are used
/// as-is: a noisy PRI that comes out non-positive produces a TOA that goes
/// backwards.
#[derive(Debug, Clone)]
pub struct RadarEmitter {
    id: usize,
    start_toa: f64,
    clock: f64,
    pri: ParameterStream,
    doa: ParameterStream,
    rf: ParameterStream,
    pw: ParameterStream,
    pa: ParameterStream,
    loss_rate: Option<f64>,
    loss_rng: ChaCha8Rng,
    stats: EmitterStats,
}

impl RadarEmitter {
    /// Returns builder for the radar with the given id.
    pub fn builder(id: usize) -> RadarEmitterBuilder {
        RadarEmitterBuilder::new(id)
    }

    /// Returns the radar id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the configured start offset.
    pub fn start_toa(&self) -> f64 {
        self.start_toa
    }

    /// Returns the time of the most recently scheduled pulse.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Returns the configured loss probability.
    pub fn loss_rate(&self) -> Option<f64> {
        self.loss_rate
    }

    /// Returns pulse counters.
    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Produces the next pulse that survives the loss model.
    pub fn next_pulse(&mut self) -> Pdw {
        loop {
            self.clock += self.pri.next_value();
            let doa = self.doa.next_value();
            let rf = self.rf.next_value();
            let pw = self.pw.next_value();
            let pa = self.pa.next_value();
            self.stats.scheduled += 1;

            if let Some(rate) = self.loss_rate {
                if self.loss_rng.random::<f64>() < rate {
                    self.stats.lost += 1;
                    tracing::trace!(radar = self.id, toa = self.clock, "Pulse lost");
                    continue;
                }
            }

            return Pdw::new(self.clock, doa, rf, pw, pa, self.id);
        }
    }
}

impl Iterator for RadarEmitter {
    type Item = Pdw;

    fn next(&mut self) -> Option<Pdw> {
        Some(self.next_pulse())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Builder for [`RadarEmitter`].
///
/// PRI, DOA, RF and PW are required; PA defaults to a constant
/// [`DEFAULT_PA`].
#[derive(Debug, Clone)]
pub struct RadarEmitterBuilder {
    id: usize,
    start_toa: f64,
    pri: Option<ParameterSpec>,
    doa: Option<ParameterSpec>,
    rf: Option<ParameterSpec>,
    pw: Option<ParameterSpec>,
    pa: Option<ParameterSpec>,
    loss_rate: Option<f64>,
}

impl RadarEmitterBuilder {
    fn new(id: usize) -> Self {
        Self {
            id,
            start_toa: 0.0,
            pri: None,
            doa: None,
            rf: None,
            pw: None,
            pa: None,
            loss_rate: None,
        }
    }

    /// Sets the clock offset before the first PRI.
    pub fn start_toa(mut self, start_toa: f64) -> Self {
        self.start_toa = start_toa;
        self
    }

    /// Sets the pulse repetition interval model.
    pub fn pri(mut self, spec: ParameterSpec) -> Self {
        self.pri = Some(spec);
        self
    }

    /// Sets the direction of arrival model.
    pub fn doa(mut self, spec: ParameterSpec) -> Self {
        self.doa = Some(spec);
        self
    }

    /// Sets the carrier frequency model.
    pub fn rf(mut self, spec: ParameterSpec) -> Self {
        self.rf = Some(spec);
        self
    }

    /// Sets the pulse width model.
    pub fn pw(mut self, spec: ParameterSpec) -> Self {
        self.pw = Some(spec);
        self
    }

    /// Sets the pulse amplitude model.
    pub fn pa(mut self, spec: ParameterSpec) -> Self {
        self.pa = Some(spec);
        self
    }

    /// Sets the probability of suppressing each scheduled pulse.
    pub fn loss_rate(mut self, rate: Option<f64>) -> Self {
        self.loss_rate = rate;
        self
    }

    /// Validates the configuration and creates the emitter.
    ///
    /// Generators are drawn from `seeds` in a fixed order (PRI, DOA, RF, PW,
    /// PA, loss), so equal seeds give equal pulse trains.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` - PRI, DOA, RF or PW not set
    /// - `ConfigError::InvalidParameter` - A parameter or the start offset failed validation
    /// - `ConfigError::InvalidLossRate` - Loss rate outside `[0, 1)`
    pub fn build(self, seeds: &mut SeedSequence) -> Result<RadarEmitter, ConfigError> {
        let radar = self.id;

        if !self.start_toa.is_finite() {
            return Err(ConfigError::InvalidParameter {
                radar,
                parameter: "start_toa",
                source: ParameterError::NonFinite {
                    field: "start_toa",
                    value: self.start_toa,
                },
            });
        }
        if let Some(rate) = self.loss_rate {
            if !(0.0..1.0).contains(&rate) {
                return Err(ConfigError::InvalidLossRate { radar, value: rate });
            }
        }

        let pri_spec = self.pri.ok_or(ConfigError::MissingField {
            radar: Some(radar),
            field: "pri",
        })?;
        if pri_spec.may_yield_non_positive() {
            tracing::warn!(
                radar,
                "PRI settings can draw non-positive intervals; pulse TOAs may go backwards"
            );
        }

        let pri = build_stream(radar, "pri", &pri_spec, seeds)?;
        let doa = build_required(radar, "doa", self.doa, seeds)?;
        let rf = build_required(radar, "rf", self.rf, seeds)?;
        let pw = build_required(radar, "pw", self.pw, seeds)?;
        let pa_spec = self.pa.unwrap_or_else(|| ParameterSpec::fixed(DEFAULT_PA));
        let pa = build_stream(radar, "pa", &pa_spec, seeds)?;

        tracing::debug!(
            radar,
            start_toa = self.start_toa,
            loss_rate = ?self.loss_rate,
            pri = ?pri.kind(),
            rf = ?rf.kind(),
            "Radar emitter created"
        );

        Ok(RadarEmitter {
            id: radar,
            start_toa: self.start_toa,
            clock: self.start_toa,
            pri,
            doa,
            rf,
            pw,
            pa,
            loss_rate: self.loss_rate,
            loss_rng: seeds.derive_rng(),
            stats: EmitterStats::default(),
        })
    }
}

fn build_required(
    radar: usize,
    parameter: &'static str,
    spec: Option<ParameterSpec>,
    seeds: &mut SeedSequence,
) -> Result<ParameterStream, ConfigError> {
    let spec = spec.ok_or(ConfigError::MissingField {
        radar: Some(radar),
        field: parameter,
    })?;
    build_stream(radar, parameter, &spec, seeds)
}

fn build_stream(
    radar: usize,
    parameter: &'static str,
    spec: &ParameterSpec,
    seeds: &mut SeedSequence,
) -> Result<ParameterStream, ConfigError> {
    spec.build(seeds.derive_rng())
        .map_err(|source| ConfigError::InvalidParameter {
            radar,
            parameter,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_radar(id: usize, start_toa: f64, pri: f64) -> RadarEmitterBuilder {
        RadarEmitter::builder(id)
            .start_toa(start_toa)
            .pri(ParameterSpec::fixed(pri))
            .doa(ParameterSpec::fixed(30.0))
            .rf(ParameterSpec::fixed(1000.0))
            .pw(ParameterSpec::fixed(1.0))
    }

    #[test]
    fn test_clock_accumulates_pri() {
        let mut seeds = SeedSequence::from_seed(1);
        let mut radar = fixed_radar(1, 5.0, 17.0).build(&mut seeds).unwrap();

        let toas: Vec<f64> = radar.by_ref().take(4).map(|p| p.toa).collect();
        assert_eq!(toas, vec![22.0, 39.0, 56.0, 73.0]);
        assert_eq!(radar.clock(), 73.0);
    }

    #[test]
    fn test_pulse_fields() {
        let mut seeds = SeedSequence::from_seed(2);
        let mut radar = fixed_radar(3, 0.0, 10.0).build(&mut seeds).unwrap();

        let pulse = radar.next_pulse();
        assert_eq!(pulse, Pdw::new(10.0, 30.0, 1000.0, 1.0, DEFAULT_PA, 3));
    }

    #[test]
    fn test_pa_override() {
        let mut seeds = SeedSequence::from_seed(2);
        let mut radar = fixed_radar(0, 0.0, 10.0)
            .pa(ParameterSpec::list(vec![-40.0, -50.0]))
            .build(&mut seeds)
            .unwrap();

        let amplitudes: Vec<f64> = radar.by_ref().take(3).map(|p| p.pa).collect();
        assert_eq!(amplitudes, vec![-40.0, -50.0, -40.0]);
    }

    #[test]
    fn test_lost_pulses_keep_timing_grid() {
        let mut seeds = SeedSequence::from_seed(3);
        let mut radar = fixed_radar(0, 0.0, 10.0)
            .loss_rate(Some(0.5))
            .build(&mut seeds)
            .unwrap();

        for pulse in radar.by_ref().take(1_000) {
            assert_eq!(pulse.toa % 10.0, 0.0);
        }
        let stats = radar.stats();
        assert_eq!(stats.emitted(), 1_000);
        assert!(stats.lost > 0);
        assert_eq!(radar.clock(), stats.scheduled as f64 * 10.0);
    }

    #[test]
    fn test_zero_loss_rate_never_drops() {
        let mut seeds = SeedSequence::from_seed(4);
        let mut radar = fixed_radar(0, 0.0, 1.0)
            .loss_rate(Some(0.0))
            .build(&mut seeds)
            .unwrap();

        radar.by_ref().take(500).for_each(drop);
        assert_eq!(radar.stats().lost, 0);
        assert_eq!(radar.stats().scheduled, 500);
    }

    #[test]
    fn test_invalid_loss_rate() {
        let mut seeds = SeedSequence::from_seed(5);
        for rate in [1.0, -0.1, f64::NAN] {
            let result = fixed_radar(2, 0.0, 1.0)
                .loss_rate(Some(rate))
                .build(&mut seeds);
            assert!(
                matches!(result, Err(ConfigError::InvalidLossRate { radar: 2, .. })),
                "rate {rate}"
            );
        }
    }

    #[test]
    fn test_missing_parameter() {
        let mut seeds = SeedSequence::from_seed(6);
        let result = RadarEmitter::builder(4)
            .pri(ParameterSpec::fixed(10.0))
            .doa(ParameterSpec::fixed(0.0))
            .pw(ParameterSpec::fixed(1.0))
            .build(&mut seeds);

        assert!(matches!(
            result,
            Err(ConfigError::MissingField {
                radar: Some(4),
                field: "rf"
            })
        ));
    }

    #[test]
    fn test_invalid_parameter_names_field() {
        let mut seeds = SeedSequence::from_seed(7);
        let result = fixed_radar(1, 0.0, 10.0)
            .pw(ParameterSpec::list(vec![]))
            .build(&mut seeds);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                radar: 1,
                parameter: "pw",
                source: ParameterError::EmptyList
            })
        ));
    }

    #[test]
    fn test_noisy_pri_is_not_clamped() {
        let mut seeds = SeedSequence::from_seed(8);
        let mut radar = RadarEmitter::builder(0)
            .pri(ParameterSpec::fixed(1.0).with_std(5.0))
            .doa(ParameterSpec::fixed(0.0))
            .rf(ParameterSpec::fixed(0.0))
            .pw(ParameterSpec::fixed(0.0))
            .build(&mut seeds)
            .unwrap();

        let toas: Vec<f64> = radar.by_ref().take(200).map(|p| p.toa).collect();
        assert!(toas.windows(2).any(|w| w[1] < w[0]));
    }
}
