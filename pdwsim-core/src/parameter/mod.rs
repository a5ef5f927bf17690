//! Stochastic parameter models for per-pulse PRI, DOA, RF, PW and PA values.
//!
//! A [`ParameterSpec`] describes a parameter the way a configuration file
//! does: a scalar or list base value plus optional noise, grouping, jitter and
//! random-choice settings. [`ParameterSpec::build`] validates the settings,
//! resolves conflicting options, and selects one of four [`ParameterKind`]
//! models for the resulting [`ParameterStream`].

mod stream;

use rand_chacha::ChaCha8Rng;
use thiserror::Error;

pub use stream::{ParameterKind, ParameterStream};

/// Errors raised while validating a parameter description.
#[derive(Debug, Error)]
pub enum ParameterError {
    /// A list value with no entries
    #[error("Parameter value list is empty")]
    EmptyList,

    /// A value that is neither a number nor a list of numbers
    #[error("Expected a number or a list of numbers, found {found}")]
    UnsupportedValue {
        /// Description of the rejected value
        found: String,
    },

    /// NaN or infinite number
    #[error("Non-finite {field}: {value}")]
    NonFinite {
        /// Name of the offending field
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Negative Gaussian standard deviation
    #[error("Standard deviation must be non-negative, got {std}")]
    NegativeStd {
        /// Rejected standard deviation
        std: f64,
    },

    /// Group size of zero on a list value
    #[error("Group size must be at least 1")]
    ZeroGroupSize,

    /// Range description that expands to nothing usable
    #[error("Invalid value range: {reason}")]
    InvalidRange {
        /// Why the range was rejected
        reason: String,
    },
}

/// Largest number of entries a range value may expand to.
pub const MAX_RANGE_LEN: usize = 10_000_000;

/// Base value of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Single base value
    Scalar(f64),
    /// Ordered list of base values
    List(Vec<f64>),
}

impl ParameterValue {
    /// Expands `start, start + step, ...` while below `end`.
    ///
    /// The sequence is built by repeated addition, so the exact values match
    /// what an accumulating loop would produce.
    ///
    /// # Errors
    ///
    /// - `ParameterError::NonFinite` - A bound or the step is NaN or infinite
    /// - `ParameterError::InvalidRange` - Non-positive step, empty expansion,
    ///   more than [`MAX_RANGE_LEN`] entries, or a step lost to rounding
    pub fn range(start: f64, end: f64, step: f64) -> Result<Self, ParameterError> {
        for (field, value) in [("range start", start), ("range end", end), ("range step", step)]
        {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { field, value });
            }
        }
        if step <= 0.0 {
            return Err(ParameterError::InvalidRange {
                reason: format!("step must be positive, got {step}"),
            });
        }

        let span = ((end - start) / step).ceil();
        if span > MAX_RANGE_LEN as f64 {
            return Err(ParameterError::InvalidRange {
                reason: format!("[{start}, {end}) with step {step} exceeds {MAX_RANGE_LEN} values"),
            });
        }

        let mut values = Vec::new();
        let mut value = start;
        while value < end {
            values.push(value);
            let next = value + step;
            if next == value {
                return Err(ParameterError::InvalidRange {
                    reason: format!("step {step} is too small to advance from {value}"),
                });
            }
            value = next;
        }

        if values.is_empty() {
            return Err(ParameterError::InvalidRange {
                reason: format!("[{start}, {end}) with step {step} contains no values"),
            });
        }
        Ok(Self::List(values))
    }

    /// Smallest base value.
    pub fn min_value(&self) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::List(values) => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values)
    }
}

/// Unvalidated description of a parameter stream.
///
/// ```
/// use pdwsim_core::parameter::{ParameterKind, ParameterSpec};
/// use pdwsim_core::SeedSequence;
///
/// let mut seeds = SeedSequence::from_seed(7);
/// let mut stream = ParameterSpec::list(vec![10.0, 20.0])
///     .with_group_size(2)
///     .build(seeds.derive_rng())
///     .unwrap();
///
/// assert_eq!(stream.kind(), ParameterKind::Cyclic);
/// let draws: Vec<f64> = stream.by_ref().take(4).collect();
/// assert_eq!(draws, vec![10.0, 10.0, 20.0, 20.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Base value or values
    pub value: ParameterValue,
    /// Gaussian noise standard deviation
    pub std: Option<f64>,
    /// Consecutive repeats per list entry
    pub group_size: Option<usize>,
    /// Uniform jitter as a fraction of a scalar base value
    pub jitter_rate: Option<f64>,
    /// Pick list entries at random instead of cycling
    pub random: bool,
}

impl ParameterSpec {
    /// Creates a specification from any base value.
    pub fn new(value: impl Into<ParameterValue>) -> Self {
        Self {
            value: value.into(),
            std: None,
            group_size: None,
            jitter_rate: None,
            random: false,
        }
    }

    /// Creates a scalar specification.
    pub fn fixed(value: f64) -> Self {
        Self::new(ParameterValue::Scalar(value))
    }

    /// Creates a list specification.
    pub fn list(values: Vec<f64>) -> Self {
        Self::new(ParameterValue::List(values))
    }

    /// Sets Gaussian noise.
    pub fn with_std(mut self, std: f64) -> Self {
        self.std = Some(std);
        self
    }

    /// Sets the group size for list values.
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = Some(group_size);
        self
    }

    /// Sets uniform jitter for scalar values.
    pub fn with_jitter_rate(mut self, jitter_rate: f64) -> Self {
        self.jitter_rate = Some(jitter_rate);
        self
    }

    /// Enables random choice among list values.
    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    /// Returns true when draws can come out zero or negative.
    ///
    /// Used to flag PRI settings that break per-radar TOA monotonicity.
    pub fn may_yield_non_positive(&self) -> bool {
        let floor = self.value.min_value();
        if floor <= 0.0 {
            return true;
        }
        match (&self.value, self.jitter_rate) {
            (ParameterValue::Scalar(_), Some(rate)) => rate.abs() >= 1.0,
            (ParameterValue::List(_), _) if self.random => {
                // Noise walks across a random-choice group.
                let spread = (self.group_size.unwrap_or(1).max(1) as f64).sqrt();
                self.std.is_some_and(|std| 3.0 * std * spread >= floor)
            }
            _ => self.std.is_some_and(|std| 3.0 * std >= floor),
        }
    }

    /// Validates the specification and builds its stream.
    ///
    /// Conflicting options are resolved rather than rejected: jitter on a list
    /// value is ignored, jitter overrides noise on a scalar value, and random
    /// choice on a scalar value is ignored. Each resolution is logged as a
    /// warning.
    ///
    /// # Errors
    ///
    /// - `ParameterError::EmptyList` - List value without entries
    /// - `ParameterError::NonFinite` - NaN or infinite value, noise or jitter
    /// - `ParameterError::NegativeStd` - Negative noise standard deviation
    /// - `ParameterError::ZeroGroupSize` - Group size of zero on a list value
    pub fn build(&self, rng: ChaCha8Rng) -> Result<ParameterStream, ParameterError> {
        self.validate()?;

        match &self.value {
            ParameterValue::Scalar(value) => {
                if self.random {
                    tracing::warn!("Scalar value given, `random` will be ignored");
                }
                match self.jitter_rate {
                    Some(rate) => {
                        if self.std.is_some() {
                            tracing::warn!("`jitter_rate` given, `std` will be ignored");
                        }
                        Ok(ParameterStream::jittered(*value, rate, rng))
                    }
                    None => ParameterStream::fixed(*value, self.std, rng),
                }
            }
            ParameterValue::List(values) => {
                if self.jitter_rate.is_some() {
                    tracing::warn!("List value given, `jitter_rate` will be ignored");
                }
                let group_size = self.group_size.unwrap_or(1);
                if self.random {
                    ParameterStream::random_choice(values.clone(), group_size, self.std, rng)
                } else {
                    let expanded = values
                        .iter()
                        .flat_map(|&value| std::iter::repeat_n(value, group_size))
                        .collect();
                    ParameterStream::cyclic(expanded, self.std, rng)
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ParameterError> {
        match &self.value {
            ParameterValue::Scalar(value) => check_finite("value", *value)?,
            ParameterValue::List(values) => {
                if values.is_empty() {
                    return Err(ParameterError::EmptyList);
                }
                for value in values {
                    check_finite("value", *value)?;
                }
                if self.group_size == Some(0) {
                    return Err(ParameterError::ZeroGroupSize);
                }
            }
        }

        if let Some(std) = self.std {
            check_finite("std", std)?;
            if std < 0.0 {
                return Err(ParameterError::NegativeStd { std });
            }
        }
        if let Some(rate) = self.jitter_rate {
            check_finite("jitter_rate", rate)?;
        }
        Ok(())
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeedSequence;

    fn rng() -> ChaCha8Rng {
        SeedSequence::from_seed(99).derive_rng()
    }

    #[test]
    fn test_variant_selection() {
        let cases = [
            (ParameterSpec::fixed(10.0), ParameterKind::Fixed),
            (ParameterSpec::fixed(10.0).with_std(1.0), ParameterKind::Fixed),
            (ParameterSpec::fixed(10.0).with_jitter_rate(0.1), ParameterKind::Jittered),
            (ParameterSpec::list(vec![1.0, 2.0]), ParameterKind::Cyclic),
            (
                ParameterSpec::list(vec![1.0, 2.0]).with_random(true),
                ParameterKind::RandomChoice,
            ),
        ];

        for (spec, expected) in cases {
            assert_eq!(spec.build(rng()).unwrap().kind(), expected, "{spec:?}");
        }
    }

    #[test]
    fn test_conflicting_options_resolve() {
        // jitter beats std on scalars
        let mut jittered = ParameterSpec::fixed(10.0)
            .with_std(100.0)
            .with_jitter_rate(0.1)
            .build(rng())
            .unwrap();
        assert_eq!(jittered.kind(), ParameterKind::Jittered);
        assert!(jittered.by_ref().take(1000).all(|v| (9.0..=11.0).contains(&v)));

        // jitter ignored on lists
        let mut cyclic = ParameterSpec::list(vec![1.0, 2.0])
            .with_jitter_rate(0.5)
            .build(rng())
            .unwrap();
        assert_eq!(cyclic.kind(), ParameterKind::Cyclic);
        assert_eq!(cyclic.by_ref().take(4).collect::<Vec<_>>(), vec![1.0, 2.0, 1.0, 2.0]);

        // random ignored on scalars
        let fixed = ParameterSpec::fixed(3.0).with_random(true).build(rng()).unwrap();
        assert_eq!(fixed.kind(), ParameterKind::Fixed);
    }

    #[test]
    fn test_group_size_ignored_for_scalar() {
        let mut stream = ParameterSpec::fixed(5.0)
            .with_group_size(0)
            .build(rng())
            .unwrap();
        assert_eq!(stream.next_value(), 5.0);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            ParameterSpec::list(vec![]).build(rng()),
            Err(ParameterError::EmptyList)
        ));
        assert!(matches!(
            ParameterSpec::fixed(f64::NAN).build(rng()),
            Err(ParameterError::NonFinite { field: "value", .. })
        ));
        assert!(matches!(
            ParameterSpec::fixed(1.0).with_std(-1.0).build(rng()),
            Err(ParameterError::NegativeStd { .. })
        ));
        assert!(matches!(
            ParameterSpec::list(vec![1.0]).with_group_size(0).build(rng()),
            Err(ParameterError::ZeroGroupSize)
        ));
        assert!(matches!(
            ParameterSpec::fixed(1.0).with_jitter_rate(f64::INFINITY).build(rng()),
            Err(ParameterError::NonFinite { field: "jitter_rate", .. })
        ));
    }

    #[test]
    fn test_range_expansion() {
        assert_eq!(
            ParameterValue::range(10.0, 50.0, 10.0).unwrap(),
            ParameterValue::List(vec![10.0, 20.0, 30.0, 40.0])
        );
        assert_eq!(
            ParameterValue::range(1.0, 3.5, 1.0).unwrap(),
            ParameterValue::List(vec![1.0, 2.0, 3.0])
        );
        assert!(matches!(
            ParameterValue::range(5.0, 5.0, 1.0),
            Err(ParameterError::InvalidRange { .. })
        ));
        assert!(matches!(
            ParameterValue::range(0.0, 5.0, 0.0),
            Err(ParameterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_rejects_step_lost_to_rounding() {
        assert!(matches!(
            ParameterValue::range(1e20, 2e20, 1.0),
            Err(ParameterError::InvalidRange { .. })
        ));
        // Few entries, but 1e16 + 0.5 rounds back to 1e16.
        assert!(matches!(
            ParameterValue::range(1e16, 1e16 + 4.0, 0.5),
            Err(ParameterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_rejects_oversized_expansion() {
        assert!(matches!(
            ParameterValue::range(0.0, 1e12, 1e-3),
            Err(ParameterError::InvalidRange { .. })
        ));
        assert!(matches!(
            ParameterValue::range(0.0, MAX_RANGE_LEN as f64 + 1.0, 1.0),
            Err(ParameterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_non_positive_detection() {
        assert!(!ParameterSpec::fixed(10.0).may_yield_non_positive());
        assert!(!ParameterSpec::fixed(10.0).with_jitter_rate(0.5).may_yield_non_positive());
        assert!(ParameterSpec::fixed(10.0).with_jitter_rate(1.0).may_yield_non_positive());
        assert!(ParameterSpec::fixed(10.0).with_std(4.0).may_yield_non_positive());
        assert!(!ParameterSpec::fixed(10.0).with_std(1.0).may_yield_non_positive());
        assert!(ParameterSpec::list(vec![10.0, 0.0]).may_yield_non_positive());

        let grouped = ParameterSpec::list(vec![10.0, 12.0]).with_std(1.5);
        assert!(!grouped.clone().with_group_size(9).may_yield_non_positive());
        assert!(!grouped.clone().with_random(true).may_yield_non_positive());
        assert!(grouped.with_random(true).with_group_size(9).may_yield_non_positive());
    }
}
