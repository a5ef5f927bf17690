//! Infinite value streams for the four parameter models.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use super::ParameterError;

/// Model selected for a parameter stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Constant base value, optionally with Gaussian noise
    Fixed,
    /// Wrapping cycle through a list, optionally with Gaussian noise
    Cyclic,
    /// Base value with uniform jitter
    Jittered,
    /// Grouped random picks from a candidate list
    RandomChoice,
}

#[derive(Debug, Clone)]
enum Model {
    Fixed {
        value: f64,
        noise: Option<Normal<f64>>,
    },
    Cyclic {
        values: Vec<f64>,
        cursor: usize,
        noise: Option<Normal<f64>>,
    },
    Jittered {
        value: f64,
        bound: f64,
    },
    RandomChoice {
        candidates: Vec<f64>,
        group_size: usize,
        remaining: usize,
        current: f64,
        noise: Option<Normal<f64>>,
    },
}

/// Unbounded sequence of parameter values.
///
/// Each stream owns its generator, so draws on one stream never affect
/// another. As an [`Iterator`] it never returns `None`.
#[derive(Debug, Clone)]
pub struct ParameterStream {
    model: Model,
    rng: ChaCha8Rng,
}

fn noise_model(std: Option<f64>) -> Result<Option<Normal<f64>>, ParameterError> {
    std.map(|std| Normal::new(0.0, std).map_err(|_| ParameterError::NegativeStd { std }))
        .transpose()
}

impl ParameterStream {
    pub(super) fn fixed(
        value: f64,
        std: Option<f64>,
        rng: ChaCha8Rng,
    ) -> Result<Self, ParameterError> {
        Ok(Self {
            model: Model::Fixed {
                value,
                noise: noise_model(std)?,
            },
            rng,
        })
    }

    pub(super) fn cyclic(
        values: Vec<f64>,
        std: Option<f64>,
        rng: ChaCha8Rng,
    ) -> Result<Self, ParameterError> {
        if values.is_empty() {
            return Err(ParameterError::EmptyList);
        }
        Ok(Self {
            model: Model::Cyclic {
                values,
                cursor: 0,
                noise: noise_model(std)?,
            },
            rng,
        })
    }

    pub(super) fn jittered(value: f64, jitter_rate: f64, rng: ChaCha8Rng) -> Self {
        Self {
            model: Model::Jittered {
                value,
                bound: (value * jitter_rate).abs(),
            },
            rng,
        }
    }

    pub(super) fn random_choice(
        candidates: Vec<f64>,
        group_size: usize,
        std: Option<f64>,
        rng: ChaCha8Rng,
    ) -> Result<Self, ParameterError> {
        if candidates.is_empty() {
            return Err(ParameterError::EmptyList);
        }
        if group_size == 0 {
            return Err(ParameterError::ZeroGroupSize);
        }
        Ok(Self {
            model: Model::RandomChoice {
                candidates,
                group_size,
                remaining: 0,
                current: 0.0,
                noise: noise_model(std)?,
            },
            rng,
        })
    }

    /// Returns the model backing this stream.
    pub fn kind(&self) -> ParameterKind {
        match self.model {
            Model::Fixed { .. } => ParameterKind::Fixed,
            Model::Cyclic { .. } => ParameterKind::Cyclic,
            Model::Jittered { .. } => ParameterKind::Jittered,
            Model::RandomChoice { .. } => ParameterKind::RandomChoice,
        }
    }

    /// Draws the next value.
    pub fn next_value(&mut self) -> f64 {
        let rng = &mut self.rng;
        match &mut self.model {
            Model::Fixed { value, noise } => match noise {
                Some(noise) => *value + noise.sample(rng),
                None => *value,
            },
            Model::Cyclic {
                values,
                cursor,
                noise,
            } => {
                let base = values[*cursor];
                *cursor = (*cursor + 1) % values.len();
                match noise {
                    Some(noise) => base + noise.sample(rng),
                    None => base,
                }
            }
            Model::Jittered { value, bound } => *value + rng.random_range(-*bound..=*bound),
            Model::RandomChoice {
                candidates,
                group_size,
                remaining,
                current,
                noise,
            } => {
                if *remaining == 0 {
                    *current = candidates[rng.random_range(0..candidates.len())];
                    *remaining = *group_size;
                }
                *remaining -= 1;
                // Noise accumulates across the group.
                if let Some(noise) = noise {
                    *current += noise.sample(rng);
                }
                *current
            }
        }
    }
}

impl Iterator for ParameterStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
