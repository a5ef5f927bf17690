//! pdwsim Core - Synthetic radar pulse descriptor word generation.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! This crate synthesizes pulse trains for several simulated radars and
//! interleaves them into one time-ordered stream, as a passive receiver
//! watching all of them at once would see it. The output feeds pulse-sorting
//! and deinterleaving work that needs controllable, reproducible input.
//!
//! # Features
//!
//! - **Parameter Models**: Fixed, cyclic, jittered and grouped random-choice values
//! - **Pulse Loss**: Probabilistic suppression that keeps the timing grid intact
//! - **K-way Merge**: One pending pulse per radar, O(log R) per output pulse
//! - **Deterministic Execution**: Same seed always produces identical pulses
//! - **TOML Scenarios**: Radar definitions loaded from and saved to TOML
//!
//! # Example
//!
//! ```rust
//! use pdwsim_core::{
//!     GenerationMode, ParameterSpec, PulseMerger, RadarEmitter, SeedSequence, generate,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut seeds = SeedSequence::from_seed(12345);
//! let mut merger = PulseMerger::new();
//!
//! for (id, start, pri) in [(0, 0.0, 10.0), (1, 5.0, 17.0)] {
//!     let radar = RadarEmitter::builder(id)
//!         .start_toa(start)
//!         .pri(ParameterSpec::fixed(pri))
//!         .doa(ParameterSpec::fixed(45.0).with_std(0.5))
//!         .rf(ParameterSpec::list(vec![9000.0, 9100.0]).with_random(true))
//!         .pw(ParameterSpec::fixed(1.2))
//!         .build(&mut seeds)?;
//!     merger.add(radar)?;
//! }
//!
//! let mut pulses = Vec::new();
//! let report = generate(&mut merger, GenerationMode::UntilToa(100.0), &mut pulses)?;
//! assert!(pulses.windows(2).all(|w| w[0].toa <= w[1].toa));
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod emitter;
pub mod generation;
pub mod merger;
pub mod parameter;
pub mod pdw;
pub mod rng;
pub mod tracing_setup;

pub use config::{ConfigError, ParameterConfig, RadarConfig, ScenarioConfig};
pub use emitter::{EmitterStats, RadarEmitter, RadarEmitterBuilder};
pub use generation::{CsvPulseWriter, GenerationMode, GenerationReport, PulseSink, generate};
pub use merger::{MergeError, PulseMerger};
pub use parameter::{ParameterError, ParameterKind, ParameterSpec, ParameterStream, ParameterValue};
pub use pdw::Pdw;
pub use rng::SeedSequence;

/// Errors that can bubble up from any pdwsim subsystem.
#[derive(Debug, thiserror::Error)]
pub enum PdwError {
    /// Parameter validation failed
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Scenario configuration failed to load or validate
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Merge could not produce a pulse
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Time ceiling is NaN or infinite, so generation would never stop
    #[error("TOA ceiling must be finite, got {0}")]
    NonFiniteCeiling(f64),

    /// Output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdwError {
    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PdwError::Parameter(_)
                | PdwError::Config(_)
                | PdwError::NonFiniteCeiling(_)
                | PdwError::Merge(MergeError::EmptyMerger)
        )
    }
}

/// Result alias for pdwsim operations.
pub type Result<T> = std::result::Result<T, PdwError>;
