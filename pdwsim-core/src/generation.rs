//! Bounded pulse generation and CSV output.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::{PdwError, Result};
use crate::merger::PulseMerger;
use crate::pdw::Pdw;

/// Header line of the CSV output.
pub const CSV_HEADER: &str = "RadarID,TOA,DOA,RF,PW,PA";

/// How many pulses to pull from the merger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationMode {
    /// Exactly this many pulses
    Count(usize),
    /// Pulses while `toa` stays strictly below this ceiling
    UntilToa(f64),
}

impl GenerationMode {
    /// Checks that the mode terminates.
    ///
    /// # Errors
    ///
    /// - `PdwError::NonFiniteCeiling` - `UntilToa` ceiling is NaN or infinite
    pub fn validate(&self) -> Result<()> {
        match *self {
            GenerationMode::UntilToa(ceiling) if !ceiling.is_finite() => {
                Err(PdwError::NonFiniteCeiling(ceiling))
            }
            _ => Ok(()),
        }
    }
}

/// Destination for generated pulses.
pub trait PulseSink {
    /// Consumes one pulse.
    ///
    /// # Errors
    ///
    /// - `io::Error` - Underlying writer failed
    fn accept(&mut self, pulse: &Pdw) -> io::Result<()>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// - `io::Error` - Underlying writer failed
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PulseSink for Vec<Pdw> {
    fn accept(&mut self, pulse: &Pdw) -> io::Result<()> {
        self.push(*pulse);
        Ok(())
    }
}

/// Writes pulses as `RadarID,TOA,DOA,RF,PW,PA` rows.
///
/// Floats use the shortest representation that round-trips, always with a
/// decimal point (`10.0`, `22.5`, `-1.0`).
pub struct CsvPulseWriter<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> CsvPulseWriter<W> {
    /// Wraps a writer; the header is written before the first row.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{CSV_HEADER}")?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> PulseSink for CsvPulseWriter<W> {
    fn accept(&mut self, pulse: &Pdw) -> io::Result<()> {
        self.write_header()?;
        writeln!(
            self.writer,
            "{},{:?},{:?},{:?},{:?},{:?}",
            pulse.radar_id, pulse.toa, pulse.doa, pulse.rf, pulse.pw, pulse.pa
        )
    }

    fn finish(&mut self) -> io::Result<()> {
        // An empty run still gets a header.
        self.write_header()?;
        self.writer.flush()
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Seed of the run, when known
    pub seed: Option<u64>,
    /// Pulses handed to the sink
    pub pulses_written: u64,
    /// Pulses written per radar id
    pub pulses_per_radar: Vec<u64>,
    /// Pulses suppressed by each radar's loss model
    pub lost_per_radar: Vec<u64>,
    /// TOA of the first written pulse
    pub first_toa: Option<f64>,
    /// TOA of the last written pulse
    pub last_toa: Option<f64>,
    /// Merged pulses whose TOA went backwards
    pub ordering_violations: u64,
}

impl GenerationReport {
    /// Attaches the run's seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generates human-readable summary.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        match self.seed {
            Some(seed) => {
                let _ = writeln!(summary, "Generation Report (seed: {seed})");
            }
            None => summary.push_str("Generation Report\n"),
        }
        let _ = writeln!(summary, "Pulses written: {}", self.pulses_written);
        if let (Some(first), Some(last)) = (self.first_toa, self.last_toa) {
            let _ = writeln!(summary, "TOA span: {first} .. {last}");
        }

        summary.push_str("\nPer radar:\n");
        for (id, (written, lost)) in self
            .pulses_per_radar
            .iter()
            .zip(&self.lost_per_radar)
            .enumerate()
        {
            let _ = writeln!(summary, "  radar {id}: {written} written, {lost} lost");
        }

        if self.ordering_violations > 0 {
            let _ = writeln!(
                summary,
                "\nOrdering violations: {} (PRI draws went non-positive)",
                self.ordering_violations
            );
        }
        summary
    }
}

/// Pulls pulses from the merger into a sink until the mode's bound is reached.
///
/// In [`GenerationMode::UntilToa`] the first pulse at or beyond the ceiling
/// stops the run and is discarded.
///
/// # Errors
///
/// - `PdwError::NonFiniteCeiling` - `UntilToa` ceiling is NaN or infinite
/// - `PdwError::Merge` - The merger has no radars
/// - `PdwError::Io` - The sink failed
pub fn generate<S: PulseSink + ?Sized>(
    merger: &mut PulseMerger,
    mode: GenerationMode,
    sink: &mut S,
) -> Result<GenerationReport> {
    mode.validate()?;

    let mut pulses_per_radar = vec![0; merger.radar_count()];
    let mut first_toa = None;
    let mut last_toa = None;
    let mut pulses_written = 0u64;
    let violations_before = merger.ordering_violations();

    tracing::info!(?mode, radars = merger.radar_count(), "Starting pulse generation");

    loop {
        if let GenerationMode::Count(count) = mode {
            if pulses_written >= count as u64 {
                break;
            }
        }

        let pulse = merger.next_global_pulse()?;
        if let GenerationMode::UntilToa(ceiling) = mode {
            if pulse.toa >= ceiling {
                break;
            }
        }

        sink.accept(&pulse)?;
        pulses_per_radar[pulse.radar_id] += 1;
        first_toa.get_or_insert(pulse.toa);
        last_toa = Some(pulse.toa);
        pulses_written += 1;
    }
    sink.finish()?;

    let report = GenerationReport {
        seed: None,
        pulses_written,
        pulses_per_radar,
        lost_per_radar: merger.radars().iter().map(|r| r.stats().lost).collect(),
        first_toa,
        last_toa,
        ordering_violations: merger.ordering_violations() - violations_before,
    };
    tracing::info!(
        pulses = report.pulses_written,
        last_toa = ?report.last_toa,
        "Pulse generation finished"
    );
    Ok(report)
}
