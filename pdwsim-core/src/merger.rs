//! K-way, time-ordered merge across radar pulse streams.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use thiserror::Error;

use crate::emitter::RadarEmitter;
use crate::pdw::Pdw;

/// Errors raised by the merger.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Pulse requested before any radar was added
    #[error("No radars to merge; add at least one radar first")]
    EmptyMerger,

    /// Radar added after the working set was primed
    #[error("Cannot add radars once pulse generation has started")]
    AlreadyStarted,

    /// Radar id does not match its insertion position
    #[error("Radar id {found} does not match its position {expected}")]
    RadarIdMismatch {
        /// Position the radar would occupy
        expected: usize,
        /// Id carried by the radar
        found: usize,
    },
}

/// Merges independently running radars into one TOA-ordered pulse stream.
///
/// The working set holds exactly one pending pulse per radar. Every emitted
/// pulse is replaced by the next pulse of the same radar, so the merge costs
/// O(log R) per pulse and O(R) memory regardless of how many pulses are
/// drawn. Output is non-decreasing in TOA only when each radar's own pulse
/// train is; the merger does not sort beyond the working set. Decreasing TOAs
/// are counted and reported instead of being corrected.
#[derive(Debug, Default)]
pub struct PulseMerger {
    radars: Vec<RadarEmitter>,
    /// Pending pulses (min-heap by PDW order)
    pending: BinaryHeap<Reverse<Pdw>>,
    primed: bool,
    last_toa: Option<f64>,
    ordering_violations: u64,
}

impl PulseMerger {
    /// Creates an empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a merger over emitters whose ids match their positions.
    pub(crate) fn from_emitters(radars: Vec<RadarEmitter>) -> Self {
        debug_assert!(radars.iter().enumerate().all(|(i, r)| r.id() == i));
        Self {
            radars,
            ..Self::default()
        }
    }

    /// Appends a radar.
    ///
    /// # Errors
    ///
    /// - `MergeError::AlreadyStarted` - Generation has already begun
    /// - `MergeError::RadarIdMismatch` - Radar id differs from its position
    pub fn add(&mut self, radar: RadarEmitter) -> Result<(), MergeError> {
        if self.primed {
            return Err(MergeError::AlreadyStarted);
        }
        let expected = self.radars.len();
        if radar.id() != expected {
            return Err(MergeError::RadarIdMismatch {
                expected,
                found: radar.id(),
            });
        }
        self.radars.push(radar);
        Ok(())
    }

    /// Removes every radar and resets the working set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the number of radars.
    pub fn radar_count(&self) -> usize {
        self.radars.len()
    }

    /// Returns the radar with the given id.
    pub fn radar(&self, id: usize) -> Option<&RadarEmitter> {
        self.radars.get(id)
    }

    /// Returns all radars in id order.
    pub fn radars(&self) -> &[RadarEmitter] {
        &self.radars
    }

    /// Returns the number of pulses waiting in the working set.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns how many emitted pulses had a TOA below their predecessor.
    pub fn ordering_violations(&self) -> u64 {
        self.ordering_violations
    }

    /// Produces the next pulse in global TOA order.
    ///
    /// # Errors
    ///
    /// - `MergeError::EmptyMerger` - No radar has been added
    pub fn next_global_pulse(&mut self) -> Result<Pdw, MergeError> {
        if self.radars.is_empty() {
            return Err(MergeError::EmptyMerger);
        }
        if !self.primed {
            self.prime();
        }

        let Some(Reverse(pulse)) = self.pending.pop() else {
            return Err(MergeError::EmptyMerger);
        };
        let refill = self.radars[pulse.radar_id].next_pulse();
        self.pending.push(Reverse(refill));

        self.track_order(pulse.toa);
        Ok(pulse)
    }

    fn prime(&mut self) {
        self.pending = self
            .radars
            .iter_mut()
            .map(|radar| Reverse(radar.next_pulse()))
            .collect();
        self.primed = true;
        tracing::debug!(radars = self.radars.len(), "Merge working set primed");
    }

    fn track_order(&mut self, toa: f64) {
        if let Some(last) = self.last_toa {
            if toa < last {
                self.ordering_violations += 1;
                if self.ordering_violations == 1 {
                    tracing::warn!(
                        previous = last,
                        current = toa,
                        "Merged TOA went backwards; a radar's PRI draws are not all positive"
                    );
                }
            }
        }
        self.last_toa = Some(toa);
    }
}
