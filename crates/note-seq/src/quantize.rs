use crate::note::{Note, NoteSequence, SourceNote, Tempo, TimeSignature};
use crate::{Error, Result};
use seqconf::QuantizeSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Fraction of a step past which an event snaps to the following step.
///
/// With a cutoff of 0.5, an event in `(k - 0.5, k + 0.5]` steps lands on
/// step `k`, and an event exactly halfway between two steps takes the later
/// one.
pub const QUANTIZE_CUTOFF: f64 = 0.5;

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_STEPS_PER_BEAT: u32 = 4;

/// Snap a time in seconds to a step index.
pub fn quantize_to_step(seconds: f64, steps_per_second: f64) -> i64 {
    (seconds * steps_per_second + (1.0 - QUANTIZE_CUTOFF)).floor() as i64
}

/// Notes quantized to time steps, grouped into tracks by instrument.
///
/// Equality compares tracks as sets, so two sequences holding the same notes
/// in a different order are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizedSequence {
    pub tracks: BTreeMap<i32, Vec<Note>>,
    /// Kept so tempo can be recovered when converting back to real time.
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub steps_per_beat: u32,
}

impl Default for QuantizedSequence {
    fn default() -> Self {
        Self {
            tracks: BTreeMap::new(),
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::default(),
            steps_per_beat: DEFAULT_STEPS_PER_BEAT,
        }
    }
}

impl QuantizedSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantize `sequence` into a fresh value.
    pub fn from_note_sequence(sequence: &NoteSequence, steps_per_beat: u32) -> Result<Self> {
        let mut quantized = Self::new();
        quantized.load_sequence(sequence, steps_per_beat)?;
        Ok(quantized)
    }

    /// Quantize `sequence` using the configured step resolution.
    pub fn from_note_sequence_with(
        sequence: &NoteSequence,
        settings: &QuantizeSettings,
    ) -> Result<Self> {
        Self::from_note_sequence(sequence, settings.steps_per_beat)
    }

    pub fn load_sequence(&mut self, sequence: &NoteSequence, steps_per_beat: u32) -> Result<()> {
        self.load(
            &sequence.notes,
            &sequence.tempos,
            &sequence.time_signatures,
            steps_per_beat,
        )
    }

    /// Replace the contents of `self` with the quantized form of `notes`.
    ///
    /// A note's start and end times are snapped with [`quantize_to_step`].
    /// Notes that collapse to zero length are widened to one step. The
    /// first tempo sets the bpm (120 when absent) and the single time
    /// signature, if any, must have a power-of-two denominator.
    ///
    /// On error `self` is left in its empty default state.
    pub fn load(
        &mut self,
        notes: &[SourceNote],
        tempos: &[Tempo],
        time_signatures: &[TimeSignature],
        steps_per_beat: u32,
    ) -> Result<()> {
        self.reset();
        let result = self.populate(notes, tempos, time_signatures, steps_per_beat);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn populate(
        &mut self,
        notes: &[SourceNote],
        tempos: &[Tempo],
        time_signatures: &[TimeSignature],
        steps_per_beat: u32,
    ) -> Result<()> {
        self.steps_per_beat = steps_per_beat;

        if time_signatures.len() > 1 {
            return Err(Error::MultipleTimeSignature {
                count: time_signatures.len(),
            });
        }
        if let Some(ts) = time_signatures.first() {
            self.time_signature = *ts;
        }

        if !self.time_signature.has_valid_denominator() {
            return Err(Error::BadTimeSignature {
                numerator: self.time_signature.numerator,
                denominator: self.time_signature.denominator,
            });
        }

        self.bpm = tempos.first().map(|t| t.bpm).unwrap_or(DEFAULT_BPM);

        let steps_per_second = self.steps_per_second();

        let mut tracks: BTreeMap<i32, Vec<Note>> = BTreeMap::new();
        for note in notes {
            let start_step = quantize_to_step(note.start_time, steps_per_second);
            let mut end_step = quantize_to_step(note.end_time, steps_per_second);
            if end_step == start_step {
                end_step += 1;
            }

            // Do not allow notes to start or end in negative time.
            if start_step < 0 || end_step < 0 {
                return Err(Error::BadNote {
                    start_step,
                    end_step,
                });
            }

            tracks.entry(note.instrument).or_default().push(Note {
                pitch: note.pitch,
                velocity: note.velocity,
                start: start_step,
                end: end_step,
                instrument: note.instrument,
                program: note.program,
            });
        }

        debug!(
            notes = notes.len(),
            tracks = tracks.len(),
            bpm = self.bpm,
            steps_per_second,
            time_signature = %self.time_signature,
            "quantized note sequence"
        );

        self.tracks = tracks;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn steps_per_second(&self) -> f64 {
        self.steps_per_beat as f64 * self.bpm / 60.0
    }

    /// Steps in one bar under the current time signature.
    pub fn steps_per_bar(&self) -> i64 {
        self.time_signature.numerator as i64 * self.steps_per_beat as i64 * 4
            / self.time_signature.denominator as i64
    }

    /// Notes for `instrument`, empty if the track does not exist.
    pub fn track(&self, instrument: i32) -> &[Note] {
        self.tracks
            .get(&instrument)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn note_count(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    /// Append already-quantized notes, each given as `(pitch, velocity, start, end)`.
    pub fn add_track(&mut self, instrument: i32, notes: &[(i32, i32, i64, i64)]) {
        let track = self.tracks.entry(instrument).or_default();
        track.extend(notes.iter().map(|&(pitch, velocity, start, end)| Note {
            pitch,
            velocity,
            start,
            end,
            instrument,
            program: 0,
        }));
    }
}

impl PartialEq for QuantizedSequence {
    fn eq(&self, other: &Self) -> bool {
        self.bpm == other.bpm
            && self.time_signature == other.time_signature
            && self.steps_per_beat == other.steps_per_beat
            && self.tracks.len() == other.tracks.len()
            && self.tracks.iter().all(|(instrument, notes)| {
                other
                    .tracks
                    .get(instrument)
                    .is_some_and(|theirs| note_set(notes) == note_set(theirs))
            })
    }
}

fn note_set(notes: &[Note]) -> BTreeSet<&Note> {
    notes.iter().collect()
}
