use serde::{Deserialize, Serialize};

/// A note snapped to the step grid.
///
/// `end` is always strictly greater than `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Note {
    pub pitch: i32,
    pub velocity: i32,
    pub start: i64,
    pub end: i64,
    pub instrument: i32,
    pub program: i32,
}

impl Note {
    pub fn duration_steps(&self) -> i64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: i32,
    pub denominator: i32,
}

impl TimeSignature {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Only power-of-two denominators describe a note value.
    pub fn has_valid_denominator(&self) -> bool {
        self.denominator > 0 && (self.denominator as u32).is_power_of_two()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A note as it arrives from the source material, timed in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNote {
    pub pitch: i32,
    pub velocity: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub instrument: i32,
    pub program: i32,
}

impl SourceNote {
    pub fn new(
        pitch: i32,
        velocity: i32,
        start_time: f64,
        end_time: f64,
        instrument: i32,
        program: i32,
    ) -> Self {
        Self {
            pitch,
            velocity,
            start_time,
            end_time,
            instrument,
            program,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f64,
}

/// Unquantized input: notes plus tempo and meter metadata.
///
/// Only the first tempo is used. At most one time signature is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteSequence {
    #[serde(default)]
    pub notes: Vec<SourceNote>,
    #[serde(default)]
    pub tempos: Vec<Tempo>,
    #[serde(default)]
    pub time_signatures: Vec<TimeSignature>,
}

impl NoteSequence {
    /// Append notes for one instrument, each given as `(pitch, velocity, start, end)`.
    pub fn add_track(&mut self, instrument: i32, notes: &[(i32, i32, f64, f64)]) {
        self.notes.extend(notes.iter().map(|&(pitch, velocity, start, end)| {
            SourceNote::new(pitch, velocity, start, end, instrument, 0)
        }));
    }
}
