//! Monophonic melody container and its pitch queries.
//!
//! A melody is one integer event per step: a MIDI pitch for a note onset,
//! [`NOTE_OFF`] to release the sounding note, or [`NO_EVENT`] to hold
//! whatever is playing (or keep silence).

use serde::{Deserialize, Serialize};
use tracing::debug;

pub type Event = i32;

/// Hold the current state for this step.
pub const NO_EVENT: Event = -2;
/// Release the sounding note.
pub const NOTE_OFF: Event = -1;
pub const NUM_SPECIAL_EVENTS: usize = 2;

pub const MIN_MIDI_PITCH: Event = 0;
pub const MAX_MIDI_PITCH: Event = 127;
pub const NOTES_PER_OCTAVE: usize = 12;

/// Semitone offsets of the major scale degrees from the tonic.
const MAJOR_SCALE: [usize; 7] = [0, 2, 4, 5, 7, 9, 11];

pub fn is_pitch(event: Event) -> bool {
    (MIN_MIDI_PITCH..=MAX_MIDI_PITCH).contains(&event)
}

/// Count of pitch events per pitch class. Sentinels are ignored.
pub fn note_histogram(events: &[Event]) -> [u32; NOTES_PER_OCTAVE] {
    let mut histogram = [0; NOTES_PER_OCTAVE];
    for &event in events.iter().filter(|&&e| is_pitch(e)) {
        histogram[event as usize % NOTES_PER_OCTAVE] += 1;
    }
    histogram
}

/// For each major key (index 0 = C), how many pitch events fall in its scale.
pub fn major_key_histogram(events: &[Event]) -> [u32; NOTES_PER_OCTAVE] {
    let notes = note_histogram(events);
    let mut keys = [0; NOTES_PER_OCTAVE];
    for (key, count) in keys.iter_mut().enumerate() {
        *count = MAJOR_SCALE
            .iter()
            .map(|degree| notes[(key + degree) % NOTES_PER_OCTAVE])
            .sum();
    }
    keys
}

/// Read-only view over a melody's events, possibly a prefix of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyView<'a> {
    events: &'a [Event],
}

impl<'a> MelodyView<'a> {
    pub fn new(events: &'a [Event]) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<Event> {
        self.events.last().copied()
    }

    /// The last `n` events, or all of them if the melody is shorter.
    pub fn last_n(&self, n: usize) -> &'a [Event] {
        &self.events[self.events.len().saturating_sub(n)..]
    }

    /// The melody as it was after its first `len` events.
    pub fn prefix(&self, len: usize) -> MelodyView<'a> {
        MelodyView::new(&self.events[..len.min(self.events.len())])
    }

    pub fn note_histogram(&self) -> [u32; NOTES_PER_OCTAVE] {
        note_histogram(self.events)
    }

    pub fn major_key_histogram(&self) -> [u32; NOTES_PER_OCTAVE] {
        major_key_histogram(self.events)
    }

    /// Best fitting major key; the lowest key wins ties.
    pub fn major_key(&self) -> usize {
        let histogram = self.major_key_histogram();
        let mut best = 0;
        for (key, &count) in histogram.iter().enumerate() {
            if count > histogram[best] {
                best = key;
            }
        }
        best
    }
}

impl<'a> From<&'a Melody> for MelodyView<'a> {
    fn from(melody: &'a Melody) -> Self {
        melody.view()
    }
}

/// An owned monophonic melody.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Melody {
    events: Vec<Event>,
}

impl Melody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn view(&self) -> MelodyView<'_> {
        MelodyView::new(&self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn last_n(&self, n: usize) -> &[Event] {
        self.view().last_n(n)
    }

    pub fn major_key_histogram(&self) -> [u32; NOTES_PER_OCTAVE] {
        self.view().major_key_histogram()
    }

    pub fn major_key(&self) -> usize {
        self.view().major_key()
    }

    /// Transpose into `transpose_to_key` and fit the melody into `[min_note, max_note)`.
    ///
    /// The melody is moved by whole octaves so its centre sits near the
    /// centre of the window, then any note still outside is folded back in
    /// by octaves. The window should span at least one octave. Returns the
    /// transposition applied before folding, in semitones.
    pub fn squash(&mut self, min_note: Event, max_note: Event, transpose_to_key: Event) -> Event {
        let key_diff = transpose_to_key - self.major_key() as Event;

        let pitches = self.events.iter().copied().filter(|&e| is_pitch(e));
        let (Some(lowest), Some(highest)) = (pitches.clone().min(), pitches.max()) else {
            return 0;
        };

        let octave = NOTES_PER_OCTAVE as Event;
        let melody_center = (lowest + highest).div_euclid(2);
        let target_center = (min_note + max_note - 1).div_euclid(2);
        let center_diff = target_center - (melody_center + key_diff);
        let transpose_amount =
            key_diff + octave * (center_diff as f64 / octave as f64).round() as Event;

        for event in self.events.iter_mut().filter(|e| is_pitch(**e)) {
            *event += transpose_amount;
            if *event < min_note {
                *event = min_note + (*event - min_note).rem_euclid(octave);
            } else if *event >= max_note {
                *event = max_note - octave + (*event - max_note).rem_euclid(octave);
            }
        }

        debug!(transpose_amount, key_diff, "squashed melody");
        transpose_amount
    }
}
