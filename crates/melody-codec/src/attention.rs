//! Codec used by the attention melody model.
//!
//! Input layout, offsets relative to `note_range`:
//!
//! | offset      | signal                                              |
//! |-------------|-----------------------------------------------------|
//! | `[-nr, 0)`  | pitch of the sounding note, one-hot over the window |
//! | `0`         | a note is sounding                                  |
//! | `1`         | silence                                             |
//! | `2`         | the last event was the onset of the sounding note   |
//! | `3`         | melodic direction, +1 up, -1 down, 0 unknown        |
//! | `4`         | last event repeats the one a bar earlier            |
//! | `5`         | last event repeats the one two bars earlier         |
//! | `6..13`     | binary step counter, +1/-1 per bit                  |
//! | `13`        | the next step starts a bar                          |
//! | `14..26`    | major keys best fitting the whole melody            |
//! | `26..38`    | major keys best fitting the last 3 distinct pitches |
//!
//! Labels: `0..nr` note-on at `min_note + label`, then no-event, note-off,
//! repeat one bar ago, repeat two bars ago.

use std::collections::VecDeque;

use seqconf::CodecSettings;
use tracing::{debug, warn};

use crate::codec::{CodecConfig, CodecError, MelodyCodec};
use crate::melody::{
    major_key_histogram, Event, MelodyView, NOTES_PER_OCTAVE, NOTE_OFF, NO_EVENT,
    NUM_SPECIAL_EVENTS,
};

/// Melodies are assumed to be in 4/4 at four steps per beat.
pub const STEPS_PER_BAR: usize = 16;
pub const NUM_SPECIAL_INPUTS: usize = 14 + NOTES_PER_OCTAVE * 2;
pub const NUM_SPECIAL_CLASSES: usize = 2;
pub const NUM_BINARY_TIME_COUNTERS: usize = 7;

const ANY_NOTE: usize = 0;
const SILENCE: usize = 1;
const ONSET: usize = 2;
const DIRECTION: usize = 3;
const REPEAT_ONE_BAR: usize = 4;
const REPEAT_TWO_BARS: usize = 5;
const TIME_COUNTERS: usize = 6;
const BAR_START: usize = 13;
const MELODY_KEYS: usize = 14;
const RECENT_KEYS: usize = MELODY_KEYS + NOTES_PER_OCTAVE;

const RECENT_PITCHES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AttentionCodec {
    config: CodecConfig,
    note_range: usize,
}

impl AttentionCodec {
    pub fn new(config: CodecConfig) -> Self {
        debug!(
            min_note = config.min_note,
            max_note = config.max_note,
            transpose_to_key = config.transpose_to_key,
            "attention codec"
        );
        Self {
            note_range: config.note_range(),
            config,
        }
    }

    pub fn note_range(&self) -> usize {
        self.note_range
    }

    fn window_index(&self, pitch: Event) -> Option<usize> {
        let offset = pitch - self.config.min_note;
        (0..self.note_range as Event)
            .contains(&offset)
            .then_some(offset as usize)
    }

    fn repeat_one_bar_class(&self) -> usize {
        self.note_range + 2
    }

    fn repeat_two_bars_class(&self) -> usize {
        self.note_range + 3
    }
}

impl Default for AttentionCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl TryFrom<&CodecSettings> for AttentionCodec {
    type Error = CodecError;

    fn try_from(settings: &CodecSettings) -> Result<Self, Self::Error> {
        CodecConfig::try_from(settings).map(Self::new)
    }
}

/// Running state gathered by walking a melody from the start.
#[derive(Debug, Default)]
struct HistoryScan {
    sounding: Option<Event>,
    onset: bool,
    ascending: Option<bool>,
    /// Most recent distinct pitches, oldest first.
    recent: VecDeque<Event>,
}

impl HistoryScan {
    fn scan(events: &[Event]) -> Self {
        let mut state = Self::default();
        for &event in events {
            match event {
                NO_EVENT => state.onset = false,
                NOTE_OFF => {
                    state.sounding = None;
                    state.onset = false;
                }
                pitch => {
                    state.onset = true;
                    state.sounding = Some(pitch);
                    if let Some(&previous) = state.recent.back() {
                        if pitch > previous {
                            state.ascending = Some(true);
                        } else if pitch < previous {
                            state.ascending = Some(false);
                        }
                    }
                    state.recent.retain(|&p| p != pitch);
                    state.recent.push_back(pitch);
                    if state.recent.len() > RECENT_PITCHES {
                        state.recent.pop_front();
                    }
                }
            }
        }
        state
    }
}

/// Whether the last event equals the one `bars` bars before it.
fn repeats_bars_ago(events: &[Event], bars: usize) -> bool {
    let steps = bars * STEPS_PER_BAR;
    let len = events.len();
    len > steps && events[len - 1] == events[len - 1 - steps]
}

/// Event a bar-repeat class would copy when appended after `events`.
fn repeated_event(events: &[Event], bars: usize) -> Event {
    let steps = bars * STEPS_PER_BAR;
    if events.len() < steps {
        NO_EVENT
    } else {
        events[events.len() - steps]
    }
}

/// Set every slot whose key ties for the highest histogram count.
fn mark_best_keys(slots: &mut [f64], histogram: &[u32; NOTES_PER_OCTAVE]) {
    let best = histogram.iter().copied().max().unwrap_or_default();
    for (slot, &count) in slots.iter_mut().zip(histogram) {
        if count == best {
            *slot = 1.0;
        }
    }
}

impl MelodyCodec for AttentionCodec {
    fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn feature_size(&self) -> usize {
        self.note_range + NUM_SPECIAL_INPUTS
    }

    fn class_count(&self) -> usize {
        self.note_range + NUM_SPECIAL_EVENTS + NUM_SPECIAL_CLASSES
    }

    fn encode(&self, melody: MelodyView<'_>) -> Vec<f64> {
        let events = melody.events();
        let state = HistoryScan::scan(events);
        let base = self.note_range;
        let mut input = vec![0.0; self.feature_size()];

        match state.sounding {
            Some(pitch) => {
                if let Some(index) = self.window_index(pitch) {
                    input[index] = 1.0;
                }
                input[base + ANY_NOTE] = 1.0;
            }
            None => input[base + SILENCE] = 1.0,
        }

        if state.onset {
            input[base + ONSET] = 1.0;
        }

        if let Some(ascending) = state.ascending {
            input[base + DIRECTION] = if ascending { 1.0 } else { -1.0 };
        }

        if repeats_bars_ago(events, 1) {
            input[base + REPEAT_ONE_BAR] = 1.0;
        }
        if repeats_bars_ago(events, 2) {
            input[base + REPEAT_TWO_BARS] = 1.0;
        }

        // Metric position of the *next* event.
        let n = events.len();
        for bit in 0..NUM_BINARY_TIME_COUNTERS {
            input[base + TIME_COUNTERS + bit] = if (n >> bit) & 1 == 1 { 1.0 } else { -1.0 };
        }
        if n % STEPS_PER_BAR == 0 {
            input[base + BAR_START] = 1.0;
        }

        mark_best_keys(
            &mut input[base + MELODY_KEYS..base + RECENT_KEYS],
            &melody.major_key_histogram(),
        );

        let recent: Vec<Event> = state.recent.iter().copied().collect();
        mark_best_keys(
            &mut input[base + RECENT_KEYS..base + RECENT_KEYS + NOTES_PER_OCTAVE],
            &major_key_histogram(&recent),
        );

        input
    }

    fn label(&self, melody: MelodyView<'_>) -> usize {
        let events = melody.events();
        let last = melody.last().unwrap_or(NO_EVENT);

        // A held step early in the melody counts as a two-bar repeat.
        if (events.len() <= 2 * STEPS_PER_BAR && last == NO_EVENT) || repeats_bars_ago(events, 2)
        {
            return self.repeat_two_bars_class();
        }
        if repeats_bars_ago(events, 1) {
            return self.repeat_one_bar_class();
        }
        if last == NOTE_OFF {
            return self.note_range + 1;
        }
        if last == NO_EVENT {
            return self.note_range;
        }

        match self.window_index(last) {
            Some(index) => index,
            None => {
                warn!(
                    pitch = last,
                    min_note = self.config.min_note,
                    max_note = self.config.max_note,
                    "pitch outside codec window, clamping label"
                );
                if last < self.config.min_note {
                    0
                } else {
                    self.note_range - 1
                }
            }
        }
    }

    fn decode(&self, class_index: usize, melody: MelodyView<'_>) -> Event {
        let events = melody.events();
        if class_index == self.repeat_two_bars_class() {
            repeated_event(events, 2)
        } else if class_index == self.repeat_one_bar_class() {
            repeated_event(events, 1)
        } else if class_index == self.note_range + 1 {
            NOTE_OFF
        } else if class_index == self.note_range {
            NO_EVENT
        } else {
            self.config.min_note + class_index as Event
        }
    }
}
