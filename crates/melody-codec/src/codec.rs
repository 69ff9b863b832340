use crate::melody::{Event, Melody, MelodyView, MAX_MIDI_PITCH, MIN_MIDI_PITCH, NOTES_PER_OCTAVE};
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;
use seqconf::CodecSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MIN_NOTE: Event = 48;
pub const DEFAULT_MAX_NOTE: Event = 84;
pub const DEFAULT_TRANSPOSE_TO_KEY: Event = 0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid pitch window [{min_note}, {max_note})")]
    InvalidRange { min_note: Event, max_note: Event },

    #[error("transpose key {0} is not a pitch class 0-11")]
    InvalidKey(Event),

    #[error("expected {expected} class probabilities, got {actual}")]
    ClassCountMismatch { expected: usize, actual: usize },

    #[error("cannot sample from class probabilities: {0}")]
    BadDistribution(String),
}

/// Pitch window and key a codec works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Inclusive.
    pub min_note: Event,
    /// Exclusive.
    pub max_note: Event,
    pub transpose_to_key: Event,
}

impl CodecConfig {
    pub fn new(
        min_note: Event,
        max_note: Event,
        transpose_to_key: Event,
    ) -> Result<Self, CodecError> {
        if min_note < MIN_MIDI_PITCH || max_note > MAX_MIDI_PITCH + 1 || min_note >= max_note {
            return Err(CodecError::InvalidRange { min_note, max_note });
        }
        if !(0..NOTES_PER_OCTAVE as Event).contains(&transpose_to_key) {
            return Err(CodecError::InvalidKey(transpose_to_key));
        }
        Ok(Self {
            min_note,
            max_note,
            transpose_to_key,
        })
    }

    pub fn note_range(&self) -> usize {
        (self.max_note - self.min_note) as usize
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            min_note: DEFAULT_MIN_NOTE,
            max_note: DEFAULT_MAX_NOTE,
            transpose_to_key: DEFAULT_TRANSPOSE_TO_KEY,
        }
    }
}

impl TryFrom<&CodecSettings> for CodecConfig {
    type Error = CodecError;

    fn try_from(settings: &CodecSettings) -> Result<Self, Self::Error> {
        Self::new(
            settings.min_note,
            settings.max_note,
            settings.transpose_to_key,
        )
    }
}

/// Per-step model inputs with the label of the step that follows each one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub inputs: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl TrainingExample {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Maps melodies to model inputs and labels, and class indices back to events.
///
/// `label` and `decode` describe the melody's last event and assume the
/// melody is not empty.
pub trait MelodyCodec {
    fn config(&self) -> &CodecConfig;

    /// Length of the vector returned by [`MelodyCodec::encode`].
    fn feature_size(&self) -> usize;

    /// Number of distinct labels.
    fn class_count(&self) -> usize;

    /// Input vector describing the melody's current state.
    fn encode(&self, melody: MelodyView<'_>) -> Vec<f64>;

    /// Class of the melody's last event, in `0..class_count()`.
    fn label(&self, melody: MelodyView<'_>) -> usize;

    /// Event that `class_index` stands for if appended to `melody`.
    fn decode(&self, class_index: usize, melody: MelodyView<'_>) -> Event;

    /// Inputs for every prefix paired with the label of the event that follows it.
    fn encode_sequence(&self, melody: MelodyView<'_>) -> TrainingExample {
        let mut example = TrainingExample::default();
        for i in 1..melody.len() {
            example.inputs.push(self.encode(melody.prefix(i)));
            example.labels.push(self.label(melody.prefix(i + 1)));
        }
        example
    }

    /// Squash `melody` into this codec's window and key, then encode it.
    fn squash_and_encode(&self, melody: &mut Melody) -> TrainingExample {
        let config = *self.config();
        melody.squash(config.min_note, config.max_note, config.transpose_to_key);
        self.encode_sequence(melody.view())
    }

    /// Inputs for a batch of melodies being generated.
    ///
    /// With `full_length` every prefix of each melody is encoded, otherwise
    /// only the whole melody.
    fn inputs_batch(&self, melodies: &[Melody], full_length: bool) -> Vec<Vec<Vec<f64>>> {
        melodies
            .iter()
            .map(|melody| {
                let view = melody.view();
                if full_length {
                    (1..=view.len()).map(|i| self.encode(view.prefix(i))).collect()
                } else {
                    vec![self.encode(view)]
                }
            })
            .collect()
    }

    /// Draw a class from `probabilities`, decode it and append it to `melody`.
    fn extend_with_sample(
        &self,
        melody: &mut Melody,
        probabilities: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<Event, CodecError> {
        if probabilities.len() != self.class_count() {
            return Err(CodecError::ClassCountMismatch {
                expected: self.class_count(),
                actual: probabilities.len(),
            });
        }

        let distribution = WeightedIndex::new(probabilities)
            .map_err(|e| CodecError::BadDistribution(e.to_string()))?;
        let class_index = distribution.sample(rng);
        let event = self.decode(class_index, melody.view());
        melody.push(event);

        debug!(class_index, event, len = melody.len(), "extended melody");
        Ok(event)
    }
}
