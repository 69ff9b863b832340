//! Feature encoding and class decoding of monophonic melodies.
//!
//! A [`MelodyCodec`] turns the state of a [`Melody`] into a fixed-width
//! input vector, labels its most recent event with a class index, and maps
//! a class index back to the event it stands for. [`AttentionCodec`] is the
//! codec used by the attention melody model.
//!
//! ```
//! use melody_codec::{AttentionCodec, Melody, MelodyCodec, NO_EVENT};
//!
//! let codec = AttentionCodec::default();
//! let melody = Melody::from_events(vec![60, NO_EVENT, 64]);
//!
//! let input = codec.encode(melody.view());
//! assert_eq!(input.len(), codec.feature_size());
//!
//! let class = codec.label(melody.view());
//! assert_eq!(codec.decode(class, melody.view().prefix(2)), 64);
//! ```

pub mod attention;
pub mod codec;
pub mod melody;

pub use attention::{AttentionCodec, STEPS_PER_BAR};
pub use codec::{CodecConfig, CodecError, MelodyCodec, TrainingExample};
pub use melody::{
    major_key_histogram, note_histogram, Event, Melody, MelodyView, MAX_MIDI_PITCH,
    MIN_MIDI_PITCH, NOTES_PER_OCTAVE, NOTE_OFF, NO_EVENT,
};
