//! Note records and step quantization.
//!
//! A [`NoteSequence`] holds notes timed in seconds plus tempo and time
//! signature metadata. [`QuantizedSequence::load`] snaps those times onto a
//! grid of `steps_per_beat` steps per beat and groups the notes by
//! instrument.
//!
//! ```
//! use note_seq::{NoteSequence, QuantizedSequence, SourceNote, Tempo};
//!
//! let sequence = NoteSequence {
//!     notes: vec![SourceNote::new(60, 100, 0.0, 0.5, 0, 0)],
//!     tempos: vec![Tempo { bpm: 120.0 }],
//!     time_signatures: vec![],
//! };
//! let quantized = QuantizedSequence::from_note_sequence(&sequence, 4).unwrap();
//! assert_eq!(quantized.track(0)[0].end, 4);
//! ```

pub mod note;
pub mod quantize;

pub use note::{Note, NoteSequence, SourceNote, Tempo, TimeSignature};
pub use quantize::{quantize_to_step, QuantizedSequence, QUANTIZE_CUTOFF};

/// Errors from quantizing a note sequence. All of them mean malformed input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("note sequence contains {count} time signatures, 0 or 1 expected")]
    MultipleTimeSignature { count: usize },

    #[error("denominator is not a power of 2: time signature {numerator}/{denominator}")]
    BadTimeSignature { numerator: i32, denominator: i32 },

    #[error("negative note time: start_step = {start_step}, end_step = {end_step}")]
    BadNote { start_step: i64, end_step: i64 },
}

pub type Result<T> = std::result::Result<T, Error>;
