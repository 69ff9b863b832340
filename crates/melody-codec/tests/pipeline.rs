//! Quantize raw notes, lay one track out as a melody, and run it through the codec.

use melody_codec::{AttentionCodec, Event, Melody, MelodyCodec, TrainingExample, NOTE_OFF, NO_EVENT};
use note_seq::{Note, NoteSequence, QuantizedSequence, Tempo};
use pretty_assertions::assert_eq;
use seqconf::SeqConfig;

/// One event per step: onsets win over the previous note's release.
fn melody_from_track(notes: &[Note]) -> Melody {
    let len = notes.iter().map(|n| n.end).max().unwrap_or(0) as usize + 1;
    let mut events: Vec<Event> = vec![NO_EVENT; len];
    for note in notes {
        events[note.end as usize] = NOTE_OFF;
    }
    for note in notes {
        events[note.start as usize] = note.pitch;
    }
    Melody::from_events(events)
}

/// Three identical bars of C D E F in quarter notes, then a short G.
fn riff() -> NoteSequence {
    let mut sequence = NoteSequence {
        tempos: vec![Tempo { bpm: 120.0 }],
        ..NoteSequence::default()
    };
    let mut notes = Vec::new();
    for bar in 0..3 {
        for (beat, pitch) in [60, 62, 64, 65].into_iter().enumerate() {
            let start = bar as f64 * 2.0 + beat as f64 * 0.5;
            notes.push((pitch, 100, start, start + 0.5));
        }
    }
    notes.push((67, 100, 6.0, 6.25));
    sequence.add_track(0, &notes);
    sequence
}

fn quantized_riff() -> Melody {
    let config = SeqConfig::default();
    let quantized = QuantizedSequence::from_note_sequence_with(&riff(), &config.quantize).unwrap();
    melody_from_track(quantized.track(0))
}

#[test]
fn quantized_riff_lays_out_on_the_bar_grid() {
    let melody = quantized_riff();
    assert_eq!(melody.len(), 51);
    assert_eq!(&melody.events()[..5], &[60, NO_EVENT, NO_EVENT, NO_EVENT, 62]);
    assert_eq!(melody.events()[16], 60);
    assert_eq!(melody.events()[48], 67);
    assert_eq!(melody.events()[50], NOTE_OFF);
}

#[test]
fn bar_repeats_are_labelled() {
    let codec = AttentionCodec::try_from(&SeqConfig::default().codec).unwrap();
    let melody = quantized_riff();
    let view = melody.view();
    let nr = codec.note_range();

    assert_eq!(codec.label(view.prefix(1)), 60 - 48);
    assert_eq!(codec.label(view.prefix(2)), nr + 3);
    assert_eq!(codec.label(view.prefix(17)), nr + 2);
    assert_eq!(codec.label(view.prefix(33)), nr + 3);
    assert_eq!(codec.label(view.prefix(49)), 67 - 48);
}

#[test]
fn every_step_decodes_back_to_its_event() {
    let codec = AttentionCodec::default();
    let melody = quantized_riff();
    let view = melody.view();

    for i in 1..melody.len() {
        let class = codec.label(view.prefix(i + 1));
        assert!(class < codec.class_count());
        assert_eq!(
            codec.decode(class, view.prefix(i)),
            melody.events()[i],
            "step {i} with class {class}"
        );
    }
}

#[test]
fn training_example_survives_json() {
    let codec = AttentionCodec::default();
    let melody = quantized_riff();
    let example = codec.encode_sequence(melody.view());

    assert_eq!(example.len(), melody.len() - 1);
    assert!(example
        .inputs
        .iter()
        .all(|input| input.len() == codec.feature_size()));

    let json = serde_json::to_string(&example).unwrap();
    let restored: TrainingExample = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, example);
}

#[test]
fn encoding_does_not_touch_the_melody() {
    let codec = AttentionCodec::default();
    let melody = quantized_riff();
    let before = melody.clone();
    for i in 1..=melody.len() {
        let _ = codec.encode(melody.view().prefix(i));
    }
    assert_eq!(melody, before);
}
