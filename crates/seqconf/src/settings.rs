//! Configuration sections: quantization, codec window, and telemetry.

use serde::{Deserialize, Serialize};

/// How raw note times are discretized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizeSettings {
    /// Quantization steps per beat of music.
    /// Default: 4 (sixteenth notes in 4/4)
    #[serde(default = "QuantizeSettings::default_steps_per_beat")]
    pub steps_per_beat: u32,
}

impl QuantizeSettings {
    fn default_steps_per_beat() -> u32 {
        4
    }
}

impl Default for QuantizeSettings {
    fn default() -> Self {
        Self {
            steps_per_beat: Self::default_steps_per_beat(),
        }
    }
}

/// Pitch window and key normalization for the melody codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    /// Lowest encodable MIDI pitch (inclusive).
    /// Default: 48 (C3)
    #[serde(default = "CodecSettings::default_min_note")]
    pub min_note: i32,

    /// Upper MIDI pitch bound (exclusive).
    /// Default: 84 (C6)
    #[serde(default = "CodecSettings::default_max_note")]
    pub max_note: i32,

    /// Major key melodies are transposed to before encoding, 0 = C.
    #[serde(default)]
    pub transpose_to_key: i32,
}

impl CodecSettings {
    fn default_min_note() -> i32 {
        48
    }

    fn default_max_note() -> i32 {
        84
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            min_note: Self::default_min_note(),
            max_note: Self::default_max_note(),
            transpose_to_key: 0,
        }
    }
}

/// Logging configuration handed to whichever binary installs a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Default: "info"
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
