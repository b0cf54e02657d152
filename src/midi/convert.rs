// MIDI Converter - Rebuild beat and melody patterns from parsed MIDI note events
// Events are sorted by time, gaps become rests, durations are quantized

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::quantize::{quantize_duration, velocity_to_volume};
use crate::notes::{pitch_to_note_name, DrumMap};
use crate::pattern::{PatternItem, PatternKind, ValidationReport, Validator};

/// Conversion errors
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("No MIDI data provided")]
    NoData,

    #[error("MIDI data must be an object")]
    NotAnObject,

    #[error("MIDI data has no 'tracks' array")]
    MissingTracks,

    #[error("Track {index} could not be decoded: {reason}")]
    InvalidTrack { index: usize, reason: String },

    #[error("Track {track}, note {note}: pitch {pitch} is outside 0-127")]
    PitchOutOfRange { track: usize, note: usize, pitch: u8 },

    #[error("Track {track}, note {note}: velocity {velocity} is outside 0-127")]
    VelocityOutOfRange { track: usize, note: usize, velocity: u8 },
}

pub type ConvertResult<T> = Result<T, ConversionError>;

/// A timestamped note event, in quarter-note units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiNoteEvent {
    pub pitch: u8,
    pub time: f64,
    pub duration: f64,
    pub velocity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidiTrack {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub notes: Vec<MidiNoteEvent>,
}

/// Already-parsed MIDI data: tracks of note events plus an optional tempo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidiInput {
    #[serde(default)]
    pub tempo: Option<f64>,

    pub tracks: Vec<MidiTrack>,
}

impl MidiInput {
    /// Decode raw JSON, rejecting anything without a `tracks` array
    pub fn from_value(value: &Value) -> ConvertResult<Self> {
        let obj = match value {
            Value::Null => return Err(ConversionError::NoData),
            Value::Object(obj) => obj,
            _ => return Err(ConversionError::NotAnObject),
        };

        let raw_tracks = obj
            .get("tracks")
            .and_then(Value::as_array)
            .ok_or(ConversionError::MissingTracks)?;

        let mut tracks = Vec::with_capacity(raw_tracks.len());
        for (index, raw) in raw_tracks.iter().enumerate() {
            let track = MidiTrack::deserialize(raw).map_err(|e| ConversionError::InvalidTrack {
                index,
                reason: e.to_string(),
            })?;

            for (note, event) in track.notes.iter().enumerate() {
                if event.pitch > 127 {
                    return Err(ConversionError::PitchOutOfRange {
                        track: index,
                        note,
                        pitch: event.pitch,
                    });
                }
                if event.velocity > 127 {
                    return Err(ConversionError::VelocityOutOfRange {
                        track: index,
                        note,
                        velocity: event.velocity,
                    });
                }
            }
            tracks.push(track);
        }

        Ok(MidiInput {
            // A non-numeric tempo is treated as absent
            tempo: obj.get("tempo").and_then(Value::as_f64),
            tracks,
        })
    }
}

/// Per-track overview of the input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    /// Track index (0-based)
    pub index: usize,
    pub name: Option<String>,
    pub note_count: usize,
    /// End of the last note, in beats
    pub duration_beats: f64,
}

/// One flattened input event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedNote {
    pub note: String,
    pub dur: f64,
    pub vol: f64,
    pub time: f64,
}

/// Everything a conversion produces
///
/// On failure `error` is set and every collection is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub tracks: Vec<TrackSummary>,
    pub notes: Vec<ConvertedNote>,
    pub beat_pattern: Vec<PatternItem>,
    pub melody_pattern: Vec<PatternItem>,
    pub bpm: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validation of both generated patterns
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub beat: ValidationReport,
    pub melody: ValidationReport,
}

impl ConversionReport {
    pub fn is_valid(&self) -> bool {
        self.beat.is_valid && self.melody.is_valid
    }
}

impl ConversionResult {
    fn failed(error: &ConversionError, bpm: f64) -> Self {
        ConversionResult {
            tracks: Vec::new(),
            notes: Vec::new(),
            beat_pattern: Vec::new(),
            melody_pattern: Vec::new(),
            bpm,
            error: Some(error.to_string()),
        }
    }

    /// Run the pattern validator over both generated patterns
    pub fn validate(&self) -> ConversionReport {
        let validator = Validator::default();
        ConversionReport {
            beat: validator.validate(
                &json!({ "pattern": self.beat_pattern, "bpm": self.bpm }),
                PatternKind::Beat,
            ),
            melody: validator.validate(
                &json!({ "pattern": self.melody_pattern, "bpm": self.bpm }),
                PatternKind::Melody,
            ),
        }
    }
}

/// Converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Used when the input carries no usable tempo
    pub default_bpm: f64,

    /// Quantization bounds, in beats
    pub min_duration: f64,
    pub max_duration: f64,

    /// Gaps up to this many beats are not turned into rests
    pub gap_tolerance: f64,

    pub drum_map: DrumMap,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            default_bpm: 120.0,
            min_duration: 0.25,
            max_duration: 4.0,
            gap_tolerance: 0.01,
            drum_map: DrumMap::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MidiConverter {
    config: ConverterConfig,
}

impl MidiConverter {
    pub fn new(config: ConverterConfig) -> Self {
        MidiConverter { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert raw JSON MIDI data; never panics
    pub fn parse(&self, input: &Value) -> ConversionResult {
        match MidiInput::from_value(input) {
            Ok(midi) => self.convert(&midi),
            Err(e) => {
                log::warn!("MIDI conversion failed: {}", e);
                ConversionResult::failed(&e, self.config.default_bpm)
            }
        }
    }

    /// Convert typed MIDI data
    pub fn convert(&self, input: &MidiInput) -> ConversionResult {
        // Out-of-range tempos are kept as given; validate() reports them
        let bpm = input
            .tempo
            .filter(|tempo| tempo.is_finite())
            .unwrap_or(self.config.default_bpm);

        let tracks = input
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| TrackSummary {
                index,
                name: track.name.clone(),
                note_count: track.notes.len(),
                duration_beats: track
                    .notes
                    .iter()
                    .map(|e| e.time + e.duration)
                    .fold(0.0, f64::max),
            })
            .collect();

        let events: Vec<&MidiNoteEvent> = input.tracks.iter().flat_map(|t| t.notes.iter()).collect();

        let notes = events
            .iter()
            .map(|event| ConvertedNote {
                note: pitch_to_note_name(event.pitch),
                dur: self.quantize(event.duration),
                vol: velocity_to_volume(event.velocity),
                time: event.time,
            })
            .collect();

        // Stable sort keeps input order for simultaneous events
        let mut sorted = events;
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

        let melody_pattern = self.build_pattern(&sorted, PatternKind::Melody, |event, dur| {
            PatternItem::note(pitch_to_note_name(event.pitch), dur)
        });
        let beat_pattern = self.build_pattern(&sorted, PatternKind::Beat, |event, dur| {
            PatternItem::beat(self.config.drum_map.classify(event.pitch).as_str(), dur)
        });

        log::debug!(
            "Converted {} MIDI events from {} tracks at {} bpm",
            sorted.len(),
            input.tracks.len(),
            bpm
        );

        ConversionResult {
            tracks,
            notes,
            beat_pattern,
            melody_pattern,
            bpm,
            error: None,
        }
    }

    fn quantize(&self, duration: f64) -> f64 {
        quantize_duration(duration, self.config.min_duration, self.config.max_duration)
    }

    /// Walk time-sorted events, filling gaps with rests of the raw gap length
    fn build_pattern<F>(&self, sorted: &[&MidiNoteEvent], kind: PatternKind, make_item: F) -> Vec<PatternItem>
    where
        F: Fn(&MidiNoteEvent, f64) -> PatternItem,
    {
        let mut items = Vec::with_capacity(sorted.len());
        let mut prev_end = 0.0;

        for &event in sorted {
            let gap = event.time - prev_end;
            if gap > self.config.gap_tolerance {
                items.push(PatternItem::rest(kind, gap));
            }

            items.push(
                make_item(event, self.quantize(event.duration))
                    .with_volume(velocity_to_volume(event.velocity)),
            );
            prev_end = event.time + event.duration;
        }

        items
    }
}
