// Pattern types - Typed view over the beat/melody wire format
// Raw JSON is normalized and validated first; these types are what gets played

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used by both tracks for an explicit rest
pub const REST: &str = "rest";

/// Which track a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Percussion track: items carry `beat` or `beats`
    Beat,

    /// Melodic track: items carry `note`, `notes` or `freq`
    Melody,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Beat => "beat",
            PatternKind::Melody => "melody",
        }
    }

    /// Accepts the wire names and the storage collection names
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "beat" | "beats" => Some(PatternKind::Beat),
            "melody" | "melodies" => Some(PatternKind::Melody),
            _ => None,
        }
    }

    /// Primary keys an item of this kind may carry (exactly one must be present)
    pub fn primary_keys(&self) -> &'static [&'static str] {
        match self {
            PatternKind::Beat => &["beat", "beats"],
            PatternKind::Melody => &["note", "notes", "freq"],
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item volume: a scalar or a per-voice list, each expected in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    Single(f64),
    Many(Vec<f64>),
}

impl Volume {
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Volume::Single(v) => vec![*v],
            Volume::Many(values) => values.clone(),
        }
    }
}

impl From<f64> for Volume {
    fn from(v: f64) -> Self {
        Volume::Single(v)
    }
}

/// One event or rest in a pattern
///
/// A single struct covers both tracks; which primary field is meaningful
/// depends on the [`PatternKind`] it is read with (see [`PatternItem::sound`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beats: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<f64>,

    /// Duration in beats (quarter notes); 0 marks a logically absent item
    pub dur: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol: Option<Volume>,
}

/// The sound an item makes when read as a given kind
#[derive(Debug, Clone, PartialEq)]
pub enum Sound<'a> {
    Rest,
    Voice(&'a str),
    Voices(&'a [String]),
    Note(&'a str),
    Notes(&'a [String]),
    Freq(f64),
}

impl PatternItem {
    fn empty(dur: f64) -> Self {
        PatternItem {
            beat: None,
            beats: None,
            note: None,
            notes: None,
            freq: None,
            dur,
            vol: None,
        }
    }

    pub fn beat(voice: impl Into<String>, dur: f64) -> Self {
        PatternItem {
            beat: Some(voice.into()),
            ..Self::empty(dur)
        }
    }

    pub fn beats(voices: Vec<String>, dur: f64) -> Self {
        PatternItem {
            beats: Some(voices),
            ..Self::empty(dur)
        }
    }

    pub fn note(name: impl Into<String>, dur: f64) -> Self {
        PatternItem {
            note: Some(name.into()),
            ..Self::empty(dur)
        }
    }

    pub fn notes(names: Vec<String>, dur: f64) -> Self {
        PatternItem {
            notes: Some(names),
            ..Self::empty(dur)
        }
    }

    pub fn freq(hz: f64, dur: f64) -> Self {
        PatternItem {
            freq: Some(hz),
            ..Self::empty(dur)
        }
    }

    /// An explicit rest in the primary field of the given kind
    pub fn rest(kind: PatternKind, dur: f64) -> Self {
        match kind {
            PatternKind::Beat => Self::beat(REST, dur),
            PatternKind::Melody => Self::note(REST, dur),
        }
    }

    pub fn with_volume(mut self, vol: impl Into<Volume>) -> Self {
        self.vol = Some(vol.into());
        self
    }

    /// Lenient decode from raw JSON
    ///
    /// Wrongly typed optional fields are dropped rather than failing the item;
    /// an item without a numeric `dur` does not decode at all.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let dur = obj.get("dur")?.as_f64()?;

        let string_field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_owned);
        let strings_field = |key: &str| {
            obj.get(key).and_then(Value::as_array).map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
        };

        let vol = match obj.get("vol") {
            Some(Value::Number(n)) => n.as_f64().map(Volume::Single),
            Some(Value::Array(values)) => {
                Some(Volume::Many(values.iter().filter_map(Value::as_f64).collect()))
            }
            _ => None,
        };

        Some(PatternItem {
            beat: string_field("beat"),
            beats: strings_field("beats"),
            note: string_field("note"),
            notes: strings_field("notes"),
            freq: obj.get("freq").and_then(Value::as_f64),
            dur,
            vol,
        })
    }

    /// Resolve the kind-appropriate primary field
    ///
    /// Precedence follows field order: `beat` before `beats`;
    /// `note` before `notes` before `freq`.
    pub fn sound(&self, kind: PatternKind) -> Option<Sound<'_>> {
        match kind {
            PatternKind::Beat => {
                if let Some(beat) = &self.beat {
                    Some(if beat == REST { Sound::Rest } else { Sound::Voice(beat) })
                } else {
                    self.beats.as_deref().map(Sound::Voices)
                }
            }
            PatternKind::Melody => {
                if let Some(note) = &self.note {
                    Some(if note == REST { Sound::Rest } else { Sound::Note(note) })
                } else if let Some(notes) = &self.notes {
                    Some(Sound::Notes(notes))
                } else {
                    self.freq.map(Sound::Freq)
                }
            }
        }
    }

    /// Items with `dur == 0` are kept in storage but skipped everywhere else
    pub fn is_audible_duration(&self) -> bool {
        self.dur.is_finite() && self.dur > 0.0
    }
}
