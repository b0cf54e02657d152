// Pattern Validator - Musical and type validity checks over normalized patterns
// Never panics: every input, including null and scalars, yields a report

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::normalize::WireShape;
use super::types::PatternKind;

/// A single problem found in a pattern
///
/// Displays as the human-readable issue string and serializes as that string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("Pattern must be an array of items or an object with a 'pattern', 'beats' or 'notes' array")]
    NotAPattern,

    #[error("Item {}: must be an object", .index + 1)]
    ItemNotObject { index: usize },

    #[error("Item {}: missing {expected}", .index + 1)]
    MissingSound { index: usize, expected: &'static str },

    #[error("Item {}: only one of {expected} may be present", .index + 1)]
    ConflictingSound { index: usize, expected: &'static str },

    #[error("Item {}: '{key}' must be {requirement}", .index + 1)]
    InvalidSound {
        index: usize,
        key: &'static str,
        requirement: &'static str,
    },

    #[error("Item {}: missing 'dur'", .index + 1)]
    MissingDuration { index: usize },

    #[error("Item {}: 'dur' must be a number", .index + 1)]
    DurationNotNumber { index: usize },

    #[error("Item {}: 'dur' must be >= 0 (got {dur})", .index + 1)]
    NegativeDuration { index: usize, dur: f64 },

    #[error("Invalid BPM: {value}. Must be a number between {min} and {max}")]
    BpmNotNumber { value: String, min: f64, max: f64 },

    #[error("Invalid BPM: {bpm}. Must be a number between {min} and {max}")]
    BpmOutOfRange { bpm: f64, min: f64, max: f64 },
}

impl Serialize for ValidationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structured validation result; `is_valid` iff `issues` is empty
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        ValidationReport {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    /// Issue strings, as surfaced to the user
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Bounds applied to a pattern's embedded `bpm`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            min_bpm: 1.0,
            max_bpm: 300.0,
        }
    }
}

/// Pattern validator with configurable bpm bounds
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Validator { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a raw pattern of the given kind
    pub fn validate(&self, pattern: &Value, kind: PatternKind) -> ValidationReport {
        let shape = WireShape::decode(pattern);
        if !shape.is_recognized() {
            return ValidationReport::from_issues(vec![ValidationIssue::NotAPattern]);
        }

        let mut issues = Vec::new();

        // BPM validity is independent of item content, empty or not
        if let Some(bpm) = shape.bpm() {
            self.check_bpm(bpm, &mut issues);
        }

        for (index, item) in shape.items().iter().enumerate() {
            match item.as_object() {
                Some(obj) => check_item(index, obj, kind, &mut issues),
                None => issues.push(ValidationIssue::ItemNotObject { index }),
            }
        }

        log::debug!(
            "Validated {} pattern: {} items, {} issues",
            kind,
            shape.items().len(),
            issues.len()
        );

        ValidationReport::from_issues(issues)
    }

    /// Boolean form used by storage callers
    pub fn is_valid(&self, pattern: &Value, kind: PatternKind) -> bool {
        self.validate(pattern, kind).is_valid
    }

    fn check_bpm(&self, bpm: &Value, issues: &mut Vec<ValidationIssue>) {
        let (min, max) = (self.config.min_bpm, self.config.max_bpm);
        match bpm.as_f64() {
            Some(value) if value >= min && value <= max => {}
            Some(value) => issues.push(ValidationIssue::BpmOutOfRange { bpm: value, min, max }),
            None => issues.push(ValidationIssue::BpmNotNumber {
                value: bpm.to_string(),
                min,
                max,
            }),
        }
    }
}

fn describe_keys(kind: PatternKind) -> &'static str {
    match kind {
        PatternKind::Beat => "'beat' or 'beats'",
        PatternKind::Melody => "'note', 'notes' or 'freq'",
    }
}

fn check_item(
    index: usize,
    obj: &Map<String, Value>,
    kind: PatternKind,
    issues: &mut Vec<ValidationIssue>,
) {
    let present: Vec<&'static str> = kind
        .primary_keys()
        .iter()
        .copied()
        .filter(|key| obj.contains_key(*key))
        .collect();

    match present.as_slice() {
        [] => issues.push(ValidationIssue::MissingSound {
            index,
            expected: describe_keys(kind),
        }),
        [key] => {
            let key = *key;
            if let Some(requirement) = sound_requirement_violation(key, &obj[key]) {
                issues.push(ValidationIssue::InvalidSound {
                    index,
                    key,
                    requirement,
                });
            }
        }
        _ => issues.push(ValidationIssue::ConflictingSound {
            index,
            expected: describe_keys(kind),
        }),
    }

    // Duration problems never short-circuit the remaining items
    match obj.get("dur") {
        None => issues.push(ValidationIssue::MissingDuration { index }),
        Some(dur) => match dur.as_f64() {
            None => issues.push(ValidationIssue::DurationNotNumber { index }),
            Some(dur) if dur < 0.0 => issues.push(ValidationIssue::NegativeDuration { index, dur }),
            Some(_) => {}
        },
    }
}

/// Returns the violated requirement for a primary field value, if any
fn sound_requirement_violation(key: &str, value: &Value) -> Option<&'static str> {
    match key {
        "beat" | "note" => match value.as_str() {
            Some(name) if !name.is_empty() => None,
            _ => Some("a non-empty string"),
        },
        "beats" | "notes" => match value.as_array() {
            Some(names)
                if !names.is_empty()
                    && names
                        .iter()
                        .all(|name| name.as_str().is_some_and(|s| !s.is_empty())) =>
            {
                None
            }
            _ => Some("a non-empty array of strings"),
        },
        "freq" => match value.as_f64() {
            Some(hz) if hz.is_finite() && hz > 0.0 => None,
            _ => Some("a positive number"),
        },
        _ => None,
    }
}

/// Validate with the default bounds
pub fn validate_pattern(pattern: &Value, kind: PatternKind) -> ValidationReport {
    Validator::default().validate(pattern, kind)
}

/// Boolean validation with the default bounds
pub fn is_valid_pattern(pattern: &Value, kind: PatternKind) -> bool {
    validate_pattern(pattern, kind).is_valid
}
