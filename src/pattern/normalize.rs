// Pattern Normalizer - Decodes every accepted wire shape into {items, bpm}
// Shapes: bare array, or an object keyed by `pattern`, `beats` or `notes` (in that order)

use serde::Serialize;
use serde_json::Value;

use super::types::PatternItem;

/// Object key a keyed pattern carries its items under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKey {
    Pattern,
    Beats,
    Notes,
}

impl PatternKey {
    /// Extraction precedence for keyed objects
    pub const PRECEDENCE: [PatternKey; 3] = [PatternKey::Pattern, PatternKey::Beats, PatternKey::Notes];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKey::Pattern => "pattern",
            PatternKey::Beats => "beats",
            PatternKey::Notes => "notes",
        }
    }
}

/// The accepted wire shapes of a pattern, borrowed from the raw value
#[derive(Debug, Clone, PartialEq)]
pub enum WireShape<'a> {
    /// `[item, item, ...]`
    Bare(&'a [Value]),

    /// `{ "<key>": [item, ...], "bpm"?: number }`
    Keyed {
        key: PatternKey,
        items: &'a [Value],
        bpm: Option<&'a Value>,
    },

    /// Anything else: null, scalars, objects without an item array
    Unrecognized,
}

impl<'a> WireShape<'a> {
    /// Decode a raw value; only the first matching extraction path is taken
    pub fn decode(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => WireShape::Bare(items),
            Value::Object(map) => {
                let found = PatternKey::PRECEDENCE.into_iter().find_map(|key| {
                    map.get(key.as_str())
                        .and_then(Value::as_array)
                        .map(|items| (key, items))
                });

                match found {
                    Some((key, items)) => WireShape::Keyed {
                        key,
                        items,
                        // JSON null counts as absent
                        bpm: map.get("bpm").filter(|bpm| !bpm.is_null()),
                    },
                    None => WireShape::Unrecognized,
                }
            }
            _ => WireShape::Unrecognized,
        }
    }

    /// Extracted items (empty for unrecognized shapes)
    pub fn items(&self) -> &'a [Value] {
        match *self {
            WireShape::Bare(items) => items,
            WireShape::Keyed { items, .. } => items,
            WireShape::Unrecognized => &[],
        }
    }

    /// Raw bpm sibling, if the shape carries one
    pub fn bpm(&self) -> Option<&'a Value> {
        match *self {
            WireShape::Keyed { bpm, .. } => bpm,
            _ => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, WireShape::Unrecognized)
    }
}

/// Canonical `{items, bpm}` record produced from any wire shape
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedPattern {
    pub items: Vec<Value>,
    pub bpm: Option<Value>,
}

impl NormalizedPattern {
    /// The bpm as a number, when it is one
    pub fn bpm_number(&self) -> Option<f64> {
        self.bpm.as_ref().and_then(Value::as_f64)
    }

    /// Items that decode into typed form; undecodable ones are dropped
    pub fn typed_items(&self) -> Vec<PatternItem> {
        self.items.iter().filter_map(PatternItem::from_value).collect()
    }
}

impl From<WireShape<'_>> for NormalizedPattern {
    fn from(shape: WireShape<'_>) -> Self {
        NormalizedPattern {
            items: shape.items().to_vec(),
            bpm: shape.bpm().cloned(),
        }
    }
}

/// Extract `{items, bpm}` from any value purporting to be a pattern
///
/// Runs even when the extracted sequence is empty, so a wrapper's bpm is
/// always surfaced for validation.
pub fn normalize_pattern(value: &Value) -> NormalizedPattern {
    WireShape::decode(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let value = json!([{"beat": "kick", "dur": 1}]);
        let normalized = normalize_pattern(&value);
        assert_eq!(normalized.items.len(), 1);
        assert_eq!(normalized.bpm, None);
    }

    #[test]
    fn test_keyed_shapes() {
        for key in ["pattern", "beats", "notes"] {
            let value = json!({ key: [{"dur": 1}, {"dur": 2}], "bpm": 90 });
            let normalized = normalize_pattern(&value);
            assert_eq!(normalized.items.len(), 2, "key {}", key);
            assert_eq!(normalized.bpm_number(), Some(90.0));
        }
    }

    #[test]
    fn test_precedence_pattern_over_beats() {
        let value = json!({
            "notes": [{"note": "C4", "dur": 1}],
            "beats": [{"beat": "kick", "dur": 1}, {"beat": "snare", "dur": 1}],
            "pattern": [],
        });
        match WireShape::decode(&value) {
            WireShape::Keyed { key, items, .. } => {
                assert_eq!(key, PatternKey::Pattern);
                assert!(items.is_empty());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_non_array_key_falls_through() {
        let value = json!({"pattern": "oops", "beats": [{"beat": "kick", "dur": 1}]});
        match WireShape::decode(&value) {
            WireShape::Keyed { key, .. } => assert_eq!(key, PatternKey::Beats),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_empty_items_still_surface_bpm() {
        let normalized = normalize_pattern(&json!({"bpm": 350, "beats": []}));
        assert!(normalized.items.is_empty());
        assert_eq!(normalized.bpm_number(), Some(350.0));
    }

    #[test]
    fn test_unrecognized_inputs() {
        for value in [json!(null), json!("text"), json!(42), json!({"bpm": 120}), json!({})] {
            let shape = WireShape::decode(&value);
            assert!(!shape.is_recognized());
            let normalized = NormalizedPattern::from(shape);
            assert!(normalized.items.is_empty());
            assert_eq!(normalized.bpm, None);
        }
    }

    #[test]
    fn test_null_bpm_is_absent() {
        let normalized = normalize_pattern(&json!({"pattern": [], "bpm": null}));
        assert_eq!(normalized.bpm, None);
    }

    #[test]
    fn test_string_bpm_is_kept_raw() {
        let normalized = normalize_pattern(&json!({"pattern": [], "bpm": "fast"}));
        assert_eq!(normalized.bpm, Some(json!("fast")));
        assert_eq!(normalized.bpm_number(), None);
    }
}
