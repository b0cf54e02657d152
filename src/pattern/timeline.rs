// Pattern Timeline - Beat positions and labels for each audible item
// Pure layout computation; rendering is left to the caller

use serde::Serialize;
use serde_json::Value;

use super::normalize::normalize_pattern;
use super::types::{PatternItem, PatternKind, Sound, REST};

/// One visible block on a track lane
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Index of the item in the normalized pattern
    pub index: usize,
    pub label: String,
    pub start_beat: f64,
    pub dur: f64,
}

fn label_for(item: &PatternItem, kind: PatternKind) -> String {
    match item.sound(kind) {
        Some(Sound::Rest) => REST.to_string(),
        Some(Sound::Voice(name)) | Some(Sound::Note(name)) => name.to_string(),
        Some(Sound::Voices(names)) | Some(Sound::Notes(names)) => names.join("+"),
        Some(Sound::Freq(hz)) => format!("{}Hz", hz),
        None => "?".to_string(),
    }
}

/// Lay out a raw pattern on a beat grid
///
/// Zero-duration and undecodable items are omitted; a chord is one entry.
pub fn timeline(pattern: &Value, kind: PatternKind) -> Vec<TimelineEntry> {
    let normalized = normalize_pattern(pattern);
    let mut cursor = 0.0;
    let mut entries = Vec::new();

    for (index, raw) in normalized.items.iter().enumerate() {
        let Some(item) = PatternItem::from_value(raw) else {
            continue;
        };
        if !item.is_audible_duration() {
            continue;
        }

        entries.push(TimelineEntry {
            index,
            label: label_for(&item, kind),
            start_beat: cursor,
            dur: item.dur,
        });
        cursor += item.dur;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_duration_items_are_omitted() {
        let pattern = json!([
            {"beat": "kick", "dur": 1},
            {"beat": "snare", "dur": 0},
            {"beat": "hihat", "dur": 0.5}
        ]);
        let entries = timeline(&pattern, PatternKind::Beat);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].label, "hihat");
        assert_eq!(entries[1].index, 2);
        assert_eq!(entries[1].start_beat, 1.0);
    }

    #[test]
    fn test_chord_is_one_entry() {
        let pattern = json!({"beats": [
            {"beats": ["kick", "snare"], "dur": 1},
            {"beat": "rest", "dur": 1}
        ]});
        let entries = timeline(&pattern, PatternKind::Beat);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "kick+snare");
        assert_eq!(entries[1].label, "rest");
    }

    #[test]
    fn test_melody_labels() {
        let pattern = json!([
            {"note": "C4", "dur": 1},
            {"notes": ["C4", "E4", "G4"], "dur": 2},
            {"freq": 440, "dur": 0.5}
        ]);
        let labels: Vec<String> = timeline(&pattern, PatternKind::Melody)
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["C4", "C4+E4+G4", "440Hz"]);
    }

    #[test]
    fn test_unrecognized_pattern_is_empty() {
        assert!(timeline(&json!(null), PatternKind::Beat).is_empty());
        assert!(timeline(&json!({"foo": []}), PatternKind::Melody).is_empty());
    }
}
