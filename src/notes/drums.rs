// Drum Voices - General MIDI percussion pitches mapped to named voices
// Used by the MIDI converter (pitch -> voice) and MIDI export (voice -> pitch)

use serde::{Deserialize, Serialize};

/// General MIDI note numbers for the canonical voice of each drum
pub const MIDI_KICK: u8 = 36; // C1
pub const MIDI_RIM: u8 = 37; // C#1
pub const MIDI_SNARE: u8 = 38; // D1
pub const MIDI_CLAP: u8 = 39; // D#1
pub const MIDI_LOW_TOM: u8 = 41; // F1
pub const MIDI_CLOSED_HIHAT: u8 = 42; // F#1
pub const MIDI_MID_TOM: u8 = 45; // A1
pub const MIDI_OPEN_HIHAT: u8 = 46; // A#1
pub const MIDI_HIGH_TOM: u8 = 48; // C2
pub const MIDI_CRASH: u8 = 49; // C#2
pub const MIDI_RIDE: u8 = 51; // D#2

/// Named percussion voice understood by the synthesis layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumVoice {
    Kick,
    Snare,
    Rim,
    Clap,
    Hihat,
    OpenHat,
    LowTom,
    MidTom,
    HighTom,
    Crash,
    Ride,
}

impl DrumVoice {
    /// Every voice, in General MIDI pitch order of its canonical note
    pub const ALL: [DrumVoice; 11] = [
        DrumVoice::Kick,
        DrumVoice::Rim,
        DrumVoice::Snare,
        DrumVoice::Clap,
        DrumVoice::LowTom,
        DrumVoice::Hihat,
        DrumVoice::MidTom,
        DrumVoice::OpenHat,
        DrumVoice::HighTom,
        DrumVoice::Crash,
        DrumVoice::Ride,
    ];

    /// Voice name as it appears in pattern `beat`/`beats` fields
    pub fn as_str(&self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::Rim => "rim",
            DrumVoice::Clap => "clap",
            DrumVoice::Hihat => "hihat",
            DrumVoice::OpenHat => "openhat",
            DrumVoice::LowTom => "lowtom",
            DrumVoice::MidTom => "midtom",
            DrumVoice::HighTom => "hightom",
            DrumVoice::Crash => "crash",
            DrumVoice::Ride => "ride",
        }
    }

    /// Look up a voice by its pattern name
    pub fn from_name(name: &str) -> Option<Self> {
        DrumVoice::ALL.into_iter().find(|voice| voice.as_str() == name)
    }

    /// Canonical General MIDI pitch for this voice
    pub fn midi_note(&self) -> u8 {
        match self {
            DrumVoice::Kick => MIDI_KICK,
            DrumVoice::Snare => MIDI_SNARE,
            DrumVoice::Rim => MIDI_RIM,
            DrumVoice::Clap => MIDI_CLAP,
            DrumVoice::Hihat => MIDI_CLOSED_HIHAT,
            DrumVoice::OpenHat => MIDI_OPEN_HIHAT,
            DrumVoice::LowTom => MIDI_LOW_TOM,
            DrumVoice::MidTom => MIDI_MID_TOM,
            DrumVoice::HighTom => MIDI_HIGH_TOM,
            DrumVoice::Crash => MIDI_CRASH,
            DrumVoice::Ride => MIDI_RIDE,
        }
    }
}

impl std::fmt::Display for DrumVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General-MIDI-inspired pitch table
const GM_DRUM_TABLE: &[(u8, DrumVoice)] = &[
    (35, DrumVoice::Kick),
    (36, DrumVoice::Kick),
    (37, DrumVoice::Rim),
    (38, DrumVoice::Snare),
    (39, DrumVoice::Clap),
    (40, DrumVoice::Snare),
    (41, DrumVoice::LowTom),
    (42, DrumVoice::Hihat),
    (43, DrumVoice::LowTom),
    (44, DrumVoice::Hihat),
    (45, DrumVoice::MidTom),
    (46, DrumVoice::OpenHat),
    (47, DrumVoice::MidTom),
    (48, DrumVoice::HighTom),
    (49, DrumVoice::Crash),
    (50, DrumVoice::HighTom),
    (51, DrumVoice::Ride),
    (52, DrumVoice::Crash),
    (53, DrumVoice::Ride),
    (55, DrumVoice::Crash),
    (57, DrumVoice::Crash),
    (59, DrumVoice::Ride),
];

/// One pitch -> voice row of a drum map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumMapEntry {
    pub pitch: u8,
    pub voice: DrumVoice,
}

/// Pitch -> voice lookup table used by the MIDI converter
///
/// Unmapped pitches resolve to the voice of the nearest mapped pitch;
/// on a tie the lower pitch wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumMap {
    pub entries: Vec<DrumMapEntry>,
}

impl Default for DrumMap {
    fn default() -> Self {
        DrumMap {
            entries: GM_DRUM_TABLE
                .iter()
                .map(|&(pitch, voice)| DrumMapEntry { pitch, voice })
                .collect(),
        }
    }
}

impl DrumMap {
    /// Classify a MIDI pitch into a drum voice
    pub fn classify(&self, pitch: u8) -> DrumVoice {
        nearest_voice(self.entries.iter().map(|e| (e.pitch, e.voice)), pitch)
    }
}

fn nearest_voice(entries: impl Iterator<Item = (u8, DrumVoice)>, pitch: u8) -> DrumVoice {
    let mut best: Option<(u8, u8, DrumVoice)> = None; // (distance, pitch, voice)

    for (entry_pitch, voice) in entries {
        let distance = entry_pitch.abs_diff(pitch);
        let better = match best {
            None => true,
            Some((best_distance, best_pitch, _)) => {
                distance < best_distance || (distance == best_distance && entry_pitch < best_pitch)
            }
        };
        if better {
            best = Some((distance, entry_pitch, voice));
        }
    }

    // An empty table has nothing closer than the kick
    best.map(|(_, _, voice)| voice).unwrap_or(DrumVoice::Kick)
}

/// Classify a MIDI pitch with the default General MIDI table
///
/// 36 -> kick, 38 -> snare, 42 -> hihat; unmapped pitches take the nearest voice.
pub fn classify_drum_voice(pitch: u8) -> DrumVoice {
    nearest_voice(GM_DRUM_TABLE.iter().copied(), pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_voices() {
        assert_eq!(classify_drum_voice(36), DrumVoice::Kick);
        assert_eq!(classify_drum_voice(38), DrumVoice::Snare);
        assert_eq!(classify_drum_voice(42), DrumVoice::Hihat);
        assert_eq!(classify_drum_voice(46), DrumVoice::OpenHat);
        assert_eq!(classify_drum_voice(39), DrumVoice::Clap);
    }

    #[test]
    fn test_unmapped_pitch_takes_nearest_voice() {
        // Below the table
        assert_eq!(classify_drum_voice(20), DrumVoice::Kick);
        // 54 sits between ride (53) and crash (55); lower pitch wins the tie
        assert_eq!(classify_drum_voice(54), DrumVoice::Ride);
        // Far above the table
        assert_eq!(classify_drum_voice(100), DrumVoice::Ride);
    }

    #[test]
    fn test_default_map_matches_free_function() {
        let map = DrumMap::default();
        for pitch in 0..=127u8 {
            assert_eq!(map.classify(pitch), classify_drum_voice(pitch));
        }
    }

    #[test]
    fn test_custom_map_overrides_table() {
        let map = DrumMap {
            entries: vec![DrumMapEntry { pitch: 60, voice: DrumVoice::Clap }],
        };
        assert_eq!(map.classify(36), DrumVoice::Clap);

        let empty = DrumMap { entries: Vec::new() };
        assert_eq!(empty.classify(60), DrumVoice::Kick);
    }

    #[test]
    fn test_voice_name_round_trip() {
        for voice in DrumVoice::ALL {
            assert_eq!(DrumVoice::from_name(voice.as_str()), Some(voice));
            assert_eq!(classify_drum_voice(voice.midi_note()), voice);
        }
        assert_eq!(DrumVoice::from_name("rest"), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DrumVoice::OpenHat).unwrap();
        assert_eq!(json, "\"openhat\"");
    }
}
