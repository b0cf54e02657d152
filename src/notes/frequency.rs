// Note Frequencies - Scientific pitch notation, MIDI pitch and Hz conversions
// Equal temperament referenced to A4 = 440 Hz

/// Reference frequency for A4
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI pitch number of A4
pub const A4_PITCH: i32 = 69;

/// Pitch class names, sharps only (index = pitch % 12)
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offset of a natural note letter from C
fn letter_semitone(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Octave suffix: a single digit 0-9, or -1 for the lowest MIDI octave
fn parse_octave(suffix: &str) -> Option<i32> {
    if suffix == "-1" {
        return Some(-1);
    }

    let mut chars = suffix.chars();
    let digit = chars.next()?.to_digit(10)?;
    if chars.next().is_some() {
        return None;
    }
    Some(digit as i32)
}

/// Parse a scientific pitch name (`C4`, `C#4`, `Db4`, `C-1`) into a MIDI pitch
///
/// Returns None for malformed names and for names outside the MIDI range 0-127.
pub fn note_name_to_pitch(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let mut semitone = letter_semitone(chars.next()?)?;

    let rest = chars.as_str();
    let octave_suffix = if let Some(stripped) = rest.strip_prefix('#') {
        semitone += 1;
        stripped
    } else if let Some(stripped) = rest.strip_prefix('b') {
        semitone -= 1;
        stripped
    } else {
        rest
    };

    let octave = parse_octave(octave_suffix)?;
    let pitch = (octave + 1) * 12 + semitone;

    u8::try_from(pitch).ok().filter(|p| *p <= 127)
}

/// Exact equal-tempered frequency of a MIDI pitch
pub fn midi_pitch_to_frequency(pitch: u8) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf((pitch as i32 - A4_PITCH) as f64 / 12.0)
}

/// Convert a note name to its frequency in Hz, rounded to two decimals
///
/// `A4` -> 440.0, `C4` -> 261.63. Malformed or empty names yield None, never a panic.
pub fn note_to_frequency(name: &str) -> Option<f64> {
    let pitch = note_name_to_pitch(name)?;
    let frequency = midi_pitch_to_frequency(pitch);
    Some((frequency * 100.0).round() / 100.0)
}

/// Standard MIDI number to scientific name mapping (60 = "C4", 0 = "C-1")
pub fn pitch_to_note_name(pitch: u8) -> String {
    let pitch_class = PITCH_CLASS_NAMES[(pitch % 12) as usize];
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", pitch_class, octave)
}

/// Nearest MIDI pitch for an arbitrary frequency (used when exporting `freq` items)
pub fn frequency_to_nearest_pitch(frequency: f64) -> Option<u8> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }

    let pitch = A4_PITCH as f64 + 12.0 * (frequency / A4_FREQUENCY).log2();
    let rounded = pitch.round();
    if (0.0..=127.0).contains(&rounded) {
        Some(rounded as u8)
    } else {
        None
    }
}
