// Note Utilities - Pitch names, frequencies, drum voices and volumes
// Shared by the validator, the MIDI converter and the scheduler

pub mod drums;
pub mod frequency;
pub mod volume;

pub use drums::{classify_drum_voice, DrumMap, DrumVoice};
pub use frequency::{
    frequency_to_nearest_pitch, midi_pitch_to_frequency, note_name_to_pitch, note_to_frequency,
    pitch_to_note_name,
};
pub use volume::{normalize_volume, voice_volume};
