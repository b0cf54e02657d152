// MIDI module - Conversion between MIDI note data and patterns
// Import: parsed note events -> beat/melody patterns. Export: patterns -> .mid bytes

pub mod convert;
pub mod export;
pub mod quantize;

pub use convert::{
    ConversionError, ConversionReport, ConversionResult, ConvertResult, ConvertedNote,
    ConverterConfig, MidiConverter, MidiInput, MidiNoteEvent, MidiTrack, TrackSummary,
};
pub use export::{export_midi, MidiExportError, MidiExportOptions, MidiExportResult};
pub use quantize::{quantize_duration, velocity_to_volume, volume_to_velocity};
