// Duotrack - Beat and melody pattern player core
// Module declarations and logging bootstrap

pub mod config;
pub mod midi;
pub mod notes;
pub mod pattern;
pub mod playback;
pub mod state;

pub use config::{ConfigError, DuotrackConfig};
pub use midi::{export_midi, ConversionResult, MidiConverter, MidiExportOptions};
pub use notes::{classify_drum_voice, note_to_frequency, pitch_to_note_name, DrumVoice};
pub use pattern::{
    is_valid_pattern, normalize_pattern, timeline, validate_pattern, PatternItem, PatternKind,
    ValidationReport,
};
pub use playback::{calculate_pattern_duration, CommandLog, Scheduler, Synth, Transport};
pub use state::{JsonStore, Storage, StorageError};

/// Install an `env_logger` backend at `level`
///
/// `RUST_LOG` overrides the level. Safe to call more than once.
pub fn init_logging(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    if result.is_ok() {
        log::info!("Duotrack logging initialized at {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(log::LevelFilter::Debug);
        init_logging(log::LevelFilter::Warn);
    }

    #[test]
    fn test_midi_to_playback_flow() {
        let converted = MidiConverter::default().parse(&json!({
            "tempo": 100,
            "tracks": [{"notes": [
                {"pitch": 36, "time": 0, "duration": 0.5, "velocity": 100},
                {"pitch": 38, "time": 2, "duration": 0.5, "velocity": 100}
            ]}]
        }));
        assert!(converted.validate().is_valid());

        let beat = json!({ "bpm": converted.bpm, "pattern": converted.beat_pattern });
        assert!(is_valid_pattern(&beat, PatternKind::Beat));
        assert_eq!(calculate_pattern_duration(&beat), 2.5);

        let mut synth = CommandLog::new();
        let pass = Scheduler::default().schedule(&beat, 120.0, PatternKind::Beat, &mut synth);
        assert_eq!(pass.tempo.bpm, 100.0);
        assert_eq!(synth.hit_voices(), vec!["kick", "snare"]);
    }

    #[test]
    fn test_stored_pattern_plays() {
        let mut store = JsonStore::in_memory();
        let id = store
            .save_pattern(
                PatternKind::Melody,
                "arp",
                json!({"notes": [{"note": "C4", "dur": 1}, {"note": "rest", "dur": 0}, {"freq": 440, "dur": 1}]}),
            )
            .unwrap();
        let stored = store.get_pattern(&id).unwrap();

        let mut transport = Transport::new(CommandLog::new());
        let report = transport.play(&json!([]), &stored.pattern);
        assert_eq!(report.calls(), 2);
        assert_eq!(transport.synth().tone_frequencies(), vec![261.63, 440.0]);
    }
}
