// Playback Scheduler - Turns a pattern into timed synth calls
// Tempo resolution, zero-duration skipping and volume normalization happen here

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::synth::Synth;
use crate::notes::{normalize_volume, note_to_frequency, voice_volume};
use crate::pattern::{normalize_pattern, PatternItem, PatternKind, Sound};

/// Floor applied after the configured bounds
pub const MIN_PLAYABLE_TEMPO: f64 = 1.0;

/// Tempo bounds and fallback for playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Used when the requested tempo is not a finite number
    pub default_tempo: f64,
    pub min_tempo: f64,
    pub max_tempo: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            default_tempo: 120.0,
            min_tempo: 40.0,
            max_tempo: 300.0,
        }
    }
}

impl SchedulerConfig {
    /// Clamp a requested tempo into bounds, reporting whether it moved
    pub fn clamp_tempo(&self, requested: f64) -> TempoSetting {
        let requested = if requested.is_finite() { requested } else { self.default_tempo };
        // Playback needs a positive tempo whatever the configured bounds say
        let bpm = requested
            .max(self.min_tempo)
            .min(self.max_tempo)
            .max(MIN_PLAYABLE_TEMPO);
        TempoSetting {
            bpm,
            clamped: bpm != requested,
        }
    }
}

/// A tempo after clamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoSetting {
    pub bpm: f64,
    /// True when the requested value was outside bounds
    pub clamped: bool,
}

/// Outcome of scheduling one pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePass {
    pub tempo: TempoSetting,
    /// Synth calls issued
    pub calls: usize,
    pub duration_beats: f64,
    /// Offset just past the last played item
    pub end_offset_secs: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Scheduler { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Tempo a pass will run at: a positive pattern bpm overrides the caller's
    pub fn effective_tempo(&self, pattern_bpm: Option<f64>, tempo: f64) -> TempoSetting {
        let requested = pattern_bpm
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
            .unwrap_or(tempo);
        let setting = self.config.clamp_tempo(requested);
        if setting.clamped {
            log::warn!("Tempo {} out of range, clamped to {}", requested, setting.bpm);
        }
        setting
    }

    /// Schedule every playable item of a raw pattern on `synth`
    pub fn schedule<S: Synth + ?Sized>(
        &self,
        pattern: &Value,
        tempo: f64,
        kind: PatternKind,
        synth: &mut S,
    ) -> SchedulePass {
        let normalized = normalize_pattern(pattern);
        let setting = self.effective_tempo(normalized.bpm_number(), tempo);
        let seconds_per_beat = 60.0 / setting.bpm;

        let mut offset = 0.0;
        let mut calls = 0;
        let mut duration_beats = 0.0;

        for (index, raw) in normalized.items.iter().enumerate() {
            let Some(item) = PatternItem::from_value(raw) else {
                log::warn!("Skipping undecodable {} item {}", kind, index);
                continue;
            };
            if !item.is_audible_duration() {
                continue;
            }

            let duration_secs = item.dur * seconds_per_beat;
            let volumes = normalize_volume(item.vol.as_ref());
            calls += emit(&item, kind, offset, duration_secs, &volumes, synth);

            offset += duration_secs;
            duration_beats += item.dur;
        }

        log::debug!(
            "Scheduled {} pattern: {} calls over {:.3}s at {} bpm",
            kind,
            calls,
            offset,
            setting.bpm
        );

        SchedulePass {
            tempo: setting,
            calls,
            duration_beats,
            end_offset_secs: offset,
        }
    }
}

fn emit<S: Synth + ?Sized>(
    item: &PatternItem,
    kind: PatternKind,
    offset: f64,
    duration_secs: f64,
    volumes: &[f64],
    synth: &mut S,
) -> usize {
    match item.sound(kind) {
        Some(Sound::Voice(voice)) => {
            synth.schedule_hit(voice, offset, &[voice_volume(volumes, 0)]);
            1
        }
        Some(Sound::Voices(voices)) => {
            for (i, voice) in voices.iter().enumerate() {
                synth.schedule_hit(voice, offset, &[voice_volume(volumes, i)]);
            }
            voices.len()
        }
        Some(Sound::Note(name)) => {
            emit_tone(note_to_frequency(name), offset, duration_secs, voice_volume(volumes, 0), synth)
        }
        Some(Sound::Notes(names)) => names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                emit_tone(note_to_frequency(name), offset, duration_secs, voice_volume(volumes, i), synth)
            })
            .sum(),
        Some(Sound::Freq(hz)) => emit_tone(Some(hz), offset, duration_secs, voice_volume(volumes, 0), synth),
        // Rests and items without a sound for this track only take up time
        Some(Sound::Rest) | None => 0,
    }
}

/// Unknown note names resolve to `None` and schedule nothing
fn emit_tone<S: Synth + ?Sized>(
    freq: Option<f64>,
    offset: f64,
    duration_secs: f64,
    volume: f64,
    synth: &mut S,
) -> usize {
    match freq {
        Some(hz) if hz.is_finite() && hz > 0.0 => {
            synth.schedule_tone(hz, offset, duration_secs, &[volume]);
            1
        }
        _ => 0,
    }
}

/// Total length of a pattern in beats: the sum of every positive numeric `dur`
pub fn calculate_pattern_duration(pattern: &Value) -> f64 {
    normalize_pattern(pattern)
        .items
        .iter()
        .filter_map(|item| item.get("dur").and_then(Value::as_f64))
        .filter(|dur| *dur > 0.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::synth::{CommandLog, SynthCommand};
    use serde_json::json;

    fn offsets(log: &CommandLog) -> Vec<f64> {
        log.commands().iter().filter_map(SynthCommand::offset_secs).collect()
    }

    #[test]
    fn test_zero_duration_items_are_skipped() {
        let pattern = json!([
            {"beat": "kick", "dur": 1},
            {"beat": "snare", "dur": 0},
            {"beat": "hihat", "dur": 0.5}
        ]);
        let mut log = CommandLog::new();
        let pass = Scheduler::default().schedule(&pattern, 120.0, PatternKind::Beat, &mut log);

        assert_eq!(pass.calls, 2);
        assert_eq!(log.hit_voices(), vec!["kick", "hihat"]);
        assert_eq!(offsets(&log), vec![0.0, 0.5]);
        assert_eq!(pass.duration_beats, 1.5);
        assert_eq!(calculate_pattern_duration(&pattern), 1.5);
    }

    #[test]
    fn test_rests_advance_the_cursor() {
        let pattern = json!({"beats": [
            {"beat": "rest", "dur": 2},
            {"beats": ["kick", "snare"], "dur": 1, "vol": [0.5, 0.9]}
        ]});
        let mut log = CommandLog::new();
        let pass = Scheduler::default().schedule(&pattern, 60.0, PatternKind::Beat, &mut log);

        assert_eq!(pass.calls, 2);
        assert_eq!(offsets(&log), vec![2.0, 2.0]);
        assert_eq!(pass.end_offset_secs, 3.0);
        let volumes: Vec<Vec<f64>> = log
            .commands()
            .iter()
            .filter_map(|command| match command {
                SynthCommand::Hit { volumes, .. } => Some(volumes.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(volumes, vec![vec![0.5], vec![0.9]]);
    }

    #[test]
    fn test_chord_voices_get_their_own_volume() {
        let pattern = json!([
            {"beats": ["kick", "snare"], "dur": 1, "vol": [0.2, 0.9]},
            {"beats": ["kick", "snare", "hihat"], "dur": 1, "vol": [0.3, 0.6]},
            {"notes": ["C4", "E4"], "dur": 1, "vol": 0.4}
        ]);
        let mut log = CommandLog::new();
        Scheduler::default().schedule(&pattern, 120.0, PatternKind::Beat, &mut log);
        Scheduler::default().schedule(&pattern, 120.0, PatternKind::Melody, &mut log);

        let volumes: Vec<Vec<f64>> = log
            .commands()
            .iter()
            .filter_map(|command| match command {
                SynthCommand::Hit { volumes, .. } | SynthCommand::Tone { volumes, .. } => {
                    Some(volumes.clone())
                }
                _ => None,
            })
            .collect();
        // A short list falls back to its first entry; a scalar applies to every voice
        assert_eq!(
            volumes,
            vec![
                vec![0.2],
                vec![0.9],
                vec![0.3],
                vec![0.6],
                vec![0.3],
                vec![0.4],
                vec![0.4]
            ]
        );
    }

    #[test]
    fn test_melody_notes_and_freq() {
        let pattern = json!([
            {"note": "A4", "dur": 1},
            {"note": "X9", "dur": 1},
            {"notes": ["C4", "E4"], "dur": 1},
            {"note": "rest", "dur": 1},
            {"freq": 100, "dur": 2, "vol": 0.4}
        ]);
        let mut log = CommandLog::new();
        let pass = Scheduler::default().schedule(&pattern, 120.0, PatternKind::Melody, &mut log);

        assert_eq!(pass.calls, 4);
        assert_eq!(log.tone_frequencies(), vec![440.0, 261.63, 329.63, 100.0]);
        // The unknown note and the rest each still took their half second
        assert_eq!(offsets(&log), vec![0.0, 1.0, 1.0, 2.0]);
        assert_eq!(pass.end_offset_secs, 3.0);
        match log.commands().last() {
            Some(SynthCommand::Tone { duration_secs, volumes, .. }) => {
                assert_eq!(*duration_secs, 1.0);
                assert_eq!(volumes, &vec![0.4]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_volume_defaults_to_full() {
        let mut log = CommandLog::new();
        Scheduler::default().schedule(&json!([{"beat": "kick", "dur": 1}]), 120.0, PatternKind::Beat, &mut log);
        match &log.commands()[0] {
            SynthCommand::Hit { volumes, .. } => assert_eq!(volumes, &vec![1.0]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pattern_bpm_overrides_tempo() {
        let pattern = json!({"bpm": 60, "pattern": [{"beat": "kick", "dur": 1}, {"beat": "kick", "dur": 1}]});
        let mut log = CommandLog::new();
        let pass = Scheduler::default().schedule(&pattern, 120.0, PatternKind::Beat, &mut log);
        assert_eq!(pass.tempo.bpm, 60.0);
        assert_eq!(offsets(&log), vec![0.0, 1.0]);
    }

    #[test]
    fn test_tempo_is_clamped() {
        let scheduler = Scheduler::default();
        let pattern = json!([{"beat": "kick", "dur": 1}]);

        let pass = scheduler.schedule(&pattern, 500.0, PatternKind::Beat, &mut CommandLog::new());
        assert_eq!(pass.tempo, TempoSetting { bpm: 300.0, clamped: true });

        let pass = scheduler.schedule(&pattern, 10.0, PatternKind::Beat, &mut CommandLog::new());
        assert_eq!(pass.tempo.bpm, 40.0);

        let pass = scheduler.schedule(&pattern, f64::NAN, PatternKind::Beat, &mut CommandLog::new());
        assert_eq!(pass.tempo, TempoSetting { bpm: 120.0, clamped: false });
    }

    #[test]
    fn test_non_positive_min_tempo_still_plays() {
        let scheduler = Scheduler::new(SchedulerConfig {
            default_tempo: f64::NAN,
            min_tempo: 0.0,
            max_tempo: 300.0,
        });
        assert_eq!(scheduler.config().clamp_tempo(0.0).bpm, MIN_PLAYABLE_TEMPO);
        assert_eq!(scheduler.config().clamp_tempo(-20.0).bpm, MIN_PLAYABLE_TEMPO);
        assert_eq!(scheduler.config().clamp_tempo(f64::INFINITY).bpm, MIN_PLAYABLE_TEMPO);

        let pattern = json!([{"beat": "kick", "dur": 1}, {"beat": "snare", "dur": 1}]);
        let mut log = CommandLog::new();
        let pass = scheduler.schedule(&pattern, 0.0, PatternKind::Beat, &mut log);
        assert!(pass.tempo.clamped);
        assert_eq!(offsets(&log), vec![0.0, 60.0]);
        assert!(pass.end_offset_secs.is_finite());
    }

    #[test]
    fn test_offsets_are_non_decreasing() {
        let pattern = json!([
            {"beat": "kick", "dur": 0.25},
            {"beats": ["snare", "hihat"], "dur": 0.5},
            {"beat": "rest", "dur": 1},
            {"note": "C4", "dur": 1},
            {"beat": "crash", "dur": 0},
            "garbage",
            {"beat": "ride"},
            {"beat": "clap", "dur": 0.75}
        ]);
        let mut log = CommandLog::new();
        Scheduler::default().schedule(&pattern, 137.0, PatternKind::Beat, &mut log);
        let offsets = offsets(&log);
        assert_eq!(offsets.len(), 4);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_unrecognized_pattern_schedules_nothing() {
        let mut log = CommandLog::new();
        let pass = Scheduler::default().schedule(&json!({"foo": 1}), 120.0, PatternKind::Melody, &mut log);
        assert_eq!(pass.calls, 0);
        assert!(log.commands().is_empty());
        assert_eq!(calculate_pattern_duration(&json!(null)), 0.0);
    }

    #[test]
    fn test_duration_ignores_non_numeric_dur() {
        let pattern = json!({"notes": [
            {"note": "C4", "dur": 2},
            {"note": "D4", "dur": "3"},
            {"note": "E4", "dur": -1},
            {"note": "F4", "dur": 0.5}
        ]});
        assert_eq!(calculate_pattern_duration(&pattern), 2.5);
    }
}
