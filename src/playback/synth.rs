// Synth - Capability the scheduler drives, plus a recording implementation
// Real audio synthesis lives outside this crate

use serde::Serialize;

/// Master volume a fresh synth starts at
pub const DEFAULT_MASTER_VOLUME: f32 = 0.7;

/// Scheduled sound output
///
/// Offsets are seconds from the start of the current pass. Each call carries
/// the volume already resolved for its own voice of a chord.
pub trait Synth {
    /// Schedule a drum hit by voice name
    fn schedule_hit(&mut self, voice: &str, offset_secs: f64, volumes: &[f64]);

    /// Schedule a tone at a frequency for a duration
    fn schedule_tone(&mut self, freq_hz: f64, offset_secs: f64, duration_secs: f64, volumes: &[f64]);

    /// Silence everything scheduled or sounding
    fn stop_all(&mut self);

    fn set_master_volume(&mut self, volume: f32);
}

/// One recorded synth call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SynthCommand {
    #[serde(rename_all = "camelCase")]
    Hit {
        voice: String,
        offset_secs: f64,
        volumes: Vec<f64>,
    },

    #[serde(rename_all = "camelCase")]
    Tone {
        freq_hz: f64,
        offset_secs: f64,
        duration_secs: f64,
        volumes: Vec<f64>,
    },

    StopAll,

    MasterVolume { volume: f32 },
}

impl SynthCommand {
    pub fn offset_secs(&self) -> Option<f64> {
        match self {
            SynthCommand::Hit { offset_secs, .. } | SynthCommand::Tone { offset_secs, .. } => {
                Some(*offset_secs)
            }
            _ => None,
        }
    }
}

/// Synth that records what it is asked to play
///
/// Tones with a non-positive frequency or duration are ignored, the way a
/// real oscillator refuses them. Hits are accepted with any offset.
#[derive(Debug, Clone)]
pub struct CommandLog {
    commands: Vec<SynthCommand>,
    active: Vec<SynthCommand>,
    master_volume: f32,
}

impl Default for CommandLog {
    fn default() -> Self {
        CommandLog {
            commands: Vec::new(),
            active: Vec::new(),
            master_volume: DEFAULT_MASTER_VOLUME,
        }
    }
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received, in order
    pub fn commands(&self) -> &[SynthCommand] {
        &self.commands
    }

    /// Hits and tones scheduled since the last `stop_all`
    pub fn active(&self) -> &[SynthCommand] {
        &self.active
    }

    /// Voice names of active hits, in schedule order
    pub fn hit_voices(&self) -> Vec<&str> {
        self.active
            .iter()
            .filter_map(|command| match command {
                SynthCommand::Hit { voice, .. } => Some(voice.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Frequencies of active tones, in schedule order
    pub fn tone_frequencies(&self) -> Vec<f64> {
        self.active
            .iter()
            .filter_map(|command| match command {
                SynthCommand::Tone { freq_hz, .. } => Some(*freq_hz),
                _ => None,
            })
            .collect()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.active.clear();
    }

    fn record(&mut self, command: SynthCommand) {
        self.active.push(command.clone());
        self.commands.push(command);
    }
}

impl Synth for CommandLog {
    fn schedule_hit(&mut self, voice: &str, offset_secs: f64, volumes: &[f64]) {
        self.record(SynthCommand::Hit {
            voice: voice.to_string(),
            offset_secs,
            volumes: volumes.to_vec(),
        });
    }

    fn schedule_tone(&mut self, freq_hz: f64, offset_secs: f64, duration_secs: f64, volumes: &[f64]) {
        if !(freq_hz > 0.0 && duration_secs > 0.0) {
            log::debug!("Ignoring tone: freq {} Hz, duration {} s", freq_hz, duration_secs);
            return;
        }
        self.record(SynthCommand::Tone {
            freq_hz,
            offset_secs,
            duration_secs,
            volumes: volumes.to_vec(),
        });
    }

    fn stop_all(&mut self) {
        self.active.clear();
        self.commands.push(SynthCommand::StopAll);
    }

    fn set_master_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.master_volume = volume;
        self.commands.push(SynthCommand::MasterVolume { volume });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_hits_and_tones() {
        let mut log = CommandLog::new();
        log.schedule_hit("kick", 0.0, &[1.0]);
        log.schedule_tone(440.0, 0.5, 0.5, &[0.8]);

        assert_eq!(log.commands().len(), 2);
        assert_eq!(log.hit_voices(), vec!["kick"]);
        assert_eq!(log.tone_frequencies(), vec![440.0]);
        assert_eq!(log.commands()[1].offset_secs(), Some(0.5));
    }

    #[test]
    fn test_rejects_invalid_tones() {
        let mut log = CommandLog::new();
        log.schedule_tone(0.0, 0.0, 1.0, &[1.0]);
        log.schedule_tone(-440.0, 0.0, 1.0, &[1.0]);
        log.schedule_tone(440.0, 0.0, 0.0, &[1.0]);
        log.schedule_tone(f64::NAN, 0.0, 1.0, &[1.0]);
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_stop_all_clears_active() {
        let mut log = CommandLog::new();
        log.schedule_hit("snare", 0.25, &[1.0]);
        log.stop_all();

        assert!(log.active().is_empty());
        assert_eq!(log.commands().last(), Some(&SynthCommand::StopAll));
    }

    #[test]
    fn test_master_volume_is_clamped() {
        let mut log = CommandLog::new();
        assert_eq!(log.master_volume(), DEFAULT_MASTER_VOLUME);

        log.set_master_volume(1.5);
        assert_eq!(log.master_volume(), 1.0);
        log.set_master_volume(-0.5);
        assert_eq!(log.master_volume(), 0.0);
        log.set_master_volume(0.3);
        assert_eq!(log.master_volume(), 0.3);
    }

    #[test]
    fn test_command_serialization() {
        let command = SynthCommand::Hit {
            voice: "kick".into(),
            offset_secs: 0.5,
            volumes: vec![1.0],
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["type"], "hit");
        assert_eq!(value["offsetSecs"], 0.5);
    }
}
