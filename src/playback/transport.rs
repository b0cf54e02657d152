// Transport - Player state around the scheduler
// Tempo, master volume and per-track mute/solo; plays both tracks together

use serde::Serialize;
use serde_json::Value;

use super::scheduler::{SchedulePass, Scheduler, TempoSetting};
use super::synth::{Synth, DEFAULT_MASTER_VOLUME};
use crate::pattern::PatternKind;
use crate::state::{Preferences, Project};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackState {
    pub muted: bool,
    pub soloed: bool,
}

/// Result of one `play` call; a silent track has no pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub beat: Option<SchedulePass>,
    pub melody: Option<SchedulePass>,
}

impl PlaybackReport {
    /// Length of the longer track, in seconds
    pub fn duration_secs(&self) -> f64 {
        [&self.beat, &self.melody]
            .into_iter()
            .flatten()
            .map(|pass| pass.end_offset_secs)
            .fold(0.0, f64::max)
    }

    pub fn calls(&self) -> usize {
        [&self.beat, &self.melody]
            .into_iter()
            .flatten()
            .map(|pass| pass.calls)
            .sum()
    }
}

pub struct Transport<S: Synth> {
    synth: S,
    scheduler: Scheduler,
    tempo: f64,
    master_volume: f32,
    auto_scroll: bool,
    beat: TrackState,
    melody: TrackState,
}

impl<S: Synth> Transport<S> {
    pub fn new(synth: S) -> Self {
        Self::with_scheduler(synth, Scheduler::default())
    }

    pub fn with_scheduler(synth: S, scheduler: Scheduler) -> Self {
        Transport {
            synth,
            tempo: scheduler.config().default_tempo,
            scheduler,
            master_volume: DEFAULT_MASTER_VOLUME,
            auto_scroll: true,
            beat: TrackState::default(),
            melody: TrackState::default(),
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    pub fn into_synth(self) -> S {
        self.synth
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Set the tempo, clamped into the scheduler's bounds (500 -> 300, 10 -> 40)
    pub fn set_tempo(&mut self, bpm: f64) -> TempoSetting {
        let setting = self.scheduler.config().clamp_tempo(bpm);
        if setting.clamped {
            log::warn!("Tempo {} out of range, clamped to {}", bpm, setting.bpm);
        }
        self.tempo = setting.bpm;
        setting
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Set master volume in [0, 1] and forward it to the synth
    pub fn set_master_volume(&mut self, volume: f32) -> f32 {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.master_volume = volume;
        self.synth.set_master_volume(volume);
        volume
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
    }

    pub fn track(&self, kind: PatternKind) -> TrackState {
        match kind {
            PatternKind::Beat => self.beat,
            PatternKind::Melody => self.melody,
        }
    }

    fn track_mut(&mut self, kind: PatternKind) -> &mut TrackState {
        match kind {
            PatternKind::Beat => &mut self.beat,
            PatternKind::Melody => &mut self.melody,
        }
    }

    /// Flip mute on a track, returning the new state
    pub fn toggle_mute(&mut self, kind: PatternKind) -> bool {
        let track = self.track_mut(kind);
        track.muted = !track.muted;
        track.muted
    }

    /// Flip solo on a track, returning the new state
    pub fn toggle_solo(&mut self, kind: PatternKind) -> bool {
        let track = self.track_mut(kind);
        track.soloed = !track.soloed;
        track.soloed
    }

    /// Not muted, and either nothing is soloed or this track is
    pub fn is_audible(&self, kind: PatternKind) -> bool {
        let track = self.track(kind);
        let any_solo = self.beat.soloed || self.melody.soloed;
        !track.muted && (!any_solo || track.soloed)
    }

    /// Schedule both tracks at the transport tempo
    pub fn play(&mut self, beat: &Value, melody: &Value) -> PlaybackReport {
        let report = PlaybackReport {
            beat: self.play_track(beat, PatternKind::Beat),
            melody: self.play_track(melody, PatternKind::Melody),
        };
        log::info!(
            "Playing {} calls over {:.2}s at {} bpm",
            report.calls(),
            report.duration_secs(),
            self.tempo
        );
        report
    }

    /// Adopt a project's tempo, then play its patterns
    pub fn play_project(&mut self, project: &Project) -> PlaybackReport {
        self.set_tempo(project.tempo);
        self.play(&project.beat_pattern, &project.melody_pattern)
    }

    fn play_track(&mut self, pattern: &Value, kind: PatternKind) -> Option<SchedulePass> {
        if !self.is_audible(kind) {
            log::debug!("{} track is silent", kind);
            return None;
        }
        Some(self.scheduler.schedule(pattern, self.tempo, kind, &mut self.synth))
    }

    pub fn stop(&mut self) {
        self.synth.stop_all();
    }

    /// Current state in persisted form
    pub fn preferences(&self) -> Preferences {
        Preferences {
            tempo: self.tempo,
            master_volume: self.master_volume,
            auto_scroll: self.auto_scroll,
            beat_muted: self.beat.muted,
            beat_soloed: self.beat.soloed,
            melody_muted: self.melody.muted,
            melody_soloed: self.melody.soloed,
        }
    }

    /// Restore state from persisted preferences; out-of-range values are clamped
    pub fn apply_preferences(&mut self, preferences: &Preferences) {
        self.set_tempo(preferences.tempo);
        self.set_master_volume(preferences.master_volume);
        self.auto_scroll = preferences.auto_scroll;
        self.beat = TrackState {
            muted: preferences.beat_muted,
            soloed: preferences.beat_soloed,
        };
        self.melody = TrackState {
            muted: preferences.melody_muted,
            soloed: preferences.melody_soloed,
        };
    }
}
