// Playback module - Scheduling patterns onto a synth
// The scheduler plans offsets; the synth owns real time

pub mod scheduler;
pub mod synth;
pub mod transport;

pub use scheduler::{
    calculate_pattern_duration, SchedulePass, Scheduler, SchedulerConfig, TempoSetting, MIN_PLAYABLE_TEMPO,
};
pub use synth::{CommandLog, Synth, SynthCommand, DEFAULT_MASTER_VOLUME};
pub use transport::{PlaybackReport, TrackState, Transport};
