// MIDI Export - Write beat and melody patterns to a Standard MIDI File using midly
// Format 1: meta track, drum track (channel 10), melody track (channel 1)

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quantize::volume_to_velocity;
use crate::notes::{frequency_to_nearest_pitch, normalize_volume, note_name_to_pitch, voice_volume, DrumVoice};
use crate::pattern::{PatternItem, PatternKind, Sound};

const DRUM_CHANNEL: u8 = 9; // Channel 10 (0-indexed = 9) is drums
const MELODY_CHANNEL: u8 = 0;

const META_TRACK_NAME: &str = "duotrack";
const DRUM_TRACK_NAME: &str = "Drums";
const MELODY_TRACK_NAME: &str = "Melody";

/// MIDI export errors
#[derive(Debug, Error)]
pub enum MidiExportError {
    #[error("Invalid tempo for export: {0}")]
    InvalidTempo(f64),

    #[error("Invalid PPQ: {0} (must be 1-32767)")]
    InvalidPpq(u16),

    #[error("Failed to write MIDI: {0}")]
    Write(#[from] std::io::Error),
}

pub type MidiExportResult<T> = Result<T, MidiExportError>;

/// MIDI export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
        }
    }
}

/// Export a beat and a melody pattern to MIDI file bytes
///
/// Zero-duration items are skipped, rests and unknown names advance time,
/// chords become simultaneous notes.
pub fn export_midi(
    beat_items: &[PatternItem],
    melody_items: &[PatternItem],
    bpm: f64,
    options: &MidiExportOptions,
) -> MidiExportResult<Vec<u8>> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(MidiExportError::InvalidTempo(bpm));
    }
    if options.ppq == 0 || options.ppq > 0x7FFF {
        return Err(MidiExportError::InvalidPpq(options.ppq));
    }

    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(options.ppq.into()),
    };

    let tracks = vec![
        create_meta_track(bpm, options),
        create_pattern_track(beat_items, PatternKind::Beat, options),
        create_pattern_track(melody_items, PatternKind::Melody, options),
    ];

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    log::debug!(
        "Exported MIDI: {} beat items, {} melody items, {} bytes",
        beat_items.len(),
        melody_items.len(),
        bytes.len()
    );

    Ok(bytes)
}

fn create_meta_track(bpm: f64, options: &MidiExportOptions) -> Track<'static> {
    let mut track = Track::new();

    if options.track_names {
        push_meta(&mut track, MetaMessage::TrackName(META_TRACK_NAME.as_bytes()));
    }

    if options.include_tempo {
        // Microseconds per quarter note, limited to 24 bits
        let us_per_quarter = (60_000_000.0 / bpm).round().min(0xFF_FFFF as f64) as u32;
        push_meta(&mut track, MetaMessage::Tempo(us_per_quarter.into()));
    }

    if options.include_time_signature {
        // 4/4, 24 MIDI clocks per click, 8 32nd notes per quarter
        push_meta(&mut track, MetaMessage::TimeSignature(4, 2, 24, 8));
    }

    push_meta(&mut track, MetaMessage::EndOfTrack);
    track
}

fn push_meta(track: &mut Track<'static>, message: MetaMessage<'static>) {
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(message),
    });
}

/// MIDI keys an item sounds when read as `kind`
fn item_keys(item: &PatternItem, kind: PatternKind) -> Vec<u8> {
    match item.sound(kind) {
        Some(Sound::Voice(name)) => DrumVoice::from_name(name).map(|v| v.midi_note()).into_iter().collect(),
        Some(Sound::Voices(names)) => names
            .iter()
            .filter_map(|name| DrumVoice::from_name(name))
            .map(|v| v.midi_note())
            .collect(),
        Some(Sound::Note(name)) => note_name_to_pitch(name).into_iter().collect(),
        Some(Sound::Notes(names)) => names.iter().filter_map(|name| note_name_to_pitch(name)).collect(),
        Some(Sound::Freq(hz)) => frequency_to_nearest_pitch(hz).into_iter().collect(),
        Some(Sound::Rest) | None => Vec::new(),
    }
}

fn beats_to_ticks(beats: f64, ppq: u16) -> u32 {
    (beats * ppq as f64).round().max(0.0) as u32
}

fn create_pattern_track(
    items: &[PatternItem],
    kind: PatternKind,
    options: &MidiExportOptions,
) -> Track<'static> {
    let (name, channel) = match kind {
        PatternKind::Beat => (DRUM_TRACK_NAME, DRUM_CHANNEL),
        PatternKind::Melody => (MELODY_TRACK_NAME, MELODY_CHANNEL),
    };

    let mut events: Vec<(u32, TrackEventKind<'static>)> = Vec::new();

    if options.track_names {
        events.push((0, TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))));
    }

    let mut cursor = 0.0;
    for item in items {
        if !item.is_audible_duration() {
            continue;
        }

        let tick_on = beats_to_ticks(cursor, options.ppq);
        let tick_off = beats_to_ticks(cursor + item.dur, options.ppq);
        let volumes = normalize_volume(item.vol.as_ref());

        for (i, key) in item_keys(item, kind).into_iter().enumerate() {
            let volume = voice_volume(&volumes, i);

            events.push((
                tick_on,
                TrackEventKind::Midi {
                    channel: channel.into(),
                    message: MidiMessage::NoteOn {
                        key: key.into(),
                        vel: volume_to_velocity(volume).into(),
                    },
                },
            ));
            events.push((
                tick_off,
                TrackEventKind::Midi {
                    channel: channel.into(),
                    message: MidiMessage::NoteOff {
                        key: key.into(),
                        vel: 0u8.into(),
                    },
                },
            ));
        }

        cursor += item.dur;
    }

    // Stable: a note-off sharing a tick with the next note-on stays ahead of it
    events.sort_by_key(|(tick, _)| *tick);

    let mut track = Track::new();
    let mut last_tick = 0;
    for (tick, event_kind) in events {
        track.push(TrackEvent {
            delta: tick.saturating_sub(last_tick).into(),
            kind: event_kind,
        });
        last_tick = tick;
    }

    let end_tick = beats_to_ticks(cursor, options.ppq).max(last_tick);
    track.push(TrackEvent {
        delta: (end_tick - last_tick).into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}
