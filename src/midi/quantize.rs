// Duration Quantization - Clamp raw MIDI durations into a playable range
// Also maps between MIDI velocity and pattern volume

/// Clamp a raw duration (in beats) into `[min, max]`
///
/// Non-finite input maps to `min`. Never panics, even if `min > max`.
pub fn quantize_duration(duration: f64, min: f64, max: f64) -> f64 {
    if !duration.is_finite() {
        return min;
    }
    duration.max(min).min(max)
}

/// MIDI velocity (0-127) to a pattern volume in [0, 1]
pub fn velocity_to_volume(velocity: u8) -> f64 {
    (velocity as f64 / 127.0).clamp(0.0, 1.0)
}

/// Pattern volume to a note-on velocity
///
/// Clamped to 1..=127 since velocity 0 would read as a note-off.
pub fn volume_to_velocity(volume: f64) -> u8 {
    let volume = if volume.is_finite() { volume } else { 1.0 };
    (volume * 127.0).round().clamp(1.0, 127.0) as u8
}
