// Volume normalization - coerce an item's optional `vol` into a list

use crate::pattern::Volume;

/// Missing volume -> `[1.0]`, scalar -> one-element list, list -> unchanged
///
/// Values outside [0, 1] are passed through; the synthesis layer owns clamping.
pub fn normalize_volume(vol: Option<&Volume>) -> Vec<f64> {
    match vol {
        None => vec![1.0],
        Some(volume) => volume.to_vec(),
    }
}

/// Volume for the voice at `index` of a chord
///
/// Falls back to the first entry when the list is shorter than the chord,
/// then to full volume.
pub fn voice_volume(volumes: &[f64], index: usize) -> f64 {
    volumes.get(index).or_else(|| volumes.first()).copied().unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_volume_defaults_to_full() {
        assert_eq!(normalize_volume(None), vec![1.0]);
    }

    #[test]
    fn test_scalar_volume() {
        assert_eq!(normalize_volume(Some(&Volume::Single(0.8))), vec![0.8]);
    }

    #[test]
    fn test_volume_list_passes_through() {
        let vol = Volume::Many(vec![0.5, 0.8, 1.0]);
        assert_eq!(normalize_volume(Some(&vol)), vec![0.5, 0.8, 1.0]);

        let loud = Volume::Many(vec![1.5]);
        assert_eq!(normalize_volume(Some(&loud)), vec![1.5]);
    }

    #[test]
    fn test_voice_volume_picks_by_index() {
        let volumes = [0.2, 0.9];
        assert_eq!(voice_volume(&volumes, 0), 0.2);
        assert_eq!(voice_volume(&volumes, 1), 0.9);
        assert_eq!(voice_volume(&volumes, 2), 0.2);
        assert_eq!(voice_volume(&[], 0), 1.0);
    }
}
