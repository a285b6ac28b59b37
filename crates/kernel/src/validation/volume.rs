use crate::topology::solid::Solid;

/// Check that slicing conserved volume: the pieces must add up to the
/// original.
pub fn verify_slice_volume(original: &Solid, pieces: &[Solid]) -> VolumeVerification {
    let original_volume = original.volume();
    let piece_volumes: Vec<f64> = pieces.iter().map(Solid::volume).collect();
    let total: f64 = piece_volumes.iter().sum();

    let relative_error = if original_volume > 0.0 {
        (total - original_volume).abs() / original_volume
    } else {
        total.abs()
    };

    VolumeVerification {
        original_volume,
        piece_volumes,
        total,
        relative_error,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeVerification {
    pub original_volume: f64,
    pub piece_volumes: Vec<f64>,
    pub total: f64,
    pub relative_error: f64,
}

impl VolumeVerification {
    pub fn is_valid(&self, max_relative_error: f64) -> bool {
        self.relative_error < max_relative_error
    }
}
