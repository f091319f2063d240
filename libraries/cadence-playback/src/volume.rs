//! Output volume level
//!
//! Volume is a linear level in `[0.0, 1.0]` handed straight to the output
//! device. Out-of-range input is clamped; NaN is rejected.

/// Default volume (80%)
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Clamped volume level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f32,
}

impl Volume {
    /// Create new volume, clamping `level` to `[0.0, 1.0]`
    pub fn new(level: f32) -> Self {
        Self {
            level: Self::clamp(level).unwrap_or(DEFAULT_VOLUME),
        }
    }

    /// Set volume level, clamping to `[0.0, 1.0]`
    ///
    /// Returns `false` (and keeps the previous level) for NaN input.
    pub fn set_level(&mut self, level: f32) -> bool {
        match Self::clamp(level) {
            Some(level) => {
                self.level = level;
                true
            }
            None => false,
        }
    }

    /// Get current volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    fn clamp(level: f32) -> Option<f32> {
        if level.is_nan() {
            None
        } else {
            Some(level.clamp(0.0, 1.0))
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::new(0.5);
        assert_eq!(vol.level(), 0.5);
        assert_eq!(Volume::default().level(), 0.8);
    }

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(0.5);

        assert!(vol.set_level(-1.0));
        assert_eq!(vol.level(), 0.0);

        assert!(vol.set_level(5.0));
        assert_eq!(vol.level(), 1.0);

        assert!(vol.set_level(0.25));
        assert_eq!(vol.level(), 0.25);
    }

    #[test]
    fn nan_is_ignored() {
        let mut vol = Volume::new(0.3);
        assert!(!vol.set_level(f32::NAN));
        assert_eq!(vol.level(), 0.3);

        assert_eq!(Volume::new(f32::NAN).level(), DEFAULT_VOLUME);
    }

    #[test]
    fn infinities_clamp_to_bounds() {
        assert_eq!(Volume::new(f32::INFINITY).level(), 1.0);
        assert_eq!(Volume::new(f32::NEG_INFINITY).level(), 0.0);
    }
}
