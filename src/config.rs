//! Configuration types for the lip-sync driver and motion sampler.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LipSyncError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Playback/mark timing settings.
    pub timing: TimingConfig,
    /// Attack/decay envelope settings.
    pub envelope: EnvelopeConfig,
    /// Per-viseme intensity settings.
    pub intensity: IntensityConfig,
    /// Markless babble fallback settings.
    pub babble: BabbleConfig,
    /// Procedural idle/speaking motion settings.
    pub motion: MotionConfig,
}

impl LipSyncConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| LipSyncError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to a TOML file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| LipSyncError::Config(format!("serialize failed: {e}")))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reject out-of-range values up front so a bad file fails at load,
    /// not as a subtly wrong animation.
    pub fn validate(&self) -> Result<()> {
        let e = &self.envelope;
        if !(e.decay_per_frame > 0.0 && e.decay_per_frame < 1.0) {
            return Err(LipSyncError::Config(format!(
                "envelope.decay_per_frame must be in (0, 1), got {}",
                e.decay_per_frame
            )));
        }
        if !(e.blend_factor > 0.0 && e.blend_factor <= 1.0) {
            return Err(LipSyncError::Config(format!(
                "envelope.blend_factor must be in (0, 1], got {}",
                e.blend_factor
            )));
        }
        let i = &self.intensity;
        if !(0.0..=1.0).contains(&i.band_min)
            || !(0.0..=1.0).contains(&i.band_max)
            || i.band_min > i.band_max
        {
            return Err(LipSyncError::Config(format!(
                "intensity band [{}, {}] must sit inside [0, 1] with min <= max",
                i.band_min, i.band_max
            )));
        }
        if !(0.0..=1.0).contains(&i.silence_intensity) {
            return Err(LipSyncError::Config(format!(
                "intensity.silence_intensity must be in [0, 1], got {}",
                i.silence_intensity
            )));
        }
        if self.babble.interval_ms == 0 {
            return Err(LipSyncError::Config(
                "babble.interval_ms must be nonzero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Playback timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Forward offset in ms added to the playback position.
    ///
    /// Compensates audio-pipeline/render latency so mouth movement appears
    /// synchronized with audible sound rather than lagging it.
    pub sync_offset_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { sync_offset_ms: 60 }
    }
}

/// Attack/decay envelope applied to blend-shape weights every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Multiplicative per-frame decay toward zero, in (0, 1).
    ///
    /// Applied to every nonzero weight before new targets blend in.
    /// Typical values at ~60 Hz:
    ///   - 0.88: fast relax, crisp articulation
    ///   - 0.92: default
    ///   - 0.96: slow relax, dreamier mouth
    pub decay_per_frame: f32,
    /// Linear interpolation factor toward a new target, in (0, 1].
    ///
    /// New targets are blended, never snapped; 1.0 disables the attack
    /// smoothing entirely.
    pub blend_factor: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            decay_per_frame: 0.92,
            blend_factor: 0.2,
        }
    }
}

/// Per-viseme intensity shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Lower bound of the uniform random intensity band.
    pub band_min: f32,
    /// Upper bound of the uniform random intensity band.
    ///
    /// Each viseme mark draws fresh from the band so identical phonemes do
    /// not repeat mechanically.
    pub band_max: f32,
    /// Fixed mouth-close intensity for the `sil` viseme.
    ///
    /// Distinct from (and below) the band so inter-phoneme silence closes
    /// the mouth softly instead of snapping it shut.
    pub silence_intensity: f32,
    /// Seed for the intensity RNG. `None` seeds from entropy; fixing it
    /// makes the draw sequence reproducible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            band_min: 0.10,
            band_max: 0.35,
            silence_intensity: 0.12,
            seed: None,
        }
    }
}

/// Markless babble fallback: random mouth flips while audio plays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BabbleConfig {
    /// Cadence of random viseme flips in ms.
    pub interval_ms: u32,
}

impl Default for BabbleConfig {
    fn default() -> Self {
        Self { interval_ms: 120 }
    }
}

/// Procedural idle/speaking sway amplitudes.
///
/// Radians for rotations, scene units for the bob offset. Frequencies are
/// fixed in the sampler; only amplitudes are tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Idle vertical body bob amplitude.
    pub idle_bob_amplitude: f32,
    /// Idle body bob angular rate (rad/s of the sine argument).
    pub idle_bob_rate: f32,
    /// Idle head pitch sway amplitude.
    pub idle_head_pitch: f32,
    /// Idle head yaw sway amplitude.
    pub idle_head_yaw: f32,
    /// Speaking body yaw sway amplitude.
    pub speak_body_yaw: f32,
    /// Speaking body pitch sway amplitude.
    pub speak_body_pitch: f32,
    /// Speaking head pitch sway amplitude.
    pub speak_head_pitch: f32,
    /// Speaking head yaw sway amplitude.
    pub speak_head_yaw: f32,
    /// Speaking spine roll amplitude.
    pub speak_spine_roll: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            idle_bob_amplitude: 0.02,
            idle_bob_rate: 1.2,
            idle_head_pitch: 0.02,
            idle_head_yaw: 0.015,
            speak_body_yaw: 0.1,
            speak_body_pitch: 0.05,
            speak_head_pitch: 0.07,
            speak_head_yaw: 0.05,
            speak_spine_roll: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LipSyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.sync_offset_ms, 60);
        assert!(config.envelope.decay_per_frame > 0.0 && config.envelope.decay_per_frame < 1.0);
        assert!(config.intensity.band_min <= config.intensity.band_max);
        assert!(config.intensity.silence_intensity < config.intensity.band_max);
        assert!(config.babble.interval_ms > 0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = LipSyncConfig::from_toml_str(
            r#"
            [timing]
            sync_offset_ms = 90

            [intensity]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.timing.sync_offset_ms, 90);
        assert_eq!(config.intensity.seed, Some(7));
        assert!((config.envelope.blend_factor - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_decay_rejected() {
        let result = LipSyncConfig::from_toml_str("[envelope]\ndecay_per_frame = 1.0\n");
        assert!(matches!(result, Err(LipSyncError::Config(_))));
    }

    #[test]
    fn inverted_band_rejected() {
        let result = LipSyncConfig::from_toml_str("[intensity]\nband_min = 0.5\nband_max = 0.2\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_babble_interval_rejected() {
        let result = LipSyncConfig::from_toml_str("[babble]\ninterval_ms = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let result = LipSyncConfig::from_toml_str("this is not valid toml {{{");
        assert!(matches!(result, Err(LipSyncError::Config(_))));
    }

    #[test]
    fn config_serializes_to_toml() {
        let text = toml::to_string_pretty(&LipSyncConfig::default()).unwrap();
        assert!(text.contains("sync_offset_ms"));
        assert!(text.contains("decay_per_frame"));
    }
}
