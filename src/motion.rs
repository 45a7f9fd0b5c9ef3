//! Procedural idle and speaking body motion.
//!
//! While idle the avatar breathes: a slow vertical bob plus a subtle head
//! drift. While speaking the sway is faster and larger and the spine rolls
//! slightly, so the body reads as engaged. Pure sampling from elapsed
//! time; the host applies the pose additively to its scene graph.

use crate::config::MotionConfig;

// Sway frequencies (rad/s of the sine argument). Deliberately mutually
// irrational-ish so the combined motion never visibly loops.
const IDLE_HEAD_PITCH_RATE: f32 = 0.7;
const IDLE_HEAD_YAW_RATE: f32 = 0.9;
const SPEAK_BODY_YAW_RATE: f32 = 2.0;
const SPEAK_BODY_PITCH_RATE: f32 = 1.5;
const SPEAK_HEAD_PITCH_RATE: f32 = 3.0;
const SPEAK_HEAD_YAW_RATE: f32 = 2.2;
const SPEAK_SPINE_ROLL_RATE: f32 = 1.8;

/// A sampled pose offset. Rotations in radians, bob in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Vertical body offset (breathing bob).
    pub body_offset_y: f32,
    /// Whole-body yaw sway.
    pub body_yaw: f32,
    /// Whole-body pitch sway.
    pub body_pitch: f32,
    /// Head pitch nod.
    pub head_pitch: f32,
    /// Head yaw drift.
    pub head_yaw: f32,
    /// Spine roll while speaking.
    pub spine_roll: f32,
}

impl Pose {
    /// Largest absolute component, for amplitude checks.
    pub fn max_abs(&self) -> f32 {
        [
            self.body_offset_y,
            self.body_yaw,
            self.body_pitch,
            self.head_pitch,
            self.head_yaw,
            self.spine_roll,
        ]
        .into_iter()
        .fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

/// Samples idle/speaking sway from elapsed scene time.
#[derive(Debug, Clone)]
pub struct MotionSampler {
    config: MotionConfig,
}

impl MotionSampler {
    /// A sampler with the given amplitudes.
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    /// Pose at `t` seconds since scene start.
    pub fn sample(&self, t: f32, speaking: bool) -> Pose {
        let c = &self.config;
        if speaking {
            Pose {
                body_offset_y: 0.0,
                body_yaw: (t * SPEAK_BODY_YAW_RATE).sin() * c.speak_body_yaw,
                body_pitch: (t * SPEAK_BODY_PITCH_RATE).sin() * c.speak_body_pitch,
                head_pitch: (t * SPEAK_HEAD_PITCH_RATE).sin() * c.speak_head_pitch,
                head_yaw: (t * SPEAK_HEAD_YAW_RATE).sin() * c.speak_head_yaw,
                spine_roll: (t * SPEAK_SPINE_ROLL_RATE).sin() * c.speak_spine_roll,
            }
        } else {
            Pose {
                body_offset_y: (t * c.idle_bob_rate).sin() * c.idle_bob_amplitude,
                body_yaw: 0.0,
                body_pitch: 0.0,
                head_pitch: (t * IDLE_HEAD_PITCH_RATE).sin() * c.idle_head_pitch,
                head_yaw: (t * IDLE_HEAD_YAW_RATE).sin() * c.idle_head_yaw,
                spine_roll: 0.0,
            }
        }
    }
}

impl Default for MotionSampler {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
