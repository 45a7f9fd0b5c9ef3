//! The viseme-to-face driver: a per-frame state machine that turns due
//! timeline marks into smoothed blend-shape weights.
//!
//! Two states. **Idle**: no session; weights are zero or decaying to zero.
//! **Speaking**: a session is active; every tick drains the timeline's
//! newly due marks, maps visemes to blend targets, and blends weights with
//! an attack/decay envelope so the mouth never pops. On session end
//! (natural or explicit stop) every weight is hard-reset to exactly zero.
//!
//! `tick` is non-blocking, does no I/O, and is O(due marks + channels);
//! it is meant to be called once per display-refresh frame from the host's
//! render loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::LipSyncConfig;
use crate::error::Result;
use crate::face::FaceModel;
use crate::mark::{Mark, MarkKind};
use crate::timeline::{AudioTransport, SpeechTimeline};
use crate::viseme::Viseme;

/// Mouth shapes the markless babble mode flips between. Everything except
/// `sil`, which would read as a stall mid-utterance.
const BABBLE_POOL: &[Viseme] = &[
    Viseme::AA,
    Viseme::O,
    Viseme::E,
    Viseme::I,
    Viseme::U,
    Viseme::FF,
    Viseme::CH,
    Viseme::SS,
    Viseme::NN,
    Viseme::RR,
    Viseme::PP,
];

enum SessionKind {
    /// Timeline carries viseme/word marks from the TTS service.
    Marked,
    /// No marks: flip a random mouth channel on a fixed cadence, the way
    /// platform synthesizers without viseme output are animated.
    Babble { next_flip_ms: u32 },
}

struct Session {
    timeline: SpeechTimeline,
    kind: SessionKind,
    /// Face exposed no channels at session start; audio still plays but
    /// the session is a visual no-op.
    unmapped: bool,
}

/// Per-frame driver from speech timeline to face weights.
pub struct FaceDriver {
    config: LipSyncConfig,
    rng: StdRng,
    session: Option<Session>,
}

impl FaceDriver {
    /// Build a driver. The intensity RNG is seeded from
    /// `config.intensity.seed` when set, so tests can assert exact draw
    /// sequences.
    pub fn new(config: LipSyncConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.intensity.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            rng,
            session: None,
        })
    }

    /// True while a playback session is active.
    pub fn is_speaking(&self) -> bool {
        self.session.is_some()
    }

    /// Start a marked session: one audio clip plus its viseme/word marks.
    ///
    /// If a session is already active it is stopped and replaced: the
    /// prior transport is halted and the face reset, never left running
    /// alongside the new clip. Marks must be sorted ascending by time.
    pub fn start(
        &mut self,
        transport: Box<dyn AudioTransport>,
        marks: Vec<Mark>,
        face: &mut FaceModel,
    ) -> Result<()> {
        self.begin_session(transport, marks, SessionKind::Marked, face)
    }

    /// Start a markless babble session: while the clip plays, a random
    /// mouth shape gets a fresh random target every
    /// `babble.interval_ms`. Opt-in; a marked session with an empty mark
    /// sequence stays visually silent instead.
    pub fn start_babble(
        &mut self,
        transport: Box<dyn AudioTransport>,
        face: &mut FaceModel,
    ) -> Result<()> {
        self.begin_session(
            transport,
            Vec::new(),
            SessionKind::Babble { next_flip_ms: 0 },
            face,
        )
    }

    fn begin_session(
        &mut self,
        transport: Box<dyn AudioTransport>,
        marks: Vec<Mark>,
        kind: SessionKind,
        face: &mut FaceModel,
    ) -> Result<()> {
        if self.session.is_some() {
            tracing::debug!("replacing active lip-sync session");
            self.stop(face);
        }
        let timeline =
            SpeechTimeline::start(transport, marks, self.config.timing.sync_offset_ms)?;
        let unmapped = face.is_unmapped();
        if unmapped {
            tracing::warn!(
                "face model exposes no blend-shape channels; lip-sync disabled for this session"
            );
        }
        self.session = Some(Session {
            timeline,
            kind,
            unmapped,
        });
        Ok(())
    }

    /// Stop any active session: halt the transport, discard the cursor,
    /// and hard-reset every weight on every sub-mesh to exactly zero.
    /// Safe and idempotent whether or not a session is active.
    pub fn stop(&mut self, face: &mut FaceModel) {
        if let Some(mut session) = self.session.take() {
            session.timeline.stop();
            tracing::debug!("lip-sync session stopped");
        }
        face.reset();
    }

    /// Advance one animation frame.
    ///
    /// Decays every nonzero weight, blends in targets for any newly due
    /// marks (later marks in the same frame win shared channels), and
    /// resets to Idle when the clip finishes.
    pub fn tick(&mut self, face: &mut FaceModel) {
        face.scale_all(self.config.envelope.decay_per_frame);

        let Some(session) = self.session.as_mut() else {
            return;
        };

        if !session.unmapped {
            match &mut session.kind {
                SessionKind::Marked => {
                    for mark in session.timeline.due_marks() {
                        if mark.kind != MarkKind::Viseme {
                            continue;
                        }
                        match Viseme::from_code(&mark.value) {
                            Some(viseme) => {
                                apply_viseme(&self.config, &mut self.rng, viseme, face);
                            }
                            None => {
                                tracing::trace!(code = %mark.value, "unknown viseme code; skipped");
                            }
                        }
                    }
                }
                SessionKind::Babble { next_flip_ms } => {
                    let position = session.timeline.position_ms();
                    while position >= *next_flip_ms {
                        let viseme = BABBLE_POOL[self.rng.gen_range(0..BABBLE_POOL.len())];
                        apply_viseme(&self.config, &mut self.rng, viseme, face);
                        *next_flip_ms += self.config.babble.interval_ms;
                    }
                }
            }
        }

        if session.timeline.finished() {
            tracing::debug!("speech clip finished; resetting face");
            self.session = None;
            face.reset();
        }
    }
}

/// Blend one viseme's targets toward a fresh intensity.
fn apply_viseme(config: &LipSyncConfig, rng: &mut StdRng, viseme: Viseme, face: &mut FaceModel) {
    let intensity = if viseme == Viseme::Sil {
        config.intensity.silence_intensity
    } else {
        let draw = rng.gen_range(config.intensity.band_min..=config.intensity.band_max);
        draw * viseme.intensity_scale()
    };

    for target in viseme.blend_targets() {
        let goal = (intensity * target.scale).clamp(0.0, 1.0);
        let current = face.weight(target.channel).unwrap_or(0.0);
        let blended = current + (goal - current) * config.envelope.blend_factor;
        if !face.set_weight(target.channel, blended) {
            // Channel absent on this asset; reduced fidelity, never fatal.
            tracing::trace!(channel = target.channel, "blend-shape channel absent; skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::face::FaceMesh;
    use crate::timeline::ManualClip;

    const CHANNELS: &[&str] = &[
        "PP",
        "FF",
        "TH",
        "DD",
        "SS",
        "kk",
        "nn",
        "RR",
        "aa",
        "E",
        "I",
        "O",
        "U",
        "CH",
        "mouthClose",
        "jawOpen",
        "mouthFunnel",
        "mouthPucker",
        "mouthSmileLeft",
        "mouthSmileRight",
        "mouthStretchLeft",
        "mouthStretchRight",
    ];

    fn full_face() -> FaceModel {
        FaceModel::new(vec![FaceMesh::new("Wolf3D_Head", CHANNELS)])
    }

    fn seeded_driver() -> FaceDriver {
        let mut config = LipSyncConfig::default();
        config.intensity.seed = Some(42);
        FaceDriver::new(config).unwrap()
    }

    #[test]
    fn decay_converges_to_zero_without_marks() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        face.set_weight("jawOpen", 1.0);
        for _ in 0..200 {
            driver.tick(&mut face);
        }
        assert_eq!(face.weight("jawOpen"), Some(0.0));
    }

    #[test]
    fn weights_stay_bounded_over_dense_marks() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let clip = ManualClip::new(10_000);
        let handle = clip.clone();
        // The same open vowel every 10ms: worst case for accumulation
        let marks: Vec<Mark> = (0..500).map(|i| Mark::viseme(i * 10, "a")).collect();
        driver.start(Box::new(clip), marks, &mut face).unwrap();

        for frame in 0..300u32 {
            handle.set_position(frame * 16);
            driver.tick(&mut face);
            for mesh in face.meshes() {
                for &w in mesh.weights() {
                    assert!((0.0..=1.0).contains(&w), "weight {w} out of range");
                }
            }
        }
    }

    #[test]
    fn unknown_viseme_code_changes_nothing() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let clip = ManualClip::new(1_000);
        driver
            .start(Box::new(clip), vec![Mark::viseme(0, "zz")], &mut face)
            .unwrap();
        driver.tick(&mut face);
        assert_eq!(face.max_weight(), 0.0);
        assert!(driver.is_speaking());
    }

    #[test]
    fn word_marks_have_no_visual_effect() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let clip = ManualClip::new(1_000);
        driver
            .start(Box::new(clip), vec![Mark::word(0, "ciao", 0, 4)], &mut face)
            .unwrap();
        driver.tick(&mut face);
        assert_eq!(face.max_weight(), 0.0);
    }

    #[test]
    fn stop_is_idempotent_and_safe_when_idle() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        driver.stop(&mut face);
        driver.stop(&mut face);
        assert!(!driver.is_speaking());
        assert_eq!(face.max_weight(), 0.0);
    }

    #[test]
    fn natural_end_hard_resets_the_face() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let clip = ManualClip::new(200);
        let handle = clip.clone();
        driver
            .start(Box::new(clip), vec![Mark::viseme(0, "a")], &mut face)
            .unwrap();

        handle.set_position(10);
        driver.tick(&mut face);
        assert!(face.weight("jawOpen").unwrap() > 0.0);

        handle.set_position(200);
        driver.tick(&mut face);
        assert!(!driver.is_speaking());
        assert_eq!(face.max_weight(), 0.0);
    }

    #[test]
    fn unmapped_face_is_a_visual_noop_but_audio_session_runs() {
        let mut driver = seeded_driver();
        let mut face = FaceModel::default();
        let clip = ManualClip::new(1_000);
        let handle = clip.clone();
        driver
            .start(Box::new(clip), vec![Mark::viseme(0, "a")], &mut face)
            .unwrap();
        assert!(driver.is_speaking());
        assert!(handle.is_playing());
        handle.set_position(100);
        driver.tick(&mut face);
        assert_eq!(face.max_weight(), 0.0);
    }

    #[test]
    fn seeded_drivers_produce_identical_weights() {
        let run = || {
            let mut driver = seeded_driver();
            let mut face = full_face();
            let clip = ManualClip::new(5_000);
            let handle = clip.clone();
            let marks = vec![
                Mark::viseme(0, "a"),
                Mark::viseme(90, "o"),
                Mark::viseme(180, "p"),
            ];
            driver.start(Box::new(clip), marks, &mut face).unwrap();
            let mut trace = Vec::new();
            for frame in 0..20u32 {
                handle.set_position(frame * 16);
                driver.tick(&mut face);
                trace.push(face.weight("jawOpen").unwrap());
            }
            trace
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn babble_flips_on_cadence() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let clip = ManualClip::new(5_000);
        let handle = clip.clone();
        driver.start_babble(Box::new(clip), &mut face).unwrap();

        handle.set_position(0);
        driver.tick(&mut face);
        let after_first = face.max_weight();
        assert!(after_first > 0.0);

        // Babble keeps the mouth moving across the clip
        for frame in 1..120u32 {
            handle.set_position(frame * 16);
            driver.tick(&mut face);
        }
        assert!(face.max_weight() > 0.0);
        assert!(driver.is_speaking());
    }

    #[test]
    fn replacing_a_session_halts_the_prior_transport() {
        let mut driver = seeded_driver();
        let mut face = full_face();
        let first = ManualClip::new(5_000);
        let first_handle = first.clone();
        driver
            .start(Box::new(first), vec![Mark::viseme(0, "a")], &mut face)
            .unwrap();
        driver.tick(&mut face);
        assert!(first_handle.is_playing());

        let second = ManualClip::new(5_000);
        driver
            .start(Box::new(second), vec![Mark::viseme(0, "e")], &mut face)
            .unwrap();
        assert!(!first_handle.is_playing());
        assert!(driver.is_speaking());
    }
}
