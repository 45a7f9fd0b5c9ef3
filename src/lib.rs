//! Mimica: viseme-driven lip-sync animation core for 3D avatars.
//!
//! This crate turns a synthesized-speech timeline (one audio clip plus
//! timestamped word/viseme marks) into smoothed blend-shape weights on a
//! 3D face:
//!
//! - **Speech timeline**: owns the clip's marks and a monotonic cursor,
//!   reads playback position through an [`AudioTransport`] seam with a
//!   latency-compensating sync offset.
//! - **Face driver**: on every display-refresh tick, drains newly due
//!   marks, maps visemes to blend-shape targets, and blends weights with
//!   an attack/decay envelope so mouth transitions never pop. Session end
//!   hard-resets the face to the idle pose.
//! - **Motion sampler**: procedural idle/speaking body and head sway.
//!
//! Everything is single-threaded cooperative: the host's render loop calls
//! [`FaceDriver::tick`] once per frame, and the tick never blocks or does
//! I/O. The host keeps ownership of rendering and of the real audio
//! element; integration is one `AudioTransport` impl plus copying face
//! weights back to the scene after each tick.

pub mod config;
pub mod driver;
pub mod error;
pub mod face;
pub mod mark;
pub mod motion;
pub mod timeline;
pub mod viseme;

pub use config::LipSyncConfig;
pub use driver::FaceDriver;
pub use error::{LipSyncError, Result};
pub use face::{FaceMesh, FaceModel};
pub use mark::{Mark, MarkKind, parse_marks};
pub use motion::{MotionSampler, Pose};
pub use timeline::{AudioTransport, ManualClip, SpeechTimeline, TimedClip};
pub use viseme::Viseme;
