//! Speech timeline playback: one audio clip plus its timestamped marks.
//!
//! The timeline does not own an audio device. The host media subsystem
//! plays the clip; the timeline reads its position through the
//! [`AudioTransport`] seam, never seeks it, and advances a monotonic mark
//! cursor so each mark is consumed exactly once per session.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::error::{LipSyncError, Result};
use crate::mark::{self, Mark};

/// The audio resource a timeline plays, as seen from the animation side.
///
/// Position is read-only from the timeline's perspective; the single
/// source of truth is whatever actually plays the samples.
pub trait AudioTransport {
    /// Begin playback from position zero.
    fn begin(&mut self) -> Result<()>;

    /// Stop playback and rewind to zero. Idempotent.
    fn halt(&mut self);

    /// Elapsed playback time in milliseconds.
    fn position_ms(&self) -> u32;

    /// True once playback has reached the end of the clip.
    fn finished(&self) -> bool;
}

/// Wall-clock transport for hosts that route audio themselves (a media
/// element, a platform synthesizer) and only need a shared position source.
#[derive(Debug)]
pub struct TimedClip {
    duration_ms: u32,
    started: Option<Instant>,
}

impl TimedClip {
    /// A clip of known duration, not yet playing.
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            started: None,
        }
    }
}

impl AudioTransport for TimedClip {
    fn begin(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn halt(&mut self) {
        self.started = None;
    }

    fn position_ms(&self) -> u32 {
        match self.started {
            Some(started) => {
                let elapsed = started.elapsed().as_millis();
                elapsed.min(u128::from(self.duration_ms)) as u32
            }
            None => 0,
        }
    }

    fn finished(&self) -> bool {
        self.started
            .is_some_and(|started| started.elapsed().as_millis() >= u128::from(self.duration_ms))
    }
}

#[derive(Debug, Default)]
struct ManualState {
    position_ms: u32,
    duration_ms: u32,
    playing: bool,
    fail_on_begin: bool,
}

/// Externally driven transport: the owner sets the playback position by
/// hand. Clones share state, so a handle kept outside the session can move
/// the playhead the session observes. Used by tests and by hosts whose
/// media layer reports position through its own callbacks.
#[derive(Debug, Clone, Default)]
pub struct ManualClip {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClip {
    /// A stopped clip of known duration at position zero.
    pub fn new(duration_ms: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                duration_ms,
                ..ManualState::default()
            })),
        }
    }

    /// A transport whose `begin` always fails, for exercising the
    /// playback-start failure path.
    pub fn failing() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                fail_on_begin: true,
                ..ManualState::default()
            })),
        }
    }

    /// Move the playhead.
    pub fn set_position(&self, position_ms: u32) {
        self.lock().position_ms = position_ms;
    }

    /// Whether `begin` has been called without a later `halt`.
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioTransport for ManualClip {
    fn begin(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_on_begin {
            return Err(LipSyncError::Playback(
                "transport refused to start".to_owned(),
            ));
        }
        state.playing = true;
        state.position_ms = 0;
        Ok(())
    }

    fn halt(&mut self) {
        let mut state = self.lock();
        state.playing = false;
        state.position_ms = 0;
    }

    fn position_ms(&self) -> u32 {
        self.lock().position_ms
    }

    fn finished(&self) -> bool {
        let state = self.lock();
        state.playing && state.duration_ms > 0 && state.position_ms >= state.duration_ms
    }
}

/// One playback session: an audio transport plus its ordered mark sequence
/// and a monotonic cursor. Created per utterance, discarded on end, never
/// reused.
pub struct SpeechTimeline {
    transport: Box<dyn AudioTransport>,
    marks: Vec<Mark>,
    cursor: usize,
    sync_offset_ms: u32,
}

impl SpeechTimeline {
    /// Validate the marks and begin playback at position zero.
    ///
    /// Marks must be sorted ascending by time; unsorted input is rejected
    /// rather than left to desynchronize mid-clip. A transport that cannot
    /// start is logged and reported as an error — no session exists
    /// afterwards, and no visual session should start either.
    pub fn start(
        mut transport: Box<dyn AudioTransport>,
        marks: Vec<Mark>,
        sync_offset_ms: u32,
    ) -> Result<Self> {
        mark::validate_marks(&marks)?;
        if let Err(e) = transport.begin() {
            tracing::warn!(error = %e, "audio transport failed to start; dropping session");
            return Err(e);
        }
        tracing::debug!(marks = marks.len(), sync_offset_ms, "speech timeline started");
        Ok(Self {
            transport,
            marks,
            cursor: 0,
            sync_offset_ms,
        })
    }

    /// Elapsed playback time in milliseconds, advanced by the fixed sync
    /// offset so mouth movement compensates audio-pipeline/render latency
    /// instead of trailing the sound.
    pub fn position_ms(&self) -> u32 {
        self.transport.position_ms().saturating_add(self.sync_offset_ms)
    }

    /// Marks whose timestamp the playhead has passed since the last poll.
    ///
    /// The cursor only moves forward, so each mark is yielded at most once
    /// over the life of the session and always in sequence order. A poll
    /// may return nothing (no mark newly due) or several marks (frame
    /// interval coarser than the mark spacing).
    pub fn due_marks(&mut self) -> &[Mark] {
        let now = self.position_ms();
        let start = self.cursor;
        let mut end = start;
        while end < self.marks.len() && self.marks[end].time_ms <= now {
            end += 1;
        }
        self.cursor = end;
        &self.marks[start..end]
    }

    /// Stop playback and rewind to zero. Idempotent.
    pub fn stop(&mut self) {
        self.transport.halt();
    }

    /// True once the transport reports the clip played to its end.
    pub fn finished(&self) -> bool {
        self.transport.finished()
    }

    /// Marks not yet consumed.
    pub fn remaining(&self) -> usize {
        self.marks.len() - self.cursor
    }
}
