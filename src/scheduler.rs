//! Playback scheduling: which frame is current, and when the next one is due.
//!
//! [`PlaybackState`] is a plain value; its transition methods take `self` and
//! return the next state. [`FrameScheduler`] adds the single pending tick on
//! top of it. Every pause, play or replay bumps the state's epoch, and a tick
//! only advances the frame if it was scheduled under the current epoch, so a
//! tick left over from before a pause or replay can never apply a stale index.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use pressure_sway::{FrameScheduler, PlaybackCommand};
//!
//! let t0 = Instant::now();
//! let cadence = Duration::from_millis(100);
//! let mut scheduler = FrameScheduler::new(3, cadence, t0);
//!
//! assert_eq!(scheduler.poll(t0 + cadence), Some(1));
//! scheduler.handle(PlaybackCommand::Pause, t0 + cadence);
//! assert_eq!(scheduler.poll(t0 + cadence * 5), None);
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// External playback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Resume advancing frames.
    Play,
    /// Stop advancing frames and cancel the pending tick.
    Pause,
    /// Jump to frame 0 and play.
    Replay,
    /// Stop the playback loop.
    Quit,
}

/// Current frame, play flag and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Index of the frame on display.
    pub index: usize,
    /// Whether ticks advance the frame.
    pub playing: bool,
    /// Interval between ticks.
    pub cadence: Duration,
    /// Incremented whenever pending ticks must be invalidated.
    pub epoch: u64,
}

impl PlaybackState {
    /// Initial state: playing from frame 0.
    #[must_use]
    pub const fn new(cadence: Duration) -> Self {
        Self {
            index: 0,
            playing: true,
            cadence,
            epoch: 0,
        }
    }

    /// Apply a command. Every command is valid in every state; repeated
    /// pause or play leaves the state unchanged.
    #[must_use]
    pub fn apply(self, command: PlaybackCommand) -> Self {
        match command {
            PlaybackCommand::Pause if self.playing => Self {
                playing: false,
                epoch: self.epoch + 1,
                ..self
            },
            PlaybackCommand::Play if !self.playing => Self {
                playing: true,
                epoch: self.epoch + 1,
                ..self
            },
            PlaybackCommand::Replay => Self {
                index: 0,
                playing: true,
                epoch: self.epoch + 1,
                ..self
            },
            PlaybackCommand::Pause | PlaybackCommand::Play | PlaybackCommand::Quit => self,
        }
    }

    /// Handle a tick scheduled under `epoch` for a series of `len` frames.
    ///
    /// Returns the advanced state, or `None` if the tick is stale or playback
    /// is paused. The index wraps to 0 past the last frame.
    #[must_use]
    pub fn on_tick(self, epoch: u64, len: usize) -> Option<Self> {
        if epoch != self.epoch {
            warn!(tick_epoch = epoch, epoch = self.epoch, "discarding stale tick");
            return None;
        }
        if !self.playing {
            debug!(index = self.index, "tick while paused ignored");
            return None;
        }
        let next = self.index + 1;
        Some(Self {
            index: if next >= len { 0 } else { next },
            ..self
        })
    }
}

/// A tick waiting for its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTick {
    epoch: u64,
    due: Instant,
}

/// Single-threaded frame scheduler with at most one pending tick.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: PlaybackState,
    len: usize,
    pending: Option<PendingTick>,
}

impl FrameScheduler {
    /// Start playing `len` frames from index 0; the first tick is due one
    /// cadence after `now`.
    #[must_use]
    pub fn new(len: usize, cadence: Duration, now: Instant) -> Self {
        let state = PlaybackState::new(cadence);
        Self {
            state,
            len,
            pending: Some(PendingTick {
                epoch: state.epoch,
                due: now + cadence,
            }),
        }
    }

    /// Current playback state.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current frame index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.state.index
    }

    /// Whether playback is advancing.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Deadline of the pending tick, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.map(|t| t.due)
    }

    /// Time left until the pending tick, zero if overdue, `None` if no tick
    /// is pending.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|t| t.due.saturating_duration_since(now))
    }

    /// Apply a command at time `now`.
    ///
    /// Returns the index to present immediately, if the command changed the
    /// displayed frame (replay always re-presents frame 0).
    pub fn handle(&mut self, command: PlaybackCommand, now: Instant) -> Option<usize> {
        let before = self.state;
        self.state = before.apply(command);
        debug!(?command, from = ?before, to = ?self.state, "playback command");

        if self.state.epoch != before.epoch {
            // Cancel whatever was pending; schedule afresh if playing.
            self.pending = self.state.playing.then(|| PendingTick {
                epoch: self.state.epoch,
                due: now + self.state.cadence,
            });
        }

        matches!(command, PlaybackCommand::Replay).then_some(self.state.index)
    }

    /// Fire the pending tick if it is due at `now`.
    ///
    /// Returns the new frame index when the tick advanced playback. At most
    /// one tick fires per call; if playback fell behind by several cadences,
    /// the next deadline is re-anchored to `now` instead of bursting.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let tick = self.pending.filter(|t| t.due <= now)?;

        match self.state.on_tick(tick.epoch, self.len) {
            Some(next) => {
                self.state = next;
                let mut due = tick.due + self.state.cadence;
                if due <= now {
                    due = now + self.state.cadence;
                }
                self.pending = Some(PendingTick {
                    epoch: self.state.epoch,
                    due,
                });
                debug!(index = self.state.index, "tick");
                Some(self.state.index)
            }
            None => {
                self.pending = None;
                None
            }
        }
    }
}
