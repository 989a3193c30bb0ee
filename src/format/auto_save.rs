//! Periodic save and cursor poll timers.
//!
//! The host event loop owns the clock; this module only decides which timers
//! are due. Every scheduled timer carries a [`TimerToken`] from the current
//! generation. Cancelling bumps the generation, so a token handed out before
//! a folder switch can never fire against the new folder.

use std::time::Duration;
use web_time::Instant;

/// The recurring timers a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Write the tag file
    Save,
    /// Refresh the cursor readout
    Poll,
}

/// Handle to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    kind: TimerKind,
    generation: u64,
}

impl TimerToken {
    /// Which timer this token belongs to.
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    token: TimerToken,
    interval: Duration,
    due: Instant,
}

/// Recurring, cancellable timers keyed by [`TimerKind`].
#[derive(Debug, Default)]
pub struct Timers {
    generation: u64,
    save: Option<Scheduled>,
    poll: Option<Scheduled>,
}

impl Timers {
    /// Create a timer set with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Scheduled> {
        match kind {
            TimerKind::Save => &mut self.save,
            TimerKind::Poll => &mut self.poll,
        }
    }

    /// Schedule `kind` to fire every `interval`, first at `now + interval`.
    ///
    /// Replaces any timer of the same kind.
    pub fn schedule(&mut self, kind: TimerKind, interval: Duration, now: Instant) -> TimerToken {
        let token = TimerToken {
            kind,
            generation: self.generation,
        };
        *self.slot(kind) = Some(Scheduled {
            token,
            interval,
            due: now + interval,
        });
        log::trace!("Timer {:?} scheduled every {:?}", kind, interval);
        token
    }

    /// Stop every timer and invalidate all outstanding tokens.
    pub fn cancel_all(&mut self) {
        self.save = None;
        self.poll = None;
        self.generation += 1;
        log::trace!("Timers cancelled (generation {})", self.generation);
    }

    /// Stop one timer.
    pub fn cancel(&mut self, kind: TimerKind) {
        *self.slot(kind) = None;
    }

    /// Check whether `token` belongs to a timer that is still scheduled.
    pub fn is_current(&self, token: TimerToken) -> bool {
        let scheduled = match token.kind {
            TimerKind::Save => self.save,
            TimerKind::Poll => self.poll,
        };
        scheduled.is_some_and(|s| s.token == token)
    }

    /// Token of the scheduled timer of `kind`, if any.
    pub fn token(&self, kind: TimerKind) -> Option<TimerToken> {
        match kind {
            TimerKind::Save => self.save,
            TimerKind::Poll => self.poll,
        }
        .map(|s| s.token)
    }

    /// Earliest due time, for hosts that sleep between events.
    pub fn next_due(&self) -> Option<Instant> {
        [self.save, self.poll]
            .into_iter()
            .flatten()
            .map(|s| s.due)
            .min()
    }

    /// Fire the timer behind `token` if it is current, rescheduling it at `now + interval`.
    ///
    /// Returns false for stale tokens.
    pub fn fire(&mut self, token: TimerToken, now: Instant) -> bool {
        if !self.is_current(token) {
            log::trace!("Ignoring stale timer {:?}", token);
            return false;
        }
        if let Some(scheduled) = self.slot(token.kind) {
            scheduled.due = now + scheduled.interval;
        }
        true
    }

    /// Fire every timer due at `now` (save first), rescheduling each.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for kind in [TimerKind::Save, TimerKind::Poll] {
            if let Some(scheduled) = self.slot(kind) {
                if scheduled.due <= now {
                    scheduled.due = now + scheduled.interval;
                    fired.push(kind);
                }
            }
        }
        fired
    }
}

/// Tracks unsaved changes and the outcome of the last save.
///
/// The periodic save writes whether or not anything changed; this only feeds
/// status reporting.
#[derive(Debug, Default)]
pub struct AutoSaveManager {
    /// Time of last successful save.
    last_save: Option<Instant>,

    /// Whether there are unsaved changes.
    dirty: bool,

    /// Consecutive failed saves.
    failures: u32,
}

impl AutoSaveManager {
    /// Create a clean manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that a change occurred that needs saving.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        log::trace!("Auto-save: marked dirty");
    }

    /// Check if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark that a save completed successfully.
    pub fn mark_saved(&mut self) {
        self.last_save = Some(Instant::now());
        self.dirty = false;
        self.failures = 0;
        log::trace!("Auto-save: marked saved");
    }

    /// Mark that a save failed. Changes stay dirty and the next tick retries.
    pub fn mark_save_failed(&mut self) {
        self.failures += 1;
        log::trace!("Auto-save: marked save failed ({} in a row)", self.failures);
    }

    /// Number of saves that failed since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Get time since last save (if any).
    pub fn time_since_last_save(&self) -> Option<Duration> {
        self.last_save.map(|t| t.elapsed())
    }

    /// Reset all state.
    pub fn reset(&mut self) {
        self.last_save = None;
        self.dirty = false;
        self.failures = 0;
    }
}
