//! Cancellable per-session timers.
//!
//! Every `(session, kind)` pair has at most one pending timer; scheduling a
//! new one aborts the previous task. Expiries are delivered as
//! [`TimerFired`] messages to the owning worker instead of running callbacks,
//! so a timer never touches session state concurrently with a command.
//! Each scheduled task carries a generation number: an expiry that was
//! already queued when its timer got cancelled is rejected by [`Timers::accept`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use game_core::SessionId;

/// Purpose of a session timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    /// Pause between selecting a player and starting their clock.
    Transition,
    /// The active player's thinking time.
    TurnDuration,
    /// Cadence of combat rounds when postures are not both chosen.
    CombatRound,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [
        TimerKind::Transition,
        TimerKind::TurnDuration,
        TimerKind::CombatRound,
    ];
}

/// Expiry notification sent to the worker owning the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    pub session: SessionId,
    pub kind: TimerKind,
    pub generation: u64,
}

struct Slot {
    generation: u64,
    deadline: Instant,
    task: JoinHandle<()>,
}

pub struct Timers {
    slots: HashMap<(SessionId, TimerKind), Slot>,
    /// Remaining time of paused timers.
    suspended: HashMap<(SessionId, TimerKind), Duration>,
    generation: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl Timers {
    pub fn new(fired_tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            slots: HashMap::new(),
            suspended: HashMap::new(),
            generation: 0,
            fired_tx,
        }
    }

    /// Creates a registry together with the receiver of its expiries.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (Self::new(fired_tx), fired_rx)
    }

    /// Starts a timer, replacing any pending or paused one of the same kind.
    pub fn schedule(&mut self, session: SessionId, kind: TimerKind, after: Duration) -> u64 {
        self.cancel(session, kind);
        self.suspended.remove(&(session, kind));

        self.generation += 1;
        let generation = self.generation;
        let deadline = Instant::now() + after;
        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            let fired = TimerFired {
                session,
                kind,
                generation,
            };
            if fired_tx.send(fired).is_err() {
                debug!(target: "runtime::timers", %session, %kind, "timer fired after worker stopped");
            }
        });

        trace!(
            target: "runtime::timers",
            %session,
            %kind,
            generation,
            after_ms = after.as_millis() as u64,
            "timer scheduled"
        );
        self.slots.insert(
            (session, kind),
            Slot {
                generation,
                deadline,
                task,
            },
        );
        generation
    }

    /// Cancels a pending timer and returns the time it had left.
    pub fn cancel(&mut self, session: SessionId, kind: TimerKind) -> Option<Duration> {
        let slot = self.slots.remove(&(session, kind))?;
        slot.task.abort();
        trace!(target: "runtime::timers", %session, %kind, "timer cancelled");
        Some(slot.deadline.saturating_duration_since(Instant::now()))
    }

    /// Claims an expiry. Returns `false` for stale expiries of cancelled or
    /// replaced timers, which must be ignored.
    pub fn accept(&mut self, fired: &TimerFired) -> bool {
        let key = (fired.session, fired.kind);
        match self.slots.get(&key) {
            Some(slot) if slot.generation == fired.generation => {
                self.slots.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Stops a running timer, keeping its remaining time for [`Timers::resume`].
    /// No-op when nothing is running.
    pub fn pause(&mut self, session: SessionId, kind: TimerKind) -> bool {
        match self.cancel(session, kind) {
            Some(remaining) => {
                self.suspended.insert((session, kind), remaining);
                true
            }
            None => false,
        }
    }

    /// Restarts a paused timer with the time it had left. No-op when the timer
    /// is already running or was never paused.
    pub fn resume(&mut self, session: SessionId, kind: TimerKind) -> bool {
        if self.is_running(session, kind) {
            return false;
        }
        match self.suspended.remove(&(session, kind)) {
            Some(remaining) => {
                self.schedule(session, kind, remaining);
                true
            }
            None => false,
        }
    }

    /// Drops the remaining time of a paused timer.
    pub fn discard(&mut self, session: SessionId, kind: TimerKind) {
        self.suspended.remove(&(session, kind));
    }

    pub fn is_running(&self, session: SessionId, kind: TimerKind) -> bool {
        self.slots.contains_key(&(session, kind))
    }

    pub fn is_paused(&self, session: SessionId, kind: TimerKind) -> bool {
        self.suspended.contains_key(&(session, kind))
    }

    /// Time left on a running or paused timer.
    pub fn remaining(&self, session: SessionId, kind: TimerKind) -> Option<Duration> {
        match self.slots.get(&(session, kind)) {
            Some(slot) => Some(slot.deadline.saturating_duration_since(Instant::now())),
            None => self.suspended.get(&(session, kind)).copied(),
        }
    }

    /// Cancels every timer kind of a session, paused ones included.
    pub fn clear(&mut self, session: SessionId) {
        for kind in TimerKind::ALL {
            self.cancel(session, kind);
        }
        self.suspended.retain(|(owner, _), _| *owner != session);
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: SessionId = SessionId(1);

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (mut timers, mut fired_rx) = Timers::channel();
        let generation = timers.schedule(SESSION, TimerKind::Transition, Duration::from_secs(3));

        let fired = fired_rx.recv().await.unwrap();
        assert_eq!(fired.kind, TimerKind::Transition);
        assert_eq!(fired.generation, generation);
        assert!(timers.accept(&fired));
        assert!(!timers.is_running(SESSION, TimerKind::Transition));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_rejects_the_old_expiry() {
        let (mut timers, _fired_rx) = Timers::channel();
        let first = timers.schedule(SESSION, TimerKind::TurnDuration, Duration::from_secs(1));
        let second = timers.schedule(SESSION, TimerKind::TurnDuration, Duration::from_secs(5));

        let stale = TimerFired {
            session: SESSION,
            kind: TimerKind::TurnDuration,
            generation: first,
        };
        assert!(!timers.accept(&stale));
        assert!(timers.is_running(SESSION, TimerKind::TurnDuration));
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_conserve_remaining_time() {
        let (mut timers, _fired_rx) = Timers::channel();
        timers.schedule(SESSION, TimerKind::TurnDuration, Duration::from_secs(30));
        time::advance(Duration::from_secs(10)).await;

        assert!(timers.pause(SESSION, TimerKind::TurnDuration));
        assert!(!timers.pause(SESSION, TimerKind::TurnDuration));
        time::advance(Duration::from_secs(60)).await;
        assert_eq!(
            timers.remaining(SESSION, TimerKind::TurnDuration),
            Some(Duration::from_secs(20))
        );

        assert!(timers.resume(SESSION, TimerKind::TurnDuration));
        assert!(!timers.resume(SESSION, TimerKind::TurnDuration));
        assert_eq!(
            timers.remaining(SESSION, TimerKind::TurnDuration),
            Some(Duration::from_secs(20))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_every_kind() {
        let (mut timers, _fired_rx) = Timers::channel();
        for kind in TimerKind::ALL {
            timers.schedule(SESSION, kind, Duration::from_secs(1));
        }
        timers.pause(SESSION, TimerKind::TurnDuration);
        timers.schedule(SessionId(2), TimerKind::Transition, Duration::from_secs(1));

        timers.clear(SESSION);

        for kind in TimerKind::ALL {
            assert_eq!(timers.remaining(SESSION, kind), None);
        }
        assert!(timers.is_running(SessionId(2), TimerKind::Transition));
    }
}
