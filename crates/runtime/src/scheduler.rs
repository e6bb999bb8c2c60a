//! Turn state machine driven by timers.
//!
//! ```text
//! Transition --(transition timer)--> PlayerTurn --(turn timer | end turn)--> Transition
//!                                       |   ^
//!                            duel starts v   | duel ends
//!                                    CombatPause
//! ```
//!
//! The scheduler never sleeps itself. It arms timers in the worker's
//! [`Timers`] registry and is called back through the worker when they fire.

use std::time::Duration;

use tracing::{debug, info};

use game_core::error::Result;
use game_core::{
    Player, PlayerId, RuleViolation, SessionEvent, SessionId, TurnDescriptor, TurnPhase,
    turn,
};

use crate::context::EngineContext;
use crate::timers::{TimerKind, Timers};

/// A player whose clock just started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnActivation {
    pub player: PlayerId,
    /// Hosts wake their script driver for scripted players.
    pub scripted: bool,
    pub turn: u64,
}

pub struct TurnScheduler {
    ctx: EngineContext,
}

impl TurnScheduler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    fn turn_duration(&self) -> Duration {
        self.ctx.config.turn_duration
    }

    fn transition_duration(&self) -> Duration {
        self.ctx.config.transition_duration
    }

    /// Selects the first eligible player and starts the transition pause.
    pub fn start_first_turn(
        &self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<TurnDescriptor> {
        let snapshot = self.ctx.store.find_by_id(session)?;
        if snapshot.finished {
            return Err(RuleViolation::GameFinished.into());
        }
        if snapshot.turn_order.is_empty() {
            return Err(RuleViolation::TurnOrderNotDefined.into());
        }
        let player = turn::first_eligible(&snapshot).ok_or(RuleViolation::NoActivePlayer)?;

        let turn = self.select(timers, session, player, 1)?;
        info!(target: "runtime::scheduler", %session, %player, "first turn selected");
        Ok(turn)
    }

    /// Transition pause elapsed: the active player's clock starts.
    pub fn on_transition_elapsed(
        &self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<TurnActivation> {
        let snapshot = self.ctx.store.find_by_id(session)?;
        if snapshot.finished {
            return Err(RuleViolation::GameFinished.into());
        }
        let player = snapshot.turn.active.ok_or(RuleViolation::NoActivePlayer)?;
        timers.cancel(session, TimerKind::Transition);
        let actions = self.ctx.game_config().actions_per_turn;
        let activated = self
            .ctx
            .store
            .update_player(session, player, &mut |p: &mut Player| {
                p.actions_remaining = actions;
            })?;
        let turn = self
            .ctx
            .store
            .update_turn(session, &mut |turn: &mut TurnDescriptor| {
                turn.action_used = false;
                turn.phase = TurnPhase::PlayerTurn;
            })?;

        timers.schedule(session, TimerKind::TurnDuration, self.turn_duration());
        self.ctx.events.publish(SessionEvent::TurnStarted {
            session,
            turn: turn.number,
            player,
            scripted: activated.scripted,
        });
        debug!(target: "runtime::scheduler", %session, %player, turn = turn.number, "turn started");

        Ok(TurnActivation {
            player,
            scripted: activated.scripted,
            turn: turn.number,
        })
    }

    /// Ends the active player's turn before their clock runs out.
    pub fn end_turn_manual(
        &self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<Option<TurnDescriptor>> {
        self.advance_turn(timers, session)
    }

    /// The active player's clock ran out.
    pub fn on_turn_timeout(
        &self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<Option<TurnDescriptor>> {
        debug!(target: "runtime::scheduler", %session, "turn timed out");
        self.advance_turn(timers, session)
    }

    /// Hands the turn to the next eligible player. Returns `None` without
    /// touching anything once the session is finished.
    pub fn advance_turn(
        &self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<Option<TurnDescriptor>> {
        let snapshot = self.ctx.store.find_by_id(session)?;
        if snapshot.finished {
            return Ok(None);
        }

        timers.cancel(session, TimerKind::TurnDuration);
        timers.discard(session, TimerKind::TurnDuration);
        timers.cancel(session, TimerKind::Transition);

        let outgoing = snapshot.turn.active;
        if let Some(player) = outgoing
            && snapshot.player(player).is_some()
        {
            self.ctx
                .store
                .update_player(session, player, &mut |p: &mut Player| {
                    p.speed.clear();
                    p.boat_speed.clear();
                    p.actions_remaining = 0;
                    p.combat_bonus = false;
                })?;
        }
        self.ctx.store.tick_disabled_placeables(session)?;
        self.ctx.events.publish(SessionEvent::TurnEnded {
            session,
            turn: snapshot.turn.number,
            player: outgoing,
        });

        let next = turn::next_eligible(&snapshot, outgoing)
            .ok_or(RuleViolation::TurnOrderNotDefined)?;
        let turn = self.select(timers, session, next, snapshot.turn.number + 1)?;
        info!(
            target: "runtime::scheduler",
            %session,
            player = %next,
            turn = turn.number,
            "turn advanced"
        );
        Ok(Some(turn))
    }

    /// Makes `player` active for turn `number` and arms the transition timer.
    fn select(
        &self,
        timers: &mut Timers,
        session: SessionId,
        player: PlayerId,
        number: u64,
    ) -> Result<TurnDescriptor> {
        self.ctx
            .store
            .update_player(session, player, &mut |p: &mut Player| {
                p.speed.refill();
                p.boat_speed.refill();
            })?;

        let turn = TurnDescriptor {
            number,
            active: Some(player),
            action_used: false,
            phase: TurnPhase::Transition,
        };
        self.ctx.store.set_turn(session, turn)?;
        self.ctx.events.publish(SessionEvent::TurnTransition {
            session,
            turn: number,
            player,
        });
        timers.schedule(session, TimerKind::Transition, self.transition_duration());
        Ok(turn)
    }

    /// Suspends the active player's clock, keeping the time left.
    /// No-op when the clock is not running.
    pub fn pause_for_combat(&self, timers: &mut Timers, session: SessionId) -> Result<bool> {
        if !timers.pause(session, TimerKind::TurnDuration) {
            return Ok(false);
        }
        self.ctx
            .store
            .update_turn(session, &mut |turn: &mut TurnDescriptor| {
                turn.phase = TurnPhase::CombatPause;
            })?;
        debug!(
            target: "runtime::scheduler",
            %session,
            remaining_ms = self.remaining_millis(timers, session),
            "turn clock paused"
        );
        Ok(true)
    }

    /// Restarts a paused clock with the time it had left. No-op when the
    /// clock is already running or was never paused.
    pub fn resume_after_combat(&self, timers: &mut Timers, session: SessionId) -> Result<bool> {
        if !timers.resume(session, TimerKind::TurnDuration) {
            return Ok(false);
        }
        self.ctx
            .store
            .update_turn(session, &mut |turn: &mut TurnDescriptor| {
                turn.phase = TurnPhase::PlayerTurn;
            })?;
        debug!(
            target: "runtime::scheduler",
            %session,
            remaining_ms = self.remaining_millis(timers, session),
            "turn clock resumed"
        );
        Ok(true)
    }

    /// Time left on the active player's clock, running or paused.
    pub fn remaining_turn_time(&self, timers: &Timers, session: SessionId) -> Option<Duration> {
        timers.remaining(session, TimerKind::TurnDuration)
    }

    fn remaining_millis(&self, timers: &Timers, session: SessionId) -> u64 {
        self.remaining_turn_time(timers, session)
            .map_or(0, |left| left.as_millis() as u64)
    }

    /// Cancels every timer of the session, combat cadence included.
    pub fn force_stop(&self, timers: &mut Timers, session: SessionId) {
        timers.clear(session);
        info!(target: "runtime::scheduler", %session, "session timers stopped");
    }

    pub fn clear(&self, timers: &mut Timers, session: SessionId) {
        timers.clear(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::harness;
    use game_core::{EngineError, GameMode, Position, Session};

    const SESSION: SessionId = SessionId(1);
    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);
    const C: PlayerId = PlayerId(3);
    const FIELD: &[&str] = &[".....", ".....", ".....", ".....", "....."];

    fn three_players() -> Session {
        Session::new(SESSION, 0, GameMode::Elimination)
            .with_player(Player::new(A, Position::new(0, 0)).with_speed(3))
            .with_player(Player::new(B, Position::new(2, 0)).with_speed(3))
            .with_player(Player::new(C, Position::new(4, 0)).with_speed(3))
    }

    #[tokio::test(start_paused = true)]
    async fn first_turn_needs_a_turn_order() {
        let h = harness(Session::new(SESSION, 0, GameMode::Elimination), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();

        let err = scheduler.start_first_turn(&mut timers, SESSION).unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::TurnOrderNotDefined));
    }

    #[tokio::test(start_paused = true)]
    async fn first_turn_needs_someone_in_game() {
        let mut session = three_players();
        for player in session.players.values_mut() {
            player.in_game = false;
        }
        let h = harness(session, FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();

        let err = scheduler.start_first_turn(&mut timers, SESSION).unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::NoActivePlayer));
    }

    #[tokio::test(start_paused = true)]
    async fn first_turn_refills_speed_and_arms_transition() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();

        let turn = scheduler.start_first_turn(&mut timers, SESSION).unwrap();

        assert_eq!(turn.number, 1);
        assert_eq!(turn.active, Some(A));
        assert_eq!(turn.phase, TurnPhase::Transition);
        assert_eq!(h.player(A).speed.current, 3);
        assert!(timers.is_running(SESSION, TimerKind::Transition));
        assert_eq!(h.events.kinds(), vec!["turn_transition"]);
    }

    #[tokio::test(start_paused = true)]
    async fn transition_grants_actions_and_starts_clock() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();

        let activation = scheduler.on_transition_elapsed(&mut timers, SESSION).unwrap();

        assert_eq!(activation.player, A);
        assert!(!activation.scripted);
        assert_eq!(h.player(A).actions_remaining, 1);
        assert_eq!(h.session().turn.phase, TurnPhase::PlayerTurn);
        assert_eq!(
            scheduler.remaining_turn_time(&timers, SESSION),
            Some(h.ctx.config.turn_duration)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn end_turn_skips_players_out_of_game() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();
        scheduler.on_transition_elapsed(&mut timers, SESSION).unwrap();
        h.edit(|session| session.player_mut(B).unwrap().in_game = false);

        let turn = scheduler
            .end_turn_manual(&mut timers, SESSION)
            .unwrap()
            .unwrap();

        assert_eq!(turn.number, 2);
        assert_eq!(turn.active, Some(C));
        let a = h.player(A);
        assert_eq!(a.speed.current, 0);
        assert_eq!(a.actions_remaining, 0);
        assert_eq!(h.player(C).speed.current, 3);
        assert!(!timers.is_running(SESSION, TimerKind::TurnDuration));
        assert!(timers.is_running(SESSION, TimerKind::Transition));
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_wraps_around() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();

        let order: Vec<_> = (0..4)
            .map(|_| {
                scheduler
                    .advance_turn(&mut timers, SESSION)
                    .unwrap()
                    .unwrap()
                    .active
                    .unwrap()
            })
            .collect();
        assert_eq!(order, vec![B, C, A, B]);
        assert_eq!(h.session().turn.number, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn advancing_a_finished_session_is_a_no_op() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();
        h.edit(|session| session.finished = true);

        assert_eq!(scheduler.advance_turn(&mut timers, SESSION).unwrap(), None);
        assert_eq!(h.session().turn.number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn advancing_clears_bonus_and_ticks_cooldowns() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();
        h.edit(|session| {
            session.player_mut(A).unwrap().combat_bonus = true;
            session
                .disabled_placeables
                .insert(game_core::PlaceableId(4), 1);
        });

        scheduler.advance_turn(&mut timers, SESSION).unwrap();

        assert!(!h.player(A).combat_bonus);
        assert!(h.session().disabled_placeables.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_are_idempotent() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();

        assert!(!scheduler.pause_for_combat(&mut timers, SESSION).unwrap());
        scheduler.on_transition_elapsed(&mut timers, SESSION).unwrap();
        assert!(!scheduler.resume_after_combat(&mut timers, SESSION).unwrap());

        tokio::time::advance(Duration::from_secs(12)).await;
        assert!(scheduler.pause_for_combat(&mut timers, SESSION).unwrap());
        assert_eq!(h.session().turn.phase, TurnPhase::CombatPause);
        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(scheduler.resume_after_combat(&mut timers, SESSION).unwrap());
        assert_eq!(h.session().turn.phase, TurnPhase::PlayerTurn);
        assert_eq!(
            scheduler.remaining_turn_time(&timers, SESSION),
            Some(h.ctx.config.turn_duration - Duration::from_secs(12))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn force_stop_cancels_everything() {
        let h = harness(three_players(), FIELD);
        let scheduler = TurnScheduler::new(h.ctx.clone());
        let mut timers = h.timers();
        scheduler.start_first_turn(&mut timers, SESSION).unwrap();
        timers.schedule(SESSION, TimerKind::CombatRound, Duration::from_secs(5));

        scheduler.force_stop(&mut timers, SESSION);

        for kind in TimerKind::ALL {
            assert!(!timers.is_running(SESSION, kind));
        }
    }
}
