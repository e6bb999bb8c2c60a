//! Per-session coordinator of the turn, movement and combat engines.
//!
//! [`SessionEngine`] is the command surface a session worker drives. It owns
//! the timer registry, performs the hand-offs between engines (pausing the
//! clock when a duel opens, resuming or advancing when it ends, finishing the
//! game on victory) and is the boundary at which timer callback failures are
//! absorbed.

use std::time::Duration;

use tracing::{info, trace, warn};

use game_core::error::Result;
use game_core::{
    CombatState, GameError, Interactions, Missing, MoveOutcome, MovementEngine, Orientation,
    PlaceableId, Player, PlayerId, Position, Posture, ReachableTile, RuleViolation,
    SanctuaryChoice, Session, SessionEvent, SessionId, TurnDescriptor, TurnPhase,
};

use crate::combat::{CombatEngine, CombatProgress, DuelEnd};
use crate::context::EngineContext;
use crate::scheduler::{TurnActivation, TurnScheduler};
use crate::timers::{TimerFired, TimerKind, Timers};

pub struct SessionEngine {
    ctx: EngineContext,
    timers: Timers,
    scheduler: TurnScheduler,
    combat: CombatEngine,
}

impl SessionEngine {
    pub fn new(ctx: EngineContext, timers: Timers) -> Self {
        Self {
            scheduler: TurnScheduler::new(ctx.clone()),
            combat: CombatEngine::new(ctx.clone()),
            ctx,
            timers,
        }
    }

    fn movement(&self) -> MovementEngine<'_> {
        MovementEngine::new(self.ctx.env())
    }

    pub fn snapshot(&self, session: SessionId) -> Result<Session> {
        Ok(self.ctx.store.find_by_id(session)?)
    }

    pub fn duel(&self, session: SessionId) -> Option<&CombatState> {
        self.combat.duel(session)
    }

    // ===== turns =====

    pub fn start_first_turn(&mut self, session: SessionId) -> Result<TurnDescriptor> {
        self.scheduler.start_first_turn(&mut self.timers, session)
    }

    /// Ends the current turn. Rejected while a duel is running.
    pub fn end_turn_manual(&mut self, session: SessionId) -> Result<Option<TurnDescriptor>> {
        if self.combat.in_combat(session) {
            return Err(RuleViolation::CombatInProgress.into());
        }
        self.scheduler.end_turn_manual(&mut self.timers, session)
    }

    pub fn pause_for_combat(&mut self, session: SessionId) -> Result<bool> {
        self.scheduler.pause_for_combat(&mut self.timers, session)
    }

    pub fn resume_after_combat(&mut self, session: SessionId) -> Result<bool> {
        self.scheduler.resume_after_combat(&mut self.timers, session)
    }

    pub fn remaining_turn_time(&self, session: SessionId) -> Option<Duration> {
        self.scheduler.remaining_turn_time(&self.timers, session)
    }

    /// Only the active player, with their clock running and no duel open,
    /// may act on the map.
    fn ensure_turn_holder(&self, snapshot: &Session, player: PlayerId) -> Result<()> {
        if snapshot.player(player).is_none() {
            return Err(Missing::Player(player).into());
        }
        if snapshot.finished {
            return Err(RuleViolation::GameFinished.into());
        }
        if snapshot.turn.active.is_none() {
            return Err(RuleViolation::TurnNotStarted.into());
        }
        if !snapshot.turn.is_active(player) {
            return Err(RuleViolation::NotActivePlayer(player).into());
        }
        if self.combat.in_combat(snapshot.id) || snapshot.turn.phase == TurnPhase::CombatPause {
            return Err(RuleViolation::CombatInProgress.into());
        }
        if snapshot.turn.phase != TurnPhase::PlayerTurn {
            return Err(RuleViolation::TurnNotStarted.into());
        }
        Ok(())
    }

    // ===== movement =====

    pub fn move_player(
        &mut self,
        session: SessionId,
        player: PlayerId,
        orientation: Orientation,
    ) -> Result<MoveOutcome> {
        let snapshot = self.snapshot(session)?;
        self.ensure_turn_holder(&snapshot, player)?;
        let outcome = self.movement().move_player(session, player, orientation)?;
        if let Some(winner) = outcome.winner {
            self.finish_game(session, Some(winner))?;
        }
        Ok(outcome)
    }

    pub fn compute_reachable(
        &self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Vec<ReachableTile>> {
        self.movement().compute_reachable(session, player)
    }

    pub fn move_to_start_position(
        &mut self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Position> {
        self.movement().move_to_start_position(session, player)
    }

    pub fn use_sanctuary(
        &mut self,
        session: SessionId,
        player: PlayerId,
        position: Position,
        choice: SanctuaryChoice,
    ) -> Result<PlaceableId> {
        let snapshot = self.snapshot(session)?;
        self.ensure_turn_holder(&snapshot, player)?;
        Interactions::new(self.ctx.env()).use_sanctuary(session, player, position, choice)
    }

    // ===== combat =====

    /// Opens a duel and suspends the attacker's clock.
    pub fn attack(
        &mut self,
        session: SessionId,
        attacker: PlayerId,
        target: Position,
    ) -> Result<CombatState> {
        let duel = self
            .combat
            .attack(&mut self.timers, session, attacker, target)?;
        self.scheduler.pause_for_combat(&mut self.timers, session)?;
        Ok(duel)
    }

    pub fn choose_posture(
        &mut self,
        session: SessionId,
        player: PlayerId,
        posture: Posture,
    ) -> Result<Option<CombatProgress>> {
        let progress = self
            .combat
            .choose_posture(&mut self.timers, session, player, posture)?;
        if let Some(CombatProgress::Finished { end, .. }) = &progress {
            self.after_duel(session, end)?;
        }
        Ok(progress)
    }

    pub fn abandon_combat(
        &mut self,
        session: SessionId,
        leaver: PlayerId,
    ) -> Result<Option<DuelEnd>> {
        let end = self.combat.abandon(&mut self.timers, session, leaver)?;
        if let Some(end) = &end {
            self.after_duel(session, end)?;
        }
        Ok(end)
    }

    fn on_round_tick(&mut self, session: SessionId) -> Result<Option<CombatProgress>> {
        let progress = self.combat.on_round_tick(&mut self.timers, session)?;
        if let Some(CombatProgress::Finished { end, .. }) = &progress {
            self.after_duel(session, end)?;
        }
        Ok(progress)
    }

    /// Hands control back to the scheduler once a duel is over.
    fn after_duel(&mut self, session: SessionId, end: &DuelEnd) -> Result<()> {
        if let Some(winner) = end.game_over {
            return self.finish_game(session, Some(winner));
        }
        let snapshot = self.snapshot(session)?;
        match snapshot.turn.active {
            Some(active) if end.did_not_win(active) => {
                self.scheduler.advance_turn(&mut self.timers, session)?;
            }
            _ => {
                self.scheduler.resume_after_combat(&mut self.timers, session)?;
            }
        }
        Ok(())
    }

    // ===== session lifecycle =====

    /// Takes a player out of the game. Their duel is forfeited, a carried flag
    /// is dropped where they stand, and the last player left wins.
    pub fn leave_session(&mut self, session: SessionId, player: PlayerId) -> Result<()> {
        let snapshot = self.snapshot(session)?;
        let leaver = snapshot.player(player).ok_or(Missing::Player(player))?;
        if !leaver.in_game {
            return Ok(());
        }
        self.movement().drop_flag(session, player, leaver.position)?;
        self.ctx
            .store
            .update_player(session, player, &mut |p: &mut Player| {
                p.in_game = false;
                p.speed.clear();
                p.boat_speed.clear();
                p.actions_remaining = 0;
                p.on_boat = None;
            })?;
        info!(target: "runtime::worker", %session, %player, "player left");

        if self.combat.duel(session).is_some_and(|duel| duel.involves(player)) {
            self.abandon_combat(session, player)?;
        }

        let snapshot = self.snapshot(session)?;
        if snapshot.finished {
            return Ok(());
        }
        let mut remaining = snapshot.in_game_players().map(|p| p.id);
        match (remaining.next(), remaining.next()) {
            (last, None) => self.finish_game(session, last),
            _ if snapshot.turn.is_active(player) => {
                self.scheduler.advance_turn(&mut self.timers, session)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Records the winner, stops every timer for good and announces the end.
    pub fn finish_game(&mut self, session: SessionId, winner: Option<PlayerId>) -> Result<()> {
        self.ctx.store.set_winner(session, winner)?;
        self.combat.end(&mut self.timers, session);
        self.timers.clear(session);
        self.ctx
            .events
            .publish(SessionEvent::GameOver { session, winner });
        info!(target: "runtime::worker", %session, winner = ?winner, "game over");
        Ok(())
    }

    /// Drops the duel and every timer of the session.
    pub fn force_stop(&mut self, session: SessionId) {
        self.combat.clear(&mut self.timers, session);
        self.scheduler.force_stop(&mut self.timers, session);
    }

    // ===== timers =====

    /// Routes a timer expiry to its engine. Failures never propagate: they are
    /// logged and the session's timers are cleared. Returns the activation
    /// when a player's clock started.
    pub fn on_timer(&mut self, fired: TimerFired) -> Option<TurnActivation> {
        let session = fired.session;
        if !self.timers.accept(&fired) {
            trace!(target: "runtime::worker", %session, kind = %fired.kind, "stale timer ignored");
            return None;
        }

        let result = match fired.kind {
            TimerKind::Transition => self
                .scheduler
                .on_transition_elapsed(&mut self.timers, session)
                .map(Some),
            TimerKind::TurnDuration => self
                .scheduler
                .on_turn_timeout(&mut self.timers, session)
                .map(|_| None),
            TimerKind::CombatRound => self.on_round_tick(session).map(|_| None),
        };

        match result {
            Ok(activation) => activation,
            Err(error) => {
                warn!(
                    target: "runtime::worker",
                    %session,
                    kind = %fired.kind,
                    code = error.error_code(),
                    %error,
                    "timer callback failed; clearing session timers"
                );
                self.force_stop(session);
                None
            }
        }
    }

    pub fn is_timer_running(&self, session: SessionId, kind: TimerKind) -> bool {
        self.timers.is_running(session, kind)
    }
}
