//! Duel lifecycle: opening, posture rounds on a timed cadence, and endings.
//!
//! Round math lives in [`game_core::combat`]. This engine owns the
//! per-session [`CombatState`] arena, arms the cadence timer, writes round
//! results back through the store and settles the duel's consequences
//! (respawn, dropped flag, win/loss counters, elimination victory).

use std::collections::HashMap;

use tracing::{debug, info};

use game_core::combat::{CombatProfile, Dice, judge, resolve_round};
use game_core::error::Result;
use game_core::{
    CombatEndReason, CombatState, Combatant, DicePolicy, DuelOutcome, GameMode, Missing,
    MovementEngine, Player, PlayerId, Position, Posture, RoundReport, RuleViolation, Session,
    SessionEvent, SessionId, TileEffect, TurnDescriptor, TurnPhase,
};

use crate::context::EngineContext;
use crate::timers::{TimerKind, Timers};

/// How a duel finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuelEnd {
    pub participants: [PlayerId; 2],
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub reason: CombatEndReason,
    /// Set when the win ended an elimination game.
    pub game_over: Option<PlayerId>,
}

impl DuelEnd {
    /// True when `player` lost or drew the duel.
    pub fn did_not_win(&self, player: PlayerId) -> bool {
        self.participants.contains(&player) && self.winner != Some(player)
    }
}

/// Result of a resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatProgress {
    /// Both sides still stand; the next round is armed.
    Ongoing(RoundReport),
    Finished { report: RoundReport, end: DuelEnd },
}

pub struct CombatEngine {
    ctx: EngineContext,
    duels: HashMap<SessionId, CombatState>,
}

impl CombatEngine {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            duels: HashMap::new(),
        }
    }

    pub fn duel(&self, session: SessionId) -> Option<&CombatState> {
        self.duels.get(&session)
    }

    pub fn in_combat(&self, session: SessionId) -> bool {
        self.duels.contains_key(&session)
    }

    /// Opens a duel between the active player and the opponent on `target`.
    pub fn attack(
        &mut self,
        timers: &mut Timers,
        session: SessionId,
        attacker: PlayerId,
        target: Position,
    ) -> Result<CombatState> {
        let snapshot = self.ctx.store.find_by_id(session)?;
        if snapshot.finished {
            return Err(RuleViolation::GameFinished.into());
        }
        let striker = snapshot
            .player(attacker)
            .ok_or(Missing::Player(attacker))?;
        if !snapshot.turn.is_active(attacker) {
            return Err(RuleViolation::NotActivePlayer(attacker).into());
        }
        if self.in_combat(session) || snapshot.turn.phase == TurnPhase::CombatPause {
            return Err(RuleViolation::CombatInProgress.into());
        }
        if snapshot.turn.phase != TurnPhase::PlayerTurn {
            return Err(RuleViolation::TurnNotStarted.into());
        }
        if striker.actions_remaining == 0 {
            return Err(RuleViolation::NoActionsRemaining(attacker).into());
        }
        if !striker.position.is_adjacent(target) {
            return Err(RuleViolation::TargetNotAdjacent(target).into());
        }
        let defender = self
            .ctx
            .grid
            .occupant_at(session, target)
            .filter(|&occupant| occupant != attacker)
            .ok_or(RuleViolation::NoOpponentAt(target))?;
        let opponent = snapshot
            .player(defender)
            .ok_or(Missing::Player(defender))?;
        if snapshot.mode == GameMode::CaptureTheFlag && striker.is_teammate(opponent) {
            return Err(RuleViolation::FriendlyFire(defender).into());
        }

        self.ctx
            .store
            .update_player(session, attacker, &mut |p: &mut Player| {
                p.actions_remaining = p.actions_remaining.saturating_sub(1);
                p.combat.count += 1;
            })?;
        self.ctx
            .store
            .update_player(session, defender, &mut |p: &mut Player| p.combat.count += 1)?;
        self.ctx
            .store
            .update_turn(session, &mut |turn: &mut TurnDescriptor| turn.action_used = true)?;

        let duel = CombatState::new(
            Combatant::new(attacker, self.tile_effect(session, striker.position)),
            Combatant::new(defender, self.tile_effect(session, opponent.position)),
        )
        .numbered(striker.combat.count + 1);
        self.duels.insert(session, duel);
        self.ctx.events.publish(SessionEvent::CombatStarted {
            session,
            attacker,
            defender,
        });
        timers.schedule(
            session,
            TimerKind::CombatRound,
            self.ctx.config.combat_round_interval,
        );
        info!(target: "runtime::combat", %session, %attacker, %defender, "duel started");
        Ok(duel)
    }

    fn tile_effect(&self, session: SessionId, position: Position) -> TileEffect {
        self.ctx
            .grid
            .tile_at(session, position)
            .map_or(TileEffect::NONE, |tile| {
                tile.combat_effect(self.ctx.game_config())
            })
    }

    /// Records a posture. Resolves the round at once when both sides have
    /// chosen. Without a running duel this does nothing.
    pub fn choose_posture(
        &mut self,
        timers: &mut Timers,
        session: SessionId,
        player: PlayerId,
        posture: Posture,
    ) -> Result<Option<CombatProgress>> {
        let Some(duel) = self.duels.get_mut(&session) else {
            return Ok(None);
        };
        let both_chosen = duel.choose(player, posture)?;
        self.ctx.events.publish(SessionEvent::PostureChosen {
            session,
            player,
            posture,
        });
        if !both_chosen {
            return Ok(None);
        }
        timers.cancel(session, TimerKind::CombatRound);
        self.resolve(timers, session)
    }

    /// Cadence tick: resolves the round with whatever postures were chosen.
    pub fn on_round_tick(
        &mut self,
        timers: &mut Timers,
        session: SessionId,
    ) -> Result<Option<CombatProgress>> {
        self.resolve(timers, session)
    }

    fn resolve(&mut self, timers: &mut Timers, session: SessionId) -> Result<Option<CombatProgress>> {
        let Some(duel) = self.duels.get(&session).copied() else {
            return Ok(None);
        };
        let snapshot = self.ctx.store.find_by_id(session)?;
        let config = self.ctx.game_config();
        let profile = |player: PlayerId| {
            snapshot
                .player(player)
                .map(|p| CombatProfile::of(p, config))
                .ok_or(Missing::Player(player))
        };
        let profiles = [profile(duel.attacker())?, profile(duel.defender())?];
        let dice = Dice::new(
            self.ctx.rng.as_ref(),
            DicePolicy::for_session(snapshot.unrestricted),
            snapshot.seed,
            Dice::nonce(snapshot.turn.number, duel.sequence, duel.round),
        );
        let report = resolve_round(&duel, profiles, &dice, config);

        for side in &report.sides {
            self.ctx.store.set_health(session, side.player, side.health)?;
        }
        if let Some(state) = self.duels.get_mut(&session) {
            state.finish_round();
        }
        self.ctx
            .events
            .publish(SessionEvent::CombatRoundResolved { session, report });
        debug!(
            target: "runtime::combat",
            %session,
            round = report.round,
            attacker_health = report.sides[0].health,
            defender_health = report.sides[1].health,
            "round resolved"
        );

        let end = match judge(report.healths()) {
            DuelOutcome::Continue => {
                timers.schedule(
                    session,
                    TimerKind::CombatRound,
                    self.ctx.config.combat_round_interval,
                );
                return Ok(Some(CombatProgress::Ongoing(report)));
            }
            DuelOutcome::Victory { winner, loser } => {
                self.settle_fall(session, &snapshot, loser)?;
                self.conclude(
                    timers,
                    session,
                    &snapshot,
                    duel.participants(),
                    Some((winner, loser)),
                    CombatEndReason::Defeat,
                )?
            }
            DuelOutcome::Draw => {
                for player in duel.participants() {
                    self.settle_fall(session, &snapshot, player)?;
                }
                self.conclude(
                    timers,
                    session,
                    &snapshot,
                    duel.participants(),
                    None,
                    CombatEndReason::Draw,
                )?
            }
        };
        Ok(Some(CombatProgress::Finished { report, end }))
    }

    /// A fallen combatant drops a carried flag where they fell, then respawns.
    fn settle_fall(&self, session: SessionId, snapshot: &Session, player: PlayerId) -> Result<()> {
        let fell_at = snapshot
            .player(player)
            .ok_or(Missing::Player(player))?
            .position;
        let movement = MovementEngine::new(self.ctx.env());
        movement.drop_flag(session, player, fell_at)?;
        movement.move_to_start_position(session, player)?;
        Ok(())
    }

    /// Ends the running duel of a participant who left: the opponent wins
    /// without a round being thrown.
    pub fn abandon(
        &mut self,
        timers: &mut Timers,
        session: SessionId,
        leaver: PlayerId,
    ) -> Result<Option<DuelEnd>> {
        let Some(duel) = self.duels.get(&session).copied() else {
            return Ok(None);
        };
        let winner = duel
            .opponent_of(leaver)
            .ok_or(RuleViolation::NotCombatant(leaver))?;
        let snapshot = self.ctx.store.find_by_id(session)?;
        let end = self.conclude(
            timers,
            session,
            &snapshot,
            duel.participants(),
            Some((winner, leaver)),
            CombatEndReason::Abandoned,
        )?;
        Ok(Some(end))
    }

    /// Updates counters, tears the duel down and checks for an elimination win.
    fn conclude(
        &mut self,
        timers: &mut Timers,
        session: SessionId,
        snapshot: &Session,
        participants: [PlayerId; 2],
        decided: Option<(PlayerId, PlayerId)>,
        reason: CombatEndReason,
    ) -> Result<DuelEnd> {
        self.end(timers, session);

        let mut game_over = None;
        match decided {
            Some((winner, loser)) => {
                let victor = self
                    .ctx
                    .store
                    .update_player(session, winner, &mut |p: &mut Player| p.combat.wins += 1)?;
                self.ctx
                    .store
                    .update_player(session, loser, &mut |p: &mut Player| p.combat.losses += 1)?;
                if snapshot.mode == GameMode::Elimination
                    && victor.combat.wins >= self.ctx.game_config().wins_to_victory
                {
                    game_over = Some(winner);
                }
            }
            None => {
                for player in participants {
                    self.ctx
                        .store
                        .update_player(session, player, &mut |p: &mut Player| p.combat.draws += 1)?;
                }
            }
        }

        let end = DuelEnd {
            participants,
            winner: decided.map(|(winner, _)| winner),
            loser: decided.map(|(_, loser)| loser),
            reason,
            game_over,
        };
        self.ctx.events.publish(SessionEvent::CombatEnded {
            session,
            winner: end.winner,
            loser: end.loser,
            reason,
        });
        info!(
            target: "runtime::combat",
            %session,
            %reason,
            winner = ?end.winner,
            game_over = game_over.is_some(),
            "duel ended"
        );
        Ok(end)
    }

    /// Drops the duel and its cadence timer.
    pub fn end(&mut self, timers: &mut Timers, session: SessionId) -> Option<CombatState> {
        timers.cancel(session, TimerKind::CombatRound);
        self.duels.remove(&session)
    }

    pub fn clear(&mut self, timers: &mut Timers, session: SessionId) {
        self.end(timers, session);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FixedRng, Harness, harness_with_rng};
    use game_core::{DiceKind, EngineError, FlagRecord, Session, TurnDescriptor};

    const SESSION: SessionId = SessionId(1);
    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);
    const FIELD: &[&str] = &["....", "....", "....", "...."];

    fn fighter(id: PlayerId, x: i32) -> Player {
        Player::new(id, Position::new(x, 0))
            .with_attack(4)
            .with_defense(2)
            .with_health(10)
            .with_dice(DiceKind::D6, DiceKind::D6)
    }

    fn duel_ready(session: Session, rows: &[&str], rng: FixedRng) -> Harness {
        let h = harness_with_rng(session, rows, rng);
        h.edit(|session| {
            session.turn = TurnDescriptor {
                number: 1,
                active: Some(A),
                action_used: false,
                phase: TurnPhase::PlayerTurn,
            };
            session.player_mut(A).unwrap().actions_remaining = 1;
        });
        h
    }

    fn elimination() -> Session {
        Session::new(SESSION, 0, GameMode::Elimination)
            .with_player(fighter(A, 0))
            .with_player(fighter(B, 1))
    }

    #[tokio::test(start_paused = true)]
    async fn attack_opens_duel_and_spends_action() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        let duel = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        assert_eq!(duel.participants(), [A, B]);
        assert_eq!(h.player(A).actions_remaining, 0);
        assert_eq!(h.player(A).combat.count, 1);
        assert_eq!(h.player(B).combat.count, 1);
        assert!(h.session().turn.action_used);
        assert!(timers.is_running(SESSION, TimerKind::CombatRound));
        assert_eq!(h.events.kinds(), vec!["combat_started"]);
    }

    #[tokio::test(start_paused = true)]
    async fn attack_rejections() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        let err = combat
            .attack(&mut timers, SESSION, B, Position::new(0, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::NotActivePlayer(B)));

        let err = combat
            .attack(&mut timers, SESSION, A, Position::new(2, 0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(RuleViolation::TargetNotAdjacent(Position::new(2, 0)))
        );

        let err = combat
            .attack(&mut timers, SESSION, PlayerId(9), Position::new(1, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound(Missing::Player(PlayerId(9))));

        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();
        let err = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::CombatInProgress));
    }

    #[tokio::test(start_paused = true)]
    async fn attack_needs_an_opponent_and_an_action() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        h.edit(|session| session.player_mut(B).unwrap().position = Position::new(3, 0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        let err = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(RuleViolation::NoOpponentAt(Position::new(1, 0)))
        );

        h.edit(|session| {
            session.player_mut(B).unwrap().position = Position::new(1, 0);
            session.player_mut(A).unwrap().actions_remaining = 0;
        });
        let err = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::NoActionsRemaining(A)));
    }

    #[tokio::test(start_paused = true)]
    async fn teammates_cannot_duel_in_capture_the_flag() {
        let session = Session::new(SESSION, 0, GameMode::CaptureTheFlag)
            .with_player(fighter(A, 0).with_team(1))
            .with_player(fighter(B, 1).with_team(1));
        let h = duel_ready(session, FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        let err = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidRequest(RuleViolation::FriendlyFire(B)));
    }

    #[tokio::test(start_paused = true)]
    async fn both_postures_resolve_the_round_immediately() {
        // FixedRng(2) rolls 3 on a d6: attack 4+3 (+2 offensive), defense 2+3 (+2 defensive).
        let h = duel_ready(elimination(), FIELD, FixedRng(2));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        assert_eq!(
            combat
                .choose_posture(&mut timers, SESSION, A, Posture::Offensive)
                .unwrap(),
            None
        );
        let progress = combat
            .choose_posture(&mut timers, SESSION, B, Posture::Defensive)
            .unwrap()
            .unwrap();

        let CombatProgress::Ongoing(report) = progress else {
            panic!("duel should continue");
        };
        assert_eq!(report.round, 1);
        // A: attack 9, defense 5. B: attack 7, defense 7.
        assert_eq!(report.side(A).unwrap().damage_taken, 2);
        assert_eq!(report.side(B).unwrap().damage_taken, 2);
        assert_eq!(h.player(A).health.current, 8);
        assert_eq!(h.player(B).health.current, 8);
        assert_eq!(combat.duel(SESSION).unwrap().round, 1);
        assert!(combat.duel(SESSION).unwrap().sides.iter().all(|s| s.posture.is_none()));
        assert!(timers.is_running(SESSION, TimerKind::CombatRound));
    }

    #[tokio::test(start_paused = true)]
    async fn posture_from_outsider_is_rejected() {
        let session = elimination().with_player(fighter(PlayerId(3), 3));
        let h = duel_ready(session, FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        assert_eq!(
            combat
                .choose_posture(&mut timers, SESSION, PlayerId(3), Posture::Offensive)
                .unwrap(),
            None
        );
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();
        let err = combat
            .choose_posture(&mut timers, SESSION, PlayerId(3), Posture::Offensive)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(RuleViolation::NotCombatant(PlayerId(3)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn defeat_respawns_loser_and_drops_flag() {
        let session = Session::new(SESSION, 0, GameMode::CaptureTheFlag)
            .with_player(fighter(A, 0).with_attack(20))
            .with_player(fighter(B, 3));
        let h = duel_ready(session, FIELD, FixedRng(0));
        h.edit(|session| {
            session.player_mut(B).unwrap().position = Position::new(1, 0);
            session.flag = Some(FlagRecord {
                holder: Some(B),
                position: Position::new(1, 0),
            });
        });
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();
        h.events.take();

        let progress = combat.on_round_tick(&mut timers, SESSION).unwrap().unwrap();

        let CombatProgress::Finished { end, .. } = progress else {
            panic!("duel should be over");
        };
        assert_eq!(end.winner, Some(A));
        assert_eq!(end.loser, Some(B));
        assert_eq!(end.reason, CombatEndReason::Defeat);
        assert_eq!(end.game_over, None);

        let b = h.player(B);
        assert_eq!(b.position, Position::new(3, 0));
        assert_eq!(b.health.current, 10);
        assert_eq!(b.combat.losses, 1);
        assert_eq!(h.player(A).combat.wins, 1);
        assert_eq!(
            h.session().flag,
            Some(FlagRecord::on_ground(Position::new(1, 0)))
        );
        assert!(combat.duel(SESSION).is_none());
        assert!(!timers.is_running(SESSION, TimerKind::CombatRound));
        assert_eq!(
            h.events.kinds(),
            vec![
                "combat_round_resolved",
                "flag_dropped",
                "player_respawned",
                "combat_ended"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_fall_is_a_draw() {
        let session = Session::new(SESSION, 0, GameMode::Elimination)
            .with_player(fighter(A, 0).with_attack(20).with_health(3))
            .with_player(fighter(B, 1).with_attack(20).with_health(3));
        let h = duel_ready(session, FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        let progress = combat.on_round_tick(&mut timers, SESSION).unwrap().unwrap();

        let CombatProgress::Finished { end, .. } = progress else {
            panic!("duel should be over");
        };
        assert_eq!(end.winner, None);
        assert_eq!(end.reason, CombatEndReason::Draw);
        assert!(end.did_not_win(A) && end.did_not_win(B));
        for id in [A, B] {
            let player = h.player(id);
            assert_eq!(player.combat.draws, 1);
            assert_eq!(player.health.current, 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reaching_the_win_threshold_ends_the_game() {
        let session = Session::new(SESSION, 0, GameMode::Elimination)
            .with_player(fighter(A, 0).with_attack(20))
            .with_player(fighter(B, 1));
        let h = duel_ready(session, FIELD, FixedRng(0));
        h.edit(|session| session.player_mut(A).unwrap().combat.wins = 2);
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        let progress = combat.on_round_tick(&mut timers, SESSION).unwrap().unwrap();

        let CombatProgress::Finished { end, .. } = progress else {
            panic!("duel should be over");
        };
        assert_eq!(end.game_over, Some(A));
        assert_eq!(h.player(A).combat.wins, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unrestricted_sessions_roll_loaded_dice() {
        let h = duel_ready(elimination().unrestricted(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        let Some(CombatProgress::Ongoing(report)) =
            combat.on_round_tick(&mut timers, SESSION).unwrap()
        else {
            panic!("duel should continue");
        };
        for side in report.sides {
            assert_eq!(side.attack_roll, 6);
            assert_eq!(side.defense_roll, 1);
            // 4 + 6 against 2 + 1.
            assert_eq!(side.damage_taken, 7);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_credits_the_opponent() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();
        assert_eq!(combat.abandon(&mut timers, SESSION, B).unwrap(), None);
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();
        h.events.take();

        let end = combat.abandon(&mut timers, SESSION, B).unwrap().unwrap();

        assert_eq!(end.winner, Some(A));
        assert_eq!(end.reason, CombatEndReason::Abandoned);
        assert_eq!(h.player(A).combat.wins, 1);
        assert_eq!(h.player(B).combat.losses, 1);
        assert_eq!(h.player(B).health.current, 10);
        assert_eq!(h.events.kinds(), vec!["combat_ended"]);
        assert!(!combat.in_combat(SESSION));
    }

    #[tokio::test(start_paused = true)]
    async fn second_duel_of_a_turn_gets_its_own_number() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let mut timers = h.timers();

        let first = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();
        combat.abandon(&mut timers, SESSION, B).unwrap();
        h.edit(|session| session.player_mut(A).unwrap().actions_remaining = 1);
        let second = combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        assert_eq!((first.sequence, second.sequence), (1, 2));
        assert_eq!(h.session().turn.number, 1);
        assert_ne!(
            Dice::nonce(1, first.sequence, first.round),
            Dice::nonce(1, second.sequence, second.round)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cadence_tick_fires_after_interval() {
        let h = duel_ready(elimination(), FIELD, FixedRng(0));
        let mut combat = CombatEngine::new(h.ctx.clone());
        let (mut timers, mut fired_rx) = crate::timers::Timers::channel();
        combat
            .attack(&mut timers, SESSION, A, Position::new(1, 0))
            .unwrap();

        tokio::time::advance(h.ctx.config.combat_round_interval - Duration::from_millis(1)).await;
        assert!(fired_rx.try_recv().is_err());
        let fired = fired_rx.recv().await.unwrap();
        assert_eq!(fired.kind, TimerKind::CombatRound);
        assert!(timers.accept(&fired));
    }
}
