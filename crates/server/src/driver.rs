//! Scripted driver that plays every scripted player's turn.
//!
//! Picks random steps, heals at a nearby sanctuary when hurt, attacks an
//! adjacent opponent if one is in reach, then ends the turn. Refused commands
//! are logged and skipped; only transport failures stop the driver.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use game_core::{
    CombatState, Orientation, PlaceableKind, PlayerId, Posture, SanctuaryChoice, SessionEvent,
    TurnPhase,
};
use runtime::{CombatProgress, RuntimeError, SessionHandle};

pub struct ScriptedDriver {
    session: SessionHandle,
    turns: broadcast::Receiver<SessionEvent>,
    rng: StdRng,
}

/// Swallows rule rejections, propagates everything else.
fn refused(err: RuntimeError, command: &str) -> Result<()> {
    if err.engine().is_some() {
        debug!(command, error = %err, "command refused");
        Ok(())
    } else {
        Err(err.into())
    }
}

impl ScriptedDriver {
    pub fn new(
        session: SessionHandle,
        turns: broadcast::Receiver<SessionEvent>,
        seed: u64,
    ) -> Self {
        Self {
            session,
            turns,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Plays until the game is over or `max_turns` have been started.
    pub async fn run(mut self, max_turns: u64) -> Result<()> {
        let first = self.session.start_first_turn().await?;
        info!(player = ?first.active, "first turn selected");

        loop {
            let event = match self.turns.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "driver lagged behind turn events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let SessionEvent::TurnStarted {
                turn,
                player,
                scripted,
                ..
            } = event
            else {
                continue;
            };
            if turn > max_turns {
                info!(turn, "turn limit reached");
                break;
            }
            if !scripted {
                continue;
            }

            self.play_turn(player).await?;
            let state = self.session.query_session().await?;
            if state.finished {
                info!(winner = ?state.winner, turn = state.turn.number, "game over");
                break;
            }
        }

        self.session.force_stop().await?;
        Ok(())
    }

    async fn play_turn(&mut self, player: PlayerId) -> Result<()> {
        let reachable = self.session.compute_reachable(player).await?;
        debug!(%player, options = reachable.len(), "turn started");

        for _ in 0..self.rng.gen_range(0..=3) {
            let orientation = Orientation::ALL[self.rng.gen_range(0..Orientation::ALL.len())];
            match self.session.move_player(player, orientation).await {
                Ok(outcome) if outcome.remaining_speed == 0 => break,
                Ok(_) => {}
                Err(err) => refused(err, "move")?,
            }
        }

        let state = self.session.query_session().await?;
        let Some(me) = state.player(player) else {
            return Ok(());
        };

        if me.health.current < me.health.max
            && let Some(sanctuary) = state.placeables.iter().find(|p| {
                p.kind == PlaceableKind::Sanctuary
                    && p.position.manhattan(me.position) <= 1
                    && !state.is_disabled(p.id)
            })
        {
            let used = self
                .session
                .use_sanctuary(player, sanctuary.position, SanctuaryChoice::Heal)
                .await;
            if let Err(err) = used {
                refused(err, "use_sanctuary")?;
            }
        }

        let target = state
            .in_game_players()
            .find(|other| other.id != player && other.position.is_adjacent(me.position))
            .map(|other| other.position);
        if let Some(target) = target {
            match self.session.attack(player, target).await {
                Ok(duel) => self.fight(duel).await?,
                Err(err) => refused(err, "attack")?,
            }
        }

        // A lost duel or the turn clock may already have moved on.
        let state = self.session.query_session().await?;
        if !state.finished
            && state.turn.active == Some(player)
            && state.turn.phase == TurnPhase::PlayerTurn
            && let Err(err) = self.session.end_turn().await
        {
            refused(err, "end_turn")?;
        }
        Ok(())
    }

    async fn fight(&mut self, duel: CombatState) -> Result<()> {
        let duelists = duel.sides.map(|side| side.player);
        loop {
            let mut progress = None;
            for player in duelists {
                let posture = if self.rng.gen_bool(0.5) {
                    Posture::Offensive
                } else {
                    Posture::Defensive
                };
                match self.session.choose_posture(player, posture).await {
                    Ok(result) => progress = result,
                    Err(err) => return refused(err, "choose_posture"),
                }
            }
            match progress {
                Some(CombatProgress::Ongoing(report)) => {
                    debug!(?report, "round resolved");
                }
                Some(CombatProgress::Finished { end, .. }) => {
                    info!(winner = ?end.winner, reason = %end.reason, "duel finished");
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }
}
