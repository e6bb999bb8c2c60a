//! Sanctuary use, the one map interaction outside combat.

use crate::env::GameEnv;
use crate::error::{Missing, Result, RuleViolation};
use crate::events::SessionEvent;
use crate::state::{
    PlaceableId, PlaceableKind, Player, PlayerId, Position, SessionId, TurnDescriptor,
};

/// Blessing requested from a sanctuary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SanctuaryChoice {
    /// Restore health to max.
    Heal,
    /// Bonus attack until the end of the turn.
    BonusFight,
}

pub struct Interactions<'a> {
    env: GameEnv<'a>,
}

impl<'a> Interactions<'a> {
    pub fn new(env: GameEnv<'a>) -> Self {
        Self { env }
    }

    /// Uses the sanctuary on `position`, which must be the player's tile or
    /// a neighbour. Costs the player's action and puts the sanctuary to sleep.
    pub fn use_sanctuary(
        &self,
        session: SessionId,
        player: PlayerId,
        position: Position,
        choice: SanctuaryChoice,
    ) -> Result<PlaceableId> {
        let snapshot = self.env.store.find_by_id(session)?;
        let user = snapshot.player(player).ok_or(Missing::Player(player))?;
        if user.actions_remaining == 0 {
            return Err(RuleViolation::NoActionsRemaining(player).into());
        }
        if user.position.manhattan(position) > 1 {
            return Err(RuleViolation::SanctuaryUnavailable(position).into());
        }
        let sanctuary = self
            .env
            .grid
            .placeables_at(session, position)
            .into_iter()
            .find(|placeable| {
                placeable.kind == PlaceableKind::Sanctuary && !snapshot.is_disabled(placeable.id)
            })
            .ok_or(RuleViolation::SanctuaryUnavailable(position))?;

        let updated = self
            .env
            .store
            .update_player(session, player, &mut |p: &mut Player| {
                p.actions_remaining = p.actions_remaining.saturating_sub(1);
                if choice == SanctuaryChoice::BonusFight {
                    p.combat_bonus = true;
                }
            })?;
        if choice == SanctuaryChoice::Heal {
            self.env
                .store
                .set_health(session, player, updated.health.max)?;
        }
        self.env
            .store
            .update_turn(session, &mut |turn: &mut TurnDescriptor| turn.action_used = true)?;
        self.env.store.disable_placeable(
            session,
            sanctuary.id,
            self.env.config.sanctuary_cooldown_turns,
        )?;

        self.env.events.publish(SessionEvent::SanctuaryUsed {
            session,
            player,
            sanctuary: sanctuary.id,
            choice,
        });
        Ok(sanctuary.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::state::{GameMode, Placeable, Session};
    use crate::testing::Fixture;

    const SESSION: SessionId = SessionId(1);
    const ALICE: PlayerId = PlayerId(1);
    const SHRINE: PlaceableId = PlaceableId(7);

    fn fixture() -> Fixture {
        let session = Session::new(SESSION, 0, GameMode::Elimination)
            .with_player(Player::new(ALICE, Position::new(0, 0)).with_health(4))
            .with_player(Player::new(PlayerId(2), Position::new(3, 3)))
            .with_placeable(Placeable::new(
                SHRINE,
                PlaceableKind::Sanctuary,
                Position::new(1, 0),
            ));
        let fx = Fixture::new(session, &["....", "....", "....", "...."]);
        fx.grant_turn(ALICE);
        fx
    }

    #[test]
    fn heal_restores_health_and_spends_action() {
        let fx = fixture();
        fx.edit(|session| {
            session.player_mut(ALICE).unwrap().health.set(1);
        });

        let used = Interactions::new(fx.env())
            .use_sanctuary(SESSION, ALICE, Position::new(1, 0), SanctuaryChoice::Heal)
            .unwrap();

        assert_eq!(used, SHRINE);
        let alice = fx.player(ALICE);
        assert_eq!(alice.health.current, 4);
        assert_eq!(alice.actions_remaining, 0);
        let snapshot = fx.snapshot();
        assert!(snapshot.turn.action_used);
        assert_eq!(snapshot.disabled_placeables.get(&SHRINE), Some(&2));
    }

    #[test]
    fn bonus_fight_sets_combat_bonus() {
        let fx = fixture();
        Interactions::new(fx.env())
            .use_sanctuary(
                SESSION,
                ALICE,
                Position::new(1, 0),
                SanctuaryChoice::BonusFight,
            )
            .unwrap();
        assert!(fx.player(ALICE).combat_bonus);
    }

    #[test]
    fn dormant_sanctuary_is_unavailable() {
        let fx = fixture();
        fx.edit(|session| {
            session.disabled_placeables.insert(SHRINE, 1);
        });

        let err = Interactions::new(fx.env())
            .use_sanctuary(SESSION, ALICE, Position::new(1, 0), SanctuaryChoice::Heal)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(RuleViolation::SanctuaryUnavailable(Position::new(1, 0)))
        );
    }

    #[test]
    fn sanctuary_needs_an_action() {
        let fx = fixture();
        let interactions = Interactions::new(fx.env());
        interactions
            .use_sanctuary(SESSION, ALICE, Position::new(1, 0), SanctuaryChoice::Heal)
            .unwrap();
        fx.edit(|session| {
            session.disabled_placeables.clear();
        });

        let err = interactions
            .use_sanctuary(SESSION, ALICE, Position::new(1, 0), SanctuaryChoice::Heal)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(RuleViolation::NoActionsRemaining(ALICE))
        );
    }
}
