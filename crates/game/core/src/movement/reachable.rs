use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::events::ReachableTile;
use crate::state::{Player, Position};

use super::terrain::Terrain;

/// Movement points left along one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Points {
    speed: u32,
    boat: u32,
}

impl Points {
    fn of(player: &Player) -> Self {
        Self {
            speed: player.speed.current,
            boat: player.boat_speed.current,
        }
    }

    fn total(self) -> u32 {
        self.speed + self.boat
    }

    /// Points a step may draw on. Boat speed only counts while aboard.
    fn usable(self, afloat: bool) -> u32 {
        if afloat {
            self.total()
        } else {
            self.speed
        }
    }

    /// Charges a step taken in the given state, speed first, like
    /// [`Player::spend_movement`].
    fn charge(self, cost: u32, afloat: bool) -> Option<Self> {
        if cost > self.usable(afloat) {
            return None;
        }
        let from_speed = cost.min(self.speed);
        Some(Self {
            speed: self.speed - from_speed,
            boat: self.boat - (cost - from_speed),
        })
    }

    fn covers(self, other: Self) -> bool {
        self.speed >= other.speed && self.boat >= other.boat
    }
}

/// Uniform-cost search over `(position, afloat)` states.
///
/// Each state keeps the non-dominated `(speed, boat)` pairs that reach it:
/// boat points left after going ashore come back into play on the next
/// free boat, so the cheapest path is not always the most useful one.
/// Teleport tiles with a usable exit are never stopping points.
pub(crate) fn search(terrain: &Terrain<'_>, mover: &Player) -> Vec<ReachableTile> {
    let origin = mover.position;
    let start = Points::of(mover);
    let afloat = mover.on_boat.is_some();

    let mut labels: BTreeMap<(Position, bool), Vec<Points>> = BTreeMap::new();
    let mut frontier = BinaryHeap::new();
    labels.insert((origin, afloat), vec![start]);
    frontier.push(Reverse((0u32, origin, afloat, start)));

    while let Some(Reverse((spent, position, afloat, points))) = frontier.pop() {
        let live = labels
            .get(&(position, afloat))
            .is_some_and(|known| known.contains(&points));
        if !live {
            continue;
        }
        for neighbor in position.neighbors() {
            let Some(step) = terrain.enter(neighbor, afloat) else {
                continue;
            };
            let Some(left) = points.charge(step.cost, afloat) else {
                continue;
            };
            let known = labels.entry((step.landing, step.afloat)).or_default();
            if known.iter().any(|&other| other.covers(left)) {
                continue;
            }
            known.retain(|&other| !left.covers(other));
            known.push(left);
            frontier.push(Reverse((
                spent + step.cost,
                step.landing,
                step.afloat,
                left,
            )));
        }
    }

    let mut best: BTreeMap<Position, (u32, u32)> = BTreeMap::new();
    for ((position, afloat), known) in labels {
        if position == origin {
            continue;
        }
        for points in known {
            let cost = start.total() - points.total();
            let remaining = points.usable(afloat);
            best.entry(position)
                .and_modify(|slot| {
                    if (cost, Reverse(remaining)) < (slot.0, Reverse(slot.1)) {
                        *slot = (cost, remaining);
                    }
                })
                .or_insert((cost, remaining));
        }
    }

    let mut tiles: Vec<ReachableTile> = best
        .into_iter()
        .map(|(position, (cost, remaining))| ReachableTile {
            position,
            cost,
            remaining,
        })
        .collect();
    tiles.sort_by_key(|tile| (tile.cost, tile.position.y, tile.position.x));
    tiles
}
