//! Timed pickup spawning and asteroid field generation

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, IdAllocator};
use super::group::{EntityGroups, Group};
use crate::Bounds;
use crate::config::EngineConfig;
use crate::consts::{ASTEROID_START_RADIUS, PICKUP_SPEED};
use crate::services::PowerupKind;

/// Candidate positions tried before falling back to the far corner
const MAX_PLACEMENT_ATTEMPTS: u32 = 256;

/// Periodically spawned kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    Pill,
    Token,
    ShipPickup,
}

impl SpawnKind {
    pub const ALL: [SpawnKind; 3] = [SpawnKind::Pill, SpawnKind::Token, SpawnKind::ShipPickup];

    pub fn group(&self) -> Group {
        match self {
            SpawnKind::Pill => Group::Pills,
            SpawnKind::Token => Group::Tokens,
            SpawnKind::ShipPickup => Group::ShipPickups,
        }
    }
}

/// Interval gate for one spawn kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub interval_ms: f64,
    pub ttl_ms: f64,
    pub last_spawn: f64,
}

impl SpawnTimer {
    pub fn new(interval_ms: f64, ttl_ms: f64, now: f64) -> Self {
        Self {
            interval_ms,
            ttl_ms,
            last_spawn: now,
        }
    }

    #[inline]
    pub fn is_due(&self, now: f64) -> bool {
        now - self.last_spawn >= self.interval_ms
    }
}

/// Timestamp-gated creator of pills, tokens and ship pickups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    pub pill: SpawnTimer,
    pub token: SpawnTimer,
    pub ship_pickup: SpawnTimer,
    pub token_value: u32,
}

impl SpawnScheduler {
    /// First spawn of each kind comes one full interval after `now`
    pub fn new(config: &EngineConfig, now: f64) -> Self {
        Self {
            pill: SpawnTimer::new(config.pill_interval_ms, config.pill_ttl_ms, now),
            token: SpawnTimer::new(config.token_interval_ms, config.token_ttl_ms, now),
            ship_pickup: SpawnTimer::new(config.ship_pickup_interval_ms, config.ship_pickup_ttl_ms, now),
            token_value: config.token_value,
        }
    }

    /// Restart every timer from `now`
    pub fn reset(&mut self, now: f64) {
        self.pill.last_spawn = now;
        self.token.last_spawn = now;
        self.ship_pickup.last_spawn = now;
    }

    pub fn timer(&self, kind: SpawnKind) -> &SpawnTimer {
        match kind {
            SpawnKind::Pill => &self.pill,
            SpawnKind::Token => &self.token,
            SpawnKind::ShipPickup => &self.ship_pickup,
        }
    }

    fn timer_mut(&mut self, kind: SpawnKind) -> &mut SpawnTimer {
        match kind {
            SpawnKind::Pill => &mut self.pill,
            SpawnKind::Token => &mut self.token,
            SpawnKind::ShipPickup => &mut self.ship_pickup,
        }
    }

    /// Spawn one `kind` if its interval elapsed.
    ///
    /// Ship pickups additionally wait until none is in flight. A suppressed
    /// ship pickup leaves its timer untouched so it appears as soon as the
    /// field is clear.
    pub fn try_spawn(
        &mut self,
        kind: SpawnKind,
        groups: &mut EntityGroups,
        rng: &mut Pcg32,
        ids: &mut IdAllocator,
        bounds: Bounds,
        now: f64,
    ) -> Option<EntityId> {
        if !self.timer(kind).is_due(now) {
            return None;
        }
        if kind == SpawnKind::ShipPickup && !groups.is_empty(Group::ShipPickups) {
            return None;
        }

        let ttl = self.timer(kind).ttl_ms;
        let id = ids.next_id();
        let entity = match kind {
            SpawnKind::Pill => {
                let (pos, vel) = edge_spawn(rng, bounds);
                let powerup = if rng.random_bool(0.5) {
                    PowerupKind::Invincible
                } else {
                    PowerupKind::RapidFire
                };
                Entity::pill(id, pos, vel, powerup, now, ttl)
            }
            SpawnKind::Token => {
                let (pos, vel) = edge_spawn(rng, bounds);
                Entity::token(id, pos, vel, self.token_value, now, ttl)
            }
            SpawnKind::ShipPickup => {
                let pos = Vec2::new(
                    rng.random_range(0.0..bounds.width),
                    rng.random_range(0.0..bounds.height),
                );
                Entity::ship_pickup(id, pos, now, ttl)
            }
        };
        groups.push(kind.group(), entity);
        self.timer_mut(kind).last_spawn = now;
        log::debug!("Spawned {:?} {:?}", kind, id);
        Some(id)
    }

    /// Run every timer once; returns how many entities were created
    pub fn run(
        &mut self,
        groups: &mut EntityGroups,
        rng: &mut Pcg32,
        ids: &mut IdAllocator,
        bounds: Bounds,
        now: f64,
    ) -> usize {
        SpawnKind::ALL
            .into_iter()
            .filter_map(|kind| self.try_spawn(kind, groups, rng, ids, bounds, now))
            .count()
    }
}

/// A point on a random screen edge with a drift heading into the field
pub fn edge_spawn(rng: &mut Pcg32, bounds: Bounds) -> (Vec2, Vec2) {
    let along = |rng: &mut Pcg32, max: f32| rng.random_range(0.0..max);
    let (pos, inward) = match rng.random_range(0..4u8) {
        0 => (Vec2::new(along(rng, bounds.width), 0.0), Vec2::Y),
        1 => (Vec2::new(bounds.width, along(rng, bounds.height)), -Vec2::X),
        2 => (Vec2::new(along(rng, bounds.width), bounds.height), -Vec2::Y),
        _ => (Vec2::new(0.0, along(rng, bounds.height)), Vec2::X),
    };
    // Mostly inward with some sideways drift
    let side = Vec2::new(inward.y, -inward.x) * rng.random_range(-0.5..0.5);
    (pos, (inward + side).normalize() * PICKUP_SPEED)
}

/// True if `candidate` lies inside the square exclusion zone around `ship`
#[inline]
pub fn in_exclusion_zone(candidate: Vec2, ship: Vec2, radius: f32) -> bool {
    (candidate.x - ship.x).abs() < radius && (candidate.y - ship.y).abs() < radius
}

/// Place `count` full-size asteroids away from the ship
pub fn spawn_asteroids(
    count: u32,
    groups: &mut EntityGroups,
    rng: &mut Pcg32,
    ids: &mut IdAllocator,
    bounds: Bounds,
    exclusion: f32,
) -> Vec<EntityId> {
    let ship = groups.ship().map(|s| s.pos).unwrap_or_else(|| bounds.center());

    (0..count)
        .map(|_| {
            let pos = safe_position(rng, bounds, ship, exclusion);
            let id = ids.next_id();
            groups.push(Group::Asteroids, Entity::asteroid(id, pos, ASTEROID_START_RADIUS, rng));
            id
        })
        .collect()
}

fn safe_position(rng: &mut Pcg32, bounds: Bounds, ship: Vec2, exclusion: f32) -> Vec2 {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = Vec2::new(
            rng.random_range(0.0..bounds.width),
            rng.random_range(0.0..bounds.height),
        );
        if !in_exclusion_zone(candidate, ship, exclusion) {
            return candidate;
        }
    }
    // Field too small to sample a free spot; the far corner is as safe as it gets
    let corner = Vec2::new(
        if ship.x < bounds.width / 2.0 { bounds.width } else { 0.0 },
        if ship.y < bounds.height / 2.0 { bounds.height } else { 0.0 },
    );
    log::warn!("No asteroid position outside the exclusion zone, using corner {corner}");
    corner
}
