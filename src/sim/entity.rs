//! Entity model
//!
//! Every simulated object shares the same transform fields; kind-specific data
//! lives in the `EntityKind` variant.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::group::Group;
use crate::consts::*;
use crate::renderer::Rgba;
use crate::services::PowerupKind;

/// Stable entity identity. `EntityId(0)` means "not yet assigned".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const UNASSIGNED: Self = Self(0);

    #[inline]
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

/// Monotonic id source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Ids run out after `u32::MAX - 1` allocations; the last one then repeats
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Make sure ids handed out later never collide with an externally built one.
    ///
    /// Returns false, leaving the allocator untouched, for an id with no room
    /// after it.
    pub fn observe(&mut self, id: EntityId) -> bool {
        if id.0 < self.next {
            return true;
        }
        match id.0.checked_add(1) {
            Some(next) => {
                self.next = next;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipData {
    /// Thrust held during the last update (drives exhaust and flame drawing)
    pub thrusting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsteroidData {
    /// Points granted on destruction
    pub score: u32,
    /// Degrees per frame
    pub rotation_speed: f32,
    /// Outline as radius multipliers, one per evenly spaced angle
    pub outline: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletData {
    pub power: u8,
    /// Frames left before the bullet fizzles
    pub life_span: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleData {
    /// Frames left
    pub life_span: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillData {
    pub powerup: PowerupKind,
    pub created_at: f64,
    pub time_to_live: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub value: u32,
    pub created_at: f64,
    pub time_to_live: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipPickupData {
    pub created_at: f64,
    pub time_to_live: f64,
}

/// Kind-specific entity data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Ship(ShipData),
    Asteroid(AsteroidData),
    Bullet(BulletData),
    Particle(ParticleData),
    Pill(PillData),
    Token(TokenData),
    ShipPickup(ShipPickupData),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Ship(_) => "ship",
            EntityKind::Asteroid(_) => "asteroid",
            EntityKind::Bullet(_) => "bullet",
            EntityKind::Particle(_) => "particle",
            EntityKind::Pill(_) => "pill",
            EntityKind::Token(_) => "token",
            EntityKind::ShipPickup(_) => "ship pickup",
        }
    }

    /// The only group an entity of this kind may live in
    pub fn home_group(&self) -> Group {
        match self {
            EntityKind::Ship(_) => Group::Ship,
            EntityKind::Asteroid(_) => Group::Asteroids,
            EntityKind::Bullet(_) => Group::Bullets,
            EntityKind::Particle(_) => Group::Particles,
            EntityKind::Pill(_) => Group::Pills,
            EntityKind::Token(_) => Group::Tokens,
            EntityKind::ShipPickup(_) => Group::ShipPickups,
        }
    }
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Degrees, 0 = facing up
    pub rotation: f32,
    pub radius: f32,
    /// Flagged for removal; the frame loop excises it on its next pass
    pub delete: bool,
    pub kind: EntityKind,
}

impl Entity {
    fn with_kind(id: EntityId, pos: Vec2, radius: f32, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            radius,
            delete: false,
            kind,
        }
    }

    pub fn ship(id: EntityId, pos: Vec2) -> Self {
        Self::with_kind(id, pos, SHIP_RADIUS, EntityKind::Ship(ShipData::default()))
    }

    /// Asteroid with a random drift, spin and jagged outline
    pub fn asteroid(id: EntityId, pos: Vec2, radius: f32, rng: &mut impl Rng) -> Self {
        let vertex_count = 12;
        let outline = (0..vertex_count)
            .map(|_| rng.random_range(0.75..=1.0))
            .collect();
        let mut asteroid = Self::with_kind(
            id,
            pos,
            radius,
            EntityKind::Asteroid(AsteroidData {
                score: asteroid_score(radius),
                rotation_speed: rng.random_range(-1.0..1.0),
                outline,
            }),
        );
        asteroid.vel = Vec2::new(rng.random_range(-1.5..1.5), rng.random_range(-1.5..1.5));
        asteroid
    }

    pub fn bullet(id: EntityId, pos: Vec2, rotation: f32, power: u8, life_span: u32) -> Self {
        let mut bullet = Self::with_kind(
            id,
            pos,
            BULLET_RADIUS * power.max(1) as f32,
            EntityKind::Bullet(BulletData { power, life_span }),
        );
        bullet.rotation = rotation;
        bullet.vel = crate::heading(rotation) * BULLET_SPEED;
        bullet
    }

    pub fn particle(id: EntityId, pos: Vec2, vel: Vec2, radius: f32, life_span: f32, color: Rgba) -> Self {
        let mut particle =
            Self::with_kind(id, pos, radius, EntityKind::Particle(ParticleData { life_span, color }));
        particle.vel = vel;
        particle
    }

    pub fn pill(id: EntityId, pos: Vec2, vel: Vec2, powerup: PowerupKind, now: f64, ttl: f64) -> Self {
        let mut pill = Self::with_kind(
            id,
            pos,
            PILL_RADIUS,
            EntityKind::Pill(PillData {
                powerup,
                created_at: now,
                time_to_live: ttl,
            }),
        );
        pill.vel = vel;
        pill
    }

    pub fn token(id: EntityId, pos: Vec2, vel: Vec2, value: u32, now: f64, ttl: f64) -> Self {
        let mut token = Self::with_kind(
            id,
            pos,
            TOKEN_RADIUS,
            EntityKind::Token(TokenData {
                value,
                created_at: now,
                time_to_live: ttl,
            }),
        );
        token.vel = vel;
        token
    }

    pub fn ship_pickup(id: EntityId, pos: Vec2, now: f64, ttl: f64) -> Self {
        Self::with_kind(
            id,
            pos,
            SHIP_PICKUP_RADIUS,
            EntityKind::ShipPickup(ShipPickupData {
                created_at: now,
                time_to_live: ttl,
            }),
        )
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.delete
    }

    pub fn home_group(&self) -> Group {
        self.kind.home_group()
    }

    /// Milliseconds since creation for timed pickups
    pub fn age(&self, now: f64) -> Option<f64> {
        match &self.kind {
            EntityKind::Pill(p) => Some(now - p.created_at),
            EntityKind::Token(t) => Some(now - t.created_at),
            EntityKind::ShipPickup(s) => Some(now - s.created_at),
            _ => None,
        }
    }
}

/// Score for an asteroid of the given radius (smaller rocks are worth more)
pub fn asteroid_score(radius: f32) -> u32 {
    ((ASTEROID_START_RADIUS / radius.max(1.0)) * 5.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_id_allocator_observe_skips_external_ids() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_id(), EntityId(1));
        ids.observe(EntityId(10));
        assert_eq!(ids.next_id(), EntityId(11));
        // Lower ids don't rewind
        ids.observe(EntityId(3));
        assert_eq!(ids.next_id(), EntityId(12));
    }

    #[test]
    fn test_id_allocator_rejects_last_id() {
        let mut ids = IdAllocator::default();
        assert!(!ids.observe(EntityId(u32::MAX)));
        assert_eq!(ids.next_id(), EntityId(1), "rejected id leaves allocator alone");

        assert!(ids.observe(EntityId(u32::MAX - 1)));
        assert_eq!(ids.next_id(), EntityId(u32::MAX));
        assert_eq!(ids.next_id(), EntityId(u32::MAX), "saturates instead of wrapping to 0");
    }

    #[test]
    fn test_asteroid_score_grows_as_radius_shrinks() {
        assert_eq!(asteroid_score(80.0), 5);
        assert_eq!(asteroid_score(40.0), 10);
        assert_eq!(asteroid_score(10.0), 40);
    }

    #[test]
    fn test_asteroid_outline_within_radius() {
        let mut rng = Pcg32::seed_from_u64(1);
        let rock = Entity::asteroid(EntityId(1), Vec2::ZERO, 40.0, &mut rng);
        let EntityKind::Asteroid(data) = &rock.kind else {
            panic!("expected asteroid");
        };
        assert_eq!(data.outline.len(), 12);
        assert!(data.outline.iter().all(|m| (0.75..=1.0).contains(m)));
        assert!(rock.vel.x.abs() <= 1.5 && rock.vel.y.abs() <= 1.5);
    }

    #[test]
    fn test_bullet_travels_along_heading() {
        let bullet = Entity::bullet(EntityId(5), Vec2::new(10.0, 10.0), 90.0, 2, 60);
        assert!((bullet.vel.x - BULLET_SPEED).abs() < 1e-4);
        assert!(bullet.vel.y.abs() < 1e-4);
        assert_eq!(bullet.radius, BULLET_RADIUS * 2.0);
        assert_eq!(bullet.home_group(), Group::Bullets);
    }
}
