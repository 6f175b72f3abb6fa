//! Simulation world
//!
//! Everything the frame loop mutates: entity groups, pools, spawn timers, the
//! seeded RNG and level progression. Collaborators and the drawing surface
//! live outside, on the engine.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::effect::SpawnRequest;
use super::entity::{Entity, EntityId, IdAllocator};
use super::group::{EntityGroups, Group};
use super::pool::{BulletConfig, BulletPool, ParticleConfig, ParticlePool, PoolStats};
use super::spawn::{self, SpawnScheduler};
use crate::config::EngineConfig;
use crate::heading;
use crate::renderer::{Rgba, colors};

/// Frames a bullet flies before fizzling (about a second)
pub const BULLET_LIFE_FRAMES: u32 = 60;

/// Complete simulation state
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub groups: EntityGroups,
    pub bullets: BulletPool,
    pub particles: ParticlePool,
    pub spawner: SpawnScheduler,
    pub ids: IdAllocator,
    /// Levels cleared plus one (0 before the first wave)
    pub level: u32,
    /// Asteroids spawned by the current wave
    pub asteroid_quota: u32,
    /// Ship/asteroid contacts are ignored until this timestamp
    pub grace_until: f64,
    pub last_shot: f64,
    /// Ticks run since the last reset
    pub frame: u64,
}

impl World {
    pub fn new(config: &EngineConfig, now: f64) -> Self {
        Self {
            seed: config.seed,
            rng: Pcg32::seed_from_u64(config.seed),
            groups: EntityGroups::new(),
            bullets: BulletPool::new(config.bullet_capacity(), config.bullet_ttl_ms),
            particles: ParticlePool::new(config.particle_capacity, config.particle_ttl_ms),
            spawner: SpawnScheduler::new(config, now),
            ids: IdAllocator::default(),
            level: 0,
            asteroid_quota: config.initial_asteroids.saturating_sub(1),
            grace_until: f64::NEG_INFINITY,
            last_shot: f64::NEG_INFINITY,
            frame: 0,
        }
    }

    /// Back to a freshly constructed world
    pub fn reset(&mut self, config: &EngineConfig, now: f64) {
        *self = Self::new(config, now);
    }

    #[inline]
    pub fn grace_active(&self, now: f64) -> bool {
        now < self.grace_until
    }

    /// Place a new ship at the field centre, replacing any existing one
    pub fn spawn_ship(&mut self, config: &EngineConfig) -> EntityId {
        self.groups.get_mut(Group::Ship).clear();
        let id = self.ids.next_id();
        self.groups
            .push(Group::Ship, Entity::ship(id, config.bounds().center()));
        id
    }

    /// Spawn a ship that can't be hit by asteroids for the grace window
    pub fn respawn_ship(&mut self, config: &EngineConfig, now: f64) -> EntityId {
        self.grace_until = now + config.respawn_grace_ms;
        log::info!("Ship respawned, grace until {:.0}ms", self.grace_until);
        self.spawn_ship(config)
    }

    pub fn spawn_asteroids(&mut self, count: u32, config: &EngineConfig) -> Vec<EntityId> {
        spawn::spawn_asteroids(
            count,
            &mut self.groups,
            &mut self.rng,
            &mut self.ids,
            config.bounds(),
            config.spawn_exclusion_radius,
        )
    }

    /// Bump the level and spawn its wave
    pub fn advance_level(&mut self, config: &EngineConfig) -> Vec<EntityId> {
        self.level += 1;
        self.asteroid_quota = (self.asteroid_quota + 1).min(config.max_asteroid_quota);
        log::info!("Level {} with {} asteroids", self.level, self.asteroid_quota);
        self.spawn_asteroids(self.asteroid_quota, config)
    }

    /// Fire from the ship's nose if the weapon has cooled down
    pub fn fire_bullet(&mut self, config: &EngineConfig, now: f64, rapid_fire: bool) -> Option<EntityId> {
        let mut cooldown = config.weapon.cooldown_ms();
        if rapid_fire {
            cooldown /= 2.0;
        }
        if now - self.last_shot < cooldown {
            return None;
        }

        let ship = self.groups.ship()?;
        let bullet = BulletConfig {
            pos: ship.pos + heading(ship.rotation) * ship.radius,
            rotation: ship.rotation,
            power: config.weapon.bullet_power(),
            life_span: BULLET_LIFE_FRAMES,
        };
        let id = self
            .bullets
            .acquire(&bullet, self.groups.get_mut(Group::Bullets), &mut self.ids, now)?;
        self.last_shot = now;
        Some(id)
    }

    /// Create everything requested during the tick
    pub fn apply_spawns(&mut self, spawns: Vec<SpawnRequest>, now: f64) {
        for request in spawns {
            match request {
                SpawnRequest::Asteroid { pos, radius } => {
                    let id = self.ids.next_id();
                    let rock = Entity::asteroid(id, pos, radius, &mut self.rng);
                    self.groups.push(Group::Asteroids, rock);
                }
                SpawnRequest::Explosion { pos, count, color } => {
                    for _ in 0..count {
                        let particle = self.explosion_particle(pos, color);
                        self.emit_particle(&particle, now);
                    }
                }
                SpawnRequest::Exhaust { pos, vel } => {
                    let particle = ParticleConfig {
                        pos,
                        vel,
                        radius: 1.5,
                        life_span: 15.0,
                        color: colors::EXHAUST,
                    };
                    self.emit_particle(&particle, now);
                }
            }
        }
    }

    fn explosion_particle(&mut self, pos: Vec2, color: Rgba) -> ParticleConfig {
        let angle = self.rng.random_range(0.0..TAU);
        let speed = self.rng.random_range(0.5..3.0);
        ParticleConfig {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            radius: self.rng.random_range(1.0..3.0),
            life_span: self.rng.random_range(30.0..60.0),
            color,
        }
    }

    fn emit_particle(&mut self, particle: &ParticleConfig, now: f64) {
        let group = self.groups.get_mut(Group::Particles);
        if self.particles.acquire(particle, group, &mut self.ids, now).is_none() {
            log::debug!("Particle dropped, pool exhausted");
        }
    }

    /// Hand an entity removed from its group back to its pool, if it has one
    pub fn reclaim(&mut self, group: Group, entity: Entity) {
        match group {
            Group::Bullets => {
                self.bullets.release(entity);
            }
            Group::Particles => {
                self.particles.release(entity);
            }
            _ => {}
        }
    }

    /// Take an entity out of its group for good. A pooled one also gives up
    /// its slot so the pool never hands its id out again.
    pub fn remove(&mut self, group: Group, id: EntityId) -> Option<Entity> {
        let entity = self.groups.remove(group, id)?;
        match group {
            Group::Bullets => {
                self.bullets.detach(id);
            }
            Group::Particles => {
                self.particles.detach(id);
            }
            _ => {}
        }
        Some(entity)
    }

    /// True if `id` is live in a group or parked in a pool slot
    pub fn id_in_use(&self, id: EntityId) -> bool {
        self.groups.contains_id(id) || self.bullets.owns(id) || self.particles.owns(id)
    }

    pub fn bullet_stats(&self) -> PoolStats {
        self.bullets.stats()
    }

    pub fn particle_stats(&self) -> PoolStats {
        self.particles.stats()
    }
}
