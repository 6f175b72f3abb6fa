//! Per-kind update and destroy behavior
//!
//! Entities are plain data; this module is the single dispatch point that moves
//! them each frame and applies their destroy side effects.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::effect::{Effect, SpawnRequest};
use super::entity::{Entity, EntityKind};
use crate::Bounds;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::error::EntityFault;
use crate::renderer::colors;
use crate::services::Powerups;
use crate::{heading, normalize_degrees};

/// Held movement/fire keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub fire: bool,
}

/// Everything an entity may read or emit during one frame
pub struct FrameContext<'a> {
    pub now: f64,
    pub bounds: Bounds,
    pub keys: KeyState,
    pub powerups: Powerups,
    /// Particles per asteroid explosion
    pub explosion_particles: usize,
    pub rng: &'a mut Pcg32,
    pub effects: &'a mut Vec<Effect>,
    pub spawns: &'a mut Vec<SpawnRequest>,
}

/// Advance one entity by a frame.
///
/// Entities that expire during the update flag themselves via `destroy`.
/// Returns a fault if the entity ended up in a state that can't be simulated.
pub fn update(entity: &mut Entity, ctx: &mut FrameContext<'_>) -> Result<(), EntityFault> {
    match &mut entity.kind {
        EntityKind::Ship(ship) => {
            if ctx.keys.left {
                entity.rotation -= SHIP_ROTATION_SPEED;
            }
            if ctx.keys.right {
                entity.rotation += SHIP_ROTATION_SPEED;
            }
            entity.rotation = normalize_degrees(entity.rotation);

            ship.thrusting = ctx.keys.up;
            if ship.thrusting {
                let dir = heading(entity.rotation);
                entity.vel += dir * SHIP_THRUST;
                // Exhaust leaves from the tail, drifting backward
                let tail = entity.pos - dir * entity.radius * 0.7;
                let jitter = Vec2::new(ctx.rng.random_range(-0.5..0.5), ctx.rng.random_range(-0.5..0.5));
                ctx.spawns.push(SpawnRequest::Exhaust {
                    pos: tail,
                    vel: -dir * 1.5 + jitter,
                });
            }

            entity.pos += entity.vel;
            entity.vel *= SHIP_INERTIA;
            entity.pos = ctx.bounds.wrap(entity.pos, 0.0);
        }
        EntityKind::Asteroid(rock) => {
            entity.pos += entity.vel;
            entity.rotation = normalize_degrees(entity.rotation + rock.rotation_speed);
            entity.pos = ctx.bounds.wrap(entity.pos, entity.radius);
        }
        EntityKind::Bullet(bullet) => {
            entity.pos += entity.vel;
            bullet.life_span = bullet.life_span.saturating_sub(1);
            if bullet.life_span == 0 || !ctx.bounds.contains(entity.pos) {
                entity.delete = true;
            }
        }
        EntityKind::Particle(particle) => {
            entity.pos += entity.vel;
            entity.vel *= 0.98;
            entity.radius -= 0.05;
            particle.life_span -= 1.0;
            if particle.life_span <= 0.0 || entity.radius < 0.1 {
                entity.delete = true;
            }
        }
        EntityKind::Pill(_) | EntityKind::Token(_) | EntityKind::ShipPickup(_) => {
            entity.pos += entity.vel;
            entity.rotation = normalize_degrees(entity.rotation + 2.0);
            entity.pos = ctx.bounds.wrap(entity.pos, entity.radius);
            if is_expired(entity, ctx.now) {
                destroy(entity, ctx);
            }
        }
    }

    validate(entity)
}

/// Timed pickups expire once they outlive their time-to-live
pub fn is_expired(entity: &Entity, now: f64) -> bool {
    let ttl = match &entity.kind {
        EntityKind::Pill(p) => p.time_to_live,
        EntityKind::Token(t) => t.time_to_live,
        EntityKind::ShipPickup(s) => s.time_to_live,
        _ => return false,
    };
    entity.age(now).is_some_and(|age| age > ttl)
}

/// Check the entity invariants the frame loop relies on
pub fn validate(entity: &Entity) -> Result<(), EntityFault> {
    if !(entity.pos.is_finite() && entity.vel.is_finite() && entity.rotation.is_finite()) {
        return Err(EntityFault::NonFinite { id: entity.id });
    }
    // Particles shrink to zero as they die; anything alive must keep a real radius
    if !entity.delete && !(entity.radius > 0.0) {
        return Err(EntityFault::Degenerate {
            id: entity.id,
            radius: entity.radius,
        });
    }
    Ok(())
}

/// Flag an entity for removal and apply its destroy side effect.
///
/// Returns false if it was already destroyed (side effects run once).
pub fn destroy(entity: &mut Entity, ctx: &mut FrameContext<'_>) -> bool {
    if entity.delete {
        return false;
    }
    entity.delete = true;

    match &entity.kind {
        EntityKind::Asteroid(rock) => {
            ctx.effects.push(Effect::AddScore(rock.score));
            ctx.effects.push(Effect::PlaySound(SoundEffect::Explosion));
            ctx.spawns.push(SpawnRequest::Explosion {
                pos: entity.pos,
                count: ctx.explosion_particles,
                color: colors::ASTEROID,
            });
            if entity.radius > ASTEROID_MIN_SPLIT_RADIUS {
                let child_radius = entity.radius / 2.0;
                for _ in 0..2 {
                    let offset = Vec2::new(
                        ctx.rng.random_range(-10.0..20.0),
                        ctx.rng.random_range(-10.0..20.0),
                    );
                    ctx.spawns.push(SpawnRequest::Asteroid {
                        pos: entity.pos + offset,
                        radius: child_radius,
                    });
                }
            }
        }
        EntityKind::Ship(_) => {
            ctx.effects.push(Effect::PlaySound(SoundEffect::ShipExplosion));
            ctx.effects.push(Effect::ShipDestroyed { pos: entity.pos });
            ctx.spawns.push(SpawnRequest::Explosion {
                pos: entity.pos,
                count: ctx.explosion_particles * 2,
                color: colors::SHIP,
            });
        }
        EntityKind::Bullet(_)
        | EntityKind::Particle(_)
        | EntityKind::Pill(_)
        | EntityKind::Token(_)
        | EntityKind::ShipPickup(_) => {}
    }
    true
}
