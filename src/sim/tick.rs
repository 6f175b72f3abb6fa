//! One frame of simulation
//!
//! Order within a tick: fade, level check, timed spawns, cleanup plus
//! update/draw per group, pool housekeeping, firing, collisions, deferred
//! spawns. Side effects for the outside world are returned, not applied.

use rand_pcg::Pcg32;

use super::behavior::{FrameContext, KeyState, update};
use super::collision::check_collisions;
use super::effect::{Effect, SpawnRequest};
use super::group::Group;
use super::state::World;
use crate::audio::SoundEffect;
use crate::config::EngineConfig;
use crate::renderer::{DrawSurface, colors, draw_entity};
use crate::services::Powerups;

/// Per-frame input snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub now: f64,
    pub keys: KeyState,
    pub powerups: Powerups,
}

fn frame_context<'a>(
    input: &TickInput,
    config: &EngineConfig,
    rng: &'a mut Pcg32,
    effects: &'a mut Vec<Effect>,
    spawns: &'a mut Vec<SpawnRequest>,
) -> FrameContext<'a> {
    FrameContext {
        now: input.now,
        bounds: config.bounds(),
        keys: input.keys,
        powerups: input.powerups,
        explosion_particles: config.explosion_particles,
        rng,
        effects,
        spawns,
    }
}

/// Advance the world by one frame, drawing onto `surface`
pub fn tick(
    world: &mut World,
    surface: &mut dyn DrawSurface,
    input: &TickInput,
    config: &EngineConfig,
) -> Vec<Effect> {
    let now = input.now;
    let bounds = config.bounds();
    let mut effects = Vec::new();
    let mut spawns = Vec::new();

    // Translucent fill leaves a short trail behind moving shapes
    surface.save();
    surface.set_fill_color(colors::FADE);
    surface.fill_rect(0.0, 0.0, bounds.width, bounds.height);

    if world.groups.is_empty(Group::Asteroids) && !world.grace_active(now) {
        world.advance_level(config);
        effects.push(Effect::PlaySound(SoundEffect::LevelUp));
    }

    world
        .spawner
        .run(&mut world.groups, &mut world.rng, &mut world.ids, bounds, now);

    for group in Group::ALL {
        for dead in world.groups.take_deleted(group) {
            world.reclaim(group, dead);
        }

        let mut faulted = Vec::new();
        {
            let mut ctx = frame_context(input, config, &mut world.rng, &mut effects, &mut spawns);
            for entity in world.groups.get_mut(group).iter_mut() {
                if let Err(fault) = update(entity, &mut ctx) {
                    log::warn!("{} update failed, removing: {fault}", entity.kind.name());
                    entity.delete = true;
                    faulted.push(entity.id);
                    continue;
                }
                if entity.is_alive() {
                    draw_entity(surface, entity);
                }
            }
        }
        for id in faulted {
            if let Some(entity) = world.groups.remove(group, id) {
                world.reclaim(group, entity);
            }
        }
    }

    world.bullets.expire(world.groups.get_mut(Group::Bullets), now);
    world.particles.expire(world.groups.get_mut(Group::Particles), now);

    if input.keys.fire && world.fire_bullet(config, now, input.powerups.rapid_fire).is_some() {
        effects.push(Effect::PlaySound(SoundEffect::Fire));
    }

    let vulnerable = !input.powerups.invincible && !world.grace_active(now);
    {
        let mut ctx = frame_context(input, config, &mut world.rng, &mut effects, &mut spawns);
        check_collisions(&mut world.groups, &mut ctx, vulnerable);
    }
    world.apply_spawns(spawns, now);

    surface.restore();
    world.frame += 1;
    effects
}
