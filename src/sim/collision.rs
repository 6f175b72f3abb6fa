//! Pairwise circle collision between monitored entity groups
//!
//! Destruction only flags entities; the frame loop removes them on its next
//! pass. Entities flagged earlier in the same pass are skipped, so a bullet
//! scores at most one asteroid per tick.

use super::behavior::{FrameContext, destroy};
use super::effect::Effect;
use super::entity::{Entity, EntityKind};
use super::group::{EntityGroups, Group};
use crate::audio::SoundEffect;
use crate::services::ItemKind;

/// Group pairs tested every tick
pub const MONITORED_PAIRS: [(Group, Group); 5] = [
    (Group::Ship, Group::Asteroids),
    (Group::Bullets, Group::Asteroids),
    (Group::Ship, Group::Pills),
    (Group::Ship, Group::Tokens),
    (Group::Ship, Group::ShipPickups),
];

type HitHandler = fn(&mut Entity, &mut Entity, &mut FrameContext<'_>);

/// Euclidean circle overlap (touching does not count)
#[inline]
pub fn circles_overlap(a: &Entity, b: &Entity) -> bool {
    a.pos.distance(b.pos) < a.radius + b.radius
}

/// Run one collision pass over every monitored pair.
///
/// `ship_vulnerable` is false while the ship is invincible or in its
/// post-respawn grace window; ship/asteroid contacts are then ignored.
pub fn check_collisions(groups: &mut EntityGroups, ctx: &mut FrameContext<'_>, ship_vulnerable: bool) {
    for (a, b) in MONITORED_PAIRS {
        let on_hit: HitHandler = match (a, b) {
            (Group::Ship, Group::Asteroids) => {
                if !ship_vulnerable {
                    continue;
                }
                mutual_destroy
            }
            (Group::Bullets, Group::Asteroids) => mutual_destroy,
            _ => collect_pickup,
        };
        check_pair(groups, a, b, ctx, on_hit);
    }
}

fn check_pair(groups: &mut EntityGroups, a: Group, b: Group, ctx: &mut FrameContext<'_>, on_hit: HitHandler) {
    let (first, second) = groups.pair_mut(a, b);
    for ea in first.iter_mut() {
        for eb in second.iter_mut() {
            if ea.delete {
                break;
            }
            if eb.delete {
                continue;
            }
            if circles_overlap(ea, eb) {
                on_hit(ea, eb, ctx);
            }
        }
    }
}

/// Ship or bullet meets an asteroid: both go
fn mutual_destroy(a: &mut Entity, b: &mut Entity, ctx: &mut FrameContext<'_>) {
    destroy(a, ctx);
    destroy(b, ctx);
}

/// Ship touches a pickup: only the pickup goes
fn collect_pickup(_ship: &mut Entity, pickup: &mut Entity, ctx: &mut FrameContext<'_>) {
    if !destroy(pickup, ctx) {
        return;
    }
    match &pickup.kind {
        EntityKind::Pill(pill) => {
            ctx.effects.push(Effect::ActivatePowerup(pill.powerup));
            ctx.effects.push(Effect::PlaySound(SoundEffect::Powerup));
        }
        EntityKind::Token(token) => {
            ctx.effects.push(Effect::AddItem(ItemKind::Token, 1));
            ctx.effects.push(Effect::AddScore(token.value));
            ctx.effects.push(Effect::PlaySound(SoundEffect::TokenCollect));
        }
        EntityKind::ShipPickup(_) => {
            ctx.effects.push(Effect::AddItem(ItemKind::Ship, 1));
            ctx.effects.push(Effect::PlaySound(SoundEffect::ExtraLife));
        }
        other => log::warn!("{} in a pickup group, ignoring contact", other.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PowerupKind;
    use crate::sim::behavior::tests::Harness;
    use crate::sim::effect::SpawnRequest;
    use crate::sim::entity::EntityId;
    use glam::Vec2;

    fn asteroid(id: u32, pos: Vec2, radius: f32, h: &mut Harness) -> Entity {
        Entity::asteroid(EntityId(id), pos, radius, &mut h.rng)
    }

    fn bullet(id: u32, pos: Vec2) -> Entity {
        Entity::bullet(EntityId(id), pos, 0.0, 1, 60)
    }

    #[test]
    fn test_overlapping_bullet_and_asteroid_both_deleted() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        groups.push(Group::Asteroids, asteroid(1, Vec2::new(100.0, 100.0), 20.0, &mut h));
        groups.push(Group::Asteroids, asteroid(2, Vec2::new(500.0, 500.0), 20.0, &mut h));
        groups.push(Group::Bullets, bullet(3, Vec2::new(115.0, 100.0)));

        check_collisions(&mut groups, &mut h.ctx(), true);

        let rocks = groups.get(Group::Asteroids);
        assert!(rocks[0].delete);
        assert!(!rocks[1].delete, "distant asteroid untouched");
        assert!(groups.get(Group::Bullets)[0].delete);
        assert!(h.effects.contains(&Effect::AddScore(20)));
    }

    #[test]
    fn test_touching_is_not_a_hit() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        groups.push(Group::Asteroids, asteroid(1, Vec2::new(100.0, 100.0), 20.0, &mut h));
        // Exactly radius sum apart (20 + 2)
        groups.push(Group::Bullets, bullet(2, Vec2::new(122.0, 100.0)));

        check_collisions(&mut groups, &mut h.ctx(), true);
        assert!(!groups.get(Group::Asteroids)[0].delete);
    }

    #[test]
    fn test_bullet_hits_only_one_asteroid_per_pass() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        // Two overlapping asteroids, bullet inside both
        groups.push(Group::Asteroids, asteroid(1, Vec2::new(100.0, 100.0), 20.0, &mut h));
        groups.push(Group::Asteroids, asteroid(2, Vec2::new(105.0, 100.0), 20.0, &mut h));
        groups.push(Group::Bullets, bullet(3, Vec2::new(102.0, 100.0)));

        check_collisions(&mut groups, &mut h.ctx(), true);

        let destroyed = groups.get(Group::Asteroids).iter().filter(|a| a.delete).count();
        assert_eq!(destroyed, 1, "a bullet is consumed by its first hit");
        let scores = h.effects.iter().filter(|e| matches!(e, Effect::AddScore(_))).count();
        assert_eq!(scores, 1);
    }

    #[test]
    fn test_two_bullets_on_one_asteroid_score_once() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        groups.push(Group::Asteroids, asteroid(1, Vec2::new(100.0, 100.0), 20.0, &mut h));
        groups.push(Group::Bullets, bullet(2, Vec2::new(100.0, 100.0)));
        groups.push(Group::Bullets, bullet(3, Vec2::new(101.0, 100.0)));

        check_collisions(&mut groups, &mut h.ctx(), true);

        let bullets = groups.get(Group::Bullets);
        assert!(bullets[0].delete);
        assert!(!bullets[1].delete, "second bullet flies on");
        let children = h
            .spawns
            .iter()
            .filter(|s| matches!(s, SpawnRequest::Asteroid { .. }))
            .count();
        assert_eq!(children, 2);
    }

    #[test]
    fn test_ship_asteroid_collision_respects_vulnerability() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        groups.push(Group::Ship, Entity::ship(EntityId(1), Vec2::new(200.0, 200.0)));
        groups.push(Group::Asteroids, asteroid(2, Vec2::new(210.0, 200.0), 20.0, &mut h));

        check_collisions(&mut groups, &mut h.ctx(), false);
        assert!(!groups.get(Group::Ship)[0].delete);
        assert!(!groups.get(Group::Asteroids)[0].delete);

        check_collisions(&mut groups, &mut h.ctx(), true);
        assert!(groups.get(Group::Ship)[0].delete);
        assert!(groups.get(Group::Asteroids)[0].delete);
        assert!(
            h.effects
                .iter()
                .any(|e| matches!(e, Effect::ShipDestroyed { .. }))
        );
    }

    #[test]
    fn test_ship_collects_pickups() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        let at = Vec2::new(300.0, 300.0);
        groups.push(Group::Ship, Entity::ship(EntityId(1), at));
        groups.push(
            Group::Pills,
            Entity::pill(EntityId(2), at, Vec2::ZERO, PowerupKind::RapidFire, 0.0, 1000.0),
        );
        groups.push(Group::Tokens, Entity::token(EntityId(3), at, Vec2::ZERO, 25, 0.0, 1000.0));
        groups.push(Group::ShipPickups, Entity::ship_pickup(EntityId(4), at, 0.0, 1000.0));

        check_collisions(&mut groups, &mut h.ctx(), true);

        assert!(!groups.get(Group::Ship)[0].delete, "pickups never hurt the ship");
        assert!(groups.get(Group::Pills)[0].delete);
        assert!(groups.get(Group::Tokens)[0].delete);
        assert!(groups.get(Group::ShipPickups)[0].delete);
        assert!(h.effects.contains(&Effect::ActivatePowerup(PowerupKind::RapidFire)));
        assert!(h.effects.contains(&Effect::AddItem(ItemKind::Token, 1)));
        assert!(h.effects.contains(&Effect::AddScore(25)));
        assert!(h.effects.contains(&Effect::AddItem(ItemKind::Ship, 1)));
    }

    #[test]
    fn test_pickup_effects_apply_once() {
        let mut h = Harness::new();
        let mut groups = EntityGroups::new();
        let at = Vec2::new(300.0, 300.0);
        groups.push(Group::Ship, Entity::ship(EntityId(1), at));
        groups.push(Group::Tokens, Entity::token(EntityId(2), at, Vec2::ZERO, 25, 0.0, 1000.0));

        check_collisions(&mut groups, &mut h.ctx(), true);
        check_collisions(&mut groups, &mut h.ctx(), true);

        let grants = h
            .effects
            .iter()
            .filter(|e| **e == Effect::AddItem(ItemKind::Token, 1))
            .count();
        assert_eq!(grants, 1);
    }
}
