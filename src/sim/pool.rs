//! Fixed-capacity object pools for high-churn entities
//!
//! Slots are created lazily up to capacity and live as long as the pool. While
//! a slot is active its entity lives in the pool's group; once released the
//! instance is parked in the slot and re-initialized on the next acquire.

use std::marker::PhantomData;

use glam::Vec2;

use super::entity::{Entity, EntityId, EntityKind, IdAllocator};
use super::group::Group;
use crate::renderer::Rgba;

/// An entity kind that can be recycled through a pool
pub trait Poolable {
    type Config;
    /// Group the pooled entities live in
    const GROUP: Group;

    fn create(id: EntityId, config: &Self::Config) -> Entity;
    /// Re-initialize a parked instance in place, keeping its id
    fn reinit(entity: &mut Entity, config: &Self::Config);
}

/// Bullet spawn parameters
#[derive(Debug, Clone)]
pub struct BulletConfig {
    pub pos: Vec2,
    pub rotation: f32,
    pub power: u8,
    /// Frames before it fizzles
    pub life_span: u32,
}

/// Particle spawn parameters
#[derive(Debug, Clone)]
pub struct ParticleConfig {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub life_span: f32,
    pub color: Rgba,
}

pub struct Bullets;
pub struct Particles;

impl Poolable for Bullets {
    type Config = BulletConfig;
    const GROUP: Group = Group::Bullets;

    fn create(id: EntityId, c: &BulletConfig) -> Entity {
        Entity::bullet(id, c.pos, c.rotation, c.power, c.life_span)
    }

    fn reinit(entity: &mut Entity, c: &BulletConfig) {
        *entity = Entity::bullet(entity.id, c.pos, c.rotation, c.power, c.life_span);
    }
}

impl Poolable for Particles {
    type Config = ParticleConfig;
    const GROUP: Group = Group::Particles;

    fn create(id: EntityId, c: &ParticleConfig) -> Entity {
        Entity::particle(id, c.pos, c.vel, c.radius, c.life_span, c.color)
    }

    fn reinit(entity: &mut Entity, c: &ParticleConfig) {
        entity.pos = c.pos;
        entity.vel = c.vel;
        entity.rotation = 0.0;
        entity.radius = c.radius;
        entity.delete = false;
        match &mut entity.kind {
            EntityKind::Particle(p) => {
                p.life_span = c.life_span;
                p.color = c.color;
            }
            _ => *entity = Entity::particle(entity.id, c.pos, c.vel, c.radius, c.life_span, c.color),
        }
    }
}

/// One reusable slot
#[derive(Debug, Clone, Default)]
pub struct PoolSlot {
    /// Id of the instance this slot owns (active or parked)
    pub id: Option<EntityId>,
    /// Parked instance, present only while inactive
    pub instance: Option<Entity>,
    pub active: bool,
    pub create_time: f64,
}

/// Occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub active: usize,
    /// Slots created so far
    pub allocated: usize,
}

/// Bounded pool of entities of kind `K`
pub struct Pool<K: Poolable> {
    slots: Vec<PoolSlot>,
    capacity: usize,
    /// Active slots older than this are force-expired on acquire
    hard_ttl_ms: f64,
    _kind: PhantomData<K>,
}

pub type BulletPool = Pool<Bullets>;
pub type ParticlePool = Pool<Particles>;

impl<K: Poolable> Pool<K> {
    pub fn new(capacity: usize, hard_ttl_ms: f64) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            hard_ttl_ms,
            _kind: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            active: self.active_count(),
            allocated: self.slots.len(),
        }
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    /// Hand out an entity built from `config` and insert it into `group`.
    ///
    /// Stale slots are expired first; if the pool is still full the oldest
    /// active entity is evicted so newer demand always wins.
    pub fn acquire(
        &mut self,
        config: &K::Config,
        group: &mut Vec<Entity>,
        ids: &mut IdAllocator,
        now: f64,
    ) -> Option<EntityId> {
        self.expire(group, now);
        if self.active_count() >= self.capacity {
            self.evict_oldest(group);
        }

        let idx = match self.slots.iter().position(|s| !s.active) {
            Some(idx) => idx,
            None if self.slots.len() < self.capacity => {
                self.slots.push(PoolSlot::default());
                self.slots.len() - 1
            }
            None => {
                log::debug!("{:?} pool exhausted ({} slots)", K::GROUP, self.capacity);
                return None;
            }
        };

        let slot = &mut self.slots[idx];
        let entity = match slot.instance.take() {
            Some(mut parked) => {
                K::reinit(&mut parked, config);
                parked
            }
            None => K::create(ids.next_id(), config),
        };
        let id = entity.id;
        slot.id = Some(id);
        slot.active = true;
        slot.create_time = now;
        group.push(entity);
        Some(id)
    }

    /// Take back an entity the frame loop removed from the group.
    ///
    /// Returns false if no active slot owns it (the instance is then dropped).
    pub fn release(&mut self, entity: Entity) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.active && s.id == Some(entity.id))
        else {
            return false;
        };
        slot.active = false;
        slot.create_time = 0.0;
        slot.instance = Some(entity);
        true
    }

    /// Forget an entity that left the pool's group without coming back
    pub fn detach(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.id == Some(id)) else {
            return false;
        };
        slot.id = None;
        slot.instance = None;
        slot.active = false;
        slot.create_time = 0.0;
        true
    }

    /// Force-expire every active slot older than the hard TTL
    pub fn expire(&mut self, group: &mut Vec<Entity>, now: f64) -> usize {
        let stale: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active && now - s.create_time > self.hard_ttl_ms)
            .map(|(i, _)| i)
            .collect();
        for &idx in &stale {
            self.retire(idx, group);
        }
        stale.len()
    }

    fn evict_oldest(&mut self, group: &mut Vec<Entity>) {
        let oldest = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .min_by(|(_, a), (_, b)| a.create_time.total_cmp(&b.create_time))
            .map(|(i, _)| i);
        if let Some(idx) = oldest {
            log::debug!("{:?} pool full, evicting {:?}", K::GROUP, self.slots[idx].id);
            self.retire(idx, group);
        }
    }

    /// Pull the slot's entity out of the group and park it
    fn retire(&mut self, idx: usize, group: &mut Vec<Entity>) {
        let slot = &mut self.slots[idx];
        slot.active = false;
        slot.create_time = 0.0;
        let Some(id) = slot.id else { return };
        if let Some(pos) = group.iter().position(|e| e.id == id) {
            let mut entity = group.remove(pos);
            entity.delete = true;
            slot.instance = Some(entity);
        } else {
            // Someone else already took it; the id no longer means anything here
            slot.id = None;
        }
    }

    /// Drop all bookkeeping (the owning group is cleared separately)
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// True if a slot holds `id`, active or parked
    pub fn owns(&self, id: EntityId) -> bool {
        self.slots.iter().any(|s| s.id == Some(id))
    }
}
