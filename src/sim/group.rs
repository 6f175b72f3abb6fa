//! Named entity groups
//!
//! Each group is an insertion-ordered `Vec`. Removal only happens in whole-group
//! passes (`take_deleted`, `remove`) so iteration never skips or revisits.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};

/// Entity group names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Ship,
    Asteroids,
    Bullets,
    Particles,
    Pills,
    Tokens,
    ShipPickups,
}

impl Group {
    /// Update order used by the frame loop
    pub const ALL: [Group; 7] = [
        Group::Ship,
        Group::Asteroids,
        Group::Bullets,
        Group::Particles,
        Group::Pills,
        Group::Tokens,
        Group::ShipPickups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Ship => "ship",
            Group::Asteroids => "asteroids",
            Group::Bullets => "bullets",
            Group::Particles => "particles",
            Group::Pills => "pills",
            Group::Tokens => "tokens",
            Group::ShipPickups => "shipPickups",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// All live entities, bucketed by group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityGroups {
    groups: [Vec<Entity>; 7],
}

impl EntityGroups {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, group: Group) -> &[Entity] {
        &self.groups[group.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, group: Group) -> &mut Vec<Entity> {
        &mut self.groups[group.index()]
    }

    /// Borrow two distinct groups mutably at once
    pub fn pair_mut(&mut self, a: Group, b: Group) -> (&mut Vec<Entity>, &mut Vec<Entity>) {
        let (ia, ib) = (a.index(), b.index());
        assert_ne!(ia, ib, "pair_mut needs two distinct groups");
        if ia < ib {
            let (lo, hi) = self.groups.split_at_mut(ib);
            (&mut lo[ia], &mut hi[0])
        } else {
            let (lo, hi) = self.groups.split_at_mut(ia);
            (&mut hi[0], &mut lo[ib])
        }
    }

    pub fn push(&mut self, group: Group, entity: Entity) {
        self.groups[group.index()].push(entity);
    }

    pub fn len(&self, group: Group) -> usize {
        self.groups[group.index()].len()
    }

    pub fn is_empty(&self, group: Group) -> bool {
        self.groups[group.index()].is_empty()
    }

    /// Entities across every group
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn contains_id(&self, id: EntityId) -> bool {
        self.groups.iter().flatten().any(|e| e.id == id)
    }

    pub fn find(&self, group: Group, id: EntityId) -> Option<&Entity> {
        self.get(group).iter().find(|e| e.id == id)
    }

    /// Remove by identity, preserving the order of the rest
    pub fn remove(&mut self, group: Group, id: EntityId) -> Option<Entity> {
        let list = self.get_mut(group);
        let idx = list.iter().position(|e| e.id == id)?;
        Some(list.remove(idx))
    }

    /// Pull every entity flagged `delete` out of the group
    pub fn take_deleted(&mut self, group: Group) -> Vec<Entity> {
        let list = self.get_mut(group);
        if !list.iter().any(|e| e.delete) {
            return Vec::new();
        }
        let (dead, live): (Vec<_>, Vec<_>) = std::mem::take(list).into_iter().partition(|e| e.delete);
        *list = live;
        dead
    }

    /// The player's ship, if one is alive in the ship group
    pub fn ship(&self) -> Option<&Entity> {
        self.get(Group::Ship).iter().find(|e| e.is_alive())
    }

    pub fn ship_mut(&mut self) -> Option<&mut Entity> {
        self.get_mut(Group::Ship).iter_mut().find(|e| e.is_alive())
    }

    pub fn clear(&mut self) {
        for list in &mut self.groups {
            list.clear();
        }
    }
}
