//! Deferred side effects produced during a tick
//!
//! The tick never calls collaborators directly. Outbound effects are queued and
//! drained by the engine once the tick has finished; spawn requests are applied
//! at the end of the tick so new entities join the next frame.

use glam::Vec2;

use crate::audio::SoundEffect;
use crate::renderer::Rgba;
use crate::services::{ItemKind, PowerupKind};

/// Requests for the engine's collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AddScore(u32),
    AddItem(ItemKind, u32),
    ActivatePowerup(PowerupKind),
    PlaySound(SoundEffect),
    /// The ship was destroyed; the engine decides between respawn and game over
    ShipDestroyed { pos: Vec2 },
}

/// Entities to create once the current pass is over
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    Asteroid { pos: Vec2, radius: f32 },
    /// Burst of pooled particles
    Explosion { pos: Vec2, count: usize, color: Rgba },
    /// Single exhaust particle trailing the ship
    Exhaust { pos: Vec2, vel: Vec2 },
}
