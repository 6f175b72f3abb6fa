//! Asteroids Engine - per-frame entity engine for an Asteroids-style arcade game
//!
//! Core modules:
//! - `sim`: Entity model, pools, collisions, spawning, phase state machine
//! - `engine`: Frame loop composing the simulation with its collaborators
//! - `renderer`: 2D drawing surface abstraction and entity shapes
//! - `platform`: Frame scheduler and clock capabilities
//! - `services`: Score, inventory and powerup collaborators
//! - `config`: Data-driven engine tuning

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod services;
pub mod sim;

pub use config::{EngineConfig, WeaponTier};
pub use engine::{Engine, Key};
pub use error::{ConfigError, EngineError, EntityFault, TransitionError};

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Default playfield size
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Nominal frame duration in milliseconds (60 Hz refresh)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Asteroid defaults
    pub const ASTEROID_START_RADIUS: f32 = 80.0;
    /// Asteroids at or below this radius do not split
    pub const ASTEROID_MIN_SPLIT_RADIUS: f32 = 10.0;
    /// Hard cap on the per-level asteroid quota
    pub const MAX_ASTEROID_QUOTA: u32 = 10;

    /// Ship defaults
    pub const SHIP_RADIUS: f32 = 20.0;
    pub const SHIP_ROTATION_SPEED: f32 = 6.0; // degrees per frame
    pub const SHIP_THRUST: f32 = 0.15;
    pub const SHIP_INERTIA: f32 = 0.99;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 8.0;

    /// Pickup defaults
    pub const PILL_RADIUS: f32 = 10.0;
    pub const TOKEN_RADIUS: f32 = 12.0;
    pub const SHIP_PICKUP_RADIUS: f32 = 15.0;
    pub const PICKUP_SPEED: f32 = 1.0;
}

/// Field dimensions used for wrapping and spawning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if the point lies inside the field (edges inclusive)
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Wrap a position that left the field to the opposite edge.
    ///
    /// `margin` lets an entity fully leave the screen before it reappears.
    pub fn wrap(&self, mut pos: Vec2, margin: f32) -> Vec2 {
        if pos.x > self.width + margin {
            pos.x = -margin;
        } else if pos.x < -margin {
            pos.x = self.width + margin;
        }
        if pos.y > self.height + margin {
            pos.y = -margin;
        } else if pos.y < -margin {
            pos.y = self.height + margin;
        }
        pos
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(consts::FIELD_WIDTH, consts::FIELD_HEIGHT)
    }
}

/// Unit direction for a rotation given in degrees (0 = up, clockwise positive)
#[inline]
pub fn heading(rotation_deg: f32) -> Vec2 {
    let rad = rotation_deg.to_radians();
    Vec2::new(rad.sin(), -rad.cos())
}

/// Normalize a rotation in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(deg: f32) -> f32 {
    deg.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_moves_to_opposite_edge() {
        let bounds = Bounds::new(100.0, 50.0);
        assert_eq!(bounds.wrap(Vec2::new(120.0, 10.0), 10.0), Vec2::new(-10.0, 10.0));
        assert_eq!(bounds.wrap(Vec2::new(-11.0, 60.5), 10.0), Vec2::new(110.0, -10.0));
        // Inside the margin nothing changes
        assert_eq!(bounds.wrap(Vec2::new(105.0, 55.0), 10.0), Vec2::new(105.0, 55.0));
    }

    #[test]
    fn test_heading_points_up_at_zero() {
        let up = heading(0.0);
        assert!(up.x.abs() < 1e-6);
        assert!((up.y + 1.0).abs() < 1e-6);

        let right = heading(90.0);
        assert!((right.x - 1.0).abs() < 1e-6);
        assert!(right.y.abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_degrees(-30.0) - 330.0).abs() < 1e-4);
    }
}
