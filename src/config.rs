//! Engine configuration
//!
//! Tuning lives in one serializable struct so hosts can ship it as JSON.

use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH, MAX_ASTEROID_QUOTA};
use crate::error::ConfigError;

/// Weapon tiers (bullet pool size and fire rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeaponTier {
    #[default]
    Basic,
    Double,
    Blaster,
}

impl WeaponTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponTier::Basic => "Basic",
            WeaponTier::Double => "Double",
            WeaponTier::Blaster => "Blaster",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(WeaponTier::Basic),
            "double" => Some(WeaponTier::Double),
            "blaster" => Some(WeaponTier::Blaster),
            _ => None,
        }
    }

    /// Bullet pool capacity for this tier
    pub fn max_bullets(&self) -> usize {
        match self {
            WeaponTier::Basic => 15,
            WeaponTier::Double => 30,
            WeaponTier::Blaster => 50,
        }
    }

    /// Minimum time between shots (ms)
    pub fn cooldown_ms(&self) -> f64 {
        match self {
            WeaponTier::Basic => 300.0,
            WeaponTier::Double => 200.0,
            WeaponTier::Blaster => 120.0,
        }
    }

    /// Bullet power (scales bullet radius)
    pub fn bullet_power(&self) -> u8 {
        match self {
            WeaponTier::Basic => 1,
            WeaponTier::Double => 2,
            WeaponTier::Blaster => 3,
        }
    }
}

/// Engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Field ===
    pub width: f32,
    pub height: f32,
    /// Run seed for reproducibility
    pub seed: u64,

    // === Asteroids ===
    /// Asteroid quota for the first level
    pub initial_asteroids: u32,
    /// Quota never grows past this
    pub max_asteroid_quota: u32,
    /// Candidate asteroid positions closer than this to the ship (on both axes) are rejected
    pub spawn_exclusion_radius: f32,

    // === Weapons & pools ===
    pub weapon: WeaponTier,
    /// Hard TTL after which an active bullet slot is force-expired
    pub bullet_ttl_ms: f64,
    pub particle_capacity: usize,
    pub particle_ttl_ms: f64,
    /// Particles emitted per asteroid explosion
    pub explosion_particles: usize,

    // === Spawning ===
    pub pill_interval_ms: f64,
    pub token_interval_ms: f64,
    pub ship_pickup_interval_ms: f64,
    pub pill_ttl_ms: f64,
    pub token_ttl_ms: f64,
    pub ship_pickup_ttl_ms: f64,
    /// Points granted per collected token
    pub token_value: u32,

    // === Ship ===
    /// Asteroid collisions are ignored for this long after a respawn
    pub respawn_grace_ms: f64,

    // === Audio ===
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            seed: 0x5eed,

            initial_asteroids: 3,
            max_asteroid_quota: MAX_ASTEROID_QUOTA,
            spawn_exclusion_radius: 100.0,

            weapon: WeaponTier::Basic,
            bullet_ttl_ms: 1000.0,
            particle_capacity: 50,
            particle_ttl_ms: 1500.0,
            explosion_particles: 12,

            pill_interval_ms: 3000.0,
            token_interval_ms: 5000.0,
            ship_pickup_interval_ms: 20_000.0,
            pill_ttl_ms: 8000.0,
            token_ttl_ms: 8000.0,
            ship_pickup_ttl_ms: 10_000.0,
            token_value: 25,

            respawn_grace_ms: 2000.0,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from a weapon tier (everything else default)
    pub fn with_weapon(weapon: WeaponTier) -> Self {
        Self {
            weapon,
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Bullet pool capacity implied by the weapon tier
    pub fn bullet_capacity(&self) -> usize {
        self.weapon.max_bullets()
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "width/height",
                reason: format!("field must be positive, got {}x{}", self.width, self.height),
            });
        }
        if self.particle_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "particle_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_asteroid_quota == 0 || self.max_asteroid_quota > MAX_ASTEROID_QUOTA {
            return Err(ConfigError::Invalid {
                field: "max_asteroid_quota",
                reason: format!("must be within 1..={MAX_ASTEROID_QUOTA}"),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load config from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Save config to a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Engine config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_tier_capacities() {
        assert_eq!(WeaponTier::Basic.max_bullets(), 15);
        assert_eq!(WeaponTier::Blaster.max_bullets(), 50);
        assert!(WeaponTier::Blaster.cooldown_ms() < WeaponTier::Basic.cooldown_ms());
        assert_eq!(WeaponTier::from_str("DOUBLE"), Some(WeaponTier::Double));
        assert_eq!(WeaponTier::from_str("laser"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "seed": 7, "weapon": "Blaster" }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.weapon, WeaponTier::Blaster);
        assert_eq!(config.particle_capacity, 50);
        assert_eq!(config.bullet_capacity(), 50);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = EngineConfig::from_json(r#"{ "width": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = EngineConfig::from_json(r#"{ "max_asteroid_quota": 11 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_asteroid_quota", .. }));

        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_tier() {
        let config = EngineConfig::with_weapon(WeaponTier::Double);
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back.weapon, WeaponTier::Double);
    }
}
