//! Score, inventory and powerup collaborators
//!
//! The engine talks to these through small traits so tests can substitute
//! fakes. Calls are single, idempotent mutations ("add N points"); the engine
//! never reads a value back to write it again.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::audio::AudioMixer;

/// Inventory item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Collected tokens
    Token,
    /// Spare ships (lives)
    Ship,
}

/// Powerups granted by pills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Asteroid collisions are ignored
    Invincible,
    /// Weapon cooldown halved
    RapidFire,
}

/// Snapshot of active powerups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Powerups {
    pub invincible: bool,
    pub rapid_fire: bool,
}

pub trait ScoreService {
    fn add_to_score(&mut self, points: u32);
    fn add_item(&mut self, kind: ItemKind, amount: u32);
    /// Consume one item; false if none are left
    fn use_item(&mut self, kind: ItemKind) -> bool;
}

pub trait PowerupService {
    fn current(&self, now_ms: f64) -> Powerups;
    fn activate_powerup(&mut self, kind: PowerupKind, now_ms: f64);
}

impl<T: ScoreService> ScoreService for Rc<RefCell<T>> {
    fn add_to_score(&mut self, points: u32) {
        self.borrow_mut().add_to_score(points);
    }

    fn add_item(&mut self, kind: ItemKind, amount: u32) {
        self.borrow_mut().add_item(kind, amount);
    }

    fn use_item(&mut self, kind: ItemKind) -> bool {
        self.borrow_mut().use_item(kind)
    }
}

impl<T: PowerupService> PowerupService for Rc<RefCell<T>> {
    fn current(&self, now_ms: f64) -> Powerups {
        self.borrow().current(now_ms)
    }

    fn activate_powerup(&mut self, kind: PowerupKind, now_ms: f64) {
        self.borrow_mut().activate_powerup(kind, now_ms);
    }
}

/// In-memory score and inventory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreLedger {
    pub score: u64,
    /// Best score seen by this ledger
    pub best: u64,
    pub items: BTreeMap<ItemKind, u32>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger starting with `lives` spare ships
    pub fn with_lives(lives: u32) -> Self {
        let mut ledger = Self::new();
        if lives > 0 {
            ledger.items.insert(ItemKind::Ship, lives);
        }
        ledger
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        self.items.get(&kind).copied().unwrap_or(0)
    }

    /// Start a new run, keeping the best score
    pub fn reset_run(&mut self) {
        self.score = 0;
        self.items.clear();
    }
}

impl ScoreService for ScoreLedger {
    fn add_to_score(&mut self, points: u32) {
        self.score += points as u64;
        self.best = self.best.max(self.score);
    }

    fn add_item(&mut self, kind: ItemKind, amount: u32) {
        *self.items.entry(kind).or_insert(0) += amount;
    }

    fn use_item(&mut self, kind: ItemKind) -> bool {
        match self.items.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Powerups that run for a fixed duration after activation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedPowerups {
    pub invincible_ms: f64,
    pub rapid_fire_ms: f64,
    active_until: BTreeMap<PowerupKind, f64>,
}

impl Default for TimedPowerups {
    fn default() -> Self {
        Self {
            invincible_ms: 5000.0,
            rapid_fire_ms: 8000.0,
            active_until: BTreeMap::new(),
        }
    }
}

impl TimedPowerups {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_active(&self, kind: PowerupKind, now_ms: f64) -> bool {
        self.active_until.get(&kind).is_some_and(|&until| now_ms < until)
    }
}

impl PowerupService for TimedPowerups {
    fn current(&self, now_ms: f64) -> Powerups {
        Powerups {
            invincible: self.is_active(PowerupKind::Invincible, now_ms),
            rapid_fire: self.is_active(PowerupKind::RapidFire, now_ms),
        }
    }

    fn activate_powerup(&mut self, kind: PowerupKind, now_ms: f64) {
        let duration = match kind {
            PowerupKind::Invincible => self.invincible_ms,
            PowerupKind::RapidFire => self.rapid_fire_ms,
        };
        // Re-collecting extends from now rather than stacking
        self.active_until.insert(kind, now_ms + duration);
    }
}

/// Summary handed to the game-over callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverSummary {
    /// Points earned this session
    pub score: u64,
    pub level: u32,
    pub frames: u64,
}

pub type GameOverCallback = Box<dyn FnMut(GameOverSummary)>;

/// Everything the engine talks to outside the simulation
pub struct Services {
    pub score: Box<dyn ScoreService>,
    pub powerups: Box<dyn PowerupService>,
    pub audio: AudioMixer,
    pub on_game_over: Option<GameOverCallback>,
}

impl Services {
    pub fn new(
        score: Box<dyn ScoreService>,
        powerups: Box<dyn PowerupService>,
        audio: AudioMixer,
    ) -> Self {
        Self {
            score,
            powerups,
            audio,
            on_game_over: None,
        }
    }

    /// In-memory ledger and timed powerups, silent audio
    pub fn headless() -> Self {
        Self::new(
            Box::new(ScoreLedger::new()),
            Box::new(TimedPowerups::new()),
            AudioMixer::default(),
        )
    }

    pub fn with_game_over(mut self, callback: impl FnMut(GameOverSummary) + 'static) -> Self {
        self.on_game_over = Some(Box::new(callback));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_item_consumes_until_empty() {
        let mut ledger = ScoreLedger::with_lives(1);
        assert!(ledger.use_item(ItemKind::Ship));
        assert!(!ledger.use_item(ItemKind::Ship));
        assert!(!ledger.use_item(ItemKind::Token));
    }

    #[test]
    fn test_best_score_survives_reset() {
        let mut ledger = ScoreLedger::new();
        ledger.add_to_score(40);
        ledger.add_item(ItemKind::Token, 2);
        ledger.reset_run();
        ledger.add_to_score(10);
        assert_eq!(ledger.score, 10);
        assert_eq!(ledger.best, 40);
        assert_eq!(ledger.count(ItemKind::Token), 0);
    }

    #[test]
    fn test_timed_powerups_expire() {
        let mut powerups = TimedPowerups::new();
        powerups.activate_powerup(PowerupKind::Invincible, 1000.0);
        assert!(powerups.current(5999.0).invincible);
        assert!(!powerups.current(6000.0).invincible);
        assert!(!powerups.current(2000.0).rapid_fire);
    }

    #[test]
    fn test_shared_handle_sees_engine_writes() {
        let ledger = Rc::new(RefCell::new(ScoreLedger::new()));
        let mut boxed: Box<dyn ScoreService> = Box::new(ledger.clone());
        boxed.add_to_score(5);
        boxed.add_item(ItemKind::Ship, 1);
        assert_eq!(ledger.borrow().score, 5);
        assert_eq!(ledger.borrow().count(ItemKind::Ship), 1);
    }
}
