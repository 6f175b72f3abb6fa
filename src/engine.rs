//! Engine facade
//!
//! Owns the world, the drawing surface and the phase machine, and talks to the
//! host through the `Scheduler`/`Clock` capabilities and the `Services`
//! collaborators. The host calls `on_frame` whenever a requested frame fires.

use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, TransitionError};
use crate::platform::{Clock, Scheduler, TickHandle};
use crate::renderer::DrawSurface;
use crate::services::{GameOverSummary, ItemKind, Services};
use crate::sim::{
    Effect, Entity, EntityGroups, EntityId, Group, KeyState, MachineState, PoolStats,
    StateMachine, TickInput, TransitionRecord, World, tick,
};

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    /// Thrust
    Up,
    /// Fire
    Space,
}

pub struct Engine {
    config: EngineConfig,
    world: World,
    keys: KeyState,
    surface: Option<Box<dyn DrawSurface>>,
    scheduler: Box<dyn Scheduler>,
    clock: Box<dyn Clock>,
    services: Services,
    machine: StateMachine,
    /// Frame we're waiting on; anything else reaching `on_frame` is stale
    pending_tick: Option<TickHandle>,
    running: bool,
    /// Points scored since the last reset
    session_score: u64,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
        mut services: Services,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        services.audio.set_master_volume(config.master_volume);
        services.audio.set_sfx_volume(config.sfx_volume);
        services.audio.set_muted(config.muted);

        let world = World::new(&config, clock.now_ms());
        Ok(Self {
            config,
            world,
            keys: KeyState::default(),
            surface: None,
            scheduler,
            clock,
            services,
            machine: StateMachine::new(),
            pending_tick: None,
            running: false,
            session_score: 0,
        })
    }

    /// Bind the drawing surface
    pub fn initialize(&mut self, surface: Box<dyn DrawSurface>) {
        self.surface = Some(surface);
    }

    /// Unbind the drawing surface (a running loop fails on its next frame)
    pub fn take_surface(&mut self) -> Option<Box<dyn DrawSurface>> {
        self.surface.take()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    // === Entities ===

    /// Insert an externally built entity. Its id must be assigned and unique
    /// and `group` must be the kind's own group.
    pub fn add_entity(&mut self, entity: Entity, group: Group) -> Result<EntityId, EngineError> {
        let id = entity.id;
        if !id.is_assigned() {
            return Err(EngineError::MissingId);
        }
        if entity.home_group() != group {
            return Err(EngineError::WrongGroup {
                kind: entity.kind.name(),
                group,
            });
        }
        if self.world.id_in_use(id) {
            return Err(EngineError::DuplicateId(id));
        }
        if !self.world.ids.observe(id) {
            return Err(EngineError::IdExhausted(id));
        }
        self.world.groups.push(group, entity);
        Ok(id)
    }

    /// Take an entity out of its group. Pooled entities leave their pool for good.
    pub fn remove_entity(&mut self, id: EntityId, group: Group) -> Result<Entity, EngineError> {
        self.world
            .remove(group, id)
            .ok_or(EngineError::NotFound { id, group })
    }

    /// Reserve a fresh id for an entity built outside the engine
    pub fn next_entity_id(&mut self) -> EntityId {
        self.world.ids.next_id()
    }

    pub fn spawn_asteroids(&mut self, count: u32) -> Vec<EntityId> {
        self.world.spawn_asteroids(count, &self.config)
    }

    // === Loop ===

    /// Run exactly one tick and drain its effects
    pub fn step(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now_ms();
        let surface = self.surface.as_deref_mut().ok_or(EngineError::NoSurface)?;
        let input = TickInput {
            now,
            keys: self.keys,
            powerups: self.services.powerups.current(now),
        };
        let effects = tick(&mut self.world, surface, &input, &self.config);
        self.drain_effects(effects, now);
        Ok(())
    }

    /// Schedule `step` on every refresh. Returns false without a surface.
    pub fn start(&mut self) -> bool {
        if self.surface.is_none() {
            log::error!("Cannot start game loop: no drawing surface");
            return false;
        }
        if self.running {
            return true;
        }
        self.running = true;
        self.pending_tick = Some(self.scheduler.request_tick());
        log::info!("Game loop started");
        true
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel(handle);
        }
        if self.running {
            self.running = false;
            log::info!("Game loop stopped");
        }
    }

    /// Clear groups, pools, timers and the scheduled frame, and drop any
    /// delayed transition. The surface stays bound and the phase machine keeps
    /// its current state and history; the host drives phases.
    pub fn reset(&mut self) {
        self.stop();
        if let Some(pending) = self.machine.cancel_transition() {
            log::debug!("Reset dropped pending transition to {}", pending.to.as_str());
        }
        self.world.reset(&self.config, self.clock.now_ms());
        self.keys = KeyState::default();
        self.session_score = 0;
    }

    /// Reset, then place the ship and the first wave
    pub fn new_game(&mut self) {
        self.reset();
        self.world.spawn_ship(&self.config);
        self.world.advance_level(&self.config);
    }

    /// Host callback for a fired frame
    pub fn on_frame(&mut self, handle: TickHandle) {
        if self.pending_tick != Some(handle) {
            log::debug!("Ignoring stale frame {handle:?}");
            return;
        }
        self.pending_tick = None;
        if !self.running {
            return;
        }

        let now = self.clock.now_ms();
        self.machine.poll(now);
        match self.machine.state() {
            MachineState::Playing => {
                if let Err(err) = self.step() {
                    log::error!("Game loop failed: {err}");
                    self.stop();
                    self.machine.force_game_over(now);
                    return;
                }
            }
            // Keep the frame chain alive so resume is immediate
            MachineState::Paused => {}
            state => {
                log::info!("Game loop idle in {}", state.as_str());
                self.stop();
                return;
            }
        }

        if self.running {
            self.pending_tick = Some(self.scheduler.request_tick());
        }
    }

    /// Hand queued effects to the services. A lost ship is resolved last so
    /// the game-over summary includes points from the same frame.
    fn drain_effects(&mut self, effects: Vec<Effect>, now: f64) {
        let mut ship_lost = None;
        for effect in effects {
            match effect {
                Effect::AddScore(points) => {
                    self.services.score.add_to_score(points);
                    self.session_score += points as u64;
                }
                Effect::AddItem(kind, amount) => self.services.score.add_item(kind, amount),
                Effect::ActivatePowerup(kind) => self.services.powerups.activate_powerup(kind, now),
                Effect::PlaySound(sound) => self.services.audio.play(sound),
                Effect::ShipDestroyed { pos } => ship_lost = Some(pos),
            }
        }

        let Some(pos) = ship_lost else { return };
        if self.services.score.use_item(ItemKind::Ship) {
            log::info!("Ship lost at {pos}, spare used");
            self.world.respawn_ship(&self.config, now);
        } else {
            self.game_over(now);
        }
    }

    fn game_over(&mut self, now: f64) {
        let summary = GameOverSummary {
            score: self.session_score,
            level: self.world.level,
            frames: self.world.frame,
        };
        log::info!(
            "Game over: score {} at level {} after {} frames",
            summary.score,
            summary.level,
            summary.frames
        );
        self.services.audio.play(SoundEffect::GameOver);
        if let Some(callback) = self.services.on_game_over.as_mut() {
            callback(summary);
        }
        if let Err(err) = self.machine.set_state(MachineState::GameOver, now) {
            log::warn!("Game over outside play: {err}");
            self.machine.force_game_over(now);
        }
        self.stop();
    }

    // === Input ===

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Left => self.keys.left = pressed,
            Key::Right => self.keys.right = pressed,
            Key::Up => self.keys.up = pressed,
            Key::Space => self.keys.fire = pressed,
        }
    }

    pub fn keys(&self) -> KeyState {
        self.keys
    }

    // === Phase machine ===

    pub fn set_state(&mut self, to: MachineState) -> Result<(), TransitionError> {
        self.machine.set_state(to, self.clock.now_ms())
    }

    pub fn set_pause(&mut self, paused: bool) -> Result<bool, TransitionError> {
        self.machine.set_pause(paused, self.clock.now_ms())
    }

    pub fn start_transition(&mut self, to: MachineState, delay_ms: f64) -> Result<(), TransitionError> {
        self.machine.start_transition(to, delay_ms, self.clock.now_ms())
    }

    pub fn cancel_transition(&mut self) -> bool {
        self.machine.cancel_transition().is_some()
    }

    pub fn state(&self) -> MachineState {
        self.machine.state()
    }

    pub fn is_paused(&self) -> bool {
        self.machine.is_paused()
    }

    pub fn is_playing(&self) -> bool {
        self.machine.is_playing()
    }

    pub fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning(self.clock.now_ms())
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.machine.history()
    }

    // === Accessors ===

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn group(&self, group: Group) -> &[Entity] {
        self.world.groups.get(group)
    }

    pub fn groups(&self) -> &EntityGroups {
        &self.world.groups
    }

    pub fn level(&self) -> u32 {
        self.world.level
    }

    pub fn asteroid_quota(&self) -> u32 {
        self.world.asteroid_quota
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_count(&self) -> u64 {
        self.world.frame
    }

    pub fn session_score(&self) -> u64 {
        self.session_score
    }

    pub fn grace_active(&self) -> bool {
        self.world.grace_active(self.clock.now_ms())
    }

    pub fn bullet_stats(&self) -> PoolStats {
        self.world.bullet_stats()
    }

    pub fn particle_stats(&self) -> PoolStats {
        self.world.particle_stats()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::audio::{AudioMixer, RecordingAudio};
    use crate::consts::FRAME_MS;
    use crate::platform::{ManualClock, ManualScheduler};
    use crate::renderer::RecordingSurface;
    use crate::services::{ScoreLedger, TimedPowerups};

    struct Fixture {
        engine: Engine,
        scheduler: ManualScheduler,
        clock: ManualClock,
        surface: RecordingSurface,
        ledger: Rc<RefCell<ScoreLedger>>,
        audio: Rc<RefCell<RecordingAudio>>,
        summaries: Rc<RefCell<Vec<GameOverSummary>>>,
    }

    impl Fixture {
        fn new(lives: u32) -> Self {
            let scheduler = ManualScheduler::new();
            let clock = ManualClock::new(0.0);
            let surface = RecordingSurface::new();
            let ledger = Rc::new(RefCell::new(ScoreLedger::with_lives(lives)));
            let audio = Rc::new(RefCell::new(RecordingAudio::default()));
            let summaries = Rc::new(RefCell::new(Vec::new()));

            let sink = summaries.clone();
            let services = Services::new(
                Box::new(ledger.clone()),
                Box::new(TimedPowerups::new()),
                AudioMixer::new(Box::new(audio.clone())),
            )
            .with_game_over(move |summary| sink.borrow_mut().push(summary));

            let mut engine = Engine::new(
                EngineConfig::default(),
                Box::new(scheduler.clone()),
                Box::new(clock.clone()),
                services,
            )
            .unwrap();
            engine.initialize(Box::new(surface.clone()));

            Self {
                engine,
                scheduler,
                clock,
                surface,
                ledger,
                audio,
                summaries,
            }
        }

        fn play(&mut self) {
            self.engine.set_state(MachineState::ReadyToPlay).unwrap();
            self.engine.set_state(MachineState::Playing).unwrap();
        }

        /// Let the host fire the pending frame; false if none was requested
        fn frame(&mut self) -> bool {
            self.clock.advance(FRAME_MS);
            match self.scheduler.take_pending() {
                Some(handle) => {
                    self.engine.on_frame(handle);
                    true
                }
                None => false,
            }
        }

        /// Drop a stationary asteroid right on the ship
        fn ram_ship(&mut self) {
            let ship = self.engine.groups().ship().map(|s| s.pos).unwrap();
            let id = self.engine.next_entity_id();
            let mut rock = Entity::asteroid(id, ship, 20.0, &mut self.engine.world.rng);
            rock.vel = Vec2::ZERO;
            self.engine.add_entity(rock, Group::Asteroids).unwrap();
        }
    }

    #[test]
    fn test_add_entity_validation() {
        let mut f = Fixture::new(0);
        let ship = Entity::ship(EntityId::UNASSIGNED, Vec2::ZERO);
        assert_eq!(f.engine.add_entity(ship, Group::Ship), Err(EngineError::MissingId));

        let ship = Entity::ship(EntityId(40), Vec2::ZERO);
        assert_eq!(
            f.engine.add_entity(ship.clone(), Group::Asteroids),
            Err(EngineError::WrongGroup {
                kind: "ship",
                group: Group::Asteroids
            })
        );
        assert_eq!(f.engine.add_entity(ship.clone(), Group::Ship), Ok(EntityId(40)));
        assert_eq!(
            f.engine.add_entity(ship, Group::Ship),
            Err(EngineError::DuplicateId(EntityId(40)))
        );
        // Allocator moved past the external id
        assert_eq!(f.engine.next_entity_id(), EntityId(41));
    }

    #[test]
    fn test_add_entity_rejects_last_id() {
        let mut f = Fixture::new(0);
        let ship = Entity::ship(EntityId(u32::MAX), Vec2::ZERO);
        assert_eq!(
            f.engine.add_entity(ship, Group::Ship),
            Err(EngineError::IdExhausted(EntityId(u32::MAX)))
        );
        assert!(f.engine.group(Group::Ship).is_empty());
        assert_eq!(f.engine.next_entity_id(), EntityId(1));
    }

    #[test]
    fn test_add_entity_rejects_parked_pool_id() {
        let mut f = Fixture::new(0);
        let ship = f.engine.next_entity_id();
        f.engine
            .add_entity(Entity::ship(ship, Vec2::new(400.0, 300.0)), Group::Ship)
            .unwrap();
        // A parked rock out of the line of fire holds off the level-up wave
        let id = f.engine.next_entity_id();
        let mut anchor = Entity::asteroid(id, Vec2::new(60.0, 60.0), 20.0, &mut f.engine.world.rng);
        anchor.vel = Vec2::ZERO;
        f.engine.add_entity(anchor, Group::Asteroids).unwrap();

        f.engine.set_key(Key::Space, true);
        f.engine.step().unwrap();
        f.engine.set_key(Key::Space, false);
        let bullet = f.engine.group(Group::Bullets)[0].id;

        // Fly until the bullet fizzles and is parked in its pool slot
        for _ in 0..70 {
            f.clock.advance(FRAME_MS);
            f.engine.step().unwrap();
        }
        assert!(f.engine.group(Group::Bullets).is_empty());
        assert_eq!(f.engine.bullet_stats().active, 0);

        let mut rock = Entity::asteroid(bullet, Vec2::new(700.0, 500.0), 20.0, &mut f.engine.world.rng);
        rock.vel = Vec2::ZERO;
        assert_eq!(
            f.engine.add_entity(rock, Group::Asteroids),
            Err(EngineError::DuplicateId(bullet))
        );

        // The next shot recycles the parked instance under its old id
        f.engine.set_key(Key::Space, true);
        f.engine.step().unwrap();
        assert_eq!(f.engine.group(Group::Bullets)[0].id, bullet);
        assert_eq!(f.engine.group(Group::Asteroids).len(), 1);
    }

    #[test]
    fn test_remove_entity() {
        let mut f = Fixture::new(3);
        assert_eq!(
            f.engine.remove_entity(EntityId(9), Group::Tokens).unwrap_err(),
            EngineError::NotFound {
                id: EntityId(9),
                group: Group::Tokens
            }
        );

        f.engine.new_game();
        f.play();
        f.engine.set_key(Key::Space, true);
        f.engine.step().unwrap();
        let bullet = f.engine.group(Group::Bullets)[0].id;
        assert_eq!(f.engine.bullet_stats().active, 1);

        let removed = f.engine.remove_entity(bullet, Group::Bullets).unwrap();
        assert_eq!(removed.id, bullet);
        assert_eq!(f.engine.bullet_stats().active, 0);
    }

    #[test]
    fn test_start_requires_surface() {
        let mut f = Fixture::new(0);
        f.engine.take_surface();
        assert!(!f.engine.start());
        assert!(!f.engine.is_running());
        assert_eq!(f.scheduler.requested(), 0);
        assert_eq!(f.engine.step(), Err(EngineError::NoSurface));
    }

    #[test]
    fn test_loop_steps_while_playing() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.play();
        assert!(f.engine.start());
        for _ in 0..5 {
            assert!(f.frame());
        }
        assert_eq!(f.engine.frame_count(), 5);
        assert!(f.engine.is_running());
        assert!(!f.surface.is_empty());
    }

    #[test]
    fn test_stale_handle_ignored() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.play();
        f.engine.start();
        let handle = f.scheduler.take_pending().unwrap();
        f.engine.on_frame(handle);
        f.engine.on_frame(handle);
        assert_eq!(f.engine.frame_count(), 1);
    }

    #[test]
    fn test_stop_cancels_pending_frame() {
        let mut f = Fixture::new(0);
        f.play();
        f.engine.start();
        f.engine.stop();
        assert_eq!(f.scheduler.cancelled(), 1);
        assert!(!f.frame());
        assert_eq!(f.engine.frame_count(), 0);
    }

    #[test]
    fn test_paused_keeps_chain_without_stepping() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.play();
        f.engine.start();
        f.frame();
        f.engine.set_pause(true).unwrap();
        for _ in 0..3 {
            assert!(f.frame(), "paused loop keeps requesting frames");
        }
        assert_eq!(f.engine.frame_count(), 1);

        f.engine.set_pause(false).unwrap();
        f.frame();
        assert_eq!(f.engine.frame_count(), 2);
    }

    #[test]
    fn test_loop_idles_outside_play() {
        let mut f = Fixture::new(0);
        f.engine.start();
        assert!(f.frame());
        assert!(!f.engine.is_running());
        assert_eq!(f.engine.frame_count(), 0);
        assert!(!f.frame());
    }

    #[test]
    fn test_delayed_start_commits_on_frame() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.engine.set_state(MachineState::ReadyToPlay).unwrap();
        f.engine.start_transition(MachineState::Playing, 0.0).unwrap();
        f.engine.start();
        assert!(f.frame());
        assert!(f.engine.is_playing());
        assert_eq!(f.engine.frame_count(), 1);
    }

    #[test]
    fn test_missing_surface_mid_run_is_fatal() {
        let mut f = Fixture::new(0);
        f.engine.new_game();
        f.play();
        f.engine.start();
        f.engine.take_surface();
        f.frame();
        assert!(!f.engine.is_running());
        assert_eq!(f.engine.state(), MachineState::GameOver);
    }

    #[test]
    fn test_ship_loss_uses_spare() {
        let mut f = Fixture::new(1);
        f.engine.new_game();
        f.play();
        f.ram_ship();
        f.engine.step().unwrap();

        assert_eq!(f.ledger.borrow().count(ItemKind::Ship), 0);
        let ships = f.engine.group(Group::Ship);
        assert_eq!(ships.len(), 1);
        assert!(ships[0].is_alive());
        assert!(f.engine.grace_active());
        assert!(f.engine.is_playing());
        assert!(f.summaries.borrow().is_empty());
    }

    #[test]
    fn test_ship_loss_without_spare_ends_game() {
        let mut f = Fixture::new(0);
        f.engine.new_game();
        f.play();
        f.engine.start();
        f.ram_ship();
        assert!(f.frame());

        assert_eq!(f.engine.state(), MachineState::GameOver);
        assert!(!f.engine.is_running());
        assert!(!f.frame(), "no further frames after game over");

        let summaries = f.summaries.borrow();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].level, 1);
        // The asteroid that hit the ship still pays out
        assert_eq!(summaries[0].score, 20);
        assert_eq!(f.ledger.borrow().score, 20);
        assert_eq!(f.audio.borrow().count(SoundEffect::GameOver), 1);
    }

    #[test]
    fn test_effects_reach_services() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.play();
        f.engine.set_key(Key::Space, true);
        f.engine.step().unwrap();
        assert_eq!(f.audio.borrow().count(SoundEffect::Fire), 1);
        // First wave arrives with the new game, not as a level-up
        assert_eq!(f.audio.borrow().count(SoundEffect::LevelUp), 0);
    }

    #[test]
    fn test_reset_behaves_as_fresh() {
        let mut f = Fixture::new(3);
        f.engine.new_game();
        f.play();
        f.engine.start();
        f.frame();
        f.frame();

        f.engine.reset();
        assert!(!f.engine.is_running());
        assert!(f.scheduler.pending().is_none());
        assert_eq!(f.engine.groups().total(), 0);
        assert_eq!(f.engine.frame_count(), 0);
        assert_eq!(f.engine.level(), 0);
        assert_eq!(f.engine.session_score(), 0);
        assert_eq!(f.engine.next_entity_id(), EntityId(1));
        assert!(f.engine.has_surface(), "surface binding survives reset");
    }

    #[test]
    fn test_reset_restarts_spawn_timers() {
        let mut f = Fixture::new(0);
        f.clock.set(100_000.0);
        f.engine.reset();

        // Timers count from the reset, not from construction
        f.clock.advance(2_000.0);
        f.engine.step().unwrap();
        assert!(f.engine.group(Group::Pills).is_empty());
        assert!(f.engine.group(Group::Tokens).is_empty());
        assert!(f.engine.group(Group::ShipPickups).is_empty());

        f.clock.advance(1_000.0);
        f.engine.step().unwrap();
        assert_eq!(f.engine.group(Group::Pills).len(), 1);
        assert!(f.engine.group(Group::Tokens).is_empty());
    }

    #[test]
    fn test_reset_drops_pending_transition() {
        let mut f = Fixture::new(0);
        f.engine.set_state(MachineState::ReadyToPlay).unwrap();
        f.engine.start_transition(MachineState::Playing, 500.0).unwrap();

        f.engine.reset();
        f.clock.advance(1_000.0);
        assert!(!f.engine.is_transitioning());
        assert!(!f.engine.cancel_transition());
        assert_eq!(f.engine.state(), MachineState::ReadyToPlay);
    }

    #[test]
    fn test_set_key_maps_to_controls() {
        let mut f = Fixture::new(0);
        f.engine.set_key(Key::Left, true);
        f.engine.set_key(Key::Up, true);
        f.engine.set_key(Key::Up, false);
        let keys = f.engine.keys();
        assert!(keys.left && !keys.right && !keys.up && !keys.fire);
    }
}
