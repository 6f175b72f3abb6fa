//! Asteroids Engine entry point
//!
//! On the web this wires a canvas and requestAnimationFrame to the engine. The
//! native build runs a seeded headless session and logs how it went.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;

    use asteroids_engine::platform::web::{FrameCallback, PerformanceClock, RafScheduler, canvas_context};
    use asteroids_engine::services::Services;
    use asteroids_engine::sim::MachineState;
    use asteroids_engine::{Engine, EngineConfig, Key};

    type SharedEngine = Rc<RefCell<Option<Engine>>>;

    fn map_key(key: &str) -> Option<Key> {
        match key {
            "ArrowLeft" | "a" => Some(Key::Left),
            "ArrowRight" | "d" => Some(Key::Right),
            "ArrowUp" | "w" => Some(Key::Up),
            " " => Some(Key::Space),
            _ => None,
        }
    }

    /// Fresh field, phase machine into PLAYING, loop running
    fn begin_run(engine: &mut Engine) {
        engine.new_game();
        if matches!(engine.state(), MachineState::Initial | MachineState::GameOver) {
            if let Err(err) = engine.set_state(MachineState::ReadyToPlay) {
                log::warn!("Cannot get ready: {err}");
                return;
            }
        }
        if let Err(err) = engine.set_state(MachineState::Playing) {
            log::warn!("Cannot start playing: {err}");
            return;
        }
        engine.start();
    }

    fn with_engine(shared: &SharedEngine, f: impl FnOnce(&mut Engine)) {
        if let Some(engine) = shared.borrow_mut().as_mut() {
            f(engine);
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
        log::info!("Asteroids Engine (web) starting...");

        let window = web_sys::window().ok_or("no window")?;
        let context = canvas_context("canvas")?;

        let shared: SharedEngine = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&shared);
        let on_frame: FrameCallback = Rc::new(move |handle| {
            if let Some(shared) = weak.upgrade() {
                with_engine(&shared, |engine| engine.on_frame(handle));
            }
        });

        let config = EngineConfig::default();
        let engine = Engine::new(
            config,
            Box::new(RafScheduler::new(window.clone(), on_frame)),
            Box::new(PerformanceClock::new(&window)),
            Services::headless(),
        )
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
        *shared.borrow_mut() = Some(engine);
        with_engine(&shared, |engine| engine.initialize(Box::new(context)));

        setup_input_handlers(&shared)?;
        setup_auto_pause(&shared)?;
        log::info!("Press Enter to start");
        Ok(())
    }

    fn setup_input_handlers(shared: &SharedEngine) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;

        // Key down
        {
            let shared = shared.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let key = event.key();
                with_engine(&shared, |engine| {
                    if let Some(k) = map_key(&key) {
                        event.prevent_default();
                        engine.set_key(k, true);
                        return;
                    }
                    match key.as_str() {
                        "Enter" if !engine.is_playing() && !engine.is_paused() => begin_run(engine),
                        "p" | "Escape" => {
                            let paused = engine.is_paused();
                            if let Err(err) = engine.set_pause(!paused) {
                                log::debug!("Pause ignored: {err}");
                            }
                        }
                        _ => {}
                    }
                });
            });
            document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Key up
        {
            let shared = shared.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(k) = map_key(&event.key()) {
                    with_engine(&shared, |engine| engine.set_key(k, false));
                }
            });
            document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_auto_pause(shared: &SharedEngine) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;

        let shared = shared.clone();
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() != web_sys::VisibilityState::Hidden {
                return;
            }
            with_engine(&shared, |engine| {
                if engine.is_playing() && engine.set_pause(true).is_ok() {
                    log::info!("Auto-paused (tab hidden)");
                }
            });
        });
        document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(err) = wasm_game::run() {
        log::error!("Startup failed: {err:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Asteroids Engine (native) starting headless session...");

    if let Err(err) = headless::run(std::env::args().nth(1)) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use asteroids_engine::audio::AudioMixer;
    use asteroids_engine::consts::FRAME_MS;
    use asteroids_engine::platform::{ManualClock, ManualScheduler};
    use asteroids_engine::renderer::RecordingSurface;
    use asteroids_engine::services::{GameOverSummary, ScoreLedger, Services, TimedPowerups};
    use asteroids_engine::sim::{Group, MachineState};
    use asteroids_engine::{ConfigError, Engine, EngineConfig, Key};

    /// One minute at 60 Hz
    const SESSION_FRAMES: u32 = 3600;
    const SPARE_SHIPS: u32 = 2;

    pub fn run(config_path: Option<String>) -> Result<(), ConfigError> {
        let config = match config_path {
            Some(path) => EngineConfig::load(Path::new(&path))?,
            None => EngineConfig::default(),
        };
        log::info!("Seed {:#x}, weapon {}", config.seed, config.weapon.as_str());

        let scheduler = ManualScheduler::new();
        let clock = ManualClock::new(0.0);
        let ledger = Rc::new(RefCell::new(ScoreLedger::with_lives(SPARE_SHIPS)));
        let finished: Rc<RefCell<Option<GameOverSummary>>> = Rc::default();

        let sink = finished.clone();
        let services = Services::new(
            Box::new(ledger.clone()),
            Box::new(TimedPowerups::new()),
            AudioMixer::default(),
        )
        .with_game_over(move |summary| *sink.borrow_mut() = Some(summary));

        let mut engine = Engine::new(config, Box::new(scheduler.clone()), Box::new(clock.clone()), services)?;
        engine.initialize(Box::new(RecordingSurface::bounded(4096)));
        engine.new_game();
        if let Err(err) = engine
            .set_state(MachineState::ReadyToPlay)
            .and_then(|_| engine.set_state(MachineState::Playing))
        {
            log::error!("Could not enter play: {err}");
            return Ok(());
        }
        engine.start();

        // Autopilot: spin slowly with the trigger held
        engine.set_key(Key::Space, true);
        engine.set_key(Key::Right, true);

        let mut frames = 0;
        while frames < SESSION_FRAMES {
            let Some(handle) = scheduler.take_pending() else {
                break;
            };
            clock.advance(FRAME_MS);
            engine.on_frame(handle);
            frames += 1;

            // Pulse thrust so the ship drifts around the field
            engine.set_key(Key::Up, frames % 120 < 20);
        }
        engine.stop();

        let ledger = ledger.borrow();
        log::info!(
            "Ran {} frames: level {}, score {} (best {}), {} asteroids left",
            engine.frame_count(),
            engine.level(),
            ledger.score,
            ledger.best,
            engine.group(Group::Asteroids).len()
        );
        log::info!(
            "Pools: bullets {:?}, particles {:?}",
            engine.bullet_stats(),
            engine.particle_stats()
        );
        match finished.borrow().as_ref() {
            Some(summary) => log::info!("Game over after {} frames", summary.frames),
            None => log::info!("Still alive in {}", engine.state().as_str()),
        }
        Ok(())
    }
}
