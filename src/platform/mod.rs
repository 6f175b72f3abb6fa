//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Frame scheduling (requestAnimationFrame on web, manual stepping headless)
//! - Time
//! - Drawing surface (canvas 2D on web)

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Identifies one requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Host frame scheduler.
///
/// After `request_tick` the host must call `Engine::on_frame` with the returned
/// handle once, on its next refresh, unless the handle was cancelled.
pub trait Scheduler {
    fn request_tick(&mut self) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

/// Millisecond time source
pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Default)]
struct FrameQueue {
    next: u64,
    pending: Option<TickHandle>,
    requested: u64,
    cancelled: u64,
}

/// Scheduler driven by hand: the caller takes the pending handle and feeds it
/// back to the engine. Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle the engine is waiting on, if any
    pub fn pending(&self) -> Option<TickHandle> {
        self.queue.borrow().pending
    }

    /// "Fire" the pending frame: remove and return its handle
    pub fn take_pending(&self) -> Option<TickHandle> {
        self.queue.borrow_mut().pending.take()
    }

    pub fn requested(&self) -> u64 {
        self.queue.borrow().requested
    }

    pub fn cancelled(&self) -> u64 {
        self.queue.borrow().cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickHandle {
        let mut queue = self.queue.borrow_mut();
        queue.next += 1;
        queue.requested += 1;
        let handle = TickHandle(queue.next);
        queue.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut queue = self.queue.borrow_mut();
        if queue.pending == Some(handle) {
            queue.pending = None;
            queue.cancelled += 1;
        }
    }
}

/// Clock set by hand. Clones share one reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<RefCell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(RefCell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        *self.now.borrow_mut() = ms;
    }

    pub fn advance(&self, ms: f64) {
        *self.now.borrow_mut() += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.borrow()
    }
}

/// Wall clock measured from construction
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_shares_queue() {
        let host = ManualScheduler::new();
        let mut engine_side = host.clone();

        let first = engine_side.request_tick();
        let second = engine_side.request_tick();
        assert_ne!(first, second);
        assert_eq!(host.pending(), Some(second), "latest request wins");

        engine_side.cancel(first);
        assert_eq!(host.cancelled(), 0, "stale handle cancels nothing");
        engine_side.cancel(second);
        assert_eq!(host.take_pending(), None);
        assert_eq!(host.requested(), 2);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100.0);
        let view = clock.clone();
        clock.advance(16.5);
        assert_eq!(view.now_ms(), 116.5);
        clock.set(0.0);
        assert_eq!(view.now_ms(), 0.0);
    }
}
