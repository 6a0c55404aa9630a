use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::error::FieldResult;
use crate::render::{Surface, render};
use crate::simulation::SimulationState;

/// Shared stop flag checked once per frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Relaxed)
    }
}

/// Source of display refreshes. Returns `false` once no more frames will come.
pub trait FrameClock {
    fn wait_for_refresh(&mut self) -> bool;
}

/// Paces frames to a fixed refresh rate by sleeping the calling thread.
#[derive(Debug)]
pub struct FixedRateClock {
    interval: Duration,
    next: Option<Instant>,
    remaining: Option<u64>,
}

impl FixedRateClock {
    pub fn new(refresh_rate: f32) -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / refresh_rate.max(1.0)),
            next: None,
            remaining: None,
        }
    }

    /// Stops after `frames` refreshes.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameClock for FixedRateClock {
    fn wait_for_refresh(&mut self) -> bool {
        if let Some(remaining) = &mut self.remaining {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
        }

        let now = Instant::now();
        let due = self.next.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }
        self.next = Some(due.max(now) + self.interval);
        true
    }
}

/// Yields a fixed number of refreshes without waiting.
#[derive(Debug, Clone, Copy)]
pub struct FrameBudget {
    remaining: u64,
}

impl FrameBudget {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl FrameClock for FrameBudget {
    fn wait_for_refresh(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// A mounted particle field. Input handlers and the frame loop may run on
/// different threads; the whole state sits behind one lock that is held for
/// a full step and render.
pub struct Animation {
    config: SimulationConfig,
    state: Arc<Mutex<SimulationState>>,
    token: CancellationToken,
    frames: AtomicU64,
}

impl Animation {
    pub fn mount(config: SimulationConfig, width: f32, height: f32) -> FieldResult<Self> {
        let state = SimulationState::initialize(&config, width, height)?;
        info!(
            particles = state.particles.len(),
            width, height, "mounted particle field"
        );
        Ok(Self::from_state(config, state))
    }

    pub fn from_state(config: SimulationConfig, state: SimulationState) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
            token: CancellationToken::new(),
            frames: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Relaxed)
    }

    pub fn snapshot(&self) -> SimulationState {
        self.state.lock().clone()
    }

    /// Locks the state unless unmounted. The token is checked again once the
    /// lock is held so nothing runs after `unmount` has returned.
    fn live_state(&self) -> Option<MutexGuard<'_, SimulationState>> {
        if self.token.is_cancelled() {
            return None;
        }
        let state = self.state.lock();
        (!self.token.is_cancelled()).then_some(state)
    }

    pub fn pointer_moved(&self, x: f32, y: f32) {
        if let Some(mut state) = self.live_state() {
            state.on_pointer_move(x, y);
        }
    }

    pub fn resized(&self, width: f32, height: f32) {
        if let Some(mut state) = self.live_state() {
            debug!(width, height, "viewport resized");
            state.on_resize(width, height);
        }
    }

    /// Runs one step and draws it. Returns `false` once unmounted.
    pub fn frame<S: Surface + ?Sized>(&self, surface: &mut S) -> bool {
        let Some(mut state) = self.live_state() else {
            return false;
        };
        state.step(&self.config);
        render(&state, &self.config, surface);
        self.frames.fetch_add(1, Relaxed);
        true
    }

    /// Drives frames from `clock` until cancelled or the clock runs dry.
    /// Returns the number of frames run.
    pub fn run<S, C>(&self, surface: &mut S, clock: &mut C) -> u64
    where
        S: Surface + ?Sized,
        C: FrameClock + ?Sized,
    {
        let mut ran = 0;
        while !self.token.is_cancelled() && clock.wait_for_refresh() {
            if !self.frame(surface) {
                break;
            }
            ran += 1;
        }
        debug!(frames = ran, "frame loop stopped");
        ran
    }

    pub fn unmount(&self) {
        if !self.token.is_cancelled() {
            self.token.cancel();
            info!(frames = self.frames(), "unmounted particle field");
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.unmount();
    }
}
