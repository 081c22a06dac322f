//! Camera motion tasks: inertial coast and eased animation.
//!
//! At most one motion source drives the camera at a time; the controller
//! holds a single [`Motion`] value, so starting a new task structurally
//! cancels the previous one. Both tasks are advanced once per animation
//! frame by the host's repaint loop — there is no internal clock and no
//! background thread.

use super::viewport::{Viewport, clamp_scale};

/// Per-frame multiplier applied to the coast velocity (px/ms) to get the
/// frame's translation. Roughly one 60 Hz frame worth of milliseconds.
pub const COAST_FRAME_BOOST: f32 = 14.0;

/// Per-frame exponential decay applied to the coast velocity.
pub const COAST_FRICTION: f32 = 0.92;

/// Coast speed (px/ms) below which the flick is considered finished.
pub const COAST_STOP_SPEED: f32 = 0.01;

/// Ease-out cubic: fast start, decelerating into the target.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Linear interpolation between two poses. The scale is re-clamped because
/// interpolation between two in-bounds scales can still wobble past a bound
/// under float rounding.
pub fn lerp_pose(from: Viewport, to: Viewport, t: f32) -> Viewport {
    Viewport {
        x: from.x + (to.x - from.x) * t,
        y: from.y + (to.y - from.y) * t,
        scale: clamp_scale(from.scale + (to.scale - from.scale) * t),
    }
}

/// An eased transition from one pose to another over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct AnimationTask {
    start: Viewport,
    target: Viewport,
    start_ms: f64,
    duration_ms: f64,
}

impl AnimationTask {
    /// Begin an animation at `now_ms`. Non-positive durations snap to the
    /// target on the first frame.
    pub fn new(start: Viewport, target: Viewport, duration_ms: f64, now_ms: f64) -> Self {
        Self {
            start,
            target,
            start_ms: now_ms,
            duration_ms: duration_ms.max(1.0),
        }
    }

    /// Sample the pose at `now_ms`. Returns the pose and whether the
    /// animation has reached its target.
    pub fn sample(&self, now_ms: f64) -> (Viewport, bool) {
        let elapsed = (now_ms - self.start_ms).max(0.0);
        let progress = (elapsed / self.duration_ms).min(1.0) as f32;
        let eased = ease_out_cubic(progress);
        (lerp_pose(self.start, self.target, eased), progress >= 1.0)
    }
}

/// A flick-to-scroll coast: each frame translates by the current velocity
/// and decays it. Exponential decay, not physics — the goal is a short,
/// bounded glide.
#[derive(Debug, Clone, Copy)]
pub struct CoastTask {
    vx: f32,
    vy: f32,
}

impl CoastTask {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    /// Advance one frame. Returns the screen-space translation to apply and
    /// whether the coast is still live.
    pub fn step(&mut self) -> (f32, f32, bool) {
        let dx = self.vx * COAST_FRAME_BOOST;
        let dy = self.vy * COAST_FRAME_BOOST;
        self.vx *= COAST_FRICTION;
        self.vy *= COAST_FRICTION;
        let live = (self.vx * self.vx + self.vy * self.vy).sqrt() >= COAST_STOP_SPEED;
        (dx, dy, live)
    }
}

/// The controller's single motion slot.
#[derive(Debug, Clone, Copy)]
pub enum Motion {
    Idle,
    Coast(CoastTask),
    Animate(AnimationTask),
}

impl Motion {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
