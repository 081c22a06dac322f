//! Input-driven camera controller.
//!
//! Owns the viewport pose and the single motion slot. Wheel zoom keeps the
//! world point under the cursor fixed; dragging pans and samples a smoothed
//! release velocity; a fast release launches an inertial coast. All times
//! are wall-clock milliseconds supplied by the host (`performance.now()`),
//! the controller never reads a clock of its own.

use super::motion::{AnimationTask, CoastTask, Motion};
use super::viewport::{Viewport, clamp_scale};

/// Camera interaction tunables.
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    /// Scale factor per unit of wheel delta:
    /// `new_scale = scale * (1 + delta * zoom_sensitivity)`.
    pub zoom_sensitivity: f32,
    /// Release speed (screen px/ms) above which a drag ends in a coast.
    pub fling_min_speed: f32,
    /// Weight of the instantaneous velocity in the exponential smoothing of
    /// the drag velocity estimate.
    pub velocity_smoothing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom_sensitivity: 0.002,
            fling_min_speed: 0.1,
            velocity_smoothing: 0.2,
        }
    }
}

/// Live drag bookkeeping, created by `begin_drag` and dropped by `end_drag`.
#[derive(Debug, Clone, Copy)]
struct DragState {
    /// Pose at drag start; the drag translates relative to this.
    origin: Viewport,
    /// Pointer position at drag start (screen px).
    start: (f32, f32),
    /// Most recent pointer position (screen px).
    last: (f32, f32),
    /// Wall-clock time of the most recent pointer sample.
    last_ms: f64,
    /// Exponentially smoothed velocity (screen px/ms).
    velocity: (f32, f32),
}

/// The camera controller. Single writer of the viewport pose.
#[derive(Debug)]
pub struct CameraController {
    viewport: Viewport,
    config: CameraConfig,
    motion: Motion,
    drag: Option<DragState>,
    locked: bool,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            viewport: Viewport::identity(),
            config,
            motion: Motion::Idle,
            drag: None,
            locked: false,
        }
    }

    /// Current pose.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Overwrite the pose directly (snapshot load, tests). Sanitized.
    pub fn set_viewport(&mut self, pose: Viewport) {
        self.viewport = pose.sanitized(self.viewport);
    }

    /// Lock out new pointer-driven camera motion. A running animation or
    /// coast is unaffected; the lock gates new input only.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True while a coast or animation is live and the host should keep
    /// scheduling frames.
    pub fn is_moving(&self) -> bool {
        !self.motion.is_idle()
    }

    /// Focal-point-preserving wheel zoom at a screen point. Positive delta
    /// zooms in. Cancels any in-flight motion; silently ignores non-finite
    /// input; no-op while locked.
    pub fn zoom_at(&mut self, sx: f32, sy: f32, wheel_delta: f32) {
        if self.locked || !(sx.is_finite() && sy.is_finite() && wheel_delta.is_finite()) {
            return;
        }
        self.motion = Motion::Idle;

        let (wx, wy) = self.viewport.screen_to_world(sx, sy);
        let new_scale = clamp_scale(self.viewport.scale * (1.0 + wheel_delta * self.config.zoom_sensitivity));

        // Re-derive the translation so (wx, wy) stays under (sx, sy).
        let next = Viewport {
            x: sx - wx * new_scale,
            y: sy - wy * new_scale,
            scale: new_scale,
        };
        self.viewport = next.sanitized(self.viewport);
    }

    /// Start a drag at a screen point. Cancels any in-flight motion and
    /// snapshots the pose the drag translates against.
    pub fn begin_drag(&mut self, sx: f32, sy: f32, now_ms: f64) {
        if self.locked || !(sx.is_finite() && sy.is_finite()) {
            return;
        }
        self.motion = Motion::Idle;
        self.drag = Some(DragState {
            origin: self.viewport,
            start: (sx, sy),
            last: (sx, sy),
            last_ms: now_ms,
            velocity: (0.0, 0.0),
        });
    }

    /// Continue a drag: translate by the pointer delta since drag start and
    /// fold the instantaneous velocity into the smoothed estimate.
    pub fn continue_drag(&mut self, sx: f32, sy: f32, now_ms: f64) {
        if self.locked || !(sx.is_finite() && sy.is_finite()) {
            return;
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };

        let dt = (now_ms - drag.last_ms) as f32;
        if dt > 0.0 {
            let inst = ((sx - drag.last.0) / dt, (sy - drag.last.1) / dt);
            let w = self.config.velocity_smoothing;
            drag.velocity = (
                w * inst.0 + (1.0 - w) * drag.velocity.0,
                w * inst.1 + (1.0 - w) * drag.velocity.1,
            );
            drag.last = (sx, sy);
            drag.last_ms = now_ms;
        }

        let next = Viewport {
            x: drag.origin.x + (sx - drag.start.0),
            y: drag.origin.y + (sy - drag.start.1),
            scale: drag.origin.scale,
        };
        self.viewport = next.sanitized(self.viewport);
    }

    /// End a drag. A release faster than `fling_min_speed` launches an
    /// inertial coast from the smoothed velocity.
    pub fn end_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if self.locked {
            return;
        }
        let (vx, vy) = drag.velocity;
        if (vx * vx + vy * vy).sqrt() > self.config.fling_min_speed {
            self.motion = Motion::Coast(CoastTask::new(vx, vy));
        }
    }

    /// Animate to a target pose over `duration_ms`. Cancels any in-flight
    /// motion; the target is sanitized against the current pose. Not gated
    /// by the lock — programmatic motion is always allowed.
    pub fn animate_to(&mut self, target: Viewport, duration_ms: f64, now_ms: f64) {
        let target = target.sanitized(self.viewport);
        self.motion = Motion::Animate(AnimationTask::new(self.viewport, target, duration_ms, now_ms));
    }

    /// Advance the active motion task by one frame. Returns true while the
    /// camera is still in motion and the host should schedule another frame.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        match &mut self.motion {
            Motion::Idle => false,
            Motion::Coast(coast) => {
                let (dx, dy, live) = coast.step();
                self.viewport.x += dx;
                self.viewport.y += dy;
                if !live {
                    self.motion = Motion::Idle;
                }
                live
            }
            Motion::Animate(task) => {
                let (pose, done) = task.sample(now_ms);
                self.viewport = pose.sanitized(self.viewport);
                if done {
                    self.motion = Motion::Idle;
                }
                !done
            }
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::viewport::{MAX_SCALE, MIN_SCALE};

    fn fling(camera: &mut CameraController) {
        camera.begin_drag(100.0, 100.0, 0.0);
        // Steady 1 px/ms rightward motion across several samples.
        for step in 1..=10 {
            camera.continue_drag(100.0 + step as f32 * 16.0, 100.0, step as f64 * 16.0);
        }
        camera.end_drag();
    }

    #[test]
    fn test_zoom_preserves_focal_point() {
        let mut camera = CameraController::default();
        camera.set_viewport(Viewport::new(37.0, -12.0, 0.8));

        let (wx, wy) = camera.viewport().screen_to_world(400.0, 300.0);
        camera.zoom_at(400.0, 300.0, 100.0);
        let (sx, sy) = camera.viewport().world_to_screen(wx, wy);

        assert!((sx - 400.0).abs() < 1e-2);
        assert!((sy - 300.0).abs() < 1e-2);
        assert!(camera.viewport().scale > 0.8);
    }

    #[test]
    fn test_zoom_scale_stays_bounded() {
        let mut camera = CameraController::default();
        for _ in 0..500 {
            camera.zoom_at(10.0, 10.0, 500.0);
            let scale = camera.viewport().scale;
            assert!((MIN_SCALE..=MAX_SCALE).contains(&scale));
        }
        assert_eq!(camera.viewport().scale, MAX_SCALE);
        for _ in 0..500 {
            camera.zoom_at(10.0, 10.0, -400.0);
            let scale = camera.viewport().scale;
            assert!((MIN_SCALE..=MAX_SCALE).contains(&scale));
        }
        assert_eq!(camera.viewport().scale, MIN_SCALE);
    }

    #[test]
    fn test_drag_translates_viewport() {
        let mut camera = CameraController::default();
        camera.begin_drag(200.0, 200.0, 0.0);
        camera.continue_drag(260.0, 170.0, 16.0);
        assert_eq!(camera.viewport().x, 60.0);
        assert_eq!(camera.viewport().y, -30.0);
        // Delta is measured from drag start, not accumulated per move.
        camera.continue_drag(210.0, 205.0, 32.0);
        assert_eq!(camera.viewport().x, 10.0);
        assert_eq!(camera.viewport().y, 5.0);
    }

    #[test]
    fn test_fast_release_coasts() {
        let mut camera = CameraController::default();
        fling(&mut camera);
        assert!(camera.is_moving());

        let x_before = camera.viewport().x;
        assert!(camera.advance(200.0));
        assert!(camera.viewport().x > x_before);

        // Coast terminates on its own within a bounded number of frames.
        let mut frames = 0;
        while camera.advance(200.0 + frames as f64 * 16.0) {
            frames += 1;
            assert!(frames < 200);
        }
        assert!(!camera.is_moving());
    }

    #[test]
    fn test_slow_release_does_not_coast() {
        let mut camera = CameraController::default();
        camera.begin_drag(100.0, 100.0, 0.0);
        camera.continue_drag(101.0, 100.0, 100.0); // 0.01 px/ms
        camera.end_drag();
        assert!(!camera.is_moving());
    }

    #[test]
    fn test_animate_cancels_coast() {
        let mut camera = CameraController::default();
        fling(&mut camera);
        assert!(matches!(camera.motion, Motion::Coast(_)));

        camera.animate_to(Viewport::new(0.0, 0.0, 2.0), 300.0, 500.0);
        // Exactly one motion source remains, the new one.
        assert!(matches!(camera.motion, Motion::Animate(_)));

        camera.advance(800.0);
        assert!(!camera.is_moving());
        assert!((camera.viewport().scale - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_new_drag_cancels_animation() {
        let mut camera = CameraController::default();
        camera.animate_to(Viewport::new(500.0, 0.0, 1.0), 1000.0, 0.0);
        assert!(camera.is_moving());
        camera.begin_drag(0.0, 0.0, 100.0);
        assert!(!camera.is_moving());
    }

    #[test]
    fn test_lock_gates_input_not_motion() {
        let mut camera = CameraController::default();
        camera.animate_to(Viewport::new(100.0, 0.0, 1.0), 200.0, 0.0);
        camera.set_locked(true);

        camera.zoom_at(0.0, 0.0, 300.0);
        camera.begin_drag(0.0, 0.0, 10.0);
        camera.continue_drag(50.0, 0.0, 20.0);
        assert_eq!(camera.viewport().scale, 1.0);
        assert_eq!(camera.viewport().x, 0.0);

        // The animation started before the lock still runs to completion.
        assert!(camera.advance(100.0));
        camera.advance(200.0);
        assert!((camera.viewport().x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_input_ignored() {
        let mut camera = CameraController::default();
        camera.zoom_at(f32::NAN, 0.0, 100.0);
        camera.begin_drag(0.0, 0.0, 0.0);
        camera.continue_drag(f32::INFINITY, 0.0, 16.0);
        let vp = camera.viewport();
        assert!(vp.x.is_finite() && vp.y.is_finite() && vp.scale.is_finite());
        assert_eq!(vp.x, 0.0);
    }
}
