//! Viewport pose and world/screen coordinate transforms.
//!
//! The pose `{x, y, scale}` defines the affine map
//! `screen = world * scale + (x, y)`. The camera controller is the single
//! writer of the pose; every other component reads it. Scale is always kept
//! inside [`MIN_SCALE`, `MAX_SCALE`], and non-finite values are stopped at
//! the boundary so a NaN can never reach committed viewport state.

/// Lower bound for the world→screen magnification.
pub const MIN_SCALE: f32 = 0.05;

/// Upper bound for the world→screen magnification.
pub const MAX_SCALE: f32 = 4.0;

/// Extra screen-space margin, in pixels, applied around the visible frame
/// when culling. Items slightly outside the frame are still emitted so they
/// don't pop in mid-pan.
pub const CULL_MARGIN_PX: f32 = 100.0;

/// Viewport pose: screen-space translation of the world origin plus the
/// world→screen magnification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen-space x translation of the world origin.
    pub x: f32,
    /// Screen-space y translation of the world origin.
    pub y: f32,
    /// World→screen magnification, always within [`MIN_SCALE`, `MAX_SCALE`].
    pub scale: f32,
}

impl Viewport {
    /// Create a pose with the scale clamped into bounds.
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        Self {
            x,
            y,
            scale: clamp_scale(scale),
        }
    }

    /// Identity pose: world origin at the screen origin, no magnification.
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }

    /// Map a world-space point to screen space.
    #[inline]
    pub fn world_to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.scale + self.x, wy * self.scale + self.y)
    }

    /// Map a screen-space point to world space.
    #[inline]
    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.x) / self.scale, (sy - self.y) / self.scale)
    }

    /// The world-space rectangle covered by a `screen_w` × `screen_h` frame,
    /// expanded by `margin_px` (screen pixels) on every side.
    pub fn visible_world_rect(&self, screen_w: f32, screen_h: f32, margin_px: f32) -> WorldRect {
        let margin = margin_px / self.scale;
        let (min_x, min_y) = self.screen_to_world(0.0, 0.0);
        let (max_x, max_y) = self.screen_to_world(screen_w, screen_h);
        WorldRect {
            min_x: min_x - margin,
            min_y: min_y - margin,
            max_x: max_x + margin,
            max_y: max_y + margin,
        }
    }

    /// Replace non-finite fields with the corresponding `fallback` fields and
    /// re-clamp the scale. Interaction code calls this before committing a
    /// new pose.
    pub fn sanitized(self, fallback: Self) -> Self {
        let pick = |v: f32, f: f32| if v.is_finite() { v } else { f };
        Self {
            x: pick(self.x, fallback.x),
            y: pick(self.y, fallback.y),
            scale: clamp_scale(pick(self.scale, fallback.scale)),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

/// Clamp a magnification into [`MIN_SCALE`, `MAX_SCALE`]; non-finite input
/// collapses to `MIN_SCALE`.
#[inline]
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        MIN_SCALE
    }
}

/// Axis-aligned world-space rectangle used for visibility tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl WorldRect {
    /// Circle/rect overlap test: clamp the center into the rect and compare
    /// the squared distance against the squared radius.
    #[inline]
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let nearest_x = cx.clamp(self.min_x, self.max_x);
        let nearest_y = cy.clamp(self.min_y, self.max_y);
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let vp = Viewport::new(120.0, -40.0, 1.6);
        let (sx, sy) = vp.world_to_screen(300.0, 250.0);
        let (wx, wy) = vp.screen_to_world(sx, sy);
        assert!((wx - 300.0).abs() < 1e-3);
        assert!((wy - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_identity_maps_origin() {
        let vp = Viewport::identity();
        assert_eq!(vp.world_to_screen(0.0, 0.0), (0.0, 0.0));
        assert_eq!(vp.screen_to_world(400.0, 300.0), (400.0, 300.0));
    }

    #[test]
    fn test_scale_clamped_on_construction() {
        assert_eq!(Viewport::new(0.0, 0.0, 100.0).scale, MAX_SCALE);
        assert_eq!(Viewport::new(0.0, 0.0, 0.0001).scale, MIN_SCALE);
        assert_eq!(Viewport::new(0.0, 0.0, f32::NAN).scale, MIN_SCALE);
    }

    #[test]
    fn test_visible_world_rect_at_identity() {
        let vp = Viewport::identity();
        let rect = vp.visible_world_rect(800.0, 600.0, 0.0);
        assert_eq!(rect.min_x, 0.0);
        assert_eq!(rect.max_x, 800.0);
        assert_eq!(rect.max_y, 600.0);
    }

    #[test]
    fn test_margin_grows_with_zoom_out() {
        let near = Viewport::new(0.0, 0.0, 2.0).visible_world_rect(800.0, 600.0, 100.0);
        let far = Viewport::new(0.0, 0.0, 0.5).visible_world_rect(800.0, 600.0, 100.0);
        // 100 screen px of margin covers more world distance when zoomed out.
        assert_eq!(near.min_x, -50.0);
        assert_eq!(far.min_x, -200.0);
    }

    #[test]
    fn test_circle_visibility() {
        let rect = WorldRect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        };
        assert!(rect.intersects_circle(50.0, 50.0, 1.0)); // inside
        assert!(rect.intersects_circle(110.0, 50.0, 15.0)); // overlaps edge
        assert!(!rect.intersects_circle(130.0, 50.0, 15.0)); // clear miss
        assert!(rect.intersects_circle(110.0, 110.0, 20.0)); // corner overlap
        assert!(!rect.intersects_circle(115.0, 115.0, 20.0)); // corner miss
    }

    #[test]
    fn test_sanitized_recovers_nan() {
        let bad = Viewport {
            x: f32::NAN,
            y: 10.0,
            scale: f32::INFINITY,
        };
        let fixed = bad.sanitized(Viewport::identity());
        assert_eq!(fixed.x, 0.0);
        assert_eq!(fixed.y, 10.0);
        assert_eq!(fixed.scale, 1.0);
    }
}
