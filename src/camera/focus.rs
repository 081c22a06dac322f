//! Focus and recenter pose computation.
//!
//! Produces target poses — fit a point set with padding, or center on one
//! item at a fixed magnification — and leaves applying them to the camera
//! controller's animator. Degenerate inputs are epsilon-guarded so no NaN
//! can be handed to the viewport.

use super::viewport::{Viewport, clamp_scale};

/// Recenter never zooms in past 2×, however small the fitted box is.
pub const RECENTER_MAX_SCALE: f32 = 2.0;

/// Magnification used when snapping to a single item.
pub const FOCUS_SCALE: f32 = 1.2;

/// Duration of focus/recenter camera animations, in milliseconds.
pub const FOCUS_ANIMATION_MS: f64 = 600.0;

/// Breathing-room factor applied to the fitted scale so the box does not
/// touch the frame edges.
const FIT_SCALE_MARGIN: f32 = 0.96;

/// Smallest box dimension considered non-degenerate, in world units.
const MIN_BOX_EXTENT: f32 = 1e-3;

/// Compute the pose that fits `points`, inflated by `padding` world units on
/// all sides, inside a `screen_w` × `screen_h` frame. The fitted scale is
/// clamped to the viewport bounds and capped at [`RECENTER_MAX_SCALE`]; the
/// box center lands at the screen center. Returns `None` for an empty point
/// set.
pub fn fit_points(
    points: &[(f32, f32)],
    padding: f32,
    screen_w: f32,
    screen_h: f32,
) -> Option<Viewport> {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for &(x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if min_x > max_x {
        return None;
    }

    let width = (max_x - min_x + 2.0 * padding).max(MIN_BOX_EXTENT);
    let height = (max_y - min_y + 2.0 * padding).max(MIN_BOX_EXTENT);
    let fitted = (screen_w / width).min(screen_h / height) * FIT_SCALE_MARGIN;
    let scale = clamp_scale(fitted).min(RECENTER_MAX_SCALE);

    let center_x = (min_x + max_x) * 0.5;
    let center_y = (min_y + max_y) * 0.5;
    Some(center_on(center_x, center_y, scale, screen_w, screen_h))
}

/// The pose that places world point `(wx, wy)` at the screen center under
/// `scale`.
pub fn center_on(wx: f32, wy: f32, scale: f32, screen_w: f32, screen_h: f32) -> Viewport {
    let scale = clamp_scale(scale);
    Viewport {
        x: screen_w * 0.5 - wx * scale,
        y: screen_h * 0.5 - wy * scale,
        scale,
    }
}
