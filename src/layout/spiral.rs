//! Deterministic spiral and ring placement.
//!
//! Expanded cluster members are laid out on a sunflower spiral around the
//! cluster centroid: golden-angle increments keep neighbors from aligning,
//! and the sqrt radius profile spreads points evenly instead of clumping at
//! the center or the rim. Unclustered items get a plain evenly-spaced ring.
//! Every function here is pure — the same inputs always reproduce the same
//! layout, so re-expanding a cluster restores the previous arrangement
//! exactly.

use std::f32::consts::{PI, TAU};

/// Golden angle, π(3 − √5) ≈ 2.39996 rad.
pub const GOLDEN_ANGLE: f32 = PI * (3.0 - 2.236_068);

/// Position of member `index` of `total` on a sunflower spiral around
/// `(cx, cy)`, reaching `max_radius` at the last member.
///
/// `total == 0` returns the center; `total == 1` returns the single point
/// `(cx + max_radius, cy)`.
pub fn spiral_position(
    index: usize,
    total: usize,
    cx: f32,
    cy: f32,
    max_radius: f32,
) -> (f32, f32) {
    if total == 0 {
        return (cx, cy);
    }
    let t = (index + 1) as f32 / total as f32;
    let radius = max_radius * t.sqrt();
    let theta = index as f32 * GOLDEN_ANGLE;
    (cx + radius * theta.cos(), cy + radius * theta.sin())
}

/// Position of item `index` of `total` on a circle of `radius` around
/// `(cx, cy)`, evenly spaced by angle. `total == 0` returns the center.
pub fn ring_position(index: usize, total: usize, cx: f32, cy: f32, radius: f32) -> (f32, f32) {
    if total == 0 {
        return (cx, cy);
    }
    let theta = TAU * index as f32 / total as f32;
    (cx + radius * theta.cos(), cy + radius * theta.sin())
}

/// Radius of the disc needed to hold `member_count` thumbnails at `spacing`
/// world units apiece: the area argument `spacing * sqrt(n / π)`, floored at
/// one spacing so tiny clusters still open visibly.
pub fn expansion_radius(member_count: usize, spacing: f32) -> f32 {
    (spacing * (member_count as f32 / PI).sqrt()).max(spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spiral_is_deterministic() {
        for index in 0..64 {
            let a = spiral_position(index, 64, 10.0, -20.0, 300.0);
            let b = spiral_position(index, 64, 10.0, -20.0, 300.0);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_spiral_degenerate_counts() {
        assert_eq!(spiral_position(0, 0, 5.0, 6.0, 100.0), (5.0, 6.0));
        // A lone member sits at max_radius along angle zero.
        let (x, y) = spiral_position(0, 1, 5.0, 6.0, 100.0);
        assert!((x - 105.0).abs() < 1e-4);
        assert!((y - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_spiral_stays_inside_max_radius() {
        let n = 200;
        for index in 0..n {
            let (x, y) = spiral_position(index, n, 0.0, 0.0, 150.0);
            let r = (x * x + y * y).sqrt();
            assert!(r <= 150.0 + 1e-3, "member {index} escaped: r = {r}");
        }
        // The last member reaches the rim.
        let (x, y) = spiral_position(n - 1, n, 0.0, 0.0, 150.0);
        let r = (x * x + y * y).sqrt();
        assert!((r - 150.0).abs() < 1e-2);
    }

    #[test]
    fn test_spiral_neighbors_separated() {
        // Golden-angle placement keeps successive points apart even near
        // the center.
        let n = 100;
        for index in 0..n - 1 {
            let a = spiral_position(index, n, 0.0, 0.0, 200.0);
            let b = spiral_position(index + 1, n, 0.0, 0.0, 200.0);
            let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
            assert!(d > 5.0, "members {index} and {} too close: {d}", index + 1);
        }
    }

    #[test]
    fn test_ring_evenly_spaced() {
        let n = 8;
        let radius = 500.0;
        let mut prev = ring_position(0, n, 0.0, 0.0, radius);
        assert!((prev.0 - 500.0).abs() < 1e-3);
        for index in 1..=n {
            let point = ring_position(index % n, n, 0.0, 0.0, radius);
            let chord = ((point.0 - prev.0).powi(2) + (point.1 - prev.1).powi(2)).sqrt();
            // Chord length of a 45° arc at r=500.
            assert!((chord - 2.0 * radius * (TAU / 16.0).sin()).abs() < 1e-2);
            prev = point;
        }
    }

    #[test]
    fn test_ring_degenerate_count() {
        assert_eq!(ring_position(0, 0, 3.0, 4.0, 100.0), (3.0, 4.0));
    }

    #[test]
    fn test_expansion_radius_scales_with_count() {
        let spacing = 90.0;
        assert_eq!(expansion_radius(0, spacing), spacing);
        assert_eq!(expansion_radius(1, spacing), spacing);
        let small = expansion_radius(10, spacing);
        let large = expansion_radius(40, spacing);
        assert!(large > small);
        // Area law: 4× the members, 2× the radius.
        assert!((large / small - 2.0).abs() < 1e-3);
    }
}
