//! Layout algorithms for the cluster canvas.
//!
//! CPU-side, bounded-cost placement passes: deterministic spiral/ring
//! positions for expanded cluster members and unclustered items, and a
//! fixed-iteration overlap relaxation for "explosion" mode. All outputs are
//! world-space target positions; the scene assembler combines them with the
//! current viewport.

pub mod relax;
pub mod spiral;

pub use relax::{RelaxConfig, relax_overlaps};
pub use spiral::{expansion_radius, ring_position, spiral_position};
