//! Spatial indexing over rendered item positions.
//!
//! An R-tree rebuilt after layout changes, answering pointer hit tests in
//! O(log n). Per-frame culling does not go through this index — visibility
//! is a constant-time circle/rect test per candidate.

mod rtree;

pub use rtree::PositionIndex;
