//! Scene model and per-frame assembly.
//!
//! This module owns the dataset snapshot received from the clustering
//! collaborator, the interaction state layered on top of it (expansion,
//! explosion, search filter, recency), and the draw-list assembly that
//! feeds the render target.

pub mod draw;
pub mod engine;
pub mod snapshot;

pub use draw::{DRAW_STRIDE, DrawCommand, DrawFlags, DrawList, EntityKind};
pub use engine::{ExpansionConfig, RelaxScope, SceneEngine};
pub use snapshot::{ClusterId, ClusterNode, IngestReport, ItemId, ItemPosition, Snapshot};
