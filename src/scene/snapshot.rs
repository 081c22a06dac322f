//! Dataset snapshot: clusters, items and their membership index.
//!
//! A snapshot is received wholesale from the clustering collaborator and is
//! immutable until the next one replaces it. Ingestion is tolerant: rows
//! with non-finite coordinates are dropped, items referencing a cluster
//! that is not in the snapshot fall back to unclustered, and the upstream
//! noise label (−1) is normalized to "no cluster". Everything rejected or
//! rewritten is tallied in an [`IngestReport`] for diagnostics.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Cluster label assigned by the upstream HDBSCAN run. Label −1 marks noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub i32);

/// The upstream noise label: items carrying it are unclustered.
pub const NOISE_LABEL: i32 = -1;

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cluster({})", self.0)
    }
}

/// Stable item identifier assigned by the data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item({})", self.0)
    }
}

/// A cluster centroid in world space.
///
/// Field aliases accept the upstream API's names unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterNode {
    pub id: ClusterId,
    pub x: f32,
    pub y: f32,
    #[serde(alias = "image_count")]
    pub member_count: u32,
}

/// An item (image thumbnail) in world space. For clustered items the raw
/// coordinate is informational — the rendered position comes from layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPosition {
    pub id: ItemId,
    pub x: f32,
    pub y: f32,
    #[serde(default, alias = "cluster_label")]
    pub cluster: Option<ClusterId>,
    /// Opaque handle to the thumbnail resource; the engine never
    /// dereferences it.
    #[serde(default, alias = "thumbnail_url")]
    pub thumbnail: String,
}

/// Rows rejected or rewritten during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Items whose cluster label was absent from the cluster set; they were
    /// kept as unclustered.
    pub stale_cluster_refs: usize,
    /// Rows dropped for non-finite coordinates.
    pub dropped_rows: usize,
    /// Cluster rows carrying the noise label; a noise "centroid" is not a
    /// real cluster and is skipped.
    pub noise_cluster_rows: usize,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// The immutable dataset snapshot plus derived indexes.
#[derive(Debug, Default)]
pub struct Snapshot {
    clusters: Vec<ClusterNode>,
    items: Vec<ItemPosition>,
    cluster_index: HashMap<ClusterId, usize>,
    item_index: HashMap<ItemId, usize>,
    /// Item indices per cluster, in item order.
    members: HashMap<ClusterId, Vec<usize>>,
    /// Item indices without a cluster.
    unclustered: Vec<usize>,
    /// World-space bounds over all centroids and item positions.
    bounds: Option<(f32, f32, f32, f32)>,
}

impl Snapshot {
    /// Build a snapshot from upstream rows, normalizing labels and dropping
    /// degenerate geometry.
    pub fn new(clusters: Vec<ClusterNode>, items: Vec<ItemPosition>) -> (Self, IngestReport) {
        let mut report = IngestReport::default();

        let mut kept_clusters = Vec::with_capacity(clusters.len());
        let mut cluster_index = HashMap::with_capacity(clusters.len());
        for cluster in clusters {
            if cluster.id.0 == NOISE_LABEL {
                report.noise_cluster_rows += 1;
                continue;
            }
            if !(cluster.x.is_finite() && cluster.y.is_finite()) {
                report.dropped_rows += 1;
                continue;
            }
            cluster_index.insert(cluster.id, kept_clusters.len());
            kept_clusters.push(cluster);
        }

        let mut kept_items = Vec::with_capacity(items.len());
        let mut item_index = HashMap::with_capacity(items.len());
        let mut members: HashMap<ClusterId, Vec<usize>> = HashMap::new();
        let mut unclustered = Vec::new();
        for mut item in items {
            if !(item.x.is_finite() && item.y.is_finite()) {
                report.dropped_rows += 1;
                continue;
            }
            item.cluster = match item.cluster {
                Some(id) if id.0 == NOISE_LABEL => None,
                Some(id) if !cluster_index.contains_key(&id) => {
                    report.stale_cluster_refs += 1;
                    None
                }
                other => other,
            };
            let index = kept_items.len();
            match item.cluster {
                Some(id) => members.entry(id).or_default().push(index),
                None => unclustered.push(index),
            }
            item_index.insert(item.id, index);
            kept_items.push(item);
        }

        let bounds = compute_bounds(&kept_clusters, &kept_items);

        (
            Self {
                clusters: kept_clusters,
                items: kept_items,
                cluster_index,
                item_index,
                members,
                unclustered,
                bounds,
            },
            report,
        )
    }

    pub fn clusters(&self) -> &[ClusterNode] {
        &self.clusters
    }

    pub fn items(&self) -> &[ItemPosition] {
        &self.items
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterNode> {
        self.cluster_index.get(&id).map(|&i| &self.clusters[i])
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemPosition> {
        self.item_index.get(&id).map(|&i| &self.items[i])
    }

    /// Indices into [`Self::items`] of a cluster's members.
    pub fn members_of(&self, id: ClusterId) -> &[usize] {
        self.members.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices into [`Self::items`] of items without a cluster.
    pub fn unclustered(&self) -> &[usize] {
        &self.unclustered
    }

    /// `(min_x, min_y, max_x, max_y)` over all positions, `None` when empty.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        self.bounds
    }

    /// World-space center of the dataset, origin when empty.
    pub fn center(&self) -> (f32, f32) {
        match self.bounds {
            Some((min_x, min_y, max_x, max_y)) => {
                ((min_x + max_x) * 0.5, (min_y + max_y) * 0.5)
            }
            None => (0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.items.is_empty()
    }
}

fn compute_bounds(
    clusters: &[ClusterNode],
    items: &[ItemPosition],
) -> Option<(f32, f32, f32, f32)> {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let positions = clusters
        .iter()
        .map(|c| (c.x, c.y))
        .chain(items.iter().map(|i| (i.x, i.y)));
    for (x, y) in positions {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    (min_x <= max_x).then_some((min_x, min_y, max_x, max_y))
}
