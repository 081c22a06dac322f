//! Scene engine: expansion, explosion and per-frame draw-list assembly.
//!
//! Combines the dataset snapshot with interaction state — the single
//! expanded cluster, explosion-mode relaxation, the search-result filter,
//! pointer-enter recency — culls against the current viewport and emits the
//! ordered draw list consumed by the render target. Layout passes are
//! bounded (fixed relaxation iterations, one spiral per expanded member),
//! so per-frame work scales with the visible subset, not the dataset.

use std::collections::{HashMap, HashSet};

use crate::camera::motion::ease_out_cubic;
use crate::camera::viewport::{CULL_MARGIN_PX, Viewport};
use crate::diag;
use crate::layout::{RelaxConfig, expansion_radius, relax_overlaps, ring_position, spiral_position};
use crate::scene::draw::{DrawCommand, DrawFlags, DrawList, EntityKind, sprite_rotation};
use crate::scene::snapshot::{ClusterId, ItemId, Snapshot};
use crate::spatial::PositionIndex;

/// Below this viewport scale the render target paints cheap tiles instead
/// of decoding thumbnails.
pub const LOD_SCALE_THRESHOLD: f32 = 0.45;

/// World-space radius of a collapsed cluster stack sprite, for culling and
/// hit margins.
pub const CLUSTER_SPRITE_RADIUS: f32 = 80.0;

/// World-space radius of a single thumbnail sprite.
pub const ITEM_SPRITE_RADIUS: f32 = 64.0;

/// Radius of the ring unclustered items are placed on in explosion mode.
pub const NOISE_RING_RADIUS: f32 = 1200.0;

/// Which nodes participate in explosion-mode relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelaxScope {
    /// Relax every cluster centroid whenever explosion mode is on
    /// (reference behavior).
    #[default]
    AllClusters,
    /// Relax only while a cluster is expanded, so centroids make room for
    /// the expansion and otherwise stay at their dataset positions.
    ExpandedOnly,
}

/// Cluster expansion tunables.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionConfig {
    /// World units of spiral footprint per member thumbnail.
    pub spacing: f32,
    /// Fade-in duration for expanded members, in milliseconds.
    pub grow_ms: f64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            spacing: 90.0,
            grow_ms: 250.0,
        }
    }
}

/// The one live expansion (hover keeps at most one cluster open).
#[derive(Debug, Clone, Copy)]
struct Expansion {
    cluster: ClusterId,
    started_ms: f64,
}

/// Scene state and per-frame assembly.
pub struct SceneEngine {
    snapshot: Snapshot,
    cluster_ordinals: HashMap<ClusterId, usize>,
    expansion: Option<Expansion>,
    explosion: bool,
    relax_scope: RelaxScope,
    relax_config: RelaxConfig,
    expansion_config: ExpansionConfig,
    /// Rendered centroid per cluster, parallel to `snapshot.clusters()`.
    cluster_positions: Vec<(f32, f32)>,
    /// Rendered position per unclustered item, parallel to
    /// `snapshot.unclustered()`.
    noise_positions: Vec<(f32, f32)>,
    filter: Option<HashSet<ItemId>>,
    failed_thumbnails: HashSet<ItemId>,
    recency: HashMap<(EntityKind, u32), u64>,
    recency_clock: u64,
    index: PositionIndex,
    index_dirty: bool,
    staging: Vec<(u64, DrawCommand)>,
    draw: DrawList,
}

impl SceneEngine {
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot::default(),
            cluster_ordinals: HashMap::new(),
            expansion: None,
            explosion: false,
            relax_scope: RelaxScope::default(),
            relax_config: RelaxConfig::default(),
            expansion_config: ExpansionConfig::default(),
            cluster_positions: Vec::new(),
            noise_positions: Vec::new(),
            filter: None,
            failed_thumbnails: HashSet::new(),
            recency: HashMap::new(),
            recency_clock: 0,
            index: PositionIndex::new(),
            index_dirty: true,
            staging: Vec::new(),
            draw: DrawList::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replace the dataset wholesale. All per-dataset interaction state
    /// (expansion, filter, recency, failure marks) is reset with it.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.cluster_ordinals = snapshot
            .clusters()
            .iter()
            .enumerate()
            .map(|(ordinal, cluster)| (cluster.id, ordinal))
            .collect();
        self.snapshot = snapshot;
        self.expansion = None;
        self.filter = None;
        self.failed_thumbnails.clear();
        self.recency.clear();
        self.recency_clock = 0;
        self.refresh_layout();
    }

    /// Toggle explosion-mode relaxation.
    pub fn set_explosion(&mut self, enabled: bool) {
        if self.explosion != enabled {
            self.explosion = enabled;
            self.refresh_layout();
        }
    }

    pub fn explosion(&self) -> bool {
        self.explosion
    }

    pub fn set_relax_scope(&mut self, scope: RelaxScope) {
        if self.relax_scope != scope {
            self.relax_scope = scope;
            self.refresh_layout();
        }
    }

    /// Hover-driven expansion: hovering cluster B while A is open closes A;
    /// leaving all clusters closes everything. Hovering an id the snapshot
    /// does not know is reported and ignored.
    pub fn set_hovered_cluster(&mut self, cluster: Option<ClusterId>, now_ms: f64) {
        let next = match cluster {
            Some(id) => {
                if !self.cluster_ordinals.contains_key(&id) {
                    diag::warn(&format!("hover on unknown {id}"));
                    return;
                }
                match self.expansion {
                    // Re-hovering the open cluster keeps its fade clock.
                    Some(open) if open.cluster == id => Some(open),
                    _ => Some(Expansion {
                        cluster: id,
                        started_ms: now_ms,
                    }),
                }
            }
            None => None,
        };
        let changed = match (self.expansion, next) {
            (Some(a), Some(b)) => a.cluster != b.cluster,
            (None, None) => false,
            _ => true,
        };
        self.expansion = next;
        if changed {
            self.index_dirty = true;
            if self.relax_scope == RelaxScope::ExpandedOnly {
                self.refresh_layout();
            }
        }
    }

    pub fn expanded_cluster(&self) -> Option<ClusterId> {
        self.expansion.map(|e| e.cluster)
    }

    /// Install or clear the search-result filter. `Some` dims everything
    /// outside the set, `None` clears dimming.
    pub fn set_filter(&mut self, filter: Option<HashSet<ItemId>>) {
        self.filter = filter;
    }

    /// Host-reported thumbnail load failure: the item is painted as a
    /// placeholder tile from now on. Never fatal.
    pub fn mark_thumbnail_failed(&mut self, id: ItemId) {
        diag::warn(&format!("thumbnail failed for {id}, using placeholder"));
        self.failed_thumbnails.insert(id);
    }

    /// Pointer-enter recency: the most recently entered entity draws on
    /// top.
    pub fn note_pointer_enter(&mut self, kind: EntityKind, raw_id: u32) {
        self.recency_clock += 1;
        self.recency.insert((kind, raw_id), self.recency_clock);
    }

    /// True while an expansion fade is still progressing and the host
    /// should keep scheduling frames.
    pub fn is_settling(&self, now_ms: f64) -> bool {
        self.expansion
            .is_some_and(|e| now_ms - e.started_ms < self.expansion_config.grow_ms)
    }

    /// Recompute rendered centroid and noise positions from the snapshot
    /// and the explosion/relaxation state.
    fn refresh_layout(&mut self) {
        self.cluster_positions = self
            .snapshot
            .clusters()
            .iter()
            .map(|c| (c.x, c.y))
            .collect();

        let relax_active = self.explosion
            && match self.relax_scope {
                RelaxScope::AllClusters => true,
                RelaxScope::ExpandedOnly => self.expansion.is_some(),
            };
        if relax_active {
            relax_overlaps(&mut self.cluster_positions, &self.relax_config);
        }

        let center = self.snapshot.center();
        let total = self.snapshot.unclustered().len();
        self.noise_positions = self
            .snapshot
            .unclustered()
            .iter()
            .enumerate()
            .map(|(slot, &item_idx)| {
                if self.explosion {
                    ring_position(slot, total, center.0, center.1, NOISE_RING_RADIUS)
                } else {
                    let item = &self.snapshot.items()[item_idx];
                    (item.x, item.y)
                }
            })
            .collect();

        self.index_dirty = true;
    }

    /// The world position `id` is currently rendered at: its spiral slot if
    /// its cluster is expanded, its ring/raw position if unclustered, and
    /// the cluster's rendered centroid while collapsed (the stack is the
    /// only on-screen coordinate the item has).
    pub fn rendered_item_position(&self, id: ItemId) -> Option<(f32, f32)> {
        let item = self.snapshot.item(id)?;
        match item.cluster {
            None => {
                let slot = self
                    .snapshot
                    .unclustered()
                    .iter()
                    .position(|&idx| self.snapshot.items()[idx].id == id)?;
                Some(self.noise_positions[slot])
            }
            Some(cluster_id) => {
                let ordinal = *self.cluster_ordinals.get(&cluster_id)?;
                let (cx, cy) = self.cluster_positions[ordinal];
                if self.expanded_cluster() == Some(cluster_id) {
                    let members = self.snapshot.members_of(cluster_id);
                    let slot = members
                        .iter()
                        .position(|&idx| self.snapshot.items()[idx].id == id)?;
                    let radius = expansion_radius(members.len(), self.expansion_config.spacing);
                    Some(spiral_position(slot, members.len(), cx, cy, radius))
                } else {
                    Some((cx, cy))
                }
            }
        }
    }

    /// World points recenter-all should fit: every rendered centroid plus
    /// every individually rendered item.
    pub fn fit_targets(&self) -> Vec<(f32, f32)> {
        let mut points = self.cluster_positions.clone();
        points.extend_from_slice(&self.noise_positions);
        points
    }

    /// The item under a world point, within one sprite radius. Only
    /// individually rendered items (expanded members, unclustered) are hit;
    /// a collapsed stack is not a random member.
    pub fn hit_test(&mut self, world_x: f32, world_y: f32) -> Option<ItemId> {
        self.ensure_index();
        self.index
            .nearest_within(world_x, world_y, ITEM_SPRITE_RADIUS)
    }

    fn ensure_index(&mut self) {
        if !self.index_dirty {
            return;
        }
        let mut points = Vec::new();
        if let Some(expansion) = self.expansion {
            if let Some(&ordinal) = self.cluster_ordinals.get(&expansion.cluster) {
                let (cx, cy) = self.cluster_positions[ordinal];
                let members = self.snapshot.members_of(expansion.cluster);
                let radius = expansion_radius(members.len(), self.expansion_config.spacing);
                for (slot, &item_idx) in members.iter().enumerate() {
                    let (x, y) = spiral_position(slot, members.len(), cx, cy, radius);
                    points.push((self.snapshot.items()[item_idx].id, x, y));
                }
            }
        }
        for (slot, &item_idx) in self.snapshot.unclustered().iter().enumerate() {
            let (x, y) = self.noise_positions[slot];
            points.push((self.snapshot.items()[item_idx].id, x, y));
        }
        self.index.rebuild(&points);
        self.index_dirty = false;
    }

    /// Assemble the frame's draw list: resolve layout, cull, dim, order by
    /// pointer recency.
    pub fn build_draw_list(
        &mut self,
        viewport: Viewport,
        screen_w: f32,
        screen_h: f32,
        now_ms: f64,
    ) -> &DrawList {
        let rect = viewport.visible_world_rect(screen_w, screen_h, CULL_MARGIN_PX);
        let low_detail = viewport.scale < LOD_SCALE_THRESHOLD;
        let mut staging = std::mem::take(&mut self.staging);
        staging.clear();

        for (ordinal, cluster) in self.snapshot.clusters().iter().enumerate() {
            let (cx, cy) = self.cluster_positions[ordinal];

            if let Some(expansion) = self.expansion.filter(|e| e.cluster == cluster.id) {
                let members = self.snapshot.members_of(cluster.id);
                let radius = expansion_radius(members.len(), self.expansion_config.spacing);
                if !rect.intersects_circle(cx, cy, radius + ITEM_SPRITE_RADIUS) {
                    continue;
                }
                let progress =
                    ((now_ms - expansion.started_ms) / self.expansion_config.grow_ms).clamp(0.0, 1.0);
                let opacity = ease_out_cubic(progress as f32);
                for (slot, &item_idx) in members.iter().enumerate() {
                    let (x, y) = spiral_position(slot, members.len(), cx, cy, radius);
                    if !rect.intersects_circle(x, y, ITEM_SPRITE_RADIUS) {
                        continue;
                    }
                    let item = &self.snapshot.items()[item_idx];
                    let command = self.item_command(item.id, x, y, opacity, low_detail);
                    staging.push((self.recency_of(EntityKind::Item, item.id.0), command));
                }
                continue;
            }

            if !rect.intersects_circle(cx, cy, CLUSTER_SPRITE_RADIUS) {
                continue;
            }
            let raw_id = cluster.id.0 as u32;
            let mut flags = DrawFlags::new();
            flags.set_dimmed(self.cluster_dimmed(cluster.id));
            flags.set_low_detail(low_detail);
            staging.push((
                self.recency_of(EntityKind::Cluster, raw_id),
                DrawCommand {
                    kind: EntityKind::Cluster,
                    id: raw_id,
                    x: cx,
                    y: cy,
                    rotation: sprite_rotation(raw_id),
                    opacity: 1.0,
                    flags,
                },
            ));
        }

        for (slot, &item_idx) in self.snapshot.unclustered().iter().enumerate() {
            let (x, y) = self.noise_positions[slot];
            if !rect.intersects_circle(x, y, ITEM_SPRITE_RADIUS) {
                continue;
            }
            let item = &self.snapshot.items()[item_idx];
            let command = self.item_command(item.id, x, y, 1.0, low_detail);
            staging.push((self.recency_of(EntityKind::Item, item.id.0), command));
        }

        // Stable by recency stamp: untouched entities keep snapshot order,
        // the most recently entered draws last (on top).
        staging.sort_by_key(|&(stamp, _)| stamp);
        self.draw.clear();
        for &(_, command) in &staging {
            self.draw.push(command);
        }
        self.staging = staging;
        &self.draw
    }

    fn item_command(
        &self,
        id: ItemId,
        x: f32,
        y: f32,
        opacity: f32,
        low_detail: bool,
    ) -> DrawCommand {
        let mut flags = DrawFlags::new();
        flags.set_dimmed(
            self.filter
                .as_ref()
                .is_some_and(|filter| !filter.contains(&id)),
        );
        flags.set_low_detail(low_detail);
        flags.set_placeholder(self.failed_thumbnails.contains(&id));
        DrawCommand {
            kind: EntityKind::Item,
            id: id.0,
            x,
            y,
            rotation: sprite_rotation(id.0),
            opacity,
            flags,
        }
    }

    /// A cluster is dimmed when a filter is active and none of its members
    /// are in the result set.
    fn cluster_dimmed(&self, id: ClusterId) -> bool {
        let Some(filter) = self.filter.as_ref() else {
            return false;
        };
        !self
            .snapshot
            .members_of(id)
            .iter()
            .any(|&idx| filter.contains(&self.snapshot.items()[idx].id))
    }

    fn recency_of(&self, kind: EntityKind, raw_id: u32) -> u64 {
        self.recency.get(&(kind, raw_id)).copied().unwrap_or(0)
    }

    /// The draw list produced by the last [`Self::build_draw_list`] call.
    pub fn draw_list(&self) -> &DrawList {
        &self.draw
    }
}

impl Default for SceneEngine {
    fn default() -> Self {
        Self::new()
    }
}
