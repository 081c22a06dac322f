//! Atlas Canvas - WASM Module
//!
//! The viewport and layout engine for the Atlas Canvas image browser. It is
//! compiled to WebAssembly and exposes a JavaScript-friendly API via
//! wasm-bindgen; the host feeds it pointer/wheel input and a clustering
//! snapshot, drives it once per animation frame, and paints the draw list
//! it emits. The engine never touches the DOM and knows nothing about the
//! rendering backend beyond "place sprites at world coordinates".
//!
//! # Architecture
//!
//! - `camera`: viewport pose, zoom/pan/inertia control, focus poses
//! - `layout`: deterministic spiral/ring placement, overlap relaxation
//! - `scene`: dataset snapshot, expansion/filter state, draw-list assembly
//! - `spatial`: R-tree over rendered item positions for hit testing

use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::prelude::*;

pub mod camera;
mod diag;
pub mod layout;
pub mod scene;
pub mod spatial;

use camera::focus::{FOCUS_ANIMATION_MS, FOCUS_SCALE, center_on, fit_points};
use camera::{CameraConfig, CameraController, Viewport};
use scene::{
    ClusterId, ClusterNode, EntityKind, IngestReport, ItemId, ItemPosition, RelaxScope,
    SceneEngine, Snapshot,
};

/// World-unit padding around the fitted bounding box on recenter.
const RECENTER_PADDING: f32 = 100.0;

/// Pointer travel (screen px) beyond which a press is a drag, not a click.
const CLICK_SLOP_PX: f32 = 5.0;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Host-registered callbacks, one typed slot per event.
#[derive(Default)]
struct HostCallbacks {
    item_activated: Option<js_sys::Function>,
}

impl HostCallbacks {
    fn emit_item_activated(&self, id: ItemId) {
        if let Some(callback) = &self.item_activated
            && callback.call1(&JsValue::NULL, &JsValue::from(id.0)).is_err()
        {
            diag::warn("itemActivated callback threw, ignoring");
        }
    }
}

/// A live pointer press, tracked to tell clicks from drags.
#[derive(Clone, Copy)]
struct PointerPress {
    start: (f32, f32),
    moved: bool,
}

/// Main entry point for the canvas engine.
///
/// Wraps the camera controller and scene engine behind the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct AtlasCanvasWasm {
    camera: CameraController,
    scene: SceneEngine,
    callbacks: HostCallbacks,
    press: Option<PointerPress>,
    screen_w: f32,
    screen_h: f32,
}

#[wasm_bindgen]
impl AtlasCanvasWasm {
    /// Create an engine for a viewport of the given pixel size.
    #[wasm_bindgen(constructor)]
    pub fn new(screen_w: f32, screen_h: f32) -> Self {
        Self {
            camera: CameraController::new(CameraConfig::default()),
            scene: SceneEngine::new(),
            callbacks: HostCallbacks::default(),
            press: None,
            screen_w,
            screen_h,
        }
    }

    /// Track a host window resize.
    #[wasm_bindgen(js_name = setViewportSize)]
    pub fn set_viewport_size(&mut self, screen_w: f32, screen_h: f32) {
        self.screen_w = screen_w;
        self.screen_h = screen_h;
    }

    // =========================================================================
    // Snapshot & Filter
    // =========================================================================

    /// Replace the dataset snapshot. `clusters` and `items` are the arrays
    /// from the clustering API response, passed through as JS values.
    #[wasm_bindgen(js_name = loadSnapshot)]
    pub fn load_snapshot(&mut self, clusters: JsValue, items: JsValue) -> Result<(), JsValue> {
        let clusters: Vec<ClusterNode> =
            serde_wasm_bindgen::from_value(clusters).map_err(JsValue::from)?;
        let items: Vec<ItemPosition> =
            serde_wasm_bindgen::from_value(items).map_err(JsValue::from)?;
        self.load_snapshot_rows(clusters, items);
        Ok(())
    }

    /// Install a search-result filter (item ids to highlight); pass `null`
    /// or `undefined` to clear it.
    #[wasm_bindgen(js_name = setSearchFilter)]
    pub fn set_search_filter(&mut self, ids: Option<Vec<u32>>) {
        self.scene
            .set_filter(ids.map(|ids| ids.into_iter().map(ItemId).collect()));
    }

    // =========================================================================
    // Pointer & Wheel Input
    // =========================================================================

    /// Wheel event at a screen point. A negative `delta_y` (wheel up)
    /// zooms in, matching DOM conventions.
    #[wasm_bindgen(js_name = onWheel)]
    pub fn on_wheel(&mut self, sx: f32, sy: f32, delta_y: f32) {
        self.camera.zoom_at(sx, sy, -delta_y);
    }

    /// Pointer press: starts a camera drag and arms click detection.
    #[wasm_bindgen(js_name = onPointerDown)]
    pub fn on_pointer_down(&mut self, sx: f32, sy: f32, now_ms: f64) {
        self.press = Some(PointerPress {
            start: (sx, sy),
            moved: false,
        });
        self.camera.begin_drag(sx, sy, now_ms);
    }

    /// Pointer move while pressed.
    #[wasm_bindgen(js_name = onPointerMove)]
    pub fn on_pointer_move(&mut self, sx: f32, sy: f32, now_ms: f64) {
        if let Some(press) = self.press.as_mut() {
            let dx = sx - press.start.0;
            let dy = sy - press.start.1;
            if (dx * dx + dy * dy).sqrt() > CLICK_SLOP_PX {
                press.moved = true;
            }
        }
        self.camera.continue_drag(sx, sy, now_ms);
    }

    /// Pointer release. Ends the drag (possibly into an inertial coast) and,
    /// for a stationary press, hit-tests the rendered items: the activated
    /// item id is returned as the intent for the caller and also delivered
    /// to the registered callback. Returns `undefined` when nothing was
    /// activated.
    #[wasm_bindgen(js_name = onPointerUp)]
    pub fn on_pointer_up(&mut self, sx: f32, sy: f32) -> Option<u32> {
        self.camera.end_drag();
        let press = self.press.take()?;
        if press.moved {
            return None;
        }
        let (wx, wy) = self.camera.viewport().screen_to_world(sx, sy);
        let hit = self.scene.hit_test(wx, wy)?;
        self.callbacks.emit_item_activated(hit);
        Some(hit.0)
    }

    /// Hover-driven cluster expansion; pass `null` on hover-leave.
    #[wasm_bindgen(js_name = setHoveredCluster)]
    pub fn set_hovered_cluster(&mut self, cluster_label: Option<i32>, now_ms: f64) {
        self.scene
            .set_hovered_cluster(cluster_label.map(ClusterId), now_ms);
    }

    /// Pointer entered a cluster stack: raises it to the top of the z-order.
    #[wasm_bindgen(js_name = pointerEnterCluster)]
    pub fn pointer_enter_cluster(&mut self, cluster_label: i32) {
        self.scene
            .note_pointer_enter(EntityKind::Cluster, cluster_label as u32);
    }

    /// Pointer entered an item sprite: raises it to the top of the z-order.
    #[wasm_bindgen(js_name = pointerEnterItem)]
    pub fn pointer_enter_item(&mut self, item_id: u32) {
        self.scene.note_pointer_enter(EntityKind::Item, item_id);
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// Lock out new pointer-driven camera motion (running motion finishes).
    #[wasm_bindgen(js_name = setLocked)]
    pub fn set_locked(&mut self, locked: bool) {
        self.camera.set_locked(locked);
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self) -> bool {
        self.camera.is_locked()
    }

    /// Toggle explosion mode (overlap relaxation + noise ring).
    #[wasm_bindgen(js_name = setExplosionEnabled)]
    pub fn set_explosion_enabled(&mut self, enabled: bool) {
        self.scene.set_explosion(enabled);
    }

    /// Policy switch: when true, relaxation only runs while a cluster is
    /// expanded.
    #[wasm_bindgen(js_name = setRelaxExpandedOnly)]
    pub fn set_relax_expanded_only(&mut self, expanded_only: bool) {
        self.scene.set_relax_scope(if expanded_only {
            RelaxScope::ExpandedOnly
        } else {
            RelaxScope::AllClusters
        });
    }

    /// Thumbnail load failure reported by the host; the item degrades to a
    /// placeholder tile.
    #[wasm_bindgen(js_name = markThumbnailFailed)]
    pub fn mark_thumbnail_failed(&mut self, item_id: u32) {
        self.scene.mark_thumbnail_failed(ItemId(item_id));
    }

    // =========================================================================
    // Focus & Recenter
    // =========================================================================

    /// Animate the camera to fit every rendered cluster and item position.
    /// Toolbar chrome calls this; a no-op on an empty dataset.
    pub fn recenter(&mut self, now_ms: f64) {
        let targets = self.scene.fit_targets();
        match fit_points(&targets, RECENTER_PADDING, self.screen_w, self.screen_h) {
            Some(pose) => self.camera.animate_to(pose, FOCUS_ANIMATION_MS, now_ms),
            None => diag::warn("recenter requested with no positions, ignoring"),
        }
    }

    /// Animate the camera onto one item at the focus magnification. The
    /// rendered position wins; explicit coordinates (e.g. from a search
    /// payload) are the fallback for items the engine has no position for.
    /// Unknown item with no fallback: reported, no-op.
    #[wasm_bindgen(js_name = focusOnImage)]
    pub fn focus_on_image(&mut self, item_id: u32, x: Option<f32>, y: Option<f32>, now_ms: f64) {
        let target = self
            .scene
            .rendered_item_position(ItemId(item_id))
            .or(match (x, y) {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            });
        match target {
            Some((wx, wy)) => {
                let pose = center_on(wx, wy, FOCUS_SCALE, self.screen_w, self.screen_h);
                self.camera.animate_to(pose, FOCUS_ANIMATION_MS, now_ms);
            }
            None => diag::warn(&format!(
                "focus requested for {} with no known position, ignoring",
                ItemId(item_id)
            )),
        }
    }

    // =========================================================================
    // Frame Loop
    // =========================================================================

    /// Advance camera motion and expansion fades by one frame. Returns true
    /// while something is still animating and the host should schedule
    /// another frame.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        let camera_live = self.camera.advance(now_ms);
        camera_live || self.scene.is_settling(now_ms)
    }

    /// Rebuild the frame's draw list against the current viewport. Returns
    /// the number of draw commands; fetch the buffers with
    /// [`Self::draw_ids_view`] and [`Self::draw_data_view`].
    #[wasm_bindgen(js_name = buildDrawList)]
    pub fn build_draw_list(&mut self, now_ms: f64) -> usize {
        self.scene
            .build_draw_list(self.camera.viewport(), self.screen_w, self.screen_h, now_ms)
            .len()
    }

    /// Zero-copy view of the draw-list entity ids.
    ///
    /// # Safety
    ///
    /// The view is invalidated by any Rust allocation (including the next
    /// `buildDrawList` call). Consume immediately, do not store.
    #[wasm_bindgen(js_name = drawIdsView)]
    pub fn draw_ids_view(&self) -> Uint32Array {
        unsafe { Uint32Array::view(self.scene.draw_list().ids()) }
    }

    /// Zero-copy view of the stride-6 draw data
    /// `[x, y, rotation, opacity, kind, flags]` per command.
    ///
    /// # Safety
    ///
    /// Same lifetime rules as [`Self::draw_ids_view`].
    #[wasm_bindgen(js_name = drawDataView)]
    pub fn draw_data_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.draw_list().data()) }
    }

    // =========================================================================
    // Viewport Introspection
    // =========================================================================

    /// Screen-space x translation of the world origin.
    #[wasm_bindgen(js_name = viewportX)]
    pub fn viewport_x(&self) -> f32 {
        self.camera.viewport().x
    }

    /// Screen-space y translation of the world origin.
    #[wasm_bindgen(js_name = viewportY)]
    pub fn viewport_y(&self) -> f32 {
        self.camera.viewport().y
    }

    /// Current world→screen magnification.
    #[wasm_bindgen(js_name = viewportScale)]
    pub fn viewport_scale(&self) -> f32 {
        self.camera.viewport().scale
    }

    /// True while a coast or camera animation is live.
    #[wasm_bindgen(js_name = isMoving)]
    pub fn is_moving(&self) -> bool {
        self.camera.is_moving()
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Register the item-activated observer invoked on click/tap, in
    /// addition to the id returned from `onPointerUp`.
    #[wasm_bindgen(js_name = registerItemActivated)]
    pub fn register_item_activated(&mut self, callback: js_sys::Function) {
        self.callbacks.item_activated = Some(callback);
    }
}

/// Non-wasm surface: typed entry points shared by the JS wrappers and the
/// native tests.
impl AtlasCanvasWasm {
    /// Replace the snapshot from already-deserialized rows, logging the
    /// ingest report when anything was rejected or rewritten.
    pub fn load_snapshot_rows(
        &mut self,
        clusters: Vec<ClusterNode>,
        items: Vec<ItemPosition>,
    ) -> IngestReport {
        let (snapshot, report) = Snapshot::new(clusters, items);
        if !report.is_clean() {
            diag::warn(&format!(
                "snapshot ingest: {} stale cluster refs, {} dropped rows, {} noise cluster rows",
                report.stale_cluster_refs, report.dropped_rows, report.noise_cluster_rows
            ));
        }
        self.scene.set_snapshot(snapshot);
        report
    }

    /// Direct access to the camera pose (tests, debug overlays).
    pub fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::scene::DRAW_STRIDE;

    fn cluster(id: i32, x: f32, y: f32, member_count: u32) -> ClusterNode {
        ClusterNode {
            id: ClusterId(id),
            x,
            y,
            member_count,
        }
    }

    fn item(id: u32, x: f32, y: f32, cluster: Option<i32>) -> ItemPosition {
        ItemPosition {
            id: ItemId(id),
            x,
            y,
            cluster: cluster.map(ClusterId),
            thumbnail: format!("/thumbnails/{id}.webp"),
        }
    }

    fn engine_with_dataset() -> AtlasCanvasWasm {
        let mut engine = AtlasCanvasWasm::new(800.0, 600.0);
        let report = engine.load_snapshot_rows(
            vec![cluster(0, 200.0, 150.0, 2), cluster(1, 600.0, 450.0, 1)],
            vec![
                item(10, 195.0, 150.0, Some(0)),
                item(11, 205.0, 152.0, Some(0)),
                item(12, 600.0, 450.0, Some(1)),
                item(13, 400.0, 300.0, None),
            ],
        );
        assert!(report.is_clean());
        engine
    }

    /// The reference wheel scenario: deltaY = -100 at (400, 300) on an
    /// 800×600 canvas zooms in and the world point previously under the
    /// cursor still projects to (400, 300).
    #[test]
    fn test_wheel_zoom_keeps_cursor_point_fixed() {
        let mut engine = engine_with_dataset();
        assert_eq!(engine.viewport(), Viewport::identity());

        let (wx, wy) = engine.viewport().screen_to_world(400.0, 300.0);
        engine.on_wheel(400.0, 300.0, -100.0);

        assert!(engine.viewport().scale > 1.0);
        let (sx, sy) = engine.viewport().world_to_screen(wx, wy);
        assert!((sx - 400.0).abs() < 1e-2);
        assert!((sy - 300.0).abs() < 1e-2);
    }

    /// The reference recenter scenario: positions spanning (0,0)-(1000,1000)
    /// with 100 padding on an 800×600 screen settle at scale ≈ 0.48.
    #[test]
    fn test_recenter_fits_reference_bounds() {
        let mut engine = AtlasCanvasWasm::new(800.0, 600.0);
        engine.load_snapshot_rows(
            vec![cluster(0, 0.0, 0.0, 1), cluster(1, 1000.0, 1000.0, 1)],
            vec![
                item(1, 0.0, 0.0, Some(0)),
                item(2, 1000.0, 1000.0, Some(1)),
            ],
        );

        engine.recenter(0.0);
        assert!(engine.advance(10.0));
        // Run the animation to completion.
        engine.advance(FOCUS_ANIMATION_MS + 1.0);
        assert!(!engine.advance(FOCUS_ANIMATION_MS + 2.0));

        let pose = engine.viewport();
        assert!((pose.scale - 0.48).abs() < 1e-2);
        let (sx, sy) = pose.world_to_screen(500.0, 500.0);
        assert!((sx - 400.0).abs() < 1.0);
        assert!((sy - 300.0).abs() < 1.0);
    }

    #[test]
    fn test_draw_pipeline_produces_parallel_buffers() {
        let mut engine = engine_with_dataset();
        let count = engine.build_draw_list(0.0);
        assert_eq!(count, 3); // two stacks + one unclustered item
        let list = engine.scene.draw_list();
        assert_eq!(list.ids().len(), count);
        assert_eq!(list.data().len(), count * DRAW_STRIDE);
    }

    #[test]
    fn test_click_activates_item_drag_does_not() {
        let mut engine = engine_with_dataset();

        // Stationary press on the unclustered item at world (400, 300).
        engine.on_pointer_down(400.0, 300.0, 0.0);
        let activated = engine.on_pointer_up(400.0, 300.0);
        assert_eq!(activated, Some(13));

        // A real drag over the same item pans instead of activating.
        engine.on_pointer_down(400.0, 300.0, 100.0);
        engine.on_pointer_move(480.0, 300.0, 120.0);
        let activated = engine.on_pointer_up(480.0, 300.0);
        assert_eq!(activated, None);
        assert_eq!(engine.viewport().x, 80.0);
    }

    #[test]
    fn test_click_on_empty_space_activates_nothing() {
        let mut engine = engine_with_dataset();
        engine.on_pointer_down(50.0, 550.0, 0.0);
        assert_eq!(engine.on_pointer_up(50.0, 550.0), None);
    }

    #[test]
    fn test_hover_expansion_end_to_end() {
        let mut engine = engine_with_dataset();
        engine.set_hovered_cluster(Some(0), 0.0);
        let count = engine.build_draw_list(1000.0);
        // Cluster 0 expands into its two members: 2 members + 1 stack + 1
        // noise item.
        assert_eq!(count, 4);

        // Clicking an expanded member activates it.
        let (wx, wy) = engine
            .scene
            .rendered_item_position(ItemId(10))
            .expect("member of the expanded cluster has a rendered position");
        let (sx, sy) = engine.viewport().world_to_screen(wx, wy);
        engine.on_pointer_down(sx, sy, 2000.0);
        assert_eq!(engine.on_pointer_up(sx, sy), Some(10));

        engine.set_hovered_cluster(None, 3000.0);
        assert_eq!(engine.build_draw_list(3000.0), 3);
    }

    #[test]
    fn test_focus_on_image_animates_to_rendered_position() {
        let mut engine = engine_with_dataset();
        engine.focus_on_image(12, None, None, 0.0);
        engine.advance(FOCUS_ANIMATION_MS + 1.0);

        let pose = engine.viewport();
        assert!((pose.scale - FOCUS_SCALE).abs() < 1e-3);
        // Item 12 sits in collapsed cluster 1: the focus target is the
        // cluster centroid.
        let (sx, sy) = pose.world_to_screen(600.0, 450.0);
        assert!((sx - 400.0).abs() < 0.5);
        assert!((sy - 300.0).abs() < 0.5);
    }

    #[test]
    fn test_focus_falls_back_to_payload_coordinates() {
        let mut engine = engine_with_dataset();
        // Id 999 is not in the snapshot; the search payload supplies its
        // position.
        engine.focus_on_image(999, Some(123.0), Some(456.0), 0.0);
        engine.advance(FOCUS_ANIMATION_MS + 1.0);
        let (sx, sy) = engine.viewport().world_to_screen(123.0, 456.0);
        assert!((sx - 400.0).abs() < 0.5);
        assert!((sy - 300.0).abs() < 0.5);
    }

    #[test]
    fn test_focus_on_unknown_item_is_noop() {
        let mut engine = engine_with_dataset();
        let before = engine.viewport();
        engine.focus_on_image(999, None, None, 0.0);
        assert!(!engine.advance(10.0));
        assert_eq!(engine.viewport(), before);
    }

    #[test]
    fn test_lock_blocks_input_allows_programmatic_motion() {
        let mut engine = engine_with_dataset();
        engine.set_locked(true);
        assert!(engine.is_locked());

        engine.on_wheel(400.0, 300.0, -100.0);
        engine.on_pointer_down(100.0, 100.0, 0.0);
        engine.on_pointer_move(200.0, 100.0, 16.0);
        engine.on_pointer_up(200.0, 100.0);
        assert_eq!(engine.viewport(), Viewport::identity());

        engine.recenter(0.0);
        assert!(engine.is_moving());
    }

    #[test]
    fn test_search_filter_dims_and_clears() {
        let mut engine = engine_with_dataset();
        engine.set_search_filter(Some(vec![10, 11]));
        engine.build_draw_list(0.0);
        let dimmed: Vec<_> = engine
            .scene
            .draw_list()
            .commands()
            .iter()
            .map(|c| (c.id, c.flags.is_dimmed()))
            .collect();
        // Cluster 0 holds both matches; cluster 1 and the noise item dim.
        assert!(dimmed.contains(&(0, false)));
        assert!(dimmed.contains(&(1, true)));
        assert!(dimmed.contains(&(13, true)));

        engine.set_search_filter(None);
        engine.build_draw_list(0.0);
        assert!(
            engine
                .scene
                .draw_list()
                .commands()
                .iter()
                .all(|c| !c.flags.is_dimmed())
        );
    }

    #[test]
    fn test_ingest_report_surfaces_rejects() {
        let mut engine = AtlasCanvasWasm::new(800.0, 600.0);
        let report = engine.load_snapshot_rows(
            vec![cluster(-1, 0.0, 0.0, 5), cluster(0, 10.0, 10.0, 1)],
            vec![
                item(1, f32::NAN, 0.0, None),
                item(2, 5.0, 5.0, Some(42)),
                item(3, 10.0, 10.0, Some(0)),
            ],
        );
        assert_eq!(report.noise_cluster_rows, 1);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(report.stale_cluster_refs, 1);
        assert_eq!(engine.scene.snapshot().items().len(), 2);
    }
}
