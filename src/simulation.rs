//! The simulation controller.
//!
//! [`SimulationController`] owns every group, the trail store, the palette
//! table, the gradient cache and the gesture tracker. A presentation layer
//! drives it with two calls per frame:
//!
//! ```
//! use springle::config::{SimulationParams, SystemConfig};
//! use springle::{CpuCanvas, Rgb, SimulationController};
//!
//! let mut sim = SimulationController::new(SystemConfig::new(320, 240).with_seed(1));
//! let mut canvas = CpuCanvas::new(320, 240, Rgb::BLACK);
//! let params = SimulationParams::default();
//!
//! for _ in 0..30 {
//!     sim.update(1.0 / 60.0, &params);
//!     sim.draw(&mut canvas, params.gradient_sharpness);
//! }
//! assert_eq!(sim.stats().frame, 30);
//! ```
//!
//! # Frame sequence
//!
//! 1. Advance the clock. While paused nothing else happens.
//! 2. Pointer step: a press starts a drag and spawns a pointer-controlled
//!    group; holding moves that group with the pointer; releasing throws it
//!    with the tracker's release velocity.
//! 3. Every active group takes the current sliders, advances its color
//!    transition, integrates, emits trail points and re-checks visibility.
//!    Retired groups are dropped at the end of the step.
//! 4. The trail store ages and prunes its points.
//! 5. The spawn cooldown counts down; at zero, with auto-generation on and
//!    room under `max_groups`, an autonomous group spawns.

use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::color::ColorSpace;
use crate::config::{SimulationParams, SystemConfig, Viewport};
use crate::group::{FrameContext, GroupId, GroupKind, GroupSpawn, OrbitGroup};
use crate::input::PointerGestureTracker;
use crate::palette::ColorPaletteTable;
use crate::render::{DrawElement, ElementKind, RenderTarget};
use crate::textures::{GradientCacheStats, GradientTextureCache};
use crate::time::Clock;
use crate::trail::{TrailStats, TrailStore};

/// Snapshot of the controller for overlays and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStats {
    pub frame: u64,
    pub elapsed: f64,
    pub fps: f32,
    pub paused: bool,
    pub groups: usize,
    pub active_groups: usize,
    pub max_groups: usize,
    pub groups_spawned: u64,
    pub groups_retired: u64,
    pub spawn_cooldown: f32,
    pub dragging: bool,
    pub trails: TrailStats,
    pub gradients: GradientCacheStats,
    pub cached_colors: usize,
}

/// Owns and advances the whole simulation.
pub struct SimulationController {
    config: SystemConfig,
    params: SimulationParams,
    groups: Vec<OrbitGroup>,
    trails: TrailStore,
    palettes: ColorPaletteTable,
    gradients: GradientTextureCache,
    tracker: PointerGestureTracker,
    clock: Clock,
    rng: StdRng,
    next_group_id: u64,
    max_groups: usize,
    spawn_cooldown_start: f32,
    spawn_cooldown_current: f32,
    /// Group owned by the drag in progress.
    pointer_group: Option<GroupId>,
    groups_spawned: u64,
    groups_retired: u64,
}

impl SimulationController {
    /// Create a controller with default parameters.
    pub fn new(config: SystemConfig) -> Self {
        Self::with_params(config, &SimulationParams::default())
    }

    /// Create a controller whose initial state (and initial group, if
    /// enabled) follows `params`.
    pub fn with_params(config: SystemConfig, params: &SimulationParams) -> Self {
        let params = params.clone().validate();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let space = if config.lab_interpolation {
            ColorSpace::Lab
        } else {
            ColorSpace::Rgb
        };

        let mut sim = Self {
            trails: TrailStore::new(config.trail, params.fade_duration),
            palettes: ColorPaletteTable::builtin().with_color_space(space),
            gradients: GradientTextureCache::new(config.gradient),
            tracker: PointerGestureTracker::new(config.gesture, config.viewport.center()),
            clock: Clock::new(),
            rng,
            groups: Vec::new(),
            next_group_id: 0,
            max_groups: params.max_groups,
            spawn_cooldown_start: params.spawn_cooldown,
            spawn_cooldown_current: params.spawn_cooldown,
            pointer_group: None,
            groups_spawned: 0,
            groups_retired: 0,
            params,
            config,
        };

        if sim.config.initial_group {
            let params = sim.params.clone();
            sim.spawn_group(GroupKind::Autonomous, &params);
        }
        info!(
            "simulation created: {}x{}, {} palettes",
            sim.config.viewport.width,
            sim.config.viewport.height,
            sim.palettes.num_palettes()
        );
        sim
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    pub fn groups(&self) -> &[OrbitGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&OrbitGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn active_group_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_active()).count()
    }

    pub fn trails(&self) -> &TrailStore {
        &self.trails
    }

    pub fn palettes(&self) -> &ColorPaletteTable {
        &self.palettes
    }

    pub fn tracker(&self) -> &PointerGestureTracker {
        &self.tracker
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Mutable clock access for time scale and fixed-step control.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    pub fn spawn_cooldown_start(&self) -> f32 {
        self.spawn_cooldown_start
    }

    pub fn spawn_cooldown_current(&self) -> f32 {
        self.spawn_cooldown_current
    }

    /// The group owned by the drag in progress.
    pub fn pointer_group(&self) -> Option<GroupId> {
        self.pointer_group
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `params` is validated first. A change of `params.max_groups` is
    /// applied through [`set_max_groups`](Self::set_max_groups).
    pub fn update(&mut self, dt: f32, params: &SimulationParams) {
        let dt = self.clock.advance(dt);
        if self.clock.is_paused() {
            return;
        }
        let now = self.clock.elapsed();
        let params = params.clone().validate();

        self.trails.set_fade_duration(params.fade_duration);
        if params.max_groups != self.max_groups {
            self.set_max_groups(params.max_groups);
        }
        if params.spawn_cooldown != self.spawn_cooldown_start {
            self.spawn_cooldown_start = params.spawn_cooldown;
            self.spawn_cooldown_current = self.spawn_cooldown_current.min(params.spawn_cooldown);
        }

        self.pointer_step(&params, dt);

        let viewport = self.config.viewport;
        let frame = FrameContext {
            dt,
            now,
            space_factor: params.space_factor,
            max_alpha: params.max_alpha,
            viewport,
            min_emit_interval: self.config.trail.min_emit_interval,
        };
        let palette_count = self.palettes.num_palettes();
        for group in &mut self.groups {
            if !group.is_active() {
                continue;
            }
            group.apply_parameters(
                params.radial_acceleration,
                params.angular_acceleration,
                params.base_size,
            );
            group.advance_color(dt, params.color_transition_speed, palette_count);
            group.group_update(&frame, &mut self.palettes, &mut self.trails);
            if group.refresh_visibility(&viewport) {
                self.groups_retired += 1;
            }
        }
        self.remove_inactive();

        self.trails.update(dt, now, params.max_alpha);
        self.spawn_step(dt, &params);
        self.params = params;
    }

    fn pointer_step(&mut self, params: &SimulationParams, dt: f32) {
        let screen = params.pointer_position;
        let world = self.config.viewport.screen_to_world(screen);

        match (params.pointer_pressed, self.tracker.is_dragging()) {
            (true, false) => {
                if let Err(e) = self.tracker.start_drag(screen) {
                    debug!("pointer press ignored: {}", e);
                    return;
                }
                let id = self.spawn_group(GroupKind::PointerControlled, params);
                if let Some(group) = self.group_mut(id) {
                    group.set_group_position(world, Vec2::ZERO);
                }
                self.pointer_group = Some(id);
            }
            (true, true) => {
                if let Err(e) = self.tracker.update_drag(screen, dt) {
                    debug!("drag sample skipped: {}", e);
                    return;
                }
                if let Some(id) = self.pointer_group {
                    if let Some(group) = self.group_mut(id) {
                        group.set_group_position(world, Vec2::ZERO);
                    }
                }
            }
            (false, true) => {
                let release = self.tracker.end_drag();
                if let Some(id) = self.pointer_group.take() {
                    if let Some(group) = self.group_mut(id) {
                        group.handle_mouse_release(world, release, Vec2::ZERO);
                    }
                }
            }
            (false, false) => {}
        }
    }

    fn spawn_step(&mut self, dt: f32, params: &SimulationParams) {
        self.spawn_cooldown_current = (self.spawn_cooldown_current - dt).max(0.0);
        if self.spawn_cooldown_current <= 0.0
            && params.auto_generate
            && self.active_group_count() < self.max_groups
        {
            self.spawn_group(GroupKind::Autonomous, params);
            self.spawn_cooldown_current = self.spawn_cooldown_start;
        }
    }

    fn spawn_group(&mut self, kind: GroupKind, params: &SimulationParams) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        let spawn = GroupSpawn::from_params(params, &self.config);
        let group = OrbitGroup::new(
            id,
            kind,
            spawn,
            self.clock.elapsed(),
            self.palettes.num_palettes(),
            &mut self.rng,
        );
        self.groups.push(group);
        self.groups_spawned += 1;
        id
    }

    fn group_mut(&mut self, id: GroupId) -> Option<&mut OrbitGroup> {
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    fn remove_inactive(&mut self) {
        self.groups.retain(|g| g.is_active());
        if let Some(id) = self.pointer_group {
            if !self.groups.iter().any(|g| g.id() == id) {
                self.pointer_group = None;
            }
        }
    }

    /// Spawn an autonomous group now, using the latest parameters.
    ///
    /// Does not touch the spawn cooldown and ignores `max_groups`.
    pub fn create_new_group(&mut self) -> GroupId {
        let params = self.params.clone();
        let id = self.spawn_group(GroupKind::Autonomous, &params);
        info!("group {:?} created on request", id);
        id
    }

    /// Change the group ceiling, removing the oldest active groups (by
    /// creation time, then id) if there are too many.
    pub fn set_max_groups(&mut self, max_groups: usize) {
        let max_groups = max_groups.max(1);
        self.max_groups = max_groups;
        self.params.max_groups = max_groups;

        let mut active: Vec<(f64, GroupId)> = self
            .groups
            .iter()
            .filter(|g| g.is_active())
            .map(|g| (g.creation_time(), g.id()))
            .collect();
        if active.len() <= max_groups {
            return;
        }

        active.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let excess = active.len() - max_groups;
        let doomed: Vec<GroupId> = active.iter().take(excess).map(|&(_, id)| id).collect();
        self.groups.retain(|g| !doomed.contains(&g.id()));
        self.groups_retired += excess as u64;
        if self.pointer_group.is_some_and(|id| doomed.contains(&id)) {
            self.pointer_group = None;
        }
        info!("max groups set to {}, removed {} groups", max_groups, excess);
    }

    /// Remove every trail point. Groups are unaffected.
    pub fn clear_trails(&mut self) {
        self.trails.clear_all();
        info!("trails cleared");
    }

    /// Remove every group and, with them, every trail point.
    pub fn clear_groups(&mut self) {
        self.groups_retired += self.groups.len() as u64;
        self.groups.clear();
        self.pointer_group = None;
        self.trails.clear_all();
        info!("groups cleared");
    }

    /// Resize the screen. Existing trail points keep their screen positions.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.config.viewport = Viewport::new(width, height);
        self.tracker.set_screen_center(self.config.viewport.center());
        debug!("screen resized to {}x{}", width, height);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Everything to draw this frame, oldest group first.
    ///
    /// Within a group, trail points (oldest first) come before the circles.
    /// Circles entirely off screen are skipped. Sizes are raised to the
    /// gradient cache's minimum.
    pub fn drawable_elements(&mut self) -> Vec<DrawElement> {
        let min_size = self.config.gradient.min_size;
        let viewport = self.config.viewport;
        let screen = viewport.size();

        let mut elements: Vec<DrawElement> = self
            .trails
            .iter()
            .map(|p| DrawElement {
                position: p.position,
                size: p.size.max(min_size),
                color: p.color,
                alpha: p.alpha,
                kind: ElementKind::Trail,
                group_id: p.group_id,
            })
            .collect();

        for group in self.groups.iter().filter(|g| g.is_active()) {
            let id = group.id();
            for (position, size, color) in group.circles(&viewport, &mut self.palettes) {
                let size = size.max(min_size);
                let off_screen = position.x + size < 0.0
                    || position.y + size < 0.0
                    || position.x - size > screen.x
                    || position.y - size > screen.y;
                if off_screen {
                    continue;
                }
                elements.push(DrawElement {
                    position,
                    size,
                    color,
                    alpha: 255,
                    kind: ElementKind::Circle,
                    group_id: id,
                });
            }
        }

        // Stable: keeps trail age order and circle order within each group
        elements.sort_by_key(|e| (e.group_id, e.kind == ElementKind::Circle));
        elements
    }

    /// Draw the frame onto `target` and return what was drawn.
    ///
    /// Textures the gradient cache evicts are reported through
    /// [`RenderTarget::release_texture`].
    pub fn draw<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        gradient_sharpness: f32,
    ) -> Vec<DrawElement> {
        let elements = self.drawable_elements();

        target.begin_frame();
        for element in &elements {
            let texture = self.gradients.get_or_create(
                element.size,
                element.color,
                element.alpha,
                gradient_sharpness,
            );
            target.draw_element(element, texture);
        }
        target.end_frame();

        for id in self.gradients.drain_evicted() {
            target.release_texture(id);
        }
        elements
    }

    /// Drop every cached gradient texture, reporting them to `target`.
    pub fn release_textures<T: RenderTarget + ?Sized>(&mut self, target: &mut T) {
        self.gradients.clear();
        for id in self.gradients.drain_evicted() {
            target.release_texture(id);
        }
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            frame: self.clock.frame(),
            elapsed: self.clock.elapsed(),
            fps: self.clock.fps(),
            paused: self.clock.is_paused(),
            groups: self.groups.len(),
            active_groups: self.active_group_count(),
            max_groups: self.max_groups,
            groups_spawned: self.groups_spawned,
            groups_retired: self.groups_retired,
            spawn_cooldown: self.spawn_cooldown_current,
            dragging: self.tracker.is_dragging(),
            trails: self.trails.stats(),
            gradients: self.gradients.stats(),
            cached_colors: self.palettes.cached_colors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::InstanceBatch;

    const DT: f32 = 1.0 / 60.0;

    fn quiet_params() -> SimulationParams {
        SimulationParams {
            auto_generate: false,
            ..Default::default()
        }
    }

    fn controller() -> SimulationController {
        SimulationController::with_params(
            SystemConfig::new(800, 600).with_seed(21),
            &quiet_params(),
        )
    }

    #[test]
    fn test_initial_group() {
        let sim = controller();
        assert_eq!(sim.groups().len(), 1);
        assert_eq!(sim.groups()[0].kind(), GroupKind::Autonomous);

        let empty = SimulationController::new(
            SystemConfig::new(800, 600).with_seed(1).with_initial_group(false),
        );
        assert!(empty.groups().is_empty());
    }

    #[test]
    fn test_press_drag_release_owns_one_group() {
        let mut sim = controller();
        let mut params = quiet_params();

        params.pointer_pressed = true;
        params.pointer_position = Vec2::new(500.0, 300.0);
        sim.update(DT, &params);
        let id = sim.pointer_group().expect("press spawns a group");
        assert_eq!(sim.groups().len(), 2);
        assert!(sim.group(id).unwrap().is_pointer_controlled());

        // Follow the pointer: 100 px right of center, then 150
        params.pointer_position = Vec2::new(550.0, 300.0);
        sim.update(DT, &params);
        let g = sim.group(id).unwrap();
        assert!((g.points()[0].motion.radius() - 150.0).abs() < 1.0);

        params.pointer_pressed = false;
        sim.update(DT, &params);
        assert_eq!(sim.pointer_group(), None);
        assert!(!sim.tracker().is_dragging());
        // Thrown outward
        let g = sim.group(id).unwrap();
        assert!(g.points()[0].motion.radial_velocity() > 1.0);
        assert_eq!(sim.groups().len(), 2);
    }

    #[test]
    fn test_invalid_press_is_ignored() {
        let mut sim = controller();
        let params = SimulationParams {
            pointer_pressed: true,
            pointer_position: Vec2::new(f32::NAN, 10.0),
            ..quiet_params()
        };
        sim.update(DT, &params);
        assert_eq!(sim.groups().len(), 1);
        assert_eq!(sim.pointer_group(), None);
        assert!(!sim.tracker().is_dragging());

        // A valid press on the next frame works normally
        let params = SimulationParams {
            pointer_position: Vec2::new(10.0, 10.0),
            ..params
        };
        sim.update(DT, &params);
        assert_eq!(sim.groups().len(), 2);
    }

    #[test]
    fn test_set_max_groups_removes_oldest() {
        let mut sim = controller();
        for _ in 0..4 {
            sim.update(DT, &quiet_params());
            sim.create_new_group();
        }
        assert_eq!(sim.active_group_count(), 5);
        let ids: Vec<GroupId> = sim.groups().iter().map(|g| g.id()).collect();

        sim.set_max_groups(2);
        assert_eq!(sim.active_group_count(), 2);
        let left: Vec<GroupId> = sim.groups().iter().map(|g| g.id()).collect();
        assert_eq!(left, ids[3..].to_vec());
    }

    #[test]
    fn test_max_groups_param_applies() {
        let mut sim = controller();
        for _ in 0..3 {
            sim.create_new_group();
        }
        let params = SimulationParams {
            max_groups: 2,
            ..quiet_params()
        };
        sim.update(DT, &params);
        assert_eq!(sim.max_groups(), 2);
        assert_eq!(sim.active_group_count(), 2);
    }

    #[test]
    fn test_clear_groups_clears_trails() {
        let mut sim = controller();
        for _ in 0..10 {
            sim.update(DT, &quiet_params());
        }
        assert!(!sim.trails().is_empty());
        sim.clear_groups();
        assert!(sim.groups().is_empty());
        assert!(sim.trails().is_empty());
    }

    #[test]
    fn test_clear_trails_keeps_groups() {
        let mut sim = controller();
        for _ in 0..10 {
            sim.update(DT, &quiet_params());
        }
        sim.clear_trails();
        assert!(sim.trails().is_empty());
        assert_eq!(sim.groups().len(), 1);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut sim = controller();
        sim.update(DT, &quiet_params());
        let before = sim.stats();
        sim.pause();
        for _ in 0..10 {
            sim.update(DT, &quiet_params());
        }
        let after = sim.stats();
        assert_eq!(before.frame, after.frame);
        assert_eq!(before.elapsed, after.elapsed);
        assert_eq!(before.trails.total_added, after.trails.total_added);
        sim.toggle_pause();
        sim.update(DT, &quiet_params());
        assert_eq!(sim.stats().frame, before.frame + 1);
    }

    #[test]
    fn test_draw_orders_by_group_then_kind() {
        let mut sim = controller();
        for _ in 0..30 {
            sim.update(DT, &quiet_params());
        }
        sim.create_new_group();
        for _ in 0..30 {
            sim.update(DT, &quiet_params());
        }

        let mut batch = InstanceBatch::new();
        let elements = sim.draw(&mut batch, 0.2);
        assert_eq!(batch.instances.len(), elements.len());
        assert!(!elements.is_empty());

        for pair in elements.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.group_id <= b.group_id);
            if a.group_id == b.group_id {
                assert!(!(a.kind == ElementKind::Circle && b.kind == ElementKind::Trail));
            }
        }
        assert!(elements.iter().all(|e| e.size >= 4.0));
    }

    #[test]
    fn test_screen_resize_moves_center() {
        let mut sim = controller();
        sim.set_screen_size(1000, 1000);
        assert_eq!(sim.viewport().center(), Vec2::new(500.0, 500.0));
    }
}
