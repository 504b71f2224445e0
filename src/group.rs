//! Orbit groups: cohorts of circles sharing a palette and a lifecycle.
//!
//! A group is created with a random number of points spread evenly around
//! a common radius. Each group draws one set of [`Variation`] multipliers at
//! construction and applies them to every point, so its points move together
//! while different groups look different.
//!
//! Groups start out active and become inactive exactly once, when their
//! leading point travels past the visibility radius. The controller then
//! drops the group; its trail points stay in the
//! [`TrailStore`](crate::TrailStore) until they fade.

use std::f32::consts::TAU;

use glam::Vec2;
use log::debug;
use rand::Rng;
use rand_distr::{Beta, Distribution, Triangular};
use serde::Serialize;

use crate::color::Rgb;
use crate::config::{MotionLimits, SimulationParams, SystemConfig, Viewport};
use crate::palette::{ColorPaletteTable, COLORS_PER_PALETTE};
use crate::polar::{PolarMotion, ReleaseVelocity};
use crate::trail::TrailStore;

const MIN_VELOCITY_VARIATION: f32 = 0.5;
const MAX_VELOCITY_VARIATION: f32 = 10.0;
const MIN_ACCELERATION_VARIATION: f32 = -1.0;
const MAX_ACCELERATION_VARIATION: f32 = 1.0;
const MIN_SIZE_VARIATION: f32 = 0.8;
const MAX_SIZE_VARIATION: f32 = 1.2;

/// Unique, monotonically increasing group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct GroupId(pub u64);

/// Who drives a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GroupKind {
    /// Spawned by the controller; moves on its own.
    #[default]
    Autonomous,
    /// Created by a pointer press; follows the pointer until released.
    PointerControlled,
}

/// Per-group multipliers applied to every point's dynamics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variation {
    pub radial_velocity: f32,
    pub angular_velocity: f32,
    pub radial_acceleration: f32,
    pub angular_acceleration: f32,
}

impl Variation {
    /// Unit velocity response and no acceleration response: the group keeps
    /// whatever velocity it is released with.
    pub const COAST: Self = Self {
        radial_velocity: 1.0,
        angular_velocity: 1.0,
        radial_acceleration: 0.0,
        angular_acceleration: 0.0,
    };

    /// Draw multipliers for a group of the given kind.
    ///
    /// Autonomous groups use triangular distributions, so moderate values are
    /// common and extremes rare. The angular direction is a coin flip.
    pub fn sample<R: Rng + ?Sized>(kind: GroupKind, rng: &mut R) -> Self {
        match kind {
            GroupKind::PointerControlled => Self::COAST,
            GroupKind::Autonomous => {
                let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                Self {
                    radial_velocity: triangular(
                        rng,
                        MIN_VELOCITY_VARIATION,
                        MAX_VELOCITY_VARIATION,
                    ),
                    angular_velocity: triangular(
                        rng,
                        MIN_VELOCITY_VARIATION,
                        MAX_VELOCITY_VARIATION,
                    ) * direction,
                    radial_acceleration: triangular(
                        rng,
                        MIN_ACCELERATION_VARIATION,
                        MAX_ACCELERATION_VARIATION,
                    ),
                    angular_acceleration: triangular(
                        rng,
                        MIN_ACCELERATION_VARIATION,
                        MAX_ACCELERATION_VARIATION,
                    ),
                }
            }
        }
    }
}

/// Symmetric triangular sample on `[min, max]`.
fn triangular<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    let mode = (min + max) / 2.0;
    Triangular::new(min, max, mode)
        .map(|d| d.sample(rng))
        .unwrap_or(mode)
}

/// Size multiplier drawn from Beta(2, 2), which favors the middle of the
/// range.
fn size_variation<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let unit = Beta::new(2.0f32, 2.0)
        .map(|d| d.sample(rng))
        .unwrap_or(0.5);
    MIN_SIZE_VARIATION + unit * (MAX_SIZE_VARIATION - MIN_SIZE_VARIATION)
}

/// Circle size for a point at `radius`.
///
/// Grows logarithmically with distance from the center; the log factor is
/// replaced by 1 at or inside the center.
#[inline]
pub fn circle_size(base_size: f32, size_variation: f32, radius: f32) -> f32 {
    let factor = if radius > 0.0 {
        (radius + 1.0).ln() / 5.0
    } else {
        1.0
    };
    (base_size * size_variation * factor).max(0.0)
}

/// Parameters for constructing an [`OrbitGroup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSpawn {
    pub min_circles: u32,
    pub max_circles: u32,
    pub radius: f32,
    pub base_size: f32,
    pub radial_velocity: f32,
    pub angular_velocity: f32,
    pub radial_acceleration: f32,
    pub angular_acceleration: f32,
    pub limits: MotionLimits,
    pub visibility_margin: f32,
}

impl GroupSpawn {
    /// Spawn parameters from the current frame's parameters, starting at the
    /// center.
    pub fn from_params(params: &SimulationParams, config: &SystemConfig) -> Self {
        Self {
            min_circles: params.min_circles,
            max_circles: params.max_circles,
            radius: 0.0,
            base_size: params.base_size,
            radial_velocity: params.radial_velocity,
            angular_velocity: params.angular_velocity,
            radial_acceleration: params.radial_acceleration,
            angular_acceleration: params.angular_acceleration,
            limits: config.motion,
            visibility_margin: config.visibility_margin,
        }
    }
}

/// One circle within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitPoint {
    pub motion: PolarMotion,
    pub color_index: usize,
    pub time_offset: f32,
    pub size_variation: f32,
    pub base_size: f32,
    pub active: bool,
    /// Screen position of the last emitted trail point.
    pub last_trail_pos: Option<Vec2>,
}

impl OrbitPoint {
    #[inline]
    pub fn size(&self) -> f32 {
        circle_size(self.base_size, self.size_variation, self.motion.radius())
    }

    /// World position (y up, origin at the screen center).
    #[inline]
    pub fn world_position(&self) -> Vec2 {
        self.motion.to_cartesian(Vec2::ZERO)
    }
}

/// Per-frame inputs to [`OrbitGroup::group_update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub dt: f32,
    /// Current simulation time.
    pub now: f64,
    pub space_factor: f32,
    pub max_alpha: u8,
    pub viewport: Viewport,
    /// Base interval between emissions, scaled by `space_factor`.
    pub min_emit_interval: f32,
}

/// A cohort of orbiting circles.
#[derive(Debug, Clone)]
pub struct OrbitGroup {
    id: GroupId,
    kind: GroupKind,
    points: Vec<OrbitPoint>,
    palette_index: usize,
    color_transition: f32,
    active: bool,
    creation_time: f64,
    variation: Variation,
    visibility_margin: f32,
    last_trail_time: Option<f64>,
}

impl OrbitGroup {
    /// Build a group, correcting out-of-range spawn parameters.
    pub fn new<R: Rng + ?Sized>(
        id: GroupId,
        kind: GroupKind,
        spawn: GroupSpawn,
        now: f64,
        palette_count: usize,
        rng: &mut R,
    ) -> Self {
        let min_circles = spawn.min_circles.max(1);
        let max_circles = spawn.max_circles.max(min_circles);
        let base_size = if spawn.base_size.is_finite() && spawn.base_size > 0.0 {
            spawn.base_size
        } else {
            1.0
        };
        let radius = if spawn.radius.is_finite() {
            spawn.radius.max(0.0)
        } else {
            0.0
        };

        let variation = Variation::sample(kind, rng);
        let size_variation = size_variation(rng);
        let time_offset = match kind {
            GroupKind::Autonomous => rng.gen_range(0.0..10.0),
            GroupKind::PointerControlled => 0.0,
        };

        let count = rng.gen_range(min_circles..=max_circles) as usize;
        let step = TAU / count as f32;
        let points = (0..count)
            .map(|i| {
                let motion = match kind {
                    GroupKind::Autonomous => PolarMotion::new(
                        radius,
                        step * i as f32,
                        spawn.radial_velocity * variation.radial_velocity,
                        spawn.angular_velocity * variation.angular_velocity,
                        spawn.radial_acceleration * variation.radial_acceleration,
                        spawn.angular_acceleration * variation.angular_acceleration,
                        spawn.limits,
                    ),
                    GroupKind::PointerControlled => {
                        PolarMotion::at(radius, step * i as f32, spawn.limits)
                    }
                };
                OrbitPoint {
                    motion,
                    color_index: i % COLORS_PER_PALETTE,
                    time_offset,
                    size_variation,
                    base_size,
                    active: true,
                    last_trail_pos: None,
                }
            })
            .collect();

        let palette_index = rng.gen_range(0..palette_count.max(1));
        debug!(
            "group {:?} ({:?}) created with {} circles, palette {}",
            id, kind, count, palette_index
        );

        Self {
            id,
            kind,
            points,
            palette_index,
            color_transition: 0.0,
            active: true,
            creation_time: now,
            variation,
            visibility_margin: spawn.visibility_margin.max(1.0),
            last_trail_time: None,
        }
    }

    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    #[inline]
    pub fn is_pointer_controlled(&self) -> bool {
        self.kind == GroupKind::PointerControlled
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn creation_time(&self) -> f64 {
        self.creation_time
    }

    #[inline]
    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    #[inline]
    pub fn color_transition(&self) -> f32 {
        self.color_transition
    }

    #[inline]
    pub fn variation(&self) -> &Variation {
        &self.variation
    }

    #[inline]
    pub fn points(&self) -> &[OrbitPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Push the current acceleration and size sliders into every point.
    ///
    /// Accelerations go through the group's variation, so pointer groups keep
    /// coasting. Non-positive sizes are ignored.
    pub fn apply_parameters(&mut self, radial_accel: f32, angular_accel: f32, base_size: f32) {
        let ar = radial_accel * self.variation.radial_acceleration;
        let at = angular_accel * self.variation.angular_acceleration;
        let size_ok = base_size.is_finite() && base_size > 0.0;
        for point in &mut self.points {
            point.motion.set_radial_acceleration(ar);
            point.motion.set_angular_acceleration(at);
            if size_ok {
                point.base_size = base_size;
            }
        }
    }

    /// Advance the palette transition, stepping to the next palette each time
    /// it wraps past 1.
    pub fn advance_color(&mut self, dt: f32, speed: f32, palette_count: usize) {
        let step = dt * speed;
        if !step.is_finite() || step <= 0.0 {
            return;
        }
        let t = self.color_transition + step;
        let wraps = t.floor();
        self.color_transition = t - wraps;
        if wraps >= 1.0 {
            self.palette_index = (self.palette_index + wraps as usize) % palette_count.max(1);
        }
    }

    /// Integrate every point's motion without emitting trails.
    pub fn update_circle_positions(&mut self, dt: f32) {
        let drifts = self.kind == GroupKind::Autonomous;
        for point in &mut self.points {
            point.motion.update(dt);
            if drifts {
                point.time_offset += dt;
            }
        }
    }

    /// Integrate motion and emit trail points.
    ///
    /// Emission is gated twice: the group emits at most once per
    /// `min_emit_interval * space_factor` seconds, and each point only if it
    /// moved at least `size * space_factor` pixels since its last trail point.
    pub fn group_update(
        &mut self,
        frame: &FrameContext,
        palettes: &mut ColorPaletteTable,
        trails: &mut TrailStore,
    ) {
        self.update_circle_positions(frame.dt);

        let interval = frame.min_emit_interval as f64 * frame.space_factor as f64;
        let due = self
            .last_trail_time
            .map_or(true, |t| frame.now - t >= interval);
        if !due {
            return;
        }

        for point in &mut self.points {
            let screen = frame.viewport.world_to_screen(point.world_position());
            let size = point.size();
            if let Some(last) = point.last_trail_pos {
                if screen.distance(last) < size * frame.space_factor {
                    continue;
                }
            }
            let color =
                palettes.get_color(self.palette_index, point.color_index, self.color_transition);
            trails.add_point(screen, color, size, frame.max_alpha, self.id, frame.now);
            point.last_trail_pos = Some(screen);
        }
        self.last_trail_time = Some(frame.now);
    }

    /// Whether the leading point is still within the visibility radius.
    pub fn is_circle_visible(&self, viewport: &Viewport) -> bool {
        let limit = viewport.width.max(viewport.height) as f32 * self.visibility_margin;
        self.points
            .first()
            .is_some_and(|p| p.motion.radius().abs() <= limit)
    }

    /// Retire the group once it leaves the visibility radius.
    ///
    /// Returns `true` on the frame the group becomes inactive. An inactive
    /// group never becomes active again.
    pub fn refresh_visibility(&mut self, viewport: &Viewport) -> bool {
        if !self.active || self.is_circle_visible(viewport) {
            return false;
        }
        self.active = false;
        for point in &mut self.points {
            point.active = false;
        }
        debug!("group {:?} left the screen", self.id);
        true
    }

    /// Hand a release velocity to every point.
    ///
    /// `pointer` and `center` are world positions.
    pub fn handle_mouse_release(&mut self, pointer: Vec2, velocity: ReleaseVelocity, center: Vec2) {
        if !pointer.is_finite() {
            return;
        }
        for point in &mut self.points {
            point.motion.set_velocity_from_release(velocity, center, pointer);
        }
    }

    /// Pin the group to `pos` (world space): every point moves to the same
    /// radius, spread evenly by angle, with all dynamics reset.
    pub fn set_group_position(&mut self, pos: Vec2, center: Vec2) {
        if !pos.is_finite() || self.points.is_empty() {
            return;
        }
        let rel = pos - center;
        let base_radius = rel.length();
        let base_angle = rel.y.atan2(rel.x);
        let step = TAU / self.points.len() as f32;
        for (i, point) in self.points.iter_mut().enumerate() {
            point.motion.reposition(base_radius, base_angle + step * i as f32);
        }
    }

    /// Screen position, size and color of each point, in order.
    pub fn circles<'a>(
        &'a self,
        viewport: &'a Viewport,
        palettes: &'a mut ColorPaletteTable,
    ) -> impl Iterator<Item = (Vec2, f32, Rgb)> + 'a {
        let (palette, transition) = (self.palette_index, self.color_transition);
        self.points.iter().map(move |p| {
            (
                viewport.world_to_screen(p.world_position()),
                p.size(),
                palettes.get_color(palette, p.color_index, transition),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrailConfig;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn() -> GroupSpawn {
        GroupSpawn::from_params(&SimulationParams::default(), &SystemConfig::new(800, 600))
    }

    fn group(kind: GroupKind, seed: u64) -> OrbitGroup {
        let mut rng = StdRng::seed_from_u64(seed);
        OrbitGroup::new(GroupId(1), kind, spawn(), 0.0, 25, &mut rng)
    }

    #[test]
    fn test_point_count_within_bounds() {
        for seed in 0..30 {
            let g = group(GroupKind::Autonomous, seed);
            assert!(g.len() >= 4 && g.len() <= 12);
        }
    }

    #[test]
    fn test_bad_spawn_parameters_corrected() {
        let mut rng = StdRng::seed_from_u64(3);
        let bad = GroupSpawn {
            min_circles: 0,
            max_circles: 0,
            radius: -50.0,
            base_size: -2.0,
            ..spawn()
        };
        let g = OrbitGroup::new(GroupId(7), GroupKind::Autonomous, bad, 0.0, 25, &mut rng);
        assert_eq!(g.len(), 1);
        assert_eq!(g.points()[0].base_size, 1.0);
        assert_eq!(g.points()[0].motion.radius(), 0.0);
    }

    #[test]
    fn test_variation_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut saw_negative = false;
        for _ in 0..200 {
            let v = Variation::sample(GroupKind::Autonomous, &mut rng);
            assert!(v.radial_velocity >= 0.5 && v.radial_velocity <= 10.0);
            assert!(v.angular_velocity.abs() >= 0.5 && v.angular_velocity.abs() <= 10.0);
            assert!(v.radial_acceleration.abs() <= 1.0);
            assert!(v.angular_acceleration.abs() <= 1.0);
            saw_negative |= v.angular_velocity < 0.0;
        }
        assert!(saw_negative);
        assert_eq!(
            Variation::sample(GroupKind::PointerControlled, &mut rng),
            Variation::COAST
        );
    }

    #[test]
    fn test_size_variation_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let s = size_variation(&mut rng);
            assert!((0.8..=1.2).contains(&s));
        }
    }

    #[test]
    fn test_circle_size_model() {
        assert_eq!(circle_size(25.0, 1.0, 0.0), 25.0);
        assert_eq!(circle_size(25.0, 1.0, -10.0), 25.0);
        assert_relative_eq!(circle_size(25.0, 1.0, 99.0), 25.0 * 100f32.ln() / 5.0);
    }

    #[test]
    fn test_pointer_group_starts_at_rest_and_coasts() {
        let mut g = group(GroupKind::PointerControlled, 9);
        let limits = MotionLimits::default();
        for p in g.points() {
            assert_eq!(p.motion.radial_velocity(), limits.min_radial_speed);
            assert_eq!(p.motion.radial_acceleration(), 0.0);
        }
        g.apply_parameters(150.0, 3.0, 30.0);
        for p in g.points() {
            assert_eq!(p.motion.radial_acceleration(), 0.0);
            assert_eq!(p.motion.angular_acceleration(), 0.0);
            assert_eq!(p.base_size, 30.0);
        }
        g.update_circle_positions(1.0);
        assert!(g.points().iter().all(|p| p.time_offset == 0.0));
    }

    #[test]
    fn test_advance_color_wraps() {
        let mut g = group(GroupKind::Autonomous, 1);
        let start = g.palette_index();
        g.advance_color(4.0, 0.2, 25);
        assert_relative_eq!(g.color_transition(), 0.8, epsilon = 1e-5);
        assert_eq!(g.palette_index(), start);
        g.advance_color(1.5, 0.2, 25);
        assert_relative_eq!(g.color_transition(), 0.1, epsilon = 1e-4);
        assert_eq!(g.palette_index(), (start + 1) % 25);
    }

    #[test]
    fn test_visibility_latches_once() {
        let mut g = group(GroupKind::PointerControlled, 2);
        let vp = Viewport::new(800, 600);
        // Limit is 800 * 1.1 = 880
        let mut transitions = 0;
        for r in (0..2000).step_by(50) {
            g.set_group_position(Vec2::new(r as f32, 0.0), Vec2::ZERO);
            if g.refresh_visibility(&vp) {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert!(!g.is_active());

        // Back inside the radius: still retired
        g.set_group_position(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert!(g.is_circle_visible(&vp));
        assert!(!g.refresh_visibility(&vp));
        assert!(!g.is_active());
    }

    #[test]
    fn test_set_group_position_spreads_points() {
        let mut g = group(GroupKind::PointerControlled, 4);
        g.set_group_position(Vec2::new(0.0, 100.0), Vec2::ZERO);
        let step = TAU / g.len() as f32;
        for (i, p) in g.points().iter().enumerate() {
            assert_relative_eq!(p.motion.radius(), 100.0, epsilon = 1e-3);
            let expected = crate::polar::normalize_angle(std::f32::consts::FRAC_PI_2 + step * i as f32);
            assert_relative_eq!(p.motion.theta(), expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_release_moves_group() {
        let mut g = group(GroupKind::PointerControlled, 6);
        g.set_group_position(Vec2::new(200.0, 0.0), Vec2::ZERO);
        g.handle_mouse_release(
            Vec2::new(200.0, 0.0),
            ReleaseVelocity::Cartesian(Vec2::new(100.0, 0.0)),
            Vec2::ZERO,
        );
        for p in g.points() {
            assert_relative_eq!(p.motion.radial_velocity(), 200.0, epsilon = 1e-3);
        }
        g.update_circle_positions(1.0);
        assert_relative_eq!(g.points()[0].motion.radius(), 400.0, epsilon = 1e-2);
    }

    #[test]
    fn test_group_update_emits_gated_trails() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut palettes = ColorPaletteTable::builtin();
        let mut trails = TrailStore::new(TrailConfig::default(), 5.0);
        let mut g = OrbitGroup::new(
            GroupId(3),
            GroupKind::PointerControlled,
            GroupSpawn {
                min_circles: 4,
                max_circles: 4,
                ..spawn()
            },
            0.0,
            palettes.num_palettes(),
            &mut rng,
        );
        let mut frame = FrameContext {
            dt: 1.0 / 60.0,
            now: 0.0,
            space_factor: 0.5,
            max_alpha: 200,
            viewport: Viewport::new(800, 600),
            min_emit_interval: 0.01,
        };

        // First frame always emits one point per circle
        g.group_update(&frame, &mut palettes, &mut trails);
        assert_eq!(trails.len(), 4);

        // Barely moving: the distance gate holds emission back
        frame.now += 1.0 / 60.0;
        g.group_update(&frame, &mut palettes, &mut trails);
        assert_eq!(trails.len(), 4);

        // Jump far away: every circle emits again, in screen coordinates
        g.set_group_position(Vec2::new(0.0, 200.0), Vec2::ZERO);
        frame.now += 1.0 / 60.0;
        g.group_update(&frame, &mut palettes, &mut trails);
        assert_eq!(trails.len(), 8);
        let newest = trails.get_drawable_elements()[4];
        assert_relative_eq!(newest.position.x, 400.0, epsilon = 1.0);
        assert_relative_eq!(newest.position.y, 100.0, epsilon = 1.0);
        assert_eq!(newest.group_id, GroupId(3));
    }
}
