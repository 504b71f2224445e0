//! Configuration for the simulation.
//!
//! Two kinds of configuration exist:
//!
//! - [`SimulationParams`] is the per-frame snapshot handed to
//!   [`SimulationController::update`](crate::SimulationController::update).
//!   It mirrors the sliders and toggles of a presentation layer plus the
//!   current pointer state, and can be loaded from JSON.
//! - [`SystemConfig`] is fixed at construction: screen size, capacities,
//!   motion limits and tuning constants. Only the screen size changes later,
//!   via [`SimulationController::set_screen_size`](crate::SimulationController::set_screen_size).
//!
//! # Example
//!
//! ```
//! use springle::config::{SimulationParams, SystemConfig};
//!
//! let config = SystemConfig::new(1280, 720)
//!     .with_seed(7)
//!     .with_trail_capacity(20_000);
//!
//! let params = SimulationParams::from_json_str(r#"{ "max_groups": 3 }"#).unwrap();
//! assert_eq!(params.max_groups, 3);
//! assert_eq!(params.base_size, SimulationParams::default().base_size);
//! ```

use std::f32::consts::PI;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-frame parameter snapshot.
///
/// Missing JSON fields take their [`Default`] values. Out-of-range values are
/// corrected by [`validate`](Self::validate) rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Fewest circles a new group may have.
    pub min_circles: u32,
    /// Most circles a new group may have.
    pub max_circles: u32,
    /// Maximum number of simultaneously active groups.
    pub max_groups: usize,

    /// Initial outward speed of autonomous groups (px/s).
    pub radial_velocity: f32,
    /// Initial rotation speed of autonomous groups (rad/s).
    pub angular_velocity: f32,
    /// Radial acceleration applied to autonomous groups (px/s²).
    pub radial_acceleration: f32,
    /// Angular acceleration applied to autonomous groups (rad/s²).
    pub angular_acceleration: f32,

    /// Base circle size in pixels.
    pub base_size: f32,
    /// Seconds a trail point takes to fade out.
    pub fade_duration: f32,
    /// Trail spacing as a fraction of circle size.
    pub space_factor: f32,
    /// Maximum trail opacity (0-255).
    ///
    /// Values below [`TrailConfig::alpha_floor`] turn trails off: every point
    /// is pruned on the first update after it is emitted.
    pub max_alpha: u8,
    /// Palette transitions per second.
    pub color_transition_speed: f32,

    /// Seconds between autonomous spawns.
    pub spawn_cooldown: f32,
    /// Whether autonomous groups spawn on their own.
    pub auto_generate: bool,
    /// Edge sharpness of the gradient circles.
    pub gradient_sharpness: f32,

    /// Whether the pointer button is currently held.
    pub pointer_pressed: bool,
    /// Pointer position in screen coordinates (origin top-left, y down).
    pub pointer_position: Vec2,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            min_circles: 4,
            max_circles: 12,
            max_groups: 7,

            radial_velocity: 100.0,
            angular_velocity: 1.5,
            radial_acceleration: 3.0,
            angular_acceleration: 0.5,

            base_size: 25.0,
            fade_duration: 5.0,
            space_factor: 0.5,
            max_alpha: 200,
            color_transition_speed: 0.2,

            spawn_cooldown: 4.0,
            auto_generate: true,
            gradient_sharpness: 0.2,

            pointer_pressed: false,
            pointer_position: Vec2::ZERO,
        }
    }
}

impl SimulationParams {
    /// Parse parameters from a JSON document, then validate them.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        Ok(params.validate())
    }

    /// Load parameters from a JSON file, then validate them.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Clamp every field into its usable range.
    ///
    /// Non-finite floats fall back to their defaults first. The pointer
    /// position is left alone; the gesture tracker rejects bad positions.
    pub fn validate(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };

        self.min_circles = self.min_circles.clamp(1, 20);
        self.max_circles = self.max_circles.clamp(self.min_circles, 20);
        self.max_groups = self.max_groups.clamp(1, 20);

        self.radial_velocity =
            finite_or(self.radial_velocity, defaults.radial_velocity).clamp(-1000.0, 1000.0);
        self.angular_velocity =
            finite_or(self.angular_velocity, defaults.angular_velocity).clamp(-1000.0, 1000.0);
        self.radial_acceleration = finite_or(self.radial_acceleration, defaults.radial_acceleration)
            .clamp(-200.0, 200.0);
        self.angular_acceleration =
            finite_or(self.angular_acceleration, defaults.angular_acceleration)
                .clamp(-200.0, 200.0);

        self.base_size = finite_or(self.base_size, defaults.base_size).clamp(2.0, 100.0);
        self.fade_duration = finite_or(self.fade_duration, defaults.fade_duration).clamp(1.0, 30.0);
        self.space_factor = finite_or(self.space_factor, defaults.space_factor).clamp(0.0, 1.0);
        self.color_transition_speed =
            finite_or(self.color_transition_speed, defaults.color_transition_speed)
                .clamp(0.0, 1.0);
        self.spawn_cooldown =
            finite_or(self.spawn_cooldown, defaults.spawn_cooldown).clamp(0.5, 10.0);
        self.gradient_sharpness =
            finite_or(self.gradient_sharpness, defaults.gradient_sharpness).clamp(0.1, 10.0);

        self
    }
}

/// Clamp ranges for [`PolarMotion`](crate::PolarMotion).
///
/// Velocity floors keep motion from stalling: a velocity whose magnitude is
/// below its floor snaps to the floor with the same sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionLimits {
    pub min_radius: f32,
    pub max_radius: f32,
    pub max_radial_velocity: f32,
    pub min_radial_speed: f32,
    pub max_angular_velocity: f32,
    pub min_angular_speed: f32,
    pub max_radial_acceleration: f32,
    pub max_angular_acceleration: f32,
    /// Multiplier applied to the radial release velocity.
    pub release_radial_scale: f32,
    /// Multiplier applied to the angular release velocity.
    pub release_angular_scale: f32,
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            min_radius: -4000.0,
            max_radius: 4000.0,
            max_radial_velocity: 1000.0,
            min_radial_speed: 1.0,
            max_angular_velocity: PI * 4.0,
            min_angular_speed: 0.05,
            max_radial_acceleration: 2000.0,
            max_angular_acceleration: PI * 8.0,
            release_radial_scale: 2.0,
            release_angular_scale: 2.0,
        }
    }
}

/// Tuning for [`PointerGestureTracker`](crate::PointerGestureTracker).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Smallest pointer movement (px) recorded as a new sample.
    pub min_position_delta: f32,
    /// Most samples kept in history.
    pub max_history: usize,
    /// Longest span of history kept, in seconds.
    pub max_history_duration: f32,
    /// Segments averaged for the release velocity.
    pub velocity_samples: usize,
    /// Weight of the previous release in the smoothed polar velocity (0-1).
    pub smoothing: f32,
    /// Radial release velocity bound (px/s).
    pub max_radial_velocity: f32,
    /// Angular release velocity bound (rad/s).
    pub max_angular_velocity: f32,
    /// Smallest radius reported for a pointer position.
    pub min_radius: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_position_delta: 1.0,
            max_history: 25,
            max_history_duration: 0.1,
            velocity_samples: 25,
            smoothing: 0.85,
            max_radial_velocity: 1000.0,
            max_angular_velocity: PI * 2.0,
            min_radius: 1.0,
        }
    }
}

/// Tuning for [`TrailStore`](crate::TrailStore) and trail emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Hard limit on stored trail points.
    pub capacity: usize,
    /// Alpha below which a point is dropped. A `max_alpha` under the floor
    /// hides trails entirely.
    pub alpha_floor: u8,
    /// Minimum seconds between emissions, multiplied by the space factor.
    pub min_emit_interval: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            capacity: 50_000,
            alpha_floor: 5,
            min_emit_interval: 0.01,
        }
    }
}

/// Tuning for [`GradientTextureCache`](crate::GradientTextureCache).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Size grid in pixels.
    pub size_step: f32,
    /// Alpha grid.
    pub alpha_step: u8,
    /// Concentric rings per texture.
    pub rings: u32,
    /// Entry count above which the oldest entries are evicted.
    pub max_entries: usize,
    /// Smallest drawn radius in pixels.
    pub min_size: f32,
    /// Largest cached radius in pixels.
    pub max_size: f32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            size_step: 2.0,
            alpha_step: 16,
            rings: 15,
            max_entries: 1000,
            min_size: 4.0,
            max_size: 100.0,
        }
    }
}

/// Screen geometry and the conversion between screen and world space.
///
/// Screen space has its origin at the top-left corner with y pointing down.
/// World space is centered on the screen with y pointing up, which is the
/// convention [`PolarMotion`](crate::PolarMotion) angles use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Screen-space center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let c = self.center();
        Vec2::new(screen.x - c.x, c.y - screen.y)
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let c = self.center();
        Vec2::new(c.x + world.x, c.y - world.y)
    }
}

/// Construction-time configuration for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub viewport: Viewport,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Spawn one autonomous group when the controller is created.
    pub initial_group: bool,
    /// How far past the screen (as a multiple of its larger side) a group may
    /// travel before it is retired.
    pub visibility_margin: f32,
    /// Interpolate palette transitions in Lab instead of RGB.
    pub lab_interpolation: bool,
    pub motion: MotionLimits,
    pub gesture: GestureConfig,
    pub trail: TrailConfig,
    pub gradient: GradientConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl SystemConfig {
    /// Create a configuration for a screen of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            seed: None,
            initial_group: true,
            visibility_margin: 1.1,
            lab_interpolation: true,
            motion: MotionLimits::default(),
            gesture: GestureConfig::default(),
            trail: TrailConfig::default(),
            gradient: GradientConfig::default(),
        }
    }

    /// Seed the simulation RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether to start with one autonomous group.
    pub fn with_initial_group(mut self, enabled: bool) -> Self {
        self.initial_group = enabled;
        self
    }

    /// Replace the whole trail tuning. The capacity is raised to at least 1.
    pub fn with_trail(mut self, trail: TrailConfig) -> Self {
        self.trail = TrailConfig {
            capacity: trail.capacity.max(1),
            ..trail
        };
        self
    }

    /// Set the trail store capacity.
    pub fn with_trail_capacity(mut self, capacity: usize) -> Self {
        self.trail.capacity = capacity.max(1);
        self
    }

    /// Set the visibility margin (values below 1.0 are raised to 1.0).
    pub fn with_visibility_margin(mut self, margin: f32) -> Self {
        self.visibility_margin = if margin.is_finite() { margin.max(1.0) } else { 1.1 };
        self
    }

    /// Choose Lab (`true`) or RGB (`false`) palette interpolation.
    pub fn with_lab_interpolation(mut self, enabled: bool) -> Self {
        self.lab_interpolation = enabled;
        self
    }

    pub fn with_motion_limits(mut self, limits: MotionLimits) -> Self {
        self.motion = limits;
        self
    }

    pub fn with_gesture(mut self, gesture: GestureConfig) -> Self {
        self.gesture = gesture;
        self
    }

    pub fn with_gradient(mut self, gradient: GradientConfig) -> Self {
        self.gradient = gradient;
        self
    }

    /// Radius past which a group is no longer visible.
    pub fn visibility_radius(&self) -> f32 {
        self.viewport.width.max(self.viewport.height) as f32 * self.visibility_margin
    }
}
