//! # Springle
//!
//! Groups of soft circles orbiting the center of the screen, leaving fading
//! trails and cycling through color palettes. A pointer press grabs a new
//! group, dragging moves it, and releasing throws it with the velocity of
//! the gesture.
//!
//! The crate is the simulation and rendering core. Windowing and widgets
//! live in whatever presentation layer drives it through a small per-frame
//! contract: [`SimulationController::update`] then
//! [`SimulationController::draw`].
//!
//! ## Quick Start
//!
//! ```
//! use springle::prelude::*;
//!
//! let mut sim = SimulationController::new(SystemConfig::new(640, 480).with_seed(42));
//! let mut canvas = CpuCanvas::new(640, 480, Rgb::BLACK);
//! let mut params = SimulationParams::default();
//!
//! // Press at the right of the center, drag up, release
//! params.pointer_pressed = true;
//! params.pointer_position = Vec2::new(420.0, 240.0);
//! for _ in 0..10 {
//!     params.pointer_position.y -= 8.0;
//!     sim.update(1.0 / 60.0, &params);
//! }
//! params.pointer_pressed = false;
//! sim.update(1.0 / 60.0, &params);
//!
//! let drawn = sim.draw(&mut canvas, params.gradient_sharpness);
//! assert!(!drawn.is_empty());
//! ```
//!
//! ## Core Concepts
//!
//! ### Motion
//!
//! Every circle moves in polar coordinates around the screen center
//! ([`PolarMotion`]): radius and angle, each with a velocity and an
//! acceleration, integrated with the midpoint rule and clamped to
//! [`MotionLimits`](config::MotionLimits).
//!
//! ### Groups
//!
//! An [`OrbitGroup`] is a ring of circles sharing one palette and one set of
//! random [`Variation`] multipliers. Autonomous groups spawn on a cooldown;
//! pointer-controlled groups are created by a press. A group retires once it
//! drifts far enough off screen.
//!
//! ### Trails
//!
//! Trail points live in a central [`TrailStore`], not in the groups, so a
//! retired group's trail keeps fading on its own. Alpha follows a cubic
//! ease-out over the fade duration.
//!
//! ### Rendering
//!
//! Elements are soft discs painted from a [`GradientTextureCache`] and handed
//! to a [`RenderTarget`]. [`CpuCanvas`] composites in software;
//! [`InstanceBatch`] produces [`GpuInstance`] data for a GPU backend.
//!
//! ## Coordinates
//!
//! Screen space has its origin at the top-left with y down; pointer positions
//! and trail points use it. World space is centered with y up; motion and
//! release velocities use it. [`Viewport`](config::Viewport) converts.

pub mod color;
pub mod config;
pub mod error;
pub mod group;
pub mod input;
pub mod palette;
pub mod polar;
pub mod render;
mod simulation;
pub mod textures;
pub mod time;
pub mod trail;

pub use glam::Vec2;

pub use color::{ColorSpace, Lab, Rgb};
pub use config::{SimulationParams, SystemConfig};
pub use error::{ConfigError, GestureError, PaletteError};
pub use group::{GroupId, GroupKind, OrbitGroup, Variation};
pub use input::{DragState, PointerGestureTracker};
pub use palette::ColorPaletteTable;
pub use polar::{PolarMotion, PolarVelocity, ReleaseVelocity};
pub use render::{CpuCanvas, DrawElement, ElementKind, GpuInstance, InstanceBatch, RenderTarget};
pub use simulation::{SimulationController, SimulationStats};
pub use textures::{GradientTexture, GradientTextureCache, TextureId};
pub use time::Clock;
pub use trail::{TrailPoint, TrailStore};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```
/// use springle::prelude::*;
/// ```
///
/// This imports:
/// - [`SimulationController`] and its [`SimulationParams`] / [`SystemConfig`]
/// - [`CpuCanvas`], [`InstanceBatch`] and the [`RenderTarget`] trait
/// - [`Rgb`] and [`Vec2`]
pub mod prelude {
    pub use crate::color::Rgb;
    pub use crate::config::{SimulationParams, SystemConfig};
    pub use crate::render::{CpuCanvas, DrawElement, ElementKind, InstanceBatch, RenderTarget};
    pub use crate::simulation::{SimulationController, SimulationStats};
    pub use crate::Vec2;
}
