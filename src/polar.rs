//! Motion in polar coordinates.
//!
//! Every orbiting circle owns one [`PolarMotion`]: a radius and angle around
//! the screen center, advanced each frame by radial/angular velocity and
//! acceleration. All values stay inside the [`MotionLimits`] the motion was
//! created with.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use springle::config::MotionLimits;
//! use springle::PolarMotion;
//!
//! let mut motion = PolarMotion::new(100.0, 0.0, 10.0, 1.0, 0.0, 0.0, MotionLimits::default());
//! motion.update(0.5);
//!
//! assert!((motion.radius() - 105.0).abs() < 1e-4);
//! let p = motion.to_cartesian(Vec2::ZERO);
//! assert!((p.length() - motion.radius()).abs() < 1e-3);
//! ```

use std::f32::consts::TAU;

use glam::Vec2;

use crate::config::MotionLimits;

/// Distance from the center below which velocity decomposition is undefined.
const MIN_DECOMPOSE_RADIUS: f32 = 0.1;

/// Polar velocity: radial speed (px/s) and angular speed (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarVelocity {
    pub radial: f32,
    pub angular: f32,
}

impl PolarVelocity {
    pub const ZERO: Self = Self {
        radial: 0.0,
        angular: 0.0,
    };

    pub fn new(radial: f32, angular: f32) -> Self {
        Self { radial, angular }
    }
}

/// Velocity handed to a group when the pointer releases it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseVelocity {
    /// Raw Cartesian velocity in world space (y up), decomposed per point.
    Cartesian(Vec2),
    /// Cartesian velocity together with an already computed polar estimate.
    Decomposed {
        cartesian: Vec2,
        polar: PolarVelocity,
    },
}

impl ReleaseVelocity {
    /// The Cartesian component.
    pub fn cartesian(&self) -> Vec2 {
        match *self {
            ReleaseVelocity::Cartesian(v) => v,
            ReleaseVelocity::Decomposed { cartesian, .. } => cartesian,
        }
    }
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Clamp to `[-max, max]`, snapping magnitudes below `floor` to `±floor`.
#[inline]
fn clamp_with_floor(value: f32, max: f32, floor: f32) -> f32 {
    if !value.is_finite() {
        return floor;
    }
    if value.abs() < floor {
        if value < 0.0 {
            -floor
        } else {
            floor
        }
    } else {
        value.clamp(-max, max)
    }
}

#[inline]
fn clamp_symmetric(value: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-max, max)
    } else {
        0.0
    }
}

/// Radius/angle state of one orbiting point.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarMotion {
    radius: f32,
    theta: f32,
    radial_velocity: f32,
    angular_velocity: f32,
    radial_acceleration: f32,
    angular_acceleration: f32,
    limits: MotionLimits,
}

impl PolarMotion {
    /// Create a motion; every value is clamped to `limits`.
    pub fn new(
        radius: f32,
        theta: f32,
        radial_velocity: f32,
        angular_velocity: f32,
        radial_acceleration: f32,
        angular_acceleration: f32,
        limits: MotionLimits,
    ) -> Self {
        let mut motion = Self {
            radius: 0.0,
            theta: 0.0,
            radial_velocity: 0.0,
            angular_velocity: 0.0,
            radial_acceleration: 0.0,
            angular_acceleration: 0.0,
            limits,
        };
        motion.set_radius(radius);
        motion.set_theta(theta);
        motion.set_radial_velocity(radial_velocity);
        motion.set_angular_velocity(angular_velocity);
        motion.set_radial_acceleration(radial_acceleration);
        motion.set_angular_acceleration(angular_acceleration);
        motion
    }

    /// A motion at rest at `radius`/`theta`.
    pub fn at(radius: f32, theta: f32, limits: MotionLimits) -> Self {
        Self::new(radius, theta, 0.0, 0.0, 0.0, 0.0, limits)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn theta(&self) -> f32 {
        self.theta
    }

    #[inline]
    pub fn radial_velocity(&self) -> f32 {
        self.radial_velocity
    }

    #[inline]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    #[inline]
    pub fn radial_acceleration(&self) -> f32 {
        self.radial_acceleration
    }

    #[inline]
    pub fn angular_acceleration(&self) -> f32 {
        self.angular_acceleration
    }

    #[inline]
    pub fn limits(&self) -> &MotionLimits {
        &self.limits
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = if radius.is_finite() {
            radius.clamp(self.limits.min_radius, self.limits.max_radius)
        } else {
            0.0
        };
    }

    pub fn set_theta(&mut self, theta: f32) {
        self.theta = normalize_angle(theta);
    }

    pub fn set_radial_velocity(&mut self, v: f32) {
        self.radial_velocity =
            clamp_with_floor(v, self.limits.max_radial_velocity, self.limits.min_radial_speed);
    }

    pub fn set_angular_velocity(&mut self, v: f32) {
        self.angular_velocity =
            clamp_with_floor(v, self.limits.max_angular_velocity, self.limits.min_angular_speed);
    }

    pub fn set_radial_acceleration(&mut self, a: f32) {
        self.radial_acceleration = clamp_symmetric(a, self.limits.max_radial_acceleration);
    }

    pub fn set_angular_acceleration(&mut self, a: f32) {
        self.angular_acceleration = clamp_symmetric(a, self.limits.max_angular_acceleration);
    }

    /// Advance by `dt` seconds.
    ///
    /// Velocity moves by `acceleration * dt`; position moves by the average of
    /// the old and new velocity. Negative or non-finite `dt` is ignored.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let old_vr = self.radial_velocity;
        let old_vt = self.angular_velocity;
        self.set_radial_velocity(old_vr + self.radial_acceleration * dt);
        self.set_angular_velocity(old_vt + self.angular_acceleration * dt);

        let mid_vr = 0.5 * (old_vr + self.radial_velocity);
        let mid_vt = 0.5 * (old_vt + self.angular_velocity);
        self.set_radius(self.radius + mid_vr * dt);
        self.set_theta(self.theta + mid_vt * dt);
    }

    /// Position relative to `origin`, standard math orientation.
    #[inline]
    pub fn to_cartesian(&self, origin: Vec2) -> Vec2 {
        origin + Vec2::from_angle(self.theta) * self.radius
    }

    /// Split `velocity` into speed along and across the direction from
    /// `center` to `current_pos`.
    ///
    /// Returns `(radial_speed, tangential_speed)`, or `(0, 0)` when
    /// `current_pos` is (nearly) at `center`.
    pub fn decompose_velocity(velocity: Vec2, center: Vec2, current_pos: Vec2) -> (f32, f32) {
        let offset = current_pos - center;
        let r = offset.length();
        if !r.is_finite() || r < MIN_DECOMPOSE_RADIUS || !velocity.is_finite() {
            return (0.0, 0.0);
        }
        let radial_dir = offset / r;
        let tangent_dir = radial_dir.perp();
        (velocity.dot(radial_dir), velocity.dot(tangent_dir))
    }

    /// Overwrite velocity from a pointer release and zero both accelerations.
    ///
    /// `center` and `current_pos` are only used for [`ReleaseVelocity::Cartesian`],
    /// whose tangential speed is converted to an angular speed at this point's
    /// radius.
    pub fn set_velocity_from_release(
        &mut self,
        release: ReleaseVelocity,
        center: Vec2,
        current_pos: Vec2,
    ) {
        let (radial, angular) = match release {
            ReleaseVelocity::Decomposed { polar, .. } => (polar.radial, polar.angular),
            ReleaseVelocity::Cartesian(v) => {
                let (radial, tangential) = Self::decompose_velocity(v, center, current_pos);
                let r = self.radius.abs();
                let angular = if r > MIN_DECOMPOSE_RADIUS {
                    tangential / self.radius
                } else {
                    0.0
                };
                (radial, angular)
            }
        };

        self.set_radial_velocity(radial * self.limits.release_radial_scale);
        self.set_angular_velocity(angular * self.limits.release_angular_scale);
        self.radial_acceleration = 0.0;
        self.angular_acceleration = 0.0;
    }

    /// Move to `radius`/`theta` and reset every dynamic quantity.
    pub fn reposition(&mut self, radius: f32, theta: f32) {
        self.set_radius(radius);
        self.set_theta(theta);
        self.set_radial_velocity(0.0);
        self.set_angular_velocity(0.0);
        self.radial_acceleration = 0.0;
        self.angular_acceleration = 0.0;
    }
}
