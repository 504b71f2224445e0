//! Pointer gesture tracking.
//!
//! Raw frame-to-frame pointer velocity is far too noisy to throw a group
//! with. [`PointerGestureTracker`] keeps a short, time-stamped history of the
//! drag, rejects jitter below a minimum displacement, and on release averages
//! the most recent segments into a velocity estimate in both Cartesian and
//! polar form.
//!
//! # Usage
//!
//! ```
//! use glam::Vec2;
//! use springle::config::GestureConfig;
//! use springle::PointerGestureTracker;
//!
//! let mut tracker = PointerGestureTracker::new(GestureConfig::default(), Vec2::new(400.0, 300.0));
//!
//! tracker.start_drag(Vec2::new(100.0, 100.0)).unwrap();
//! for i in 1..=5 {
//!     tracker.update_drag(Vec2::new(100.0 + 20.0 * i as f32, 100.0), 1.0 / 60.0).unwrap();
//! }
//! let release = tracker.end_drag();
//!
//! // 20 px per 1/60 s to the right
//! assert!((release.cartesian().x - 1200.0).abs() < 1.0);
//! ```
//!
//! Positions are screen coordinates (y down). Velocities come back in world
//! orientation (y up) to match [`PolarMotion`](crate::PolarMotion).

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use log::{debug, warn};

use crate::config::GestureConfig;
use crate::error::GestureError;
use crate::polar::{PolarVelocity, ReleaseVelocity};

/// Fewest segments averaged into a release velocity.
const MIN_VELOCITY_SAMPLES: usize = 5;

/// Whether a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// A pointer position in polar form around the screen center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarPosition {
    pub radius: f32,
    pub theta: f32,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    /// Screen position.
    position: Vec2,
    polar: PolarPosition,
    /// Seconds since the previous accepted sample.
    dt: f32,
}

/// Snapshot of the tracker for debugging overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct DragInfo {
    pub state: DragState,
    pub start: Option<(Vec2, PolarPosition)>,
    pub current: Option<(Vec2, PolarPosition)>,
    pub last_cartesian_velocity: Vec2,
    pub last_polar_velocity: PolarVelocity,
    pub history_len: usize,
    pub total_distance: f32,
}

/// Turns a press/drag/release sequence into a release velocity.
#[derive(Debug, Clone)]
pub struct PointerGestureTracker {
    config: GestureConfig,
    center: Vec2,
    state: DragState,
    start: Option<Sample>,
    history: VecDeque<Sample>,
    /// Time accumulated since the last accepted sample.
    pending_dt: f32,
    total_distance: f32,
    last_cartesian: Vec2,
    last_polar: PolarVelocity,
}

impl PointerGestureTracker {
    /// Create an idle tracker measuring angles around `center` (screen space).
    pub fn new(config: GestureConfig, center: Vec2) -> Self {
        let mut config = config;
        config.max_history = config.max_history.max(2);
        config.velocity_samples = config
            .velocity_samples
            .max(MIN_VELOCITY_SAMPLES)
            .min(config.max_history);
        config.smoothing = config.smoothing.clamp(0.0, 1.0);
        Self {
            config,
            center,
            state: DragState::Idle,
            start: None,
            history: VecDeque::with_capacity(config.max_history + 1),
            pending_dt: 0.0,
            total_distance: 0.0,
            last_cartesian: Vec2::ZERO,
            last_polar: PolarVelocity::ZERO,
        }
    }

    /// The tuning in effect, after clamping.
    #[inline]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Move the polar origin, e.g. after a resize.
    pub fn set_screen_center(&mut self, center: Vec2) {
        self.center = center;
    }

    #[inline]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Number of samples currently in history.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Polar form of a screen position, y flipped to point up.
    pub fn to_polar(&self, position: Vec2) -> PolarPosition {
        let x = position.x - self.center.x;
        let y = self.center.y - position.y;
        PolarPosition {
            radius: (x * x + y * y).sqrt().max(self.config.min_radius),
            theta: y.atan2(x),
        }
    }

    /// Screen position of a polar position.
    pub fn from_polar(&self, polar: PolarPosition) -> Vec2 {
        Vec2::new(
            self.center.x + polar.radius * polar.theta.cos(),
            self.center.y - polar.radius * polar.theta.sin(),
        )
    }

    /// Drop any drag in progress. The previous release velocity is kept for
    /// smoothing.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.start = None;
        self.history.clear();
        self.pending_dt = 0.0;
        self.total_distance = 0.0;
    }

    /// Begin a drag at `position`.
    ///
    /// An invalid position leaves the tracker idle.
    pub fn start_drag(&mut self, position: Vec2) -> Result<(), GestureError> {
        self.reset();
        validate(position).map_err(|e| {
            warn!("start_drag rejected: {}", e);
            e
        })?;

        let sample = Sample {
            position,
            polar: self.to_polar(position),
            dt: 0.0,
        };
        self.start = Some(sample);
        self.history.push_back(sample);
        self.state = DragState::Dragging;
        debug!("drag started at ({:.1}, {:.1})", position.x, position.y);
        Ok(())
    }

    /// Feed the pointer position for a frame lasting `dt` seconds.
    ///
    /// Returns `Ok(true)` when the position was far enough from the last
    /// sample to be recorded. Invalid positions are skipped and reported; the
    /// drag continues.
    pub fn update_drag(&mut self, position: Vec2, dt: f32) -> Result<bool, GestureError> {
        if !self.is_dragging() {
            return Err(GestureError::NotDragging);
        }
        validate(position).map_err(|e| {
            warn!("update_drag skipped sample: {}", e);
            e
        })?;

        if dt.is_finite() && dt > 0.0 {
            self.pending_dt += dt;
        }

        let Some(last) = self.history.back() else {
            return Ok(false);
        };
        let distance = position.distance(last.position);
        if distance < self.config.min_position_delta {
            return Ok(false);
        }

        self.total_distance += distance;
        self.history.push_back(Sample {
            position,
            polar: self.to_polar(position),
            dt: self.pending_dt,
        });
        self.pending_dt = 0.0;
        self.trim_history();
        Ok(true)
    }

    /// Finish the drag and return the release velocity.
    ///
    /// The Cartesian part is the plain average of the newest segments. The
    /// polar part is additionally blended with the previous release and
    /// clamped. An idle tracker returns zero velocity.
    pub fn end_drag(&mut self) -> ReleaseVelocity {
        if !self.is_dragging() {
            return ReleaseVelocity::Decomposed {
                cartesian: Vec2::ZERO,
                polar: PolarVelocity::ZERO,
            };
        }

        let (cartesian, polar) = self.estimate_velocity();
        let s = self.config.smoothing;
        let smoothed = PolarVelocity {
            radial: (polar.radial * (1.0 - s) + self.last_polar.radial * s).clamp(
                -self.config.max_radial_velocity,
                self.config.max_radial_velocity,
            ),
            angular: (polar.angular * (1.0 - s) + self.last_polar.angular * s).clamp(
                -self.config.max_angular_velocity,
                self.config.max_angular_velocity,
            ),
        };

        self.last_cartesian = cartesian;
        self.last_polar = smoothed;
        self.reset();
        debug!(
            "drag released: v=({:.1}, {:.1}) vr={:.1} vθ={:.3}",
            cartesian.x, cartesian.y, smoothed.radial, smoothed.angular
        );

        ReleaseVelocity::Decomposed {
            cartesian,
            polar: smoothed,
        }
    }

    /// Current drag state and last release, for debugging.
    pub fn drag_info(&self) -> DragInfo {
        DragInfo {
            state: self.state,
            start: self.start.map(|s| (s.position, s.polar)),
            current: self.history.back().map(|s| (s.position, s.polar)),
            last_cartesian_velocity: self.last_cartesian,
            last_polar_velocity: self.last_polar,
            history_len: self.history.len(),
            total_distance: self.total_distance,
        }
    }

    /// Roughly `samples` evenly spaced positions from the drag history.
    pub fn smoothed_path(&self, samples: usize) -> Vec<Vec2> {
        if self.history.len() < 2 {
            return Vec::new();
        }
        let step = (self.history.len() / samples.max(1)).max(1);
        self.history.iter().step_by(step).map(|s| s.position).collect()
    }

    /// Keep at most `max_history` samples spanning at most
    /// `max_history_duration` seconds.
    fn trim_history(&mut self) {
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }

        let mut span = 0.0;
        let mut keep_from = 0;
        for (i, sample) in self.history.iter().enumerate().rev() {
            span += sample.dt;
            if span > self.config.max_history_duration {
                keep_from = i;
                break;
            }
        }
        self.history.drain(..keep_from);
    }

    /// Average per-segment velocities over the newest `velocity_samples`
    /// segments. Cartesian velocity is returned with y pointing up.
    fn estimate_velocity(&self) -> (Vec2, PolarVelocity) {
        let segments: Vec<(Vec2, PolarVelocity)> = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .filter(|(_, end)| end.dt > 0.0)
            .map(|(start, end)| {
                let d = end.position - start.position;
                let cart = Vec2::new(d.x, -d.y) / end.dt;
                let dtheta = wrap_pi(end.polar.theta - start.polar.theta);
                let polar = PolarVelocity {
                    radial: (end.polar.radius - start.polar.radius) / end.dt,
                    angular: dtheta / end.dt,
                };
                (cart, polar)
            })
            .collect();

        if segments.is_empty() {
            return (Vec2::ZERO, PolarVelocity::ZERO);
        }

        let n = segments.len().min(self.config.velocity_samples);
        let recent = &segments[segments.len() - n..];
        let inv = 1.0 / n as f32;
        let cart = recent.iter().map(|(c, _)| *c).sum::<Vec2>() * inv;
        let radial = recent.iter().map(|(_, p)| p.radial).sum::<f32>() * inv;
        let angular = recent.iter().map(|(_, p)| p.angular).sum::<f32>() * inv;
        (cart, PolarVelocity { radial, angular })
    }
}

fn validate(position: Vec2) -> Result<(), GestureError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(GestureError::InvalidPosition {
            x: position.x,
            y: position.y,
        })
    }
}

/// Wrap an angle difference into `[-π, π)`.
#[inline]
fn wrap_pi(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn tracker() -> PointerGestureTracker {
        PointerGestureTracker::new(GestureConfig::default(), Vec2::new(400.0, 300.0))
    }

    #[test]
    fn test_start_drag_resets_history() {
        let mut t = tracker();
        t.start_drag(Vec2::new(10.0, 10.0)).unwrap();
        t.update_drag(Vec2::new(30.0, 10.0), DT).unwrap();
        assert_eq!(t.history_len(), 2);

        t.start_drag(Vec2::new(50.0, 50.0)).unwrap();
        assert!(t.is_dragging());
        assert_eq!(t.history_len(), 1);
    }

    #[test]
    fn test_invalid_start_goes_idle() {
        let mut t = tracker();
        t.start_drag(Vec2::new(10.0, 10.0)).unwrap();
        let err = t.start_drag(Vec2::new(f32::NAN, 3.0)).unwrap_err();
        assert!(matches!(err, GestureError::InvalidPosition { .. }));
        assert_eq!(t.state(), DragState::Idle);
        assert_eq!(t.history_len(), 0);
    }

    #[test]
    fn test_update_requires_drag() {
        let mut t = tracker();
        assert_eq!(
            t.update_drag(Vec2::new(1.0, 1.0), DT),
            Err(GestureError::NotDragging)
        );
    }

    #[test]
    fn test_small_moves_rejected() {
        let mut t = tracker();
        t.start_drag(Vec2::new(100.0, 100.0)).unwrap();
        assert_eq!(t.update_drag(Vec2::new(100.5, 100.0), DT), Ok(false));
        assert_eq!(t.history_len(), 1);
        assert_eq!(t.update_drag(Vec2::new(110.0, 100.0), DT), Ok(true));
        assert_eq!(t.history_len(), 2);
    }

    #[test]
    fn test_rejected_time_carries_over() {
        let mut t = tracker();
        t.start_drag(Vec2::new(100.0, 100.0)).unwrap();
        // Two frames of jitter, then a 20 px move: the segment spans three frames
        t.update_drag(Vec2::new(100.2, 100.0), DT).unwrap();
        t.update_drag(Vec2::new(100.4, 100.0), DT).unwrap();
        t.update_drag(Vec2::new(120.0, 100.0), DT).unwrap();
        let v = t.end_drag().cartesian();
        assert_relative_eq!(v.x, 20.0 / (3.0 * DT), epsilon = 1.0);
    }

    #[test]
    fn test_history_trimmed_by_count() {
        let config = GestureConfig {
            max_history: 5,
            max_history_duration: 100.0,
            ..Default::default()
        };
        let mut t = PointerGestureTracker::new(config, Vec2::ZERO);
        t.start_drag(Vec2::ZERO).unwrap();
        for i in 1..20 {
            t.update_drag(Vec2::new(i as f32 * 5.0, 0.0), DT).unwrap();
        }
        assert_eq!(t.history_len(), 5);
    }

    #[test]
    fn test_history_trimmed_by_time() {
        let mut t = tracker();
        t.start_drag(Vec2::ZERO).unwrap();
        for i in 1..=20 {
            t.update_drag(Vec2::new(i as f32 * 5.0, 0.0), DT).unwrap();
        }
        // 0.1 s window at 60 Hz keeps six segments plus their start sample
        assert!(t.history_len() <= 7);
        assert!(t.history_len() >= 6);
    }

    #[test]
    fn test_velocity_samples_floor() {
        let config = GestureConfig {
            velocity_samples: 1,
            ..Default::default()
        };
        let t = PointerGestureTracker::new(config, Vec2::ZERO);
        assert_eq!(t.config().velocity_samples, 5);

        // Never more than the history can hold
        let config = GestureConfig {
            velocity_samples: 1,
            max_history: 3,
            ..Default::default()
        };
        let t = PointerGestureTracker::new(config, Vec2::ZERO);
        assert_eq!(t.config().velocity_samples, 3);
    }

    #[test]
    fn test_last_jerk_is_averaged_out() {
        let config = GestureConfig {
            velocity_samples: 1,
            ..Default::default()
        };
        let mut t = PointerGestureTracker::new(config, Vec2::new(400.0, 300.0));
        t.start_drag(Vec2::new(100.0, 100.0)).unwrap();
        for i in 1..=4 {
            t.update_drag(Vec2::new(100.0 + 20.0 * i as f32, 100.0), DT)
                .unwrap();
        }
        t.update_drag(Vec2::new(260.0, 100.0), DT).unwrap();

        // Four segments at 1200 px/s and one at 4800 px/s
        let v = t.end_drag().cartesian();
        assert_relative_eq!(v.x, 1920.0, epsilon = 1.0);
    }

    #[test]
    fn test_flick_right() {
        let mut t = tracker();
        t.start_drag(Vec2::new(100.0, 100.0)).unwrap();
        for i in 1..=5 {
            t.update_drag(Vec2::new(100.0 + 20.0 * i as f32, 100.0), DT)
                .unwrap();
        }
        let release = t.end_drag();
        let v = release.cartesian();
        assert!(v.x > 0.0);
        assert_relative_eq!(v.x, 1200.0, epsilon = 1.0);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-3);
        assert!(!t.is_dragging());
        assert_eq!(t.history_len(), 0);
    }

    #[test]
    fn test_screen_down_is_world_down() {
        let mut t = tracker();
        t.start_drag(Vec2::new(100.0, 100.0)).unwrap();
        t.update_drag(Vec2::new(100.0, 130.0), DT).unwrap();
        assert!(t.end_drag().cartesian().y < 0.0);
    }

    #[test]
    fn test_polar_smoothing_and_clamp() {
        let mut t = tracker();
        // Drag straight away from the center: purely radial
        t.start_drag(Vec2::new(500.0, 300.0)).unwrap();
        t.update_drag(Vec2::new(505.0, 300.0), DT).unwrap();
        let ReleaseVelocity::Decomposed { polar, .. } = t.end_drag() else {
            panic!("tracker returns decomposed velocity");
        };
        // 300 px/s blended 15% against a zero previous release
        assert_relative_eq!(polar.radial, 300.0 * 0.15, epsilon = 0.5);
        assert_relative_eq!(polar.angular, 0.0, epsilon = 1e-3);

        // Huge radial flick is clamped after smoothing
        t.start_drag(Vec2::new(500.0, 300.0)).unwrap();
        t.update_drag(Vec2::new(1500.0, 300.0), 0.001).unwrap();
        let ReleaseVelocity::Decomposed { polar, .. } = t.end_drag() else {
            panic!("tracker returns decomposed velocity");
        };
        assert_eq!(polar.radial, GestureConfig::default().max_radial_velocity);
    }

    #[test]
    fn test_angular_wraps_across_branch_cut() {
        let mut t = tracker();
        // Just above and just below the negative x axis around the center
        t.start_drag(Vec2::new(300.0, 299.0)).unwrap();
        t.update_drag(Vec2::new(300.0, 301.0), DT).unwrap();
        let ReleaseVelocity::Decomposed { polar, .. } = t.end_drag() else {
            panic!("tracker returns decomposed velocity");
        };
        // A small angular step, not a full turn
        assert!(polar.angular.abs() < 1.0);
    }

    #[test]
    fn test_end_drag_when_idle() {
        let mut t = tracker();
        assert_eq!(t.end_drag().cartesian(), Vec2::ZERO);
    }

    #[test]
    fn test_drag_info_and_path() {
        let mut t = tracker();
        t.start_drag(Vec2::new(0.0, 0.0)).unwrap();
        for i in 1..=4 {
            t.update_drag(Vec2::new(10.0 * i as f32, 0.0), DT).unwrap();
        }
        let info = t.drag_info();
        assert_eq!(info.state, DragState::Dragging);
        assert_eq!(info.history_len, 5);
        assert_relative_eq!(info.total_distance, 40.0);
        assert_eq!(info.start.map(|(p, _)| p), Some(Vec2::ZERO));

        let path = t.smoothed_path(2);
        assert_eq!(path, vec![Vec2::ZERO, Vec2::new(20.0, 0.0), Vec2::new(40.0, 0.0)]);
    }

    #[test]
    fn test_polar_round_trip() {
        let t = tracker();
        let p = Vec2::new(520.0, 140.0);
        let back = t.from_polar(t.to_polar(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-3);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-3);
    }
}
