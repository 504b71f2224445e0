//! Centralized storage for fading trail points.
//!
//! Trail points do not belong to the group that emitted them. A group can be
//! retired while its trail keeps fading here on its own schedule.
//!
//! # Fade curve
//!
//! Alpha follows a cubic ease-out of the point's age:
//!
//! ```text
//! progress = clamp(age / fade_duration, 0, 1)
//! alpha    = max_alpha * (1 - progress³)
//! ```
//!
//! Trails stay close to full opacity for most of their life and drop off
//! near the end. Points are removed once their alpha falls below the
//! configured floor or their age reaches the fade duration.
//!
//! # Capacity
//!
//! The store never holds more than `capacity` points. Adding to a full store
//! first evicts the oldest fifth in one batch.

use std::collections::VecDeque;

use glam::Vec2;
use log::trace;

use crate::color::Rgb;
use crate::config::TrailConfig;
use crate::group::GroupId;

/// One fading mark left behind by a moving circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// Screen position.
    pub position: Vec2,
    pub color: Rgb,
    pub size: f32,
    /// Current opacity, recomputed every [`TrailStore::update`].
    pub alpha: u8,
    /// Simulation time at which the point was emitted.
    pub creation_time: f64,
    /// Age in seconds as of the last update.
    pub age: f32,
    /// Emitting group. Used for draw ordering only.
    pub group_id: GroupId,
}

/// Counters reported by [`TrailStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct TrailStats {
    pub live: usize,
    pub capacity: usize,
    pub total_added: u64,
    /// Points removed by fading.
    pub total_faded: u64,
    /// Points dropped to make room for new ones.
    pub total_evicted: u64,
    /// Points removed by [`TrailStore::clear_all`].
    pub total_cleared: u64,
}

/// Capacity-bounded store of trail points, oldest first.
#[derive(Debug, Clone)]
pub struct TrailStore {
    points: VecDeque<TrailPoint>,
    capacity: usize,
    fade_duration: f32,
    alpha_floor: u8,
    total_added: u64,
    total_faded: u64,
    total_evicted: u64,
    total_cleared: u64,
}

impl TrailStore {
    pub fn new(config: TrailConfig, fade_duration: f32) -> Self {
        let capacity = config.capacity.max(1);
        let mut store = Self {
            points: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            fade_duration: 1.0,
            alpha_floor: config.alpha_floor,
            total_added: 0,
            total_faded: 0,
            total_evicted: 0,
            total_cleared: 0,
        };
        store.set_fade_duration(fade_duration);
        store
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn fade_duration(&self) -> f32 {
        self.fade_duration
    }

    /// Change how long points take to fade. Non-positive values are ignored.
    pub fn set_fade_duration(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.fade_duration = seconds;
        }
    }

    /// Append a point at full `alpha`, evicting the oldest fifth when full.
    pub fn add_point(
        &mut self,
        position: Vec2,
        color: Rgb,
        size: f32,
        alpha: u8,
        group_id: GroupId,
        creation_time: f64,
    ) {
        if self.points.len() >= self.capacity {
            let evict = (self.capacity / 5).max(1).min(self.points.len());
            self.points.drain(..evict);
            self.total_evicted += evict as u64;
            trace!("trail store full, evicted {} points", evict);
        }

        self.points.push_back(TrailPoint {
            position,
            color,
            size,
            alpha,
            creation_time,
            age: 0.0,
            group_id,
        });
        self.total_added += 1;
    }

    /// Recompute every point's age and alpha at time `now`, dropping the ones
    /// that have faded out.
    ///
    /// `_dt` is unused: ages derive from `now` so they never drift.
    pub fn update(&mut self, _dt: f32, now: f64, max_alpha: u8) {
        if self.points.is_empty() {
            return;
        }

        let fade = self.fade_duration;
        let floor = self.alpha_floor;
        let max_alpha = max_alpha as f32;
        let before = self.points.len();

        self.points.retain_mut(|p| {
            let age = (now - p.creation_time).max(0.0) as f32;
            let progress = (age / fade).clamp(0.0, 1.0);
            let factor = 1.0 - progress * progress * progress;
            p.age = age;
            p.alpha = (max_alpha * factor) as u8;
            age < fade && p.alpha >= floor
        });

        let removed = before - self.points.len();
        if removed > 0 {
            self.total_faded += removed as u64;
            trace!("{} trail points faded out", removed);
        }
    }

    /// Live points, oldest first.
    ///
    /// The store is a ring buffer, so the slice is made contiguous first.
    pub fn get_drawable_elements(&mut self) -> &[TrailPoint] {
        self.points.make_contiguous()
    }

    /// Iterate the live points without rearranging storage.
    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Remove every point.
    pub fn clear_all(&mut self) {
        self.total_cleared += self.points.len() as u64;
        self.points.clear();
    }

    pub fn stats(&self) -> TrailStats {
        TrailStats {
            live: self.points.len(),
            capacity: self.capacity,
            total_added: self.total_added,
            total_faded: self.total_faded,
            total_evicted: self.total_evicted,
            total_cleared: self.total_cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize, fade: f32) -> TrailStore {
        TrailStore::new(
            TrailConfig {
                capacity,
                ..Default::default()
            },
            fade,
        )
    }

    fn add(store: &mut TrailStore, t: f64) {
        store.add_point(Vec2::ZERO, Rgb::WHITE, 10.0, 200, GroupId(1), t);
    }

    #[test]
    fn test_point_fades_on_schedule() {
        let fade = 5.0;
        let mut s = store(100, fade);
        add(&mut s, 2.0);

        s.update(0.0, 2.0 + fade as f64 * 0.5, 200);
        assert_eq!(s.len(), 1);
        let p = s.get_drawable_elements()[0];
        // 1 - 0.5³ = 0.875
        assert_eq!(p.alpha, 175);
        assert!((p.age - 2.5).abs() < 1e-5);

        s.update(0.0, 2.0 + fade as f64 * 1.01, 200);
        assert!(s.is_empty());
    }

    #[test]
    fn test_alpha_floor_prunes_early() {
        let mut s = store(100, 10.0);
        add(&mut s, 0.0);
        // At 99% progress: 200 * (1 - 0.970299) ≈ 5.9, still above the floor
        s.update(0.0, 9.9, 200);
        assert_eq!(s.len(), 1);
        // At 99.5%: ≈ 2.98, below the floor of 5
        s.update(0.0, 9.95, 200);
        assert!(s.is_empty());
    }

    #[test]
    fn test_max_alpha_below_floor_hides_trails() {
        let mut s = store(100, 5.0);
        add(&mut s, 0.0);
        s.update(0.0, 0.0, 200);
        assert_eq!(s.len(), 1);

        // Floor is 5: a max alpha of 4 prunes every point straight away
        s.update(0.0, 0.016, 4);
        assert!(s.is_empty());
        assert_eq!(s.stats().total_faded, 1);

        add(&mut s, 0.016);
        s.update(0.0, 0.016, 5);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut s = store(50, 5.0);
        for i in 0..1000 {
            add(&mut s, i as f64 * 0.001);
            assert!(s.len() <= 50);
        }
        let stats = s.stats();
        assert_eq!(stats.total_added, 1000);
        assert_eq!(stats.total_evicted as usize + stats.live, 1000);
    }

    #[test]
    fn test_eviction_drops_oldest_fifth() {
        let mut s = store(10, 5.0);
        for i in 0..10 {
            add(&mut s, i as f64);
        }
        add(&mut s, 10.0);
        assert_eq!(s.len(), 9);
        let oldest = s.get_drawable_elements()[0].creation_time;
        assert_eq!(oldest, 2.0);
    }

    #[test]
    fn test_tiny_capacity_evicts_one() {
        let mut s = store(3, 5.0);
        for i in 0..5 {
            add(&mut s, i as f64);
        }
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_clear_all() {
        let mut s = store(10, 5.0);
        add(&mut s, 0.0);
        add(&mut s, 0.0);
        add(&mut s, 0.0);
        s.update(0.0, 6.0, 200);
        assert!(s.is_empty());

        add(&mut s, 6.0);
        add(&mut s, 6.0);
        s.clear_all();
        assert!(s.is_empty());
        let stats = s.stats();
        assert_eq!(stats.total_faded, 3);
        assert_eq!(stats.total_cleared, 2);
    }

    #[test]
    fn test_fade_duration_rejects_non_positive() {
        let mut s = store(10, 5.0);
        s.set_fade_duration(0.0);
        s.set_fade_duration(f32::NAN);
        assert_eq!(s.fade_duration(), 5.0);
        s.set_fade_duration(2.0);
        assert_eq!(s.fade_duration(), 2.0);
    }
}
