//! Cached radial-gradient textures for circles and trail points.
//!
//! Every drawn element is a soft disc: a radial gradient of one color whose
//! color and opacity fall off towards the edge. Painting one per element per
//! frame would dominate the frame time, so textures are cached by a
//! quantized key.
//!
//! # Quick Start
//!
//! ```
//! use springle::config::GradientConfig;
//! use springle::{GradientTextureCache, Rgb};
//!
//! let mut cache = GradientTextureCache::new(GradientConfig::default());
//!
//! let id = cache.get_or_create(25.3, Rgb::new(255, 80, 0), 200, 0.2).id;
//! // Close enough to land on the same grid cell
//! assert_eq!(cache.get_or_create(25.9, Rgb::new(255, 80, 0), 203, 0.21).id, id);
//! ```
//!
//! # Keys
//!
//! Sizes are rounded to a `size_step` grid (2 px by default) and clamped to
//! `[min_size, max_size]`, alpha to an `alpha_step` grid (16), sharpness to
//! tenths. Without rounding, continuously animated sizes would produce a new
//! entry almost every frame.
//!
//! # Eviction
//!
//! Entries are kept in insertion order. Inserting into a full cache first
//! evicts the oldest fifth. Ids of evicted textures queue up until
//! [`drain_evicted`](GradientTextureCache::drain_evicted) hands them to the
//! render backend, which releases whatever it uploaded for them.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use image::{Rgba, RgbaImage};
use log::trace;
use serde::Serialize;

use crate::color::Rgb;
use crate::config::GradientConfig;

/// Stable handle of a cached texture, unique for the cache's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureId(pub u64);

/// Quantized cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradientKey {
    /// Radius in multiples of the size step.
    pub size_steps: u32,
    pub color: Rgb,
    pub alpha: u8,
    /// Sharpness in tenths.
    pub sharpness_tenths: u16,
}

/// A painted gradient disc.
#[derive(Debug, Clone)]
pub struct GradientTexture {
    pub id: TextureId,
    pub key: GradientKey,
    /// Radius in pixels the texture was painted for.
    pub size: f32,
    pub image: RgbaImage,
}

impl GradientTexture {
    /// Paint `rings` concentric discs from the outside in.
    ///
    /// A ring whose inner edge sits at normalized radius `t` gets color and
    /// alpha scaled by `(1 - t)^sharpness`, so the center ring is always at
    /// full strength and a low sharpness keeps the disc solid until its rim.
    /// Each pixel takes the innermost ring covering it, which is what
    /// painting the filled discs outer to inner leaves behind.
    fn paint(id: TextureId, key: GradientKey, size: f32, rings: u32) -> Self {
        let side = ((size * 2.0).ceil() as u32).max(2);
        let side = side + side % 2;
        let half = side as f32 / 2.0;
        let rings = rings.max(1) as f32;
        let sharpness = key.sharpness_tenths as f32 / 10.0;
        let [r, g, b] = key.color.to_f32();
        let alpha = key.alpha as f32;

        let image = RgbaImage::from_fn(side, side, |x, y| {
            let dx = x as f32 + 0.5 - half;
            let dy = y as f32 + 0.5 - half;
            let d = (dx * dx + dy * dy).sqrt() / size;
            if d > 1.0 {
                return Rgba([0, 0, 0, 0]);
            }
            let ring = (d * rings).ceil().max(1.0);
            let t_inner = (ring - 1.0) / rings;
            let f = (1.0 - t_inner).powf(sharpness);
            Rgba([
                (r * f * 255.0).round() as u8,
                (g * f * 255.0).round() as u8,
                (b * f * 255.0).round() as u8,
                (alpha * f).round() as u8,
            ])
        });

        Self {
            id,
            key,
            size,
            image,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }
}

/// Counters reported by [`GradientTextureCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GradientCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub live: usize,
}

/// Insertion-ordered cache of gradient textures.
#[derive(Debug)]
pub struct GradientTextureCache {
    config: GradientConfig,
    entries: HashMap<GradientKey, GradientTexture>,
    order: VecDeque<GradientKey>,
    evicted: Vec<TextureId>,
    next_id: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl GradientTextureCache {
    pub fn new(config: GradientConfig) -> Self {
        let mut config = config;
        config.size_step = if config.size_step.is_finite() && config.size_step > 0.0 {
            config.size_step
        } else {
            2.0
        };
        config.alpha_step = config.alpha_step.max(1);
        config.max_entries = config.max_entries.max(1);
        config.min_size = config.min_size.max(0.5);
        config.max_size = config.max_size.max(config.min_size);
        Self {
            config,
            entries: HashMap::new(),
            order: VecDeque::new(),
            evicted: Vec::new(),
            next_id: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    /// Size actually drawn for a requested size: clamped, then snapped to
    /// the grid.
    pub fn quantize_size(&self, size: f32) -> f32 {
        self.size_steps(size) as f32 * self.config.size_step
    }

    fn size_steps(&self, size: f32) -> u32 {
        let step = self.config.size_step;
        let size = if size.is_finite() { size } else { self.config.min_size };
        let size = size.clamp(self.config.min_size, self.config.max_size);
        ((size / step).round() as u32).max(1)
    }

    /// Key for the given drawing parameters.
    pub fn key_for(&self, size: f32, color: Rgb, alpha: u8, sharpness: f32) -> GradientKey {
        let step = self.config.alpha_step as f32;
        let alpha = ((alpha as f32 / step).round() * step).min(255.0) as u8;
        let sharpness = if sharpness.is_finite() { sharpness } else { 1.0 };
        let sharpness_tenths = ((sharpness * 10.0).round() as u16).max(1);
        GradientKey {
            size_steps: self.size_steps(size),
            color,
            alpha,
            sharpness_tenths,
        }
    }

    /// Fetch the texture for these parameters, painting it on a miss.
    pub fn get_or_create(
        &mut self,
        size: f32,
        color: Rgb,
        alpha: u8,
        sharpness: f32,
    ) -> &GradientTexture {
        let key = self.key_for(size, color, alpha, sharpness);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict_oldest();
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                let id = TextureId(self.next_id);
                self.next_id += 1;
                self.order.push_back(key);
                let size = key.size_steps as f32 * self.config.size_step;
                entry.insert(GradientTexture::paint(id, key, size, self.config.rings))
            }
        }
    }

    /// Drop the oldest fifth of the entries.
    fn evict_oldest(&mut self) {
        let count = (self.order.len() / 5).max(1).min(self.order.len());
        for key in self.order.drain(..count) {
            if let Some(texture) = self.entries.remove(&key) {
                self.evicted.push(texture.id);
            }
        }
        self.evictions += count as u64;
        trace!("gradient cache evicted {} textures", count);
    }

    /// Ids of textures evicted since the last call.
    pub fn drain_evicted(&mut self) -> Vec<TextureId> {
        std::mem::take(&mut self.evicted)
    }

    /// Drop every texture. Their ids are queued for release.
    pub fn clear(&mut self) {
        self.evicted.extend(self.entries.drain().map(|(_, t)| t.id));
        self.order.clear();
    }

    pub fn stats(&self) -> GradientCacheStats {
        GradientCacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            live: self.entries.len(),
        }
    }
}
