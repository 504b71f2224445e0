//! The draw contract between the simulation and a rendering backend.
//!
//! [`SimulationController::draw`](crate::SimulationController::draw) turns
//! the current state into an ordered list of [`DrawElement`]s, looks up a
//! gradient texture for each, and hands both to a [`RenderTarget`]. Two
//! targets ship with the crate:
//!
//! - [`CpuCanvas`] composites onto an in-memory image, used by the headless
//!   binary and tests.
//! - [`InstanceBatch`] packs elements into [`GpuInstance`]s, a plain-old-data
//!   layout ready to upload as an instance buffer.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::color::Rgb;
use crate::error::ConfigError;
use crate::group::GroupId;
use crate::textures::{GradientTexture, TextureId};

/// What a drawable element represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    Trail,
    Circle,
}

/// One soft disc to draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawElement {
    /// Screen position of the center.
    pub position: Vec2,
    /// Radius in pixels.
    pub size: f32,
    pub color: Rgb,
    pub alpha: u8,
    pub kind: ElementKind,
    pub group_id: GroupId,
}

/// A rendering backend.
///
/// Only `draw_element` is required. A backend that uploads textures should
/// free them in `release_texture`, which is called for every texture the
/// cache evicts.
pub trait RenderTarget {
    fn begin_frame(&mut self) {}

    /// Draw `texture` centered on `element.position`.
    fn draw_element(&mut self, element: &DrawElement, texture: &GradientTexture);

    fn release_texture(&mut self, _id: TextureId) {}

    fn end_frame(&mut self) {}
}

/// Software compositor onto an RGBA image.
#[derive(Debug, Clone)]
pub struct CpuCanvas {
    image: RgbaImage,
    background: Rgb,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut canvas = Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            background,
        };
        canvas.clear();
        canvas
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn set_background(&mut self, background: Rgb) {
        self.background = background;
    }

    /// Resize, discarding the current contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width.max(1), height.max(1));
        self.clear();
    }

    /// Fill with the background color.
    pub fn clear(&mut self) {
        let [r, g, b] = self.background.to_array();
        for px in self.image.pixels_mut() {
            *px = Rgba([r, g, b, 255]);
        }
    }

    /// Write the canvas as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(ConfigError::from)
    }

    /// Source-over blend `texture` with its center at `center`.
    fn blit(&mut self, center: Vec2, texture: &GradientTexture) {
        let side = texture.image.width() as i64;
        let x0 = (center.x - side as f32 / 2.0).round() as i64;
        let y0 = (center.y - side as f32 / 2.0).round() as i64;
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);

        for ty in 0..side {
            let y = y0 + ty;
            if y < 0 || y >= h {
                continue;
            }
            for tx in 0..side {
                let x = x0 + tx;
                if x < 0 || x >= w {
                    continue;
                }
                let src = texture.image.get_pixel(tx as u32, ty as u32).0;
                if src[3] == 0 {
                    continue;
                }
                let dst = self.image.get_pixel_mut(x as u32, y as u32);
                dst.0 = blend_over(src, dst.0);
            }
        }
    }
}

impl RenderTarget for CpuCanvas {
    fn begin_frame(&mut self) {
        self.clear();
    }

    fn draw_element(&mut self, element: &DrawElement, texture: &GradientTexture) {
        self.blit(element.position, texture);
    }
}

/// Straight-alpha source-over.
#[inline]
fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let a = src[3] as f32 / 255.0;
    let inv = 1.0 - a;
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round().clamp(0.0, 255.0) as u8;
    let out_a = (src[3] as f32 + dst[3] as f32 * inv).round().clamp(0.0, 255.0) as u8;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), out_a]
}

/// Per-instance data for a GPU backend: one textured quad per element.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuInstance {
    pub position: [f32; 2],
    pub size: f32,
    pub texture: u32,
    /// RGBA, 0-1.
    pub color: [f32; 4],
}

impl GpuInstance {
    pub fn new(element: &DrawElement, texture: TextureId) -> Self {
        let [r, g, b] = element.color.to_f32();
        Self {
            position: element.position.to_array(),
            size: element.size,
            // Low 32 bits only
            texture: texture.0 as u32,
            color: [r, g, b, element.alpha as f32 / 255.0],
        }
    }
}

/// Collects a frame as [`GpuInstance`]s plus the textures to free.
#[derive(Debug, Clone, Default)]
pub struct InstanceBatch {
    pub instances: Vec<GpuInstance>,
    pub released: Vec<TextureId>,
}

impl InstanceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance buffer contents.
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl RenderTarget for InstanceBatch {
    fn begin_frame(&mut self) {
        self.instances.clear();
    }

    fn draw_element(&mut self, element: &DrawElement, texture: &GradientTexture) {
        self.instances.push(GpuInstance::new(element, texture.id));
    }

    fn release_texture(&mut self, id: TextureId) {
        self.released.push(id);
    }
}
