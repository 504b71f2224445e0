//! Color types and perceptual interpolation.
//!
//! Palette transitions blend between saturated colors, where a straight RGB
//! lerp passes through muddy greys. Interpolating in CIE Lab keeps perceived
//! lightness steady along the path.

use serde::{Deserialize, Serialize};

// D65 reference white
const XN: f32 = 0.95047;
const YN: f32 = 1.0;
const ZN: f32 = 1.08883;

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A color in CIE L*a*b* space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// Color space used for interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Perceptual interpolation (default).
    #[default]
    Lab,
    /// Plain per-channel interpolation.
    Rgb,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from integer components, rejecting anything outside 0..=255.
    ///
    /// On failure returns the index (0-2) and value of the first bad component.
    pub fn try_from_components(c: [i32; 3]) -> Result<Self, (usize, i32)> {
        let mut out = [0u8; 3];
        for (i, &v) in c.iter().enumerate() {
            out[i] = u8::try_from(v).map_err(|_| (i, v))?;
        }
        Ok(Self::new(out[0], out[1], out[2]))
    }

    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as 0.0-1.0 floats.
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Convert to CIE Lab through linear RGB and XYZ.
    pub fn to_lab(self) -> Lab {
        let [r, g, b] = self.to_f32().map(srgb_to_linear);

        let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
        let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
        let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

        let fx = lab_f(x / XN);
        let fy = lab_f(y / YN);
        let fz = lab_f(z / ZN);

        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Interpolate towards `other` by `t` (clamped to 0-1) in `space`.
    pub fn lerp(self, other: Rgb, t: f32, space: ColorSpace) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match space {
            ColorSpace::Lab => self.to_lab().lerp(other.to_lab(), t).to_rgb(),
            ColorSpace::Rgb => {
                let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
                Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
            }
        }
    }

    /// Scale every channel by `factor` (clamped to 0-1).
    pub fn scaled(self, factor: f32) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        let s = |c: u8| (c as f32 * f).round().min(255.0) as u8;
        Rgb::new(s(self.r), s(self.g), s(self.b))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        c.to_array()
    }
}

impl Lab {
    pub fn lerp(self, other: Lab, t: f32) -> Lab {
        Lab {
            l: self.l + (other.l - self.l) * t,
            a: self.a + (other.a - self.a) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Convert back to 8-bit sRGB, clamping out-of-gamut values.
    pub fn to_rgb(self) -> Rgb {
        let fy = (self.l + 16.0) / 116.0;
        let x = XN * lab_f_inv(fy + self.a / 500.0);
        let y = YN * lab_f_inv(fy);
        let z = ZN * lab_f_inv(fy - self.b / 200.0);

        let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
        let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
        let b = x * 0.0557 + y * -0.2040 + z * 1.0570;

        let to_u8 = |c: f32| {
            let v = (linear_to_srgb(c) * 255.0).round();
            if v.is_finite() {
                v.clamp(0.0, 255.0) as u8
            } else {
                0
            }
        };
        Rgb::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c > 0.003_130_8 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    if t > 0.206_893 {
        t * t * t
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb, tol: i32) -> bool {
        (a.r as i32 - b.r as i32).abs() <= tol
            && (a.g as i32 - b.g as i32).abs() <= tol
            && (a.b as i32 - b.b as i32).abs() <= tol
    }

    #[test]
    fn test_lab_round_trip() {
        for c in [
            Rgb::WHITE,
            Rgb::BLACK,
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(123, 31, 162),
            Rgb::new(242, 209, 158),
        ] {
            assert!(close(c.to_lab().to_rgb(), c, 1), "{:?}", c);
        }
    }

    #[test]
    fn test_white_lab() {
        let lab = Rgb::WHITE.to_lab();
        assert!((lab.l - 100.0).abs() < 0.1);
        assert!(lab.a.abs() < 0.5);
        assert!(lab.b.abs() < 0.5);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb::new(255, 0, 0);
        let b = Rgb::new(0, 0, 255);
        for space in [ColorSpace::Lab, ColorSpace::Rgb] {
            assert!(close(a.lerp(b, 0.0, space), a, 1));
            assert!(close(a.lerp(b, 1.0, space), b, 1));
        }
    }

    #[test]
    fn test_lab_midpoint_brighter_than_rgb() {
        // Red to blue through RGB dims to (128, 0, 128); Lab keeps more lightness
        let a = Rgb::new(255, 0, 0);
        let b = Rgb::new(0, 0, 255);
        let lab_mid = a.lerp(b, 0.5, ColorSpace::Lab);
        let rgb_mid = a.lerp(b, 0.5, ColorSpace::Rgb);
        assert_eq!(rgb_mid, Rgb::new(128, 0, 128));
        assert!(lab_mid.to_lab().l > rgb_mid.to_lab().l);
    }

    #[test]
    fn test_try_from_components() {
        assert_eq!(Rgb::try_from_components([1, 2, 3]), Ok(Rgb::new(1, 2, 3)));
        assert_eq!(Rgb::try_from_components([1, 256, 3]), Err((1, 256)));
        assert_eq!(Rgb::try_from_components([-1, 0, 0]), Err((0, -1)));
    }

    #[test]
    fn test_scaled() {
        assert_eq!(Rgb::new(200, 100, 50).scaled(0.5), Rgb::new(100, 50, 25));
        assert_eq!(Rgb::WHITE.scaled(2.0), Rgb::WHITE);
    }
}
