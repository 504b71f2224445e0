//! Color palettes and palette-to-palette transitions.
//!
//! A [`ColorPaletteTable`] holds an ordered list of palettes, each exactly
//! [`COLORS_PER_PALETTE`] colors long. Groups pick a palette and drift
//! continuously towards the next one; [`ColorPaletteTable::get_color`] blends
//! the same slot of both palettes.
//!
//! # Example
//!
//! ```
//! use springle::ColorPaletteTable;
//!
//! let mut table = ColorPaletteTable::builtin();
//!
//! let start = table.get_color(0, 3, 0.0);
//! assert_eq!(start, table.palette(0)[3]);
//!
//! // Indices wrap instead of failing
//! assert_eq!(table.get_color(table.num_palettes(), 15, 0.0), table.palette(0)[3]);
//! ```

use std::collections::{HashMap, VecDeque};

use log::{trace, warn};

use crate::color::{ColorSpace, Rgb};
use crate::error::PaletteError;

/// Number of colors in every palette.
pub const COLORS_PER_PALETTE: usize = 12;

/// Cache size above which the older half of cached colors is dropped.
const DEFAULT_CACHE_CEILING: usize = 1000;

/// The colors of one palette.
pub type PaletteColors = [Rgb; COLORS_PER_PALETTE];

const fn c(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

/// Built-in palettes, in transition order.
pub const BUILTIN_PALETTES: [(&str, PaletteColors); 25] = [
    (
        "Sunset Gradient",
        [
            c(255, 171, 0), c(255, 140, 0), c(255, 99, 71), c(255, 69, 0),
            c(255, 45, 0), c(255, 20, 47), c(255, 0, 80), c(225, 0, 108),
            c(195, 0, 126), c(165, 0, 168), c(135, 0, 189), c(105, 0, 204),
        ],
    ),
    (
        "Ocean Depths",
        [
            c(64, 224, 208), c(0, 216, 217), c(0, 186, 217), c(0, 156, 217),
            c(0, 116, 217), c(30, 144, 255), c(0, 191, 255), c(135, 206, 250),
            c(0, 150, 255), c(0, 120, 255), c(0, 90, 255), c(0, 60, 255),
        ],
    ),
    (
        "Forest Canopy",
        [
            c(34, 139, 34), c(0, 128, 0), c(0, 100, 0), c(107, 142, 35),
            c(85, 107, 47), c(154, 205, 50), c(124, 252, 0), c(50, 205, 50),
            c(46, 139, 87), c(60, 179, 113), c(32, 178, 170), c(47, 79, 79),
        ],
    ),
    (
        "Neon Lights",
        [
            c(255, 0, 255), c(255, 0, 204), c(255, 0, 153), c(255, 0, 102),
            c(255, 0, 51), c(255, 51, 0), c(255, 102, 0), c(255, 153, 0),
            c(255, 204, 0), c(255, 255, 0), c(204, 255, 0), c(153, 255, 0),
        ],
    ),
    (
        "Galaxy Nebula",
        [
            c(123, 31, 162), c(84, 13, 110), c(32, 0, 255), c(103, 58, 183),
            c(156, 39, 176), c(170, 7, 107), c(244, 143, 177), c(199, 0, 57),
            c(255, 87, 51), c(255, 141, 0), c(170, 0, 255), c(138, 43, 226),
        ],
    ),
    (
        "Northern Lights",
        [
            c(16, 255, 133), c(39, 255, 175), c(80, 255, 201), c(132, 255, 217),
            c(175, 255, 228), c(202, 255, 251), c(216, 255, 204), c(171, 228, 155),
            c(128, 200, 107), c(86, 172, 59), c(43, 144, 11), c(0, 116, 0),
        ],
    ),
    (
        "Desert Sands",
        [
            c(242, 209, 158), c(235, 189, 118), c(217, 164, 65), c(191, 144, 0),
            c(166, 123, 0), c(140, 103, 0), c(115, 82, 0), c(89, 62, 0),
            c(64, 41, 0), c(38, 21, 0), c(217, 179, 130), c(230, 197, 158),
        ],
    ),
    (
        "Deep Sea",
        [
            c(0, 119, 190), c(0, 147, 196), c(0, 174, 203), c(0, 202, 209),
            c(0, 229, 216), c(0, 255, 222), c(0, 229, 216), c(0, 202, 209),
            c(0, 174, 203), c(0, 147, 196), c(0, 119, 190), c(0, 92, 183),
        ],
    ),
    (
        "Volcanic",
        [
            c(153, 0, 0), c(179, 0, 0), c(204, 0, 0), c(230, 0, 0),
            c(255, 0, 0), c(255, 26, 0), c(255, 51, 0), c(255, 77, 0),
            c(255, 102, 0), c(255, 128, 0), c(255, 153, 0), c(255, 179, 0),
        ],
    ),
    (
        "Cotton Candy",
        [
            c(255, 183, 213), c(255, 154, 204), c(255, 124, 196), c(255, 95, 187),
            c(255, 66, 179), c(255, 36, 170), c(255, 7, 162), c(255, 0, 153),
            c(255, 0, 144), c(255, 0, 135), c(255, 0, 127), c(255, 0, 118),
        ],
    ),
    (
        "Emerald City",
        [
            c(0, 201, 87), c(0, 178, 89), c(0, 154, 91), c(0, 131, 93),
            c(0, 107, 95), c(0, 84, 97), c(0, 60, 99), c(0, 37, 101),
            c(0, 13, 103), c(0, 0, 105), c(0, 0, 107), c(0, 0, 109),
        ],
    ),
    (
        "Twilight",
        [
            c(25, 25, 112), c(48, 25, 112), c(72, 25, 112), c(95, 25, 112),
            c(119, 25, 112), c(142, 25, 112), c(165, 25, 112), c(189, 25, 112),
            c(212, 25, 112), c(236, 25, 112), c(255, 25, 112), c(255, 48, 112),
        ],
    ),
    (
        "Rainbow Sherbet",
        [
            c(255, 192, 203), c(255, 182, 193), c(255, 160, 122), c(255, 127, 80),
            c(255, 99, 71), c(255, 69, 0), c(255, 140, 0), c(255, 165, 0),
            c(255, 215, 0), c(255, 255, 0), c(255, 255, 224), c(255, 228, 196),
        ],
    ),
    (
        "Deep Purple",
        [
            c(48, 25, 52), c(72, 38, 78), c(95, 50, 104), c(119, 63, 130),
            c(142, 75, 156), c(165, 88, 182), c(189, 100, 208), c(212, 113, 234),
            c(236, 125, 255), c(255, 138, 255), c(255, 150, 255), c(255, 163, 255),
        ],
    ),
    (
        "Electric Blue",
        [
            c(0, 255, 255), c(0, 238, 255), c(0, 221, 255), c(0, 204, 255),
            c(0, 187, 255), c(0, 170, 255), c(0, 153, 255), c(0, 136, 255),
            c(0, 119, 255), c(0, 102, 255), c(0, 85, 255), c(0, 68, 255),
        ],
    ),
    (
        "Autumn Leaves",
        [
            c(255, 69, 0), c(255, 99, 71), c(255, 127, 80), c(255, 140, 0),
            c(255, 165, 0), c(255, 191, 0), c(255, 215, 0), c(255, 239, 0),
            c(255, 255, 0), c(238, 232, 170), c(240, 230, 140), c(189, 183, 107),
        ],
    ),
    (
        "Cyberpunk",
        [
            c(255, 0, 128), c(255, 0, 255), c(178, 0, 255), c(102, 0, 255),
            c(25, 0, 255), c(0, 128, 255), c(0, 255, 255), c(0, 255, 128),
            c(0, 255, 0), c(128, 255, 0), c(255, 255, 0), c(255, 128, 0),
        ],
    ),
    (
        "Arctic Aurora",
        [
            c(127, 255, 212), c(64, 224, 208), c(0, 255, 255), c(0, 255, 127),
            c(60, 179, 113), c(46, 139, 87), c(34, 139, 34), c(50, 205, 50),
            c(144, 238, 144), c(152, 251, 152), c(143, 188, 143), c(102, 205, 170),
        ],
    ),
    (
        "Cosmic Dust",
        [
            c(148, 0, 211), c(138, 43, 226), c(123, 104, 238), c(106, 90, 205),
            c(72, 61, 139), c(147, 112, 219), c(153, 50, 204), c(186, 85, 211),
            c(128, 0, 128), c(216, 191, 216), c(221, 160, 221), c(238, 130, 238),
        ],
    ),
    (
        "Tropical Paradise",
        [
            c(0, 255, 127), c(0, 250, 154), c(0, 255, 127), c(124, 252, 0),
            c(127, 255, 0), c(173, 255, 47), c(50, 205, 50), c(152, 251, 152),
            c(144, 238, 144), c(0, 255, 127), c(60, 179, 113), c(46, 139, 87),
        ],
    ),
    (
        "Candy Shop",
        [
            c(255, 105, 180), c(255, 182, 193), c(255, 192, 203), c(255, 20, 147),
            c(219, 112, 147), c(255, 160, 122), c(255, 127, 80), c(255, 99, 71),
            c(255, 69, 0), c(255, 140, 0), c(255, 160, 122), c(255, 127, 80),
        ],
    ),
    (
        "Deep Ocean",
        [
            c(0, 0, 139), c(0, 0, 205), c(0, 0, 255), c(30, 144, 255),
            c(0, 191, 255), c(135, 206, 235), c(135, 206, 250), c(176, 224, 230),
            c(173, 216, 230), c(0, 255, 255), c(127, 255, 212), c(64, 224, 208),
        ],
    ),
    (
        "Cherry Blossom",
        [
            c(255, 192, 203), c(255, 182, 193), c(255, 160, 122), c(255, 127, 80),
            c(255, 99, 71), c(255, 69, 0), c(255, 0, 0), c(255, 20, 147),
            c(255, 105, 180), c(255, 182, 193), c(255, 192, 203), c(219, 112, 147),
        ],
    ),
    (
        "Golden Hour",
        [
            c(255, 215, 0), c(255, 223, 0), c(255, 231, 0), c(255, 239, 0),
            c(255, 247, 0), c(255, 255, 0), c(255, 247, 0), c(255, 239, 0),
            c(255, 231, 0), c(255, 223, 0), c(255, 215, 0), c(255, 207, 0),
        ],
    ),
    (
        "Moonlight",
        [
            c(25, 25, 112), c(0, 0, 128), c(0, 0, 139), c(0, 0, 205),
            c(0, 0, 255), c(65, 105, 225), c(100, 149, 237), c(135, 206, 235),
            c(135, 206, 250), c(176, 224, 230), c(173, 216, 230), c(240, 248, 255),
        ],
    ),
];

/// A named palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: String,
    pub colors: PaletteColors,
}

/// Cache key: palette, slot, transition in hundredths.
type ColorKey = (usize, usize, u8);

/// Fixed table of palettes with cached transition colors.
#[derive(Debug, Clone)]
pub struct ColorPaletteTable {
    palettes: Vec<Palette>,
    space: ColorSpace,
    cache: HashMap<ColorKey, Rgb>,
    cache_order: VecDeque<ColorKey>,
    cache_ceiling: usize,
}

impl ColorPaletteTable {
    /// The 25 built-in palettes.
    pub fn builtin() -> Self {
        let palettes = BUILTIN_PALETTES
            .iter()
            .map(|(name, colors)| Palette {
                name: (*name).to_string(),
                colors: *colors,
            })
            .collect();
        Self::from_validated(palettes)
    }

    /// Build a table from named color lists.
    ///
    /// Fails if the list is empty or any palette does not have exactly
    /// [`COLORS_PER_PALETTE`] colors.
    pub fn new<S: Into<String>>(palettes: Vec<(S, Vec<Rgb>)>) -> Result<Self, PaletteError> {
        if palettes.is_empty() {
            return Err(PaletteError::Empty);
        }
        let mut out = Vec::with_capacity(palettes.len());
        for (i, (name, colors)) in palettes.into_iter().enumerate() {
            let found = colors.len();
            let colors: PaletteColors =
                colors.try_into().map_err(|_| PaletteError::WrongLength {
                    palette: i,
                    found,
                    expected: COLORS_PER_PALETTE,
                })?;
            out.push(Palette {
                name: name.into(),
                colors,
            });
        }
        Ok(Self::from_validated(out))
    }

    /// Build a table from integer triples, validating every component.
    pub fn from_triples<S: Into<String>>(
        palettes: Vec<(S, Vec<[i32; 3]>)>,
    ) -> Result<Self, PaletteError> {
        let mut converted = Vec::with_capacity(palettes.len());
        for (i, (name, triples)) in palettes.into_iter().enumerate() {
            let colors = triples
                .into_iter()
                .enumerate()
                .map(|(j, t)| {
                    Rgb::try_from_components(t).map_err(|(_, value)| {
                        PaletteError::ComponentOutOfRange {
                            palette: i,
                            color: j,
                            value,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            converted.push((name, colors));
        }
        Self::new(converted)
    }

    fn from_validated(palettes: Vec<Palette>) -> Self {
        Self {
            palettes,
            space: ColorSpace::Lab,
            cache: HashMap::new(),
            cache_order: VecDeque::new(),
            cache_ceiling: DEFAULT_CACHE_CEILING,
        }
    }

    /// Choose the interpolation color space. Clears the cache.
    pub fn with_color_space(mut self, space: ColorSpace) -> Self {
        self.space = space;
        self.clear_cache();
        self
    }

    /// Set the cache ceiling (at least 2).
    pub fn with_cache_ceiling(mut self, ceiling: usize) -> Self {
        self.cache_ceiling = ceiling.max(2);
        self
    }

    #[inline]
    pub fn num_palettes(&self) -> usize {
        self.palettes.len()
    }

    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        self.space
    }

    /// Colors of palette `index` (wrapped).
    pub fn palette(&self, index: usize) -> &PaletteColors {
        &self.palettes[index % self.palettes.len()].colors
    }

    /// Name of palette `index` (wrapped).
    pub fn palette_name(&self, index: usize) -> &str {
        &self.palettes[index % self.palettes.len()].name
    }

    /// Number of cached transition colors.
    pub fn cached_colors(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_order.clear();
    }

    /// Color of slot `color_index` in palette `pattern_index`, blended by
    /// `transition` towards the same slot of the next palette.
    ///
    /// Indices wrap. The transition is clamped to 0-1 and quantized to
    /// hundredths; 0 and 1 return the palette colors exactly.
    pub fn try_get_color(
        &mut self,
        pattern_index: usize,
        color_index: usize,
        transition: f32,
    ) -> Result<Rgb, PaletteError> {
        if !transition.is_finite() {
            return Err(PaletteError::InvalidTransition(transition));
        }
        let n = self.palettes.len();
        if n == 0 {
            return Err(PaletteError::Empty);
        }
        let p = pattern_index % n;
        let slot = color_index % COLORS_PER_PALETTE;
        let step = (transition.clamp(0.0, 1.0) * 100.0).round() as u8;

        let from = self.palettes[p].colors[slot];
        let to = self.palettes[(p + 1) % n].colors[slot];
        match step {
            0 => return Ok(from),
            100 => return Ok(to),
            _ => {}
        }

        let key = (p, slot, step);
        if let Some(&color) = self.cache.get(&key) {
            return Ok(color);
        }

        let color = from.lerp(to, step as f32 / 100.0, self.space);
        self.cache.insert(key, color);
        self.cache_order.push_back(key);
        self.prune_cache();
        Ok(color)
    }

    /// Like [`try_get_color`](Self::try_get_color), but substitutes white on
    /// error so a frame always gets a color.
    pub fn get_color(&mut self, pattern_index: usize, color_index: usize, transition: f32) -> Rgb {
        self.try_get_color(pattern_index, color_index, transition)
            .unwrap_or_else(|e| {
                warn!("color lookup failed, using white: {}", e);
                Rgb::WHITE
            })
    }

    fn prune_cache(&mut self) {
        if self.cache.len() <= self.cache_ceiling {
            return;
        }
        let drop = self.cache_order.len() / 2;
        for key in self.cache_order.drain(..drop) {
            self.cache.remove(&key);
        }
        trace!("palette cache pruned {} entries", drop);
    }
}

impl Default for ColorPaletteTable {
    fn default() -> Self {
        Self::builtin()
    }
}
