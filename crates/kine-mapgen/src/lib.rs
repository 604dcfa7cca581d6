//! Procedural [`FieldSource`] implementations.
//!
//! One generator per map mode: a flat half split, a low-frequency noise
//! field, linear and radial gradients, and a cellular
//! (distance-to-seed-point) pattern. All generators are deterministic
//! under a fixed seed and produce values in `[0, 1]`.

use kine_core::{FieldSource, FoodField, KineError};
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::fmt;
use std::str::FromStr;

/// Noise frequency across the shorter field axis; low enough that a field
/// holds a handful of food blobs rather than speckle.
const NOISE_FREQUENCY: f64 = 4.0;
/// A cellular field carves roughly this many tiles along its shorter axis.
const CELLULAR_TILES: u32 = 8;

/// The fixed enumeration of procedural field shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMode {
    /// Left half saturated, right half empty.
    #[default]
    HalfSplit,
    /// Low-frequency smooth noise.
    Noise,
    /// Horizontal ramp from empty to saturated.
    LinearGradient,
    /// Empty at the center, saturated toward the corners.
    RadialGradient,
    /// Distance to the nearest scattered seed point.
    Cellular,
}

impl MapMode {
    /// All modes, in keyboard order.
    pub const ALL: [MapMode; 5] = [
        MapMode::HalfSplit,
        MapMode::Noise,
        MapMode::LinearGradient,
        MapMode::RadialGradient,
        MapMode::Cellular,
    ];

    /// Mode for a numeric selector; anything unmapped falls back to the
    /// default split, like the function-key handling that feeds it.
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => MapMode::Noise,
            2 => MapMode::LinearGradient,
            3 => MapMode::RadialGradient,
            4 => MapMode::Cellular,
            _ => MapMode::HalfSplit,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            MapMode::HalfSplit => "split",
            MapMode::Noise => "noise",
            MapMode::LinearGradient => "linear",
            MapMode::RadialGradient => "radial",
            MapMode::Cellular => "cellular",
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapMode {
    type Err = KineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(MapMode::HalfSplit),
            "noise" => Ok(MapMode::Noise),
            "linear" => Ok(MapMode::LinearGradient),
            "radial" => Ok(MapMode::RadialGradient),
            "cellular" => Ok(MapMode::Cellular),
            _ => Err(KineError::InvalidConfig("unknown map mode")),
        }
    }
}

/// A seeded procedural generator for one [`MapMode`].
#[derive(Debug, Clone, Copy)]
pub struct ProceduralSource {
    mode: MapMode,
    seed: u64,
}

impl ProceduralSource {
    #[must_use]
    pub const fn new(mode: MapMode, seed: u64) -> Self {
        Self { mode, seed }
    }

    #[must_use]
    pub const fn mode(&self) -> MapMode {
        self.mode
    }
}

impl FieldSource for ProceduralSource {
    fn generate(&mut self, width: u32, height: u32) -> Result<FoodField, KineError> {
        if width == 0 || height == 0 {
            return Err(KineError::InvalidFieldDimensions { width, height });
        }
        let cells = match self.mode {
            MapMode::HalfSplit => half_split(width, height),
            MapMode::Noise => noise_cells(width, height, self.seed),
            MapMode::LinearGradient => linear_gradient(width, height),
            MapMode::RadialGradient => radial_gradient(width, height),
            MapMode::Cellular => cellular(width, height, self.seed),
        };
        FoodField::from_cells(width, height, cells)
    }
}

fn half_split(width: u32, height: u32) -> Vec<f32> {
    let mut cells = vec![0.0; (width as usize) * (height as usize)];
    let split = width / 2;
    for y in 0..height {
        for x in 0..split {
            cells[(y * width + x) as usize] = 1.0;
        }
    }
    cells
}

fn noise_cells(width: u32, height: u32, seed: u64) -> Vec<f32> {
    let perlin = Perlin::new(seed as u32);
    let short_axis = f64::from(width.min(height));
    let mut cells = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let nx = f64::from(x) / short_axis * NOISE_FREQUENCY;
            let ny = f64::from(y) / short_axis * NOISE_FREQUENCY;
            let sample = perlin.get([nx, ny]);
            cells.push((0.5 * (sample + 1.0)).clamp(0.0, 1.0) as f32);
        }
    }
    cells
}

fn linear_gradient(width: u32, height: u32) -> Vec<f32> {
    let run = (width - 1).max(1) as f32;
    let mut cells = Vec::with_capacity((width as usize) * (height as usize));
    for _y in 0..height {
        for x in 0..width {
            cells.push(x as f32 / run);
        }
    }
    cells
}

fn radial_gradient(width: u32, height: u32) -> Vec<f32> {
    let center_x = width as f32 * 0.5;
    let center_y = height as f32 * 0.5;
    let radius = width.min(height) as f32 * 0.5;
    let mut cells = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            cells.push((dist / radius).clamp(0.0, 1.0));
        }
    }
    cells
}

fn cellular(width: u32, height: u32, seed: u64) -> Vec<f32> {
    let tile = (width.min(height) / CELLULAR_TILES).max(1);
    let tiles_x = width.div_ceil(tile);
    let tiles_y = height.div_ceil(tile);

    // One uniform-random seed point per tile.
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut seeds = Vec::with_capacity((tiles_x as usize) * (tiles_y as usize));
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let sx = (tx * tile + rng.random_range(0..tile)).min(width - 1);
            let sy = (ty * tile + rng.random_range(0..tile)).min(height - 1);
            seeds.push((sx as f32, sy as f32));
        }
    }

    let mut cells = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        let ty = y / tile;
        for x in 0..width {
            let tx = x / tile;
            // Nearest seed is always within the 3x3 tile neighborhood.
            let mut nearest = f32::INFINITY;
            for ny in ty.saturating_sub(1)..=(ty + 1).min(tiles_y - 1) {
                for nx in tx.saturating_sub(1)..=(tx + 1).min(tiles_x - 1) {
                    let (sx, sy) = seeds[(ny * tiles_x + nx) as usize];
                    let dx = x as f32 - sx;
                    let dy = y as f32 - sy;
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq < nearest {
                        nearest = dist_sq;
                    }
                }
            }
            cells.push((nearest.sqrt() / tile as f32).clamp(0.0, 1.0));
        }
    }
    cells
}
