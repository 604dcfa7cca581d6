//! Core types shared across the Kine workspace.
//!
//! A [`World`] owns a [`FoodField`] and a fixed population of [`Worm`]
//! agents. Each rendered frame the driver runs every worm through a number
//! of sub-steps chosen by the current [`Pacing`] level; worms sense the
//! field at their cell, adjust speed from local food density, take a fresh
//! random heading, move, and graze the cell they sampled.

use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Default number of worms in a world.
pub const DEFAULT_POPULATION: usize = 100;
/// Smallest food unit a single graze removes; one step of the 8-bit
/// luminance scale the field is quantized against.
pub const FOOD_QUANTUM: f32 = 1.0 / 256.0;
/// Slowest cruising speed, reached when a cell is at half food or better.
pub const MIN_SPEED: f32 = 0.05;
/// Fastest cruising speed the hunger ramp can interpolate toward.
pub const MAX_SPEED: f32 = 0.5;
/// Speed assigned at spawn, before the first field sample.
pub const BOOTSTRAP_SPEED: f32 = 0.001;

const FULL_TURN: f32 = std::f32::consts::TAU;
/// Positions clamp here rather than wrapping; worms stick to field edges.
const POSITION_CEIL: f32 = 0.99999;

/// Errors raised when constructing worlds or fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KineError {
    /// A field was requested with a zero-sized axis.
    #[error("invalid field dimensions {width}x{height}")]
    InvalidFieldDimensions { width: u32, height: u32 },
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Monotonic frame counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    /// The tick before any frame has run.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// The following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Normalized worm position; both axes stay inside `[0, 1)` regardless of
/// field resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Maps a normalized coordinate to a cell index on an axis of `extent`
/// cells: floor truncation, then a clamp for coordinates at the very edge.
#[inline]
#[must_use]
pub fn cell_of(coord: f32, extent: u32) -> u32 {
    debug_assert!(extent > 0);
    ((coord.max(0.0) * extent as f32) as u32).min(extent - 1)
}

/// Hunger-to-speed interpolation weight for a sampled food value.
///
/// Exactly zero at and above half food; below that the weight ramps
/// linearly into `(-1, 0)`, pushing the interpolated speed under
/// `min_speed` for starving cells.
#[inline]
#[must_use]
pub fn speed_weight(food: f32) -> f32 {
    if food >= 0.5 {
        0.0
    } else {
        (food - 0.5) / 0.5
    }
}

/// 2D food field storing one scalar density in `[0, 1]` per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodField {
    width: u32,
    height: u32,
    cells: Vec<f32>,
}

impl FoodField {
    /// Construct a field with every cell at `initial` (clamped into range).
    pub fn new(width: u32, height: u32, initial: f32) -> Result<Self, KineError> {
        if width == 0 || height == 0 {
            return Err(KineError::InvalidFieldDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![initial.clamp(0.0, 1.0); (width as usize) * (height as usize)],
        })
    }

    /// Construct a field from a prepared cell buffer in row-major order.
    /// Values are clamped into `[0, 1]`; the buffer length must match the
    /// dimensions.
    pub fn from_cells(width: u32, height: u32, mut cells: Vec<f32>) -> Result<Self, KineError> {
        if width == 0 || height == 0 {
            return Err(KineError::InvalidFieldDimensions { width, height });
        }
        if cells.len() != (width as usize) * (height as usize) {
            return Err(KineError::InvalidConfig(
                "cell buffer length does not match field dimensions",
            ));
        }
        for cell in &mut cells {
            *cell = cell.clamp(0.0, 1.0);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Returns the flat index for `(x, y)` without bounds checks.
    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Immutable access to a specific cell.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.cells[self.offset(x, y)])
        } else {
            None
        }
    }

    /// Current food density at a cell; indices past the edge clamp to it.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.cells[self.offset(x, y)]
    }

    /// Integer-quantized form of a cell, `floor(value * 256)`.
    #[must_use]
    pub fn quantized(&self, x: u32, y: u32) -> u32 {
        (self.sample(x, y) * 256.0) as u32
    }

    /// Remove one [`FOOD_QUANTUM`] from a cell if its quantized value is
    /// positive; a zero cell is left untouched. Returns whether a unit was
    /// removed.
    pub fn deplete(&mut self, x: u32, y: u32) -> bool {
        let quantized = self.quantized(x, y);
        if quantized == 0 {
            return false;
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = self.offset(x, y);
        self.cells[idx] = (quantized - 1) as f32 / 256.0;
        true
    }

    /// Fills the grid with the provided scalar value, clamped into range.
    pub fn fill(&mut self, value: f32) {
        self.cells.fill(value.clamp(0.0, 1.0));
    }

    /// Flip every cell: `v -> 1 - v`.
    pub fn invert(&mut self) {
        for cell in &mut self.cells {
            *cell = (1.0 - *cell).clamp(0.0, 1.0);
        }
    }

    /// Fraction of the maximum possible food still present.
    #[must_use]
    pub fn remaining_fraction(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().sum::<f32>() / self.cells.len() as f32
    }
}

/// A single foraging agent.
///
/// Comfort mirrors the food value sampled on the most recent step. It is
/// consumed only by renderers; heading and speed never read it back.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Worm {
    pub position: Position,
    pub heading: f32,
    pub speed: f32,
    pub comfort: f32,
}

impl Worm {
    /// Place the worm on a uniform-random cell corner of `field`, facing a
    /// uniform-random direction at bootstrap speed. The only spawn-time
    /// randomness in the model.
    pub fn begin(&mut self, field: &FoodField, rng: &mut dyn RngCore) {
        let cx = rng.random_range(0..field.width());
        let cy = rng.random_range(0..field.height());
        self.position = Position::new(
            cx as f32 / field.width() as f32,
            cy as f32 / field.height() as f32,
        );
        self.heading = rng.random_range(0.0..FULL_TURN);
        self.speed = BOOTSTRAP_SPEED;
        self.comfort = 0.0;
    }

    /// One sub-step: sense, re-pace, re-aim, move, graze. Returns whether
    /// the sampled cell gave up a food unit.
    ///
    /// Speed scales with the raw frame `dt` rather than a fixed timestep,
    /// so pace is coupled to frame time; a starving worm at large `dt`
    /// can even step backward.
    pub fn step(&mut self, field: &mut FoodField, dt: f32, rng: &mut dyn RngCore) -> bool {
        let cell_x = cell_of(self.position.x, field.width());
        let cell_y = cell_of(self.position.y, field.height());

        let food = field.sample(cell_x, cell_y);
        self.comfort = food;

        let weight = speed_weight(food);
        self.speed = (MIN_SPEED + (MAX_SPEED - MIN_SPEED) * weight) * dt;
        self.heading = rng.random_range(0.0..FULL_TURN);

        self.position.x = clamp_axis(self.position.x + self.heading.cos() * self.speed);
        self.position.y = clamp_axis(self.position.y + self.heading.sin() * self.speed);

        field.deplete(cell_x, cell_y)
    }
}

#[inline]
fn clamp_axis(value: f32) -> f32 {
    if value < 0.0 {
        0.0
    } else if value >= 1.0 {
        POSITION_CEIL
    } else {
        value
    }
}

/// Frame pacing: a discrete speed-multiplier level with a total mapping to
/// sub-steps per rendered frame.
///
/// Raising past the top level or lowering past the bottom does not clamp;
/// it resets to the base level, so repeated presses of the speed-up key
/// cycle through the fast-forward range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pacing {
    level: u8,
}

impl Pacing {
    /// Highest level before the cycle resets.
    pub const MAX_LEVEL: u8 = 6;

    #[must_use]
    pub const fn new() -> Self {
        Self { level: 0 }
    }

    /// Current speed-multiplier level in `[0, 6]`.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Sub-steps each worm runs per rendered frame at the current level.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        match self.level {
            1 => 2,
            2 => 5,
            3 => 10,
            4 => 50,
            5 => 100,
            6 => 1000,
            _ => 1,
        }
    }

    /// Set the level directly; anything outside `[0, 6]` normalizes to 0.
    pub fn set_level(&mut self, level: i32) {
        self.level = if (0..=Self::MAX_LEVEL as i32).contains(&level) {
            level as u8
        } else {
            0
        };
    }

    /// Step one level faster, cycling back to base past the top.
    pub fn raise(&mut self) {
        self.set_level(self.level as i32 + 1);
    }

    /// Step one level slower, resetting to base below the bottom.
    pub fn lower(&mut self) {
        self.set_level(self.level as i32 - 1);
    }
}

/// Produces the initial scalar grid a world forages over. The core is
/// indifferent to how the values were generated.
pub trait FieldSource {
    fn generate(&mut self, width: u32, height: u32) -> Result<FoodField, KineError>;
}

/// Read-only frame consumer. The driver guarantees worm and field state are
/// stable when this runs: draws happen between frames, never mid-pass.
pub trait Renderer {
    fn draw(&mut self, field: &FoodField, worms: &[Worm]);
}

/// Static configuration for a Kine world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineConfig {
    /// Number of worms spawned at startup; fixed for the process lifetime.
    pub population: usize,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Maximum number of recent frame summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for KineConfig {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            rng_seed: None,
            history_capacity: 256,
        }
    }
}

impl KineConfig {
    fn validate(&self) -> Result<(), KineError> {
        if self.population == 0 {
            return Err(KineError::InvalidConfig("population must be non-zero"));
        }
        if self.history_capacity == 0 {
            return Err(KineError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeding from entropy if no seed is set.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Events emitted after processing one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameEvents {
    pub tick: Tick,
    /// Sub-steps each worm ran this frame.
    pub iterations: u32,
    /// Food units grazed across the whole population this frame.
    pub depletions: u64,
}

/// Summary retained in the world history ring after each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub tick: Tick,
    pub iterations: u32,
    pub population: usize,
    pub average_comfort: f32,
    pub food_remaining: f32,
}

/// Commands the input boundary may apply between frames.
///
/// Keyboard handling, image drops, and map-mode switches live outside the
/// core; they reach it only through these operations.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    /// Swap in a freshly generated or decoded field wholesale.
    ReplaceField(FoodField),
    /// Flip the current field's food values in place.
    InvertField,
    /// Jump to a speed-multiplier level (out-of-range normalizes to base).
    SetSpeedLevel(i32),
    RaiseSpeed,
    LowerSpeed,
}

/// Apply a control command to a world. Runs between frames by contract.
pub fn apply_control_command(world: &mut World, command: ControlCommand) {
    match command {
        ControlCommand::ReplaceField(field) => world.replace_field(field),
        ControlCommand::InvertField => world.field_mut().invert(),
        ControlCommand::SetSpeedLevel(level) => world.pacing_mut().set_level(level),
        ControlCommand::RaiseSpeed => world.pacing_mut().raise(),
        ControlCommand::LowerSpeed => world.pacing_mut().lower(),
    }
}

/// Aggregate simulation state: the field, the population, and the clock.
pub struct World {
    config: KineConfig,
    field: FoodField,
    worms: Vec<Worm>,
    pacing: Pacing,
    tick: Tick,
    rng: SmallRng,
    history: VecDeque<FrameSummary>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("pacing", &self.pacing)
            .field("population", &self.worms.len())
            .field("field", &(self.field.width(), self.field.height()))
            .finish()
    }
}

impl World {
    /// Instantiate a world over an existing field, spawning the population.
    pub fn new(config: KineConfig, field: FoodField) -> Result<Self, KineError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let mut worms = vec![Worm::default(); config.population];
        for worm in &mut worms {
            worm.begin(&field, &mut rng);
        }
        let history_capacity = config.history_capacity;
        Ok(Self {
            config,
            field,
            worms,
            pacing: Pacing::new(),
            tick: Tick::zero(),
            rng,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Instantiate a world whose initial field comes from a [`FieldSource`].
    pub fn from_source(
        config: KineConfig,
        source: &mut dyn FieldSource,
        width: u32,
        height: u32,
    ) -> Result<Self, KineError> {
        let field = source.generate(width, height)?;
        Self::new(config, field)
    }

    /// Run one rendered frame: every worm takes the pacing level's number
    /// of sub-steps against the shared field. Worms are processed
    /// sequentially, so two worms on one cell graze it additively.
    pub fn step_frame(&mut self, dt: f32) -> FrameEvents {
        let iterations = self.pacing.iterations();
        let mut depletions = 0u64;
        for worm in &mut self.worms {
            for _ in 0..iterations {
                if worm.step(&mut self.field, dt, &mut self.rng) {
                    depletions += 1;
                }
            }
        }
        self.tick = self.tick.next();
        self.push_summary(iterations);
        FrameEvents {
            tick: self.tick,
            iterations,
            depletions,
        }
    }

    fn push_summary(&mut self, iterations: u32) {
        let average_comfort = if self.worms.is_empty() {
            0.0
        } else {
            self.worms.iter().map(|w| w.comfort).sum::<f32>() / self.worms.len() as f32
        };
        let summary = FrameSummary {
            tick: self.tick,
            iterations,
            population: self.worms.len(),
            average_comfort,
            food_remaining: self.field.remaining_fraction(),
        };
        while self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Hand the current frame to a renderer. Only valid between frames,
    /// which is the only time the caller can hold `&self` anyway.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.draw(&self.field, &self.worms);
    }

    /// Swap the field wholesale. Worm positions, headings, and comfort are
    /// untouched; the next frame samples against the new field.
    pub fn replace_field(&mut self, field: FoodField) {
        self.field = field;
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &KineConfig {
        &self.config
    }

    /// Current frame tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Immutable access to the food field.
    #[must_use]
    pub fn field(&self) -> &FoodField {
        &self.field
    }

    /// Mutable access to the food field.
    #[must_use]
    pub fn field_mut(&mut self) -> &mut FoodField {
        &mut self.field
    }

    /// The worm population in spawn order.
    #[must_use]
    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    /// Current pacing state.
    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Mutable access to the pacing state.
    #[must_use]
    pub fn pacing_mut(&mut self) -> &mut Pacing {
        &mut self.pacing
    }

    /// Iterate over retained frame summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &FrameSummary> {
        self.history.iter()
    }

    /// Borrow the world RNG mutably for deterministic sampling.
    #[must_use]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}
