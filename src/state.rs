use std::ops::Range;

use thiserror::Error;

/// Errors raised by grid construction and checked cell access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// Immutable grid shape shared by every field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    width: usize,
    height: usize,
}

impl GridDims {
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// True for cells on the outer one-cell ring.
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Interior columns `1..width-1` (empty for grids narrower than 3).
    pub fn interior_x(&self) -> Range<usize> {
        1..self.width.saturating_sub(1)
    }

    /// Interior rows `1..height-1` (empty for grids shorter than 3).
    pub fn interior_y(&self) -> Range<usize> {
        1..self.height.saturating_sub(1)
    }
}

/// Fast row-major index; caller guarantees `x < width`.
#[inline(always)]
pub const fn idx(x: usize, y: usize, width: usize) -> usize {
    y * width + x
}

/// Small deterministic PRNG for reproducible field initialisation.
pub struct Xor128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Xor128 {
    pub fn new(seed: u32) -> Self {
        let s = seed.wrapping_mul(1812433253);
        Self {
            x: seed,
            y: s.wrapping_add(1),
            z: s.wrapping_mul(2).wrapping_add(2),
            w: s.wrapping_mul(3).wrapping_add(3),
        }
    }

    pub fn next(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w = self.w ^ (self.w >> 19) ^ (t ^ (t >> 8));
        self.w
    }

    /// Returns a float in [-1.0, 1.0]
    pub fn next_f64(&mut self) -> f64 {
        (self.next() as f64 / u32::MAX as f64) * 2.0 - 1.0
    }
}

/// Density and velocity storage for one simulation.
///
/// Velocity is held as two component planes (`vx`, `vy`) so the solvers can
/// borrow them independently. All planes share `dims` and are never resized.
pub struct FluidGrid {
    dims: GridDims,
    pub(crate) density: Vec<f64>,
    pub(crate) vx: Vec<f64>,
    pub(crate) vy: Vec<f64>,
    /// Scratch plane: pre-diffusion / pre-advection density snapshot, then Poisson potential.
    pub(crate) scratch_a: Vec<f64>,
    /// Scratch plane: divergence of the velocity field.
    pub(crate) scratch_b: Vec<f64>,
}

impl FluidGrid {
    pub fn new(dims: GridDims) -> Self {
        let size = dims.len();
        Self {
            dims,
            density: vec![0.0; size],
            vx: vec![0.0; size],
            vy: vec![0.0; size],
            scratch_a: vec![0.0; size],
            scratch_b: vec![0.0; size],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn vx(&self) -> &[f64] {
        &self.vx
    }

    pub fn vy(&self) -> &[f64] {
        &self.vy
    }

    /// Mutable velocity planes `(vx, vy)`.
    pub fn velocity_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.vx, &mut self.vy)
    }

    fn checked_idx(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if x >= self.dims.width || y >= self.dims.height {
            return Err(GridError::OutOfRange {
                x,
                y,
                width: self.dims.width,
                height: self.dims.height,
            });
        }
        Ok(idx(x, y, self.dims.width))
    }

    pub fn density_at(&self, x: usize, y: usize) -> Result<f64, GridError> {
        Ok(self.density[self.checked_idx(x, y)?])
    }

    pub fn velocity_at(&self, x: usize, y: usize) -> Result<(f64, f64), GridError> {
        let i = self.checked_idx(x, y)?;
        Ok((self.vx[i], self.vy[i]))
    }

    pub fn set_density(&mut self, x: usize, y: usize, value: f64) -> Result<(), GridError> {
        let i = self.checked_idx(x, y)?;
        self.density[i] = value;
        Ok(())
    }

    pub fn set_velocity(&mut self, x: usize, y: usize, v: (f64, f64)) -> Result<(), GridError> {
        let i = self.checked_idx(x, y)?;
        self.vx[i] = v.0;
        self.vy[i] = v.1;
        Ok(())
    }

    /// Interactive write: out-of-range coordinates are ignored. Returns whether a cell changed.
    pub fn try_set_density(&mut self, x: i64, y: i64, value: f64) -> bool {
        if !self.dims.contains(x, y) {
            return false;
        }
        self.density[idx(x as usize, y as usize, self.dims.width)] = value;
        true
    }

    /// Interactive write: out-of-range coordinates are ignored. Returns whether a cell changed.
    pub fn try_set_velocity(&mut self, x: i64, y: i64, v: (f64, f64)) -> bool {
        if !self.dims.contains(x, y) {
            return false;
        }
        let i = idx(x as usize, y as usize, self.dims.width);
        self.vx[i] = v.0;
        self.vy[i] = v.1;
        true
    }

    /// Zero every density cell, boundaries included.
    pub fn reset_density(&mut self) {
        self.density.fill(0.0);
    }

    /// Zero every velocity cell, boundaries included.
    pub fn reset_velocity(&mut self) {
        self.vx.fill(0.0);
        self.vy.fill(0.0);
    }

    /// Fill every density cell with `value`.
    pub fn fill_density(&mut self, value: f64) {
        self.density.fill(value);
    }

    /// Random interior velocities in [-amplitude, amplitude]; boundary cells keep their values.
    pub fn fill_random_velocity(&mut self, rng: &mut Xor128, amplitude: f64) {
        let w = self.dims.width;
        for y in self.dims.interior_y() {
            for x in self.dims.interior_x() {
                let i = idx(x, y, w);
                self.vx[i] = rng.next_f64() * amplitude;
                self.vy[i] = rng.next_f64() * amplitude;
            }
        }
    }
}
