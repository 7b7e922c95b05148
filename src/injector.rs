use crate::input::PointerState;
use crate::state::{FluidGrid, GridDims};

/// Brush sizes and paint value for interactive edits.
#[derive(Clone, Debug, PartialEq)]
pub struct BrushParams {
    /// Half-width of the velocity brush, in cells.
    pub velocity_radius: usize,
    /// Half-width of the density brush, in cells.
    pub density_radius: usize,
    /// Density written by the density brush.
    pub density_value: f64,
}

impl Default for BrushParams {
    fn default() -> Self {
        Self {
            velocity_radius: 3,
            density_radius: 3,
            density_value: 1.0,
        }
    }
}

/// Map a screen-space position to a grid cell: `pos / surface * grid`, per axis.
/// Returns `None` when the mapped position falls outside the grid.
pub fn screen_to_grid(pos: (f64, f64), surface: (usize, usize), dims: GridDims) -> Option<(usize, usize)> {
    if surface.0 == 0 || surface.1 == 0 {
        return None;
    }
    let w = dims.width() as f64;
    let h = dims.height() as f64;
    let gx = pos.0 / surface.0 as f64 * w;
    let gy = pos.1 / surface.1 as f64 * h;
    if !(0.0..w).contains(&gx) || !(0.0..h).contains(&gy) {
        return None;
    }
    Some((gx as usize, gy as usize))
}

/// Inclusive brush span around `center`, clamped to the interior `[1, size-2]`.
fn brush_span(center: usize, radius: usize, size: usize) -> Option<(usize, usize)> {
    if size < 3 {
        return None;
    }
    let lo = center.saturating_sub(radius).max(1);
    let hi = center.saturating_add(radius).min(size - 2);
    (lo <= hi).then_some((lo, hi))
}

fn for_each_brush_cell(dims: GridDims, cell: (usize, usize), radius: usize, mut f: impl FnMut(i64, i64)) {
    let (Some((x0, x1)), Some((y0, y1))) = (
        brush_span(cell.0, radius, dims.width()),
        brush_span(cell.1, radius, dims.height()),
    ) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            f(x as i64, y as i64);
        }
    }
}

/// Overwrite velocity with `v` in the square brush around `cell`.
pub fn paint_velocity(grid: &mut FluidGrid, cell: (usize, usize), radius: usize, v: (f64, f64)) {
    let dims = grid.dims();
    for_each_brush_cell(dims, cell, radius, |x, y| {
        grid.try_set_velocity(x, y, v);
    });
}

/// Overwrite density with `value` in the square brush around `cell`.
pub fn paint_density(grid: &mut FluidGrid, cell: (usize, usize), radius: usize, value: f64) {
    let dims = grid.dims();
    for_each_brush_cell(dims, cell, radius, |x, y| {
        grid.try_set_density(x, y, value);
    });
}

/// Apply this tick's pointer edits. Returns true when a brush was applied.
///
/// The velocity brush writes the raw screen-space pointer delta (not rescaled to grid units).
pub fn inject(grid: &mut FluidGrid, pointer: &PointerState, surface: (usize, usize), brush: &BrushParams) -> bool {
    if !pointer.primary && !pointer.secondary {
        return false;
    }
    let Some(pos) = pointer.position else {
        return false;
    };
    let Some(cell) = screen_to_grid(pos, surface, grid.dims()) else {
        return false;
    };
    if pointer.primary {
        paint_velocity(grid, cell, brush.velocity_radius, pointer.delta);
    }
    if pointer.secondary {
        paint_density(grid, cell, brush.density_radius, brush.density_value);
    }
    true
}
