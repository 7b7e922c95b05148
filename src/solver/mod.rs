mod core;
pub mod diagnostics;
mod params;

// Re-export public API
pub use self::core::{advect, diffuse, lin_solve, project};
pub use params::{ParamsError, SolverParams};

use crate::state::FluidGrid;

/// Full fluid simulation step: Diffuse -> Advect -> Project, each exactly once.
///
/// Diffusion and advection act on density; projection acts on velocity.
/// `scratch_a` carries the density snapshot, then the potential; `scratch_b` the divergence.
pub fn fluid_step(grid: &mut FluidGrid, params: &SolverParams, dt: f64, slowed: bool) {
    let dims = grid.dims();
    let a = params.diffusion_coefficient(dt, slowed);

    diffuse(&mut grid.density, &mut grid.scratch_a, a, params.iterations, dims);

    advect(&mut grid.density, &mut grid.scratch_a, &grid.vx, &grid.vy, dims);

    project(
        &mut grid.vx,
        &mut grid.vy,
        &mut grid.scratch_a,
        &mut grid.scratch_b,
        params.iterations,
        dims,
    );
}
