use log::{debug, info};

use crate::config::ConfigError;
use crate::injector::{self, BrushParams};
use crate::input::InputFrame;
use crate::solver::{self, SolverParams};
use crate::state::FluidGrid;

/// Whether the physics phases run on a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunState::Paused => "paused",
            RunState::Running => "running",
        }
    }
}

/// Slowed mode divides the diffusion coefficient; nothing else changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedMode {
    Normal,
    Slowed,
}

impl SpeedMode {
    pub fn toggled(self) -> Self {
        match self {
            SpeedMode::Normal => SpeedMode::Slowed,
            SpeedMode::Slowed => SpeedMode::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedMode::Normal => "normal",
            SpeedMode::Slowed => "slowed",
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub painted: bool,
    pub stepped: bool,
}

/// Simulation context: the grid plus every setting the step reads.
/// The host builds one and calls [`Simulation::step`] once per tick.
pub struct Simulation {
    grid: FluidGrid,
    params: SolverParams,
    brush: BrushParams,
    run: RunState,
    speed: SpeedMode,
    probe: Option<(usize, usize)>,
    ticks: u64,
}

impl Simulation {
    /// Fails when `params` would make the solvers meaningless (e.g. zero sweeps).
    pub fn new(grid: FluidGrid, params: SolverParams, brush: BrushParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            grid,
            params,
            brush,
            run: RunState::Paused,
            speed: SpeedMode::Normal,
            probe: None,
            ticks: 0,
        })
    }

    pub fn with_run_state(mut self, run: RunState) -> Self {
        self.run = run;
        self
    }

    /// Log the density at `cell` at debug level after each tick.
    pub fn with_probe(mut self, cell: (usize, usize)) -> Self {
        self.probe = Some(cell);
        self
    }

    pub fn grid(&self) -> &FluidGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut FluidGrid {
        &mut self.grid
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed
    }

    /// Ticks processed so far, paused ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one tick.
    ///
    /// Order: toggles, resets, pointer injection (also while paused), then
    /// Diffuse -> Advect -> Project when running. `surface` is the pixel size
    /// the pointer position is measured against.
    pub fn step(&mut self, input: &InputFrame, surface: (usize, usize), dt: f64) -> TickReport {
        if input.toggle_run {
            self.run = self.run.toggled();
            info!("Simulation {}", self.run.label());
        }
        if input.toggle_slow {
            self.speed = self.speed.toggled();
            info!("Speed mode {}", self.speed.label());
        }

        if input.reset_velocity {
            self.grid.reset_velocity();
            info!("Velocity field reset");
        }
        if input.reset_density {
            self.grid.reset_density();
            info!("Density field reset");
        }

        let painted = injector::inject(&mut self.grid, &input.pointer, surface, &self.brush);

        let stepped = self.run == RunState::Running;
        if stepped {
            solver::fluid_step(&mut self.grid, &self.params, dt, self.speed == SpeedMode::Slowed);
        }

        self.ticks += 1;
        if let Some((x, y)) = self.probe {
            if let Ok(d) = self.grid.density_at(x, y) {
                debug!("tick {} density({}, {}) = {:.6}", self.ticks, x, y, d);
            }
        }

        TickReport { painted, stepped }
    }
}
