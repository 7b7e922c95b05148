use std::path::Path;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::clock::TimeStepMode;
use crate::injector::BrushParams;
use crate::input::{key_from_name, KeyBindings};
use crate::renderer::ColorMap;
use crate::sim::{RunState, Simulation};
use crate::solver::{ParamsError, SolverParams};
use crate::state::{FluidGrid, GridDims, GridError, Xor128};

pub const DEFAULT_PATH: &str = "smokebox.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Solver(#[from] ParamsError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub brush: BrushConfig,
    pub init: InitConfig,
    pub display: DisplayConfig,
    pub keys: KeyConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub diffusion_rate: f64,
    pub iterations: usize,
    pub slow_divisor: f64,
    pub time_step: TimeStepMode,
    pub fixed_dt: f64,
    pub start_running: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub velocity_radius: usize,
    pub density_radius: usize,
    pub density_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Value every density cell starts with.
    pub density: f64,
    /// Amplitude of the seeded random start velocity; 0 disables it.
    pub velocity_jitter: f64,
    pub seed: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Pixels per grid cell.
    pub scale: usize,
    pub target_fps: usize,
    pub colormap: ColorMap,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub toggle_run: String,
    pub toggle_slow: String,
    pub reset_velocity: String,
    pub reset_density: String,
    pub cycle_view: String,
    pub quit: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { width: 80, height: 60 }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let solver = SolverParams::default();
        Self {
            diffusion_rate: solver.diffusion_rate,
            iterations: solver.iterations,
            slow_divisor: solver.slow_divisor,
            time_step: TimeStepMode::Fixed,
            fixed_dt: 0.1,
            start_running: false,
        }
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        let brush = BrushParams::default();
        Self {
            velocity_radius: brush.velocity_radius,
            density_radius: brush.density_radius,
            density_value: brush.density_value,
        }
    }
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            density: 0.0,
            velocity_jitter: 0.0,
            seed: 42,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            scale: 10,
            target_fps: 60,
            colormap: ColorMap::Grayscale,
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            toggle_run: "space".into(),
            toggle_slow: "s".into(),
            reset_velocity: "v".into(),
            reset_density: "d".into(),
            cycle_view: "tab".into(),
            quit: "escape".into(),
        }
    }
}

impl Config {
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            diffusion_rate: self.physics.diffusion_rate,
            iterations: self.physics.iterations,
            slow_divisor: self.physics.slow_divisor,
        }
    }

    pub fn brush_params(&self) -> BrushParams {
        BrushParams {
            velocity_radius: self.brush.velocity_radius,
            density_radius: self.brush.density_radius,
            density_value: self.brush.density_value,
        }
    }

    /// Resolve every key name; the first unknown name is an error.
    pub fn key_bindings(&self) -> Result<KeyBindings, ConfigError> {
        let resolve = |name: &str| key_from_name(name).ok_or_else(|| ConfigError::UnknownKey(name.to_string()));
        let k = &self.keys;
        Ok(KeyBindings {
            toggle_run: resolve(&k.toggle_run)?,
            toggle_slow: resolve(&k.toggle_slow)?,
            reset_velocity: resolve(&k.reset_velocity)?,
            reset_density: resolve(&k.reset_density)?,
            cycle_view: resolve(&k.cycle_view)?,
            quit: resolve(&k.quit)?,
        })
    }

    /// Semantic checks. Any failure here is fatal to the caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GridDims::new(self.grid.width, self.grid.height)?;
        self.solver_params().validate()?;
        if self.physics.time_step == TimeStepMode::Fixed
            && (!self.physics.fixed_dt.is_finite() || self.physics.fixed_dt <= 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "fixed_dt must be finite and > 0, got {}",
                self.physics.fixed_dt
            )));
        }
        if !self.brush.density_value.is_finite() {
            return Err(ConfigError::Invalid("brush.density_value must be finite".into()));
        }
        if !self.init.density.is_finite() || !self.init.velocity_jitter.is_finite() || self.init.velocity_jitter < 0.0 {
            return Err(ConfigError::Invalid(
                "init.density must be finite and init.velocity_jitter finite and >= 0".into(),
            ));
        }
        if self.display.scale == 0 || self.display.target_fps == 0 {
            return Err(ConfigError::Invalid("display.scale and display.target_fps must be at least 1".into()));
        }
        self.key_bindings()?;
        Ok(())
    }

    /// Validate and build the simulation context with its initial fields.
    pub fn build_simulation(&self) -> Result<Simulation, ConfigError> {
        self.validate()?;
        let dims = GridDims::new(self.grid.width, self.grid.height)?;
        let mut grid = FluidGrid::new(dims);
        if self.init.density != 0.0 {
            grid.fill_density(self.init.density);
        }
        if self.init.velocity_jitter > 0.0 {
            let mut rng = Xor128::new(self.init.seed);
            grid.fill_random_velocity(&mut rng, self.init.velocity_jitter);
        }
        let run = if self.physics.start_running { RunState::Running } else { RunState::Paused };
        Ok(Simulation::new(grid, self.solver_params(), self.brush_params())?.with_run_state(run))
    }
}

/// Read the config file at `path`. A missing, unreadable or malformed file
/// yields defaults; only the latter two are warned about.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("failed to parse {}: {e}; using defaults", path.display());
                Config::default()
            }
        },
        Err(e) => {
            warn!("failed to read {}: {e}; using defaults", path.display());
            Config::default()
        }
    }
}
