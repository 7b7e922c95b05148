use thiserror::Error;

/// Rejected solver settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("diffusion_rate must be finite and >= 0, got {0}")]
    DiffusionRate(f64),
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("slow_divisor must be finite and > 0, got {0}")]
    SlowDivisor(f64),
}

/// Solver parameters for the fluid simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Diffusion rate `k`; the per-tick coefficient is `a = dt * k`.
    pub diffusion_rate: f64,
    /// Gauss-Seidel sweeps, shared by diffusion and projection.
    pub iterations: usize,
    /// Divisor applied to `a` while slow mode is on.
    pub slow_divisor: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.001,
            iterations: 20,
            slow_divisor: 1_000_000.0,
        }
    }
}

impl SolverParams {
    /// Diffusion coefficient `a` for one tick.
    pub fn diffusion_coefficient(&self, dt: f64, slowed: bool) -> f64 {
        let a = dt * self.diffusion_rate;
        if slowed { a / self.slow_divisor } else { a }
    }

    /// Reject values that break diagonal dominance or stop the sweeps entirely.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.diffusion_rate.is_finite() || self.diffusion_rate < 0.0 {
            return Err(ParamsError::DiffusionRate(self.diffusion_rate));
        }
        if self.iterations == 0 {
            return Err(ParamsError::ZeroIterations);
        }
        if !self.slow_divisor.is_finite() || self.slow_divisor <= 0.0 {
            return Err(ParamsError::SlowDivisor(self.slow_divisor));
        }
        Ok(())
    }
}
