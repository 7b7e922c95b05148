//! Interactive 2D smoke box built on a stable-fluids kernel.
//!
//! - [`state`] - grid dimensions and field storage
//! - [`solver`] - diffusion, advection, projection and the per-tick fluid step
//! - [`injector`] - pointer-driven velocity and density brushes
//! - [`sim`] - the simulation context the host steps once per tick
//! - [`input`], [`clock`] - per-tick input frame and delta time
//! - [`config`] - `smokebox.yaml` loading and validation
//! - [`renderer`] - block-scaled RGBA output

pub mod clock;
pub mod config;
pub mod injector;
pub mod input;
pub mod renderer;
pub mod sim;
pub mod solver;
pub mod state;
