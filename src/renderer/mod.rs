mod color;

// Re-export public API
pub use color::{map_to_rgba, ColorMap};

use crate::state::{idx, FluidGrid};

/// Which field is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Density, clamped to [0, 1].
    Density,
    /// Velocity magnitude, normalised by the frame maximum.
    Speed,
}

impl ViewMode {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            ViewMode::Density => ViewMode::Speed,
            ViewMode::Speed => ViewMode::Density,
        }
    }

    /// Short label for the window title.
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Density => "density",
            ViewMode::Speed => "speed",
        }
    }
}

/// Block-scaled layout: each grid cell becomes a `scale_x` x `scale_y` block of pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub scale_x: usize,
    pub scale_y: usize,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl RenderConfig {
    /// Compute layout to fit the given pixel dimensions.
    /// Scale factors are floored per axis and never drop below 1.
    pub fn fit(pixel_width: usize, pixel_height: usize, grid_width: usize, grid_height: usize) -> Self {
        let scale_x = (pixel_width / grid_width.max(1)).max(1);
        let scale_y = (pixel_height / grid_height.max(1)).max(1);
        Self {
            grid_width,
            grid_height,
            scale_x,
            scale_y,
            frame_width: grid_width * scale_x,
            frame_height: grid_height * scale_y,
        }
    }

    /// Layout for a fixed integer scale on both axes (window creation).
    pub fn with_scale(grid_width: usize, grid_height: usize, scale: usize) -> Self {
        let scale = scale.max(1);
        Self::fit(grid_width * scale, grid_height * scale, grid_width, grid_height)
    }
}

fn speed_field(grid: &FluidGrid) -> (Vec<f64>, f64) {
    let speed: Vec<f64> = grid
        .vx()
        .iter()
        .zip(grid.vy())
        .map(|(&u, &v)| (u * u + v * v).sqrt())
        .collect();
    let max = speed.iter().copied().filter(|s| s.is_finite()).fold(0.0_f64, f64::max);
    (speed, max)
}

/// Render the grid into an RGBA buffer of `frame_width * frame_height * 4` bytes.
/// Grid row 0 is drawn at the top, matching screen coordinates used for pointer input.
pub fn render_into(buf: &mut Vec<u8>, grid: &FluidGrid, cfg: &RenderConfig, view: ViewMode, colormap: ColorMap) {
    let frame_width = cfg.frame_width;
    let total = frame_width * cfg.frame_height * 4;
    buf.resize(total, 0);
    buf.fill(0);

    let dims = grid.dims();
    let w = dims.width().min(cfg.grid_width);
    let h = dims.height().min(cfg.grid_height);

    let (speed, speed_max) = match view {
        ViewMode::Speed => speed_field(grid),
        ViewMode::Density => (Vec::new(), 0.0),
    };

    for y in 0..h {
        for x in 0..w {
            let i = idx(x, y, dims.width());
            let t = match view {
                ViewMode::Density => grid.density()[i],
                ViewMode::Speed => {
                    if speed_max > 0.0 { speed[i] / speed_max } else { 0.0 }
                }
            };
            let rgba = map_to_rgba(t, colormap);

            let px0 = x * cfg.scale_x;
            let py0 = y * cfg.scale_y;
            for py in py0..py0 + cfg.scale_y {
                let row = (py * frame_width + px0) * 4;
                for block in buf[row..row + cfg.scale_x * 4].chunks_exact_mut(4) {
                    block.copy_from_slice(&rgba);
                }
            }
        }
    }
}

/// Convenience wrapper returning a fresh buffer.
pub fn render(grid: &FluidGrid, cfg: &RenderConfig, view: ViewMode, colormap: ColorMap) -> Vec<u8> {
    let mut buf = Vec::new();
    render_into(&mut buf, grid, cfg, view, colormap);
    buf
}
