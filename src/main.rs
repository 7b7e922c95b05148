use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info};
use minifb::{KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use thiserror::Error;

use smokebox::clock::SimClock;
use smokebox::config::{self, Config, ConfigError};
use smokebox::input::{InputFrame, KeyBindings, PointerState, PointerTracker};
use smokebox::renderer::{self, RenderConfig, ViewMode};
use smokebox::sim::{RunState, Simulation};
use smokebox::solver::diagnostics;

struct Defaults;

impl Defaults {
    const HEADLESS_STEPS: u64 = 500;
    const HEADLESS_LOG_EVERY: u64 = 50;
    /// Ticks per revolution of the scripted headless drag.
    const HEADLESS_ORBIT_TICKS: f64 = 240.0;
    const PROBE_CELL: (usize, usize) = (10, 10);
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("window: {0}")]
    Window(#[from] minifb::Error),
    #[error("Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    headless: bool,
    steps: u64,
}

/// Parse `[--config <path>] [--headless] [--steps N]`.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut out = Args {
        config: PathBuf::from(config::DEFAULT_PATH),
        headless: false,
        steps: Defaults::HEADLESS_STEPS,
    };
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--headless" => out.headless = true,
            "--config" => out.config = it.next().map(PathBuf::from).ok_or("--config needs a path")?,
            "--steps" => {
                let v = it.next().ok_or("--steps needs a count")?;
                out.steps = v.parse().map_err(|e| format!("invalid --steps {v:?}: {e}"))?;
            }
            other => return Err(format!("unknown argument {other:?}")),
        }
    }
    Ok(out)
}

/// Convert RGBA &[u8] buffer to 0RGB &[u32] buffer for minifb.
fn rgba_to_argb(rgba: &[u8], out: &mut [u32]) {
    for (i, pixel) in rgba.chunks_exact(4).enumerate() {
        out[i] = (pixel[0] as u32) << 16 | (pixel[1] as u32) << 8 | pixel[2] as u32;
    }
}

fn install_ctrlc() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let cfg = config::load(&args.config);
    let result = cfg.build_simulation().map_err(AppError::from).and_then(|sim| {
        let sim = sim.with_probe(Defaults::PROBE_CELL);
        let dims = sim.grid().dims();
        info!(
            "smokebox {}x{} grid, {:?} time step, {} iterations",
            dims.width(),
            dims.height(),
            cfg.physics.time_step,
            cfg.physics.iterations
        );
        if args.headless {
            run_headless(&cfg, sim, args.steps)
        } else {
            run_gui(&cfg, sim)
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Sample keys and pointer once for this tick.
fn poll_input(window: &Window, keys: &KeyBindings, tracker: &mut PointerTracker) -> InputFrame {
    let position = window
        .get_mouse_pos(MouseMode::Discard)
        .map(|(x, y)| (x as f64, y as f64));
    let delta = tracker.update(position);
    InputFrame {
        toggle_run: window.is_key_pressed(keys.toggle_run, KeyRepeat::No),
        toggle_slow: window.is_key_pressed(keys.toggle_slow, KeyRepeat::No),
        reset_velocity: window.is_key_pressed(keys.reset_velocity, KeyRepeat::No),
        reset_density: window.is_key_pressed(keys.reset_density, KeyRepeat::No),
        pointer: PointerState {
            position,
            delta,
            primary: window.get_mouse_down(MouseButton::Left),
            secondary: window.get_mouse_down(MouseButton::Right),
        },
    }
}

fn format_title(sim: &Simulation, view: ViewMode, fps: u32) -> String {
    format!(
        "smokebox | {} | {} | {} | {fps} fps",
        sim.run_state().label(),
        sim.speed_mode().label(),
        view.label()
    )
}

fn run_gui(cfg: &Config, mut sim: Simulation) -> Result<(), AppError> {
    let keys = cfg.key_bindings()?;
    let dims = sim.grid().dims();
    let mut render_cfg = RenderConfig::with_scale(dims.width(), dims.height(), cfg.display.scale);

    let mut window = Window::new(
        "smokebox",
        render_cfg.frame_width,
        render_cfg.frame_height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(cfg.display.target_fps);

    let running = install_ctrlc()?;

    let mut clock = SimClock::new(cfg.physics.time_step, cfg.physics.fixed_dt);
    let mut tracker = PointerTracker::new();
    let mut view = ViewMode::Density;
    let colormap = cfg.display.colormap;

    let mut framebuf = vec![0u32; render_cfg.frame_width * render_cfg.frame_height];
    let mut rgba_buf: Vec<u8> = Vec::new();
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();
    let mut display_fps = 0u32;
    window.set_title(&format_title(&sim, view, display_fps));

    while window.is_open() && running.load(Ordering::SeqCst) {
        if window.is_key_pressed(keys.quit, KeyRepeat::No) {
            break;
        }
        if window.is_key_pressed(keys.cycle_view, KeyRepeat::No) {
            view = view.next();
            info!("View {}", view.label());
        }

        // Pointer positions are in window pixels, so the window is the surface.
        let surface = window.get_size();
        let input = poll_input(&window, &keys, &mut tracker);
        let dt = clock.tick(Instant::now());
        sim.step(&input, surface, dt);

        let fitted = RenderConfig::fit(surface.0, surface.1, dims.width(), dims.height());
        if fitted != render_cfg {
            render_cfg = fitted;
            framebuf = vec![0u32; render_cfg.frame_width * render_cfg.frame_height];
        }
        renderer::render_into(&mut rgba_buf, sim.grid(), &render_cfg, view, colormap);
        rgba_to_argb(&rgba_buf, &mut framebuf);
        window.update_with_buffer(&framebuf, render_cfg.frame_width, render_cfg.frame_height)?;

        frame_count += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            display_fps = frame_count;
            frame_count = 0;
            last_fps_time = now;
        }
        if input.toggle_run || input.toggle_slow || frame_count == 0 {
            window.set_title(&format_title(&sim, view, display_fps));
        }
    }

    info!("Stopped after {} ticks, {:.2} simulated seconds", sim.ticks(), clock.elapsed());
    Ok(())
}

/// Pointer position of the scripted drag: a circle around the surface centre.
fn scripted_pointer(tick: u64, surface: (usize, usize)) -> (f64, f64) {
    let (w, h) = (surface.0 as f64, surface.1 as f64);
    let r = 0.3 * w.min(h);
    let theta = tick as f64 * std::f64::consts::TAU / Defaults::HEADLESS_ORBIT_TICKS;
    (0.5 * w + r * theta.cos(), 0.5 * h + r * theta.sin())
}

/// Both buttons held along the scripted drag.
fn scripted_input(tick: u64, surface: (usize, usize), tracker: &mut PointerTracker) -> InputFrame {
    let position = scripted_pointer(tick, surface);
    let delta = tracker.update(Some(position));
    InputFrame {
        pointer: PointerState {
            position: Some(position),
            delta,
            primary: true,
            secondary: true,
        },
        ..InputFrame::default()
    }
}

fn log_diagnostics(sim: &Simulation, elapsed: f64) {
    let g = sim.grid();
    let d = g.dims();
    info!(
        "tick {:>6}  t={:.2}  mass={:.4}  max|div|={:.3e}  ke={:.3e}",
        sim.ticks(),
        elapsed,
        diagnostics::total_density(g.density()),
        diagnostics::max_abs_divergence(g.vx(), g.vy(), d),
        diagnostics::kinetic_energy(g.vx(), g.vy(), d),
    );
}

fn run_headless(cfg: &Config, sim: Simulation, steps: u64) -> Result<(), AppError> {
    let running = install_ctrlc()?;

    let mut sim = sim.with_run_state(RunState::Running);
    let dims = sim.grid().dims();
    let render_cfg = RenderConfig::with_scale(dims.width(), dims.height(), cfg.display.scale);
    let surface = (render_cfg.frame_width, render_cfg.frame_height);
    let mut clock = SimClock::new(cfg.physics.time_step, cfg.physics.fixed_dt);
    let mut tracker = PointerTracker::new();

    info!("Headless run: {steps} ticks on a {}x{} px surface", surface.0, surface.1);
    for tick in 0..steps {
        if !running.load(Ordering::SeqCst) {
            info!("Interrupted after {tick} ticks");
            break;
        }
        let input = scripted_input(tick, surface, &mut tracker);
        let dt = clock.tick(Instant::now());
        sim.step(&input, surface, dt);

        if (tick + 1) % Defaults::HEADLESS_LOG_EVERY == 0 || tick + 1 == steps {
            log_diagnostics(&sim, clock.elapsed());
        }
    }
    Ok(())
}
