use std::time::Instant;

use serde::Deserialize;

/// How the per-tick delta time is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStepMode {
    /// Every tick advances by the configured nominal dt.
    Fixed,
    /// Every tick advances by the wall-clock seconds since the previous tick.
    Measured,
}

/// Delta time of the last tick and cumulative elapsed time.
#[derive(Clone, Debug)]
pub struct SimClock {
    mode: TimeStepMode,
    fixed_dt: f64,
    delta: f64,
    elapsed: f64,
    last: Option<Instant>,
}

impl SimClock {
    pub fn new(mode: TimeStepMode, fixed_dt: f64) -> Self {
        Self {
            mode,
            fixed_dt,
            delta: 0.0,
            elapsed: 0.0,
            last: None,
        }
    }

    /// Refresh the clock once per tick and return the new delta.
    /// In measured mode the first tick has no predecessor and yields 0.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.delta = match self.mode {
            TimeStepMode::Fixed => self.fixed_dt,
            TimeStepMode::Measured => self
                .last
                .map(|prev| now.saturating_duration_since(prev).as_secs_f64())
                .unwrap_or(0.0),
        };
        self.last = Some(now);
        self.elapsed += self.delta;
        self.delta
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock_ignores_wall_time() {
        let mut clock = SimClock::new(TimeStepMode::Fixed, 0.1);
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), 0.1);
        assert_eq!(clock.tick(t0 + Duration::from_secs(3)), 0.1);
        assert!((clock.elapsed() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_measured_clock_reports_seconds() {
        let mut clock = SimClock::new(TimeStepMode::Measured, 0.1);
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), 0.0, "first tick has no predecessor");
        let dt = clock.tick(t0 + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-9, "dt={}", dt);
        clock.tick(t0 + Duration::from_millis(500));
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);
        assert!((clock.delta() - 0.25).abs() < 1e-9);
    }
}
