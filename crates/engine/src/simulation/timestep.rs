use std::time::Duration;

/// Steps allowed per frame before the backlog is dropped.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Fixed-rate tick accumulator.
///
/// Wall-clock frame time goes in, a whole number of simulation ticks comes out,
/// so kinematics stay deterministic whatever the host frame rate.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: Duration,
    accumulator: Duration,
}

impl FixedTimestep {
    pub fn new(dt: Duration) -> Self {
        Self {
            dt,
            accumulator: Duration::ZERO,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1))
    }

    /// Add frame time. Returns the number of ticks to run now.
    pub fn accumulate(&mut self, frame: Duration) -> u32 {
        self.accumulator = (self.accumulator + frame).min(self.dt * MAX_STEPS_PER_FRAME);
        let mut steps = 0;
        while self.accumulator >= self.dt && !self.dt.is_zero() {
            self.accumulator -= self.dt;
            steps += 1;
        }
        steps
    }

    /// Fraction of a tick left over, for render interpolation.
    pub fn alpha(&self) -> f32 {
        if self.dt.is_zero() {
            return 0.0;
        }
        self.accumulator.as_secs_f32() / self.dt.as_secs_f32()
    }

    pub fn dt(&self) -> Duration {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_frame_is_cut_to_the_budget() {
        let mut ts = FixedTimestep::from_hz(30);
        assert_eq!(ts.accumulate(Duration::from_secs(5)), MAX_STEPS_PER_FRAME);
        assert_eq!(ts.alpha(), 0.0);
        assert_eq!(ts.accumulate(ts.dt()), 1);
    }

    #[test]
    fn one_second_of_host_frames_gives_one_second_of_ticks() {
        let mut ts = FixedTimestep::from_hz(60);
        let frame = Duration::from_nanos(16_666_667);
        let ticks: u32 = (0..60).map(|_| ts.accumulate(frame)).sum();
        assert_eq!(ticks, 60);
    }

    #[test]
    fn zero_rate_falls_back_to_one_hz() {
        let mut ts = FixedTimestep::from_hz(0);
        assert_eq!(ts.dt(), Duration::from_secs(1));
        assert_eq!(ts.accumulate(Duration::from_millis(500)), 0);
        assert!((ts.alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn leftover_time_shows_up_in_alpha() {
        let mut ts = FixedTimestep::from_hz(20);
        assert_eq!(ts.accumulate(Duration::from_millis(75)), 1);
        assert!((ts.alpha() - 0.5).abs() < 1e-6, "alpha was {}", ts.alpha());
        assert_eq!(ts.accumulate(Duration::from_millis(25)), 1);
    }
}
