use std::time::Instant;

/// Result of one finished attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionMetrics {
    /// Characters per minute over the whole prompt.
    pub speed: u32,
    /// Raw mistake count, shown as the accuracy figure.
    pub errors: u32,
    pub elapsed_secs: f64,
}

/// Elapsed time and mistake count for one practice attempt.
#[derive(Clone, Debug, Default)]
pub struct SessionTimer {
    started_at: Option<Instant>,
    target_len: usize,
    typos: u32,
}

impl SessionTimer {
    /// (Re)start timing an attempt at a prompt of `target_len` characters.
    /// Mistakes are reset.
    pub fn start(&mut self, target_len: usize, now: Instant) {
        self.started_at = Some(now);
        self.target_len = target_len;
        self.typos = 0;
    }

    pub fn typo(&mut self) {
        self.typos += 1;
    }

    pub fn typos(&self) -> u32 {
        self.typos
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.started_at
            .map_or(0.0, |start| now.saturating_duration_since(start).as_secs_f64())
    }

    /// Metrics for the attempt, or `None` when it took under a second.
    pub fn stop(&self, now: Instant) -> Option<SessionMetrics> {
        self.started_at?;
        let elapsed = self.elapsed_secs(now);
        if elapsed < 1.0 {
            return None;
        }
        Some(SessionMetrics {
            speed: speed(self.target_len, elapsed),
            errors: self.typos,
            elapsed_secs: elapsed,
        })
    }
}

/// `round(len * 60 / elapsed)`: characters per minute.
pub fn speed(target_len: usize, elapsed_secs: f64) -> u32 {
    (target_len as f64 * 60.0 / elapsed_secs).round() as u32
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_speed_sixty_chars_in_sixty_seconds() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.start(60, t0);
        let metrics = timer.stop(t0 + Duration::from_secs(60)).unwrap();
        assert_eq!(metrics.speed, 60);
        assert_eq!(metrics.errors, 0);
    }

    #[test]
    fn test_under_one_second_publishes_nothing() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.start(10, t0);
        assert!(timer.stop(t0 + Duration::from_millis(999)).is_none());
        assert!(timer.stop(t0 + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn test_never_started_publishes_nothing() {
        let timer = SessionTimer::default();
        assert!(timer.stop(Instant::now()).is_none());
    }

    #[test]
    fn test_errors_are_raw_count_and_reset_on_start() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.start(5, t0);
        timer.typo();
        timer.typo();
        let metrics = timer.stop(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(metrics.errors, 2);

        timer.start(5, t0);
        assert_eq!(timer.typos(), 0);
    }

    #[test]
    fn test_speed_rounds() {
        assert_eq!(speed(10, 3.0), 200);
        assert_eq!(speed(7, 4.0), 105);
        assert_eq!(speed(1, 7.0), 9);
    }
}
