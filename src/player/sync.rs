use std::time::Instant;

/// Wall-clock playback position
#[derive(Debug, Default)]
pub struct PlaybackClock {
    /// Set while running
    anchor: Option<Instant>,
    /// Position at `anchor`, or the frozen position while paused
    base: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(&mut self) {
        self.anchor.get_or_insert_with(Instant::now);
    }

    pub fn pause(&mut self) {
        self.base = self.time();
        self.anchor = None;
    }

    /// Jump to `time`, keeping the paused/running state
    pub fn set_time(&mut self, time: f64) {
        self.base = time;
        if let Some(anchor) = self.anchor.as_mut() {
            *anchor = Instant::now();
        }
    }

    pub fn time(&self) -> f64 {
        self.anchor
            .map_or(self.base, |a| self.base + a.elapsed().as_secs_f64())
    }

    pub fn is_paused(&self) -> bool {
        self.anchor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_clock_paused_by_default() {
        let clock = PlaybackClock::new();
        assert!(clock.is_paused());
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_clock_runs_and_freezes() {
        let mut clock = PlaybackClock::new();
        clock.resume();
        sleep(Duration::from_millis(50));
        let t = clock.time();
        assert!(t >= 0.04, "clock did not advance: {}", t);

        clock.pause();
        let t1 = clock.time();
        sleep(Duration::from_millis(30));
        assert_eq!(clock.time(), t1);
    }

    #[test]
    fn test_clock_seek_while_running() {
        let mut clock = PlaybackClock::new();
        clock.resume();
        clock.set_time(10.0);
        sleep(Duration::from_millis(20));
        let t = clock.time();
        assert!(t >= 10.0 && t < 11.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_clock_seek_while_paused() {
        let mut clock = PlaybackClock::new();
        clock.set_time(3.5);
        assert_eq!(clock.time(), 3.5);
        clock.resume();
        assert!(clock.time() >= 3.5);
    }
}
