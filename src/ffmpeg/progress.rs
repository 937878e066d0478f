use serde::{Deserialize, Serialize};

/// Shared progress of one running ffmpeg job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskProgress {
    pub label: String,
    pub progress: f32,
    pub outcome: Option<Result<(), String>>,
}

impl TaskProgress {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn advance(&mut self, fraction: f32) {
        // ffmpeg can report a timestamp past the cut end while flushing
        self.progress = self.progress.max(fraction.clamp(0.0, 1.0));
    }

    pub fn complete(&mut self) {
        self.progress = 1.0;
        self.outcome = Some(Ok(()));
    }

    pub fn fail(&mut self, reason: &str) {
        self.outcome = Some(Err(reason.to_string()));
    }

    pub fn status_text(&self) -> String {
        match &self.outcome {
            None => format!("{} {:.0}%", self.label, self.progress * 100.0),
            Some(Ok(())) => format!("{} done", self.label),
            Some(Err(reason)) => format!("{} failed: {}", self.label, reason),
        }
    }
}

/// One meaningful line of `-progress pipe:1` output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Output position in seconds
    Position(f64),
    End,
}

/// Read a `key=value` line from ffmpeg's machine readable progress stream.
pub fn parse_progress_event(line: &str) -> Option<ProgressEvent> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // Despite the name, out_time_ms is in microseconds as well
        "out_time_us" | "out_time_ms" => {
            let micros: i64 = value.parse().ok()?;
            (micros >= 0).then(|| ProgressEvent::Position(micros as f64 / 1_000_000.0))
        }
        "out_time" => parse_clock(value).map(ProgressEvent::Position),
        "progress" if value == "end" => Some(ProgressEvent::End),
        _ => None,
    }
}

/// Fraction of `total` covered by a progress event.
pub fn progress_fraction(event: ProgressEvent, total: f64) -> Option<f32> {
    match event {
        ProgressEvent::End => Some(1.0),
        ProgressEvent::Position(_) if total <= 0.0 => None,
        ProgressEvent::Position(t) => Some((t / total).clamp(0.0, 1.0) as f32),
    }
}

fn parse_clock(value: &str) -> Option<f64> {
    let mut fields = value.splitn(3, ':');
    let h: u32 = fields.next()?.parse().ok()?;
    let m: u32 = fields.next()?.parse().ok()?;
    let s: f64 = fields.next()?.parse().ok()?;
    Some(f64::from(h) * 3600.0 + f64::from(m) * 60.0 + s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_microsecond_keys() {
        assert_eq!(
            parse_progress_event("out_time_us=2500000"),
            Some(ProgressEvent::Position(2.5))
        );
        assert_eq!(
            parse_progress_event("out_time_ms=1000000"),
            Some(ProgressEvent::Position(1.0))
        );
        // Emitted before the first packet is muxed
        assert_eq!(parse_progress_event("out_time_us=-9223372036854775807"), None);
        assert_eq!(parse_progress_event("out_time_us=N/A"), None);
    }

    #[test]
    fn test_parse_clock_and_end() {
        assert_eq!(
            parse_progress_event("out_time=00:01:30.500000"),
            Some(ProgressEvent::Position(90.5))
        );
        assert_eq!(parse_progress_event("progress=end"), Some(ProgressEvent::End));
        assert_eq!(parse_progress_event("progress=continue"), None);
        assert_eq!(parse_progress_event("frame=120"), None);
        assert_eq!(parse_progress_event("garbage"), None);
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(ProgressEvent::Position(5.0), 10.0), Some(0.5));
        assert_eq!(progress_fraction(ProgressEvent::Position(50.0), 10.0), Some(1.0));
        assert_eq!(progress_fraction(ProgressEvent::Position(5.0), 0.0), None);
        assert_eq!(progress_fraction(ProgressEvent::End, 0.0), Some(1.0));
    }

    #[test]
    fn test_task_progress_is_monotonic() {
        let mut task = TaskProgress::new("Export");
        task.advance(0.6);
        task.advance(0.4);
        assert_eq!(task.progress, 0.6);
        assert_eq!(task.status_text(), "Export 60%");
        assert!(task.outcome.is_none());

        task.fail("disk full");
        assert_eq!(task.status_text(), "Export failed: disk full");
    }
}
