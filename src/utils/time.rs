/// Whole hours, minutes, seconds and milliseconds of a non-negative time
fn split_clock(seconds: f64) -> (u64, u64, u64, u64) {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let secs = millis / 1000;
    (secs / 3600, secs / 60 % 60, secs % 60, millis % 1000)
}

/// Clock readout for the UI: `MM:SS.mmm`, with an hours field once needed
pub fn format_time(seconds: f64) -> String {
    match split_clock(seconds) {
        (0, m, s, ms) => format!("{:02}:{:02}.{:03}", m, s, ms),
        (h, m, s, ms) => format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms),
    }
}

/// Filesystem-safe form of a timestamp, e.g. `01m05s500`
pub fn format_time_for_filename(seconds: f64) -> String {
    let (h, m, s, ms) = split_clock(seconds);
    format!("{:02}m{:02}s{:03}", h * 60 + m, s, ms)
}
