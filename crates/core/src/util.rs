/// Seconds in a day; every time of day is strictly below this.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Parses `HH:MM` or `HH:MM:SS` into seconds since midnight.
pub fn parse_clock(s: &str) -> Option<u32> {
    let mut parts = s.trim().split(':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let sec: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || h > 23 || m > 59 || sec > 59 {
        return None;
    }
    Some(h * 3600 + m * 60 + sec)
}

/// Formats seconds since midnight for the custom-event endpoint: `HH:MM`, or
/// `HH:MM:SS` when the seconds are non-zero.
pub fn format_clock(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if s == 0 {
        format!("{h:02}:{m:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}")
    }
}
