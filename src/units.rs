// Human-readable rendering for byte sizes and durations, used by the
// `uptime` verb and anywhere a response needs a display-friendly string
// rather than a raw number.

use std::fmt;
use std::time::Duration;

/// A size in bytes, rendered as the largest whole unit (B/KB/MB/GB) that
/// keeps one non-zero digit before the decimal point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size(pub u64);

impl Size {
    pub fn bytes(self) -> u64 {
        self.0
    }

    fn kbytes(self) -> f64 {
        self.0 as f64 / 1024.0
    }

    fn mbytes(self) -> f64 {
        self.kbytes() / 1024.0
    }

    fn gbytes(self) -> f64 {
        self.mbytes() / 1024.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0.0B");
        }
        let tier = ((self.0 as f64).log2() / 10.0) as i32;
        match tier {
            0 => write!(f, "{:.1}B", self.0 as f64),
            1 => write!(f, "{:.1}KB", self.kbytes()),
            2 => write!(f, "{:.1}MB", self.mbytes()),
            _ => write!(f, "{:.1}GB", self.gbytes()),
        }
    }
}

/// A duration rendered as the single largest applicable unit, matching the
/// thresholds pypm's original `units.Time` used (years > 0.5, months > 0.5,
/// any days, hours > 0.5, minutes > 0.5, else seconds).
pub struct Uptime(pub Duration);

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_uptime(self.0.as_secs()))
    }
}

pub fn format_uptime(seconds: u64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }
    let days = seconds / 86_400;
    let years = days as f64 / 365.25;
    let months = days as f64 / 30.417;
    let hours = seconds as f64 / 3600.0;
    let minutes = seconds as f64 / 60.0;

    if years > 0.5 {
        format!("{}Y", years.round() as u64)
    } else if months > 0.5 {
        format!("{}M", months.round() as u64)
    } else if days > 0 {
        format!("{}D", days)
    } else if hours > 0.5 {
        format!("{}h", hours.round() as u64)
    } else if minutes > 0.5 {
        format!("{}m", minutes.round() as u64)
    } else {
        format!("{}s", seconds)
    }
}
