/// Human-readable byte counts for progress lines and run summaries.
///
/// Sizes stay `u64` everywhere else; floating point only appears here.

const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Format a byte count with binary scaling (1 KB = 1024 bytes).
///
/// Whole bytes below 1 KB, one decimal up to MB, two from GB upward.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    value /= 1024.0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    if unit < 2 {
        format!("{value:.1} {}", UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Byte throughput over `elapsed`, e.g. `"12.5 MB/s"`.
pub fn format_rate(bytes: u64, elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_size((bytes as f64 / secs) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn small_counts_stay_in_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn scales_through_units() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_size(1 << 30), "1.00 GB");
        assert_eq!(format_size(1 << 40), "1.00 TB");
        assert_eq!(format_size(1 << 50), "1.00 PB");
    }

    #[test]
    fn rate_over_elapsed_time() {
        assert_eq!(format_rate(2048, Duration::from_secs(2)), "1.0 KB/s");
        assert_eq!(format_rate(2048, Duration::ZERO), "-");
    }
}
