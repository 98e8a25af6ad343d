//! Utility functions for rollcoord

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Parse duration string (e.g., "500ms", "30s", "5m", "1h", "7d")
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let s = s.trim();
    if s.is_empty() || !s.is_ascii() {
        return Err(crate::Error::InvalidConfig(format!("invalid duration: {}", s)));
    }

    let (num_str, unit) = if s.ends_with("ms") {
        (&s[..s.len() - 2], "ms")
    } else {
        (&s[..s.len() - 1], &s[s.len() - 1..])
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let secs = |factor: u64| {
        num.checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| crate::Error::InvalidConfig(format!("duration out of range: {}", s)))
    };

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => secs(60)?,
        "h" => secs(3600)?,
        "d" => secs(86400)?,
        _ => {
            return Err(crate::Error::InvalidConfig(format!(
                "unknown duration unit: {}",
                unit
            )))
        }
    };

    Ok(duration)
}

/// Render a duration with the largest unit that divides it exactly.
///
/// Inverse of [`parse_duration`] for the durations it produces; used for
/// canonical condition keys, so "7d" must round-trip as "7d", not "604800s".
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis() as u64;
    const UNITS: &[(u64, &str)] = &[
        (86_400_000, "d"),
        (3_600_000, "h"),
        (60_000, "m"),
        (1_000, "s"),
    ];
    for &(unit_ms, suffix) in UNITS {
        if ms >= unit_ms && ms % unit_ms == 0 {
            return format!("{}{}", ms / unit_ms, suffix);
        }
    }
    format!("{}ms", ms)
}

/// Parse a byte-size string (e.g., "100", "512kb", "5gb", "1tb")
pub fn parse_size(s: &str) -> crate::Result<u64> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty size".into()));
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("tb") {
        (n, 1u64 << 40)
    } else if let Some(n) = s.strip_suffix("gb") {
        (n, 1u64 << 30)
    } else if let Some(n) = s.strip_suffix("mb") {
        (n, 1u64 << 20)
    } else if let Some(n) = s.strip_suffix("kb") {
        (n, 1u64 << 10)
    } else if let Some(n) = s.strip_suffix('b') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid size: {}", s)))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| crate::Error::InvalidConfig(format!("size out of range: {}", s)))
}

/// Render a byte count with the largest unit that divides it exactly.
///
/// Inverse of [`parse_size`]; canonical condition keys depend on this
/// round-tripping ("5gb" stays "5gb").
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1 << 40, "tb"),
        (1 << 30, "gb"),
        (1 << 20, "mb"),
        (1 << 10, "kb"),
    ];
    for &(unit, suffix) in UNITS {
        if bytes >= unit && bytes % unit == 0 {
            return format!("{}{}", bytes / unit, suffix);
        }
    }
    format!("{}b", bytes)
}

/// Get current Unix timestamp (milliseconds)
pub fn timestamp_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("7w").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn test_parse_duration_overflow_is_an_error() {
        // Would exceed u64 seconds when scaled to days
        let err = parse_duration("999999999999999999d").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
        assert!(parse_duration("18446744073709551615h").is_err());
    }

    #[test]
    fn test_format_duration_round_trips() {
        for s in ["7d", "36h", "90m", "45s", "250ms"] {
            assert_eq!(format_duration(parse_duration(s).unwrap()), s);
        }
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("100b").unwrap(), 100);
        assert_eq!(parse_size("512kb").unwrap(), 512 * 1024);
        assert_eq!(parse_size("5gb").unwrap(), 5 << 30);
        assert!(parse_size("").is_err());
        assert!(parse_size("5xb").is_err());
    }

    #[test]
    fn test_parse_size_overflow_is_an_error() {
        // 20000000tb does not fit in u64 bytes
        let err = parse_size("20000000tb").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
        assert!(parse_size("18446744073709551615kb").is_err());
        // Largest representable value still parses
        assert_eq!(parse_size("18446744073709551615b").unwrap(), u64::MAX);
    }

    #[test]
    fn test_format_size_round_trips() {
        for s in ["5gb", "512kb", "1tb", "100mb", "37b"] {
            assert_eq!(format_size(parse_size(s).unwrap()), s);
        }
        // Not unit-aligned: stays in bytes
        assert_eq!(format_size((5 << 30) + 1), format!("{}b", (5u64 << 30) + 1));
    }
}
