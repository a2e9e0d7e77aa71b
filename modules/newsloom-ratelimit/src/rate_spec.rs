//! Rate-spec parsing: `"60/min"` -> `(60, 60s)` etc.

use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateSpecError {
    #[error("invalid rate spec: {0}")]
    Invalid(String),
}

/// Parse a `"N/unit"` rate spec, where unit is `sec`, `min`, or `hour`.
pub fn parse_rate_spec(spec: &str) -> Result<(u64, Duration), RateSpecError> {
    let (count_str, unit) = spec
        .split_once('/')
        .ok_or_else(|| RateSpecError::Invalid(spec.to_string()))?;

    let count: u64 = count_str
        .trim()
        .parse()
        .map_err(|_| RateSpecError::Invalid(spec.to_string()))?;

    let period = match unit.trim() {
        "sec" | "second" | "seconds" => Duration::from_secs(1),
        "min" | "minute" | "minutes" => Duration::from_secs(60),
        "hour" | "hours" => Duration::from_secs(3600),
        _ => return Err(RateSpecError::Invalid(spec.to_string())),
    };

    Ok((count, period))
}

/// Render a parsed rate spec back into its canonical string form.
pub fn format_rate_spec(count: u64, period: Duration) -> String {
    let unit = match period.as_secs() {
        1 => "sec",
        60 => "min",
        3600 => "hour",
        other => return format!("{count}/{other}s"),
    };
    format!("{count}/{unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_parses_per_minute() {
        assert_eq!(parse_rate_spec("60/min").unwrap(), (60, Duration::from_secs(60)));
    }

    #[test]
    fn s3_parses_per_hour() {
        assert_eq!(parse_rate_spec("5000/hour").unwrap(), (5000, Duration::from_secs(3600)));
    }

    #[test]
    fn s3_unknown_unit_errors() {
        assert!(parse_rate_spec("10/unknown").is_err());
    }

    #[test]
    fn parses_per_second() {
        assert_eq!(parse_rate_spec("10/sec").unwrap(), (10, Duration::from_secs(1)));
    }

    #[test]
    fn missing_slash_errors() {
        assert!(parse_rate_spec("60min").is_err());
    }

    #[test]
    fn non_numeric_count_errors() {
        assert!(parse_rate_spec("abc/min").is_err());
    }

    #[test]
    fn round_trip_min() {
        assert_eq!(format_rate_spec(60, Duration::from_secs(60)), "60/min");
        assert_eq!(parse_rate_spec(&format_rate_spec(60, Duration::from_secs(60))).unwrap(), (60, Duration::from_secs(60)));
    }

    #[test]
    fn round_trip_hour() {
        let s = "5000/hour";
        let (c, p) = parse_rate_spec(s).unwrap();
        assert_eq!(format_rate_spec(c, p), s);
    }

    #[test]
    fn round_trip_sec() {
        let s = "10/sec";
        let (c, p) = parse_rate_spec(s).unwrap();
        assert_eq!(format_rate_spec(c, p), s);
    }
}
