use regex::Regex;
use serde_json::Value;

struct Formats {
    hh_mm_ss: Regex,
    mm_ss: Regex,
    units: Regex,
    seconds: Regex,
}

lazy_static::lazy_static! {
    static ref FORMATS: Formats = Formats {
        hh_mm_ss: Regex::new(r"^(\d\d):(\d\d):(\d\d)$").expect("hh:mm:ss regex is valid"),
        mm_ss: Regex::new(r"^(\d\d):(\d\d)$").expect("mm:ss regex is valid"),
        units: Regex::new(r"^(\d\d?)h(\d\d?)m(\d\d?)s$").expect("0h0m0s regex is valid"),
        seconds: Regex::new(r"^(\d+)$").expect("seconds regex is valid"),
    };
}

fn to_seconds(hours: &str, minutes: &str, seconds: &str) -> Option<u64> {
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Seconds for `HH:MM:SS`, `MM:SS`, `0h0m0s` or a bare number of seconds.
pub fn parse(text: &str) -> Option<u64> {
    let f = &*FORMATS;

    if let Some(c) = f.hh_mm_ss.captures(text) {
        return to_seconds(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = f.mm_ss.captures(text) {
        return to_seconds("0", &c[1], &c[2]);
    }
    if let Some(c) = f.units.captures(text) {
        return to_seconds(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = f.seconds.captures(text) {
        return c[1].parse().ok();
    }
    None
}

/// Descriptors write durations either as JSON numbers or as strings.
pub fn from_json(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse("01:02:03"), Some(3723));
        assert_eq!(parse("12:34"), Some(754));
        assert_eq!(parse("1h2m3s"), Some(3723));
        assert_eq!(parse("01h00m05s"), Some(3605));
        assert_eq!(parse("95"), Some(95));
    }

    #[test]
    fn test_parse_rejects_partial_codes() {
        assert_eq!(parse("00:"), None);
        assert_eq!(parse("1:02:03"), None);
        assert_eq!(parse("1h2m"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(from_json(&json!(42)), Some(42));
        assert_eq!(from_json(&json!("00:01:00")), Some(60));
        assert_eq!(from_json(&json!(-1)), None);
        assert_eq!(from_json(&json!(null)), None);
    }
}
