//! Human-readable durations for the config file: "1000ms", "5s", "2m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Units accepted by [`parse_duration`], longest suffix first so that `ms`
/// is not mistaken for `s` or `m`.
const UNITS: [(&str, u64); 5] = [
    ("ms", 1),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
];

/// Parse a duration string like "1000ms", "5s", "30m", "1h".
///
/// Supported units: `ms`, `s`, `m`, `h`, `d`. The input is case-insensitive
/// and surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use mbank_history::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1000ms").unwrap(), Duration::from_millis(1000));
/// assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, factor)| s.strip_suffix(suffix).map(|num| (num, *factor)))
        .context("Duration must end with ms, s, m, h, or d")?;

    let num: u64 = num.parse().with_context(|| "Invalid number in duration")?;
    let millis = num
        .checked_mul(millis_per_unit)
        .context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Format a duration using the largest unit that divides it evenly.
///
/// # Examples
///
/// ```
/// use mbank_history::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(5)), "5s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
/// assert_eq!(format_duration(Duration::from_secs(120)), "2m");
/// ```
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }

    // Skip "ms" while looking for the coarsest unit; it is the fallback.
    for (suffix, factor) in UNITS.iter().skip(1) {
        let factor = u128::from(*factor);
        if millis % factor == 0 {
            return format!("{}{suffix}", millis / factor);
        }
    }
    format!("{millis}ms")
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Serde serializer writing durations back in the [`format_duration`] form.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
