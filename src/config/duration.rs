//! Human-readable durations for flags and environment variables.
//!
//! Accepts a sequence of `<number><unit>` pairs (`500ms`, `5s`, `1m30s`,
//! `2h`) or a bare number of seconds.

use std::time::Duration;

/// Parse a duration such as `5s` or `1m30s`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing unit in duration {input:?}"))?;
        if digits == 0 {
            return Err(format!("invalid duration {input:?}"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration {input:?}: {e}"))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };
        total = total.saturating_add(part);
        rest = &rest[unit_len..];
    }

    Ok(total)
}

/// Render a duration in the same syntax [`parse_duration`] accepts.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    if secs > 0 {
        out.push_str(&format!("{secs}s"));
    }
    out
}

pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_duration(*duration))
}
