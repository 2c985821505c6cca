use crate::metrics::APPLICATION_LABEL;
use std::collections::HashMap;
use std::time::Duration;

/// Parses `key1=value1,key2=value2` into constant labels.
///
/// Label names are checked once more when descriptors are built; this only
/// rejects input that cannot be split into pairs.
pub fn parse_const_labels(input: &str) -> Result<HashMap<String, String>, String> {
    let mut labels = HashMap::new();

    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(format!("const label {entry:?} must be in key=value form"));
        };
        let key = key.trim();
        if !is_valid_label_name(key) {
            return Err(format!("invalid const label name {key:?}"));
        }
        if key == APPLICATION_LABEL {
            return Err(format!(
                "const label {key:?} is reserved for per-application metrics"
            ));
        }
        labels.insert(key.to_string(), value.trim().to_string());
    }

    Ok(labels)
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parses `250ms`, `5s`, `1m` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {input:?}"))?;

    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "" | "s" => Duration::from_secs(value),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration {input:?} is too large"))?,
        _ => return Err(format!("unknown duration unit {unit:?} in {input:?}")),
    };

    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}
