use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render an amount of rupees the way shoppers expect to read it, using the
/// Indian digit grouping (e.g. `₹1,23,456.5`).
///
/// At most three fractional digits are kept and trailing zeroes are dropped.
pub fn format_price(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("₹{}", amount);
    }

    let rounded = (amount.abs() * 1000.0).round() / 1000.0;
    let formatted = format!("{:.3}", rounded);
    let (whole, fraction) =
        formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut buffer = String::from("₹");
    if amount < 0.0 && rounded != 0.0 {
        buffer.push('-');
    }
    buffer.push_str(&group_indian(whole));
    if !fraction.is_empty() {
        buffer.push('.');
        buffer.push_str(fraction);
    }

    buffer
}

/// The last three digits form one group, everything before that is grouped
/// in pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (mut rest, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();

    while rest.len() > 2 {
        let (head, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = head;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Deserialize a string field, falling back to an empty string when the
/// backend sent `null` or something that isn't a string at all.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Like [`lenient_string()`], but keeps the "missing" case distinct.
pub(crate) fn lenient_optional_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}
