//! Recursive normalization of tagged extraction values into flat strings.

use tracing::warn;

use crate::value::ExtractedValue;

/// Values nested deeper than this normalize to absent. The wire format is
/// tree-shaped, so the cap only bounds pathological nesting depth.
const MAX_DEPTH: usize = 64;

/// Convert one tagged value into a display-ready string.
///
/// Absent input stays absent. Composite values flatten recursively:
/// addresses and arrays join with `", "`, objects render `key: value`
/// entries joined with `"; "`. An empty or all-absent array normalizes to
/// an empty string rather than absent; callers that care about the
/// difference must check for it.
pub fn normalize(value: Option<&ExtractedValue>) -> Option<String> {
    normalize_at(value, 0)
}

fn normalize_at(value: Option<&ExtractedValue>, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        warn!("value nested deeper than {MAX_DEPTH} levels, treating as absent");
        return None;
    }

    match value? {
        ExtractedValue::Address(addr) => {
            let parts: Vec<&str> = [
                addr.house_number.as_deref(),
                addr.road.as_deref(),
                addr.city.as_deref(),
                addr.state.as_deref(),
                addr.postal_code.as_deref(),
                addr.country_region.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect();
            Some(parts.join(", "))
        }
        ExtractedValue::Currency(cur) => match (&cur.amount, &cur.symbol) {
            (Some(amount), Some(symbol)) => Some(format!("{symbol}{amount}")),
            (Some(amount), None) => Some(amount.to_string()),
            (None, Some(symbol)) => Some(symbol.clone()),
            (None, None) => None,
        },
        ExtractedValue::PhoneNumber(digits) => Some(digits.clone()),
        ExtractedValue::Array(items) => {
            let rendered: Vec<String> = items
                .iter()
                .filter_map(|item| normalize_at(item.as_ref(), depth + 1))
                .collect();
            Some(rendered.join(", "))
        }
        ExtractedValue::Object(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .filter_map(|(key, value)| {
                    normalize_at(value.as_ref(), depth + 1).map(|v| format!("{key}: {v}"))
                })
                .collect();
            Some(rendered.join("; "))
        }
        ExtractedValue::Scalar(scalar) => Some(scalar.render()),
        ExtractedValue::Raw(text) => Some(text.clone()),
    }
}
