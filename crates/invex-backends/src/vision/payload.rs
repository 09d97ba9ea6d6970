//! Shape validation for the vision model's constrained JSON output.
//!
//! The model is asked for flat scalars, so nothing here runs through the
//! value normalizer; the shape is checked defensively instead of trusted.

use std::collections::BTreeMap;

use serde_json::Value;

use invex_core::error::ExtractError;
use invex_core::record::{InvoiceRecord, LineItem};

/// Validate the model's two-key object and reshape it into the canonical
/// record.
pub fn record_from_payload(payload: &Value) -> Result<InvoiceRecord, ExtractError> {
    let root = payload
        .as_object()
        .ok_or_else(|| malformed("top level is not an object"))?;

    let fields_map = root
        .get("invoice_fields")
        .ok_or_else(|| malformed("missing invoice_fields"))?
        .as_object()
        .ok_or_else(|| malformed("invoice_fields is not an object"))?;

    let mut fields = BTreeMap::new();
    for (name, value) in fields_map {
        fields.insert(name.clone(), scalar_field(name, value)?);
    }

    let items = root
        .get("line_items")
        .ok_or_else(|| malformed("missing line_items"))?
        .as_array()
        .ok_or_else(|| malformed("line_items is not an array"))?;

    let line_items = items
        .iter()
        .map(line_item_from_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InvoiceRecord { fields, line_items })
}

/// One line-item entry: recognized keys kept, unrecognized keys dropped
/// silently, missing keys absent.
fn line_item_from_entry(entry: &Value) -> Result<LineItem, ExtractError> {
    let map = entry
        .as_object()
        .ok_or_else(|| malformed("line_items entry is not an object"))?;

    Ok(LineItem {
        description: entry_field(map, "Description")?,
        quantity: entry_field(map, "Quantity")?,
        unit: entry_field(map, "Unit")?,
        unit_price: entry_field(map, "UnitPrice")?,
        product_code: entry_field(map, "ProductCode")?,
        tax: entry_field(map, "Tax")?,
        amount: entry_field(map, "Amount")?,
    })
}

fn entry_field(
    map: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    match map.get(name) {
        None => Ok(None),
        Some(value) => scalar_field(name, value),
    }
}

/// Coerce a scalar-or-null JSON value to an optional string. Nested
/// structures are a contract violation, not something to flatten.
fn scalar_field(name: &str, value: &Value) -> Result<Option<String>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(malformed(&format!("field {name:?} is not a scalar")))
        }
    }
}

fn malformed(reason: &str) -> ExtractError {
    ExtractError::MalformedOutput(reason.to_string())
}
