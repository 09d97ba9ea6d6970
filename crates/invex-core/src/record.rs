//! Canonical invoice record and line-item collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::value::ExtractedValue;

/// Field names every renderer expects, in display order. The record's
/// field set is open beyond these.
pub const FIRST_CLASS_FIELDS: [&str; 10] = [
    "InvoiceId",
    "InvoiceDate",
    "PurchaseOrder",
    "VendorName",
    "CustomerName",
    "BillingAddress",
    "ShippingAddress",
    "SubTotal",
    "TotalTax",
    "AmountDue",
];

/// Sub-fields recognized on a line item, matching the wire names.
pub const LINE_ITEM_FIELDS: [&str; 7] = [
    "Description",
    "Quantity",
    "Unit",
    "UnitPrice",
    "ProductCode",
    "Tax",
    "Amount",
];

/// The canonical, backend-agnostic invoice record.
///
/// Every value is a flat string or absent; nesting never survives
/// normalization. Fields keep their backend-assigned names, except `Items`,
/// which becomes `line_items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Flat field mapping. `None` means the field was detected but empty.
    pub fields: BTreeMap<String, Option<String>>,

    /// The invoice's item table, in source document order.
    pub line_items: Vec<LineItem>,
}

impl InvoiceRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field, treating a missing key and a detected-but-empty
    /// field the same way.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }
}

/// One row of the invoice's item table.
///
/// Rows are never deduplicated or sorted, and a row whose fields all came
/// back empty is still kept; a detected table row with low-confidence
/// cells is information, not noise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<String>,
    pub product_code: Option<String>,
    pub tax: Option<String>,
    pub amount: Option<String>,
}

/// A finished extraction: the canonical record plus the backend's full
/// pre-normalization response, kept verbatim for audit display and never
/// parsed back.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub record: InvoiceRecord,
    pub raw_debug: serde_json::Value,
}

/// Build the ordered line-item sequence from the backend's `Items` value.
///
/// Every array element yields exactly one item, in input order; an element
/// that is absent or not an object yields an empty item rather than
/// shifting the sequence.
pub fn collect_line_items(items: Option<&ExtractedValue>) -> Vec<LineItem> {
    let Some(ExtractedValue::Array(entries)) = items else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| match entry {
            Some(ExtractedValue::Object(fields)) => LineItem {
                description: item_field(fields, "Description"),
                quantity: item_field(fields, "Quantity"),
                unit: item_field(fields, "Unit"),
                unit_price: item_field(fields, "UnitPrice"),
                product_code: item_field(fields, "ProductCode"),
                tax: item_field(fields, "Tax"),
                amount: item_field(fields, "Amount"),
            },
            _ => LineItem::default(),
        })
        .collect()
}

fn item_field(
    fields: &BTreeMap<String, Option<ExtractedValue>>,
    name: &str,
) -> Option<String> {
    normalize(fields.get(name).and_then(|v| v.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CurrencyValue;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn item_object(pairs: &[(&str, Option<ExtractedValue>)]) -> Option<ExtractedValue> {
        let fields = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Some(ExtractedValue::Object(fields))
    }

    #[test]
    fn absent_items_collect_to_an_empty_sequence() {
        assert_eq!(collect_line_items(None), Vec::new());
    }

    #[test]
    fn non_array_items_collect_to_an_empty_sequence() {
        let value = ExtractedValue::text("not a table");
        assert_eq!(collect_line_items(Some(&value)), Vec::new());
    }

    #[test]
    fn collector_preserves_order_and_count() {
        let items = ExtractedValue::Array(vec![
            item_object(&[("Description", Some(ExtractedValue::text("Widget")))]),
            None,
            item_object(&[("Description", Some(ExtractedValue::text("Bolt")))]),
        ]);
        let collected = collect_line_items(Some(&items));
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].description.as_deref(), Some("Widget"));
        assert_eq!(collected[1], LineItem::default());
        assert_eq!(collected[2].description.as_deref(), Some("Bolt"));
    }

    #[test]
    fn missing_item_fields_are_absent_not_an_error() {
        let items = ExtractedValue::Array(vec![item_object(&[
            ("Description", Some(ExtractedValue::text("Widget"))),
            ("Quantity", Some(ExtractedValue::text("3"))),
        ])]);
        let collected = collect_line_items(Some(&items));
        assert_eq!(collected.len(), 1);
        let item = &collected[0];
        assert_eq!(item.description.as_deref(), Some("Widget"));
        assert_eq!(item.quantity.as_deref(), Some("3"));
        assert_eq!(item.unit, None);
        assert_eq!(item.unit_price, None);
        assert_eq!(item.product_code, None);
        assert_eq!(item.tax, None);
        assert_eq!(item.amount, None);
    }

    #[test]
    fn item_fields_run_through_normalization() {
        let items = ExtractedValue::Array(vec![item_object(&[(
            "Amount",
            Some(ExtractedValue::Currency(CurrencyValue {
                amount: Some(Decimal::new(1050, 2)),
                symbol: Some("$".to_string()),
            })),
        )])]);
        let collected = collect_line_items(Some(&items));
        assert_eq!(collected[0].amount.as_deref(), Some("$10.50"));
    }

    #[test]
    fn an_all_empty_row_is_still_emitted() {
        let items = ExtractedValue::Array(vec![item_object(&[])]);
        let collected = collect_line_items(Some(&items));
        assert_eq!(collected, vec![LineItem::default()]);
    }

    #[test]
    fn line_items_serialize_under_wire_names() {
        let item = LineItem {
            description: Some("Widget".to_string()),
            unit_price: Some("9.99".to_string()),
            ..LineItem::default()
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["Description"], "Widget");
        assert_eq!(json["UnitPrice"], "9.99");
        assert!(json["ProductCode"].is_null());
    }

    #[test]
    fn record_get_treats_empty_and_missing_alike() {
        let mut record = InvoiceRecord::new();
        record
            .fields
            .insert("VendorName".to_string(), Some("Acme".to_string()));
        record.fields.insert("SubTotal".to_string(), None);
        assert_eq!(record.get("VendorName"), Some("Acme"));
        assert_eq!(record.get("SubTotal"), None);
        assert_eq!(record.get("AmountDue"), None);
    }
}
