//! Wire types for the structured document-analysis service.
//!
//! The service tags every field with at most one typed slot. Conversion
//! probes the slots in a fixed order and yields the explicit
//! [`ExtractedValue`] union, so a new wire tag shows up as a gap here
//! instead of an attribute probe at a call site.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use invex_core::value::{AddressParts, CurrencyValue, ExtractedValue, ScalarValue};

/// Body returned while an analysis operation is in flight or finished.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub status: OperationState,
    #[serde(default)]
    pub result: Option<AnalyzeResult>,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

/// Lifecycle states of a submitted analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// Service-reported failure detail.
#[derive(Debug, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// The completed analysis payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub documents: Vec<AnalyzedDocument>,
}

/// One detected document with its tagged fields.
#[derive(Debug, Deserialize)]
pub struct AnalyzedDocument {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldPayload>,
}

/// A tagged field as serialized by the service.
///
/// At most one `value*` slot is populated; `content` carries the raw text
/// the field was read from.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPayload {
    #[serde(default)]
    pub value_string: Option<String>,
    #[serde(default)]
    pub value_number: Option<Decimal>,
    #[serde(default)]
    pub value_date: Option<NaiveDate>,
    #[serde(default)]
    pub value_phone_number: Option<String>,
    #[serde(default)]
    pub value_address: Option<AddressPayload>,
    #[serde(default)]
    pub value_currency: Option<CurrencyPayload>,
    #[serde(default)]
    pub value_array: Option<Vec<FieldPayload>>,
    #[serde(default)]
    pub value_object: Option<BTreeMap<String, FieldPayload>>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Address sub-parts on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_region: Option<String>,
}

/// Currency on the wire. The service may report a display symbol, an ISO
/// code, or both.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPayload {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

impl FieldPayload {
    /// Convert the wire field into the tagged union, or absent when no
    /// slot is populated and there is no raw content to fall back to.
    pub fn into_value(self) -> Option<ExtractedValue> {
        if let Some(addr) = self.value_address {
            return Some(ExtractedValue::Address(AddressParts {
                house_number: addr.house_number,
                road: addr.road,
                city: addr.city,
                state: addr.state,
                postal_code: addr.postal_code,
                country_region: addr.country_region,
            }));
        }
        if let Some(cur) = self.value_currency {
            return Some(ExtractedValue::Currency(CurrencyValue {
                amount: cur.amount,
                symbol: cur.currency_symbol.or(cur.currency_code),
            }));
        }
        if let Some(digits) = self.value_phone_number {
            return Some(ExtractedValue::PhoneNumber(digits));
        }
        if let Some(items) = self.value_array {
            return Some(ExtractedValue::Array(
                items.into_iter().map(FieldPayload::into_value).collect(),
            ));
        }
        if let Some(entries) = self.value_object {
            return Some(ExtractedValue::Object(
                entries
                    .into_iter()
                    .map(|(name, field)| (name, field.into_value()))
                    .collect(),
            ));
        }
        if let Some(text) = self.value_string {
            return Some(ExtractedValue::Scalar(ScalarValue::Text(text)));
        }
        if let Some(number) = self.value_number {
            return Some(ExtractedValue::Scalar(ScalarValue::Number(number)));
        }
        if let Some(date) = self.value_date {
            return Some(ExtractedValue::Scalar(ScalarValue::Date(date)));
        }
        self.content.map(ExtractedValue::Raw)
    }
}
