//! Tagged extraction values produced by the structured backend.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A value extracted for a single document field.
///
/// Exactly one variant is populated per value. A field that was detected but
/// carries no usable payload is represented as `None` wherever a value may
/// appear: at the top level, as an array element, or as an object entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedValue {
    /// A postal address broken into sub-parts.
    Address(AddressParts),
    /// A monetary amount with an optional currency symbol or code.
    Currency(CurrencyValue),
    /// A phone number, already reduced to its digit string.
    PhoneNumber(String),
    /// An ordered sequence of nested values.
    Array(Vec<Option<ExtractedValue>>),
    /// Named nested values.
    Object(BTreeMap<String, Option<ExtractedValue>>),
    /// A plain scalar: string, number, or date.
    Scalar(ScalarValue),
    /// The backend's raw text for the field when no typed slot matched.
    Raw(String),
}

impl ExtractedValue {
    /// Shorthand for a string scalar.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(ScalarValue::Text(s.into()))
    }
}

/// Address sub-parts, named after the backend's vocabulary and rendered in
/// this declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressParts {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country_region: Option<String>,
}

/// A currency field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyValue {
    pub amount: Option<Decimal>,
    /// The currency symbol when the backend saw one, otherwise the ISO code.
    pub symbol: Option<String>,
}

/// Scalar payloads. Rendering keeps the backend's own serialization; no
/// locale conversion or reformatting happens downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl ScalarValue {
    /// Render the scalar verbatim.
    pub fn render(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.clone(),
            ScalarValue::Number(n) => n.to_string(),
            ScalarValue::Date(d) => d.to_string(),
        }
    }
}
