//! Vision language-model backend adapter.
//!
//! One request per document: the first page is rendered to a raster image,
//! base64-encoded, and sent to a vision-capable model whose output is
//! constrained to a flat two-key JSON object. The reply is validated for
//! shape and reshaped into the canonical record without running through
//! the value normalizer.

pub mod payload;

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tracing::{debug, info};

use invex_core::backend::ExtractionBackend;
use invex_core::config::VisionConfig;
use invex_core::document::Document;
use invex_core::error::ExtractError;
use invex_core::pdf::render_first_page_png;
use invex_core::record::ExtractionResult;

/// Name used in logs and error messages.
pub const BACKEND_NAME: &str = "vision";

/// Instruction sent along with the page image.
const EXTRACTION_PROMPT: &str = "\
You are given a scanned invoice. Extract the invoice header fields and the \
line-item table. Use the field names InvoiceId, InvoiceDate, PurchaseOrder, \
VendorName, CustomerName, BillingAddress, ShippingAddress, SubTotal, \
TotalTax and AmountDue where the document provides them, and null for \
anything you cannot read. Amounts keep their currency symbol as printed.";

/// Client for a vision-capable language model.
pub struct VisionClient {
    http: reqwest::Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<&str, ExtractError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExtractError::Unavailable {
                backend: BACKEND_NAME,
                reason: "API key is not set".to_string(),
            })
    }

    /// Reduce the document to a single raster image for the model.
    ///
    /// Paginated containers contribute only their first page; raster
    /// inputs pass through unchanged.
    fn page_image(document: &Document) -> Result<(Vec<u8>, &'static str), ExtractError> {
        if document.kind().is_paginated() {
            let png = render_first_page_png(document.bytes())?;
            Ok((png, "image/png"))
        } else {
            Ok((document.bytes().to_vec(), document.kind().mime()))
        }
    }

    /// The JSON schema the model's output is constrained to.
    fn output_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_fields": {
                    "type": "object",
                    "additionalProperties": {"type": ["string", "null"]}
                },
                "line_items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "Description": {"type": ["string", "null"]},
                            "Quantity": {"type": ["string", "null"]},
                            "Unit": {"type": ["string", "null"]},
                            "UnitPrice": {"type": ["string", "null"]},
                            "ProductCode": {"type": ["string", "null"]},
                            "Tax": {"type": ["string", "null"]},
                            "Amount": {"type": ["string", "null"]}
                        },
                        "additionalProperties": false
                    }
                }
            },
            "required": ["invoice_fields", "line_items"],
            "additionalProperties": false
        })
    }
}

impl ExtractionBackend for VisionClient {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        let key = self.api_key()?;

        let (image, mime) = Self::page_image(document)?;
        let data_uri = format!("data:{mime};base64,{}", BASE64.encode(&image));
        debug!(mime, bytes = image.len(), "sending page image to vision model");

        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": EXTRACTION_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_uri}}
                ]
            }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "invoice_extraction",
                    "strict": true,
                    "schema": Self::output_schema()
                }
            }
        });

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| backend_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(backend_error(format!("model returned {status}: {text}")));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| backend_error(format!("response body was not JSON: {e}")))?;

        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExtractError::MalformedOutput("response carried no message content".to_string())
            })?;

        let parsed: Value = serde_json::from_str(content)
            .map_err(|e| ExtractError::MalformedOutput(format!("content was not valid JSON: {e}")))?;

        let record = payload::record_from_payload(&parsed)?;
        info!(
            fields = record.fields.len(),
            line_items = record.line_items.len(),
            "vision extraction complete"
        );

        Ok(ExtractionResult {
            record,
            raw_debug: parsed,
        })
    }
}

fn backend_error(reason: String) -> ExtractError {
    ExtractError::Backend {
        backend: BACKEND_NAME,
        reason,
    }
}
