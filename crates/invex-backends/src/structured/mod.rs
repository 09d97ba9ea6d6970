//! Structured document-analysis backend adapter.
//!
//! The service exposes a submit/poll protocol: submitting the document
//! returns an operation handle in the `operation-location` header, which is
//! then polled until the analysis succeeds or fails. Polling is bounded by
//! the configured timeout and cancellable by dropping the future.

pub mod wire;

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info};

use invex_core::backend::ExtractionBackend;
use invex_core::config::StructuredConfig;
use invex_core::document::Document;
use invex_core::error::ExtractError;
use invex_core::normalize::normalize;
use invex_core::record::{ExtractionResult, InvoiceRecord, collect_line_items};

use wire::{AnalyzeResult, OperationState, OperationStatus};

/// Name used in logs and error messages.
pub const BACKEND_NAME: &str = "structured";

/// Client for the structured extraction service.
pub struct StructuredClient {
    http: reqwest::Client,
    config: StructuredConfig,
}

impl StructuredClient {
    /// Build a client over the given settings. Credentials are checked on
    /// each extraction, before any network traffic.
    pub fn new(config: StructuredConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), ExtractError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ExtractError::Unavailable {
                backend: BACKEND_NAME,
                reason: "endpoint is not set".to_string(),
            })?;
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExtractError::Unavailable {
                backend: BACKEND_NAME,
                reason: "API key is not set".to_string(),
            })?;
        Ok((endpoint, key))
    }

    /// Submit the document for analysis and return the operation URL to
    /// poll.
    pub async fn submit(&self, document: &Document) -> Result<String, ExtractError> {
        let (endpoint, key) = self.credentials()?;
        let url = format!(
            "{}/document-models/{}:analyze",
            endpoint.trim_end_matches('/'),
            self.config.model_id,
        );
        debug!(model = %self.config.model_id, "submitting document for analysis");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", key)
            .header(reqwest::header::CONTENT_TYPE, document.kind().mime())
            .body(document.bytes().to_vec())
            .send()
            .await
            .map_err(|e| backend_error(format!("submit failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(backend_error(format!("submit returned {status}: {body}")));
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| backend_error("submit response had no operation-location".to_string()))
    }

    /// Fetch the current state of a submitted operation.
    pub async fn poll(&self, operation_url: &str) -> Result<Value, ExtractError> {
        let (_, key) = self.credentials()?;

        let response = self
            .http
            .get(operation_url)
            .header("x-api-key", key)
            .send()
            .await
            .map_err(|e| backend_error(format!("poll failed: {e}")))?;

        if !response.status().is_success() {
            return Err(backend_error(format!(
                "poll returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| backend_error(format!("poll body was not JSON: {e}")))
    }

    /// Poll until the operation settles, respecting the configured bound.
    ///
    /// Returns the verbatim final body alongside the parsed analysis so
    /// the caller can keep the raw form for audit display.
    async fn wait_for_result(
        &self,
        operation_url: &str,
    ) -> Result<(Value, AnalyzeResult), ExtractError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.poll_timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            let body = self.poll(operation_url).await?;
            let status: OperationStatus = serde_json::from_value(body.clone())
                .map_err(|e| backend_error(format!("unrecognized poll body: {e}")))?;

            match status.status {
                OperationState::Succeeded => {
                    let analysis = status.result.ok_or_else(|| {
                        backend_error("succeeded operation carried no result".to_string())
                    })?;
                    return Ok((body, analysis));
                }
                OperationState::Failed => {
                    let reason = status
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "analysis failed".to_string());
                    return Err(backend_error(reason));
                }
                OperationState::NotStarted | OperationState::Running => {
                    if Instant::now() + interval > deadline {
                        return Err(ExtractError::Timeout {
                            backend: BACKEND_NAME,
                            seconds: self.config.poll_timeout_secs,
                        });
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

fn backend_error(reason: String) -> ExtractError {
    ExtractError::Backend {
        backend: BACKEND_NAME,
        reason,
    }
}

/// Flatten the service's tagged fields into the canonical record.
///
/// `Items` feeds the line-item collector and is excluded from the flat
/// mapping; every other field keeps its backend-assigned name. Only the
/// first detected document is read.
fn record_from_analysis(analysis: AnalyzeResult) -> Result<InvoiceRecord, ExtractError> {
    let Some(document) = analysis.documents.into_iter().next() else {
        return Err(ExtractError::NoDocumentDetected);
    };

    let mut record = InvoiceRecord::new();
    for (name, payload) in document.fields {
        let value = payload.into_value();
        if name == "Items" {
            record.line_items = collect_line_items(value.as_ref());
        } else {
            record.fields.insert(name, normalize(value.as_ref()));
        }
    }
    Ok(record)
}

impl ExtractionBackend for StructuredClient {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        self.credentials()?;

        let operation_url = self.submit(document).await?;
        let (raw_debug, analysis) = self.wait_for_result(&operation_url).await?;

        let record = record_from_analysis(analysis)?;
        info!(
            fields = record.fields.len(),
            line_items = record.line_items.len(),
            "structured analysis complete"
        );

        Ok(ExtractionResult { record, raw_debug })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn analysis(value: serde_json::Value) -> AnalyzeResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn analysis_maps_fields_and_diverts_items() {
        let record = record_from_analysis(analysis(json!({
            "documents": [{
                "fields": {
                    "InvoiceId": {"valueString": "INV-001", "content": "INV-001"},
                    "VendorName": {"valueString": "Acme"},
                    "Items": {"valueArray": [
                        {"valueObject": {
                            "Description": {"valueString": "Widget"},
                            "Quantity": {"valueNumber": 3}
                        }}
                    ]}
                }
            }]
        })))
        .unwrap();

        assert_eq!(record.get("InvoiceId"), Some("INV-001"));
        assert_eq!(record.get("VendorName"), Some("Acme"));
        assert!(!record.fields.contains_key("Items"));
        assert_eq!(record.line_items.len(), 1);
        let item = &record.line_items[0];
        assert_eq!(item.description.as_deref(), Some("Widget"));
        assert_eq!(item.quantity.as_deref(), Some("3"));
        assert_eq!(item.unit, None);
    }

    #[test]
    fn open_field_set_keeps_backend_assigned_names() {
        let record = record_from_analysis(analysis(json!({
            "documents": [{
                "fields": {
                    "RemittanceAddress": {"valueAddress": {"city": "Springfield"}},
                    "TotalDiscount": {"valueCurrency": {"amount": 5, "currencySymbol": "$"}}
                }
            }]
        })))
        .unwrap();

        assert_eq!(record.get("RemittanceAddress"), Some("Springfield"));
        assert_eq!(record.get("TotalDiscount"), Some("$5"));
    }

    #[test]
    fn zero_documents_is_no_document_detected() {
        let err = record_from_analysis(analysis(json!({"documents": []}))).unwrap_err();
        assert!(matches!(err, ExtractError::NoDocumentDetected));
    }

    #[test]
    fn detected_but_empty_fields_stay_absent_in_the_record() {
        let record = record_from_analysis(analysis(json!({
            "documents": [{
                "fields": {"PurchaseOrder": {}}
            }]
        })))
        .unwrap();

        assert!(record.fields.contains_key("PurchaseOrder"));
        assert_eq!(record.get("PurchaseOrder"), None);
    }

    #[tokio::test]
    async fn missing_configuration_fails_eagerly() {
        let client = StructuredClient::new(StructuredConfig::default());
        let document =
            Document::from_bytes(b"\x89PNG\r\n\x1a\npixels".to_vec(), None).unwrap();

        let err = client.extract(&document).await.unwrap_err();
        assert!(matches!(err, ExtractError::Unavailable { .. }));
    }
}
