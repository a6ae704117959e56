//! Payment gateway collaborator
//!
//! The gateway is reached through one narrow trait; the raw wire shapes it
//! returns are normalized into internal structs right here at the boundary
//! (one adapter, not fallback chains scattered through handlers). The HTTP
//! implementation is bounded by the configured timeout: a hung gateway
//! surfaces as an error, never as a hung request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::order::status::PaymentStatus;

/// Gateway errors; all of them map to `AppError::Upstream` at the edge
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network failure, timeout, non-2xx status
    #[error("Gateway request failed: {0}")]
    Request(String),

    /// The gateway answered but rejected the request
    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    /// 2xx answer that does not parse into the expected shape
    #[error("Gateway response malformed: {0}")]
    Malformed(String),
}

/// Invoice creation input. The amount is always the server-computed total
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub amount: f64,
    pub currency: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub callback_url: String,
    pub error_url: String,
    /// Opaque order reference echoed back in callbacks
    pub reference: String,
}

/// Normalized invoice-creation result
#[derive(Debug, Clone)]
pub struct InvoiceCreated {
    pub invoice_id: String,
    pub payment_url: String,
}

/// Which external key a status lookup uses
///
/// 回调报文的形状不稳定：有时带 payment id，有时那个字段其实是
/// invoice id。对账因此要按两种 key 各试一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKey {
    PaymentId,
    InvoiceId,
}

impl LookupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKey::PaymentId => "PaymentId",
            LookupKey::InvoiceId => "InvoiceId",
        }
    }
}

/// Normalized payment-status result
#[derive(Debug, Clone)]
pub struct GatewayPaymentStatus {
    pub invoice_id: String,
    /// The gateway's status vocabulary, verbatim; see [`normalize_invoice_status`]
    pub raw_status: String,
}

/// Map the gateway's status vocabulary into ours
///
/// Fail closed: anything that is not a definite "Paid", including unknown
/// or garbled strings, becomes `failed`, never a silent `unpaid`.
pub fn normalize_invoice_status(raw: &str) -> PaymentStatus {
    if raw == "Paid" {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    }
}

/// The payment gateway collaborator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an invoice and return its id plus the hosted payment URL
    async fn create_invoice(&self, req: CreateInvoice) -> Result<InvoiceCreated, GatewayError>;

    /// Look up the status of a payment or invoice
    async fn payment_status(
        &self,
        key: &str,
        key_type: LookupKey,
    ) -> Result<GatewayPaymentStatus, GatewayError>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// Raw wire shapes, version 2 of the gateway API
///
/// PascalCase envelope `{IsSuccess, Message, Data}`; `InvoiceId` arrives as
/// a number on creation and as a string in some status payloads.
mod raw {
    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ExecutePaymentRequest {
        pub invoice_value: f64,
        pub display_currency_iso: String,
        pub customer_name: String,
        pub customer_mobile: String,
        pub customer_reference: String,
        pub call_back_url: String,
        pub error_url: String,
        pub language: String,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct GetPaymentStatusRequest {
        pub key: String,
        pub key_type: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Envelope<T> {
        #[serde(rename = "IsSuccess")]
        pub is_success: bool,
        #[serde(rename = "Message", default)]
        pub message: Option<String>,
        #[serde(rename = "Data")]
        pub data: Option<T>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ExecutePaymentData {
        #[serde(rename = "InvoiceId", deserialize_with = "string_or_number")]
        pub invoice_id: String,
        #[serde(rename = "PaymentURL")]
        pub payment_url: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct PaymentStatusData {
        #[serde(rename = "InvoiceId", deserialize_with = "string_or_number", default)]
        pub invoice_id: String,
        #[serde(rename = "InvoiceStatus", default)]
        pub invoice_status: String,
    }

    /// Accept both `123` and `"123"`; the gateway is not consistent
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Null => Ok(String::new()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number, got {other}"
            ))),
        }
    }
}

/// reqwest-backed gateway client
pub struct HttpPaymentGateway {
    base_url: String,
    api_token: String,
    currency: String,
    client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        currency: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Request(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            currency: currency.into(),
            client,
        })
    }

    async fn post_json<Req: Serialize, Data: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Data, GatewayError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Request(format!("{} - {}", status, text)));
        }

        let envelope: raw::Envelope<Data> = resp
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        if !envelope.is_success {
            let msg = envelope.message.unwrap_or_else(|| "unknown error".to_string());
            return Err(GatewayError::Rejected(msg));
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::Malformed("missing Data in response".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_invoice(&self, req: CreateInvoice) -> Result<InvoiceCreated, GatewayError> {
        let body = raw::ExecutePaymentRequest {
            invoice_value: req.amount,
            display_currency_iso: if req.currency.is_empty() {
                self.currency.clone()
            } else {
                req.currency
            },
            customer_name: req.customer_name,
            customer_mobile: req.customer_phone,
            customer_reference: req.reference,
            call_back_url: req.callback_url,
            error_url: req.error_url,
            language: "en".to_string(),
        };

        let data: raw::ExecutePaymentData = self.post_json("/v2/ExecutePayment", &body).await?;
        Ok(InvoiceCreated {
            invoice_id: data.invoice_id,
            payment_url: data.payment_url,
        })
    }

    async fn payment_status(
        &self,
        key: &str,
        key_type: LookupKey,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        let body = raw::GetPaymentStatusRequest {
            key: key.to_string(),
            key_type: key_type.as_str().to_string(),
        };

        let data: raw::PaymentStatusData = self.post_json("/v2/GetPaymentStatus", &body).await?;
        Ok(GatewayPaymentStatus {
            invoice_id: data.invoice_id,
            raw_status: data.invoice_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalization_fails_closed() {
        assert_eq!(normalize_invoice_status("Paid"), PaymentStatus::Paid);
        assert_eq!(normalize_invoice_status("Failed"), PaymentStatus::Failed);
        assert_eq!(normalize_invoice_status("Expired"), PaymentStatus::Failed);
        assert_eq!(normalize_invoice_status("Pending"), PaymentStatus::Failed);
        assert_eq!(normalize_invoice_status(""), PaymentStatus::Failed);
        assert_eq!(normalize_invoice_status("P@!d???"), PaymentStatus::Failed);
        // Case-sensitive on purpose: only the documented literal counts
        assert_eq!(normalize_invoice_status("paid"), PaymentStatus::Failed);
    }

    #[test]
    fn envelope_parses_numeric_and_string_invoice_ids() {
        let json = r#"{"IsSuccess": true, "Data": {"InvoiceId": 914000, "PaymentURL": "https://pay.example/x"}}"#;
        let env: raw::Envelope<raw::ExecutePaymentData> = serde_json::from_str(json).unwrap();
        assert_eq!(env.data.unwrap().invoice_id, "914000");

        let json = r#"{"IsSuccess": true, "Data": {"InvoiceId": "914001", "InvoiceStatus": "Paid"}}"#;
        let env: raw::Envelope<raw::PaymentStatusData> = serde_json::from_str(json).unwrap();
        let data = env.data.unwrap();
        assert_eq!(data.invoice_id, "914001");
        assert_eq!(data.invoice_status, "Paid");
    }

    #[test]
    fn rejected_envelope_carries_message() {
        let json = r#"{"IsSuccess": false, "Message": "Invalid token"}"#;
        let env: raw::Envelope<raw::ExecutePaymentData> = serde_json::from_str(json).unwrap();
        assert!(!env.is_success);
        assert_eq!(env.message.as_deref(), Some("Invalid token"));
        assert!(env.data.is_none());
    }
}

// =============================================================================
// Test double
// =============================================================================

/// Scriptable in-process gateway for the workflow tests
#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Responses are queued per call; every invocation is recorded so tests
    /// can assert on the lookup order (payment id first, invoice id second).
    #[derive(Default)]
    pub struct MockGateway {
        create_responses: Mutex<VecDeque<Result<InvoiceCreated, GatewayError>>>,
        status_responses: Mutex<VecDeque<Result<GatewayPaymentStatus, GatewayError>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_create(&self, result: Result<InvoiceCreated, GatewayError>) {
            self.create_responses.lock().unwrap().push_back(result);
        }

        pub fn push_status(&self, result: Result<GatewayPaymentStatus, GatewayError>) {
            self.status_responses.lock().unwrap().push_back(result);
        }

        pub fn recorded_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_invoice(
            &self,
            req: CreateInvoice,
        ) -> Result<InvoiceCreated, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create:{}:{:.2}", req.reference, req.amount));
            self.create_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Request("no scripted response".into())))
        }

        async fn payment_status(
            &self,
            key: &str,
            key_type: LookupKey,
        ) -> Result<GatewayPaymentStatus, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("status:{}:{}", key_type.as_str(), key));
            self.status_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Request("no scripted response".into())))
        }
    }
}
