pub mod chapa;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use chapa::ChapaClient;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Chapa Secret Key missing")]
    MissingKey,
    #[error("Verification timed out. Please refresh.")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

/// Envelope every gateway endpoint answers with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl GatewayReply {
    /// Wraps a body that was not JSON.
    pub fn from_text(text: String) -> Self {
        Self {
            status: None,
            message: serde_json::Value::String(text),
            data: serde_json::Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// The message as plain text; structured messages are rendered as JSON.
    pub fn message_text(&self) -> String {
        match &self.message {
            serde_json::Value::Null => "Unknown error".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tx_ref: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub account_name: String,
    pub account_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub reference: String,
    pub bank_code: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &CheckoutRequest) -> Result<GatewayReply, GatewayError>;

    async fn verify(&self, tx_ref: &str) -> Result<GatewayReply, GatewayError>;

    async fn transfer(&self, request: &TransferRequest) -> Result<GatewayReply, GatewayError>;

    /// Supported banks, as returned by the gateway.
    async fn banks(&self) -> Result<serde_json::Value, GatewayError>;

    /// Local setups confirm payments without calling out.
    fn is_dev_mode(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Success,
    /// The gateway has not settled the transaction yet, or does not know it yet.
    StillPending,
    Failed,
}

pub fn classify_verification(reply: &GatewayReply) -> VerifyOutcome {
    if reply.is_success() {
        VerifyOutcome::Success
    } else if reply.status.as_deref() == Some("pending")
        || reply.message.as_str() == Some("Payment not found")
    {
        VerifyOutcome::StillPending
    } else {
        VerifyOutcome::Failed
    }
}

/// Transfers sometimes report success only in the message. The message check
/// is a case-insensitive substring match, so "unsuccessful" also passes.
pub fn payout_succeeded(reply: &GatewayReply) -> bool {
    reply.is_success()
        || reply
            .message
            .as_str()
            .is_some_and(|m| m.to_lowercase().contains("success"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(body: serde_json::Value) -> GatewayReply {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn verification_outcomes() {
        assert_eq!(
            classify_verification(&reply(json!({"status": "success", "data": {}}))),
            VerifyOutcome::Success
        );
        assert_eq!(
            classify_verification(&reply(json!({"status": "pending"}))),
            VerifyOutcome::StillPending
        );
        assert_eq!(
            classify_verification(&reply(json!({"status": "failed", "message": "Payment not found"}))),
            VerifyOutcome::StillPending
        );
        assert_eq!(
            classify_verification(&reply(json!({"status": "failed", "message": "Invalid transaction"}))),
            VerifyOutcome::Failed
        );
    }

    #[test]
    fn payout_success_from_status_or_message() {
        assert!(payout_succeeded(&reply(json!({"status": "success"}))));
        assert!(payout_succeeded(&reply(json!({"status": "failed", "message": "Transfer Queued Successfully"}))));
        assert!(!payout_succeeded(&reply(json!({"status": "failed", "message": "Insufficient Balance"}))));
        assert!(!payout_succeeded(&reply(json!({"message": {"amount": ["invalid"]}}))));
    }

    #[test]
    fn payout_message_match_is_a_plain_substring() {
        // "unsuccessful" contains "success", so such replies count as paid
        assert!(payout_succeeded(&reply(json!({"status": "failed", "message": "Transfer unsuccessful"}))));
        assert!(payout_succeeded(&reply(json!({"message": "SUCCESS"}))));
    }

    #[test]
    fn message_text_handles_shapes() {
        assert_eq!(reply(json!({})).message_text(), "Unknown error");
        assert_eq!(reply(json!({"message": "nope"})).message_text(), "nope");
        assert_eq!(
            reply(json!({"message": {"email": ["bad"]}})).message_text(),
            r#"{"email":["bad"]}"#
        );
        assert_eq!(GatewayReply::from_text("<html>".into()).message_text(), "<html>");
    }
}
