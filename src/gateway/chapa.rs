use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, error};

use super::{CheckoutRequest, GatewayError, GatewayReply, PaymentGateway, TransferRequest};
use crate::config::ChapaConfig;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);
const BANKS_KEY: &str = "banks";

/// Chapa REST client. The bank list is cached in-process for an hour.
#[derive(Clone)]
pub struct ChapaClient {
    client: reqwest::Client,
    secret_key: Option<String>,
    base_url: String,
    dev_mode: bool,
    banks: Cache<&'static str, serde_json::Value>,
}

impl ChapaClient {
    pub fn new(config: &ChapaConfig) -> Self {
        let banks = Cache::builder()
            .time_to_live(Duration::from_secs(3600))
            .max_capacity(1)
            .build();

        Self {
            client: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dev_mode: config.is_dev_mode(),
            banks,
        }
    }

    fn key(&self) -> Result<&str, GatewayError> {
        self.secret_key.as_deref().ok_or(GatewayError::MissingKey)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Chapa answers errors with a JSON envelope too; fall back to raw text.
    async fn read_reply(response: reqwest::Response) -> Result<GatewayReply, GatewayError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to read gateway response: {e}")))?;
        debug!(status = %status, "gateway response received");
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| GatewayReply::from_text(text)))
    }

    fn transport(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            error!("Chapa request failed: {e}");
            GatewayError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    async fn initialize(&self, request: &CheckoutRequest) -> Result<GatewayReply, GatewayError> {
        let key = self.key()?;
        let payload = serde_json::json!({
            "amount": request.amount.to_string(),
            "currency": request.currency,
            "email": request.email,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "tx_ref": request.tx_ref,
            "return_url": request.return_url,
            "customization": {
                "title": "SoulTalk Payment",
                "description": "Payment for SoulTalk Services",
            },
        });

        let response = self
            .client
            .post(self.url("/transaction/initialize"))
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::read_reply(response).await
    }

    async fn verify(&self, tx_ref: &str) -> Result<GatewayReply, GatewayError> {
        let key = self.key()?;
        let response = self
            .client
            .get(self.url(&format!("/transaction/verify/{tx_ref}")))
            .bearer_auth(key)
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::read_reply(response).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<GatewayReply, GatewayError> {
        let key = self.key()?;
        let payload = serde_json::json!({
            "account_name": request.account_name,
            "account_number": request.account_number,
            "amount": request.amount.to_f64(),
            "currency": request.currency,
            "reference": request.reference,
            "bank_code": request.bank_code,
        });

        let response = self
            .client
            .post(self.url("/transfer"))
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::read_reply(response).await
    }

    async fn banks(&self) -> Result<serde_json::Value, GatewayError> {
        if let Some(cached) = self.banks.get(&BANKS_KEY).await {
            return Ok(cached);
        }

        let key = self.key()?;
        let response = self
            .client
            .get(self.url("/banks"))
            .bearer_auth(key)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Invalid bank list: {e}")))?;

        if status.is_success() {
            self.banks.insert(BANKS_KEY, body.clone()).await;
        }
        Ok(body)
    }

    fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> ChapaClient {
        ChapaClient::new(&ChapaConfig {
            secret_key: Some("CHASECK-test-live".to_string()),
            base_url: base_url.to_string(),
        })
    }

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            amount: Decimal::new(50000, 2),
            currency: "ETB".into(),
            email: "client@example.com".into(),
            first_name: "Abebe".into(),
            last_name: "User".into(),
            tx_ref: "soultalk-abc".into(),
            return_url: "http://localhost:5173/payment/success?tx_ref=soultalk-abc".into(),
        }
    }

    #[tokio::test]
    async fn initialize_returns_checkout_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", "Bearer CHASECK-test-live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Hosted Link",
                "data": {"checkout_url": "https://checkout.chapa.co/abc"}
            })))
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).initialize(&checkout()).await.unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.data["checkout_url"], "https://checkout.chapa.co/abc");
    }

    #[tokio::test]
    async fn initialize_surfaces_gateway_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "failed",
                "message": "Invalid API Key"
            })))
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).initialize(&checkout()).await.unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.message_text(), "Invalid API Key");
    }

    #[tokio::test]
    async fn verify_hits_reference_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/soultalk-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "data": {"amount": "500.00"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).verify("soultalk-abc").await.unwrap();
        assert!(reply.is_success());
    }

    #[tokio::test]
    async fn non_json_body_becomes_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transfer"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let transfer = TransferRequest {
            account_name: "Pro".into(),
            account_number: "0123".into(),
            amount: Decimal::new(100, 0),
            currency: "ETB".into(),
            reference: "wd-1".into(),
            bank_code: "946".into(),
        };
        let reply = test_client(&server.uri()).transfer(&transfer).await.unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.message_text(), "Bad Gateway");
    }

    #[tokio::test]
    async fn bank_list_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/banks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Banks retrieved",
                "data": [{"id": 946, "name": "Commercial Bank of Ethiopia"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let first = client.banks().await.unwrap();
        let second = client.banks().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let client = ChapaClient::new(&ChapaConfig {
            secret_key: None,
            base_url: "http://127.0.0.1:1".into(),
        });
        assert!(client.is_dev_mode());
        assert!(matches!(
            client.initialize(&checkout()).await,
            Err(GatewayError::MissingKey)
        ));
    }
}
