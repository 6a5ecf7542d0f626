//! Payment gateway adapter: order creation over HTTPS plus the
//! HMAC-SHA256 signature check used during payment verification.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error};

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Gateway-side order: an intent to collect `amount` minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected order creation: status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("payment gateway is not configured")]
    Disabled,
}

/// Narrow contract the checkout orchestrator needs from a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a gateway order for `amount_minor` minor currency units.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Public key id handed to clients to drive the payment widget.
    fn key_id(&self) -> &str;
}

/// Razorpay Orders API client.
pub struct RazorpayGateway {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self::with_base_url(key_id, key_secret, RAZORPAY_API_BASE.to_string())
    }

    pub fn with_base_url(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
            base_url,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "gateway order creation rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = response.json().await?;
        debug!(gateway_order_id = %order.id, amount = order.amount, "gateway order created");
        Ok(order)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Stand-in used when gateway credentials are not configured; every checkout
/// fails with the generic unavailable error.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_order(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::Disabled)
    }

    fn key_id(&self) -> &str {
        ""
    }
}

/// Hex HMAC-SHA256 over `"{gateway_order_id}|{gateway_payment_id}"`.
pub fn payment_signature(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}|{}", gateway_order_id, gateway_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the supplied signature against the expected
/// one.
pub fn verify_payment_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    supplied: &str,
) -> bool {
    let expected = payment_signature(secret, gateway_order_id, gateway_payment_id);
    constant_time_eq(&expected, supplied)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_and_hex_encoded() {
        let sig = payment_signature("secret", "order_123", "pay_456");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, payment_signature("secret", "order_123", "pay_456"));
    }

    #[test]
    fn verification_accepts_the_matching_signature() {
        let sig = payment_signature("secret", "order_123", "pay_456");
        assert!(verify_payment_signature("secret", "order_123", "pay_456", &sig));
    }

    #[test]
    fn verification_rejects_tampered_inputs() {
        let sig = payment_signature("secret", "order_123", "pay_456");
        assert!(!verify_payment_signature("secret", "order_999", "pay_456", &sig));
        assert!(!verify_payment_signature("other", "order_123", "pay_456", &sig));
        assert!(!verify_payment_signature("secret", "order_123", "pay_456", "deadbeef"));
    }

    #[test]
    fn constant_time_eq_requires_equal_lengths() {
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
    }
}
