//! LiqPay hosted checkout (redirect flow)
//!
//! The adapter is pure computation: it builds the base64 envelope and its
//! signature locally, and the client submits both to the hosted checkout URL
//! as a form POST. The same signing function authenticates the
//! server-to-server callback.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::Decimal;
use serde::Serialize;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::order::{Order, OrderStatus};

use super::GatewayError;

pub const CHECKOUT_URL: &str = "https://www.liqpay.ua/api/3/checkout";

const PROTOCOL_VERSION: u8 = 3;
const SUPPORTED_LANGUAGES: [&str; 3] = ["uk", "en", "ru"];
const DEFAULT_LANGUAGE: &str = "uk";

/// What the client needs to redirect to the hosted checkout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub data: String,
    pub signature: String,
    pub checkout_url: &'static str,
}

/// Envelope serialized into the base64 `data` field
#[derive(Serialize)]
struct CheckoutPayload<'a> {
    public_key: &'a str,
    version: u8,
    action: &'static str,
    amount: Decimal,
    currency: &'a str,
    description: String,
    order_id: &'a str,
    language: &'a str,
    result_url: String,
    server_url: String,
}

#[derive(Clone)]
pub struct LiqpayGateway {
    public_key: String,
    private_key: String,
    site_origin: String,
}

impl LiqpayGateway {
    pub fn new(public_key: String, private_key: String, site_origin: String) -> Self {
        Self {
            public_key,
            private_key,
            site_origin,
        }
    }

    /// Build the payment request for an order: base64 envelope + signature +
    /// hosted checkout URL.
    pub fn create_payment_request(
        &self,
        order: &Order,
        language: Option<&str>,
    ) -> Result<CheckoutRequest, GatewayError> {
        let payload = CheckoutPayload {
            public_key: &self.public_key,
            version: PROTOCOL_VERSION,
            action: "pay",
            amount: order.total,
            currency: order.currency.code(),
            description: format!("Order {}", order.order_number),
            order_id: &order.id,
            language: normalize_language(language),
            result_url: format!("{}/checkout/result", self.site_origin),
            server_url: format!("{}/api/webhooks/liqpay", self.site_origin),
        };

        let json = serde_json::to_string(&payload)
            .map_err(|e| GatewayError::Upstream(format!("payload serialization: {e}")))?;
        let data = BASE64.encode(json);
        let signature = self.sign(&data);

        Ok(CheckoutRequest {
            data,
            signature,
            checkout_url: CHECKOUT_URL,
        })
    }

    /// `base64(sha1(private_key + data + private_key))`
    pub fn sign(&self, data: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.private_key.as_bytes());
        hasher.update(data.as_bytes());
        hasher.update(self.private_key.as_bytes());
        BASE64.encode(hasher.finalize())
    }

    /// A callback is authentic iff re-signing its `data` yields the claimed
    /// signature. Digests are compared constant-time.
    pub fn verify(&self, data: &str, signature: &str) -> bool {
        let Ok(claimed) = BASE64.decode(signature) else {
            return false;
        };
        let mut hasher = Sha1::new();
        hasher.update(self.private_key.as_bytes());
        hasher.update(data.as_bytes());
        hasher.update(self.private_key.as_bytes());
        let expected = hasher.finalize();

        expected.as_slice().ct_eq(claimed.as_slice()).into()
    }
}

/// Clamp the requested language to the supported set
pub fn normalize_language(language: Option<&str>) -> &'static str {
    match language {
        Some(lang) => SUPPORTED_LANGUAGES
            .iter()
            .find(|s| **s == lang)
            .copied()
            .unwrap_or(DEFAULT_LANGUAGE),
        None => DEFAULT_LANGUAGE,
    }
}

/// Map the provider status vocabulary onto the order lifecycle.
///
/// Anything outside the known set falls back to `pending` — never `paid`.
/// Callers log the raw string so the fallback is observable.
pub fn map_status(status: &str) -> OrderStatus {
    match status {
        // sandbox is the provider's test-mode success verdict
        "success" | "sandbox" => OrderStatus::Paid,
        "failure" | "error" => OrderStatus::Failed,
        "reversed" => OrderStatus::Refunded,
        "processing" | "wait_accept" | "wait_secure" => OrderStatus::Processing,
        _ => OrderStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Currency, Customer};
    use chrono::Utc;

    fn gateway() -> LiqpayGateway {
        LiqpayGateway::new(
            "pub_test".into(),
            "priv_test".into(),
            "https://studio.example.com".into(),
        )
    }

    fn order() -> Order {
        Order {
            id: "ord-1".into(),
            order_number: "ORD-1700000000000-1234".into(),
            items: vec![],
            subtotal: Decimal::new(200000, 2),
            total: Decimal::new(200000, 2),
            currency: Currency::Uah,
            customer: Customer {
                first_name: "Olena".into(),
                last_name: "K".into(),
                email: "olena@example.com".into(),
                phone: "+380001112233".into(),
                address: None,
                city: None,
                country: None,
                postal_code: None,
            },
            status: crate::order::OrderStatus::Pending,
            payment_provider: None,
            payment_intent_id: None,
            payment_status: None,
            paid_at: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sign_verify_round_trip() {
        let gw = gateway();
        let req = gw.create_payment_request(&order(), None).unwrap();
        assert!(gw.verify(&req.data, &req.signature));
    }

    #[test]
    fn verify_rejects_mutated_payload() {
        let gw = gateway();
        let req = gw.create_payment_request(&order(), None).unwrap();

        // Flip one character of the payload
        let mut bytes = req.data.into_bytes();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let mutated = String::from_utf8(bytes).unwrap();
        assert!(!gw.verify(&mutated, &req.signature));
    }

    #[test]
    fn verify_rejects_mutated_signature() {
        let gw = gateway();
        let req = gw.create_payment_request(&order(), None).unwrap();

        let mut bytes = req.signature.into_bytes();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let mutated = String::from_utf8(bytes).unwrap();
        assert!(!gw.verify(&req.data, &mutated));
    }

    #[test]
    fn verify_rejects_garbage_base64_signature() {
        let gw = gateway();
        let req = gw.create_payment_request(&order(), None).unwrap();
        assert!(!gw.verify(&req.data, "not base64 !!!"));
    }

    #[test]
    fn payload_carries_expected_fields() {
        let gw = gateway();
        let req = gw.create_payment_request(&order(), Some("en")).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&BASE64.decode(&req.data).unwrap()).unwrap();
        assert_eq!(json["public_key"], "pub_test");
        assert_eq!(json["version"], 3);
        assert_eq!(json["action"], "pay");
        assert_eq!(json["currency"], "UAH");
        assert_eq!(json["order_id"], "ord-1");
        assert_eq!(json["language"], "en");
        assert_eq!(
            json["result_url"],
            "https://studio.example.com/checkout/result"
        );
        assert_eq!(
            json["server_url"],
            "https://studio.example.com/api/webhooks/liqpay"
        );
        assert_eq!(req.checkout_url, CHECKOUT_URL);
    }

    #[test]
    fn language_normalization() {
        assert_eq!(normalize_language(None), "uk");
        assert_eq!(normalize_language(Some("en")), "en");
        assert_eq!(normalize_language(Some("ru")), "ru");
        assert_eq!(normalize_language(Some("fr")), "uk");
    }

    #[test]
    fn status_vocabulary() {
        assert_eq!(map_status("success"), OrderStatus::Paid);
        assert_eq!(map_status("sandbox"), OrderStatus::Paid);
        assert_eq!(map_status("failure"), OrderStatus::Failed);
        assert_eq!(map_status("error"), OrderStatus::Failed);
        assert_eq!(map_status("reversed"), OrderStatus::Refunded);
        assert_eq!(map_status("processing"), OrderStatus::Processing);
        assert_eq!(map_status("wait_accept"), OrderStatus::Processing);
        assert_eq!(map_status("wait_secure"), OrderStatus::Processing);
        // Unknown vocabulary falls back to pending, never paid
        assert_eq!(map_status("subscribed"), OrderStatus::Pending);
        assert_eq!(map_status(""), OrderStatus::Pending);
    }
}
