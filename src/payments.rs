//! Stripe checkout over the REST API.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum PaymentError{
    #[error("payment request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payment response: {0}")]
    Response(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError{
    #[error("Invalid Stripe-Signature header")]
    Header,
    #[error("Invalid signature hex")]
    Hex,
    #[error("Webhook signature mismatch")]
    Mismatch,
    #[error("Webhook timestamp too old")]
    Expired,
}

pub struct Stripe{
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    price_id: String,
    app_url: String,
}

/// Ids attached to the checkout session so the webhook can find the enrollment.
pub struct CheckoutRefs{
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrollment_id: Uuid,
}

impl Stripe {
    /// `api_base` is the REST root, normally `https://api.stripe.com/v1`.
    pub fn new(api_base: String, secret_key: String, price_id: String, app_url: String) -> Self {
        let api_base = api_base.trim_end_matches('/').to_string();
        Stripe { http: reqwest::Client::new(), api_base, secret_key, price_id, app_url }
    }

    pub async fn create_customer(&self, email: &str, name: &str, user_id: Uuid) -> Result<String, PaymentError> {
        let user_id = user_id.to_string();
        let resp: serde_json::Value = self
            .http
            .post(format!("{}/customers", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("email", email), ("name", name), ("metadata[userId]", user_id.as_str())])
            .send()
            .await?
            .json()
            .await?;

        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PaymentError::Response(format!("create customer: {resp}")))
    }

    /// One-off payment session; returns the hosted checkout URL.
    pub async fn create_checkout_session(&self, customer_id: &str, refs: &CheckoutRefs) -> Result<String, PaymentError> {
        let success_url = format!("{}/payment/success", self.app_url);
        let cancel_url = format!("{}/payment/cancel", self.app_url);
        let user_id = refs.user_id.to_string();
        let course_id = refs.course_id.to_string();
        let enrollment_id = refs.enrollment_id.to_string();

        let resp: serde_json::Value = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("customer", customer_id),
                ("mode", "payment"),
                ("line_items[0][price]", self.price_id.as_str()),
                ("line_items[0][quantity]", "1"),
                ("success_url", success_url.as_str()),
                ("cancel_url", cancel_url.as_str()),
                ("metadata[userId]", user_id.as_str()),
                ("metadata[courseId]", course_id.as_str()),
                ("metadata[enrollmentId]", enrollment_id.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        resp["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PaymentError::Response(format!("create checkout: {resp}")))
    }
}

/// Checks a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against the raw body.
/// During secret rotation the header carries several `v1` entries; any one may match.
pub fn verify_webhook_signature(payload: &[u8], sig_header: &str, secret: &str, now: i64) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(SignatureError::Header);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Header)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let decoded: Vec<Vec<u8>> = signatures.iter().filter_map(|s| hex::decode(s).ok()).collect();
    if decoded.is_empty() {
        return Err(SignatureError::Hex);
    }
    if !decoded.iter().any(|sig| mac.clone().verify_slice(sig).is_ok()) {
        return Err(SignatureError::Mismatch);
    }

    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Header)?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent{
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData{
    pub object: SessionObject,
}

#[derive(Debug, Deserialize)]
pub struct SessionObject{
    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionMetadata{
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: Option<Uuid>,
}
