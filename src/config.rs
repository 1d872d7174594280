use std::time::Duration;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct Config{
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    /// Accounts signing up with one of these emails get the admin role.
    pub admin_emails: Vec<String>,
    /// Base URL the checkout returns to.
    pub app_url: String,
    /// Stripe REST root; overridable for test doubles.
    pub stripe_api_base: String,
    pub stripe_secret_key: String,
    pub stripe_price_id: String,
    pub stripe_webhook_secret: String,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{name} must be set")))
        };
        let parsed = |name: &str, default: u64| -> Result<u64, AppError> {
            match lookup(name) {
                Some(v) => v.parse().map_err(|_| AppError::Config(format!("{name} must be a number"))),
                None => Ok(default),
            }
        };

        Ok(Config{
            database_url: required("DATABASE_URL")?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".into()),
            jwt_secret: required("JWT_SECRET")?,
            admin_emails: lookup("ADMIN_EMAILS")
                .map(|list| {
                    list.split(',')
                        .map(|email| email.trim().to_lowercase())
                        .filter(|email| !email.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            app_url: lookup("APP_URL")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            stripe_api_base: lookup("STRIPE_API_BASE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "https://api.stripe.com/v1".into()),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_price_id: required("STRIPE_PRICE_ID")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            s3_bucket: required("S3_BUCKET")?,
            s3_endpoint: lookup("S3_ENDPOINT").filter(|v| !v.is_empty()),
            rate_limit_max: parsed("RATE_LIMIT_MAX", 5)? as u32,
            rate_limit_window: Duration::from_secs(parsed("RATE_LIMIT_WINDOW_SECS", 60)?),
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}
