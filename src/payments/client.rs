//! Payment collaborator client
//!
//! Thin client for the external payment provider. A checkout session is
//! created per borrow request or booking; the provider later reports the
//! outcome through the payment webhook.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

/// Payment client errors
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment provider request failed: {0}")]
    RequestFailed(String),

    #[error("Payment provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },
}

impl From<reqwest::Error> for PaymentError {
    fn from(e: reqwest::Error) -> Self {
        PaymentError::RequestFailed(e.to_string())
    }
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        ApiError::PaymentError(e.to_string())
    }
}

/// A checkout session created with the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub url: String,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionBody<'a> {
    reference: Uuid,
    amount_cents: i64,
    currency: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionReply {
    session_id: String,
    url: String,
}

#[derive(Clone)]
enum Mode {
    /// Real provider over HTTP
    Http { base_url: String, client: Client },
    /// No provider configured; sessions succeed locally
    Simulated,
    /// Every call fails (used to exercise rollback paths in tests)
    Failing,
}

/// Client for the payment provider
#[derive(Clone)]
pub struct PaymentClient {
    mode: Mode,
    currency: String,
}

impl PaymentClient {
    /// Build the client from configuration. Without a configured provider
    /// URL the client runs in simulated mode.
    pub fn from_config(config: &Config) -> Self {
        match &config.payment_api_url {
            Some(base_url) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(config.payment_timeout_seconds))
                    .build()
                    .unwrap_or_else(|_| Client::new());
                Self {
                    mode: Mode::Http {
                        base_url: base_url.trim_end_matches('/').to_string(),
                        client,
                    },
                    currency: config.payment_currency.clone(),
                }
            }
            None => {
                tracing::warn!("PAYMENT_API_URL not set, payment sessions are simulated");
                Self::simulated(&config.payment_currency)
            }
        }
    }

    /// Client that fulfils every session locally
    pub fn simulated(currency: &str) -> Self {
        Self {
            mode: Mode::Simulated,
            currency: currency.to_string(),
        }
    }

    /// Client that fails every call
    pub fn always_failing(currency: &str) -> Self {
        Self {
            mode: Mode::Failing,
            currency: currency.to_string(),
        }
    }

    /// Create a checkout session for the given reference and amount
    pub async fn create_session(
        &self,
        reference: Uuid,
        amount_cents: i64,
        description: &str,
    ) -> Result<PaymentSession, PaymentError> {
        match &self.mode {
            Mode::Http { base_url, client } => {
                let body = CreateSessionBody {
                    reference,
                    amount_cents,
                    currency: &self.currency,
                    description,
                };

                let response = client
                    .post(format!("{}/v1/checkout/sessions", base_url))
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(PaymentError::ProviderError {
                        status: status.as_u16(),
                        message,
                    });
                }

                let reply: CreateSessionReply = response.json().await?;
                Ok(PaymentSession {
                    session_id: reply.session_id,
                    url: reply.url,
                    amount_cents,
                    currency: self.currency.clone(),
                })
            }
            Mode::Simulated => {
                let session_id = format!("sim_{}", Uuid::new_v4().simple());
                tracing::debug!(
                    reference = %reference,
                    session_id = %session_id,
                    amount_cents,
                    "Simulated payment session created"
                );
                Ok(PaymentSession {
                    url: format!("https://payments.invalid/checkout/{}", session_id),
                    session_id,
                    amount_cents,
                    currency: self.currency.clone(),
                })
            }
            Mode::Failing => Err(PaymentError::RequestFailed(
                "payment provider unavailable".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_client_creates_sessions() {
        let client = PaymentClient::simulated("USD");
        let session = client
            .create_session(Uuid::new_v4(), 12_50, "test session")
            .await
            .unwrap();

        assert!(session.session_id.starts_with("sim_"));
        assert_eq!(session.amount_cents, 12_50);
        assert_eq!(session.currency, "USD");
    }

    #[tokio::test]
    async fn failing_client_rejects_every_call() {
        let client = PaymentClient::always_failing("USD");
        let result = client
            .create_session(Uuid::new_v4(), 100, "doomed session")
            .await;

        assert!(matches!(result, Err(PaymentError::RequestFailed(_))));
    }
}
