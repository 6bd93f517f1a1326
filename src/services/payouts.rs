//! External payout provider integration.
//!
//! The wallet service talks to the provider only through the
//! [`PayoutProvider`] trait so tests can substitute a mock. The production
//! implementation targets a Chip-style send-payment HTTP API.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(200);
const BACKOFF_CAP: Duration = Duration::from_secs(2);

/// Bank transfer instruction sent to the provider. `reference` is the
/// withdrawal id and doubles as the idempotency key, so a retried submission
/// can never pay twice.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutRequest {
    pub reference: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutReceipt {
    pub provider_reference: String,
    pub status: String,
}

/// Provider failures split by retryability. Transient failures (timeouts,
/// 5xx) are retried with backoff; terminal failures (rejected instruction)
/// are not.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("transient provider failure: {0}")]
    Transient(String),
    #[error("terminal provider failure: {0}")]
    Terminal(String),
}

#[async_trait]
pub trait PayoutProvider: Send + Sync {
    async fn submit_payout(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutError>;
}

/// Submits a payout, retrying transient failures with capped exponential
/// backoff. The provider-side idempotency reference makes the retries safe.
#[instrument(skip(provider, request), fields(reference = %request.reference, amount = %request.amount))]
pub async fn submit_with_retry(
    provider: &dyn PayoutProvider,
    request: &PayoutRequest,
) -> Result<PayoutReceipt, PayoutError> {
    let mut delay = BACKOFF_BASE;
    let mut attempt = 1;
    loop {
        match provider.submit_payout(request).await {
            Ok(receipt) => return Ok(receipt),
            Err(PayoutError::Terminal(reason)) => return Err(PayoutError::Terminal(reason)),
            Err(PayoutError::Transient(reason)) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(PayoutError::Transient(reason));
                }
                warn!(attempt = attempt, error = %reason, "Transient payout failure, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(BACKOFF_CAP);
                attempt += 1;
            }
        }
    }
}

/// Chip-style HTTP payout client.
pub struct ChipPayoutClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChipPaymentResponse {
    id: String,
    status: String,
}

impl ChipPayoutClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl PayoutProvider for ChipPayoutClient {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn submit_payout(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutError> {
        let url = format!("{}/send/payments", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PayoutError::Transient(e.to_string())
                } else {
                    PayoutError::Terminal(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(PayoutError::Transient(format!(
                "provider returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PayoutError::Terminal(format!(
                "provider returned {status}: {body}"
            )));
        }

        let payment: ChipPaymentResponse = response
            .json()
            .await
            .map_err(|e| PayoutError::Terminal(format!("malformed provider response: {e}")))?;

        Ok(PayoutReceipt {
            provider_reference: payment.id,
            status: payment.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl PayoutProvider for FlakyProvider {
        async fn submit_payout(
            &self,
            _request: &PayoutRequest,
        ) -> Result<PayoutReceipt, PayoutError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(PayoutError::Transient("connection reset".into()))
            } else {
                Ok(PayoutReceipt {
                    provider_reference: "chip-123".into(),
                    status: "success".into(),
                })
            }
        }
    }

    struct RejectingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PayoutProvider for RejectingProvider {
        async fn submit_payout(
            &self,
            _request: &PayoutRequest,
        ) -> Result<PayoutReceipt, PayoutError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PayoutError::Terminal("invalid bank account".into()))
        }
    }

    fn request() -> PayoutRequest {
        PayoutRequest {
            reference: Uuid::new_v4(),
            amount: dec!(45),
            currency: "MYR".into(),
            bank_name: "Maybank".into(),
            bank_code: "MBB".into(),
            account_number: "1234567890".into(),
            account_holder: "Aisha".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_succeeds() {
        let provider = FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: 2,
        };
        let receipt = submit_with_retry(&provider, &request()).await.unwrap();
        assert_eq!(receipt.provider_reference, "chip-123");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let provider = FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        };
        let err = submit_with_retry(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, PayoutError::Transient(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_failures_are_not_retried() {
        let provider = RejectingProvider {
            calls: AtomicU32::new(0),
        };
        let err = submit_with_retry(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, PayoutError::Terminal(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
