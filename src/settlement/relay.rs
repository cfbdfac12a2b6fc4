// Relay-backed settlement operation
//
// Transaction construction and signing live behind the relay. We hand it the
// resolved accounts and wait for an accept/reject.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::SettlementError;
use crate::settlement::{SettlementOperation, SettlementRequest};

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RelaySettlement {
    relay_url: String,
    client: reqwest::Client,
}

impl RelaySettlement {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SettlementOperation for RelaySettlement {
    async fn settle(&self, request: SettlementRequest) -> Result<(), SettlementError> {
        debug!(
            "Submitting settlement for open orders {} to {}",
            request.open_orders.address, self.relay_url
        );

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the relay's own message; fall back to the raw body or status line
            let message = serde_json::from_str::<RelayResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        format!("relay returned {}", status)
                    } else {
                        body.trim().to_string()
                    }
                });
            return Err(SettlementError::Rejected(message));
        }

        let parsed: RelayResponse = if body.trim().is_empty() {
            RelayResponse {
                signature: None,
                error: None,
            }
        } else {
            serde_json::from_str(&body)
                .map_err(|e| SettlementError::InvalidResponse(e.to_string()))?
        };

        if let Some(error) = parsed.error.filter(|m| !m.is_empty()) {
            return Err(SettlementError::Rejected(error));
        }

        info!(
            "✓ Settlement accepted by relay (signature: {})",
            parsed.signature.as_deref().unwrap_or("pending")
        );
        Ok(())
    }
}
