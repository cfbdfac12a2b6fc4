use serde::{Deserialize, Serialize};

use crate::panel::BalanceRow;
use crate::settlement::ManualOutcome;

// ========== REQUEST MODELS ==========

/// Durable auto-settle toggle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoSettlePreference {
    pub enabled: bool,
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub scheduler_running: bool,
}

/// Balance display for the selected pair, base row first
#[derive(Debug, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub market: Option<String>,
    pub connected: bool,
    pub rows: Vec<BalanceRow>,
}

#[derive(Debug, Serialize)]
pub struct SettleResponse {
    #[serde(flatten)]
    pub outcome: ManualOutcome,
}
