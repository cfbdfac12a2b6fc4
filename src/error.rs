use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Settlement precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference storage error: {0}")]
    Preferences(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A field the manual settlement path needs but the panel does not have yet.
///
/// The display text is the user-facing description; [`PreconditionError::title`]
/// is the notification headline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionError {
    #[error("wallet is undefined")]
    WalletNotConnected,

    #[error("market is undefined")]
    MarketUnavailable,

    #[error("Open orders account is undefined")]
    OpenOrdersAccountUnavailable,

    #[error("Base currency account is undefined")]
    BaseAccountUnavailable,

    #[error("Quote currency account is undefined")]
    QuoteAccountUnavailable,
}

impl PreconditionError {
    pub fn title(&self) -> &'static str {
        match self {
            PreconditionError::WalletNotConnected => "Wallet not connected",
            _ => "Error settling funds",
        }
    }
}

/// Failures raised by a settlement operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The operation ran and was refused; the message is shown to the user verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Settlement relay unreachable: {0}")]
    Transport(String),

    #[error("Unexpected settlement response: {0}")]
    InvalidResponse(String),

    #[error("Settlement operation panicked: {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for SettlementError {
    fn from(error: reqwest::Error) -> Self {
        SettlementError::Transport(error.to_string())
    }
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Precondition(err) => (
                StatusCode::PRECONDITION_FAILED,
                "SETTLEMENT_PRECONDITION_FAILED",
                err.to_string(),
                Some(serde_json::json!({
                    "title": err.title(),
                    "missing": err,
                })),
            ),
            AppError::Settlement(err) => (
                StatusCode::BAD_GATEWAY,
                "SETTLEMENT_FAILED",
                err.to_string(),
                None,
            ),
            AppError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                message,
                None,
            ),
            AppError::Preferences(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PREFERENCES_ERROR",
                "Failed to persist preferences".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Preferences(format!("I/O error: {:?}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Preferences(format!("Serialization error: {:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
