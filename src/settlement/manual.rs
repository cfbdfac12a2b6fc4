use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{AppError, PreconditionError, SettlementError};
use crate::notifications::{Notification, NotificationSink};
use crate::panel::PanelContext;
use crate::settlement::guard::require_settlement;
use crate::settlement::{run_settlement, SettlementOperation};

const SETTLE_ERROR_TITLE: &str = "Error settling funds";

/// Result of a user-initiated settlement. Failures have already been notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManualOutcome {
    Settled,
    Rejected { missing: PreconditionError },
    Failed { message: String },
}

impl ManualOutcome {
    /// Convert to the API error for non-success outcomes
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            ManualOutcome::Settled => Ok(()),
            ManualOutcome::Rejected { missing } => Err(missing.into()),
            ManualOutcome::Failed { message } => {
                Err(SettlementError::Rejected(message).into())
            }
        }
    }
}

/// "Settle all funds": validates the panel, runs the shared operation, and
/// reports every failure to the user.
///
/// Not gated by the automatic cooldown and not deduplicated: each call is
/// its own attempt, even while an automatic attempt is in flight.
pub struct ManualSettler {
    context: Arc<dyn PanelContext>,
    operation: Arc<dyn SettlementOperation>,
    notifier: Arc<dyn NotificationSink>,
}

impl ManualSettler {
    pub fn new(
        context: Arc<dyn PanelContext>,
        operation: Arc<dyn SettlementOperation>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            context,
            operation,
            notifier,
        }
    }

    #[instrument(skip(self))]
    pub async fn settle_funds(&self) -> ManualOutcome {
        let request = match require_settlement(&self.context.context()) {
            Ok(request) => request,
            Err(missing) => {
                warn!("Manual settlement rejected: {}", missing);
                self.notifier.notify(Notification::from(missing));
                return ManualOutcome::Rejected { missing };
            }
        };

        info!(
            "💰 Settling funds for {} on market {}",
            request.wallet.public_key, request.market.address
        );

        match run_settlement(self.operation.as_ref(), request).await {
            Ok(()) => {
                info!("✅ Manual settlement submitted");
                ManualOutcome::Settled
            }
            Err(e) => {
                let message = e.to_string();
                warn!("❌ Manual settlement failed: {}", message);
                self.notifier
                    .notify(Notification::error(SETTLE_ERROR_TITLE, message.clone()));
                ManualOutcome::Failed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::testing::RecordingSink;
    use crate::notifications::NotificationKind;
    use crate::panel::PanelStore;
    use crate::settlement::testing::{ready_context, ready_store, RecordingOperation};

    struct Fixture {
        store: Arc<PanelStore>,
        operation: Arc<RecordingOperation>,
        sink: Arc<RecordingSink>,
        settler: ManualSettler,
    }

    fn fixture(operation: RecordingOperation) -> Fixture {
        let store = Arc::new(ready_store());
        let operation = Arc::new(operation);
        let sink = Arc::new(RecordingSink::default());
        let settler = ManualSettler::new(store.clone(), operation.clone(), sink.clone());
        Fixture {
            store,
            operation,
            sink,
            settler,
        }
    }

    #[tokio::test]
    async fn test_no_wallet_notifies_once() {
        let fx = fixture(RecordingOperation::default());
        let mut update = ready_context();
        update.wallet = None;
        fx.store.apply_context(update);

        let outcome = fx.settler.settle_funds().await;

        assert_eq!(
            outcome,
            ManualOutcome::Rejected {
                missing: PreconditionError::WalletNotConnected
            }
        );
        let notifications = fx.sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].message, "Wallet not connected");
        assert_eq!(fx.operation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_each_missing_field_named() {
        let cases = [
            (
                PreconditionError::MarketUnavailable,
                "market is undefined",
            ),
            (
                PreconditionError::OpenOrdersAccountUnavailable,
                "Open orders account is undefined",
            ),
            (
                PreconditionError::BaseAccountUnavailable,
                "Base currency account is undefined",
            ),
            (
                PreconditionError::QuoteAccountUnavailable,
                "Quote currency account is undefined",
            ),
        ];

        for (missing, description) in cases {
            let fx = fixture(RecordingOperation::default());
            let mut update = ready_context();
            match missing {
                PreconditionError::MarketUnavailable => update.market = None,
                PreconditionError::OpenOrdersAccountUnavailable => {
                    update.open_orders_account = None
                }
                PreconditionError::BaseAccountUnavailable => update.base_currency_account = None,
                PreconditionError::QuoteAccountUnavailable => {
                    update.quote_currency_account = None
                }
                PreconditionError::WalletNotConnected => unreachable!(),
            }
            fx.store.apply_context(update);

            assert_eq!(
                fx.settler.settle_funds().await,
                ManualOutcome::Rejected { missing }
            );
            let errors = fx.sink.errors();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "Error settling funds");
            assert_eq!(errors[0].description, description);
            assert_eq!(fx.operation.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_success_invokes_once_without_errors() {
        let fx = fixture(RecordingOperation::default());

        assert_eq!(fx.settler.settle_funds().await, ManualOutcome::Settled);

        let calls = fx.operation.calls();
        assert_eq!(calls.len(), 1);
        let request = &calls[0];
        assert_eq!(request.wallet.public_key, "Wallet1111");
        assert_eq!(request.market.address, "8BnEgHoWFysVcuFFX7QztDmzuH8r5ZFvyP3sYwn1XTh6");
        assert_eq!(request.open_orders.address, "OpenOrders1111");
        assert_eq!(request.base_currency_account.address, "BaseAcct1111");
        assert_eq!(request.quote_currency_account.address, "QuoteAcct1111");
        assert!(fx.sink.errors().is_empty());
    }

    #[tokio::test]
    async fn test_operation_failure_surfaces_message() {
        let fx = fixture(RecordingOperation::failing_with("insufficient funds"));

        let outcome = fx.settler.settle_funds().await;

        assert_eq!(
            outcome,
            ManualOutcome::Failed {
                message: "insufficient funds".into()
            }
        );
        let errors = fx.sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Error settling funds");
        assert!(errors[0].description.contains("insufficient funds"));
        assert_eq!(fx.operation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_operation_is_notified() {
        let fx = fixture(RecordingOperation::panicking_once());

        let outcome = fx.settler.settle_funds().await;

        assert!(matches!(outcome, ManualOutcome::Failed { .. }));
        let errors = fx.sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Error settling funds");
        assert!(errors[0].description.contains("blew up"));

        // next trigger runs normally
        assert_eq!(fx.settler.settle_funds().await, ManualOutcome::Settled);
    }

    #[tokio::test]
    async fn test_back_to_back_triggers_are_not_deduplicated() {
        let fx = fixture(RecordingOperation::default());

        assert_eq!(fx.settler.settle_funds().await, ManualOutcome::Settled);
        assert_eq!(fx.settler.settle_funds().await, ManualOutcome::Settled);

        assert_eq!(fx.operation.call_count(), 2);
        assert!(fx.sink.notifications().is_empty());
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(ManualOutcome::Settled.into_result().is_ok());
        assert!(matches!(
            ManualOutcome::Rejected {
                missing: PreconditionError::MarketUnavailable
            }
            .into_result(),
            Err(AppError::Precondition(PreconditionError::MarketUnavailable))
        ));
    }
}
