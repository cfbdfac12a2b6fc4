use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::{
    api::handler::AppState,
    config::Config,
    error::AppResult,
    notifications::NotificationBroadcaster,
    panel::{Connection, FilePreferenceStore, PanelStore, PreferenceStore},
    settlement::{
        AutoSettler, ManualSettler, RelaySettlement, SchedulerHandle, SettlementOperation,
        SystemClock,
    },
};

/// Wire the panel together and start automatic settlement.
///
/// The returned handle owns the scheduler; drop it to stop ticking.
pub fn initialize_app_state(config: &Config) -> AppResult<(AppState, SchedulerHandle)> {
    info!("Initializing settlement panel components ...");
    config.validate()?;

    // Context accessors
    let panel = Arc::new(PanelStore::new(Connection {
        endpoint: config.rpc_url.clone(),
    }));
    info!("✅ Panel store initialized (connection: {})", config.rpc_url);

    let preferences: Arc<dyn PreferenceStore> =
        Arc::new(FilePreferenceStore::load(&config.preferences_path));

    // Notification sink
    let notifications = Arc::new(NotificationBroadcaster::new());
    info!("✅ Notification broadcaster initialized");

    // Shared settlement operation
    let operation: Arc<dyn SettlementOperation> =
        Arc::new(RelaySettlement::new(config.settlement_relay_url.clone()));
    info!("✅ Settlement relay: {}", config.settlement_relay_url);

    let manual_settler = Arc::new(ManualSettler::new(
        panel.clone(),
        operation.clone(),
        notifications.clone(),
    ));

    if config.auto_settle_disabled_override {
        warn!("⚠️  AUTO_SETTLE_DISABLED_OVERRIDE set - automatic settlement will never fire");
    }

    let auto_settler = AutoSettler::new(
        panel.clone(),
        preferences.clone(),
        operation,
        Arc::new(SystemClock),
        config.auto_settle_disabled_override,
        Duration::from_millis(config.cooldown_ms),
    );
    let scheduler_status = auto_settler.status();
    let scheduler = auto_settler.start(config.tick_interval());
    info!("✅ Auto-settle scheduler started");

    let state = AppState {
        panel,
        preferences,
        manual_settler,
        notifications,
        scheduler_status,
    };

    Ok((state, scheduler))
}
