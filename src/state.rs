use std::sync::Arc;

use crate::config::AppConfig;
use crate::event::{EventHub, Notifier};
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Channel hub backing the SSE endpoint
    pub hub: EventHub,
    /// Where services publish room events; the hub unless overridden
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let hub = EventHub::new(config.event_channel_capacity);
        let notifier: Arc<dyn Notifier> = Arc::new(hub.clone());

        Self {
            db,
            config,
            hub,
            notifier,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
