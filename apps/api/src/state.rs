use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::apply::bus::MessageBus;
use crate::apply::engine::ApplyEngine;
use crate::apply::submitter::{ExtensionSubmitter, StubSubmitter, Submitter};
use crate::apply::throttle::Throttle;
use crate::config::Config;
use crate::db::create_pool;
use crate::store::{ApplicationStore, InMemoryApplicationStore, PgApplicationStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator; also owns the application store and the message bus.
    pub engine: ApplyEngine,
    /// Same throttle the engine uses, exposed for bucket inspection.
    pub throttle: Arc<Throttle>,
    pub config: Config,
}

impl AppState {
    /// Wires store, throttle, bus and submitter from configuration.
    pub async fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn ApplicationStore> = match &config.database_url {
            Some(url) => Arc::new(PgApplicationStore::new(create_pool(url).await?)),
            None => {
                info!("DATABASE_URL not set, using in-memory application store");
                Arc::new(InMemoryApplicationStore::new())
            }
        };

        let throttle = Arc::new(Throttle::new(
            config.throttle_capacity,
            config.throttle_refill,
        ));
        info!(
            "Throttle: {} tokens, refill every {}ms",
            config.throttle_capacity,
            config.throttle_refill.as_millis()
        );

        let bus = MessageBus::new();
        let submitter: Arc<dyn Submitter> = if config.extension_bridge {
            info!(
                "Extension bridge enabled (timeout {}ms)",
                config.extension_timeout.as_millis()
            );
            Arc::new(ExtensionSubmitter::new(config.extension_timeout))
        } else {
            info!("Extension bridge disabled, submissions are simulated");
            Arc::new(StubSubmitter)
        };

        Ok(Self {
            engine: ApplyEngine::new(store, throttle.clone(), bus, submitter),
            throttle,
            config,
        })
    }
}
