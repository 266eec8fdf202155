/// Factory: build the `Authorizer` for the configured strategy.
use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StrategyConfig};
use crate::repos::totem_repo::PgTotemStore;
use crate::services::auth::Authorizer;

pub fn build_authorizer(config: &Config) -> Arc<Authorizer> {
    let authorizer = match &config.strategy {
        StrategyConfig::SharedSecret { key } => Authorizer::shared_secret(key.clone()),
        StrategyConfig::Totem(db) => {
            info!(db = ?db, "using totem store");
            Authorizer::totem(Arc::new(PgTotemStore::connect(db)))
        }
    };

    Arc::new(authorizer)
}
