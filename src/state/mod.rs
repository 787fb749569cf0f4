use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use moka::future::Cache;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::{CacheConfig, GovernanceConfig};
use crate::entities::guild;
use crate::gateway::GatewayClient;

/// Shared handles, constructed once in `main` and injected everywhere.
#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub gateway: GatewayClient,
    pub cache: Arc<BotCache>,
    pub governance: GovernanceConfig,
    pub admin_user_id: String,
    pub council_locks: Arc<CouncilLocks>,
}

impl AppState {
    pub fn new(
        database: DatabaseConnection,
        gateway: GatewayClient,
        cache: Arc<BotCache>,
        governance: GovernanceConfig,
        admin_user_id: String,
    ) -> Self {
        assert!(
            !admin_user_id.is_empty(),
            "Admin user id must be configured"
        );
        assert!(
            cache.guild_capacity >= 10,
            "Guild cache capacity must be configured"
        );
        Self {
            database,
            gateway,
            cache,
            governance,
            admin_user_id,
            council_locks: Arc::new(CouncilLocks::new()),
        }
    }

    /// Guild settings pass through the cache; every privileged operation
    /// reads them first.
    pub async fn guild_settings(&self, guild_id: &str) -> Result<Option<Arc<guild::Model>>, DbErr> {
        assert!(!guild_id.is_empty(), "Guild id cannot be empty");

        if let Some(cached) = self.cache.guilds.get(guild_id).await {
            return Ok(Some(cached));
        }

        let Some(model) = guild::Entity::find_by_id(guild_id.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        let shared = Arc::new(model);
        self.cache
            .guilds
            .insert(guild_id.to_string(), Arc::clone(&shared))
            .await;
        Ok(Some(shared))
    }

    pub async fn invalidate_guild(&self, guild_id: &str) {
        self.cache.guilds.invalidate(guild_id).await;
    }
}

pub struct BotCache {
    pub guilds: Cache<String, Arc<guild::Model>>,
    guild_capacity: u64,
}

impl BotCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.guilds_max_capacity >= 10,
            "Guild cache capacity threshold"
        );

        let guilds = Cache::builder()
            .max_capacity(config.guilds_max_capacity)
            .time_to_live(Duration::from_secs(config.guilds_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.guilds_ttl_seconds / 2 + 1))
            .build();

        Self {
            guilds,
            guild_capacity: config.guilds_max_capacity,
        }
    }
}

/// Per-council async mutexes serializing the check-then-act sequences the
/// storage layer cannot make atomic (election announcement).
pub struct CouncilLocks {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CouncilLocks {
    pub fn new() -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub async fn lock(&self, council_id: &str) -> OwnedMutexGuard<()> {
        assert!(!council_id.is_empty(), "Council id cannot be empty");
        let mutex = {
            let mut locks = self.locks.lock().expect("council lock registry poisoned");
            assert!(
                locks.len() <= 100_000,
                "Council lock registry exceeds defensive bound"
            );
            Arc::clone(
                locks
                    .entry(council_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        mutex.lock_owned().await
    }
}

impl Default for CouncilLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn council_locks_serialize_same_key() {
        let locks = Arc::new(CouncilLocks::new());

        let guard = locks.lock("1000_c").await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("1000_c").await;
            })
        };

        // The contender cannot finish while the first guard is held.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender completes");
    }

    #[tokio::test]
    async fn council_locks_are_independent_across_keys() {
        let locks = CouncilLocks::new();
        let _first = locks.lock("1000_c").await;
        let _second = locks.lock("2000_c").await;
    }
}
