//! Service pulling trades from broker providers into the local store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, error, info, warn};

use super::mapping::to_new_trade;
use super::models::BrokerCredentials;
use super::registry::ProviderRegistry;
use super::traits::SyncServiceTrait;
use tradelens_core::connections::{
    Connection, ConnectionRepositoryTrait, LastSyncStatus, SyncStateUpdate,
};
use tradelens_core::constants::{CONNECTION_ERROR_MAX_CHARS, SYNC_COOLDOWN_SECONDS};
use tradelens_core::errors::{Error, Result};
use tradelens_core::secrets::{CredentialCipher, CredentialMap};
use tradelens_core::stats::StatsServiceTrait;
use tradelens_core::sync::{
    SyncLog, SyncLogRepositoryTrait, SyncResetResult, SyncStatusSummary,
};
use tradelens_core::trades::{NewTrade, TradeRepositoryTrait};
use tradelens_core::utils::text_utils::truncate_chars;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum time between the end of a successful sync and the next one.
    pub cooldown: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::seconds(SYNC_COOLDOWN_SECONDS),
        }
    }
}

/// Orchestrates provider syncs for single connections.
///
/// A sync is refused while another one is running for the same connection
/// or during the cooldown after a success. Once accepted, every failure is
/// recorded on the sync log instead of being returned.
pub struct SyncService {
    connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
    stats_service: Arc<dyn StatsServiceTrait>,
    cipher: Arc<dyn CredentialCipher>,
    registry: Arc<ProviderRegistry>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        connection_repository: Arc<dyn ConnectionRepositoryTrait>,
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
        stats_service: Arc<dyn StatsServiceTrait>,
        cipher: Arc<dyn CredentialCipher>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            connection_repository,
            trade_repository,
            sync_log_repository,
            stats_service,
            cipher,
            registry,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Refuses the sync when one is running or the last success is too recent.
    fn check_entry_guards(&self, connection: &Connection) -> Result<()> {
        if !self
            .sync_log_repository
            .find_running(&connection.id)?
            .is_empty()
        {
            return Err(Error::Conflict(format!(
                "A sync is already running for connection {}",
                connection.id
            )));
        }

        if let (Some(last_sync_at), Some(LastSyncStatus::Success)) =
            (connection.last_sync_at, connection.last_sync_status)
        {
            let elapsed = Utc::now() - last_sync_at;
            if elapsed < self.config.cooldown {
                let wait = (self.config.cooldown - elapsed).num_seconds().max(1);
                return Err(Error::Conflict(format!(
                    "Connection {} was synced {}s ago; retry in {wait}s",
                    connection.id,
                    elapsed.num_seconds()
                )));
            }
        }
        Ok(())
    }

    fn decrypt_credentials(&self, connection: &Connection) -> Result<BrokerCredentials> {
        let map = match connection.credentials_encrypted.as_deref() {
            Some(encrypted) => self.cipher.decrypt(encrypted)?,
            None => CredentialMap::new(),
        };
        BrokerCredentials::from_map(map)
    }

    /// Fetches, merges and re-aggregates. Returns the number of processed trades.
    async fn run_sync(&self, connection: &Connection) -> Result<usize> {
        let credentials = self.decrypt_credentials(connection)?;
        let provider = self.registry.resolve(connection.provider, credentials)?;

        let fetched = provider.fetch_trades(None, None).await?;
        debug!(
            "Provider {} returned {} trades for connection {}",
            connection.provider,
            fetched.len(),
            connection.id
        );

        let new_trades: Vec<NewTrade> = fetched
            .into_iter()
            .map(|trade| to_new_trade(connection, trade))
            .collect();
        let merged = self
            .trade_repository
            .upsert_by_external_id(new_trades)
            .await?;
        debug!(
            "Connection {}: {} trades inserted, {} updated",
            connection.id, merged.inserted, merged.updated
        );

        self.stats_service
            .recalculate_daily_stats(connection)
            .await?;
        Ok(merged.processed())
    }

    async fn finish_success(
        &self,
        connection: &Connection,
        log: SyncLog,
        trades_synced: usize,
    ) -> Result<SyncLog> {
        let log = self.sync_log_repository.update(log.succeed(trades_synced)).await?;
        self.connection_repository
            .update_sync_state(
                &connection.id,
                SyncStateUpdate::succeeded_at(log.completed_at.unwrap_or_else(Utc::now)),
            )
            .await?;
        Ok(log)
    }

    /// Records a failed attempt. Bookkeeping errors are logged, never returned.
    async fn finish_failure(&self, connection: &Connection, log: SyncLog, err: &Error) -> SyncLog {
        let message = err.to_string();
        let failed = log.fail(&message);

        if let Err(e) = self.sync_log_repository.update(failed.clone()).await {
            error!("Could not mark sync log {} failed: {}", failed.id, e);
        }
        let update = SyncStateUpdate::failed(Some(truncate_chars(
            &message,
            CONNECTION_ERROR_MAX_CHARS,
        )));
        if let Err(e) = self
            .connection_repository
            .update_sync_state(&connection.id, update)
            .await
        {
            error!(
                "Could not record sync failure on connection {}: {}",
                connection.id, e
            );
        }
        failed
    }
}

#[async_trait]
impl SyncServiceTrait for SyncService {
    async fn trigger_sync(&self, connection: &Connection) -> Result<SyncLog> {
        self.check_entry_guards(connection)?;

        let log = self
            .sync_log_repository
            .create(SyncLog::start(&connection.id))
            .await?;

        // Once the running log exists, every error must close it.
        let outcome: Result<SyncLog> = async {
            self.connection_repository
                .update_sync_state(&connection.id, SyncStateUpdate::in_progress())
                .await?;
            info!(
                "Started {} sync for connection {} (log {})",
                connection.provider, connection.id, log.id
            );
            let trades_synced = self.run_sync(connection).await?;
            self.finish_success(connection, log.clone(), trades_synced)
                .await
        }
        .await;

        match outcome {
            Ok(log) => {
                info!(
                    "Sync completed for connection {}: {} trades",
                    connection.id, log.trades_synced
                );
                Ok(log)
            }
            Err(e) => {
                error!("Sync failed for connection {}: {}", connection.id, e);
                Ok(self.finish_failure(connection, log, &e).await)
            }
        }
    }

    fn get_sync_status(&self, connection: &Connection) -> Result<SyncStatusSummary> {
        let running = !self
            .sync_log_repository
            .find_running(&connection.id)?
            .is_empty();
        Ok(SyncStatusSummary::new(connection, running))
    }

    fn list_sync_logs(&self, connection_id: &str, limit: i64) -> Result<Vec<SyncLog>> {
        self.sync_log_repository
            .list_for_connection(connection_id, limit)
    }

    async fn reset_stuck_syncs(
        &self,
        connection: &Connection,
        older_than: Option<Duration>,
    ) -> Result<SyncResetResult> {
        let now = Utc::now();
        let mut reset_count = 0;

        for log in self.sync_log_repository.find_running(&connection.id)? {
            let age = now - log.started_at;
            if older_than.is_some_and(|min_age| age < min_age) {
                continue;
            }
            warn!(
                "Manual sync reset: connection={} log_id={} age={}s",
                connection.id,
                log.id,
                age.num_seconds()
            );
            let message = format!("Manual reset (age={}s)", age.num_seconds());
            self.sync_log_repository.update(log.fail(&message)).await?;
            reset_count += 1;
        }

        if reset_count > 0 {
            self.connection_repository
                .update_sync_state(
                    &connection.id,
                    SyncStateUpdate::failed(connection.last_sync_error.clone()),
                )
                .await?;
        }
        Ok(SyncResetResult { reset_count })
    }

    fn list_failed_sync_logs(&self, limit: i64) -> Result<Vec<SyncLog>> {
        self.sync_log_repository.list_failed(limit)
    }
}
