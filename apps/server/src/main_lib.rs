use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use tradelens_connect::{ProviderRegistry, SyncConfig, SyncService, SyncServiceTrait};
use tradelens_core::{
    connections::{ConnectionService, ConnectionServiceTrait},
    csv_import::{CsvImportService, CsvImportServiceTrait},
    push::{PushDiagnosticsService, PushIngestionService, PushIngestionServiceTrait},
    secrets::CredentialCipher,
    stats::{StatsService, StatsServiceTrait},
};
use tradelens_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, ConnectionRepository, DailyStatRepository,
    SyncLogRepository, TradeRepository,
};

use crate::{
    auth::JwtVerifier,
    config::{Config, LogFormat},
    secrets::ChaChaCredentialCipher,
};

pub struct AppState {
    pub connection_service: Arc<dyn ConnectionServiceTrait>,
    pub stats_service: Arc<dyn StatsServiceTrait>,
    pub sync_service: Arc<dyn SyncServiceTrait>,
    pub csv_import_service: Arc<dyn CsvImportServiceTrait>,
    pub push_service: Arc<dyn PushIngestionServiceTrait>,
    pub diagnostics_service: Arc<PushDiagnosticsService>,
    pub provider_registry: Arc<ProviderRegistry>,
    pub jwt: JwtVerifier,
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer(pool.as_ref().clone());

    let connection_repository = Arc::new(ConnectionRepository::new(pool.clone(), writer.clone()));
    let trade_repository = Arc::new(TradeRepository::new(pool.clone(), writer.clone()));
    let daily_stat_repository = Arc::new(DailyStatRepository::new(pool.clone(), writer.clone()));
    let sync_log_repository = Arc::new(SyncLogRepository::new(pool.clone(), writer));

    let cipher: Arc<dyn CredentialCipher> =
        Arc::new(ChaChaCredentialCipher::new(config.encryption_key));
    let provider_registry = Arc::new(ProviderRegistry::with_defaults());

    let connection_service: Arc<dyn ConnectionServiceTrait> = Arc::new(ConnectionService::new(
        connection_repository.clone(),
        cipher.clone(),
    ));
    let stats_service: Arc<dyn StatsServiceTrait> = Arc::new(StatsService::new(
        trade_repository.clone(),
        daily_stat_repository,
    ));
    let sync_config = SyncConfig {
        cooldown: chrono::Duration::from_std(config.sync_cooldown)?,
    };
    let sync_service: Arc<dyn SyncServiceTrait> = Arc::new(
        SyncService::new(
            connection_repository.clone(),
            trade_repository.clone(),
            sync_log_repository.clone(),
            stats_service.clone(),
            cipher,
            provider_registry.clone(),
        )
        .with_config(sync_config),
    );
    let csv_import_service: Arc<dyn CsvImportServiceTrait> = Arc::new(CsvImportService::new(
        connection_repository.clone(),
        trade_repository.clone(),
        stats_service.clone(),
    ));
    let push_service: Arc<dyn PushIngestionServiceTrait> = Arc::new(PushIngestionService::new(
        connection_repository,
        trade_repository.clone(),
        stats_service.clone(),
    ));
    let diagnostics_service = Arc::new(PushDiagnosticsService::new(
        trade_repository,
        sync_log_repository,
        config.public_base_url.clone(),
    ));

    Ok(Arc::new(AppState {
        connection_service,
        stats_service,
        sync_service,
        csv_import_service,
        push_service,
        diagnostics_service,
        provider_registry,
        jwt: JwtVerifier::new(config.jwt_secret.as_bytes()),
    }))
}
