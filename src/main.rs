//! StoryVoice - 朗读播放服务入口

use std::sync::Arc;
use std::time::Duration;

use storyvoice::application::{
    CredentialResolver, KeyValueStorePort, PlaybackController, PlaybackSettings,
    SpeechSynthesizer, SynthesizerSettings, TtlCache, TtlCacheConfig, TtsEnginePort,
};
use storyvoice::config::{load_config, print_config, AppConfig, CacheBackend, TtsProvider};
use storyvoice::domain::text_segmenter::probe_segmenter;
use storyvoice::infrastructure::adapters::{
    ClockAudioOutput, ConfiguredCredentialPrompt, FakeTtsClient, HttpTtsClient,
    HttpTtsClientConfig, KvCredentialStore,
};
use storyvoice::infrastructure::events::EventPublisher;
use storyvoice::infrastructure::http::{AppState, HttpServer};
use storyvoice::infrastructure::memory::{InMemoryKeyValueStore, InMemorySessionManager};
use storyvoice::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
use storyvoice::infrastructure::persistence::{SledKeyValueStore, SledStoreConfig, SqliteKeyValueStore};
use storyvoice::infrastructure::worker::{MaintenanceWorker, MaintenanceWorkerConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("StoryVoice {}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let kv = open_store(&config).await?;

    // 凭据与缓存共用同一个 KV 存储，凭据 key 不在缓存命名空间内
    let credentials = Arc::new(CredentialResolver::new(
        Arc::new(KvCredentialStore::new(kv.clone())),
        Arc::new(ConfiguredCredentialPrompt::new(
            config.tts.api_key.clone(),
            config.tts.api_key_env.clone(),
        )),
    ));

    let cache = Arc::new(TtlCache::new(
        kv.clone(),
        TtlCacheConfig {
            namespace: config.cache.namespace.clone(),
            schema_version: config.cache.schema_version,
            ttl: config.cache.ttl(),
        },
    ));

    let engine: Arc<dyn TtsEnginePort> = match config.tts.provider {
        TtsProvider::Http => Arc::new(HttpTtsClient::new(HttpTtsClientConfig {
            base_url: config.tts.url.clone(),
            timeout_secs: config.tts.timeout_secs,
        })?),
        TtsProvider::Fake => {
            tracing::warn!("Using fake TTS engine, audio will be silent");
            Arc::new(FakeTtsClient::with_defaults())
        }
    };

    let synthesizer = Arc::new(SpeechSynthesizer::new(
        engine,
        cache.clone(),
        credentials.clone(),
        SynthesizerSettings {
            voice_id: config.tts.voice_id.clone(),
            model_id: config.tts.model_id.clone(),
            language_code: config.tts.language_code.clone(),
            output_format: config.tts.output_format(),
            voice_settings: config.tts.voice_settings.clone(),
            timeout: config.tts.timeout(),
        },
    ));

    let segmenter = probe_segmenter(config.playback.segmenter, &config.playback.locale)?;

    let session_manager = Arc::new(InMemorySessionManager::new());
    let event_publisher = Arc::new(EventPublisher::new());

    let controller = Arc::new(PlaybackController::new(
        session_manager.clone(),
        Arc::new(ClockAudioOutput::new(config.tts.output_format())),
        synthesizer,
        Arc::from(segmenter),
        event_publisher.clone(),
        PlaybackSettings {
            tick_interval: Duration::from_millis(config.playback.tick_ms),
            default_locale: config.playback.locale.clone(),
        },
    ));

    // 启动维护 Worker
    let shutdown = CancellationToken::new();
    let worker = MaintenanceWorker::new(
        MaintenanceWorkerConfig {
            eviction_startup_delay: Duration::from_secs(config.cache.eviction_startup_delay_secs),
            eviction_interval: Duration::from_secs(config.cache.eviction_interval_secs),
            session_expire_secs: config.playback.session_expire_secs,
        },
        cache.clone(),
        controller.clone(),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    let state = AppState::new(
        controller,
        session_manager,
        cache,
        credentials,
        event_publisher,
    );
    let server = HttpServer::new(config.server.clone(), state);

    let server_shutdown = shutdown.clone();
    server
        .run_with_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        tracing::warn!(error = %e, "MaintenanceWorker task failed");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},storyvoice={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 按配置打开 KV 存储
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStorePort>> {
    let path = std::path::Path::new(&config.cache.path);
    if config.cache.backend != CacheBackend::Memory {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let store: Arc<dyn KeyValueStorePort> = match config.cache.backend {
        CacheBackend::Sled => Arc::new(SledKeyValueStore::new(&SledStoreConfig {
            db_path: config.cache.path.clone(),
            flush_on_write: false,
        })?),
        CacheBackend::Sqlite => {
            let pool = create_pool(&DatabaseConfig {
                database_url: config.cache.database_url(),
                max_connections: 5,
            })
            .await?;
            run_migrations(&pool).await?;
            Arc::new(SqliteKeyValueStore::new(pool))
        }
        CacheBackend::Memory => {
            tracing::warn!("Using in-memory store, cache and credential are lost on restart");
            Arc::new(InMemoryKeyValueStore::new())
        }
    };

    tracing::info!(backend = ?config.cache.backend, path = %config.cache.path, "Key-value store opened");
    Ok(store)
}
