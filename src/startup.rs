//! Application Startup
//!
//! Service wiring, router construction and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;

use crate::application::jobs::{JobDispatcher, ServiceJobHandler};
use crate::application::services::{
    ChannelService, ChannelServiceImpl, DirectMessageService, DirectMessageServiceImpl,
    FriendService, FriendServiceImpl, IdentityService, IdentityServiceImpl, InviteService,
    InviteServiceImpl, KeywordClassifier, MessageService, MessageServiceImpl, ModerationService,
    ModerationServiceImpl, ServerService, ServerServiceImpl, TypingService, TypingServiceImpl,
    UserService, UserServiceImpl, VoiceService, VoiceServiceImpl,
};
use crate::config::{Settings, StorageBackend};
use crate::domain::services::{AccessGuard, AdminAllowList};
use crate::domain::traits::{FileStorage, IdentityProvider, VoiceTokenMinter};
use crate::domain::Repositories;
use crate::infrastructure::identity::JwtIdentityProvider;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::repositories::pg_repositories;
use crate::infrastructure::storage::{LocalFileStorage, TicketSigner};
use crate::infrastructure::voice::LiveKitTokenMinter;
use crate::infrastructure::{cache, database};
use crate::presentation::http::routes;
use crate::presentation::http::handlers::health;
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

/// Connections behind the repositories, kept for readiness probes.
#[derive(Clone)]
pub enum Backend {
    Postgres {
        db: PgPool,
        redis: ConnectionManager,
    },
    Memory,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub users: Arc<dyn UserService>,
    pub servers: Arc<dyn ServerService>,
    pub channels: Arc<dyn ChannelService>,
    pub invites: Arc<dyn InviteService>,
    pub friends: Arc<dyn FriendService>,
    pub direct_messages: Arc<dyn DirectMessageService>,
    pub messages: Arc<dyn MessageService>,
    pub typing: Arc<dyn TypingService>,
    pub voice: Arc<dyn VoiceService>,
    pub files: Arc<dyn FileStorage>,
    pub backend: Backend,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire every service over `repos`. Spawns the job worker, so this
    /// must run inside a tokio runtime.
    pub fn new(
        settings: Settings,
        repos: Repositories,
        files: Arc<dyn FileStorage>,
        backend: Backend,
    ) -> Self {
        let id_generator = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            settings.snowflake.epoch,
        ));
        let guard = AccessGuard::new(&repos);
        let admins = AdminAllowList::new(&settings.admin.emails);

        let provider: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(
            &settings.auth.identity_secret,
            settings.auth.issuer.as_deref(),
        ));
        let minter: Option<Arc<dyn VoiceTokenMinter>> =
            settings.voice.credentials().map(|(key, secret)| {
                Arc::new(LiveKitTokenMinter::new(
                    key,
                    secret,
                    settings.voice.token_ttl_secs,
                )) as Arc<dyn VoiceTokenMinter>
            });

        let typing: Arc<dyn TypingService> = Arc::new(TypingServiceImpl::new(
            repos.typing.clone(),
            repos.users.clone(),
            guard.clone(),
            settings.typing.ttl_secs,
        ));
        let moderation: Arc<dyn ModerationService> = Arc::new(ModerationServiceImpl::new(
            repos.messages.clone(),
            KeywordClassifier::new(&settings.moderation.blocked_terms),
            settings.moderation.reason.clone(),
        ));
        let jobs = JobDispatcher::spawn(
            settings.jobs.queue_capacity,
            Arc::new(ServiceJobHandler::new(typing.clone(), moderation)),
        );

        let messages: Arc<dyn MessageService> = Arc::new(MessageServiceImpl::new(
            repos.messages.clone(),
            repos.users.clone(),
            files.clone(),
            guard.clone(),
            jobs,
            id_generator.clone(),
        ));
        let direct_messages: Arc<dyn DirectMessageService> =
            Arc::new(DirectMessageServiceImpl::new(
                repos.direct_messages.clone(),
                repos.users.clone(),
                guard.clone(),
                id_generator.clone(),
            ));
        let users: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(
            repos.users.clone(),
            direct_messages.clone(),
            messages.clone(),
            admins.clone(),
            id_generator.clone(),
        ));
        let identity: Arc<dyn IdentityService> = Arc::new(IdentityServiceImpl::new(
            provider,
            repos.users.clone(),
            admins,
            id_generator.clone(),
        ));
        let servers: Arc<dyn ServerService> = Arc::new(ServerServiceImpl::new(
            repos.servers.clone(),
            repos.members.clone(),
            repos.users.clone(),
            repos.typing.clone(),
            files.clone(),
            guard.clone(),
            id_generator.clone(),
        ));
        let channels: Arc<dyn ChannelService> = Arc::new(ChannelServiceImpl::new(
            repos.channels.clone(),
            repos.typing.clone(),
            files.clone(),
            guard.clone(),
            id_generator.clone(),
        ));
        let invites: Arc<dyn InviteService> = Arc::new(InviteServiceImpl::new(
            repos.invites.clone(),
            repos.servers.clone(),
            files.clone(),
            guard.clone(),
            id_generator.clone(),
        ));
        let friends: Arc<dyn FriendService> = Arc::new(FriendServiceImpl::new(
            repos.friends.clone(),
            repos.users.clone(),
            id_generator,
        ));
        let voice: Arc<dyn VoiceService> = Arc::new(VoiceServiceImpl::new(minter, guard));

        Self {
            identity,
            users,
            servers,
            channels,
            invites,
            friends,
            direct_messages,
            messages,
            typing,
            voice,
            files,
            backend,
            settings: Arc::new(settings),
        }
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(settings: Settings, files: Arc<dyn FileStorage>) -> Self {
        let repos = MemoryStore::repositories(MemoryStore::new());
        Self::new(settings, repos, files, Backend::Memory)
    }
}

/// Router with middleware applied.
pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(axum::middleware::from_fn(logging::track_metrics))
        .layer(logging::create_trace_layer())
        .layer(cors_layer)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let signer = TicketSigner::new(
            &settings.storage.signing_secret,
            settings.storage.upload_ticket_ttl_secs,
        );
        let files: Arc<dyn FileStorage> = Arc::new(
            LocalFileStorage::new(
                settings.storage.files_dir.clone(),
                &settings.server.public_url,
                signer,
            )
            .await
            .context("Failed to prepare file storage")?,
        );

        let state = match settings.storage.backend {
            StorageBackend::Postgres => {
                let db = database::create_pool(&settings.database)
                    .await
                    .context("Failed to connect to database")?;
                database::run_migrations(&db)
                    .await
                    .context("Failed to run migrations")?;
                info!("Database migrations applied");

                let redis = cache::create_redis_client(&settings.redis)
                    .await
                    .context("Failed to connect to Redis")?;

                let repos = pg_repositories(db.clone(), redis.clone(), settings.typing.ttl_secs);
                AppState::new(settings, repos, files, Backend::Postgres { db, redis })
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                AppState::in_memory(settings, files)
            }
        };

        health::init_server_start();

        let addr: SocketAddr = state
            .settings
            .server_addr()
            .parse()
            .context("Invalid server address configuration")?;
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router: build_router(state),
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
