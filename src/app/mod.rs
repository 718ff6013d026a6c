use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    context::Context,
    repository::IdentityRepository,
    rest::{self, AppState},
    store::DocumentStore,
};

/// A connected repository plus the configuration it was built from.
pub struct App<S: DocumentStore> {
    pub ctx: Context,
    pub repository: Arc<IdentityRepository<S>>,
    shutdown: CancellationToken,
}

impl App<crate::store::MongoStore> {
    /// Parses configuration, sets up logging and connects to the database.
    /// Fails when the startup probe cannot reach the database.
    pub async fn from_cli() -> Result<Self> {
        crate::tracing::init();
        let cli = crate::cli::parse();
        let ctx = Context::from_cli(&cli);
        crate::tracing::set_log_file(ctx.log_file.as_deref());
        log_startup_info(&ctx);

        log::info!("⏳ Connecting to the database...");
        let repository = IdentityRepository::connect(&ctx.store).await;
        App::new(ctx, repository).await
    }
}

impl<S: DocumentStore + 'static> App<S> {
    pub async fn new(ctx: Context, repository: IdentityRepository<S>) -> Result<Self> {
        if !repository.is_connected() {
            log::error!("❌ Could not connect to the database");
            repository.close().await;
            anyhow::bail!(
                "could not connect to the database at {}",
                redact_credentials(&ctx.store.host)
            );
        }
        log::info!("✅ Connected to the database");
        Ok(Self {
            ctx,
            repository: Arc::new(repository),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves the REST API until Ctrl-C or until the shutdown token fires,
    /// then closes the repository.
    pub async fn run(self) -> Result<()> {
        let mut rest_handle = self.spawn_rest_server();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = self.shutdown.cancelled() => log::info!("🧨 Shutdown requested"),
            _ = &mut rest_handle => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();
        if !rest_handle.is_finished() {
            let _ = rest_handle.await;
        }

        self.repository.close().await;
        log::info!("✅ Shutdown complete");
        Ok(())
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.ctx.api_listen;
        let state = AppState::new(self.repository.clone(), self.ctx.liveness);
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, state, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }
}

fn log_startup_info(ctx: &Context) {
    log::info!("🚀 Starting {}", env!("CARGO_PKG_NAME"));
    log::info!("🗄️ Database host: {}", redact_credentials(&ctx.store.host));
    log::info!(
        "📂 Collection: {}.{}",
        ctx.store.database,
        ctx.store.collection
    );
    log::info!("🌐 REST API: http://{}", ctx.api_listen);
    if let Some(path) = ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }
}

/// Hides the user-info part of a connection string.
fn redact_credentials(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => uri.to_string(),
    }
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()
        .await
        .context("starting identity-api")?;
    app.run().await
}
