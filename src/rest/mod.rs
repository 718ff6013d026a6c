use std::{net::SocketAddr, sync::Arc, time::SystemTime};

use anyhow::Context as _;
use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;

use crate::{
    repository::{IdentityRepository, Liveness},
    store::DocumentStore,
};

mod error;
mod handlers;
pub mod models;
mod payload;

pub use error::ApiError;
pub use payload::UserFields;

use handlers::{
    create_user, delete_user, get_user, health, index, list_users, not_found, update_user,
};

pub struct AppState<S: DocumentStore> {
    pub repository: Arc<IdentityRepository<S>>,
    pub started_at: SystemTime,
    pub liveness: Liveness,
}

impl<S: DocumentStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            started_at: self.started_at,
            liveness: self.liveness,
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(repository: Arc<IdentityRepository<S>>, liveness: Liveness) -> Self {
        Self {
            repository,
            started_at: SystemTime::now(),
            liveness,
        }
    }
}

pub fn router<S: DocumentStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::<S>))
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route(
            "/users/:doc_id",
            get(get_user::<S>)
                .put(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: DocumentStore + 'static>(
    addr: SocketAddr,
    state: AppState<S>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding REST listener on {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await
        .context("serving REST requests")?;
    log::info!("👋 REST server exited");
    Ok(())
}
