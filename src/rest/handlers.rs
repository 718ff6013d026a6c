use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use super::{
    error::ApiError,
    models::{
        DeletedResponse, ErrorResponse, HealthResponse, IndexResponse, RouteDoc, SucceedResponse,
        UpdatedResponse, UserResponse, UsersResponse,
    },
    payload::UserFields,
    AppState,
};
use crate::store::DocumentStore;

const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/users", "List every user"),
    ("POST", "/users", "Create a user from name, email and password"),
    ("GET", "/users/{doc_id}", "Fetch one user"),
    ("PUT", "/users/{doc_id}", "Set any of name, email, password on a user"),
    ("DELETE", "/users/{doc_id}", "Delete a user"),
    ("GET", "/health", "Service and database status"),
];

pub async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        datetime: Utc::now(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        routes: ROUTES
            .iter()
            .map(|(method, path, description)| RouteDoc {
                method: method.to_string(),
                path: path.to_string(),
                description: description.to_string(),
            })
            .collect(),
    })
}

pub async fn health<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    let connected = state.repository.connectivity(state.liveness).await;
    let (code, status) = if connected {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            connected,
            uptime_secs,
        }),
    )
}

pub async fn list_users<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let all_users = state.repository.list_all().await?;
    Ok(Json(UsersResponse {
        datetime: Utc::now(),
        all_users,
    }))
}

pub async fn create_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    fields: UserFields,
) -> Result<impl IntoResponse, ApiError> {
    let fields = fields.into_new_record()?;
    let succeed = state.repository.insert(fields).await?;
    Ok(Json(SucceedResponse {
        datetime: Utc::now(),
        succeed,
    }))
}

pub async fn get_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.repository.get_one(&doc_id).await?;
    let code = if user.is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((
        code,
        Json(UserResponse {
            datetime: Utc::now(),
            user,
        }),
    ))
}

pub async fn update_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(doc_id): Path<String>,
    fields: UserFields,
) -> Result<impl IntoResponse, ApiError> {
    let patch = fields.into_patch()?;
    let updated = state.repository.update(&doc_id, patch).await?;
    Ok(Json(UpdatedResponse {
        datetime: Utc::now(),
        updated,
    }))
}

pub async fn delete_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.repository.delete(&doc_id).await?;
    Ok(Json(DeletedResponse {
        datetime: Utc::now(),
        deleted,
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("endpoint not found")),
    )
}

#[cfg(test)]
mod tests {
    use super::super::{payload, router};
    use super::*;
    use crate::{
        record::NewRecord,
        repository::{IdentityRepository, Liveness},
        store::MemoryStore,
    };
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Method, Request},
        Router,
    };
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use tower::ServiceExt;

    type Repo = Arc<IdentityRepository<MemoryStore>>;

    async fn app_with(store: MemoryStore, liveness: Liveness) -> (Router, Repo) {
        let repository = Arc::new(IdentityRepository::with_store(store).await);
        let router = router(AppState::new(repository.clone(), liveness));
        (router, repository)
    }

    async fn app() -> (Router, Repo) {
        app_with(MemoryStore::new(), Liveness::Cached).await
    }

    async fn seeded_id(repository: &IdentityRepository<MemoryStore>) -> String {
        repository
            .insert(NewRecord::new("A", "a@x.com", "p"))
            .await
            .unwrap();
        repository.list_all().await.unwrap().pop().unwrap().id
    }

    async fn send(
        router: Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        router
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_users_returns_all_records() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;

        let response = send(router, Method::GET, "/users", None, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: UsersResponse = json(response).await;
        assert_eq!(payload.all_users.len(), 1);
        assert_eq!(payload.all_users[0].id, id);
    }

    #[tokio::test]
    async fn create_user_accepts_json() {
        let (router, repository) = app().await;
        let body = r#"{"name":"A","email":"a@x.com","password":"p"}"#;

        let response = send(router, Method::POST, "/users", Some("application/json"), body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: SucceedResponse = json(response).await;
        assert!(payload.succeed);

        let records = repository.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn create_user_accepts_form() {
        let (router, repository) = app().await;
        let body = "name=A&email=a%40x.com&password=p";

        let response = send(
            router,
            Method::POST,
            "/users",
            Some("application/x-www-form-urlencoded"),
            body,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let records = repository.list_all().await.unwrap();
        assert_eq!(records[0].email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn create_user_rejects_missing_fields() {
        let (router, repository) = app().await;
        let body = r#"{"name":"A","email":""}"#;

        let response = send(router, Method::POST, "/users", Some("application/json"), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: ErrorResponse = json(response).await;
        assert_eq!(payload.error, payload::MISSING_FIELDS);
        assert!(repository.store().is_empty());
    }

    #[tokio::test]
    async fn create_user_rejects_unknown_content_type() {
        let (router, _) = app().await;
        let response = send(router, Method::POST, "/users", Some("text/plain"), "A").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: ErrorResponse = json(response).await;
        assert_eq!(payload.error, payload::UNSUPPORTED_BODY);
    }

    #[tokio::test]
    async fn get_user_returns_record() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;

        let response = send(router, Method::GET, &format!("/users/{}", id), None, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: UserResponse = json(response).await;
        let user = payload.user.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn get_user_with_malformed_or_unknown_id_is_404() {
        let (router, _) = app().await;
        for id in ["not-a-valid-id", "65a1b2c3d4e5f60718293a4b"] {
            let response =
                send(router.clone(), Method::GET, &format!("/users/{}", id), None, "").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let payload: UserResponse = json(response).await;
            assert!(payload.user.is_none());
        }
    }

    #[tokio::test]
    async fn update_user_sets_supplied_fields() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;

        let response = send(
            router,
            Method::PUT,
            &format!("/users/{}", id),
            Some("application/json"),
            r#"{"name":"B"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: UpdatedResponse = json(response).await;
        assert!(payload.updated);

        let record = repository.get_one(&id).await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("B"));
        assert_eq!(record.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn update_user_accepts_partial_form() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;

        let response = send(
            router,
            Method::PUT,
            &format!("/users/{}", id),
            Some("application/x-www-form-urlencoded"),
            "email=b%40x.com",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let record = repository.get_one(&id).await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("A"));
        assert_eq!(record.email.as_deref(), Some("b@x.com"));
    }

    #[tokio::test]
    async fn update_user_with_garbage_id_reports_false() {
        let (router, _) = app().await;
        let response = send(
            router,
            Method::PUT,
            "/users/garbage-id",
            Some("application/json"),
            r#"{"name":"B","email":"b@x.com","password":"q"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: UpdatedResponse = json(response).await;
        assert!(!payload.updated);
    }

    #[tokio::test]
    async fn update_user_without_fields_is_rejected() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;
        let response = send(
            router,
            Method::PUT,
            &format!("/users/{}", id),
            Some("application/json"),
            "{}",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_user_removes_record() {
        let (router, repository) = app().await;
        let id = seeded_id(&repository).await;

        let uri = format!("/users/{}", id);
        let response = send(router.clone(), Method::DELETE, &uri, None, "").await;
        let payload: DeletedResponse = json(response).await;
        assert!(payload.deleted);
        assert!(repository.store().is_empty());

        let response = send(router, Method::DELETE, "/users/garbage-id", None, "").await;
        let payload: DeletedResponse = json(response).await;
        assert!(!payload.deleted);
    }

    #[tokio::test]
    async fn store_failures_become_500() {
        let (router, repository) = app().await;
        repository.store().set_offline(true);

        let response = send(router, Method::GET, "/users", None, "").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload: ErrorResponse = json(response).await;
        assert!(payload.error.contains("unavailable"));
    }

    #[tokio::test]
    async fn health_uses_cached_or_probed_state() {
        let (router, repository) = app().await;
        repository.store().set_offline(true);
        let response = send(router, Method::GET, "/health", None, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: HealthResponse = json(response).await;
        assert!(payload.connected);

        let (router, repository) = app_with(MemoryStore::new(), Liveness::Probe).await;
        repository.store().set_offline(true);
        let response = send(router, Method::GET, "/health", None, "").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let payload: HealthResponse = json(response).await;
        assert!(!payload.connected);
        assert_eq!(payload.status, "degraded");
    }

    #[tokio::test]
    async fn index_lists_routes_and_unknown_paths_are_404() {
        let (router, _) = app().await;
        let response = send(router.clone(), Method::GET, "/", None, "").await;
        let payload: IndexResponse = json(response).await;
        assert!(payload.routes.iter().any(|r| r.path == "/users"));

        let response = send(router, Method::GET, "/nope", None, "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload: ErrorResponse = json(response).await;
        assert_eq!(payload.error, "endpoint not found");
    }
}
