//! Shared fixtures for unit and router tests.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response, header},
};
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    AppState, app,
    auth::{hash_password, issue_token},
    cache::OutputCache,
    config::Config,
    db,
    entities::user,
    storage::FileStorage,
};

pub const SECRET: &str = "test-signing-key";
pub const PASSWORD: &str = "Passw0rd!";

pub fn config(upload_dir: &std::path::Path) -> Config {
    Config {
        addr: ([127, 0, 0, 1], 0).into(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
        cache_ttl_secs: 60,
        upload_dir: upload_dir.to_path_buf(),
        public_url: Some("http://media.test".to_string()),
        allowed_origins: Vec::new(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// Fresh in-memory database and upload directory. Keep the [`TempDir`] alive
/// for as long as the state is used.
pub async fn state() -> (Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let db = db::connect_and_migrate(&config.database_url).await.unwrap();

    let state = Arc::new(AppState {
        cache: OutputCache::new(Duration::from_secs(config.cache_ttl_secs)),
        storage: FileStorage::new(&config.upload_dir),
        config: Arc::new(config),
        db,
    });
    (state, dir)
}

pub async fn router() -> (Router, Arc<AppState>, TempDir) {
    let (state, dir) = state().await;
    (app(state.clone()), state, dir)
}

pub async fn create_user(state: &AppState, email: &str, is_admin: bool) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(hash_password(PASSWORD, state.config.bcrypt_cost).unwrap()),
        is_admin: Set(is_admin),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .unwrap()
}

pub async fn admin_token(state: &AppState) -> String {
    let admin = create_user(state, "admin@example.com", true).await;
    issue_token(SECRET, 1, &admin).unwrap().token
}

pub async fn user_token(state: &AppState) -> String {
    let user = create_user(state, "user@example.com", false).await;
    issue_token(SECRET, 1, &user).unwrap().token
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder =
        Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "cinedex-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, bearer(token));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
