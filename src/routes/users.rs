use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Select,
    Set,
};
use tracing::info;

use crate::{
    AppState,
    auth::{AdminUser, hash_password, issue_token, verify_password},
    crud::{self, Resource},
    entities::user,
    error::{AppError, AppResult},
    models::{AuthResponse, Credentials, EditAdminRequest, UserDto},
    pagination::{Paged, Pagination},
    validation::Validator,
};

pub const MIN_PASSWORD: usize = 6;

pub struct Users;

impl Resource for Users {
    type Entity = user::Entity;
    type Model = user::Model;
    type Response = UserDto;

    const PATH: &'static str = "/api/users";
    const CACHE_TAGS: &'static [&'static str] = &[];

    fn id_column() -> user::Column {
        user::Column::Id
    }

    fn id(model: &user::Model) -> i32 {
        model.id
    }

    fn ordered(query: Select<user::Entity>) -> Select<user::Entity> {
        query.order_by_asc(user::Column::Email).order_by_asc(user::Column::Id)
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/make-admin", post(make_admin))
        .route("/remove-admin", post(remove_admin))
}

/// Emails are matched case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(&state.db)
        .await?)
}

async fn list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Paged<UserDto>> {
    crud::list::<Users>(&state, &pagination).await
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    let mut validator = Validator::new();
    validator.email("email", &credentials.email);
    if credentials.password.chars().count() < MIN_PASSWORD {
        validator.push(
            "password",
            format!("the password must have at least {MIN_PASSWORD} characters"),
        );
    }
    validator.finish()?;

    if find_by_email(&state, &credentials.email).await?.is_some() {
        return Err(AppError::field("email", "the email is already taken"));
    }

    let cost = state.config.bcrypt_cost;
    let password = credentials.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(anyhow::Error::from)??;

    let user = user::ActiveModel {
        email: Set(normalize_email(&credentials.email)),
        password_hash: Set(password_hash),
        is_admin: Set(false),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(user_id = user.id, "user registered");
    issue_token(&state.config.jwt_secret, state.config.token_ttl_hours, &user).map(Json)
}

/// Unknown email and wrong password answer the same way.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    let Some(user) = find_by_email(&state, &credentials.email).await? else {
        return Err(AppError::AuthFailed);
    };

    let password = credentials.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::from)?;
    if !valid {
        return Err(AppError::AuthFailed);
    }

    issue_token(&state.config.jwt_secret, state.config.token_ttl_hours, &user).map(Json)
}

async fn make_admin(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<EditAdminRequest>,
) -> AppResult<StatusCode> {
    set_admin(&state, &request.email, true, admin.id).await
}

async fn remove_admin(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<EditAdminRequest>,
) -> AppResult<StatusCode> {
    set_admin(&state, &request.email, false, admin.id).await
}

/// Takes effect on the user's next login, when a new token is issued.
async fn set_admin(
    state: &AppState,
    email: &str,
    is_admin: bool,
    changed_by: i32,
) -> AppResult<StatusCode> {
    let user = find_by_email(state, email).await?.ok_or(AppError::NotFound)?;
    let user_id = user.id;

    let mut active = user.into_active_model();
    active.is_admin = Set(is_admin);
    active.update(&state.db).await?;

    info!(user_id, is_admin, changed_by, "admin flag changed");
    Ok(StatusCode::NO_CONTENT)
}
