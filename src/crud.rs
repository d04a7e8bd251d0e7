//! List, read, write and delete plumbing shared by the catalog resources.
//!
//! A [`Resource`] names its entity, its response shape and the cache tags its
//! writes evict; [`Writable`] adds the JSON input for resources edited without
//! uploads. Handlers in `routes` stay thin and compose these functions.

use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, QueryFilter, Select,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    AppState,
    cache::CacheInvalidator,
    error::{AppError, AppResult},
    pagination::{Paged, Pagination, paginate},
};

pub trait Resource {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: FromQueryResult + Send + Sync + 'static;
    type Response: From<Self::Model> + Serialize;

    /// Route prefix, used for the `Location` of created items.
    const PATH: &'static str;
    /// Cached reads that embed this resource, evicted after a write.
    const CACHE_TAGS: &'static [&'static str];

    fn id_column() -> <Self::Entity as EntityTrait>::Column;

    fn id(model: &Self::Model) -> i32;

    /// Total ordering for listings.
    fn ordered(query: Select<Self::Entity>) -> Select<Self::Entity>;

    fn find() -> Select<Self::Entity> {
        Self::ordered(Self::Entity::find())
    }
}

pub trait Writable: Resource {
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send + 'static;
    type Input: DeserializeOwned + Send;

    /// Checks `input` and turns it into an active model with every column but
    /// the id set.
    fn active_model(input: Self::Input) -> AppResult<Self::ActiveModel>;
}

pub async fn list<R: Resource>(
    state: &AppState,
    pagination: &Pagination,
) -> AppResult<Paged<R::Response>> {
    let page = paginate(&state.db, R::find(), pagination).await?;
    Ok(page.map(R::Response::from))
}

pub async fn all<R: Resource>(state: &AppState) -> AppResult<Vec<R::Response>> {
    let models = R::find().all(&state.db).await?;
    Ok(models.into_iter().map(R::Response::from).collect())
}

pub async fn find<R: Resource>(state: &AppState, id: i32) -> AppResult<R::Model> {
    R::Entity::find()
        .filter(R::id_column().eq(id))
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get<R: Resource>(state: &AppState, id: i32) -> AppResult<R::Response> {
    find::<R>(state, id).await.map(R::Response::from)
}

/// Inserts and answers `201 Created` with the new item and its `Location`.
pub async fn create<R>(state: &AppState, input: R::Input) -> AppResult<Response>
where
    R: Writable,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    let model = R::active_model(input)?.insert(&state.db).await?;
    evict::<R>(state);

    let id = R::id(&model);
    debug!(path = R::PATH, id, "created");
    Ok(created(R::PATH, id, R::Response::from(model)))
}

/// Overwrites every column of an existing item.
pub async fn update<R: Writable>(state: &AppState, id: i32, input: R::Input) -> AppResult<StatusCode> {
    let active = R::active_model(input)?;
    let result = R::Entity::update_many()
        .set(active)
        .filter(R::id_column().eq(id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    evict::<R>(state);
    debug!(path = R::PATH, id, "updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete<R: Resource>(state: &AppState, id: i32) -> AppResult<StatusCode> {
    let result = R::Entity::delete_many().filter(R::id_column().eq(id)).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    evict::<R>(state);
    debug!(path = R::PATH, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn evict<R: Resource>(state: &AppState) {
    for tag in R::CACHE_TAGS {
        state.cache.invalidate(tag);
    }
}

pub fn created<T: Serialize>(path: &str, id: i32, body: T) -> Response {
    (StatusCode::CREATED, [(LOCATION, format!("{path}/{id}"))], Json(body)).into_response()
}
