use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Select,
    Set,
};
use tracing::warn;

use crate::{
    AppState,
    auth::AdminUser,
    cache::MOVIES_TAG,
    crud::{self, Resource},
    entities::actor,
    error::AppResult,
    filter::contains_pattern,
    models::{ActorDto, CastMemberDto},
    multipart::{ActorForm, FormData},
    pagination::{Paged, Pagination},
    storage::{ACTORS_CONTAINER, public_base_url},
};

pub struct Actors;

impl Resource for Actors {
    type Entity = actor::Entity;
    type Model = actor::Model;
    type Response = ActorDto;

    const PATH: &'static str = "/api/actors";
    const CACHE_TAGS: &'static [&'static str] = &[MOVIES_TAG];

    fn id_column() -> actor::Column {
        actor::Column::Id
    }

    fn id(model: &actor::Model) -> i32 {
        model.id
    }

    fn ordered(query: Select<actor::Entity>) -> Select<actor::Entity> {
        query.order_by_asc(actor::Column::Name).order_by_asc(actor::Column::Id)
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search/{name}", get(search))
        .route("/{id}", get(detail).put(update).delete(delete))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Paged<ActorDto>> {
    crud::list::<Actors>(&state, &pagination).await
}

async fn detail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActorDto>> {
    crud::get::<Actors>(&state, id).await.map(Json)
}

/// Actors whose name contains `name`, shaped as cast entries for the movie form.
async fn search(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<CastMemberDto>>> {
    let actors = Actors::ordered(
        actor::Entity::find().filter(actor::Column::Name.like(contains_pattern(name.trim()))),
    )
    .all(&state.db)
    .await?;

    Ok(Json(actors.into_iter().map(CastMemberDto::from).collect()))
}

async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = ActorForm::parse(FormData::read(multipart).await?)?;

    let photo = match &form.photo {
        Some(file) => {
            let base = public_base_url(state.config.public_url.as_deref(), &headers);
            Some(state.storage.store(ACTORS_CONTAINER, file, &base).await?)
        },
        None => None,
    };

    let inserted = actor::ActiveModel {
        name: Set(form.name),
        birth_date: Set(form.birth_date.to_string()),
        photo: Set(photo.clone()),
        ..Default::default()
    }
    .insert(&state.db)
    .await;

    let model = match inserted {
        Ok(model) => model,
        Err(err) => {
            remove_photo(&state, photo.as_deref()).await;
            return Err(err.into());
        },
    };

    crud::evict::<Actors>(&state);
    Ok(crud::created(Actors::PATH, model.id, ActorDto::from(model)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let form = ActorForm::parse(FormData::read(multipart).await?)?;
    let current = crud::find::<Actors>(&state, id).await?;
    let previous_photo = current.photo.clone();

    let new_photo = match &form.photo {
        Some(file) => {
            let base = public_base_url(state.config.public_url.as_deref(), &headers);
            Some(state.storage.store(ACTORS_CONTAINER, file, &base).await?)
        },
        None => None,
    };

    let mut active = current.into_active_model();
    active.name = Set(form.name);
    active.birth_date = Set(form.birth_date.to_string());
    if new_photo.is_some() {
        active.photo = Set(new_photo.clone());
    }

    if let Err(err) = active.update(&state.db).await {
        remove_photo(&state, new_photo.as_deref()).await;
        return Err(err.into());
    }
    if new_photo.is_some() {
        remove_photo(&state, previous_photo.as_deref()).await;
    }

    crud::evict::<Actors>(&state);
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let current = crud::find::<Actors>(&state, id).await?;
    let status = crud::delete::<Actors>(&state, id).await?;
    remove_photo(&state, current.photo.as_deref()).await;
    Ok(status)
}

/// Best effort; the row no longer points at `url`.
async fn remove_photo(state: &AppState, url: Option<&str>) {
    if let Err(err) = state.storage.delete(url, ACTORS_CONTAINER).await {
        warn!(error = %err, "failed to remove actor photo");
    }
}
