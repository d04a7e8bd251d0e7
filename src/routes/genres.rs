use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use sea_orm::{QueryOrder, Select, Set};

use super::cached;
use crate::{
    AppState,
    auth::AdminUser,
    cache::{GENRES_TAG, MOVIES_TAG},
    crud::{self, Resource, Writable},
    entities::genre,
    error::AppResult,
    models::{GenreDto, GenreInput},
    pagination::{Paged, Pagination},
    validation::Validator,
};

pub const MAX_NAME: usize = 50;

pub struct Genres;

impl Resource for Genres {
    type Entity = genre::Entity;
    type Model = genre::Model;
    type Response = GenreDto;

    const PATH: &'static str = "/api/genres";
    const CACHE_TAGS: &'static [&'static str] = &[GENRES_TAG, MOVIES_TAG];

    fn id_column() -> genre::Column {
        genre::Column::Id
    }

    fn id(model: &genre::Model) -> i32 {
        model.id
    }

    fn ordered(query: Select<genre::Entity>) -> Select<genre::Entity> {
        query.order_by_asc(genre::Column::Name).order_by_asc(genre::Column::Id)
    }
}

impl Writable for Genres {
    type ActiveModel = genre::ActiveModel;
    type Input = GenreInput;

    fn active_model(input: GenreInput) -> AppResult<genre::ActiveModel> {
        let mut validator = Validator::new();
        validator.name("name", &input.name, MAX_NAME);
        validator.finish()?;

        Ok(genre::ActiveModel { name: Set(input.name.trim().to_string()), ..Default::default() })
    }
}

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/all", cached(get(all), state, GENRES_TAG))
        .route("/{id}", get(detail).put(update).delete(delete))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Paged<GenreDto>> {
    crud::list::<Genres>(&state, &pagination).await
}

async fn all(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<GenreDto>>> {
    crud::all::<Genres>(&state).await.map(Json)
}

async fn detail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<GenreDto>> {
    crud::get::<Genres>(&state, id).await.map(Json)
}

async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<GenreInput>,
) -> AppResult<Response> {
    crud::create::<Genres>(&state, input).await
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<GenreInput>,
) -> AppResult<StatusCode> {
    crud::update::<Genres>(&state, id, input).await
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    crud::delete::<Genres>(&state, id).await
}
