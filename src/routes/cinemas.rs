use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use sea_orm::{QueryOrder, Select, Set};

use crate::{
    AppState,
    auth::AdminUser,
    cache::MOVIES_TAG,
    crud::{self, Resource, Writable},
    entities::cinema,
    error::AppResult,
    models::{CinemaDto, CinemaInput},
    pagination::{Paged, Pagination},
    validation::Validator,
};

pub const MAX_NAME: usize = 75;

pub struct Cinemas;

impl Resource for Cinemas {
    type Entity = cinema::Entity;
    type Model = cinema::Model;
    type Response = CinemaDto;

    const PATH: &'static str = "/api/cinemas";
    const CACHE_TAGS: &'static [&'static str] = &[MOVIES_TAG];

    fn id_column() -> cinema::Column {
        cinema::Column::Id
    }

    fn id(model: &cinema::Model) -> i32 {
        model.id
    }

    fn ordered(query: Select<cinema::Entity>) -> Select<cinema::Entity> {
        query.order_by_asc(cinema::Column::Name).order_by_asc(cinema::Column::Id)
    }
}

impl Writable for Cinemas {
    type ActiveModel = cinema::ActiveModel;
    type Input = CinemaInput;

    fn active_model(input: CinemaInput) -> AppResult<cinema::ActiveModel> {
        let mut validator = Validator::new();
        validator.name("name", &input.name, MAX_NAME);
        validator.range("latitude", input.latitude, -90.0, 90.0);
        validator.range("longitude", input.longitude, -180.0, 180.0);
        validator.finish()?;

        Ok(cinema::ActiveModel {
            name: Set(input.name.trim().to_string()),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            ..Default::default()
        })
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(delete))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Paged<CinemaDto>> {
    crud::list::<Cinemas>(&state, &pagination).await
}

async fn detail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CinemaDto>> {
    crud::get::<Cinemas>(&state, id).await.map(Json)
}

async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CinemaInput>,
) -> AppResult<Response> {
    crud::create::<Cinemas>(&state, input).await
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<CinemaInput>,
) -> AppResult<StatusCode> {
    crud::update::<Cinemas>(&state, id, input).await
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    crud::delete::<Cinemas>(&state, id).await
}
