use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
};
use sea_orm::{
    ActiveModelTrait, DbErr, IntoActiveModel, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{debug, warn};

use super::cached;
use crate::{
    AppState,
    auth::AuthUser,
    cache::MOVIES_TAG,
    crud::{self, Resource},
    entities::movie,
    error::AppResult,
    filter::{MovieFilter, by_release_date, today},
    models::{LandingPage, MovieDetailDto, MovieDto, MovieEditForm, MovieFormOptions},
    multipart::{FormData, MovieForm},
    pagination::{Paged, paginate},
    projection,
    relations::replace_links,
    storage::{MOVIES_CONTAINER, UploadedFile, public_base_url},
};

/// Movies shown per landing page section.
const LANDING_SIZE: u64 = 6;

pub struct Movies;

impl Resource for Movies {
    type Entity = movie::Entity;
    type Model = movie::Model;
    type Response = MovieDto;

    const PATH: &'static str = "/api/movies";
    const CACHE_TAGS: &'static [&'static str] = &[MOVIES_TAG];

    fn id_column() -> movie::Column {
        movie::Column::Id
    }

    fn id(model: &movie::Model) -> i32 {
        model.id
    }

    fn ordered(query: Select<movie::Entity>) -> Select<movie::Entity> {
        by_release_date(query)
    }
}

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create))
        .route("/landing", cached(get(landing), state, MOVIES_TAG))
        .route("/filter", get(filter))
        .route("/post-get", get(post_get))
        .route("/put-get/{id}", get(put_get))
        .route("/{id}", cached(get(detail), state, MOVIES_TAG).put(update).delete(delete))
}

async fn landing(State(state): State<Arc<AppState>>) -> AppResult<Json<LandingPage>> {
    let today = today();

    let upcoming = MovieFilter { upcoming: true, ..Default::default() }
        .query(today)
        .limit(LANDING_SIZE)
        .all(&state.db)
        .await?;
    let showing_now = MovieFilter { showing_now: true, ..Default::default() }
        .query(today)
        .limit(LANDING_SIZE)
        .all(&state.db)
        .await?;

    Ok(Json(LandingPage {
        upcoming: upcoming.into_iter().map(MovieDto::from).collect(),
        showing_now: showing_now.into_iter().map(MovieDto::from).collect(),
    }))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieDetailDto>> {
    projection::load_movie_detail(&state.db, id).await.map(Json)
}

async fn filter(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
) -> AppResult<Paged<MovieDto>> {
    let page = paginate(&state.db, filter.query(today()), &filter.pagination()).await?;
    Ok(page.map(MovieDto::from))
}

async fn post_get(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<MovieFormOptions>> {
    projection::form_options(&state.db).await.map(Json)
}

async fn put_get(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieEditForm>> {
    projection::load_edit_form(&state.db, id).await.map(Json)
}

async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MovieForm::parse(FormData::read(multipart).await?)?;
    let poster = store_poster(&state, &headers, form.poster.as_ref()).await?;

    let saved = async {
        let txn = state.db.begin().await?;
        let model = movie::ActiveModel {
            title: Set(form.title),
            trailer: Set(form.trailer),
            release_date: Set(form.release_date.to_string()),
            poster: Set(poster.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        replace_links(&txn, model.id, &form.links).await?;
        txn.commit().await?;
        Ok::<_, DbErr>(model)
    }
    .await;

    let model = match saved {
        Ok(model) => model,
        Err(err) => {
            remove_poster(&state, poster.as_deref()).await;
            return Err(err.into());
        },
    };

    crud::evict::<Movies>(&state);
    debug!(id = model.id, title = %model.title, user_id = user.id, "movie created");
    Ok(crud::created(Movies::PATH, model.id, MovieDto::from(model)))
}

/// Overwrites the movie's fields and resyncs every link. The stored poster is
/// kept unless a new one is uploaded.
async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let form = MovieForm::parse(FormData::read(multipart).await?)?;
    let current = crud::find::<Movies>(&state, id).await?;
    let previous_poster = current.poster.clone();

    let new_poster = store_poster(&state, &headers, form.poster.as_ref()).await?;

    let saved = async {
        let txn = state.db.begin().await?;
        let mut active = current.into_active_model();
        active.title = Set(form.title);
        active.trailer = Set(form.trailer);
        active.release_date = Set(form.release_date.to_string());
        if new_poster.is_some() {
            active.poster = Set(new_poster.clone());
        }
        active.update(&txn).await?;
        replace_links(&txn, id, &form.links).await?;
        txn.commit().await
    }
    .await;

    if let Err(err) = saved {
        remove_poster(&state, new_poster.as_deref()).await;
        return Err(err.into());
    }
    if new_poster.is_some() {
        remove_poster(&state, previous_poster.as_deref()).await;
    }

    crud::evict::<Movies>(&state);
    debug!(id, user_id = user.id, "movie updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let current = crud::find::<Movies>(&state, id).await?;
    let status = crud::delete::<Movies>(&state, id).await?;
    remove_poster(&state, current.poster.as_deref()).await;
    Ok(status)
}

async fn store_poster(
    state: &AppState,
    headers: &HeaderMap,
    poster: Option<&UploadedFile>,
) -> AppResult<Option<String>> {
    let Some(file) = poster else {
        return Ok(None);
    };
    let base = public_base_url(state.config.public_url.as_deref(), headers);
    state.storage.store(MOVIES_CONTAINER, file, &base).await.map(Some)
}

async fn remove_poster(state: &AppState, url: Option<&str>) {
    if let Err(err) = state.storage.delete(url, MOVIES_CONTAINER).await {
        warn!(error = %err, "failed to remove movie poster");
    }
}
