//! Read-side shapes of a movie: detail, create form and edit form.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entities::{actor, cinema, genre, movie, movie_actor, movie_cinema, movie_genre},
    error::{AppError, AppResult},
    models::{
        CastMemberDto, CinemaDto, GenreDto, MovieDetailDto, MovieDto, MovieEditForm,
        MovieFormOptions,
    },
};

/// Something identified by an integer id.
pub trait Identified {
    fn id(&self) -> i32;
}

impl Identified for GenreDto {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Identified for CinemaDto {
    fn id(&self) -> i32 {
        self.id
    }
}

/// Splits `all` into the items whose id is in `selected` and the rest, keeping
/// the order of `all` on both sides.
pub fn partition_by_ids<T: Identified>(all: Vec<T>, selected: &[T]) -> (Vec<T>, Vec<T>) {
    let ids: HashSet<i32> = selected.iter().map(Identified::id).collect();
    all.into_iter().partition(|item| ids.contains(&item.id()))
}

pub async fn load_movie_detail<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<MovieDetailDto> {
    let movie = movie::Entity::find_by_id(id).one(db).await?.ok_or(AppError::NotFound)?;

    let genres = movie_genre::Entity::find()
        .filter(movie_genre::Column::MovieId.eq(id))
        .find_also_related(genre::Entity)
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, genre)| genre.map(GenreDto::from))
        .collect();

    let cinemas = movie_cinema::Entity::find()
        .filter(movie_cinema::Column::MovieId.eq(id))
        .find_also_related(cinema::Entity)
        .order_by_asc(cinema::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, cinema)| cinema.map(CinemaDto::from))
        .collect();

    let actors = movie_actor::Entity::find()
        .filter(movie_actor::Column::MovieId.eq(id))
        .find_also_related(actor::Entity)
        .order_by_asc(movie_actor::Column::DisplayOrder)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(link, actor)| actor.map(|actor| CastMemberDto::new(link, actor)))
        .collect();

    Ok(MovieDetailDto { movie: MovieDto::from(movie), genres, cinemas, actors })
}

pub async fn form_options<C: ConnectionTrait>(db: &C) -> AppResult<MovieFormOptions> {
    let genres = genre::Entity::find()
        .order_by_asc(genre::Column::Name)
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await?;
    let cinemas = cinema::Entity::find()
        .order_by_asc(cinema::Column::Name)
        .order_by_asc(cinema::Column::Id)
        .all(db)
        .await?;

    Ok(MovieFormOptions {
        genres: genres.into_iter().map(GenreDto::from).collect(),
        cinemas: cinemas.into_iter().map(CinemaDto::from).collect(),
    })
}

pub fn edit_form(detail: MovieDetailDto, options: MovieFormOptions) -> MovieEditForm {
    let (selected_genres, unselected_genres) = partition_by_ids(options.genres, &detail.genres);
    let (selected_cinemas, unselected_cinemas) = partition_by_ids(options.cinemas, &detail.cinemas);

    let mut actors = detail.actors;
    actors.sort_by_key(|a| a.order);

    MovieEditForm {
        movie: detail.movie,
        selected_genres,
        unselected_genres,
        selected_cinemas,
        unselected_cinemas,
        actors,
    }
}

pub async fn load_edit_form<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<MovieEditForm> {
    let detail = load_movie_detail(db, id).await?;
    let options = form_options(db).await?;
    Ok(edit_form(detail, options))
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::{
        relations::{CastInput, MovieLinks, replace_links},
        test_support,
    };

    fn genres(ids: &[i32]) -> Vec<GenreDto> {
        ids.iter().map(|&id| GenreDto { id, name: format!("G{id}") }).collect()
    }

    fn ids(items: &[GenreDto]) -> Vec<i32> {
        items.iter().map(|g| g.id).collect()
    }

    #[test]
    fn selected_and_unselected_partition_the_set() {
        let (selected, unselected) = partition_by_ids(genres(&[1, 2, 3, 4]), &genres(&[1, 3]));
        assert_eq!(ids(&selected), [1, 3]);
        assert_eq!(ids(&unselected), [2, 4]);
    }

    #[test]
    fn nothing_selected() {
        let (selected, unselected) = partition_by_ids(genres(&[5, 6]), &[]);
        assert!(selected.is_empty());
        assert_eq!(ids(&unselected), [5, 6]);
    }

    #[tokio::test]
    async fn missing_movie_is_not_found() {
        let (state, _dir) = test_support::state().await;
        assert!(matches!(load_movie_detail(&state.db, 3).await, Err(AppError::NotFound)));
        assert!(matches!(load_edit_form(&state.db, 3).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn edit_form_splits_links_and_orders_cast() {
        let (state, _dir) = test_support::state().await;
        let db = &state.db;

        for name in ["Action", "Comedy", "Drama", "Horror"] {
            genre::ActiveModel { name: Set(name.to_string()), ..Default::default() }
                .insert(db)
                .await
                .unwrap();
        }
        cinema::ActiveModel {
            name: Set("Odeon".to_string()),
            latitude: Set(51.5),
            longitude: Set(-0.12),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        for name in ["Sigourney", "Tom"] {
            actor::ActiveModel {
                name: Set(name.to_string()),
                birth_date: Set("1949-10-08".to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
        let movie = movie::ActiveModel {
            title: Set("Alien".to_string()),
            release_date: Set("1979-05-25".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let links = MovieLinks {
            genre_ids: vec![3, 1],
            cinema_ids: vec![],
            cast: vec![
                CastInput { id: 2, character: "Dallas".to_string() },
                CastInput { id: 1, character: "Ripley".to_string() },
            ],
        };
        replace_links(db, movie.id, &links).await.unwrap();

        let form = load_edit_form(db, movie.id).await.unwrap();
        assert_eq!(form.movie.title, "Alien");
        assert_eq!(ids(&form.selected_genres), [1, 3]);
        assert_eq!(ids(&form.unselected_genres), [2, 4]);
        assert!(form.selected_cinemas.is_empty());
        assert_eq!(form.unselected_cinemas.len(), 1);

        let cast: Vec<(i32, &str, i32)> =
            form.actors.iter().map(|a| (a.id, a.character.as_str(), a.order)).collect();
        assert_eq!(cast, [(2, "Dallas", 0), (1, "Ripley", 1)]);
    }
}
