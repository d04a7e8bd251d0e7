//! Link records between a movie and its genres, cinemas and cast.
//!
//! Links are owned by the movie and always written as a full set: saving a
//! movie deletes whatever links it had and inserts the submitted lists.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::debug;

use crate::entities::{movie_actor, movie_cinema, movie_genre};

/// One `(actor, character)` pair as submitted by the client. Form clients send
/// either camelCase or PascalCase keys.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CastInput {
    #[serde(alias = "Id", alias = "ID")]
    pub id: i32,
    #[serde(alias = "Character")]
    pub character: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovieLinks {
    pub genre_ids: Vec<i32>,
    pub cinema_ids: Vec<i32>,
    pub cast: Vec<CastInput>,
}

impl MovieLinks {
    pub fn genre_links(&self, movie_id: i32) -> Vec<movie_genre::ActiveModel> {
        self.genre_ids
            .iter()
            .map(|&genre_id| movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(genre_id),
            })
            .collect()
    }

    pub fn cinema_links(&self, movie_id: i32) -> Vec<movie_cinema::ActiveModel> {
        self.cinema_ids
            .iter()
            .map(|&cinema_id| movie_cinema::ActiveModel {
                movie_id: Set(movie_id),
                cinema_id: Set(cinema_id),
            })
            .collect()
    }

    /// Display order is the position in the submitted list, starting at 0.
    pub fn cast_links(&self, movie_id: i32) -> Vec<movie_actor::ActiveModel> {
        self.cast
            .iter()
            .enumerate()
            .map(|(order, member)| movie_actor::ActiveModel {
                movie_id: Set(movie_id),
                actor_id: Set(member.id),
                character: Set(member.character.trim().to_string()),
                display_order: Set(order as i32),
            })
            .collect()
    }
}

/// Replaces every link of `movie_id` with `links`.
///
/// Referenced ids are not checked here; the store's foreign keys reject
/// unknown ones. Run inside the movie's transaction so a rejection leaves the
/// previous links in place.
pub async fn replace_links<C>(conn: &C, movie_id: i32, links: &MovieLinks) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    movie_cinema::Entity::delete_many()
        .filter(movie_cinema::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    movie_actor::Entity::delete_many()
        .filter(movie_actor::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    let genres = links.genre_links(movie_id);
    if !genres.is_empty() {
        movie_genre::Entity::insert_many(genres).exec_without_returning(conn).await?;
    }

    let cinemas = links.cinema_links(movie_id);
    if !cinemas.is_empty() {
        movie_cinema::Entity::insert_many(cinemas).exec_without_returning(conn).await?;
    }

    let cast = links.cast_links(movie_id);
    if !cast.is_empty() {
        movie_actor::Entity::insert_many(cast).exec_without_returning(conn).await?;
    }

    debug!(
        movie_id,
        genres = links.genre_ids.len(),
        cinemas = links.cinema_ids.len(),
        cast = links.cast.len(),
        "movie links replaced"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, PaginatorTrait, QueryOrder, TransactionTrait};

    use super::*;
    use crate::{
        entities::{actor, cinema, genre, movie},
        test_support,
    };

    fn cast(entries: &[(i32, &str)]) -> Vec<CastInput> {
        entries
            .iter()
            .map(|(id, character)| CastInput { id: *id, character: character.to_string() })
            .collect()
    }

    #[test]
    fn cast_order_follows_submission() {
        let links = MovieLinks {
            cast: cast(&[(9, "Villain"), (7, " Hero "), (3, "Sidekick")]),
            ..Default::default()
        };

        let rows: Vec<(i32, String, i32)> = links
            .cast_links(1)
            .iter()
            .map(|m| {
                (
                    m.actor_id.clone().unwrap(),
                    m.character.clone().unwrap(),
                    m.display_order.clone().unwrap(),
                )
            })
            .collect();

        assert_eq!(
            rows,
            [
                (9, "Villain".to_string(), 0),
                (7, "Hero".to_string(), 1),
                (3, "Sidekick".to_string(), 2)
            ]
        );
    }

    #[test]
    fn one_link_per_entry() {
        let links = MovieLinks { genre_ids: vec![4, 1, 3], cinema_ids: vec![], cast: vec![] };
        let genres: Vec<i32> =
            links.genre_links(8).iter().map(|m| m.genre_id.clone().unwrap()).collect();
        assert_eq!(genres, [4, 1, 3]);
        assert!(links.cinema_links(8).is_empty());
    }

    async fn seed(db: &sea_orm::DatabaseConnection) -> i32 {
        for name in ["Action", "Drama", "Comedy"] {
            genre::ActiveModel { name: Set(name.to_string()), ..Default::default() }
                .insert(db)
                .await
                .unwrap();
        }
        for name in ["Roxy", "Rialto"] {
            cinema::ActiveModel {
                name: Set(name.to_string()),
                latitude: Set(1.0),
                longitude: Set(2.0),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
        for name in ["Keanu", "Carrie", "Laurence"] {
            actor::ActiveModel {
                name: Set(name.to_string()),
                birth_date: Set("1964-09-02".to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
        movie::ActiveModel {
            title: Set("The Matrix".to_string()),
            release_date: Set("1999-03-31".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn genre_ids(db: &sea_orm::DatabaseConnection, movie_id: i32) -> Vec<i32> {
        movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .order_by_asc(movie_genre::Column::GenreId)
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.genre_id)
            .collect()
    }

    #[tokio::test]
    async fn replacing_discards_previous_links() {
        let (state, _dir) = test_support::state().await;
        let movie_id = seed(&state.db).await;

        let first = MovieLinks {
            genre_ids: vec![1, 3],
            cinema_ids: vec![2],
            cast: cast(&[(1, "Neo"), (2, "Trinity")]),
        };
        replace_links(&state.db, movie_id, &first).await.unwrap();
        assert_eq!(genre_ids(&state.db, movie_id).await, [1, 3]);

        let second = MovieLinks {
            genre_ids: vec![3],
            cinema_ids: vec![],
            cast: cast(&[(3, "Morpheus"), (1, "Neo")]),
        };
        replace_links(&state.db, movie_id, &second).await.unwrap();

        assert_eq!(genre_ids(&state.db, movie_id).await, [3]);
        assert_eq!(movie_cinema::Entity::find().count(&state.db).await.unwrap(), 0);

        let cast: Vec<(i32, i32)> = movie_actor::Entity::find()
            .filter(movie_actor::Column::MovieId.eq(movie_id))
            .order_by_asc(movie_actor::Column::DisplayOrder)
            .all(&state.db)
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.actor_id, l.display_order))
            .collect();
        assert_eq!(cast, [(3, 0), (1, 1)]);
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected_and_rolled_back() {
        let (state, _dir) = test_support::state().await;
        let movie_id = seed(&state.db).await;
        let before = MovieLinks { genre_ids: vec![1, 2], ..Default::default() };
        replace_links(&state.db, movie_id, &before).await.unwrap();

        let txn = state.db.begin().await.unwrap();
        let broken = MovieLinks { genre_ids: vec![3, 99], ..Default::default() };
        assert!(replace_links(&txn, movie_id, &broken).await.is_err());
        txn.rollback().await.unwrap();

        assert_eq!(genre_ids(&state.db, movie_id).await, [1, 2]);
    }
}
