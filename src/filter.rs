use jiff::civil::Date;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select,
    sea_query::{LikeExpr, Query},
};
use serde::Deserialize;

use crate::{
    entities::{movie, movie_cinema, movie_genre},
    pagination::Pagination,
};

/// Query string of `GET /api/movies/filter`.
///
/// Every criterion left at its default (`None`, blank, `0`, `false`) is skipped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub genre_id: Option<i32>,
    pub showing_now: bool,
    pub upcoming: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl MovieFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, page_size: self.page_size }
    }

    /// Builds the conjunction of the active criteria, ordered by release date.
    ///
    /// `today` is a civil date, so "upcoming" compares without time of day.
    pub fn query(&self, today: Date) -> Select<movie::Entity> {
        let mut query = movie::Entity::find();

        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(movie::Column::Title.like(contains_pattern(title)));
        }

        if self.showing_now {
            query = query.filter(
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_cinema::Column::MovieId)
                        .from(movie_cinema::Entity)
                        .to_owned(),
                ),
            );
        }

        if self.upcoming {
            query = query.filter(movie::Column::ReleaseDate.gt(today.to_string()));
        }

        if let Some(genre_id) = self.genre_id.filter(|id| *id != 0) {
            query = query.filter(
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_genre::Column::MovieId)
                        .from(movie_genre::Entity)
                        .and_where(movie_genre::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }

        by_release_date(query)
    }
}

pub fn by_release_date(query: Select<movie::Entity>) -> Select<movie::Entity> {
    query.order_by_asc(movie::Column::ReleaseDate).order_by_asc(movie::Column::Id)
}

/// `LIKE` pattern matching `needle` anywhere, with wildcards in it taken literally.
pub fn contains_pattern(needle: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

pub fn today() -> Date {
    jiff::Zoned::now().date()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use jiff::civil::date;
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::{
        entities::{cinema, genre},
        pagination::paginate,
        test_support,
    };

    const TODAY: Date = date(2025, 6, 15);

    async fn seed(db: &sea_orm::DatabaseConnection) {
        for name in ["Drama", "Comedy"] {
            genre::ActiveModel { name: Set(name.to_string()), ..Default::default() }
                .insert(db)
                .await
                .unwrap();
        }
        cinema::ActiveModel {
            name: Set("Roxy".to_string()),
            latitude: Set(0.0),
            longitude: Set(0.0),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        // (title, release date, genres, in cinemas)
        let movies: [(&str, &str, &[i32], bool); 5] = [
            ("The Matrix", "1999-03-31", &[1], true),
            ("Matrix 100%", "2025-06-15", &[2], false),
            ("Future Drama", "2025-06-16", &[1], false),
            ("Future Comedy", "2026-01-01", &[2], true),
            ("Old Matrix Comedy", "1980-01-01", &[1, 2], false),
        ];
        for (title, release, genres, showing) in movies {
            let saved = movie::ActiveModel {
                title: Set(title.to_string()),
                release_date: Set(release.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
            for genre_id in genres {
                movie_genre::ActiveModel { movie_id: Set(saved.id), genre_id: Set(*genre_id) }
                    .insert(db)
                    .await
                    .unwrap();
            }
            if showing {
                movie_cinema::ActiveModel { movie_id: Set(saved.id), cinema_id: Set(1) }
                    .insert(db)
                    .await
                    .unwrap();
            }
        }
    }

    async fn titles(db: &sea_orm::DatabaseConnection, filter: MovieFilter) -> Vec<String> {
        filter.query(TODAY).all(db).await.unwrap().into_iter().map(|m| m.title).collect()
    }

    fn as_set(titles: &[String]) -> BTreeSet<String> {
        titles.iter().cloned().collect()
    }

    #[tokio::test]
    async fn no_criteria_returns_everything_by_release_date() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let all = titles(&state.db, MovieFilter::default()).await;
        assert_eq!(
            all,
            ["Old Matrix Comedy", "The Matrix", "Matrix 100%", "Future Drama", "Future Comedy"]
        );
    }

    #[tokio::test]
    async fn zero_values_add_no_predicate() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter =
            MovieFilter { title: Some("   ".to_string()), genre_id: Some(0), ..Default::default() };
        assert_eq!(titles(&state.db, filter).await.len(), 5);
    }

    #[tokio::test]
    async fn title_is_a_case_insensitive_substring() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter { title: Some("matrix".to_string()), ..Default::default() };
        assert_eq!(titles(&state.db, filter).await, ["Old Matrix Comedy", "The Matrix", "Matrix 100%"]);
    }

    #[tokio::test]
    async fn title_wildcards_are_literal() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter { title: Some("100%".to_string()), ..Default::default() };
        assert_eq!(titles(&state.db, filter).await, ["Matrix 100%"]);

        let filter = MovieFilter { title: Some("_".to_string()), ..Default::default() };
        assert!(titles(&state.db, filter).await.is_empty());
    }

    #[tokio::test]
    async fn upcoming_is_strictly_after_today() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter { upcoming: true, ..Default::default() };
        assert_eq!(titles(&state.db, filter).await, ["Future Drama", "Future Comedy"]);
    }

    #[tokio::test]
    async fn showing_now_requires_a_cinema_link() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter { showing_now: true, ..Default::default() };
        assert_eq!(titles(&state.db, filter).await, ["The Matrix", "Future Comedy"]);
    }

    #[tokio::test]
    async fn genre_membership() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter { genre_id: Some(2), ..Default::default() };
        assert_eq!(
            titles(&state.db, filter).await,
            ["Old Matrix Comedy", "Matrix 100%", "Future Comedy"]
        );
    }

    #[tokio::test]
    async fn combined_criteria_intersect() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let by_title = MovieFilter { title: Some("Matrix".to_string()), ..Default::default() };
        let by_genre = MovieFilter { genre_id: Some(1), ..Default::default() };
        let both = MovieFilter {
            title: Some("Matrix".to_string()),
            genre_id: Some(1),
            ..Default::default()
        };

        let expected: BTreeSet<String> = as_set(&titles(&state.db, by_title).await)
            .intersection(&as_set(&titles(&state.db, by_genre).await))
            .cloned()
            .collect();
        let combined = as_set(&titles(&state.db, both).await);

        assert_eq!(combined, expected);
        assert_eq!(combined.len(), 2);
    }

    #[tokio::test]
    async fn count_is_taken_after_filtering() {
        let (state, _dir) = test_support::state().await;
        seed(&state.db).await;

        let filter = MovieFilter {
            upcoming: true,
            page: Some(1),
            page_size: Some(1),
            ..Default::default()
        };
        let paged =
            paginate(&state.db, filter.query(TODAY), &filter.pagination()).await.unwrap();
        assert_eq!(paged.total, 2);
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.items[0].title, "Future Drama");
    }
}
