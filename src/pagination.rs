//! Page slicing for list endpoints.
//!
//! The total number of matching records travels in the [`TOTAL_RECORDS_HEADER`]
//! response header; the body only carries the requested page.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const TOTAL_RECORDS_HEADER: &str = "total-records";

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    #[cfg(test)]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page: Some(page), page_size: Some(page_size) }
    }

    /// 1-based; anything below 1 falls back to the first page.
    pub fn page(&self) -> u64 {
        match self.page {
            Some(page) if page >= 1 => page as u64,
            _ => 1,
        }
    }

    pub fn page_size(&self) -> u64 {
        match self.page_size {
            Some(size) if size >= 1 => (size as u64).min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Capped at `i64::MAX`, the largest offset the database accepts.
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.page_size()).min(i64::MAX as u64)
    }
}

/// One page of results plus the pre-slice total.
#[derive(Clone, Debug, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Paged<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paged<U> {
        Paged { items: self.items.into_iter().map(f).collect(), total: self.total }
    }
}

impl<T: Serialize> IntoResponse for Paged<T> {
    fn into_response(self) -> Response {
        ([(TOTAL_RECORDS_HEADER, self.total.to_string())], Json(self.items)).into_response()
    }
}

/// Counts `query` with its filters applied, then fetches the requested slice.
///
/// The query must already carry a total ordering, otherwise rows may repeat or
/// go missing across pages.
pub async fn paginate<E, C>(
    db: &C,
    query: Select<E>,
    pagination: &Pagination,
) -> AppResult<Paged<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync + 'static,
    C: ConnectionTrait,
{
    let total = query.clone().count(db).await?;
    let items = query.offset(pagination.offset()).limit(pagination.page_size()).all(db).await?;

    Ok(Paged { items, total })
}
