use crate::error::ApiResult;
use crate::metrics::{OpTimer, SEARCH_RESULTS};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookbay_core::{
    catalog::{self, RELATED_LIMIT},
    filter, Book, Category, FilterState, SearchParams,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total: usize,
    pub query: String,
    pub filters: FilterState,
    pub has_active_filters: bool,
    pub books: Vec<Book>,
    /// Parameters a browser would keep in its address bar.
    pub mirror: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Limit {
    pub limit: Option<usize>,
}

pub async fn search(
    State(app): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let _t = OpTimer::start("search");
    let filters = params.filters();
    let books = filter(app.catalog.books(), &params.q, &filters);
    SEARCH_RESULTS.observe(books.len() as f64);
    tracing::debug!(q = %params.q, hits = books.len(), "search");
    Json(SearchResponse {
        total: books.len(),
        mirror: SearchParams::mirror(&params.q, &filters),
        has_active_filters: filters.has_active_filters(),
        query: params.q,
        filters,
        books,
    })
}

pub async fn featured(State(app): State<AppState>) -> Json<Vec<Book>> {
    Json(catalog::featured(app.catalog.books()))
}

pub async fn best_sellers(
    State(app): State<AppState>,
    Query(limit): Query<Limit>,
) -> Json<Vec<Book>> {
    let mut books = catalog::best_sellers(app.catalog.books());
    if let Some(n) = limit.limit {
        books.truncate(n);
    }
    Json(books)
}

pub async fn get_book(State(app): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Book>> {
    let _t = OpTimer::start("get_book");
    Ok(Json(app.catalog.book(&id)?.clone()))
}

pub async fn related(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(limit): Query<Limit>,
) -> ApiResult<Json<Vec<Book>>> {
    let book = app.catalog.book(&id)?;
    Ok(Json(catalog::related(
        app.catalog.books(),
        book,
        limit.limit.unwrap_or(RELATED_LIMIT),
    )))
}

pub async fn categories(State(app): State<AppState>) -> Json<Vec<Category>> {
    Json(app.catalog.categories().to_vec())
}
