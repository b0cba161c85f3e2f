use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::metrics::OpTimer;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use bookbay_core::{validate, Book, ListingDraft};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ListingReceipt {
    pub listing: Book,
    pub published: bool,
}

/// Validates a draft and returns how it would appear in the catalog.
/// The catalog is read-only, so nothing is stored.
pub async fn submit(
    State(app): State<AppState>,
    me: CurrentUser,
    Json(draft): Json<ListingDraft>,
) -> ApiResult<(StatusCode, Json<ListingReceipt>)> {
    let _t = OpTimer::start("listing_submit");
    let valid = validate::listing(&draft)?;
    tokio::time::sleep(app.config.listing_delay).await;

    let listing = Book {
        id: format!("draft_{}", ulid::Ulid::new()),
        title: draft.title.trim().to_string(),
        author: draft.author.trim().to_string(),
        description: draft.description.trim().to_string(),
        price: valid.price,
        original_price: None,
        condition: valid.condition,
        category: vec![draft.category.trim().to_string()],
        cover_image: draft.images.first().cloned().unwrap_or_default(),
        seller_name: me.user.full_name.clone(),
        seller_rating: 0.0,
        location: String::new(),
        date_added: chrono::Utc::now().date_naive(),
        featured: false,
        best_seller: false,
    };
    tracing::info!(user = %me.user.id, listing = %listing.id, "listing accepted, not published");
    Ok((
        StatusCode::ACCEPTED,
        Json(ListingReceipt {
            listing,
            published: false,
        }),
    ))
}
