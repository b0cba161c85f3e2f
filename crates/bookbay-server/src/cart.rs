use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::metrics::OpTimer;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use bookbay_core::{Cart, CartSummary, MarketError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub book_id: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: String,
}

async fn edit(
    app: &AppState,
    user_id: &str,
    edit: impl FnOnce(&mut Cart) -> bookbay_core::Result<()> + Send + 'static,
) -> ApiResult<Json<CartSummary>> {
    let cart = app.store.update_cart(user_id, Box::new(edit)).await?;
    Ok(Json(cart.summarize(app.catalog.books())))
}

fn require_item(cart: &Cart, book_id: &str) -> bookbay_core::Result<()> {
    match cart.quantity_of(book_id) {
        Some(_) => Ok(()),
        None => Err(MarketError::NotFound),
    }
}

pub async fn get_cart(State(app): State<AppState>, me: CurrentUser) -> ApiResult<Json<CartSummary>> {
    let cart = app.store.get_cart(&me.user.id).await?;
    Ok(Json(cart.summarize(app.catalog.books())))
}

pub async fn add_item(
    State(app): State<AppState>,
    me: CurrentUser,
    Json(req): Json<AddItem>,
) -> ApiResult<Json<CartSummary>> {
    let _t = OpTimer::start("cart_add");
    app.catalog.book(&req.book_id)?;
    let quantity = req.quantity.unwrap_or(1);
    edit(&app, &me.user.id, move |cart| cart.add(&req.book_id, quantity)).await
}

/// A quantity below 1 leaves the line untouched.
pub async fn set_quantity(
    State(app): State<AppState>,
    me: CurrentUser,
    Path(book_id): Path<String>,
    Json(req): Json<SetQuantity>,
) -> ApiResult<Json<CartSummary>> {
    let _t = OpTimer::start("cart_set");
    edit(&app, &me.user.id, move |cart| {
        require_item(cart, &book_id)?;
        cart.set_quantity(&book_id, req.quantity).map(|_| ())
    })
    .await
}

pub async fn decrement(
    State(app): State<AppState>,
    me: CurrentUser,
    Path(book_id): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    let _t = OpTimer::start("cart_decrement");
    edit(&app, &me.user.id, move |cart| {
        require_item(cart, &book_id)?;
        cart.decrement(&book_id);
        Ok(())
    })
    .await
}

pub async fn remove_item(
    State(app): State<AppState>,
    me: CurrentUser,
    Path(book_id): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    let _t = OpTimer::start("cart_remove");
    edit(&app, &me.user.id, move |cart| {
        require_item(cart, &book_id)?;
        cart.remove(&book_id);
        Ok(())
    })
    .await
}

pub async fn apply_coupon(
    State(app): State<AppState>,
    me: CurrentUser,
    Json(req): Json<CouponRequest>,
) -> ApiResult<Json<CartSummary>> {
    edit(&app, &me.user.id, move |cart| cart.apply_coupon(&req.code)).await
}

pub async fn clear_coupon(
    State(app): State<AppState>,
    me: CurrentUser,
) -> ApiResult<Json<CartSummary>> {
    edit(&app, &me.user.id, |cart| {
        cart.clear_coupon();
        Ok(())
    })
    .await
}
