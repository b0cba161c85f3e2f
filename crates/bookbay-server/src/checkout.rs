use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::metrics::{OpTimer, CHECKOUT_TOTAL};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use bookbay_core::{
    validate, Cart, DeliveryAddress, MarketError, Order, OrderStatus, PaymentMethod, UserId,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::{collections::HashSet, sync::Arc};

/// Users with a checkout in flight.
#[derive(Clone, Default)]
pub struct CheckoutGate {
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl CheckoutGate {
    /// Marks `user_id` busy until the returned guard drops.
    pub fn try_begin(&self, user_id: &str) -> Result<CheckoutGuard, MarketError> {
        if !self.in_flight.lock().insert(user_id.to_string()) {
            return Err(MarketError::Busy("a checkout is already in progress".into()));
        }
        Ok(CheckoutGuard {
            gate: self.clone(),
            user_id: user_id.to_string(),
        })
    }

    pub fn is_busy(&self, user_id: &str) -> bool {
        self.in_flight.lock().contains(user_id)
    }
}

pub struct CheckoutGuard {
    gate: CheckoutGate,
    user_id: UserId,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.gate.in_flight.lock().remove(&self.user_id);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub delivery: DeliveryAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Simulated payment: waits the configured delay, then always succeeds.
pub async fn checkout(
    State(app): State<AppState>,
    me: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let _t = OpTimer::start("checkout");
    let result = place_order(&app, &me, req).await;
    let label = match &result {
        Ok(_) => "ok",
        Err(e) if matches!(e.0, MarketError::Busy(_)) => "busy",
        Err(_) => "rejected",
    };
    CHECKOUT_TOTAL.with_label_values(&[label]).inc();
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn place_order(app: &AppState, me: &CurrentUser, req: CheckoutRequest) -> ApiResult<Order> {
    validate::delivery(&req.delivery)?;
    let _busy = app.checkout.try_begin(&me.user.id)?;

    let cart = app.store.get_cart(&me.user.id).await?;
    let summary = cart.summarize(app.catalog.books());
    if summary.lines.is_empty() {
        return Err(MarketError::Invalid("your cart is empty".into()).into());
    }

    tokio::time::sleep(app.config.checkout_delay).await;

    let order = Order {
        id: format!("ord_{}", ulid::Ulid::new()),
        user_id: me.user.id.clone(),
        lines: summary.order_lines(),
        subtotal: summary.subtotal,
        shipping: summary.shipping,
        discount: summary.discount,
        total: summary.total,
        coupon: summary.coupon.clone(),
        delivery: req.delivery,
        payment_method: req.payment_method,
        status: OrderStatus::Placed,
        created_at: chrono::Utc::now(),
    };
    let order = app.store.append_order(order).await?;
    // edits made while the payment was pending stay in the cart
    let ordered = order.lines.clone();
    let coupon_used = order.coupon.is_some();
    app.store
        .update_cart(
            &me.user.id,
            Box::new(move |cart: &mut Cart| {
                cart.settle(&ordered, coupon_used);
                Ok(())
            }),
        )
        .await?;
    tracing::info!(user = %me.user.id, order = %order.id, total = order.total, "order placed");
    Ok(order)
}

/// The caller's orders, newest first.
pub async fn list_orders(State(app): State<AppState>, me: CurrentUser) -> ApiResult<Json<Vec<Order>>> {
    let mut orders = app.store.list_orders(&me.user.id).await?;
    orders.reverse();
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_busy_until_guard_drops() {
        let gate = CheckoutGate::default();
        let guard = gate.try_begin("u1").unwrap();
        assert!(gate.is_busy("u1"));
        assert!(matches!(gate.try_begin("u1"), Err(MarketError::Busy(_))));
        assert!(gate.try_begin("u2").is_ok());
        drop(guard);
        assert!(!gate.is_busy("u1"));
        assert!(gate.try_begin("u1").is_ok());
    }
}
