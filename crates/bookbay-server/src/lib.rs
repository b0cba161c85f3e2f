pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod listings;
pub mod messages;
pub mod metrics;

use auth::TokenSigner;
use axum::{
    routing::{delete, get, post},
    Router,
};
use bookbay_storage::{CatalogStore, Storage};
use checkout::CheckoutGate;
use config::Config;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub catalog: Arc<dyn CatalogStore>,
    pub tokens: Arc<TokenSigner>,
    pub checkout: CheckoutGate,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, catalog: Arc<dyn CatalogStore>, config: Config) -> Self {
        Self {
            store,
            catalog,
            tokens: Arc::new(TokenSigner::new(&config.session_secret)),
            checkout: CheckoutGate::default(),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(admin::health))
        .route("/v1/books", get(catalog::search))
        .route("/v1/books/featured", get(catalog::featured))
        .route("/v1/books/best-sellers", get(catalog::best_sellers))
        .route("/v1/books/:id", get(catalog::get_book))
        .route("/v1/books/:id/related", get(catalog::related))
        .route("/v1/categories", get(catalog::categories))
        .route("/v1/auth/signup", post(auth::sign_up))
        .route("/v1/auth/signin", post(auth::sign_in))
        .route("/v1/auth/signout", post(auth::sign_out))
        .route("/v1/me", get(auth::me))
        .route("/v1/users", get(auth::search_users))
        .route("/v1/cart", get(cart::get_cart))
        .route("/v1/cart/items", post(cart::add_item))
        .route(
            "/v1/cart/items/:book_id",
            delete(cart::remove_item).put(cart::set_quantity),
        )
        .route("/v1/cart/items/:book_id/decrement", post(cart::decrement))
        .route(
            "/v1/cart/coupon",
            post(cart::apply_coupon).delete(cart::clear_coupon),
        )
        .route("/v1/checkout", post(checkout::checkout))
        .route("/v1/orders", get(checkout::list_orders))
        .route("/v1/messages", get(messages::inbox).post(messages::send))
        .route("/v1/messages/:id", delete(messages::delete))
        .route("/v1/messages/:id/read", post(messages::mark_read))
        .route("/v1/listings", post(listings::submit))
        .route("/admin/snapshot", post(admin::snapshot))
        .route("/admin/manifest", get(admin::manifest))
        .route("/metrics", get(metrics::render))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Periodically drops expired sessions and refreshes the store gauges.
pub fn spawn_session_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(state.config.session_sweep);
        loop {
            tick.tick().await;
            match state.store.sweep_expired_sessions(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(removed = n, "expired sessions swept"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
            metrics::record_stats(state.store.stats());
        }
    })
}
