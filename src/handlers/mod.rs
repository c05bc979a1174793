pub mod accounts;
pub mod auth;
pub mod budget;
pub mod categories;
pub mod transactions;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_user;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // Session
        .route("/auth/me", get(auth::me))
        // Accounts
        .route("/accounts", get(accounts::index).post(accounts::create))
        .route(
            "/accounts/:id",
            get(accounts::show)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        // Categories
        .route("/categories", get(categories::index).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        // Transactions
        .route(
            "/transactions",
            get(transactions::index).post(transactions::create),
        )
        .route(
            "/transactions/:id",
            get(transactions::show)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        // Budget
        .route("/budget/:month", get(budget::show))
        .route("/budget/:month/categories/:id", post(budget::assign))
        .route("/budget/:month/rollover", post(budget::rollover))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(health))
        .merge(protected)
}

async fn health() -> &'static str {
    "OK"
}
