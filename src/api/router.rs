use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes — require a Bearer token resolving to a user
    let protected = Router::new()
        .route("/api/me", get(handlers::users::me))
        // Accounts
        .route(
            "/api/accounts",
            get(handlers::accounts::list).post(handlers::accounts::create),
        )
        .route(
            "/api/accounts/:id",
            get(handlers::accounts::detail)
                .put(handlers::accounts::update)
                .delete(handlers::accounts::delete),
        )
        // Trades
        .route(
            "/api/trades",
            get(handlers::trades::list).post(handlers::trades::create),
        )
        .route(
            "/api/trades/:id",
            get(handlers::trades::detail)
                .put(handlers::trades::update)
                .delete(handlers::trades::delete),
        )
        // Setup strategies
        .route(
            "/api/setup-strategies",
            get(handlers::strategies::list_strategies).post(handlers::strategies::create_strategy),
        )
        .route(
            "/api/setup-strategies/:id",
            get(handlers::strategies::strategy_detail)
                .put(handlers::strategies::update_strategy)
                .delete(handlers::strategies::delete_strategy),
        )
        // Entry types
        .route(
            "/api/entry-types",
            get(handlers::strategies::list_entry_types)
                .post(handlers::strategies::create_entry_type),
        )
        .route(
            "/api/entry-types/:id",
            get(handlers::strategies::entry_type_detail)
                .put(handlers::strategies::update_entry_type)
                .delete(handlers::strategies::delete_entry_type),
        )
        // Dashboard
        .route("/api/dashboard/metrics", get(handlers::dashboard::summary))
        .route(
            "/api/dashboard/equity-curve",
            get(handlers::dashboard::equity_curve),
        )
        .route(
            "/api/dashboard/pnl-over-time",
            get(handlers::dashboard::pnl_over_time),
        )
        // Calendar
        .route("/api/calendar/monthly", get(handlers::calendar::monthly))
        // Screenshots
        .route("/api/screenshots", post(handlers::screenshots::create))
        .route("/api/screenshots/:id", delete(handlers::screenshots::delete))
        // Generic documentation
        .route(
            "/api/documentation",
            get(handlers::documentation::list_widgets),
        )
        .route(
            "/api/documentation-items",
            get(handlers::documentation::list_items).post(handlers::documentation::create_item),
        )
        .route(
            "/api/documentation-items/replace",
            put(handlers::documentation::replace_items),
        )
        .route(
            "/api/documentation-items/:id",
            delete(handlers::documentation::delete_item),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // CORS: the API is token-authenticated, origins stay open
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
