/// HTTP routing
use crate::{api, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the application router
pub fn create_router(app_state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(api::health::root))
        .route("/health", get(api::health::health))
        .route("/users", post(api::users::create_user))
        .route("/users/role/:email", get(api::users::get_user_role))
        .route("/search-donors", get(api::users::search_donors))
        .route("/search-requests", get(api::requests::search_requests))
        .route("/pending-requests", get(api::requests::pending_requests));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users/:email", get(api::users::get_user))
        .route("/update-profile/:email", patch(api::users::update_profile))
        .route("/update/user/status", patch(api::users::update_user_status))
        .route("/update/user/role", patch(api::users::update_user_role))
        // Donation requests
        .route("/requests", post(api::requests::create_request))
        .route("/all-requests", get(api::requests::all_requests))
        .route("/my-request", get(api::requests::my_requests))
        .route("/details/:id", get(api::requests::request_details))
        .route("/donate-blood/:id", patch(api::requests::donate_blood))
        .route(
            "/delete-my-request/:id",
            delete(api::requests::delete_my_request),
        )
        .route("/update/:id", put(api::requests::update_request))
        .route(
            "/update/request/status",
            patch(api::requests::update_request_status),
        )
        // Dashboard
        .route("/stats", get(api::stats::stats))
        // Funding
        .route(
            "/create-payment-checkout",
            post(api::payments::create_payment_checkout),
        )
        .route("/success-payment", post(api::payments::success_payment))
        .route("/all-funds", get(api::payments::all_funds))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&app_state.identity),
            middleware::auth_middleware,
        ));

    // Combine routes
    public_routes
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
