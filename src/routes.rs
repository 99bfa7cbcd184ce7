use axum::{extract::DefaultBodyLimit, middleware, Router};

use crate::auth::accounts;
use crate::auth::middleware::JwtSecret;
use crate::pages::crud as page_crud;
use crate::state::AppState;
use crate::uploads::store;

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", axum::routing::post(accounts::register))
        .route("/api/auth/login", axum::routing::post(accounts::login));

    // Landing page routes. Reads are public; mutations take the Claims
    // extractor and are rejected before the handler runs when the bearer
    // token is missing or invalid.
    // Note: one pattern serves GET-by-slug and PUT/DELETE-by-id, since the
    // router cannot hold two patterns differing only in parameter name.
    // The body limit sits above the per-image cap so oversized uploads
    // reach the store's own 413 check instead of the framework default.
    let page_routes = Router::new()
        .route(
            "/api/landing-pages",
            axum::routing::get(page_crud::list_pages).post(page_crud::create_page),
        )
        .route(
            "/api/landing-pages/{id}",
            axum::routing::get(page_crud::get_page_by_slug)
                .put(page_crud::update_page)
                .delete(page_crud::delete_page),
        )
        .layer(DefaultBodyLimit::max(2 * store::MAX_IMAGE_BYTES));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(auth_routes)
        .merge(page_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
