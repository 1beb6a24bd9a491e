/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router
/// with all routes and middleware.
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /auth/
/// │   ├── POST /login                  # Issue a 1h bearer token
/// │   └── POST /setup_admin            # One-time admin bootstrap
/// └── /api/                            # Bearer token required
///     ├── /viagens ...                 # Trip CRUD + nested destinos
///     ├── /destinos ...                # Destination CRUD + nested despesas
///     ├── /despesas ...                # Expense CRUD
///     ├── /categorias ...              # Category CRUD
///     ├── /meios_pagamento ...         # Payment method CRUD
///     └── /viagens/:id/relatorio|grafico ...  # Reporting
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tripledger_shared::{auth::jwt, models::user::User};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: health and auth
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/setup_admin", post(routes::auth::setup_admin));

    // Protected resource routes, all behind the bearer-token layer
    let api_routes = Router::new()
        // Trips
        .route(
            "/viagens",
            post(routes::trips::create_trip).get(routes::trips::list_trips),
        )
        .route(
            "/viagens/:id_viagem",
            get(routes::trips::get_trip)
                .put(routes::trips::update_trip)
                .delete(routes::trips::delete_trip),
        )
        // Destinations, nested under their trip for create/list
        .route(
            "/viagens/:id_viagem/destinos",
            post(routes::destinations::create_destination)
                .get(routes::destinations::list_destinations),
        )
        .route(
            "/destinos/:id_destino",
            get(routes::destinations::get_destination)
                .put(routes::destinations::update_destination)
                .delete(routes::destinations::delete_destination),
        )
        // Expenses, nested under their destination for create/list
        .route(
            "/destinos/:id_destino/despesas",
            post(routes::expenses::create_expense).get(routes::expenses::list_expenses),
        )
        .route(
            "/despesas/:id_despesa",
            get(routes::expenses::get_expense)
                .put(routes::expenses::update_expense)
                .delete(routes::expenses::delete_expense),
        )
        // Categories
        .route(
            "/categorias",
            post(routes::categories::create_category).get(routes::categories::list_categories),
        )
        .route(
            "/categorias/:id_categoria",
            put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        // Payment methods
        .route(
            "/meios_pagamento",
            post(routes::payment_methods::create_payment_method)
                .get(routes::payment_methods::list_payment_methods),
        )
        .route(
            "/meios_pagamento/:id_meio_pagamento",
            put(routes::payment_methods::update_payment_method)
                .delete(routes::payment_methods::delete_payment_method),
        )
        // Reporting
        .route(
            "/viagens/:id_viagem/relatorio/geral",
            get(routes::reports::general_report),
        )
        .route(
            "/viagens/:id_viagem/grafico/despesas_por_categoria",
            get(routes::reports::chart_by_category),
        )
        .route(
            "/viagens/:id_viagem/grafico/despesas_por_destino",
            get(routes::reports::chart_by_destination),
        )
        .route(
            "/viagens/:id_viagem/grafico/despesas_por_dia",
            get(routes::reports::chart_by_day),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bearer token authentication middleware
///
/// Extracts and validates the JWT from the Authorization header, then
/// resolves the claims to the current user row and injects it into
/// request extensions. A token whose subject no longer exists is
/// rejected the same way as an invalid one.
async fn bearer_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use crate::error::ApiError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Token is missing".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Bearer token malformed".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
