use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use geomon_api::audit::PgAuditSink;
use geomon_api::config;
use geomon_api::database::manager::DatabaseManager;
use geomon_api::handlers::{monitoring_config, processing_request, region};
use geomon_api::middleware::principal::principal_middleware;
use geomon_api::permissions::PermissionChecker;
use geomon_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!(environment = ?config.environment, "starting geomon API");

    let pool = DatabaseManager::connect(&config.database).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let audit = Arc::new(PgAuditSink::new(pool.clone()));
    let state = AppState::new(
        pool,
        config.clone(),
        PermissionChecker::with_default_policy(),
        audit,
    );

    let app = app(state);

    // Allow tests or deployments to override the port via env
    let port = std::env::var("GEOMON_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("geomon API listening on http://{bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let enable_cors = state.config.api.enable_cors;

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/geospatial", geospatial_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

fn geospatial_routes() -> Router<AppState> {
    Router::new()
        .nest("/regions", region_routes())
        .nest("/configs", config_routes())
        .nest("/requests", request_routes())
        .route_layer(axum::middleware::from_fn(principal_middleware))
}

fn region_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(region::create))
        .route("/paginate", get(region::fetch_all_by_pagination))
        .route("/search", get(region::search))
        .route(
            "/:id",
            get(region::fetch_one)
                .put(region::update)
                .delete(region::remove),
        )
}

fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(monitoring_config::create))
        .route("/paginate", get(monitoring_config::fetch_all_by_pagination))
        .route("/search", get(monitoring_config::search))
        .route(
            "/:id",
            get(monitoring_config::fetch_one)
                .put(monitoring_config::update)
                .delete(monitoring_config::remove),
        )
}

fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(processing_request::create))
        .route("/paginate", get(processing_request::fetch_all_by_pagination))
        .route("/search", get(processing_request::search))
        .route(
            "/:id",
            get(processing_request::fetch_one)
                .put(processing_request::update)
                .delete(processing_request::remove),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Geomon API",
        "version": version,
        "description": "Geospatial monitoring metadata API",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "regions": "/geospatial/regions/{create,paginate,search,:id}",
            "configs": "/geospatial/configs/{create,paginate,search,:id}",
            "requests": "/geospatial/requests/{create,paginate,search,:id}",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
