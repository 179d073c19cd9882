//! REST API layer: route handlers, DTOs, OpenAPI document, and the
//! complete application router.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and `/ws`
//! live at the root. The `/api/v1` routes can publish to every client and
//! drop connections, so they are only mounted when the admin API is enabled.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "posts-hub",
        description = "Real-time WebSocket hub for posts events"
    ),
    paths(
        handlers::system::health_handler,
        handlers::connections::list_connections,
        handlers::connections::disconnect,
        handlers::events::publish_event,
    ),
    components(schemas(
        handlers::system::HealthResponse,
        dto::ConnectionListResponse,
        dto::PublishEventRequest,
        dto::PublishEventResponse,
        crate::hub::ConnectionInfo,
        crate::hub::ConnectionState,
        crate::hub::BroadcastOutcome,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and service metadata"),
        (name = "Connections", description = "Live WebSocket connections"),
        (name = "Events", description = "Event fan-out"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router. `/health` is always present; the `/api/v1`
/// admin routes only when `admin_api` is set.
pub fn build_router(admin_api: bool) -> Router<AppState> {
    let router = Router::new().merge(handlers::system::routes());
    if admin_api {
        router.nest("/api/v1", handlers::routes())
    } else {
        router
    }
}

/// Builds the full application: REST, WebSocket upgrade, docs, and layers.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// upgrade handler can record the peer address.
pub fn build_app(state: AppState, admin_api: bool) -> Router {
    if admin_api {
        tracing::warn!("admin API enabled on the public listener");
    }
    let router = Router::new()
        .merge(build_router(admin_api))
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
