use crate::config::{Config, CorsConfig};
use crate::error::AppError;
use crate::services::contact_service::ContactService;
use crate::services::health_service::HealthService;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use axum::{
    Router,
    routing::{any, get, post},
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod contact;
pub mod function;
pub mod health;
pub mod middleware;
pub mod schemas;

#[derive(Clone, Debug)]
pub struct AppState {
    pub contact_service: ContactService,
    pub health_service: HealthService,
}

/// Configures and returns the application router.
///
/// # Errors
/// Returns an error if the configured CORS origin is not a valid header value.
pub fn app_router(config: &Config, state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/contact", post(contact::submit).options(contact::preflight).fallback(contact::submit))
        .route("/health", get(health::health))
        .route("/test", any(health::diagnostics));

    Ok(Router::new()
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(cors_layer(&config.cors)?)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidV7,
        ))
        .with_state(state))
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.any_origin {
        return Ok(layer.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(&config.allowed_origin)?;
    Ok(layer.allow_origin(AllowOrigin::exact(origin)).allow_credentials(true))
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub(crate) fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_default()
}
