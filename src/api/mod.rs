//! HTTP surface: router assembly and server loop.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

use crate::bans::BanRegistry;
use crate::captcha::CaptchaVerifier;
use crate::ledger::IdentityLedger;
use crate::oauth::OAuthExchange;
use crate::session::SessionAuthority;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Shared components every handler reaches through request extensions.
pub struct AppContext {
    pub ledger: Arc<IdentityLedger>,
    pub bans: Arc<BanRegistry>,
    pub sessions: Arc<SessionAuthority>,
    pub oauth: Arc<OAuthExchange>,
    pub captcha: Arc<CaptchaVerifier>,
}

/// Build the application router with all routes and middleware attached.
#[must_use]
pub fn app(context: &AppContext) -> Router {
    // The game client ships with wide-open CORS; cookies are same-origin only.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Documented routes come from the OpenAPI wiring; aliases kept for older
    // client builds are added as plain routes below.
    let (router, _openapi) = openapi::api_router().split_for_parts();
    router
        .route("/", get(handlers::root::root))
        .route("/api/verify-captcha", post(handlers::captcha::verify))
        .route("/admin/ban", post(handlers::panel::ban))
        .route("/admin/users", get(handlers::panel::users))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(context.ledger.clone()))
                .layer(Extension(context.bans.clone()))
                .layer(Extension(context.sessions.clone()))
                .layer(Extension(context.oauth.clone()))
                .layer(Extension(context.captcha.clone())),
        )
}

/// Start the server.
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn new(port: u16, context: AppContext) -> Result<()> {
    let app = app(&context);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
