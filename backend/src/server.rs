use std::sync::Arc;
use std::time::Duration;

use aide::openapi::OpenApi;
use axum::{extract::DefaultBodyLimit, http::StatusCode, Extension, Router};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::routes;
use crate::share::{TokenRedeemer, UploadService};
use crate::types::Environment;

/// Room for multipart boundaries and headers on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn request_timeout_layer() -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT)
}

/// Builds the application router with all dependencies attached
pub fn router(
    environment: Environment,
    upload_service: Arc<UploadService>,
    redeemer: Arc<TokenRedeemer>,
) -> Router {
    let mut openapi = OpenApi::default();
    let body_limit = upload_service.size_limit() + MULTIPART_OVERHEAD_BYTES;

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(upload_service))
        .layer(Extension(redeemer))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(request_timeout_layer())
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    upload_service: Arc<UploadService>,
    redeemer: Arc<TokenRedeemer>,
) -> anyhow::Result<()> {
    let router = router(environment, upload_service, redeemer)
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default());

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Peekonce backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
