pub mod images;
pub mod shares;

use aide::axum::{routing::post, ApiRouter};

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route("/v1/images", post(images::upload_image))
        .api_route("/v1/shares/{token}/redeem", post(shares::redeem_share))
}
