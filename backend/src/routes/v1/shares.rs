use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Path, Extension, Json};
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    share::{TokenRedeemer, TokenRedemption},
    types::AppError,
};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RedeemResponse {
    /// Public URL of the image
    pub image_url: String,
    /// Seconds the viewer may keep the image on screen
    pub display_secs: u64,
    /// ISO-8601 UTC timestamp at which the display window closes
    pub display_until: String,
}

/// Redeems a one-time share token
///
/// The first successful call consumes the token; every later call, and every call
/// with an unknown token, gets `410 GONE`.
///
/// # Errors
///
/// - `410 GONE` - `not_found` or `already_viewed`; terminal, do not retry
/// - `503 SERVICE_UNAVAILABLE` - the record store failed
#[instrument(skip_all)]
pub async fn redeem_share(
    Extension(redeemer): Extension<Arc<TokenRedeemer>>,
    Path(token): Path<String>,
) -> Result<Json<RedeemResponse>, AppError> {
    let grant = redeemer.redeem(&token).await?;

    let display_until = Utc::now() + Duration::from_secs(grant.display_secs);

    Ok(Json(RedeemResponse {
        image_url: grant.object_address,
        display_secs: grant.display_secs,
        display_until: display_until.to_rfc3339(),
    }))
}
