use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use super::types::StatusResponse;
use crate::bans::BanRegistry;
use crate::ledger::IdentityLedger;

/// Service summary for the landing route, undocumented on purpose.
pub async fn root(
    ledger: Extension<Arc<IdentityLedger>>,
    bans: Extension<Arc<BanRegistry>>,
) -> impl IntoResponse {
    Json(StatusResponse {
        status: "online".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users: ledger.total_users().await,
        banned: bans.total().await,
    })
}
