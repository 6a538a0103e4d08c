use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use super::types::{CaptchaVerifyRequest, CaptchaVerifyResponse};
use crate::captcha::CaptchaVerifier;

#[utoipa::path(
    post,
    path = "/turnstile/verify",
    request_body = CaptchaVerifyRequest,
    responses(
        (status = 200, description = "Verification verdict; failures report success=false", body = CaptchaVerifyResponse)
    ),
    tag = "captcha"
)]
pub async fn verify(
    verifier: Extension<Arc<CaptchaVerifier>>,
    payload: Option<Json<CaptchaVerifyRequest>>,
) -> impl IntoResponse {
    // A missing token is a failed verification, not a client error.
    let success = match payload {
        Some(Json(request)) => verifier.verify(&request.token).await,
        None => false,
    };
    Json(CaptchaVerifyResponse { success })
}
