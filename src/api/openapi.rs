use super::handlers::{captcha, health, login, oauth, panel, session};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Generated `OpenAPI` document for the documented routes.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and documented. Aliases and the landing route are registered outside with
/// plain `.route()` and stay out of the spec.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(captcha::verify))
        .routes(routes!(login::login))
        .routes(routes!(login::check_ban))
        .routes(routes!(oauth::authorize))
        .routes(routes!(oauth::callback))
        .routes(routes!(session::logout))
        .routes(routes!(panel::ban))
        .routes(routes!(panel::unban))
        .routes(routes!(panel::unban_by_id))
        .routes(routes!(panel::users))
        .routes(routes!(panel::banned))
        .routes(routes!(panel::stats));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Login, OAuth callback, and sessions".to_string());

    let mut panel_tag = Tag::new("panel");
    panel_tag.description = Some("Owner-only administration".to_string());

    let mut captcha_tag = Tag::new("captcha");
    captcha_tag.description = Some("Challenge-token verification".to_string());

    router.get_openapi_mut().tags = Some(vec![auth_tag, panel_tag, captcha_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.license = Some(License::new(env!("CARGO_PKG_LICENSE")));

    OpenApiBuilder::new().info(info).build()
}
