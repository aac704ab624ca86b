use super::handlers::{auth, health, me, ErrorResponse};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        Info, License,
    },
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::send_otp,
        auth::verify_otp,
        me::me,
    ),
    components(schemas(
        health::Health,
        auth::SendOtpRequest,
        auth::SendOtpResponse,
        auth::VerifyOtpRequest,
        auth::VerifyOtpResponse,
        me::Me,
        ErrorResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Passcode login and bearer identity"),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// `OpenAPI` document with Cargo metadata as its info block.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut info = Info::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info.description = Some(env!("CARGO_PKG_DESCRIPTION").to_string());
    info.license = Some(License::new(env!("CARGO_PKG_LICENSE")));
    doc.info = info;

    doc
}
