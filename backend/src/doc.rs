//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every student endpoint, the health probes, the
//! request and response schemas and the bearer security scheme. The
//! document backs Swagger UI in debug builds and is exported by the
//! `openapi-dump` binary for external tooling.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::students::{StudentBody, StudentPayload};

/// Adds the HS256 bearer token scheme to the generated document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .build();
        components.add_security_scheme("BearerToken", SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the student API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Student records API",
        description = "Student record management over a configurable datastore."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::students::list_students,
        crate::inbound::http::students::get_student,
        crate::inbound::http::students::create_student,
        crate::inbound::http::students::update_student,
        crate::inbound::http::students::delete_student,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(StudentPayload, StudentBody, Error, ErrorCode)),
    tags(
        (name = "students", description = "Student record management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
