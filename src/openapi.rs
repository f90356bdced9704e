//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification with `utoipa` and serves it via
//! Swagger UI.

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Saturn Authorization API",
        version = "1.0.0",
        description = "Authorization decision service for the Saturn platform.\n\n\
        ## Features\n\
        - Per-resource authorization checks with stable reason codes\n\
        - Team role hierarchy (owner, admin, developer, member, viewer)\n\
        - Deny-by-default project access lists with wildcard grants\n\
        - Deployment approval workflow decisions\n\
        - Team membership management\n\n\
        ## Authentication\n\
        Callers are platform services, not end users. Include a signed\n\
        service token in requests: `Authorization: Bearer <token>`.\n\
        The acting user is named per request in the payload.",
        contact(
            name = "Saturn Platform Team"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authorization", description = "Authorization decision checks"),
        (name = "Members", description = "Team membership management"),
        (name = "Approvals", description = "Deployment approval decisions")
    ),
    paths(
        crate::handlers::health::health_check_simple,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::health::live_check,

        crate::handlers::authorize::check,
        crate::handlers::authorize::check_bulk,

        crate::handlers::members::list_team_members,
        crate::handlers::members::update_project_access,
        crate::handlers::members::update_member_role,
        crate::handlers::members::remove_team_member,

        crate::handlers::approvals::approve,
        crate::handlers::approvals::reject,
        crate::handlers::approvals::cancel,
    ),
    components(
        schemas(
            crate::error::ApiError,
            PaginationMeta,

            crate::handlers::health::HealthResponse,
            crate::handlers::health::ReadinessResponse,
            crate::handlers::health::ReadinessChecks,
            crate::handlers::health::ComponentStatus,

            crate::handlers::authorize::ResourceRef,
            crate::handlers::authorize::CheckRequest,
            crate::handlers::authorize::CheckResponse,
            crate::handlers::authorize::CheckBulkRequest,
            crate::handlers::authorize::CheckBulkResponse,
            crate::handlers::authorize::BulkActionResult,

            crate::handlers::members::MemberResponse,
            crate::handlers::members::MembersListResponse,
            crate::handlers::members::UpdateAccessRequest,
            crate::handlers::members::UpdateRoleRequest,
            crate::handlers::members::AccessUpdatedResponse,
            crate::handlers::members::RoleUpdatedResponse,

            crate::handlers::approvals::ApprovalRequest,
            crate::handlers::approvals::ApprovalResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Signed service token.\n\
                            Include in requests as: `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            );
        }

        openapi.security = Some(vec![]);
    }
}

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Saturn Authorization API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_has_security_scheme() {
        let spec = ApiDoc::openapi();
        assert!(spec.components.is_some());
        let components = spec.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_openapi_has_tags() {
        let spec = ApiDoc::openapi();
        assert!(spec.tags.is_some());
        let tags = spec.tags.unwrap();
        assert!(tags.iter().any(|t| t.name == "Authorization"));
        assert!(tags.iter().any(|t| t.name == "Health"));
    }
}
