//! Authorization check handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    authz::{Action, Decision, ResourceKind},
    error::{get_db_conn, ApiError, ApiResult},
    store::{self, ResourceLookup},
    telemetry::record_decision,
    AppState,
};

pub const USER_NOT_FOUND: &str = "user_not_found";
pub const RESOURCE_NOT_FOUND: &str = "resource_not_found";

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    pub user_id: Uuid,
    pub resource: ResourceRef,
    pub action: Action,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub allowed: bool,
    #[schema(example = "role_granted")]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckBulkRequest {
    pub user_id: Uuid,
    pub resource: ResourceRef,
    #[schema(example = json!(["view", "update", "delete"]))]
    pub actions: Vec<Action>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkActionResult {
    pub action: Action,
    pub allowed: bool,
    #[schema(example = "insufficient_role")]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckBulkResponse {
    pub results: Vec<BulkActionResult>,
    pub all_allowed: bool,
    pub denied: Vec<Action>,
}

#[utoipa::path(
    post,
    path = "/authz/check",
    tag = "Authorization",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Authorization decision", body = CheckResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check(
    State(state): State<AppState>,
    Json(payload): Json<CheckRequest>,
) -> ApiResult<Json<CheckResponse>> {
    let start = std::time::Instant::now();
    let mut conn = get_db_conn(&state.db_pool)?;

    let kind = payload.resource.kind;
    let action = payload.action;

    let Some(actor) = super::fetch_actor(&state, &mut conn, payload.user_id).await? else {
        record_decision(kind.as_str(), action.as_str(), false, USER_NOT_FOUND, start.elapsed());
        return Ok(Json(CheckResponse {
            allowed: false,
            reason: USER_NOT_FOUND.to_string(),
        }));
    };

    let lookup = store::lookup_resource(&mut conn, kind, payload.resource.id)
        .map_err(|_| ApiError::db_error())?;

    let decision = decide_lookup(&state, &actor, kind, &lookup, action);

    debug!(
        user_id = %payload.user_id,
        resource_kind = kind.as_str(),
        resource_id = %payload.resource.id,
        action = action.as_str(),
        allowed = decision.allowed,
        reason = decision.reason,
        "Authorization decision"
    );
    record_decision(
        kind.as_str(),
        action.as_str(),
        decision.allowed,
        decision.reason,
        start.elapsed(),
    );

    Ok(Json(CheckResponse {
        allowed: decision.allowed,
        reason: decision.reason.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/authz/check-bulk",
    tag = "Authorization",
    request_body = CheckBulkRequest,
    responses(
        (status = 200, description = "Bulk authorization decisions", body = CheckBulkResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_bulk(
    State(state): State<AppState>,
    Json(payload): Json<CheckBulkRequest>,
) -> ApiResult<Json<CheckBulkResponse>> {
    let start = std::time::Instant::now();

    if payload.actions.is_empty() {
        return Err(ApiError::bad_request(
            "At least one action must be provided",
            "INVALID_REQUEST",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;
    let kind = payload.resource.kind;

    let actor = super::fetch_actor(&state, &mut conn, payload.user_id).await?;

    // One actor load and one ownership walk serve every action in the batch.
    let lookup = match actor {
        Some(_) => store::lookup_resource(&mut conn, kind, payload.resource.id)
            .map_err(|_| ApiError::db_error())?,
        None => ResourceLookup::Missing,
    };

    let mut results = Vec::with_capacity(payload.actions.len());
    let mut denied = Vec::new();

    for &action in &payload.actions {
        let decision = match &actor {
            None => Decision::deny(USER_NOT_FOUND),
            Some(actor) => decide_lookup(&state, actor, kind, &lookup, action),
        };

        record_decision(
            kind.as_str(),
            action.as_str(),
            decision.allowed,
            decision.reason,
            start.elapsed(),
        );

        if !decision.allowed {
            denied.push(action);
        }
        results.push(BulkActionResult {
            action,
            allowed: decision.allowed,
            reason: decision.reason.to_string(),
        });
    }

    Ok(Json(CheckBulkResponse {
        all_allowed: denied.is_empty(),
        results,
        denied,
    }))
}

fn decide_lookup(
    state: &AppState,
    actor: &crate::authz::Actor,
    kind: ResourceKind,
    lookup: &ResourceLookup,
    action: Action,
) -> Decision {
    match lookup {
        ResourceLookup::Missing => Decision::deny(RESOURCE_NOT_FOUND),
        ResourceLookup::Orphaned => state.decisions.decide_resolved(actor, kind, None, action),
        ResourceLookup::Owned(chain) => {
            state
                .decisions
                .decide_resolved(actor, kind, Some(chain), action)
        }
    }
}
