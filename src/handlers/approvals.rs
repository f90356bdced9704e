//! Deployment approval handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    authz::{approval, ApprovalAction, ApprovalState},
    error::{get_db_conn, ApiError, ApiResult},
    schema::deployment_approvals,
    store,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApprovalRequest {
    /// The user deciding the approval.
    pub acted_by: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub id: Uuid,
    #[schema(example = "approved")]
    pub status: String,
    pub decided_by: Uuid,
}

#[utoipa::path(
    post,
    path = "/approvals/{approval_id}/approve",
    tag = "Approvals",
    params(("approval_id" = Uuid, Path, description = "Approval ID")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval granted", body = ApprovalResponse),
        (status = 403, description = "Not permitted", body = crate::error::ApiError),
        (status = 404, description = "Approval not found", body = crate::error::ApiError),
        (status = 409, description = "Approval is no longer pending", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<ApprovalRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    transition(state, approval_id, payload, ApprovalAction::Approve).await
}

#[utoipa::path(
    post,
    path = "/approvals/{approval_id}/reject",
    tag = "Approvals",
    params(("approval_id" = Uuid, Path, description = "Approval ID")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval rejected", body = ApprovalResponse),
        (status = 403, description = "Not permitted", body = crate::error::ApiError),
        (status = 404, description = "Approval not found", body = crate::error::ApiError),
        (status = 409, description = "Approval is no longer pending", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject(
    State(state): State<AppState>,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<ApprovalRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    transition(state, approval_id, payload, ApprovalAction::Reject).await
}

#[utoipa::path(
    post,
    path = "/approvals/{approval_id}/cancel",
    tag = "Approvals",
    params(("approval_id" = Uuid, Path, description = "Approval ID")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval cancelled", body = ApprovalResponse),
        (status = 403, description = "Not permitted", body = crate::error::ApiError),
        (status = 404, description = "Approval not found", body = crate::error::ApiError),
        (status = 409, description = "Approval is no longer pending", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<ApprovalRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    transition(state, approval_id, payload, ApprovalAction::Cancel).await
}

fn resulting_state(action: ApprovalAction) -> ApprovalState {
    match action {
        ApprovalAction::Approve => ApprovalState::Approved,
        ApprovalAction::Reject => ApprovalState::Rejected,
        ApprovalAction::Cancel => ApprovalState::Cancelled,
    }
}

async fn transition(
    state: AppState,
    approval_id: Uuid,
    payload: ApprovalRequest,
    action: ApprovalAction,
) -> ApiResult<Json<ApprovalResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let actor = super::fetch_actor(&state, &mut conn, payload.acted_by)
        .await?
        .ok_or_else(|| ApiError::forbidden("Acting user not permitted", "ACTOR_NOT_PERMITTED"))?;

    let snapshot = store::load_approval(&mut conn, approval_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Approval not found", "APPROVAL_NOT_FOUND"))?;

    let decision = approval::decide_approval(&actor, &snapshot, action);

    if !decision.allowed {
        warn!(
            approval_id = %approval_id,
            acted_by = %payload.acted_by,
            reason = decision.reason,
            "Approval transition denied"
        );
        return Err(if decision.reason == approval::NOT_PENDING {
            ApiError::conflict("Approval is no longer pending", "NOT_PENDING")
        } else {
            ApiError::forbidden("Not permitted to decide this approval", decision.reason)
        });
    }

    let next = resulting_state(action);

    // Guard on the stored status so two racing deciders cannot both win.
    let updated = diesel::update(
        deployment_approvals::table
            .filter(deployment_approvals::id.eq(approval_id))
            .filter(deployment_approvals::status.eq(ApprovalState::Pending.as_str())),
    )
    .set((
        deployment_approvals::status.eq(next.as_str()),
        deployment_approvals::decided_by.eq(Some(payload.acted_by)),
        deployment_approvals::decided_at.eq(Some(chrono::Utc::now().naive_utc())),
    ))
    .execute(&mut conn)
    .map_err(|_| ApiError::db_error())?;

    if updated == 0 {
        return Err(ApiError::conflict(
            "Approval is no longer pending",
            "NOT_PENDING",
        ));
    }

    info!(
        approval_id = %approval_id,
        acted_by = %payload.acted_by,
        status = next.as_str(),
        reason = decision.reason,
        "Approval transition applied"
    );

    Ok(Json(ApprovalResponse {
        id: approval_id,
        status: next.as_str().to_string(),
        decided_by: payload.acted_by,
    }))
}
