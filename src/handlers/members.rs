//! Team membership management handlers.
//!
//! These are the write side of the authorization model: changing a member's
//! project access list, changing their role, and removing them. Validation
//! lives in the decision core; this layer loads snapshots, persists the
//! outcome, and drops the affected actor cache entry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    authz::{membership, AccessChange, MembershipError, TeamId, TeamRole},
    error::{get_db_conn, ApiError, ApiResult},
    pagination::{PaginationMeta, PaginationParams},
    schema::{team_members, users},
    store,
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub user_id: Uuid,
    #[schema(example = "member@example.com")]
    pub email: String,
    #[schema(example = "developer")]
    pub role: String,
    /// True when the member holds the wildcard grant.
    pub all_projects: bool,
    /// Project ids the member may access; empty unless a subset is granted.
    pub projects: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembersListResponse {
    pub data: Vec<MemberResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccessRequest {
    /// The user performing the change.
    pub acted_by: Uuid,
    #[serde(default)]
    pub grant_all: bool,
    #[serde(default)]
    pub projects: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub acted_by: Uuid,
    #[schema(example = "developer")]
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActedBy {
    pub acted_by: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessUpdatedResponse {
    pub user_id: Uuid,
    pub all_projects: bool,
    pub projects: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleUpdatedResponse {
    pub user_id: Uuid,
    #[schema(example = "developer")]
    pub role: String,
}

fn membership_error(err: MembershipError) -> (StatusCode, Json<ApiError>) {
    match err {
        MembershipError::ActorNotPermitted => {
            ApiError::forbidden(err.to_string(), err.code())
        }
        _ => ApiError::unprocessable(err.to_string(), err.code()),
    }
}

#[utoipa::path(
    get,
    path = "/teams/{team_id}/members",
    tag = "Members",
    params(("team_id" = i64, Path, description = "Team ID"), PaginationParams),
    responses(
        (status = 200, description = "Paginated list of team members", body = MembersListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_team_members(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<MembersListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let total_count: i64 = team_members::table
        .filter(team_members::team_id.eq(team_id))
        .count()
        .get_result(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    let (limit, offset) = pagination.limit_offset();

    let members: Vec<(Uuid, String, String, Option<Vec<String>>)> = team_members::table
        .inner_join(users::table.on(users::id.eq(team_members::user_id)))
        .filter(team_members::team_id.eq(team_id))
        .order(users::email.asc())
        .limit(limit)
        .offset(offset)
        .select((
            users::id,
            users::email,
            team_members::role,
            team_members::allowed_projects,
        ))
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    let data = members
        .into_iter()
        .map(|(user_id, email, role, allowed_projects)| {
            let access = crate::authz::ProjectAccess::from_stored(allowed_projects.as_deref());
            let all_projects = access == crate::authz::ProjectAccess::All;
            let mut projects: Vec<Uuid> = match &access {
                crate::authz::ProjectAccess::Subset(ids) => ids.iter().copied().collect(),
                _ => Vec::new(),
            };
            projects.sort();
            MemberResponse {
                user_id,
                email,
                role,
                all_projects,
                projects,
            }
        })
        .collect();

    Ok(Json(MembersListResponse {
        data,
        pagination: pagination.into_metadata(total_count),
    }))
}

#[utoipa::path(
    put,
    path = "/teams/{team_id}/members/{user_id}/project-access",
    tag = "Members",
    params(
        ("team_id" = i64, Path, description = "Team ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    request_body = UpdateAccessRequest,
    responses(
        (status = 200, description = "Access updated", body = AccessUpdatedResponse),
        (status = 403, description = "Acting user not permitted", body = crate::error::ApiError),
        (status = 404, description = "Membership not found", body = crate::error::ApiError),
        (status = 422, description = "Change rejected", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project_access(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(TeamId, Uuid)>,
    Json(payload): Json<UpdateAccessRequest>,
) -> ApiResult<Json<AccessUpdatedResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let actor = super::fetch_actor(&state, &mut conn, payload.acted_by)
        .await?
        .ok_or_else(|| membership_error(MembershipError::ActorNotPermitted))?;

    let target = store::load_membership(&mut conn, team_id, user_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Membership not found", "MEMBER_NOT_FOUND"))?;
    let target_role = target
        .parsed_role()
        .ok_or_else(|| ApiError::internal("Stored role is invalid", "CORRUPT_MEMBERSHIP"))?;

    let team_projects = store::team_project_ids(&mut conn, team_id)
        .map_err(|_| ApiError::db_error())?;

    let change = AccessChange {
        grant_all: payload.grant_all,
        projects: payload.projects,
    };

    let access = membership::update_project_access(
        &actor,
        team_id,
        target_role,
        &team_projects,
        &change,
    )
    .map_err(|e| {
        warn!(team_id, user_id = %user_id, acted_by = %payload.acted_by, code = e.code(), "Project access change rejected");
        membership_error(e)
    })?;

    diesel::update(
        team_members::table
            .filter(team_members::team_id.eq(team_id))
            .filter(team_members::user_id.eq(user_id)),
    )
    .set(team_members::allowed_projects.eq(access.to_stored()))
    .execute(&mut conn)
    .map_err(|_| ApiError::db_error())?;

    let _ = state.cache.actor_cache.invalidate(user_id).await;

    info!(team_id, user_id = %user_id, acted_by = %payload.acted_by, "Updated project access");

    let all_projects = access == crate::authz::ProjectAccess::All;
    let mut projects: Vec<Uuid> = match &access {
        crate::authz::ProjectAccess::Subset(ids) => ids.iter().copied().collect(),
        _ => Vec::new(),
    };
    projects.sort();

    Ok(Json(AccessUpdatedResponse {
        user_id,
        all_projects,
        projects,
    }))
}

#[utoipa::path(
    put,
    path = "/teams/{team_id}/members/{user_id}/role",
    tag = "Members",
    params(
        ("team_id" = i64, Path, description = "Team ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleUpdatedResponse),
        (status = 403, description = "Acting user not permitted", body = crate::error::ApiError),
        (status = 404, description = "Membership not found", body = crate::error::ApiError),
        (status = 422, description = "Change rejected", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_member_role(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(TeamId, Uuid)>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleUpdatedResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let actor = super::fetch_actor(&state, &mut conn, payload.acted_by)
        .await?
        .ok_or_else(|| membership_error(MembershipError::ActorNotPermitted))?;

    let target = store::load_membership(&mut conn, team_id, user_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Membership not found", "MEMBER_NOT_FOUND"))?;
    let target_role = target
        .parsed_role()
        .ok_or_else(|| ApiError::internal("Stored role is invalid", "CORRUPT_MEMBERSHIP"))?;

    let owner_count = store::count_owners(&mut conn, team_id)
        .map_err(|_| ApiError::db_error())? as usize;

    let new_role: TeamRole = membership::change_member_role(
        &actor,
        team_id,
        user_id,
        target_role,
        &payload.role,
        owner_count,
    )
    .map_err(|e| {
        warn!(team_id, user_id = %user_id, acted_by = %payload.acted_by, code = e.code(), "Role change rejected");
        membership_error(e)
    })?;

    diesel::update(
        team_members::table
            .filter(team_members::team_id.eq(team_id))
            .filter(team_members::user_id.eq(user_id)),
    )
    .set(team_members::role.eq(new_role.as_str()))
    .execute(&mut conn)
    .map_err(|_| ApiError::db_error())?;

    let _ = state.cache.actor_cache.invalidate(user_id).await;

    info!(team_id, user_id = %user_id, acted_by = %payload.acted_by, role = new_role.as_str(), "Updated member role");

    Ok(Json(RoleUpdatedResponse {
        user_id,
        role: new_role.as_str().to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/teams/{team_id}/members/{user_id}",
    tag = "Members",
    params(
        ("team_id" = i64, Path, description = "Team ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID"),
        ("acted_by" = Uuid, Query, description = "User performing the removal")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Acting user not permitted", body = crate::error::ApiError),
        (status = 404, description = "Membership not found", body = crate::error::ApiError),
        (status = 422, description = "Removal rejected", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_team_member(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(TeamId, Uuid)>,
    Query(params): Query<ActedBy>,
) -> ApiResult<StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let actor = super::fetch_actor(&state, &mut conn, params.acted_by)
        .await?
        .ok_or_else(|| membership_error(MembershipError::ActorNotPermitted))?;

    let target = store::load_membership(&mut conn, team_id, user_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Membership not found", "MEMBER_NOT_FOUND"))?;
    let target_role = target
        .parsed_role()
        .ok_or_else(|| ApiError::internal("Stored role is invalid", "CORRUPT_MEMBERSHIP"))?;

    let owner_count = store::count_owners(&mut conn, team_id)
        .map_err(|_| ApiError::db_error())? as usize;

    membership::remove_member(&actor, team_id, user_id, target_role, owner_count).map_err(|e| {
        warn!(team_id, user_id = %user_id, acted_by = %params.acted_by, code = e.code(), "Member removal rejected");
        membership_error(e)
    })?;

    diesel::delete(
        team_members::table
            .filter(team_members::team_id.eq(team_id))
            .filter(team_members::user_id.eq(user_id)),
    )
    .execute(&mut conn)
    .map_err(|_| ApiError::db_error())?;

    let _ = state.cache.actor_cache.invalidate(user_id).await;

    info!(team_id, user_id = %user_id, acted_by = %params.acted_by, "Removed team member");
    Ok(StatusCode::NO_CONTENT)
}
