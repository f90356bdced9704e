//! Snapshot loaders bridging Postgres and the decision core.
//!
//! Handlers never hand a live connection to the policies. Everything a
//! decision needs is loaded here into plain values first, so a database
//! failure stays a `QueryResult` error and is never mistaken for an
//! orphaned resource.

use diesel::prelude::*;
use diesel::PgConnection;
use std::collections::HashSet;
use uuid::Uuid;

use crate::authz::{
    Actor, ApprovalSnapshot, EnvironmentInfo, OwningChain, ResourceKind, TeamId,
};
use crate::models::TeamMember;
use crate::schema::{
    applications, databases, deployment_approvals, deployments, environments, projects, servers,
    services, team_members, teams, users,
};

/// Outcome of resolving a resource by id. A missing row and a present row
/// with a broken ownership chain are different answers to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLookup {
    Missing,
    Orphaned,
    Owned(OwningChain),
}

/// Loads the acting user's identity flags and team memberships. Returns
/// `None` for unknown and deactivated users alike.
pub fn load_actor(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<Actor>> {
    let flags: Option<(bool, bool, bool)> = users::table
        .find(user_id)
        .select((
            users::is_platform_admin,
            users::is_super_admin,
            users::is_active,
        ))
        .first(conn)
        .optional()?;

    let Some((is_platform_admin, is_super_admin, is_active)) = flags else {
        return Ok(None);
    };
    if !is_active {
        return Ok(None);
    }

    let mut actor = Actor::new(user_id);
    if is_platform_admin {
        actor = actor.platform_admin();
    }
    if is_super_admin {
        actor = actor.super_admin();
    }

    let memberships: Vec<TeamMember> = team_members::table
        .filter(team_members::user_id.eq(user_id))
        .select(TeamMember::as_select())
        .load(conn)?;

    for member in memberships {
        // Rows with an unrecognized role string grant nothing.
        if let Some(role) = member.parsed_role() {
            actor = actor.with_membership(member.team_id, role, member.project_access());
        }
    }

    Ok(Some(actor))
}

/// Resolves a resource to its owning team by walking the ownership chain
/// in the database.
pub fn lookup_resource(
    conn: &mut PgConnection,
    kind: ResourceKind,
    id: Uuid,
) -> QueryResult<ResourceLookup> {
    match kind {
        ResourceKind::Application => {
            let row: Option<Option<Uuid>> = applications::table
                .find(id)
                .select(applications::environment_id)
                .first(conn)
                .optional()?;
            match row {
                None => Ok(ResourceLookup::Missing),
                Some(env_id) => resolve_environment_chain(conn, env_id),
            }
        }
        ResourceKind::Service => {
            let row: Option<Option<Uuid>> = services::table
                .find(id)
                .select(services::environment_id)
                .first(conn)
                .optional()?;
            match row {
                None => Ok(ResourceLookup::Missing),
                Some(env_id) => resolve_environment_chain(conn, env_id),
            }
        }
        ResourceKind::Database => {
            let row: Option<(Option<Uuid>, Option<TeamId>)> = databases::table
                .find(id)
                .select((databases::environment_id, databases::team_id))
                .first(conn)
                .optional()?;
            match row {
                None => Ok(ResourceLookup::Missing),
                // A standalone database's direct team id wins over any
                // environment link.
                Some((_, Some(team_id))) => resolve_direct(conn, team_id),
                Some((env_id, None)) => resolve_environment_chain(conn, env_id),
            }
        }
        ResourceKind::Server => {
            let row: Option<TeamId> = servers::table
                .find(id)
                .select(servers::team_id)
                .first(conn)
                .optional()?;
            match row {
                None => Ok(ResourceLookup::Missing),
                Some(team_id) => resolve_direct(conn, team_id),
            }
        }
    }
}

fn resolve_direct(conn: &mut PgConnection, team_id: TeamId) -> QueryResult<ResourceLookup> {
    let exists: Option<TeamId> = teams::table
        .find(team_id)
        .select(teams::id)
        .first(conn)
        .optional()?;
    Ok(match exists {
        Some(_) => ResourceLookup::Owned(OwningChain::direct(team_id)),
        None => ResourceLookup::Orphaned,
    })
}

fn resolve_environment_chain(
    conn: &mut PgConnection,
    env_id: Option<Uuid>,
) -> QueryResult<ResourceLookup> {
    let Some(env_id) = env_id else {
        return Ok(ResourceLookup::Orphaned);
    };

    let chain: Option<(Uuid, Uuid, bool, TeamId)> = environments::table
        .inner_join(projects::table.on(projects::id.eq(environments::project_id)))
        .inner_join(teams::table.on(teams::id.eq(projects::team_id)))
        .filter(environments::id.eq(env_id))
        .select((
            environments::id,
            environments::project_id,
            environments::production,
            projects::team_id,
        ))
        .first(conn)
        .optional()?;

    Ok(match chain {
        Some((id, project_id, production, team_id)) => {
            ResourceLookup::Owned(OwningChain::through_environment(
                team_id,
                EnvironmentInfo {
                    id,
                    project_id,
                    production,
                },
            ))
        }
        None => ResourceLookup::Orphaned,
    })
}

/// Ids of every project owned by a team, for validating access grants.
pub fn team_project_ids(conn: &mut PgConnection, team_id: TeamId) -> QueryResult<HashSet<Uuid>> {
    let ids: Vec<Uuid> = projects::table
        .filter(projects::team_id.eq(team_id))
        .select(projects::id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

pub fn load_membership(
    conn: &mut PgConnection,
    team_id: TeamId,
    user_id: Uuid,
) -> QueryResult<Option<TeamMember>> {
    team_members::table
        .filter(team_members::team_id.eq(team_id))
        .filter(team_members::user_id.eq(user_id))
        .select(TeamMember::as_select())
        .first(conn)
        .optional()
}

pub fn count_owners(conn: &mut PgConnection, team_id: TeamId) -> QueryResult<i64> {
    team_members::table
        .filter(team_members::team_id.eq(team_id))
        .filter(team_members::role.eq("owner"))
        .count()
        .get_result(conn)
}

/// Loads an approval together with its deployment's resolved ownership.
/// A malformed stored status is treated as a missing approval.
pub fn load_approval(
    conn: &mut PgConnection,
    approval_id: Uuid,
) -> QueryResult<Option<ApprovalSnapshot>> {
    let row: Option<(Uuid, String, Uuid, Uuid)> = deployment_approvals::table
        .find(approval_id)
        .select((
            deployment_approvals::id,
            deployment_approvals::status,
            deployment_approvals::requested_by,
            deployment_approvals::deployment_id,
        ))
        .first(conn)
        .optional()?;

    let Some((id, status, requested_by, deployment_id)) = row else {
        return Ok(None);
    };
    let Ok(state) = status.parse() else {
        return Ok(None);
    };

    let application_id: Option<Option<Uuid>> = deployments::table
        .find(deployment_id)
        .select(deployments::application_id)
        .first(conn)
        .optional()?;

    let chain = match application_id.flatten() {
        None => None,
        Some(app_id) => match lookup_resource(conn, ResourceKind::Application, app_id)? {
            ResourceLookup::Owned(chain) => Some(chain),
            ResourceLookup::Missing | ResourceLookup::Orphaned => None,
        },
    };

    Ok(Some(ApprovalSnapshot {
        id,
        state,
        requested_by,
        chain,
    }))
}
