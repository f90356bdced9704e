//! Team-scoped grant predicates.
//!
//! These are the building blocks the per-resource policies compose. They
//! assume the owning team has already been resolved and is an ordinary team;
//! the orphan and system-resource rules are applied before any of these run.

use uuid::Uuid;

use super::actor::{Actor, TeamId};
use super::ownership::EnvironmentInfo;
use super::role::TeamRole;

/// Owners and admins see every project unconditionally; everyone else is
/// subject to their membership's project access list (deny by default).
pub fn can_view_project(actor: &Actor, team_id: TeamId, project_id: Uuid) -> bool {
    match actor.membership(team_id) {
        None => false,
        Some(m) => m.role.manages_team() || m.access.allows(project_id),
    }
}

/// Environment visibility is a separate predicate from project visibility:
/// production environments additionally require at least the developer role.
pub fn can_view_environment(actor: &Actor, team_id: TeamId, env: &EnvironmentInfo) -> bool {
    if !can_view_project(actor, team_id, env.project_id) {
        return false;
    }
    !env.production || actor.has_minimum_role(team_id, TeamRole::Developer)
}

/// Sensitive environment data (secrets, raw variables) requires admin.
pub fn can_view_sensitive_environment(actor: &Actor, team_id: TeamId, env: &EnvironmentInfo) -> bool {
    actor.has_minimum_role(team_id, TeamRole::Admin) && can_view_environment(actor, team_id, env)
}

/// Owner or admin of the owning team.
pub fn can_manage_team(actor: &Actor, team_id: TeamId) -> bool {
    actor.has_minimum_role(team_id, TeamRole::Admin)
}

/// Deploying requires developer rank plus visibility of the target
/// environment.
pub fn can_deploy(actor: &Actor, team_id: TeamId, env: &EnvironmentInfo) -> bool {
    actor.has_minimum_role(team_id, TeamRole::Developer)
        && can_view_environment(actor, team_id, env)
}

/// Approving (or rejecting) a deployment approval requires admin rank in the
/// owning team.
pub fn can_approve_deployment(actor: &Actor, team_id: TeamId) -> bool {
    actor.has_minimum_role(team_id, TeamRole::Admin)
}
