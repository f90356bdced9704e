//! Membership mutation rules.
//!
//! The one stateful operation in the authorization model is changing a
//! membership: its project access list, its role, or its existence. The
//! validation here is the authorization model's write side; the handlers
//! persist a result only when these functions return `Ok`.

use std::collections::HashSet;
use uuid::Uuid;

use super::access::ProjectAccess;
use super::actor::{Actor, TeamId};
use super::role::TeamRole;

/// Rejection reasons for membership mutations. Each maps to a distinct
/// machine-readable code so callers can render a precise message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    InvalidRole(String),
    CannotRestrictOwner,
    ActorNotPermitted,
    UnknownProject(Uuid),
    LastOwner,
    SelfChange,
}

impl MembershipError {
    pub fn code(&self) -> &'static str {
        match self {
            MembershipError::InvalidRole(_) => "INVALID_ROLE",
            MembershipError::CannotRestrictOwner => "OWNER_ACCESS_IMMUTABLE",
            MembershipError::ActorNotPermitted => "ACTOR_NOT_PERMITTED",
            MembershipError::UnknownProject(_) => "UNKNOWN_PROJECT",
            MembershipError::LastOwner => "LAST_OWNER",
            MembershipError::SelfChange => "SELF_CHANGE",
        }
    }
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipError::InvalidRole(role) => write!(f, "invalid role name: {role}"),
            MembershipError::CannotRestrictOwner => {
                write!(f, "an owner's project access cannot be modified")
            }
            MembershipError::ActorNotPermitted => {
                write!(f, "acting user may not modify this membership")
            }
            MembershipError::UnknownProject(id) => {
                write!(f, "project {id} does not belong to this team")
            }
            MembershipError::LastOwner => write!(f, "a team must keep at least one owner"),
            MembershipError::SelfChange => {
                write!(f, "members cannot modify their own membership here")
            }
        }
    }
}

impl std::error::Error for MembershipError {}

/// Requested change to a member's project access list.
#[derive(Debug, Clone, Default)]
pub struct AccessChange {
    pub grant_all: bool,
    pub projects: Vec<Uuid>,
}

/// Checks the actor may touch a membership at all: admin rank required, and
/// only an owner may modify an admin or the owner.
fn check_actor(actor: &Actor, team_id: TeamId, target_role: TeamRole) -> Result<(), MembershipError> {
    let Some(actor_role) = actor.role_in(team_id) else {
        return Err(MembershipError::ActorNotPermitted);
    };
    if !actor_role.manages_team() {
        return Err(MembershipError::ActorNotPermitted);
    }
    if target_role.manages_team() && actor_role != TeamRole::Owner {
        return Err(MembershipError::ActorNotPermitted);
    }
    Ok(())
}

/// Validates a project-access change and returns the access value to store.
///
/// Owners can never be restricted, an empty grant normalizes to `Denied`
/// (stored null), and every listed project must belong to the team —
/// one unknown id rejects the whole request.
pub fn update_project_access(
    actor: &Actor,
    team_id: TeamId,
    target_role: TeamRole,
    team_projects: &HashSet<Uuid>,
    change: &AccessChange,
) -> Result<ProjectAccess, MembershipError> {
    if target_role == TeamRole::Owner {
        return Err(MembershipError::CannotRestrictOwner);
    }
    check_actor(actor, team_id, target_role)?;

    if change.grant_all {
        return Ok(ProjectAccess::All);
    }

    for project_id in &change.projects {
        if !team_projects.contains(project_id) {
            return Err(MembershipError::UnknownProject(*project_id));
        }
    }

    Ok(ProjectAccess::subset(change.projects.iter().copied()))
}

/// Validates a role change and returns the parsed new role.
pub fn change_member_role(
    actor: &Actor,
    team_id: TeamId,
    target_user: Uuid,
    target_role: TeamRole,
    new_role: &str,
    team_owner_count: usize,
) -> Result<TeamRole, MembershipError> {
    let new_role: TeamRole = new_role
        .parse()
        .map_err(|e: super::role::UnknownRole| MembershipError::InvalidRole(e.0))?;

    if actor.user_id == target_user {
        return Err(MembershipError::SelfChange);
    }
    check_actor(actor, team_id, target_role)?;

    if target_role == TeamRole::Owner
        && new_role != TeamRole::Owner
        && team_owner_count <= 1
    {
        return Err(MembershipError::LastOwner);
    }

    Ok(new_role)
}

/// Validates removing a member from the team.
pub fn remove_member(
    actor: &Actor,
    team_id: TeamId,
    target_user: Uuid,
    target_role: TeamRole,
    team_owner_count: usize,
) -> Result<(), MembershipError> {
    if actor.user_id == target_user {
        return Err(MembershipError::SelfChange);
    }
    check_actor(actor, team_id, target_role)?;

    if target_role == TeamRole::Owner && team_owner_count <= 1 {
        return Err(MembershipError::LastOwner);
    }
    Ok(())
}
