//! The acting user as seen by the decision core.
//!
//! An [`Actor`] is an immutable snapshot of a user's identity flags and team
//! memberships, loaded once per request. Decisions never reach back into the
//! database; everything they need is here.

use std::collections::HashMap;
use uuid::Uuid;

use super::access::ProjectAccess;
use super::role::TeamRole;

/// Teams use sequential integer ids; id 0 is reserved for the root team.
pub type TeamId = i64;

/// The reserved team holding platform-wide resources such as the shared
/// localhost server.
pub const ROOT_TEAM_ID: TeamId = 0;

#[derive(Debug, Clone)]
pub struct TeamMembership {
    pub team_id: TeamId,
    pub role: TeamRole,
    pub access: ProjectAccess,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_platform_admin: bool,
    pub is_super_admin: bool,
    memberships: HashMap<TeamId, TeamMembership>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_platform_admin: false,
            is_super_admin: false,
            memberships: HashMap::new(),
        }
    }

    pub fn platform_admin(mut self) -> Self {
        self.is_platform_admin = true;
        self
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn with_membership(mut self, team_id: TeamId, role: TeamRole, access: ProjectAccess) -> Self {
        self.memberships.insert(
            team_id,
            TeamMembership {
                team_id,
                role,
                access,
            },
        );
        self
    }

    pub fn membership(&self, team_id: TeamId) -> Option<&TeamMembership> {
        self.memberships.get(&team_id)
    }

    pub fn memberships(&self) -> impl Iterator<Item = &TeamMembership> {
        self.memberships.values()
    }

    pub fn role_in(&self, team_id: TeamId) -> Option<TeamRole> {
        self.membership(team_id).map(|m| m.role)
    }

    pub fn is_owner(&self, team_id: TeamId) -> bool {
        self.role_in(team_id) == Some(TeamRole::Owner)
    }

    pub fn is_admin(&self, team_id: TeamId) -> bool {
        self.role_in(team_id) == Some(TeamRole::Admin)
    }

    /// True iff the actor's role in the team ranks at or above `minimum`.
    /// No membership fails every check.
    pub fn has_minimum_role(&self, team_id: TeamId, minimum: TeamRole) -> bool {
        self.role_in(team_id)
            .map(|role| role.at_least(minimum))
            .unwrap_or(false)
    }

    /// Platform-wide admin predicate used by the orphan rule.
    pub fn is_platform_wide_admin(&self) -> bool {
        self.is_platform_admin || self.is_super_admin
    }

    /// Gate for resources owned by the root team. Team roles are irrelevant
    /// here; system resources sit outside the team permission grid.
    pub fn can_access_system_resources(&self) -> bool {
        self.is_platform_admin || self.is_super_admin
    }
}
