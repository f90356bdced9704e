//! Shared fixtures for the decision-core integration tests.
//!
//! Everything here is in-memory: a `World` holding the team/project/
//! environment graph the ownership resolver walks, a `Fixture` standing in
//! for any resource row, and builders for the common actor shapes. No test
//! in this suite needs a database or a running server.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use uuid::Uuid;

use saturn_authz::authz::{
    Actor, DecisionService, EnvironmentInfo, Ownable, OwnershipSource, ProjectAccess, ProjectInfo,
    ResourceKind, TeamId, TeamRole,
};

/// One decision service shared across the suite; it carries no state.
pub static SERVICE: Lazy<DecisionService> = Lazy::new(DecisionService::with_default_policies);

/// In-memory relation graph: teams, projects and environments, editable
/// mid-test so ownership chains can be broken on purpose.
#[derive(Default)]
pub struct World {
    environments: HashMap<Uuid, EnvironmentInfo>,
    projects: HashMap<Uuid, ProjectInfo>,
    teams: HashSet<TeamId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&mut self, team_id: TeamId) -> &mut Self {
        self.teams.insert(team_id);
        self
    }

    pub fn add_project(&mut self, team_id: TeamId) -> Uuid {
        let id = Uuid::new_v4();
        self.projects.insert(id, ProjectInfo { id, team_id });
        id
    }

    pub fn add_environment(&mut self, project_id: Uuid, production: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.environments.insert(
            id,
            EnvironmentInfo {
                id,
                project_id,
                production,
            },
        );
        id
    }

    pub fn remove_project(&mut self, project_id: Uuid) {
        self.projects.remove(&project_id);
    }

    pub fn remove_environment(&mut self, environment_id: Uuid) {
        self.environments.remove(&environment_id);
    }

    pub fn remove_team(&mut self, team_id: TeamId) {
        self.teams.remove(&team_id);
    }
}

impl OwnershipSource for World {
    fn environment(&mut self, id: Uuid) -> Option<EnvironmentInfo> {
        self.environments.get(&id).copied()
    }

    fn project(&mut self, id: Uuid) -> Option<ProjectInfo> {
        self.projects.get(&id).copied()
    }

    fn team_exists(&mut self, id: TeamId) -> bool {
        self.teams.contains(&id)
    }
}

/// A resource row of any kind, linked either to an environment or directly
/// to a team.
pub struct Fixture {
    pub kind: ResourceKind,
    pub id: Uuid,
    pub team_id: Option<TeamId>,
    pub environment_id: Option<Uuid>,
}

impl Fixture {
    pub fn in_environment(kind: ResourceKind, environment_id: Uuid) -> Self {
        Self {
            kind,
            id: Uuid::new_v4(),
            team_id: None,
            environment_id: Some(environment_id),
        }
    }

    pub fn direct(kind: ResourceKind, team_id: TeamId) -> Self {
        Self {
            kind,
            id: Uuid::new_v4(),
            team_id: Some(team_id),
            environment_id: None,
        }
    }
}

impl Ownable for Fixture {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn direct_team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    fn environment_id(&self) -> Option<Uuid> {
        self.environment_id
    }
}

pub fn member_of(team_id: TeamId, role: TeamRole, access: ProjectAccess) -> Actor {
    Actor::new(Uuid::new_v4()).with_membership(team_id, role, access)
}

pub fn platform_admin() -> Actor {
    Actor::new(Uuid::new_v4()).platform_admin()
}

pub fn super_admin() -> Actor {
    Actor::new(Uuid::new_v4()).super_admin()
}
