//! Resource ownership resolution.
//!
//! Every resource in the platform is owned by exactly one team, reached
//! either through a direct `team_id` (servers, standalone databases) or by
//! walking resource -> environment -> project -> team. A broken link
//! anywhere in that chain leaves the resource orphaned, which is a valid
//! state the policies handle, not an error.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::actor::{TeamId, ROOT_TEAM_ID};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Application,
    Service,
    Database,
    Server,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Application => "application",
            ResourceKind::Service => "service",
            ResourceKind::Database => "database",
            ResourceKind::Server => "server",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentInfo {
    pub id: Uuid,
    pub project_id: Uuid,
    pub production: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectInfo {
    pub id: Uuid,
    pub team_id: TeamId,
}

/// The fully resolved ownership of a resource. Resources owned through a
/// direct team id have no project or environment links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwningChain {
    pub team_id: TeamId,
    pub project_id: Option<Uuid>,
    pub environment: Option<EnvironmentInfo>,
}

impl OwningChain {
    pub fn direct(team_id: TeamId) -> Self {
        Self {
            team_id,
            project_id: None,
            environment: None,
        }
    }

    pub fn through_environment(team_id: TeamId, env: EnvironmentInfo) -> Self {
        Self {
            team_id,
            project_id: Some(env.project_id),
            environment: Some(env),
        }
    }

    pub fn is_system(&self) -> bool {
        self.team_id == ROOT_TEAM_ID
    }
}

/// Capability interface every resource type participating in authorization
/// implements. At most one of `direct_team_id` / `environment_id` is
/// expected to return a value; `direct_team_id` wins when both do.
pub trait Ownable {
    fn kind(&self) -> ResourceKind;
    fn resource_id(&self) -> Uuid;

    fn direct_team_id(&self) -> Option<TeamId> {
        None
    }

    fn environment_id(&self) -> Option<Uuid> {
        None
    }
}

/// Read access to the relation graph the resolver walks. Returning `None`
/// means the row does not exist, which orphans anything pointing at it.
pub trait OwnershipSource {
    fn environment(&mut self, id: Uuid) -> Option<EnvironmentInfo>;
    fn project(&mut self, id: Uuid) -> Option<ProjectInfo>;
    fn team_exists(&mut self, id: TeamId) -> bool;
}

/// Resolves the owning team of a resource, or `None` when the chain is
/// broken. Callers must treat `None` as "no ownership basis", not failure.
pub fn resolve_owning_team(
    resource: &dyn Ownable,
    source: &mut dyn OwnershipSource,
) -> Option<OwningChain> {
    if let Some(team_id) = resource.direct_team_id() {
        if !source.team_exists(team_id) {
            return None;
        }
        return Some(OwningChain::direct(team_id));
    }

    let environment = source.environment(resource.environment_id()?)?;
    let project = source.project(environment.project_id)?;
    if !source.team_exists(project.team_id) {
        return None;
    }
    Some(OwningChain::through_environment(project.team_id, environment))
}
