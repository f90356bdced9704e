//! The decision service and per-resource-type policies.
//!
//! Every decision follows the same evaluation order: orphan rule first, then
//! the system-resource gate, then the registered policy for the resource
//! type. Policies are synchronous, side-effect-free predicate evaluations
//! over already-loaded state and are safe to call concurrently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::actor::Actor;
use super::grants;
use super::ownership::{resolve_owning_team, Ownable, OwnershipSource, OwningChain, ResourceKind};
use super::role::TeamRole;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Update,
    Delete,
    Deploy,
    ManageBackups,
    ViewCredentials,
    ViewSensitive,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Deploy => "deploy",
            Action::ManageBackups => "manage_backups",
            Action::ViewCredentials => "view_credentials",
            Action::ViewSensitive => "view_sensitive",
        }
    }
}

/// Stable reason codes carried by every decision. Callers render these;
/// the core never formats human-facing prose.
pub mod reason {
    pub const PLATFORM_ADMIN: &str = "platform_admin";
    pub const ORPHANED_RESOURCE: &str = "orphaned_resource";
    pub const SYSTEM_ACCESS: &str = "system_access";
    pub const SYSTEM_RESOURCE: &str = "system_resource";
    pub const TEAM_ADMIN: &str = "team_admin";
    pub const ROLE_GRANTED: &str = "role_granted";
    pub const PROJECT_ACCESS: &str = "project_access";
    pub const NO_TEAM_MEMBERSHIP: &str = "no_team_membership";
    pub const NO_PROJECT_ACCESS: &str = "no_project_access";
    pub const PRODUCTION_RESTRICTED: &str = "production_restricted";
    pub const INSUFFICIENT_ROLE: &str = "insufficient_role";
    pub const ACTION_NOT_SUPPORTED: &str = "action_not_supported";
    pub const UNKNOWN_RESOURCE_KIND: &str = "unknown_resource_kind";
}

/// Outcome of an authorization check. Denial is a value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Decision {
    pub allowed: bool,
    #[schema(example = "role_granted")]
    pub reason: &'static str,
}

impl Decision {
    pub fn allow(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Per-resource-type policy strategy. Implementations only see resources
/// with a resolved, non-system owning team; the decision service handles
/// the orphan and system cases before dispatching.
pub trait ResourcePolicy: Send + Sync {
    fn kind(&self) -> ResourceKind;
    fn decide(&self, actor: &Actor, chain: &OwningChain, action: Action) -> Decision;
}

/// The view gate shared by every policy. All other actions run this first,
/// so a user who cannot view a resource can never mutate it.
fn check_view(actor: &Actor, chain: &OwningChain) -> Decision {
    let Some(membership) = actor.membership(chain.team_id) else {
        return Decision::deny(reason::NO_TEAM_MEMBERSHIP);
    };

    if let Some(project_id) = chain.project_id {
        if !grants::can_view_project(actor, chain.team_id, project_id) {
            return Decision::deny(reason::NO_PROJECT_ACCESS);
        }
    }

    if let Some(env) = &chain.environment {
        if !grants::can_view_environment(actor, chain.team_id, env) {
            return Decision::deny(reason::PRODUCTION_RESTRICTED);
        }
    }

    if membership.role.manages_team() {
        Decision::allow(reason::TEAM_ADMIN)
    } else {
        Decision::allow(reason::PROJECT_ACCESS)
    }
}

/// View gate, then team managers pass, then a minimum-role check. With
/// `minimum = Admin` this is exactly the "manage" threshold.
fn check_minimum_role(actor: &Actor, chain: &OwningChain, minimum: TeamRole) -> Decision {
    let view = check_view(actor, chain);
    if !view.allowed {
        return view;
    }
    if grants::can_manage_team(actor, chain.team_id) {
        return Decision::allow(reason::TEAM_ADMIN);
    }
    if actor.has_minimum_role(chain.team_id, minimum) {
        Decision::allow(reason::ROLE_GRANTED)
    } else {
        Decision::deny(reason::INSUFFICIENT_ROLE)
    }
}

/// Applications live in an environment. Deploys are developer work; deleting
/// the application or reading its secrets is admin work.
pub struct ApplicationPolicy;

impl ResourcePolicy for ApplicationPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Application
    }

    fn decide(&self, actor: &Actor, chain: &OwningChain, action: Action) -> Decision {
        match action {
            Action::View => check_view(actor, chain),
            Action::Update | Action::Deploy => {
                check_minimum_role(actor, chain, TeamRole::Developer)
            }
            Action::Delete | Action::ViewCredentials | Action::ViewSensitive => {
                check_minimum_role(actor, chain, TeamRole::Admin)
            }
            Action::ManageBackups => Decision::deny(reason::ACTION_NOT_SUPPORTED),
        }
    }
}

/// Services mirror applications; "deploy" covers restart/redeploy.
pub struct ServicePolicy;

impl ResourcePolicy for ServicePolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }

    fn decide(&self, actor: &Actor, chain: &OwningChain, action: Action) -> Decision {
        match action {
            Action::View => check_view(actor, chain),
            Action::Update | Action::Deploy => {
                check_minimum_role(actor, chain, TeamRole::Developer)
            }
            Action::Delete | Action::ViewCredentials | Action::ViewSensitive => {
                check_minimum_role(actor, chain, TeamRole::Admin)
            }
            Action::ManageBackups => Decision::deny(reason::ACTION_NOT_SUPPORTED),
        }
    }
}

/// Databases may be environment-scoped or standalone (direct team id).
/// Credentials and backups are admin-only; secrets are never
/// developer-visible.
pub struct DatabasePolicy;

impl ResourcePolicy for DatabasePolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    fn decide(&self, actor: &Actor, chain: &OwningChain, action: Action) -> Decision {
        match action {
            Action::View => check_view(actor, chain),
            Action::Update => check_minimum_role(actor, chain, TeamRole::Developer),
            Action::Delete
            | Action::ManageBackups
            | Action::ViewCredentials
            | Action::ViewSensitive => check_minimum_role(actor, chain, TeamRole::Admin),
            Action::Deploy => Decision::deny(reason::ACTION_NOT_SUPPORTED),
        }
    }
}

/// Servers are owned directly by a team. Any member may see them; changing
/// or removing one, and reading its connection credentials, is admin work.
pub struct ServerPolicy;

impl ResourcePolicy for ServerPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn decide(&self, actor: &Actor, chain: &OwningChain, action: Action) -> Decision {
        match action {
            Action::View => check_view(actor, chain),
            Action::Update
            | Action::Delete
            | Action::ViewCredentials
            | Action::ViewSensitive => check_minimum_role(actor, chain, TeamRole::Admin),
            Action::Deploy | Action::ManageBackups => {
                Decision::deny(reason::ACTION_NOT_SUPPORTED)
            }
        }
    }
}

/// Composes the orphan rule, the system-resource gate and the registered
/// per-type policies into a single `decide` entry point.
pub struct DecisionService {
    policies: HashMap<ResourceKind, Arc<dyn ResourcePolicy>>,
}

impl DecisionService {
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// The standard policy set for the platform's resource types.
    pub fn with_default_policies() -> Self {
        let mut service = Self::new();
        service.register(Arc::new(ApplicationPolicy));
        service.register(Arc::new(ServicePolicy));
        service.register(Arc::new(DatabasePolicy));
        service.register(Arc::new(ServerPolicy));
        service
    }

    pub fn register(&mut self, policy: Arc<dyn ResourcePolicy>) {
        self.policies.insert(policy.kind(), policy);
    }

    /// Resolves ownership through `source` and decides.
    pub fn decide(
        &self,
        actor: &Actor,
        resource: &dyn Ownable,
        source: &mut dyn OwnershipSource,
        action: Action,
    ) -> Decision {
        let chain = resolve_owning_team(resource, source);
        self.decide_resolved(actor, resource.kind(), chain.as_ref(), action)
    }

    /// Decides against an already-resolved owning chain (`None` = orphaned).
    pub fn decide_resolved(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        chain: Option<&OwningChain>,
        action: Action,
    ) -> Decision {
        let Some(chain) = chain else {
            // Only platform-wide admins may touch orphans, for every action.
            return if actor.is_platform_wide_admin() {
                Decision::allow(reason::PLATFORM_ADMIN)
            } else {
                Decision::deny(reason::ORPHANED_RESOURCE)
            };
        };

        if chain.is_system() {
            return if actor.can_access_system_resources() {
                Decision::allow(reason::SYSTEM_ACCESS)
            } else {
                Decision::deny(reason::SYSTEM_RESOURCE)
            };
        }

        match self.policies.get(&kind) {
            Some(policy) => policy.decide(actor, chain, action),
            None => Decision::deny(reason::UNKNOWN_RESOURCE_KIND),
        }
    }
}

impl Default for DecisionService {
    fn default() -> Self {
        Self::with_default_policies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::access::ProjectAccess;
    use crate::authz::actor::ROOT_TEAM_ID;
    use crate::authz::ownership::EnvironmentInfo;
    use uuid::Uuid;

    const ALL_ACTIONS: [Action; 7] = [
        Action::View,
        Action::Update,
        Action::Delete,
        Action::Deploy,
        Action::ManageBackups,
        Action::ViewCredentials,
        Action::ViewSensitive,
    ];

    fn chain(team_id: i64, production: bool) -> OwningChain {
        OwningChain::through_environment(
            team_id,
            EnvironmentInfo {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                production,
            },
        )
    }

    fn member(role: TeamRole, access: ProjectAccess) -> Actor {
        Actor::new(Uuid::new_v4()).with_membership(1, role, access)
    }

    #[test]
    fn test_orphan_allows_only_platform_admins() {
        let service = DecisionService::with_default_policies();
        let owner = member(TeamRole::Owner, ProjectAccess::All);
        let admin = Actor::new(Uuid::new_v4()).platform_admin();

        for action in ALL_ACTIONS {
            let denied =
                service.decide_resolved(&owner, ResourceKind::Application, None, action);
            assert!(!denied.allowed);
            assert_eq!(denied.reason, reason::ORPHANED_RESOURCE);

            let allowed =
                service.decide_resolved(&admin, ResourceKind::Application, None, action);
            assert!(allowed.allowed);
            assert_eq!(allowed.reason, reason::PLATFORM_ADMIN);
        }
    }

    #[test]
    fn test_system_resource_ignores_team_roles() {
        let service = DecisionService::with_default_policies();
        let root_owner = Actor::new(Uuid::new_v4()).with_membership(
            ROOT_TEAM_ID,
            TeamRole::Owner,
            ProjectAccess::All,
        );
        let system = OwningChain::direct(ROOT_TEAM_ID);

        for action in ALL_ACTIONS {
            let denied = service.decide_resolved(
                &root_owner,
                ResourceKind::Server,
                Some(&system),
                action,
            );
            assert!(!denied.allowed);
            assert_eq!(denied.reason, reason::SYSTEM_RESOURCE);
        }

        let platform = Actor::new(Uuid::new_v4()).super_admin();
        let allowed = service.decide_resolved(
            &platform,
            ResourceKind::Server,
            Some(&system),
            Action::Delete,
        );
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, reason::SYSTEM_ACCESS);
    }

    #[test]
    fn test_view_gate_runs_before_role_checks() {
        let service = DecisionService::with_default_policies();
        let developer = member(TeamRole::Developer, ProjectAccess::Denied);
        let c = chain(1, false);

        let update = service.decide_resolved(
            &developer,
            ResourceKind::Application,
            Some(&c),
            Action::Update,
        );
        assert!(!update.allowed);
        assert_eq!(update.reason, reason::NO_PROJECT_ACCESS);
    }

    #[test]
    fn test_delete_implies_view() {
        let service = DecisionService::with_default_policies();
        let c = chain(1, true);
        let actors = [
            member(TeamRole::Viewer, ProjectAccess::All),
            member(TeamRole::Developer, ProjectAccess::All),
            member(TeamRole::Developer, ProjectAccess::Denied),
            member(TeamRole::Admin, ProjectAccess::Denied),
            member(TeamRole::Owner, ProjectAccess::All),
        ];
        for actor in &actors {
            for kind in [
                ResourceKind::Application,
                ResourceKind::Service,
                ResourceKind::Database,
            ] {
                let delete = service.decide_resolved(actor, kind, Some(&c), Action::Delete);
                let view = service.decide_resolved(actor, kind, Some(&c), Action::View);
                if delete.allowed {
                    assert!(view.allowed, "delete allowed but view denied");
                }
            }
        }
    }

    #[test]
    fn test_developer_can_update_but_not_delete() {
        let service = DecisionService::with_default_policies();
        let developer = member(TeamRole::Developer, ProjectAccess::All);
        let c = chain(1, false);

        let update = service.decide_resolved(
            &developer,
            ResourceKind::Application,
            Some(&c),
            Action::Update,
        );
        assert!(update.allowed);
        assert_eq!(update.reason, reason::ROLE_GRANTED);

        let delete = service.decide_resolved(
            &developer,
            ResourceKind::Application,
            Some(&c),
            Action::Delete,
        );
        assert!(!delete.allowed);
        assert_eq!(delete.reason, reason::INSUFFICIENT_ROLE);
    }

    #[test]
    fn test_database_credentials_are_admin_only() {
        let service = DecisionService::with_default_policies();
        let c = chain(1, false);

        let developer = member(TeamRole::Developer, ProjectAccess::All);
        let denied = service.decide_resolved(
            &developer,
            ResourceKind::Database,
            Some(&c),
            Action::ViewCredentials,
        );
        assert!(!denied.allowed);

        let admin = member(TeamRole::Admin, ProjectAccess::Denied);
        let allowed = service.decide_resolved(
            &admin,
            ResourceKind::Database,
            Some(&c),
            Action::ViewCredentials,
        );
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, reason::TEAM_ADMIN);
    }

    #[test]
    fn test_unsupported_actions_deny() {
        let service = DecisionService::with_default_policies();
        let owner = member(TeamRole::Owner, ProjectAccess::All);
        let c = chain(1, false);

        let backup = service.decide_resolved(
            &owner,
            ResourceKind::Application,
            Some(&c),
            Action::ManageBackups,
        );
        assert!(!backup.allowed);
        assert_eq!(backup.reason, reason::ACTION_NOT_SUPPORTED);

        let deploy = service.decide_resolved(
            &owner,
            ResourceKind::Server,
            Some(&OwningChain::direct(1)),
            Action::Deploy,
        );
        assert!(!deploy.allowed);
    }

    #[test]
    fn test_unregistered_kind_denies() {
        let service = DecisionService::new();
        let owner = member(TeamRole::Owner, ProjectAccess::All);
        let c = chain(1, false);
        let decision =
            service.decide_resolved(&owner, ResourceKind::Application, Some(&c), Action::View);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, reason::UNKNOWN_RESOURCE_KIND);
    }
}
