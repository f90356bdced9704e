use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Ownable, ProjectAccess, ResourceKind, TeamId, TeamRole};

#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_platform_admin: bool,
    pub is_super_admin: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::teams)]
pub struct Team {
    pub id: TeamId,
    #[schema(example = "Acme")]
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::team_members)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: TeamId,
    pub user_id: Uuid,
    pub role: String,
    pub allowed_projects: Option<Vec<String>>,
    pub joined_at: NaiveDateTime,
}

impl TeamMember {
    /// Stored role string as a typed role. Unknown strings are treated as
    /// no membership at all; a corrupt row must not grant anything.
    pub fn parsed_role(&self) -> Option<TeamRole> {
        self.role.parse().ok()
    }

    pub fn project_access(&self) -> ProjectAccess {
        ProjectAccess::from_stored(self.allowed_projects.as_deref())
    }
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::projects)]
pub struct Project {
    pub id: Uuid,
    pub team_id: TeamId,
    #[schema(example = "storefront")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::environments)]
pub struct Environment {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "production")]
    pub name: String,
    pub production: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::applications)]
pub struct Application {
    pub id: Uuid,
    pub environment_id: Option<Uuid>,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ownable for Application {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Application
    }
    fn resource_id(&self) -> Uuid {
        self.id
    }
    fn environment_id(&self) -> Option<Uuid> {
        self.environment_id
    }
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::services)]
pub struct Service {
    pub id: Uuid,
    pub environment_id: Option<Uuid>,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ownable for Service {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }
    fn resource_id(&self) -> Uuid {
        self.id
    }
    fn environment_id(&self) -> Option<Uuid> {
        self.environment_id
    }
}

/// Databases are either environment-scoped or standalone with a direct
/// team id (the legacy shape for shared instances).
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::databases)]
pub struct Database {
    pub id: Uuid,
    pub environment_id: Option<Uuid>,
    pub team_id: Option<TeamId>,
    pub name: String,
    pub engine: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ownable for Database {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
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

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::servers)]
pub struct Server {
    pub id: Uuid,
    pub team_id: TeamId,
    pub name: String,
    pub host: String,
    pub created_at: NaiveDateTime,
}

impl Ownable for Server {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }
    fn resource_id(&self) -> Uuid {
        self.id
    }
    fn direct_team_id(&self) -> Option<TeamId> {
        Some(self.team_id)
    }
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::deployments)]
pub struct Deployment {
    pub id: Uuid,
    pub application_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::deployment_approvals)]
pub struct DeploymentApproval {
    pub id: Uuid,
    pub deployment_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub decided_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}
