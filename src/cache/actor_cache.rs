//! Redis-backed actor snapshot caching.
//!
//! Membership lookups dominate the database load of a check, so resolved
//! [`Actor`] snapshots are cached briefly. The TTL is the staleness bound:
//! a revoked grant can survive at most that long.

use deadpool_redis::Pool;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::authz::{Actor, ProjectAccess, TeamId, TeamRole};

const ACTOR_CACHE_PREFIX: &str = "actor:";
const DEFAULT_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMembership {
    team_id: TeamId,
    role: String,
    allowed_projects: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedActor {
    pub user_id: Uuid,
    pub is_platform_admin: bool,
    pub is_super_admin: bool,
    memberships: Vec<CachedMembership>,
    pub cached_at: i64,
}

impl CachedActor {
    fn from_actor(actor: &Actor) -> Self {
        Self {
            user_id: actor.user_id,
            is_platform_admin: actor.is_platform_admin,
            is_super_admin: actor.is_super_admin,
            memberships: actor
                .memberships()
                .map(|m| CachedMembership {
                    team_id: m.team_id,
                    role: m.role.as_str().to_string(),
                    allowed_projects: m.access.to_stored(),
                })
                .collect(),
            cached_at: chrono::Utc::now().timestamp(),
        }
    }

    fn into_actor(self) -> Actor {
        let mut actor = Actor::new(self.user_id);
        if self.is_platform_admin {
            actor = actor.platform_admin();
        }
        if self.is_super_admin {
            actor = actor.super_admin();
        }
        for m in self.memberships {
            let Ok(role) = m.role.parse::<TeamRole>() else {
                continue;
            };
            actor = actor.with_membership(
                m.team_id,
                role,
                ProjectAccess::from_stored(m.allowed_projects.as_deref()),
            );
        }
        actor
    }
}

#[derive(Clone)]
pub struct ActorCache {
    pool: Option<Pool>,
    ttl_secs: u64,
}

impl ActorCache {
    pub fn new(pool: Option<Pool>) -> Self {
        Self {
            pool,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_ttl(pool: Option<Pool>, ttl_secs: u64) -> Self {
        Self { pool, ttl_secs }
    }

    fn cache_key(user_id: Uuid) -> String {
        format!("{}{}", ACTOR_CACHE_PREFIX, user_id)
    }

    pub async fn set(&self, actor: &Actor) -> Result<(), CacheError> {
        let pool = self.pool.as_ref().ok_or(CacheError::NoRedis)?;
        let mut conn = pool.get().await.map_err(|e| {
            error!(error = %e, "Failed to get Redis connection");
            CacheError::ConnectionFailed
        })?;

        let entry = CachedActor::from_actor(actor);
        let key = Self::cache_key(actor.user_id);
        let value = serde_json::to_string(&entry).map_err(|_| CacheError::SerializationFailed)?;

        conn.set_ex::<_, _, ()>(&key, value, self.ttl_secs)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to cache actor snapshot");
                CacheError::OperationFailed
            })?;

        debug!(user_id = %actor.user_id, "Actor snapshot cached");
        Ok(())
    }

    pub async fn get(&self, user_id: Uuid) -> Option<Actor> {
        let pool = self.pool.as_ref()?;
        let mut conn = pool.get().await.ok()?;

        let key = Self::cache_key(user_id);
        let value: Option<String> = conn.get(&key).await.ok()?;

        value
            .and_then(|v| serde_json::from_str::<CachedActor>(&v).ok())
            .map(CachedActor::into_actor)
    }

    /// Drops a user's cached snapshot; called after any membership mutation
    /// so the next check sees the new grants.
    pub async fn invalidate(&self, user_id: Uuid) -> Result<(), CacheError> {
        let pool = self.pool.as_ref().ok_or(CacheError::NoRedis)?;
        let mut conn = pool.get().await.map_err(|e| {
            error!(error = %e, "Failed to get Redis connection");
            CacheError::ConnectionFailed
        })?;

        let key = Self::cache_key(user_id);
        conn.del::<_, ()>(&key).await.map_err(|e| {
            error!(error = %e, "Failed to invalidate actor cache");
            CacheError::OperationFailed
        })?;

        debug!(user_id = %user_id, "Actor cache invalidated");
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    pub fn pool(&self) -> Option<&Pool> {
        self.pool.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum CacheError {
    NoRedis,
    ConnectionFailed,
    OperationFailed,
    SerializationFailed,
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::NoRedis => write!(f, "Redis not configured"),
            CacheError::ConnectionFailed => write!(f, "Redis connection failed"),
            CacheError::OperationFailed => write!(f, "Redis operation failed"),
            CacheError::SerializationFailed => write!(f, "Serialization failed"),
        }
    }
}

impl std::error::Error for CacheError {}
