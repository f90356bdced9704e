//! HTTP request handlers.

pub mod approvals;
pub mod authorize;
pub mod health;
pub mod members;

use diesel::PgConnection;

use crate::authz::Actor;
use crate::error::{ApiError, ApiResult};
use crate::store;
use crate::AppState;

/// Loads an actor snapshot, consulting the cache before the database.
/// `None` means the user does not exist or is deactivated.
pub(crate) async fn fetch_actor(
    state: &AppState,
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
) -> ApiResult<Option<Actor>> {
    if let Some(actor) = state.cache.actor_cache.get(user_id).await {
        return Ok(Some(actor));
    }

    let actor = store::load_actor(conn, user_id).map_err(|_| ApiError::db_error())?;

    if let Some(actor) = &actor {
        // Best effort; a cache miss next time just re-reads the database.
        let _ = state.cache.actor_cache.set(actor).await;
    }

    Ok(actor)
}
