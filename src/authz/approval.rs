//! Deployment approval state machine.
//!
//! Approvals start pending and move exactly once to approved, rejected or
//! cancelled. The transition predicates are decisions like everything else:
//! the callers flip the stored state only after an allow.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::actor::Actor;
use super::grants;
use super::ownership::OwningChain;
use super::policy::{reason, Decision};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ApprovalState {
    pub fn is_pending(self) -> bool {
        matches!(self, ApprovalState::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
            ApprovalState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalState::Pending),
            "approved" => Ok(ApprovalState::Approved),
            "rejected" => Ok(ApprovalState::Rejected),
            "cancelled" => Ok(ApprovalState::Cancelled),
            other => Err(format!("unknown approval state: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Reject,
    Cancel,
}

/// Snapshot of an approval plus its resolved ownership. `chain` is `None`
/// when the deployment's application or environment is gone.
#[derive(Debug, Clone)]
pub struct ApprovalSnapshot {
    pub id: Uuid,
    pub state: ApprovalState,
    pub requested_by: Uuid,
    pub chain: Option<OwningChain>,
}

pub const NOT_PENDING: &str = "not_pending";
pub const REQUESTED_BY: &str = "requested_by";
pub const APPROVER: &str = "approver";

/// Decides an approval transition. Approve and reject share one predicate;
/// the difference is only the resulting state. Cancel is additionally open
/// to the original requester, whatever their role, while pending.
pub fn decide_approval(
    actor: &Actor,
    approval: &ApprovalSnapshot,
    action: ApprovalAction,
) -> Decision {
    if !approval.state.is_pending() {
        return Decision::deny(NOT_PENDING);
    }

    if action == ApprovalAction::Cancel && approval.requested_by == actor.user_id {
        return Decision::allow(REQUESTED_BY);
    }

    let Some(chain) = &approval.chain else {
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

    if grants::can_approve_deployment(actor, chain.team_id) {
        Decision::allow(APPROVER)
    } else {
        Decision::deny(reason::INSUFFICIENT_ROLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::access::ProjectAccess;
    use crate::authz::role::TeamRole;

    fn pending(requested_by: Uuid) -> ApprovalSnapshot {
        ApprovalSnapshot {
            id: Uuid::new_v4(),
            state: ApprovalState::Pending,
            requested_by,
            chain: Some(OwningChain::direct(1)),
        }
    }

    #[test]
    fn test_non_pending_always_denies() {
        let admin =
            Actor::new(Uuid::new_v4()).with_membership(1, TeamRole::Owner, ProjectAccess::All);
        for state in [
            ApprovalState::Approved,
            ApprovalState::Rejected,
            ApprovalState::Cancelled,
        ] {
            let approval = ApprovalSnapshot {
                state,
                ..pending(admin.user_id)
            };
            for action in [
                ApprovalAction::Approve,
                ApprovalAction::Reject,
                ApprovalAction::Cancel,
            ] {
                let decision = decide_approval(&admin, &approval, action);
                assert!(!decision.allowed);
                assert_eq!(decision.reason, NOT_PENDING);
            }
        }
    }

    #[test]
    fn test_requester_can_always_cancel_while_pending() {
        let requester = Actor::new(Uuid::new_v4()).with_membership(
            1,
            TeamRole::Viewer,
            ProjectAccess::Denied,
        );
        let approval = pending(requester.user_id);

        let cancel = decide_approval(&requester, &approval, ApprovalAction::Cancel);
        assert!(cancel.allowed);
        assert_eq!(cancel.reason, REQUESTED_BY);

        // The same viewer cannot approve.
        let approve = decide_approval(&requester, &approval, ApprovalAction::Approve);
        assert!(!approve.allowed);
    }

    #[test]
    fn test_approve_and_reject_share_the_predicate() {
        let admin =
            Actor::new(Uuid::new_v4()).with_membership(1, TeamRole::Admin, ProjectAccess::Denied);
        let developer = Actor::new(Uuid::new_v4()).with_membership(
            1,
            TeamRole::Developer,
            ProjectAccess::All,
        );
        let approval = pending(Uuid::new_v4());

        for action in [ApprovalAction::Approve, ApprovalAction::Reject] {
            assert!(decide_approval(&admin, &approval, action).allowed);
            assert!(!decide_approval(&developer, &approval, action).allowed);
        }
    }

    #[test]
    fn test_approver_may_cancel_someone_elses_request() {
        let admin =
            Actor::new(Uuid::new_v4()).with_membership(1, TeamRole::Admin, ProjectAccess::All);
        let approval = pending(Uuid::new_v4());
        let cancel = decide_approval(&admin, &approval, ApprovalAction::Cancel);
        assert!(cancel.allowed);
        assert_eq!(cancel.reason, APPROVER);
    }

    #[test]
    fn test_orphaned_approval_needs_platform_admin() {
        let approval = ApprovalSnapshot {
            chain: None,
            ..pending(Uuid::new_v4())
        };
        let admin =
            Actor::new(Uuid::new_v4()).with_membership(1, TeamRole::Owner, ProjectAccess::All);
        assert!(!decide_approval(&admin, &approval, ApprovalAction::Approve).allowed);

        let platform = Actor::new(Uuid::new_v4()).platform_admin();
        assert!(decide_approval(&platform, &approval, ApprovalAction::Approve).allowed);
    }

    #[test]
    fn test_state_parse_round_trip() {
        for state in [
            ApprovalState::Pending,
            ApprovalState::Approved,
            ApprovalState::Rejected,
            ApprovalState::Cancelled,
        ] {
            assert_eq!(state.as_str().parse::<ApprovalState>().unwrap(), state);
        }
    }
}
