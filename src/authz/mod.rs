//! The authorization decision core.
//!
//! Pure, synchronous predicate evaluation over loaded snapshots: no I/O, no
//! locking, no side effects. The web layer loads an [`actor::Actor`] and a
//! resolved [`ownership::OwningChain`] and asks the
//! [`policy::DecisionService`] for a [`policy::Decision`].

pub mod access;
pub mod actor;
pub mod approval;
pub mod grants;
pub mod membership;
pub mod ownership;
pub mod policy;
pub mod role;

pub use access::ProjectAccess;
pub use actor::{Actor, TeamId, TeamMembership, ROOT_TEAM_ID};
pub use approval::{decide_approval, ApprovalAction, ApprovalSnapshot, ApprovalState};
pub use membership::{AccessChange, MembershipError};
pub use ownership::{
    resolve_owning_team, EnvironmentInfo, Ownable, OwnershipSource, OwningChain, ProjectInfo,
    ResourceKind,
};
pub use policy::{Action, Decision, DecisionService, ResourcePolicy};
pub use role::TeamRole;
