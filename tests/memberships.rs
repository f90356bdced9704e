//! Membership mutation rules: who may change whose role or access, and the
//! structural guards (last owner, self-change, owner immutability).

mod common;

use common::member_of;
use saturn_authz::authz::{
    membership::{self, MembershipError},
    AccessChange, ProjectAccess, TeamRole,
};
use std::collections::HashSet;
use uuid::Uuid;

fn no_projects() -> HashSet<Uuid> {
    HashSet::new()
}

// ============================================================================
// Actor permission boundary
// ============================================================================

#[test]
fn only_admin_rank_may_mutate_memberships() {
    let change = AccessChange {
        grant_all: true,
        projects: vec![],
    };

    for role in [TeamRole::Viewer, TeamRole::Member, TeamRole::Developer] {
        let actor = member_of(1, role, ProjectAccess::All);
        let err =
            membership::update_project_access(&actor, 1, TeamRole::Member, &no_projects(), &change)
                .unwrap_err();
        assert_eq!(err, MembershipError::ActorNotPermitted);
        assert_eq!(err.code(), "ACTOR_NOT_PERMITTED");
    }
}

#[test]
fn touching_admins_and_owners_takes_an_owner() {
    let admin = member_of(1, TeamRole::Admin, ProjectAccess::All);
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);

    let err = membership::change_member_role(&admin, 1, Uuid::new_v4(), TeamRole::Admin, "member", 2)
        .unwrap_err();
    assert_eq!(err, MembershipError::ActorNotPermitted);

    let role =
        membership::change_member_role(&owner, 1, Uuid::new_v4(), TeamRole::Admin, "member", 2)
            .unwrap();
    assert_eq!(role, TeamRole::Member);
}

#[test]
fn membership_in_another_team_grants_nothing() {
    let foreign_admin = member_of(2, TeamRole::Admin, ProjectAccess::All);
    let err = membership::remove_member(&foreign_admin, 1, Uuid::new_v4(), TeamRole::Member, 1)
        .unwrap_err();
    assert_eq!(err, MembershipError::ActorNotPermitted);
}

// ============================================================================
// Project access changes
// ============================================================================

#[test]
fn owner_access_is_never_restricted() {
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);
    let err = membership::update_project_access(
        &owner,
        1,
        TeamRole::Owner,
        &no_projects(),
        &AccessChange::default(),
    )
    .unwrap_err();
    assert_eq!(err, MembershipError::CannotRestrictOwner);
    assert_eq!(err.code(), "OWNER_ACCESS_IMMUTABLE");
}

#[test]
fn one_unknown_project_rejects_the_whole_request() {
    let admin = member_of(1, TeamRole::Admin, ProjectAccess::All);
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();
    let team_projects: HashSet<Uuid> = [known].into_iter().collect();

    let err = membership::update_project_access(
        &admin,
        1,
        TeamRole::Developer,
        &team_projects,
        &AccessChange {
            grant_all: false,
            projects: vec![known, unknown],
        },
    )
    .unwrap_err();
    assert_eq!(err, MembershipError::UnknownProject(unknown));
    assert_eq!(err.code(), "UNKNOWN_PROJECT");
}

#[test]
fn grant_all_skips_project_validation() {
    let admin = member_of(1, TeamRole::Admin, ProjectAccess::All);
    let access = membership::update_project_access(
        &admin,
        1,
        TeamRole::Member,
        &no_projects(),
        &AccessChange {
            grant_all: true,
            projects: vec![Uuid::new_v4()],
        },
    )
    .unwrap();
    assert_eq!(access, ProjectAccess::All);
}

// ============================================================================
// Role changes and removal
// ============================================================================

#[test]
fn unknown_role_names_are_rejected_with_the_name() {
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);
    let err =
        membership::change_member_role(&owner, 1, Uuid::new_v4(), TeamRole::Member, "superuser", 2)
            .unwrap_err();
    assert_eq!(err, MembershipError::InvalidRole("superuser".to_string()));
    assert_eq!(err.code(), "INVALID_ROLE");
}

#[test]
fn role_names_parse_case_insensitively() {
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);
    let role =
        membership::change_member_role(&owner, 1, Uuid::new_v4(), TeamRole::Member, " Developer ", 2)
            .unwrap();
    assert_eq!(role, TeamRole::Developer);
}

#[test]
fn the_last_owner_is_pinned() {
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);

    let err = membership::change_member_role(&owner, 1, Uuid::new_v4(), TeamRole::Owner, "admin", 1)
        .unwrap_err();
    assert_eq!(err, MembershipError::LastOwner);

    let err =
        membership::remove_member(&owner, 1, Uuid::new_v4(), TeamRole::Owner, 1).unwrap_err();
    assert_eq!(err, MembershipError::LastOwner);

    // A second owner unblocks both.
    assert!(
        membership::change_member_role(&owner, 1, Uuid::new_v4(), TeamRole::Owner, "admin", 2)
            .is_ok()
    );
    assert!(membership::remove_member(&owner, 1, Uuid::new_v4(), TeamRole::Owner, 2).is_ok());
}

#[test]
fn nobody_edits_their_own_membership() {
    let owner = member_of(1, TeamRole::Owner, ProjectAccess::All);

    let err = membership::change_member_role(&owner, 1, owner.user_id, TeamRole::Owner, "admin", 3)
        .unwrap_err();
    assert_eq!(err, MembershipError::SelfChange);

    let err = membership::remove_member(&owner, 1, owner.user_id, TeamRole::Owner, 3).unwrap_err();
    assert_eq!(err, MembershipError::SelfChange);
    assert_eq!(err.code(), "SELF_CHANGE");
}

#[test]
fn admin_manages_ordinary_members() {
    let admin = member_of(1, TeamRole::Admin, ProjectAccess::All);

    let role =
        membership::change_member_role(&admin, 1, Uuid::new_v4(), TeamRole::Viewer, "developer", 1)
            .unwrap();
    assert_eq!(role, TeamRole::Developer);

    assert!(membership::remove_member(&admin, 1, Uuid::new_v4(), TeamRole::Member, 1).is_ok());
}
