//! Team role hierarchy.
//!
//! Roles form a total order: owner > admin > developer > member > viewer.
//! Only the ordering matters to the decision logic; the numeric ranks exist
//! for logging and debugging.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Viewer,
    Member,
    Developer,
    Admin,
    Owner,
}

impl TeamRole {
    /// Numeric rank, higher means more privileged. A user with no membership
    /// in the owning team has effective rank 0 and fails every check.
    pub fn rank(self) -> u8 {
        match self {
            TeamRole::Viewer => 1,
            TeamRole::Member => 2,
            TeamRole::Developer => 3,
            TeamRole::Admin => 4,
            TeamRole::Owner => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TeamRole::Viewer => "viewer",
            TeamRole::Member => "member",
            TeamRole::Developer => "developer",
            TeamRole::Admin => "admin",
            TeamRole::Owner => "owner",
        }
    }

    pub fn at_least(self, minimum: TeamRole) -> bool {
        self >= minimum
    }

    /// Owner or admin. These roles bypass project access lists entirely.
    pub fn manages_team(self) -> bool {
        self >= TeamRole::Admin
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl std::fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown team role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for TeamRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(TeamRole::Viewer),
            "member" => Ok(TeamRole::Member),
            "developer" => Ok(TeamRole::Developer),
            "admin" => Ok(TeamRole::Admin),
            "owner" => Ok(TeamRole::Owner),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(TeamRole::Owner > TeamRole::Admin);
        assert!(TeamRole::Admin > TeamRole::Developer);
        assert!(TeamRole::Developer > TeamRole::Member);
        assert!(TeamRole::Member > TeamRole::Viewer);
    }

    #[test]
    fn test_rank_matches_ordering() {
        let roles = [
            TeamRole::Viewer,
            TeamRole::Member,
            TeamRole::Developer,
            TeamRole::Admin,
            TeamRole::Owner,
        ];
        for pair in roles.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_at_least() {
        assert!(TeamRole::Admin.at_least(TeamRole::Developer));
        assert!(TeamRole::Developer.at_least(TeamRole::Developer));
        assert!(!TeamRole::Member.at_least(TeamRole::Developer));
    }

    #[test]
    fn test_manages_team() {
        assert!(TeamRole::Owner.manages_team());
        assert!(TeamRole::Admin.manages_team());
        assert!(!TeamRole::Developer.manages_team());
        assert!(!TeamRole::Viewer.manages_team());
    }

    #[test]
    fn test_parse_round_trip() {
        for role in [
            TeamRole::Viewer,
            TeamRole::Member,
            TeamRole::Developer,
            TeamRole::Admin,
            TeamRole::Owner,
        ] {
            assert_eq!(role.as_str().parse::<TeamRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Owner".parse::<TeamRole>().unwrap(), TeamRole::Owner);
        assert_eq!(" ADMIN ".parse::<TeamRole>().unwrap(), TeamRole::Admin);
    }

    #[test]
    fn test_parse_unknown_role() {
        let err = "superuser".parse::<TeamRole>().unwrap_err();
        assert_eq!(err.0, "superuser");
    }
}
