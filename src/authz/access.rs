//! Per-membership project access lists.
//!
//! The stored form is a nullable string array where `null` and an empty
//! array both mean "no access" and the single element `"*"` means "every
//! project in the team". That three-way ambiguity stops at this boundary:
//! everything past the loader works with [`ProjectAccess`].

use std::collections::HashSet;
use uuid::Uuid;

/// Sentinel stored in `allowed_projects` granting access to all projects.
pub const WILDCARD: &str = "*";

/// Deny-by-default project grant for a non-admin team member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectAccess {
    /// No explicit grant; access to zero projects.
    Denied,
    /// Wildcard grant; every project in the team.
    All,
    /// Access to exactly the listed projects.
    Subset(HashSet<Uuid>),
}

impl ProjectAccess {
    /// Converts the stored column value. `None` and `[]` both normalize to
    /// `Denied`; a list containing the wildcard becomes `All`; entries that
    /// are not valid UUIDs are ignored (they cannot match any project).
    pub fn from_stored(stored: Option<&[String]>) -> Self {
        let entries = match stored {
            None => return ProjectAccess::Denied,
            Some(entries) if entries.is_empty() => return ProjectAccess::Denied,
            Some(entries) => entries,
        };

        if entries.iter().any(|e| e == WILDCARD) {
            return ProjectAccess::All;
        }

        let ids: HashSet<Uuid> = entries.iter().filter_map(|e| e.parse().ok()).collect();
        if ids.is_empty() {
            ProjectAccess::Denied
        } else {
            ProjectAccess::Subset(ids)
        }
    }

    /// Converts back to the stored representation. `Denied` stores `null`,
    /// never an empty list.
    pub fn to_stored(&self) -> Option<Vec<String>> {
        match self {
            ProjectAccess::Denied => None,
            ProjectAccess::All => Some(vec![WILDCARD.to_string()]),
            ProjectAccess::Subset(ids) => {
                let mut entries: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                entries.sort();
                Some(entries)
            }
        }
    }

    pub fn allows(&self, project_id: Uuid) -> bool {
        match self {
            ProjectAccess::Denied => false,
            ProjectAccess::All => true,
            ProjectAccess::Subset(ids) => ids.contains(&project_id),
        }
    }

    pub fn subset(ids: impl IntoIterator<Item = Uuid>) -> Self {
        let ids: HashSet<Uuid> = ids.into_iter().collect();
        if ids.is_empty() {
            ProjectAccess::Denied
        } else {
            ProjectAccess::Subset(ids)
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, ProjectAccess::Denied)
    }
}
