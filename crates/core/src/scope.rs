//! Role-scoped project visibility.
//!
//! [`ProjectScope`] is handed to the store, which turns it into a query
//! predicate. Out-of-scope rows are never fetched; the in-process check in
//! [`ProjectScope::permits`] exists for stores without a query language and
//! for guarding single-record operations.

use serde::Serialize;

use crate::roles::Role;
use crate::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum ProjectScope {
    /// Every project.
    Unrestricted,
    /// Projects whose `manager_id` is the given user.
    ManagedBy(DbId),
    /// Projects whose team list contains the given user.
    TeamMember(DbId),
}

impl ProjectScope {
    /// Build the scope for an acting user.
    pub fn for_actor(role: Role, user_id: DbId) -> Self {
        match role {
            Role::Admin | Role::Dir | Role::Gg => ProjectScope::Unrestricted,
            Role::Gp => ProjectScope::ManagedBy(user_id),
            Role::Me => ProjectScope::TeamMember(user_id),
        }
    }

    /// Whether a project with the given manager and team falls inside the scope.
    pub fn permits(&self, manager_id: DbId, team_member_ids: &[DbId]) -> bool {
        match self {
            ProjectScope::Unrestricted => true,
            ProjectScope::ManagedBy(id) => manager_id == *id,
            ProjectScope::TeamMember(id) => team_member_ids.contains(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn read_all_roles_are_unrestricted() {
        let id = Uuid::new_v4();
        for role in [Role::Admin, Role::Dir, Role::Gg] {
            assert_eq!(ProjectScope::for_actor(role, id), ProjectScope::Unrestricted);
        }
    }

    #[test]
    fn gp_sees_only_managed_projects() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = ProjectScope::for_actor(Role::Gp, me);
        assert!(scope.permits(me, &[]));
        assert!(!scope.permits(other, &[me]));
    }

    #[test]
    fn me_sees_only_staffed_projects() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = ProjectScope::for_actor(Role::Me, me);
        assert!(scope.permits(other, &[other, me]));
        assert!(!scope.permits(me, &[other]));
        assert!(!scope.permits(other, &[]));
    }
}
