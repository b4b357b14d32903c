//! Role → permission table and the checks derived from it.
//!
//! Each role's grant list is spelled out in full; roles do not inherit from
//! one another. When a permission is added, every list below has to be
//! revisited by hand. The `admin_holds_every_permission` test catches the
//! most common omission.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// A single grantable action, serialized as `resource:action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "project:create")]
    ProjectCreate,
    #[serde(rename = "project:read")]
    ProjectRead,
    #[serde(rename = "project:update")]
    ProjectUpdate,
    #[serde(rename = "project:delete")]
    ProjectDelete,
    #[serde(rename = "project:read_all")]
    ProjectReadAll,
    #[serde(rename = "project:read_financial")]
    ProjectReadFinancial,

    #[serde(rename = "user:create")]
    UserCreate,
    #[serde(rename = "user:read")]
    UserRead,
    #[serde(rename = "user:update")]
    UserUpdate,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "user:read_all")]
    UserReadAll,

    #[serde(rename = "risk:create")]
    RiskCreate,
    #[serde(rename = "risk:read")]
    RiskRead,
    #[serde(rename = "risk:update")]
    RiskUpdate,
    #[serde(rename = "risk:delete")]
    RiskDelete,

    #[serde(rename = "presentation:create")]
    PresentationCreate,
    #[serde(rename = "presentation:access")]
    PresentationAccess,
    #[serde(rename = "presentation:export")]
    PresentationExport,

    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "audit:read_all")]
    AuditReadAll,
}

impl Permission {
    pub const ALL: [Permission; 20] = [
        Permission::ProjectCreate,
        Permission::ProjectRead,
        Permission::ProjectUpdate,
        Permission::ProjectDelete,
        Permission::ProjectReadAll,
        Permission::ProjectReadFinancial,
        Permission::UserCreate,
        Permission::UserRead,
        Permission::UserUpdate,
        Permission::UserDelete,
        Permission::UserReadAll,
        Permission::RiskCreate,
        Permission::RiskRead,
        Permission::RiskUpdate,
        Permission::RiskDelete,
        Permission::PresentationCreate,
        Permission::PresentationAccess,
        Permission::PresentationExport,
        Permission::AuditRead,
        Permission::AuditReadAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ProjectCreate => "project:create",
            Permission::ProjectRead => "project:read",
            Permission::ProjectUpdate => "project:update",
            Permission::ProjectDelete => "project:delete",
            Permission::ProjectReadAll => "project:read_all",
            Permission::ProjectReadFinancial => "project:read_financial",
            Permission::UserCreate => "user:create",
            Permission::UserRead => "user:read",
            Permission::UserUpdate => "user:update",
            Permission::UserDelete => "user:delete",
            Permission::UserReadAll => "user:read_all",
            Permission::RiskCreate => "risk:create",
            Permission::RiskRead => "risk:read",
            Permission::RiskUpdate => "risk:update",
            Permission::RiskDelete => "risk:delete",
            Permission::PresentationCreate => "presentation:create",
            Permission::PresentationAccess => "presentation:access",
            Permission::PresentationExport => "presentation:export",
            Permission::AuditRead => "audit:read",
            Permission::AuditReadAll => "audit:read_all",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown permission '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const DIR_PERMISSIONS: &[Permission] = &[
    Permission::ProjectRead,
    Permission::ProjectReadAll,
    Permission::ProjectReadFinancial,
    Permission::UserRead,
    Permission::RiskRead,
    Permission::PresentationAccess,
    Permission::AuditRead,
];

const GG_PERMISSIONS: &[Permission] = &[
    Permission::ProjectRead,
    Permission::ProjectReadAll,
    Permission::ProjectReadFinancial,
    Permission::UserRead,
    Permission::RiskRead,
    Permission::PresentationAccess,
];

const GP_PERMISSIONS: &[Permission] = &[
    Permission::ProjectCreate,
    Permission::ProjectRead,
    Permission::ProjectUpdate,
    Permission::UserRead,
    Permission::RiskCreate,
    Permission::RiskRead,
    Permission::RiskUpdate,
    Permission::RiskDelete,
    Permission::PresentationCreate,
    Permission::PresentationAccess,
];

const ME_PERMISSIONS: &[Permission] = &[
    Permission::ProjectRead,
    Permission::UserRead,
    Permission::RiskRead,
    Permission::PresentationAccess,
];

/// The full grant list for a role.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Dir => DIR_PERMISSIONS,
        Role::Gg => GG_PERMISSIONS,
        Role::Gp => GP_PERMISSIONS,
        Role::Me => ME_PERMISSIONS,
    }
}

/// Pure set-membership test against the table.
pub fn has_permission(role: Role, permission: Permission) -> bool {
    role_permissions(role).contains(&permission)
}

/// String form of [`has_permission`]; unknown permission strings are never granted.
pub fn has_permission_str(role: Role, permission: &str) -> bool {
    permission
        .parse::<Permission>()
        .is_ok_and(|p| has_permission(role, p))
}

/// Return `Forbidden` unless `role` holds `permission`.
pub fn require_permission(role: Role, permission: Permission) -> Result<(), CoreError> {
    if has_permission(role, permission) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role {role} lacks permission {permission}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Derived checks
// ---------------------------------------------------------------------------

/// Whether a role may see budget, cost, revenue and ROI figures.
///
/// Read from the table through `project:read_financial`, which is granted to
/// exactly ADMIN, DIR and GG.
pub fn can_access_financial_data(role: Role) -> bool {
    has_permission(role, Permission::ProjectReadFinancial)
}

/// ADMIN may edit any project; GP only the projects they manage.
pub fn can_edit_project(role: Role, project_manager_id: DbId, acting_user_id: DbId) -> bool {
    match role {
        Role::Admin => true,
        Role::Gp => project_manager_id == acting_user_id,
        Role::Dir | Role::Gg | Role::Me => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn admin_holds_every_permission() {
        for p in Permission::ALL {
            assert!(has_permission(Role::Admin, p), "ADMIN missing {p}");
        }
    }

    #[test]
    fn me_is_read_only() {
        assert!(has_permission(Role::Me, Permission::ProjectRead));
        assert!(!has_permission(Role::Me, Permission::ProjectUpdate));
        assert!(!has_permission(Role::Me, Permission::RiskCreate));
        assert!(!has_permission(Role::Me, Permission::PresentationCreate));
    }

    #[test]
    fn dir_reads_audit_but_gg_does_not() {
        assert!(has_permission(Role::Dir, Permission::AuditRead));
        assert!(!has_permission(Role::Gg, Permission::AuditRead));
    }

    #[test]
    fn only_admin_deletes_projects() {
        for role in Role::ALL {
            assert_eq!(
                has_permission(role, Permission::ProjectDelete),
                role == Role::Admin
            );
        }
    }

    #[test]
    fn string_check_matches_typed_check() {
        assert!(has_permission_str(Role::Gp, "risk:delete"));
        assert!(!has_permission_str(Role::Gg, "risk:delete"));
        assert!(!has_permission_str(Role::Admin, "risk:explode"));
    }

    #[test]
    fn permission_strings_round_trip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(serde_json::to_value(p).unwrap(), p.as_str());
        }
    }

    #[test]
    fn financial_access_is_exactly_admin_dir_gg() {
        let allowed: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| can_access_financial_data(*r))
            .collect();
        assert_eq!(allowed, vec![Role::Admin, Role::Dir, Role::Gg]);
    }

    #[test]
    fn gp_edits_only_own_projects() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        assert!(can_edit_project(Role::Gp, x, x));
        assert!(!can_edit_project(Role::Gp, x, y));
    }

    #[test]
    fn admin_edits_any_project() {
        assert!(can_edit_project(Role::Admin, Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn read_only_roles_never_edit_even_as_manager() {
        let id = Uuid::new_v4();
        for role in [Role::Dir, Role::Gg, Role::Me] {
            assert!(!can_edit_project(role, id, id));
        }
    }

    #[test]
    fn require_permission_returns_forbidden() {
        assert!(require_permission(Role::Gp, Permission::ProjectCreate).is_ok());
        assert!(matches!(
            require_permission(Role::Me, Permission::ProjectCreate),
            Err(CoreError::Forbidden(_))
        ));
    }
}
