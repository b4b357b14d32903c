//! Access profiles.
//!
//! Roles form a closed set; every per-role table in the workspace is an
//! exhaustive `match` over [`Role`], so adding a profile is a compile error
//! everywhere a decision has to be made for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire codes, as stored in the `users.role` column.
pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_DIR: &str = "DIR";
pub const ROLE_GG: &str = "GG";
pub const ROLE_GP: &str = "GP";
pub const ROLE_ME: &str = "ME";

/// A user's access profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrator: full management and financial access.
    #[serde(rename = "ADMIN")]
    Admin,
    /// Director: read-only, executive and financial views.
    #[serde(rename = "DIR")]
    Dir,
    /// General manager: read-only portfolio with financials.
    #[serde(rename = "GG")]
    Gg,
    /// Project manager: manages their own projects and risks.
    #[serde(rename = "GP")]
    Gp,
    /// Team member: sees the projects they are staffed on.
    #[serde(rename = "ME")]
    Me,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Dir, Role::Gg, Role::Gp, Role::Me];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Dir => ROLE_DIR,
            Role::Gg => ROLE_GG,
            Role::Gp => ROLE_GP,
            Role::Me => ROLE_ME,
        }
    }

    /// Human-readable profile name shown in the console.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Dir => "Diretor",
            Role::Gg => "Gerente Geral",
            Role::Gp => "Gerente de Projetos",
            Role::Me => "Membro da Equipe",
        }
    }

    /// Color token used by clients to badge the profile.
    pub fn color(self) -> &'static str {
        match self {
            Role::Admin => "#1976d2",
            Role::Dir => "#7b1fa2",
            Role::Gg => "#388e3c",
            Role::Gp => "#f57c00",
            Role::Me => "#455a64",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_DIR => Ok(Role::Dir),
            ROLE_GG => Ok(Role::Gg),
            ROLE_GP => Ok(Role::Gp),
            ROLE_ME => Ok(Role::Me),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_code_is_a_validation_error() {
        assert!(matches!("admin".parse::<Role>(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn serde_uses_upper_case_codes() {
        assert_eq!(serde_json::to_value(Role::Gp).unwrap(), "GP");
        let role: Role = serde_json::from_value(serde_json::json!("DIR")).unwrap();
        assert_eq!(role, Role::Dir);
    }

    #[test]
    fn every_role_has_a_distinct_color() {
        let mut colors: Vec<_> = Role::ALL.iter().map(|r| r.color()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), Role::ALL.len());
    }
}
