//! Role-based access control for the directory.
//!
//! Authorization is decided by the caller's role alone; employers carry no owner. The
//! predicates are total over the closed role set and are consulted before any persisted state
//! is touched.

mod gate;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gate::{bearer_token, Actor, Gatekeeper};

/// Staff role attached to every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Director,
    Supervisor,
    EmploymentSpecialist,
    Crs,
}

impl Role {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Admin,
            Self::Director,
            Self::Supervisor,
            Self::EmploymentSpecialist,
            Self::Crs,
        ]
    }

    /// Roles that may be granted through an invite. Admin is only ever created by bootstrap.
    pub const fn invitable() -> [Self; 4] {
        [
            Self::Director,
            Self::Supervisor,
            Self::EmploymentSpecialist,
            Self::Crs,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Director => "director",
            Self::Supervisor => "supervisor",
            Self::EmploymentSpecialist => "employment_specialist",
            Self::Crs => "crs",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Director => "Director",
            Self::Supervisor => "Supervisor",
            Self::EmploymentSpecialist => "Employment Specialist",
            Self::Crs => "Community Relations Specialist",
        }
    }

    pub const fn is_invitable(self) -> bool {
        !matches!(self, Self::Admin)
    }

    pub const fn capabilities(self) -> Capabilities {
        Capabilities {
            view_all_employers: can_view_all_employers(self),
            view_active_only: can_view_active_only(self),
            edit_employers: can_edit_employers(self),
            delete_employers: can_delete_employers(self),
            manage_users: can_manage_users(self),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(pub String);

/// Snapshot of every capability predicate for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub view_all_employers: bool,
    pub view_active_only: bool,
    pub edit_employers: bool,
    pub delete_employers: bool,
    pub manage_users: bool,
}

pub const fn can_view_all_employers(role: Role) -> bool {
    match role {
        Role::Admin | Role::Director | Role::Crs => true,
        Role::Supervisor | Role::EmploymentSpecialist => false,
    }
}

pub const fn can_view_active_only(role: Role) -> bool {
    match role {
        Role::Supervisor | Role::EmploymentSpecialist => true,
        Role::Admin | Role::Director | Role::Crs => false,
    }
}

pub const fn can_edit_employers(role: Role) -> bool {
    match role {
        Role::Admin | Role::Director | Role::Crs => true,
        Role::Supervisor | Role::EmploymentSpecialist => false,
    }
}

pub const fn can_delete_employers(role: Role) -> bool {
    match role {
        Role::Admin | Role::Director => true,
        Role::Supervisor | Role::EmploymentSpecialist | Role::Crs => false,
    }
}

pub const fn can_manage_users(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Director | Role::Supervisor | Role::EmploymentSpecialist | Role::Crs => false,
    }
}
