//! Portal roles
//!
//! `Role` is the closed set a principal may choose during onboarding.
//! `RoleClaim` is what arrives from the outside world: session metadata and
//! client identity state may carry any string, and the access gates must
//! still make a decision for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A portal role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    /// All roles, in onboarding display order
    pub const ALL: [Role; 3] = [Role::Patient, Role::Doctor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    /// Landing page for a principal holding this role
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the portal roles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// A role as carried by claims or client identity state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleClaim {
    /// One of the portal roles
    Known(Role),

    /// A non-empty role string outside the closed set
    Unrecognized(String),
}

impl RoleClaim {
    /// Interpret a raw role string. Empty strings mean "no role".
    pub fn from_raw(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<Role>() {
            Ok(role) => RoleClaim::Known(role),
            Err(_) => RoleClaim::Unrecognized(raw.to_string()),
        })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Unrecognized(_) => None,
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleClaim::Known(role) => role.as_str(),
            RoleClaim::Unrecognized(raw) => raw,
        }
    }
}

impl RoleClaim {
    /// Landing page for the claim, `/{role}/dashboard` whether or not the
    /// role is one of the known set
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoleClaim {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleClaim {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RoleClaim::from_raw(&raw).ok_or_else(|| serde::de::Error::custom("empty role"))
    }
}
