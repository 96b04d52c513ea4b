use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Talent,
    Company,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Talent => "talent",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "talent" => Ok(Role::Talent),
            "company" => Ok(Role::Company),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Unauthorized(format!("Unknown role: {}", other))),
        }
    }
}

/// The authenticated caller. `profile_id` is the talent or company profile the
/// user acts through; admins usually have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub profile_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_talent(&self, talent_id: Uuid) -> bool {
        self.role == Role::Talent && self.profile_id == Some(talent_id)
    }

    pub fn is_company(&self, company_id: Uuid) -> bool {
        self.role == Role::Company && self.profile_id == Some(company_id)
    }

    pub fn require_role(&self, role: Role) -> crate::error::Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("This action requires the {} role", role)))
        }
    }

    pub fn require_profile(&self) -> crate::error::Result<Uuid> {
        self.profile_id.ok_or_else(|| {
            Error::NotFound(format!("No {} profile is linked to this account", self.role))
        })
    }
}
