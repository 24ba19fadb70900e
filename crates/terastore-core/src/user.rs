//! Backend users and authorization levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization level carried in the access token and user listing.
///
/// Encoded as the integers 1, 2 and 3 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AuthLevel {
    Unauthorized,
    User,
    Admin,
}

impl AuthLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            AuthLevel::Unauthorized => 1,
            AuthLevel::User => 2,
            AuthLevel::Admin => 3,
        }
    }
}

impl TryFrom<u8> for AuthLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AuthLevel::Unauthorized),
            2 => Ok(AuthLevel::User),
            3 => Ok(AuthLevel::Admin),
            other => Err(format!("unknown auth level {}", other)),
        }
    }
}

impl From<AuthLevel> for u8 {
    fn from(level: AuthLevel) -> Self {
        level.as_u8()
    }
}

impl std::str::FromStr for AuthLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "unauthorized" => Ok(AuthLevel::Unauthorized),
            "2" | "user" => Ok(AuthLevel::User),
            "3" | "admin" => Ok(AuthLevel::Admin),
            other => Err(format!("unknown auth level '{}'", other)),
        }
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthLevel::Unauthorized => "unauthorized",
            AuthLevel::User => "user",
            AuthLevel::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub auth_level: AuthLevel,
}
