//! Organizational roles an interviewee can be classified into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of roles the classifier may assign.
///
/// `Business` covers operational departments. Older session files and model
/// outputs call it `fach`, which is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    It,
    #[serde(alias = "fach")]
    Business,
    Management,
}

impl Role {
    /// All roles in canonical order.
    pub const ALL: [Role; 3] = [Role::It, Role::Business, Role::Management];

    /// Role assigned when classification produced no usable candidate.
    pub const DEFAULT: Role = Role::Business;

    /// Machine identifier, as used in schema files and question ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::It => "it",
            Self::Business => "business",
            Self::Management => "management",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::It => "IT",
            Self::Business => "Business department",
            Self::Management => "Management",
        }
    }

    /// Identifiers accepted when parsing, including legacy spellings.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::It => &["it"],
            Self::Business => &["business", "fach", "fachabteilung"],
            Self::Management => &["management"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.aliases().contains(&normalized.as_str()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
