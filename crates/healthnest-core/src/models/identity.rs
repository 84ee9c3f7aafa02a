use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Home page for signed-in patients
pub const PATIENT_HOME: &str = "/patient-dashboard";

/// Home page for signed-in doctors
pub const DOCTOR_HOME: &str = "/doctor-dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0} (expected 'patient' or 'doctor')")]
pub struct UnknownRole(pub String);

impl Role {
    /// Dashboard a user of this role lands on after signing in.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Patient => PATIENT_HOME,
            Role::Doctor => DOCTOR_HOME,
        }
    }

    /// Single-letter prefix used for generated identity ids.
    pub fn id_prefix(&self) -> char {
        match self {
            Role::Patient => 'p',
            Role::Doctor => 'd',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
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

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// A registered user without its secret.
///
/// This is also the durable session record: it is what gets written to
/// session storage and read back on startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Identity {
    pub id: String,
    pub name: String,
    /// Contact address, also the login key
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Identity {
    pub fn home_path(&self) -> &'static str {
        self.role.home_path()
    }
}

// ============================================================================
// Tests
// ============================================================================
