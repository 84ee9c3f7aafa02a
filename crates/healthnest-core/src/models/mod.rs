//! Data models shared across the session core.
//!
//! - `Role`: patient or doctor, with the role's home page
//! - `Identity`: a registered user as seen outside the credential store

pub mod identity;

pub use identity::{Identity, Role, UnknownRole};
