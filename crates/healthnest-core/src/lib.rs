//! HealthNest session core.
//!
//! Patients and doctors sign in against a [`auth::CredentialStore`]; the
//! [`auth::SessionManager`] keeps the signed-in [`models::Identity`] and
//! persists it so a restart resumes the session; the route guard in
//! [`routes`] decides whether a page may render for the current session.
//!
//! Side effects of the session manager go through three narrow
//! collaborators: [`auth::SessionStorage`], [`navigation::Navigator`] and
//! [`notify::Notifier`].

pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod routes;

pub use auth::{AuthError, CredentialStore, SessionManager, SessionState};
pub use config::Config;
pub use models::{Identity, Role};
pub use routes::{GuardDecision, PageAccess};
