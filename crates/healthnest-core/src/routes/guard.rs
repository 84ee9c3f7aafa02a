use serde::{Deserialize, Serialize};

use crate::auth::SessionState;
use crate::models::Role;

/// Sign-in page unauthenticated visitors are sent to
pub const LOGIN_PATH: &str = "/login";

/// Who may see a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageAccess {
    /// Anyone, in any session state
    Public,
    /// Signed-out visitors only (sign-in and sign-up pages)
    GuestOnly,
    /// Any signed-in user
    Authenticated,
    /// Signed-in users of one role
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "decision", content = "role", rename_all = "kebab-case")]
pub enum GuardDecision {
    Allow,
    /// Session is still loading; evaluate again once it settles.
    Defer,
    RedirectToLogin,
    /// Send the user to the home page of *their* role.
    RedirectToRoleHome(Role),
}

impl GuardDecision {
    /// Where to go instead, if anywhere.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            GuardDecision::Allow | GuardDecision::Defer => None,
            GuardDecision::RedirectToLogin => Some(LOGIN_PATH),
            GuardDecision::RedirectToRoleHome(role) => Some(role.home_path()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Decide whether a page with the given access requirement may render.
///
/// Public pages always render. Nothing else is decided while the session is
/// loading. A role mismatch sends the user to their own home page rather
/// than to the page's role.
pub fn evaluate(state: &SessionState, access: PageAccess) -> GuardDecision {
    if access == PageAccess::Public {
        return GuardDecision::Allow;
    }

    match state {
        SessionState::Loading => GuardDecision::Defer,
        SessionState::Unauthenticated => match access {
            PageAccess::GuestOnly => GuardDecision::Allow,
            _ => GuardDecision::RedirectToLogin,
        },
        SessionState::Authenticated(identity) => match access {
            PageAccess::Public | PageAccess::Authenticated => GuardDecision::Allow,
            PageAccess::GuestOnly => GuardDecision::RedirectToRoleHome(identity.role),
            PageAccess::Role(required) if required == identity.role => GuardDecision::Allow,
            PageAccess::Role(_) => GuardDecision::RedirectToRoleHome(identity.role),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
