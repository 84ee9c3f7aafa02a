//! Page routing and access control.
//!
//! - `guard`: the pure decision of whether a page may render for a session
//! - `table`: the portal's pages, their paths and access requirements, and
//!   the per-role navigation menu

pub mod guard;
pub mod table;

pub use guard::{evaluate, GuardDecision, PageAccess, LOGIN_PATH};
pub use table::{check_path, navigation_menu, resolve, NavLink, Page, Route, ROUTES};
