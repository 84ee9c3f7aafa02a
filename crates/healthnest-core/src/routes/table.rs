use super::guard::{evaluate, GuardDecision, PageAccess};
use crate::auth::SessionState;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Register,
    PatientDashboard,
    PatientAppointments,
    MyDoctors,
    MedicalRecords,
    SymptomChecker,
    DoctorDashboard,
    DoctorAppointments,
    MyPatients,
    Schedule,
    PatientRecords,
    Messages,
    Notifications,
    Settings,
    NotFound,
}

impl Page {
    /// Get the display title for this page.
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Login => "Sign in",
            Page::Register => "Create an account",
            Page::PatientDashboard | Page::DoctorDashboard => "Dashboard",
            Page::PatientAppointments | Page::DoctorAppointments => "Appointments",
            Page::MyDoctors => "My Doctors",
            Page::MedicalRecords => "Medical Records",
            Page::SymptomChecker => "Symptom Checker",
            Page::MyPatients => "My Patients",
            Page::Schedule => "Schedule",
            Page::PatientRecords => "Patient Records",
            Page::Messages => "Messages",
            Page::Notifications => "Notifications",
            Page::Settings => "Settings",
            Page::NotFound => "Page not found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub page: Page,
    pub access: PageAccess,
}

const fn route(path: &'static str, page: Page, access: PageAccess) -> Route {
    Route { path, page, access }
}

const PATIENT: PageAccess = PageAccess::Role(Role::Patient);
const DOCTOR: PageAccess = PageAccess::Role(Role::Doctor);

/// Every page of the portal. Paths not listed here resolve to `NOT_FOUND`.
pub const ROUTES: &[Route] = &[
    route("/", Page::Home, PageAccess::Public),
    route("/login", Page::Login, PageAccess::GuestOnly),
    route("/register", Page::Register, PageAccess::GuestOnly),
    // Patient
    route("/patient-dashboard", Page::PatientDashboard, PATIENT),
    route("/patient-appointments", Page::PatientAppointments, PATIENT),
    route("/my-doctors", Page::MyDoctors, PATIENT),
    route("/medical-records", Page::MedicalRecords, PATIENT),
    route("/symptom-checker", Page::SymptomChecker, PATIENT),
    // Doctor
    route("/doctor-dashboard", Page::DoctorDashboard, DOCTOR),
    route("/doctor-appointments", Page::DoctorAppointments, DOCTOR),
    route("/my-patients", Page::MyPatients, DOCTOR),
    route("/schedule", Page::Schedule, DOCTOR),
    route("/patient-records", Page::PatientRecords, DOCTOR),
    // Shared
    route("/messages", Page::Messages, PageAccess::Authenticated),
    route("/notifications", Page::Notifications, PageAccess::Authenticated),
    route("/settings", Page::Settings, PageAccess::Authenticated),
];

const NOT_FOUND: Route = route("*", Page::NotFound, PageAccess::Public);

/// Look up the route for a path.
///
/// Matching follows the browser router: the query string and fragment are
/// dropped, repeated and trailing slashes are ignored, and ASCII case does
/// not matter.
pub fn resolve(path: &str) -> Route {
    let path = normalize(path);
    ROUTES
        .iter()
        .find(|r| r.path.eq_ignore_ascii_case(&path))
        .copied()
        .unwrap_or(NOT_FOUND)
}

fn normalize(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Resolve a path and run the guard against it.
pub fn check_path(state: &SessionState, path: &str) -> GuardDecision {
    evaluate(state, resolve(path).access)
}

/// Sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

const fn link(label: &'static str, path: &'static str) -> NavLink {
    NavLink { label, path }
}

const PATIENT_MENU: &[NavLink] = &[
    link("Dashboard", "/patient-dashboard"),
    link("Appointments", "/patient-appointments"),
    link("My Doctors", "/my-doctors"),
    link("Symptom Checker", "/symptom-checker"),
    link("Medical Records", "/medical-records"),
    link("Messages", "/messages"),
    link("Notifications", "/notifications"),
    link("Settings", "/settings"),
];

const DOCTOR_MENU: &[NavLink] = &[
    link("Dashboard", "/doctor-dashboard"),
    link("Appointments", "/doctor-appointments"),
    link("My Patients", "/my-patients"),
    link("Schedule", "/schedule"),
    link("Patient Records", "/patient-records"),
    link("Messages", "/messages"),
    link("Notifications", "/notifications"),
    link("Settings", "/settings"),
];

/// Sidebar links for a signed-in user of the given role.
pub fn navigation_menu(role: Role) -> &'static [NavLink] {
    match role {
        Role::Patient => PATIENT_MENU,
        Role::Doctor => DOCTOR_MENU,
    }
}

// ============================================================================
// Tests
// ============================================================================
