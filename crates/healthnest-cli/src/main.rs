//! HealthNest CLI - sign in to the patient and doctor portal from a terminal.
//!
//! The session is persisted between invocations, so `healthnest login`
//! followed by `healthnest visit /medical-records` behaves like navigating
//! the web portal after signing in.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use healthnest_core::auth::{LoginForm, RegisterForm};
use healthnest_core::navigation::RecordingNavigator;
use healthnest_core::notify::{LogNotifier, Notification, NotificationKind, Notifier};
use healthnest_core::routes::{navigation_menu, resolve};
use healthnest_core::{Config, GuardDecision, Role, SessionManager, SessionState};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// Log file name inside the data directory's `logs` folder
const LOG_FILE: &str = "healthnest.log";

const USAGE: &str = "\
Usage: healthnest <command>

Commands:
  status [--json]                 Show the current session
  login [email]                   Sign in (password from HEALTHNEST_PASSWORD or prompt)
  register <name> <email> <role>  Create a patient or doctor account and sign in
  logout                          Sign out
  visit <path>                    Check whether a page may be opened
  menu                            List the pages in your navigation menu
";

/// Prints notifications the way the portal shows toasts, and logs them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let mark = match n.kind {
            NotificationKind::Success => "✓",
            NotificationKind::Failure => "✗",
        };
        eprintln!("{} {}: {}", mark, n.title, n.message);
        LogNotifier.notify(n);
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`), and to a
/// daily rolling file when a log directory is available.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let _log_guard = init_tracing(config.data_dir().ok().map(|d| d.join("logs")));
    info!(storage = ?config.storage, "HealthNest CLI starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("status");

    let navigator = Arc::new(RecordingNavigator::default());
    let mut session = config.session_manager(navigator.clone(), Arc::new(ConsoleNotifier))?;
    session.restore();

    match command {
        "status" => print_status(&session, args.iter().any(|a| a == "--json"))?,
        "login" => {
            login(&mut session, &mut config, args.get(1).cloned()).await?;
            report_navigation(&navigator);
        }
        "register" => {
            let (name, email, role) = match (args.get(1), args.get(2), args.get(3)) {
                (Some(name), Some(email), Some(role)) => (name, email, role.parse::<Role>()?),
                _ => bail!("register needs <name> <email> <role>\n\n{}", USAGE),
            };
            register(&mut session, &mut config, name, email, role).await?;
            report_navigation(&navigator);
        }
        "logout" => {
            session.logout();
            report_navigation(&navigator);
        }
        "visit" => match args.get(1) {
            Some(path) => visit(&session, path),
            None => bail!("visit needs a <path>\n\n{}", USAGE),
        },
        "menu" => print_menu(&session),
        "help" | "--help" | "-h" => print!("{}", USAGE),
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }

    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn login(
    session: &mut SessionManager,
    config: &mut Config,
    email: Option<String>,
) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = match std::env::var("HEALTHNEST_PASSWORD") {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    let form = LoginForm { email, password };
    form.validate()?;

    let identity = session.login(&form.email, &form.password).await?;
    remember_email(config, &identity.email);
    Ok(())
}

async fn register(
    session: &mut SessionManager,
    config: &mut Config,
    name: &str,
    email: &str,
    role: Role,
) -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;
    let confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let form = RegisterForm {
        name: name.to_string(),
        email: email.to_string(),
        password,
        confirm_password,
        role,
    };
    form.validate()?;

    let identity = session
        .register(&form.name, &form.email, &form.password, form.role)
        .await?;
    remember_email(config, &identity.email);
    Ok(())
}

fn print_status(session: &SessionManager, json: bool) -> Result<()> {
    let state = session.state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.identity())?);
        return Ok(());
    }
    match state {
        SessionState::Authenticated(identity) => println!(
            "Signed in as {} <{}> ({}, id {})",
            identity.name, identity.email, identity.role, identity.id
        ),
        SessionState::Unauthenticated => println!("Not signed in"),
        SessionState::Loading => println!("Session is loading"),
    }
    Ok(())
}

fn visit(session: &SessionManager, path: &str) {
    let route = resolve(path);
    match session.check(path) {
        GuardDecision::Allow => println!("{} ({}): allowed", path, route.page.title()),
        GuardDecision::Defer => println!("{}: session still loading, try again", path),
        decision => {
            let target = decision.redirect_path().unwrap_or("/");
            println!("{} ({}): redirected to {}", path, route.page.title(), target);
        }
    }
}

fn print_menu(session: &SessionManager) {
    match session.state().role() {
        Some(role) => {
            for link in navigation_menu(role) {
                println!("{:<18} {}", link.label, link.path);
            }
        }
        None => println!("Sign in to see your menu"),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Save the signed-in email so the next `login` can skip asking for it.
fn remember_email(config: &mut Config, email: &str) {
    config.last_email = Some(email.to_string());
    let result = Config::load_file().and_then(|mut stored| {
        stored.last_email = Some(email.to_string());
        stored.save()
    });
    if let Err(e) = result {
        warn!(error = %e, "Failed to save config");
    }
}

fn report_navigation(navigator: &RecordingNavigator) {
    if let Some(path) = navigator.current() {
        println!("→ {}", path);
    }
}
