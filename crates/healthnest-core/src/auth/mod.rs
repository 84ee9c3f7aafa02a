//! Authentication: accounts, the session state machine and its storage.
//!
//! This module provides:
//! - `CredentialStore`: in-memory accounts with Argon2-hashed secrets
//! - `SessionManager`: sign-in, sign-up and sign-out over a `SessionState`
//! - `SessionStorage`: where the signed-in identity is persisted
//!   (file, OS keychain, or memory)
//! - `LoginForm` / `RegisterForm`: checks run before a form is submitted
//!
//! The session record is the signed-in `Identity` as JSON. It never
//! contains the secret.

pub mod credentials;
pub mod error;
pub mod form;
pub mod session;
pub mod storage;

pub use credentials::{Account, Credential, CredentialStore, DEMO_SECRET};
pub use error::{AuthError, MalformedSessionRecord, StorageError, StoreError};
pub use form::{LoginForm, RegisterForm};
pub use session::{parse_session_record, SessionManager, SessionState, LANDING_PATH, SESSION_KEY};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, SessionStorage, StorageBackend};
