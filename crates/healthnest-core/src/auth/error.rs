use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown address and wrong secret are deliberately the same error.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    AddressInUse,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Failed to hash secret: {0}")]
    Hashing(String),
}

/// Raised by the credential store when an address is registered twice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("An account already exists for {0}")]
    DuplicateAddress(String),

    #[error("Failed to hash secret: {0}")]
    Hashing(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateAddress(_) => AuthError::AddressInUse,
            StoreError::Hashing(msg) => AuthError::Hashing(msg),
        }
    }
}

/// The persisted session record could not be parsed.
#[derive(Error, Debug)]
#[error("Malformed session record: {0}")]
pub struct MalformedSessionRecord(#[from] pub serde_json::Error);

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The stored bytes are not text, so the record can never be parsed.
    #[error("Stored value is not valid UTF-8: {0}")]
    Undecodable(String),
}

impl StorageError {
    pub fn is_undecodable(&self) -> bool {
        matches!(self, StorageError::Undecodable(_))
    }
}
