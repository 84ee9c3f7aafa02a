use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{Rng, RngCore};
use tracing::debug;

use super::error::{AuthError, StoreError};
use crate::models::{Identity, Role};

/// Avatar service used for generated profile pictures
const AVATAR_BASE_URL: &str = "https://i.pravatar.cc/150?img=";

/// Number of distinct avatars the service hands out
const AVATAR_COUNT: u32 = 70;

/// Secret shared by the built-in demo accounts
pub const DEMO_SECRET: &str = "password123";

/// Accounts every fresh store starts with: (id, name, email, role, avatar image)
const DEMO_ACCOUNTS: [(&str, &str, &str, Role, u32); 2] = [
    ("p1", "John Doe", "patient@example.com", Role::Patient, 12),
    ("d1", "Dr. Sarah Smith", "doctor@example.com", Role::Doctor, 28),
];

/// Private half of an account: the login key and the hashed secret.
pub struct Credential {
    identity_id: String,
    email: String,
    secret_hash: String,
}

impl Credential {
    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity_id", &self.identity_id)
            .field("email", &self.email)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub struct Account {
    credential: Credential,
    identity: Identity,
}

impl Account {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// In-memory, append-only table of accounts.
pub struct CredentialStore {
    accounts: Vec<Account>,
    hasher: Argon2<'static>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Empty store hashing secrets with the given Argon2 cost.
    pub fn new(params: Params) -> Self {
        Self {
            accounts: Vec::new(),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Store seeded with the demo patient and doctor.
    pub fn with_demo_accounts(params: Params) -> Result<Self, StoreError> {
        let mut store = Self::new(params);
        for (id, name, email, role, avatar) in DEMO_ACCOUNTS {
            let identity = Identity {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role,
                avatar: Some(format!("{}{}", AVATAR_BASE_URL, avatar)),
            };
            store.insert(identity, DEMO_SECRET)?;
        }
        Ok(store)
    }

    /// Exact, case-sensitive lookup by contact address.
    pub fn find_by_address(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.credential.email == email)
    }

    pub fn exists(&self, email: &str) -> bool {
        self.find_by_address(email).is_some()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Register a new account and return its public identity.
    ///
    /// Ids are the role's initial followed by the account's ordinal position,
    /// so the first patient registered after the demo accounts is `p3`.
    pub fn create(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
        role: Role,
    ) -> Result<Identity, StoreError> {
        if self.exists(email) {
            return Err(StoreError::DuplicateAddress(email.to_string()));
        }

        let avatar = rand::thread_rng().gen_range(0..AVATAR_COUNT);
        let identity = Identity {
            id: format!("{}{}", role.id_prefix(), self.accounts.len() + 1),
            name: name.to_string(),
            email: email.to_string(),
            role,
            avatar: Some(format!("{}{}", AVATAR_BASE_URL, avatar)),
        };

        self.insert(identity.clone(), secret)?;
        debug!(id = %identity.id, role = %identity.role, "Account created");
        Ok(identity)
    }

    /// Check an address/secret pair.
    ///
    /// Unknown addresses and wrong secrets both yield `InvalidCredentials`.
    pub fn authenticate(&self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        match self.find_by_address(email) {
            Some(account) if self.verify(&account.credential, secret) => {
                Ok(account.identity.clone())
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn insert(&mut self, identity: Identity, secret: &str) -> Result<(), StoreError> {
        if self.exists(&identity.email) {
            return Err(StoreError::DuplicateAddress(identity.email));
        }
        let credential = Credential {
            identity_id: identity.id.clone(),
            email: identity.email.clone(),
            secret_hash: self.hash(secret)?,
        };
        self.accounts.push(Account {
            credential,
            identity,
        });
        Ok(())
    }

    fn hash(&self, secret: &str) -> Result<String, StoreError> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        let hash = self
            .hasher
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, credential: &Credential, secret: &str) -> bool {
        match PasswordHash::new(&credential.secret_hash) {
            Ok(parsed) => self
                .hasher
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
