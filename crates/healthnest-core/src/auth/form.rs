//! Client-side checks run before a form reaches the session manager.

use super::error::AuthError;
use crate::models::Role;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        require("Full name", &self.name)?;
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}
