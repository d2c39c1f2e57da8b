// Credential form validation (sign in, sign up, password reset)

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::{Result, WardrobeError};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
    /// Only present on sign up.
    pub confirm_password: Option<String>,
}

impl CredentialsForm {
    pub fn sign_in(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: None,
        }
    }

    pub fn sign_up(email: &str, password: &str, confirm_password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: Some(confirm_password.to_string()),
        }
    }
}

fn invalid(msg: &str) -> WardrobeError {
    WardrobeError::Validation(msg.to_string())
}

fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(invalid("Please enter your email"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(invalid("Please enter a valid email address"));
    }
    Ok(())
}

pub fn validate_sign_in(form: &CredentialsForm) -> Result<()> {
    validate_email(&form.email)?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 6 characters long"));
    }
    Ok(())
}

pub fn validate_sign_up(form: &CredentialsForm) -> Result<()> {
    validate_sign_in(form)?;
    if form.confirm_password.as_deref() != Some(form.password.as_str()) {
        return Err(invalid("Passwords do not match"));
    }
    Ok(())
}

pub fn validate_reset_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(invalid("Please enter your email address first"));
    }
    validate_email(email)
}
