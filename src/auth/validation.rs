//! Form rules for credentials.

use super::error::ValidationError;

pub const MIN_LOGIN_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 4;

/// Length checks count characters, not bytes.
pub fn validate_credentials(login: &str, password: &str) -> Result<(), ValidationError> {
    if login.chars().count() < MIN_LOGIN_LEN {
        return Err(ValidationError::LoginTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Credential rules plus the confirmation field of the signup form.
pub fn validate_signup(
    login: &str,
    password: &str,
    password_repeat: &str,
) -> Result<(), ValidationError> {
    validate_credentials(login, password)?;
    if password != password_repeat {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
