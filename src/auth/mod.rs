//! Session authentication: credential checks, password hashing, and session
//! issuance on top of a [`CredentialStore`](crate::store::CredentialStore).

mod error;
mod password;
mod service;
mod token;
mod validation;

pub use error::{AuthError, ValidationError};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::SessionToken;
pub use validation::{validate_credentials, validate_signup, MIN_LOGIN_LEN, MIN_PASSWORD_LEN};
