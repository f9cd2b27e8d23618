//! Session token generation.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use std::fmt;

use super::error::AuthError;

const SESSION_TOKEN_BYTES: usize = 32;

/// Opaque bearer value handed to the client in the session cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// 32 bytes from the OS CSPRNG, URL-safe base64 without padding so the value
/// can go into a cookie unquoted.
pub(crate) fn generate_session_token() -> Result<SessionToken, AuthError> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Crypto(format!("failed to generate session token: {err}")))?;
    Ok(SessionToken(Base64UrlUnpadded::encode_string(&bytes)))
}
