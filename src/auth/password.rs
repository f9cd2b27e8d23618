//! Salted one-way password hashing (Argon2id, PHC string output).
//!
//! Cost parameters are configurable. Verification reads the parameters back
//! out of the stored PHC string, so raising the cost does not invalidate
//! hashes written under an older setting.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use super::error::AuthError;

/// Defaults to the argon2 crate's recommended costs.
#[derive(Clone, Debug, Default)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher from explicit Argon2 costs.
    ///
    /// # Errors
    /// Returns [`AuthError::Crypto`] if the costs are outside Argon2's bounds.
    pub fn from_costs(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| AuthError::Crypto(format!("invalid argon2 params: {err}")))?;
        Ok(Self { params })
    }

    /// The cheapest settings Argon2 accepts. Only fit for tests.
    ///
    /// # Errors
    /// Never in practice; the bounds are the crate's own minimums.
    pub fn minimal() -> Result<Self, AuthError> {
        Self::from_costs(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `raw` under a fresh random salt.
    ///
    /// # Errors
    /// Returns [`AuthError::Crypto`] if hashing fails.
    pub fn hash(&self, raw: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Crypto(format!("failed to hash password: {err}")))
    }

    /// Check `raw` against a stored PHC string in constant time.
    ///
    /// # Errors
    /// Returns [`AuthError::Crypto`] if the stored hash cannot be parsed.
    pub fn verify(&self, raw: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|err| AuthError::Crypto(format!("malformed password hash: {err}")))?;
        match self.argon2().verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::Crypto(format!(
                "failed to verify password: {err}"
            ))),
        }
    }
}
