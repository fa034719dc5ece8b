//! The admin password, as typed by the bookkeeper and as stored.

use std::fmt::Display;

use bcrypt::{hash, verify};
use sha2::{Digest, Sha512};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// Words an attacker would try first against this app.
const APP_WORDS: [&str; 4] = ["ledgerbook", "ledger", "admin", "password"];

/// A password strong enough to protect the ledgers, not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's advice when the password scores
    /// below three out of four.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &APP_WORDS);

        if matches!(analysis.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let advice = analysis
            .feedback()
            .map(Feedback::to_string)
            .unwrap_or_default();

        Err(Error::TooWeak(advice))
    }

    #[cfg(test)]
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash of the admin password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// bcrypt's recommended cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with a fresh salt.
    ///
    /// Tests pass a low `cost` (e.g. 4) to keep hashing fast.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash that was read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check a password typed at log-in against this hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCredentials] if the password does not match,
    /// or [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<(), Error> {
        match verify(raw_password, &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidCredentials),
            Err(error) => Err(Error::HashingError(error.to_string())),
        }
    }

    /// The SHA-512 digest of the hash as a hex string.
    ///
    /// Session tokens carry this value, so storing a new password hash ends
    /// every existing session.
    pub fn fingerprint(&self) -> String {
        Sha512::digest(self.0.as_bytes())
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
