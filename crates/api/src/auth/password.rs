//! Argon2id password hashing and credential verification.
//!
//! All password hashes use the Argon2id variant with a cryptographically random
//! salt generated via [`OsRng`]. The PHC string format is used for storage so
//! that algorithm parameters and salt are embedded in the hash itself.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use bizhub_db::models::user::User;
use bizhub_db::store::UserDirectory;

use super::error::{storage_call, AuthError, AuthResult};

/// Well-formed Argon2id hash (default parameters) that matches no password.
///
/// Verified against when the identifier is unknown so the miss costs the same
/// as a wrong password.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$\
                          AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default(); // Argon2id with default params
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted Argon2id hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it does not.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Checks an identifier/secret pair against the user directory.
pub struct CredentialVerifier {
    users: Arc<dyn UserDirectory>,
    storage_timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserDirectory>, storage_timeout: Duration) -> Self {
        Self {
            users,
            storage_timeout,
        }
    }

    /// Return the user owning `identifier` if `secret` matches its hash.
    ///
    /// An unknown identifier and a wrong secret both yield
    /// [`AuthError::InvalidCredentials`]. The active flag is only consulted
    /// once the secret has matched, so [`AuthError::AccountDeactivated`] is
    /// never reported to someone who does not know the password.
    pub async fn verify(&self, identifier: &str, secret: &str) -> AuthResult<User> {
        let user = storage_call(
            "find_user_by_identifier",
            self.storage_timeout,
            self.users.find_by_identifier(identifier),
        )
        .await?;

        let Some(user) = user else {
            let _ = verify_password(secret, DUMMY_HASH);
            tracing::debug!("Login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        match verify_password(secret, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = user.id, "Login rejected: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        if !user.is_active {
            tracing::info!(user_id = user.id, "Login rejected: account deactivated");
            return Err(AuthError::AccountDeactivated);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bizhub_db::store::MemoryUserDirectory;

    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");

        // The hash must be a valid PHC string starting with the argon2id identifier.
        assert!(
            hash.starts_with("$argon2id$"),
            "expected argon2id PHC prefix"
        );

        let verified = verify_password(password, &hash).expect("verify should succeed");
        assert!(verified, "correct password should verify as true");
    }

    #[test]
    fn test_wrong_password_fails() {
        let hash = hash_password("real-password").expect("hashing should succeed");
        let verified = verify_password("wrong-password", &hash).expect("verify should succeed");
        assert!(!verified, "wrong password should verify as false");
    }

    #[test]
    fn dummy_hash_parses_and_matches_nothing() {
        let verified = verify_password("", DUMMY_HASH).expect("dummy hash must be well formed");
        assert!(!verified);
    }

    async fn verifier_with_user(active: bool) -> (CredentialVerifier, User) {
        let users = Arc::new(MemoryUserDirectory::new());
        let hash = hash_password("Secret123!").expect("hashing should succeed");
        let user = users.insert("ada@example.com", &hash).await;
        if !active {
            users.set_active(user.id, false).await;
        }
        (CredentialVerifier::new(users, Duration::from_secs(5)), user)
    }

    #[tokio::test]
    async fn accepts_matching_secret() {
        let (verifier, user) = verifier_with_user(true).await;
        let verified = verifier.verify("ada@example.com", "Secret123!").await.unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn unknown_identifier_and_wrong_secret_are_indistinguishable() {
        let (verifier, _) = verifier_with_user(true).await;

        let unknown = verifier.verify("nobody@example.com", "Secret123!").await;
        let wrong = verifier.verify("ada@example.com", "nope").await;

        assert_matches!(unknown, Err(AuthError::InvalidCredentials));
        assert_matches!(wrong, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn deactivated_account_is_reported_only_with_the_right_secret() {
        let (verifier, _) = verifier_with_user(false).await;

        assert_matches!(
            verifier.verify("ada@example.com", "Secret123!").await,
            Err(AuthError::AccountDeactivated)
        );
        assert_matches!(
            verifier.verify("ada@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
    }
}
