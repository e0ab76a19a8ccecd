use crate::models::User;
use crate::repositories::token_repository::ResetTokenRepository;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

/// How long a freshly issued reset token stays redeemable.
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum PasswordResetError {
    /// Covers every rejection shape: unknown email, unknown token, expired
    /// token, token/email mismatch. Collapsed on purpose so responses cannot
    /// be used to probe which accounts exist.
    #[error("Invalid or expired reset token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// Issues and redeems single-use password-reset tokens.
///
/// Token lifecycle: Issued(expiry = now + 24h) -> Expired, where expiry is
/// triggered by time, by a newer issuance for the same email, or by a
/// successful redemption. There is no way back to Issued, and no record of
/// which trigger fired.
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn ResetTokenRepository>,
}

impl PasswordResetService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn ResetTokenRepository>) -> Self {
        Self { users, tokens }
    }

    fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
        hex::encode(bytes)
    }

    /// Issues a fresh token for the email, superseding any still-valid ones
    /// in the same transaction. Returns `None` when no account matches;
    /// callers must respond identically in both cases.
    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<Option<String>, PasswordResetError> {
        if self.users.find_by_email(email).await?.is_none() {
            return Ok(None);
        }

        let token = Self::generate_token();
        let now = Utc::now();
        self.tokens
            .issue(email, &token, now + Duration::hours(TOKEN_TTL_HOURS), now)
            .await?;

        tracing::info!(email, "issued password reset token");
        Ok(Some(token))
    }

    /// Redeems a token: requires a user with the email and a matching,
    /// non-expired token record. On success the token is expired (single
    /// use), the new password is hashed and stored, and the updated user is
    /// returned.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<User, PasswordResetError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(PasswordResetError::InvalidToken)?;

        let now = Utc::now();
        let record = self
            .tokens
            .find_valid(email, token, now)
            .await?
            .ok_or(PasswordResetError::InvalidToken)?;

        self.tokens.expire(record.id, now).await?;

        let password_hash = self.hash_password(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!(email, "password reset redeemed");
        Ok(User {
            password_hash,
            ..user
        })
    }

    /// Values of every non-expired token. Exposes raw secrets; wired to the
    /// ops CLI and tests only, never to a web route.
    pub async fn valid_tokens(&self) -> Result<Vec<String>, PasswordResetError> {
        Ok(self.tokens.list_valid(Utc::now()).await?)
    }

    fn hash_password(&self, password: &str) -> Result<String, PasswordResetError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordResetError::HashingError(e.to_string()))
    }
}
