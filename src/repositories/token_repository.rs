use crate::models::{format_timestamp, PasswordResetToken};
use crate::repositories::user_repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const TOKEN_COLUMNS: &str = "id, email, token, expires_at, created_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ResetTokenRepository: Send + Sync {
    /// Expires every currently-valid token for the email and inserts the
    /// replacement. Both effects are committed as one atomic unit so the
    /// at-most-one-valid-token-per-email invariant cannot be observed broken.
    async fn issue(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<PasswordResetToken>;

    /// A token record for the email matching `token` with expiry strictly
    /// after `now`, if one exists.
    async fn find_valid(
        &self,
        email: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<PasswordResetToken>>;

    /// Marks a single token expired as of `now`. Rows are never deleted;
    /// expired tokens remain as issuance history.
    async fn expire(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<()>;

    /// Raw values of all non-expired tokens. Diagnostic use only.
    async fn list_valid(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<String>>;
}

pub struct SqliteResetTokenRepository {
    pool: SqlitePool,
}

impl SqliteResetTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for SqliteResetTokenRepository {
    async fn issue(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<PasswordResetToken> {
        let now_str = format_timestamp(now);
        let expires_str = format_timestamp(expires_at);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE password_reset_tokens SET expires_at = ? WHERE email = ? AND expires_at > ?",
        )
        .bind(&now_str)
        .bind(email)
        .bind(&now_str)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "INSERT INTO password_reset_tokens (email, token, expires_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(token)
        .bind(&expires_str)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        let sql = format!("SELECT {TOKEN_COLUMNS} FROM password_reset_tokens WHERE id = ?");
        let record = sqlx::query_as::<_, PasswordResetToken>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn find_valid(
        &self,
        email: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<PasswordResetToken>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM password_reset_tokens \
             WHERE email = ? AND token = ? AND expires_at > ?"
        );
        let record = sqlx::query_as::<_, PasswordResetToken>(&sql)
            .bind(email)
            .bind(token)
            .bind(format_timestamp(now))
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn expire(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE password_reset_tokens SET expires_at = ? WHERE id = ?")
            .bind(format_timestamp(now))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<String>> {
        let tokens =
            sqlx::query_scalar("SELECT token FROM password_reset_tokens WHERE expires_at > ?")
                .bind(format_timestamp(now))
                .fetch_all(&self.pool)
                .await?;
        Ok(tokens)
    }
}
