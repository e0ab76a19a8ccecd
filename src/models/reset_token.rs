use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A password-reset token issued for an email address. The token references
/// its owner by email rather than user id. `expires_at` is an RFC 3339 UTC
/// string; a token is valid while `expires_at` lies strictly in the future.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: i64,
    pub email: String,
    pub token: String,
    pub expires_at: String,
    pub created_at: Option<String>,
}

impl PasswordResetToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > format_timestamp(now)
    }
}

/// Canonical timestamp encoding for token expiries: RFC 3339, UTC, fixed
/// millisecond precision, `Z` suffix. Every write and comparison goes
/// through this so the TEXT ordering in SQLite matches chronological order.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn timestamp_text_ordering_matches_time_ordering() {
        let now = Utc::now();
        let earlier = format_timestamp(now - Duration::seconds(1));
        let later = format_timestamp(now + Duration::seconds(1));
        assert!(earlier < later);
        assert!(format_timestamp(now) < later);
    }

    #[test]
    fn validity_is_strict() {
        let now = Utc::now();
        let token = PasswordResetToken {
            id: 1,
            email: "a@mail.com".to_string(),
            token: "t".to_string(),
            expires_at: format_timestamp(now),
            created_at: None,
        };
        // Expiry equal to "now" means already expired.
        assert!(!token.is_valid_at(now));

        let live = PasswordResetToken {
            expires_at: format_timestamp(now + Duration::hours(1)),
            ..token
        };
        assert!(live.is_valid_at(now));
    }
}
