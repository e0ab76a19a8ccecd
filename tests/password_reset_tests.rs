use chrono::{Duration, Utc};
use std::sync::Arc;
use userdesk::{
    models::Role,
    repositories::{
        token_repository::ResetTokenRepository, SqliteResetTokenRepository, SqliteUserRepository,
    },
    services::{
        auth_service::{AuthService, LoginRequest},
        password_reset_service::{PasswordResetError, PasswordResetService},
        user_service::{CreateUserRequest, UserService},
    },
    test_utils::test_helpers,
};

struct Fixture {
    user_service: UserService,
    auth_service: AuthService,
    reset_service: PasswordResetService,
    tokens: Arc<SqliteResetTokenRepository>,
}

async fn fixture() -> Fixture {
    let pool = test_helpers::create_test_db().await.unwrap();
    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let tokens = Arc::new(SqliteResetTokenRepository::new(pool));

    let fixture = Fixture {
        user_service: UserService::new(users.clone()),
        auth_service: AuthService::new(users.clone()),
        reset_service: PasswordResetService::new(users, tokens.clone()),
        tokens,
    };

    fixture
        .user_service
        .create_user(CreateUserRequest {
            name: "Guest".to_string(),
            email: "guest@mail.com".to_string(),
            password: "guest".to_string(),
            role: Role::Guest,
        })
        .await
        .unwrap();

    fixture
}

#[tokio::test]
async fn forgot_then_reset_changes_the_password() {
    let f = fixture().await;

    let token = f
        .reset_service
        .forgot_password("guest@mail.com")
        .await
        .unwrap()
        .expect("known email should yield a token");
    assert_eq!(token.len(), 64);

    let user = f
        .reset_service
        .reset_password("guest@mail.com", &token, "brand-new")
        .await
        .unwrap();
    assert!(f.user_service.verify_password("brand-new", &user.password_hash));

    // The new password authenticates, the old one no longer does.
    assert!(f
        .auth_service
        .authenticate(LoginRequest {
            email: "guest@mail.com".to_string(),
            password: "brand-new".to_string(),
        })
        .await
        .is_ok());
    assert!(f
        .auth_service
        .authenticate(LoginRequest {
            email: "guest@mail.com".to_string(),
            password: "guest".to_string(),
        })
        .await
        .is_err());
}

#[tokio::test]
async fn forgot_for_unknown_email_yields_no_token() {
    let f = fixture().await;

    let result = f.reset_service.forgot_password("ghost@mail.com").await.unwrap();
    assert!(result.is_none());
    assert!(f.reset_service.valid_tokens().await.unwrap().is_empty());
}

#[tokio::test]
async fn a_newer_token_supersedes_the_older_one() {
    let f = fixture().await;

    let first = f
        .reset_service
        .forgot_password("guest@mail.com")
        .await
        .unwrap()
        .unwrap();
    let second = f
        .reset_service
        .forgot_password("guest@mail.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(first, second);

    // Only the newest token is live.
    let valid = f.reset_service.valid_tokens().await.unwrap();
    assert_eq!(valid, vec![second.clone()]);

    let stale = f
        .reset_service
        .reset_password("guest@mail.com", &first, "nope")
        .await;
    assert!(matches!(stale, Err(PasswordResetError::InvalidToken)));

    let fresh = f
        .reset_service
        .reset_password("guest@mail.com", &second, "updated")
        .await;
    assert!(fresh.is_ok());
}

#[tokio::test]
async fn a_redeemed_token_cannot_be_reused() {
    let f = fixture().await;

    let token = f
        .reset_service
        .forgot_password("guest@mail.com")
        .await
        .unwrap()
        .unwrap();

    f.reset_service
        .reset_password("guest@mail.com", &token, "first-use")
        .await
        .unwrap();

    let again = f
        .reset_service
        .reset_password("guest@mail.com", &token, "second-use")
        .await;
    assert!(matches!(again, Err(PasswordResetError::InvalidToken)));

    // Redemption expired the token but kept the row as history.
    assert!(f.reset_service.valid_tokens().await.unwrap().is_empty());
}

#[tokio::test]
async fn a_token_for_one_email_does_not_reset_another() {
    let f = fixture().await;

    f.user_service
        .create_user(CreateUserRequest {
            name: "Manager".to_string(),
            email: "manager@mail.com".to_string(),
            password: "manager".to_string(),
            role: Role::Manager,
        })
        .await
        .unwrap();

    let token = f
        .reset_service
        .forgot_password("guest@mail.com")
        .await
        .unwrap()
        .unwrap();

    let result = f
        .reset_service
        .reset_password("manager@mail.com", &token, "hijack")
        .await;
    assert!(matches!(result, Err(PasswordResetError::InvalidToken)));
}

#[tokio::test]
async fn a_token_past_its_expiry_is_rejected() {
    let f = fixture().await;

    // Plant a token that expired an hour ago.
    let now = Utc::now();
    f.tokens
        .issue(
            "guest@mail.com",
            "stale-token",
            now - Duration::hours(1),
            now - Duration::hours(25),
        )
        .await
        .unwrap();

    assert!(f.reset_service.valid_tokens().await.unwrap().is_empty());

    let result = f
        .reset_service
        .reset_password("guest@mail.com", "stale-token", "nope")
        .await;
    assert!(matches!(result, Err(PasswordResetError::InvalidToken)));
}

#[tokio::test]
async fn issue_keeps_at_most_one_valid_token_per_email() {
    let f = fixture().await;

    for _ in 0..4 {
        f.reset_service
            .forgot_password("guest@mail.com")
            .await
            .unwrap()
            .unwrap();
    }

    assert_eq!(f.reset_service.valid_tokens().await.unwrap().len(), 1);
}
