use std::sync::Arc;
use userdesk::{
    models::Role,
    repositories::SqliteUserRepository,
    services::user_service::{CreateUserRequest, UpdateUserRequest, UserService, UserServiceError},
    test_utils::test_helpers,
};

async fn service() -> UserService {
    let pool = test_helpers::create_test_db().await.unwrap();
    UserService::new(Arc::new(SqliteUserRepository::new(pool)))
}

fn create_request(name: &str, email: &str, password: &str, role: Role) -> CreateUserRequest {
    CreateUserRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    }
}

#[tokio::test]
async fn create_user_persists_and_hashes() {
    let service = service().await;

    let user = service
        .create_user(create_request(
            "Administrator",
            "admin@mail.com",
            "admin",
            Role::Admin,
        ))
        .await
        .unwrap();

    assert!(user.id > 0);
    assert_eq!(user.name, "Administrator");
    assert_eq!(user.email, "admin@mail.com");
    assert_eq!(user.role, Role::Admin);
    assert_ne!(user.password_hash, "admin");
    assert!(service.verify_password("admin", &user.password_hash));
}

#[tokio::test]
async fn adding_same_email_twice_is_a_conflict() {
    let service = service().await;

    service
        .create_user(create_request("Guest", "guest@mail.com", "guest", Role::Guest))
        .await
        .unwrap();

    let result = service
        .create_user(create_request("Other", "guest@mail.com", "other", Role::Guest))
        .await;

    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
}

#[tokio::test]
async fn update_keeping_own_email_succeeds() {
    let service = service().await;

    let user = service
        .create_user(create_request("Administrator", "admin@mail.com", "admin", Role::Admin))
        .await
        .unwrap();

    let updated = service
        .update_user(UpdateUserRequest {
            id: user.id,
            name: "Site Administrator".to_string(),
            email: "admin@mail.com".to_string(),
            password: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();

    assert_eq!(updated.id, user.id);
    assert_eq!(updated.name, "Site Administrator");
    assert_eq!(updated.email, "admin@mail.com");
}

#[tokio::test]
async fn update_to_anothers_email_is_a_conflict() {
    let service = service().await;

    service
        .create_user(create_request("Administrator", "admin@mail.com", "admin", Role::Admin))
        .await
        .unwrap();
    let guest = service
        .create_user(create_request("Guest", "guest@mail.com", "guest", Role::Guest))
        .await
        .unwrap();

    let result = service
        .update_user(UpdateUserRequest {
            id: guest.id,
            name: "Guest".to_string(),
            email: "admin@mail.com".to_string(),
            password: "guest".to_string(),
            role: Role::Guest,
        })
        .await;

    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let service = service().await;

    let result = service
        .update_user(UpdateUserRequest {
            id: 999,
            name: "Nobody".to_string(),
            email: "nobody@mail.com".to_string(),
            password: "secret".to_string(),
            role: Role::Guest,
        })
        .await;

    assert!(matches!(result, Err(UserServiceError::UserNotFound)));
}

#[tokio::test]
async fn update_rehashes_password_every_time() {
    let service = service().await;

    let user = service
        .create_user(create_request("Guest", "guest@mail.com", "guest", Role::Guest))
        .await
        .unwrap();

    // Same plaintext resent; a fresh salt means a fresh hash.
    let updated = service
        .update_user(UpdateUserRequest {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password: "guest".to_string(),
            role: user.role,
        })
        .await
        .unwrap();

    assert_ne!(updated.password_hash, user.password_hash);
    assert!(service.verify_password("guest", &updated.password_hash));
}

#[tokio::test]
async fn delete_returns_true_then_false() {
    let service = service().await;

    let user = service
        .create_user(create_request("Guest", "guest@mail.com", "guest", Role::Guest))
        .await
        .unwrap();

    assert!(service.delete_user(user.id).await.unwrap());
    assert!(service.get_user(user.id).await.unwrap().is_none());

    // Deleting an unknown id reports false, not an error.
    assert!(!service.delete_user(user.id).await.unwrap());
}
