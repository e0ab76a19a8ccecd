use std::sync::Arc;
use userdesk::{
    models::Role,
    repositories::SqliteUserRepository,
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        user_service::{CreateUserRequest, UserService},
    },
    test_utils::test_helpers,
};

async fn services() -> (UserService, AuthService) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    (
        UserService::new(repository.clone()),
        AuthService::new(repository),
    )
}

#[tokio::test]
async fn valid_credentials_return_the_user() {
    let (user_service, auth_service) = services().await;

    let created = user_service
        .create_user(CreateUserRequest {
            name: "Administrator".to_string(),
            email: "admin@mail.com".to_string(),
            password: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();

    let user = auth_service
        .authenticate(LoginRequest {
            email: "admin@mail.com".to_string(),
            password: "admin".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, created.id);
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let (user_service, auth_service) = services().await;

    user_service
        .create_user(CreateUserRequest {
            name: "Administrator".to_string(),
            email: "admin@mail.com".to_string(),
            password: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();

    let wrong_password = auth_service
        .authenticate(LoginRequest {
            email: "admin@mail.com".to_string(),
            password: "xxx".to_string(),
        })
        .await
        .unwrap_err();

    let unknown_email = auth_service
        .authenticate(LoginRequest {
            email: "nobody@mail.com".to_string(),
            password: "admin".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthServiceError::InvalidCredentials));
    assert!(matches!(unknown_email, AuthServiceError::InvalidCredentials));
    assert_eq!(
        std::mem::discriminant(&wrong_password),
        std::mem::discriminant(&unknown_email),
    );
}

#[tokio::test]
async fn works_against_a_file_backed_database() {
    let (pool, _guard) = test_helpers::create_test_db_file().await.unwrap();

    let id = test_helpers::insert_test_user(
        &pool,
        "Manager",
        "manager@mail.com",
        "manager",
        Role::Manager,
    )
    .await
    .unwrap();

    let auth_service = AuthService::new(Arc::new(SqliteUserRepository::new(pool)));

    let user = auth_service
        .authenticate(LoginRequest {
            email: "manager@mail.com".to_string(),
            password: "manager".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, id);
    assert_eq!(user.role, Role::Manager);
}
