use crate::models::Role;
use crate::services::user_service::{CreateUserRequest, UserService, UserServiceError};

/// Number of generated guest accounts added alongside the canonical three.
const DEMO_GUESTS: usize = 25;

/// Seeds the canonical admin/manager/guest accounts plus a batch of demo
/// guests. Duplicate emails are logged and skipped so reseeding an existing
/// database is harmless.
pub async fn seed(service: &UserService) -> Result<(), UserServiceError> {
    let canonical = [
        ("Administrator", "admin@mail.com", "admin", Role::Admin),
        ("Manager", "manager@mail.com", "manager", Role::Manager),
        ("Guest", "guest@mail.com", "guest", Role::Guest),
    ];

    for (name, email, password, role) in canonical {
        add_user(service, name, email, password, role).await?;
    }

    for i in 1..=DEMO_GUESTS {
        let name = format!("Demo User {i}");
        let email = format!("demo{i}@mail.com");
        add_user(service, &name, &email, "password", Role::Guest).await?;
    }

    Ok(())
}

async fn add_user(
    service: &UserService,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<(), UserServiceError> {
    match service
        .create_user(CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        })
        .await
    {
        Ok(user) => {
            tracing::info!(email = %user.email, role = %user.role, "seeded user");
            Ok(())
        }
        Err(UserServiceError::EmailTaken) => {
            tracing::warn!(email, "seed skipped, email already registered");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
