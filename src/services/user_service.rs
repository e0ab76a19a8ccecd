use crate::models::{Paged, Role, SortOrder, User};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub struct UpdateUserRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Account CRUD with the email-uniqueness invariant. The repository's unique
/// index is the authority: conflicts surface as constraint violations and are
/// mapped to `EmailTaken` here, so two concurrent creates cannot both win.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        let password_hash = self.hash_password(&request.password)?;

        match self
            .repository
            .insert(&request.name, &request.email, &password_hash, request.role)
            .await
        {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Overwrites name, email, role and password. The password is re-hashed
    /// unconditionally: callers resend it on every update, changed or not.
    pub async fn update_user(&self, request: UpdateUserRequest) -> Result<User, UserServiceError> {
        let existing = self
            .repository
            .find_by_id(request.id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        let updated = User {
            id: existing.id,
            name: request.name,
            email: request.email,
            password_hash: self.hash_password(&request.password)?,
            role: request.role,
            created_at: existing.created_at,
        };

        match self.repository.update(&updated).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Returns Ok(false) rather than an error when the id is unknown.
    pub async fn delete_user(&self, id: i64) -> Result<bool, UserServiceError> {
        match self.repository.delete(id).await {
            Ok(()) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    /// One page of users. Unrecognized (order_by, direction) pairs fall back
    /// to id ascending. Slice bounds are clamped: size <= 0 yields an empty
    /// page, page <= 1 yields the first page; total_rows is always the full
    /// unfiltered count.
    pub async fn get_users(
        &self,
        page: i64,
        size: i64,
        order_by: &str,
        direction: &str,
    ) -> Result<Paged<User>, UserServiceError> {
        let order = SortOrder::parse(order_by, direction);
        let limit = size.max(0);
        let offset = ((page - 1) * size).max(0);

        let (data, total_rows) = self.repository.list_page(order, offset, limit).await?;

        Ok(Paged {
            data,
            total_rows,
            current_page: page,
            page_size: size,
            order_by: order.key,
            direction: order.direction,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }
}
