pub mod token_repository;
pub mod user_repository;

pub use token_repository::{ResetTokenRepository, SqliteResetTokenRepository};
pub use user_repository::{
    RepositoryError, RepositoryResult, SqliteUserRepository, UserRepository,
};
