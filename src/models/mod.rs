pub mod paging;
pub mod reset_token;
pub mod user;

pub use paging::{Paged, SortDirection, SortKey, SortOrder};
pub use reset_token::{format_timestamp, PasswordResetToken};
pub use user::{ParseRoleError, Role, User};
