pub mod user_handlers;

pub use user_handlers::{
    create_user_handler, delete_user_handler, edit_user_page, list_users, new_user_page,
    update_user_handler,
};
