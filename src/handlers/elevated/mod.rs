// handlers/elevated/mod.rs - Superuser-only handlers
//
// Mounted behind `require_session` and `require_superuser_middleware`.

pub mod users;

pub use users::{delete_user, read_users};
