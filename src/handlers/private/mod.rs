// handlers/private/mod.rs - Local-environment provisioning, no auth.
// Only mounted when ENVIRONMENT=local.

pub mod users;

pub use users::create_user;
