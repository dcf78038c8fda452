pub mod auth;
pub mod superuser;

pub use auth::{extract_bearer, require_session};
pub use superuser::require_superuser_middleware;
