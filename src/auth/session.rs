//! Bearer token to user resolution.
//!
//! The user record is re-read on every request, so deactivation or
//! deletion takes effect on the next call carrying an old token.

use uuid::Uuid;

use super::{AuthError, TokenCodec};
use crate::database::models::User;
use crate::database::Store;

/// Resolve a bearer token to an active user.
///
/// Checks run in a fixed order: token validity, then existence of the
/// subject, then the active flag.
pub async fn resolve_session(
    codec: &TokenCodec,
    store: &dyn Store,
    token: &str,
) -> Result<User, AuthError> {
    let subject = codec.decode(token)?;

    // A token we signed whose subject is not a user id names nobody
    let user_id = Uuid::parse_str(&subject).map_err(|_| AuthError::PrincipalNotFound)?;

    let user = store
        .get_user(user_id)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    if !user.is_active {
        tracing::debug!("Session rejected for inactive user {}", user.id);
        return Err(AuthError::InactivePrincipal);
    }

    Ok(user)
}

pub fn require_superuser(user: &User) -> Result<(), AuthError> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(AuthError::InsufficientPrivilege)
    }
}
