use tracing::{info, warn};

use crate::auth::password::{hash_password_with_params, Argon2Params, PasswordError};
use crate::config::BootstrapConfig;
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Store};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Create the configured first superuser if no account with that email
/// exists yet. An existing account is left untouched.
pub async fn ensure_first_superuser(
    store: &dyn Store,
    config: &BootstrapConfig,
    params: Argon2Params,
) -> Result<Option<User>, BootstrapError> {
    let (Some(email), Some(password)) = (
        config.first_superuser.as_deref(),
        config.first_superuser_password.as_deref(),
    ) else {
        if config.first_superuser.is_some() {
            warn!("FIRST_SUPERUSER is set without FIRST_SUPERUSER_PASSWORD; skipping bootstrap");
        }
        return Ok(None);
    };

    if store.get_user_by_email(email).await?.is_some() {
        return Ok(None);
    }

    // Argon2 is CPU-bound; keep it off the async workers
    let password = password.to_string();
    let hashed_password =
        tokio::task::spawn_blocking(move || hash_password_with_params(&password, params)).await??;

    let user = store
        .create_user(NewUser {
            email: email.to_string(),
            hashed_password,
            full_name: None,
            is_active: true,
            is_superuser: true,
        })
        .await?;

    info!("Created first superuser {}", user.email);
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::database::MemoryStore;

    const FAST: Argon2Params = Argon2Params {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    };

    fn bootstrap(email: Option<&str>, password: Option<&str>) -> BootstrapConfig {
        BootstrapConfig {
            first_superuser: email.map(str::to_string),
            first_superuser_password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn creates_superuser_once() {
        let store = MemoryStore::new();
        let config = bootstrap(Some("admin@example.com"), Some("adminpass"));

        let created = ensure_first_superuser(&store, &config, FAST).await.unwrap().unwrap();
        assert!(created.is_superuser && created.is_active);
        assert!(verify_password("adminpass", &created.hashed_password));

        assert!(ensure_first_superuser(&store, &config, FAST).await.unwrap().is_none());
        let (_, count) = store.list_users(Default::default()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn skipped_without_credentials() {
        let store = MemoryStore::new();
        for config in [
            bootstrap(None, None),
            bootstrap(Some("admin@example.com"), None),
        ] {
            assert!(ensure_first_superuser(&store, &config, FAST).await.unwrap().is_none());
        }
        let (_, count) = store.list_users(Default::default()).await.unwrap();
        assert_eq!(count, 0);
    }
}
