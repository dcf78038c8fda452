use anyhow::{bail, Context};
use serde_json::json;

use crate::auth::{generate_password_reset_token, TokenCodec};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::manager::connect;
use crate::database::{PgStore, Store};

/// Stands in for reset emails: an operator hands the token to the user
pub async fn handle(
    config: AppConfig,
    email: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let store = PgStore::new(connect(&config.database).await?);
    if store.get_user_by_email(&email).await?.is_none() {
        bail!("No user with email {}", email);
    }

    let codec = TokenCodec::from_config(&config.security)?;
    let token = generate_password_reset_token(&codec, &email, &config.security)
        .context("failed to sign reset token")?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "email": email,
                "token": token,
                "expires_in_hours": config.security.email_reset_token_expire_hours,
            })
        ),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
