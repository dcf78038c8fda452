pub mod password;
pub mod session;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ConfigError, SecurityConfig};
use crate::database::DatabaseError;

/// Payload carried by every token this service issues
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Failures of the authentication boundary.
///
/// Every token problem collapses into `InvalidCredentials` so nothing about
/// the cause reaches the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    InvalidCredentials,

    #[error("User not found")]
    PrincipalNotFound,

    #[error("Inactive user")]
    InactivePrincipal,

    #[error("The user doesn't have enough privileges")]
    InsufficientPrivilege,

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Only HMAC algorithms are accepted: the codec holds a single shared secret.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Signs and verifies time-bound tokens with one process-wide secret.
///
/// The verifier pins the configured algorithm; the `alg` named in a token
/// header is never trusted.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, ConfigError> {
        if security.secret_key.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        let algorithm = parse_algorithm(&security.algorithm)?;
        Ok(Self::new(security.secret_key.as_bytes(), algorithm))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encode(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        self.encode_at(subject, ttl, Utc::now())
    }

    pub fn encode_at(
        &self,
        subject: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let now = issued_at.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            exp: (issued_at + ttl).timestamp(),
            nbf: Some(now),
            iat: Some(now),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Verify `token` and return its subject
    pub fn decode(&self, token: &str) -> Result<String, AuthError> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        // Signature, algorithm and claim presence are checked by jsonwebtoken;
        // the time window is checked below against `now` with no leeway.
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected token: {:?}", e.kind());
            AuthError::InvalidCredentials
        })?;
        let claims = data.claims;

        let now = now.timestamp();
        if now >= claims.exp {
            tracing::debug!("Rejected token: expired at {}", claims.exp);
            return Err(AuthError::InvalidCredentials);
        }
        if claims.nbf.is_some_and(|nbf| now < nbf) {
            tracing::debug!("Rejected token: not valid before {:?}", claims.nbf);
            return Err(AuthError::InvalidCredentials);
        }
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(claims.sub)
    }
}

/// Bearer token for a logged-in user; the subject is the user id.
pub fn create_access_token(
    codec: &TokenCodec,
    user_id: Uuid,
    security: &SecurityConfig,
) -> Result<String, AuthError> {
    codec.encode(
        &user_id.to_string(),
        Duration::minutes(security.access_token_expire_minutes),
    )
}

/// Password-reset token; the subject is the account email.
pub fn generate_password_reset_token(
    codec: &TokenCodec,
    email: &str,
    security: &SecurityConfig,
) -> Result<String, AuthError> {
    codec.encode(email, Duration::hours(security.email_reset_token_expire_hours))
}

pub fn verify_password_reset_token(codec: &TokenCodec, token: &str) -> Option<String> {
    codec.decode(token).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret-key-for-jwt", Algorithm::HS256)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn round_trip_within_window() {
        let codec = codec();
        let issued = at(1_700_000_000);
        let token = codec.encode_at("alice", Duration::seconds(60), issued).unwrap();

        assert_eq!(codec.decode_at(&token, issued).unwrap(), "alice");
        assert_eq!(codec.decode_at(&token, at(1_700_000_059)).unwrap(), "alice");
    }

    #[test]
    fn expires_at_issue_time_plus_ttl() {
        let codec = codec();
        let issued = at(1_700_000_000);
        let token = codec.encode_at("alice", Duration::seconds(60), issued).unwrap();

        assert!(matches!(
            codec.decode_at(&token, at(1_700_000_060)),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            codec.decode_at(&token, at(1_700_100_000)),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn rejects_token_before_not_before() {
        let codec = codec();
        let token = codec
            .encode_at("alice", Duration::seconds(60), at(1_700_000_000))
            .unwrap();

        assert!(matches!(
            codec.decode_at(&token, at(1_699_999_999)),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn rejects_wrong_secret_and_tampering() {
        let token = codec().encode("alice", Duration::minutes(5)).unwrap();

        let other = TokenCodec::new(b"different-secret", Algorithm::HS256);
        assert!(matches!(other.decode(&token), Err(AuthError::InvalidCredentials)));

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(codec().decode(&tampered), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let codec = codec();
        for token in ["", "invalid.token.here", "a.b", "not-a-jwt"] {
            assert!(matches!(codec.decode(token), Err(AuthError::InvalidCredentials)));
        }
    }

    #[test]
    fn pins_the_configured_algorithm() {
        // Same secret, different HMAC variant in the header
        let hs384 = TokenCodec::new(b"test-secret-key-for-jwt", Algorithm::HS384);
        let token = hs384.encode("alice", Duration::minutes(5)).unwrap();

        assert!(matches!(codec().decode(&token), Err(AuthError::InvalidCredentials)));
        assert_eq!(hs384.decode(&token).unwrap(), "alice");
    }

    #[test]
    fn rejects_payload_without_subject() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }

        let claims = NoSubject {
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-for-jwt"),
        )
        .unwrap();

        assert!(matches!(codec().decode(&token), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn password_reset_token_round_trip() {
        let config = AppConfig::local();
        let codec = TokenCodec::from_config(&config.security).unwrap();

        let token =
            generate_password_reset_token(&codec, "user@example.com", &config.security).unwrap();
        assert_eq!(
            verify_password_reset_token(&codec, &token).as_deref(),
            Some("user@example.com")
        );
        assert_eq!(verify_password_reset_token(&codec, "garbage"), None);
    }

    #[test]
    fn access_token_subject_is_user_id() {
        let config = AppConfig::local();
        let codec = TokenCodec::from_config(&config.security).unwrap();
        let user_id = Uuid::new_v4();

        let token = create_access_token(&codec, user_id, &config.security).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), user_id.to_string());
    }

    #[test]
    fn parses_only_hmac_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("hs512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }
}
