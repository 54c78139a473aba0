use crate::config::Config;
use crate::domain::models::auth::{Claims, Principal};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

pub const TOKEN_AUDIENCE: &str = "rsvp-frontend";

/// Issued token plus the CSRF secret bound into its claims.
pub struct AccessToken {
    pub token: String,
    pub csrf_token: String,
}

/// Verifies EdDSA access tokens minted by the identity service. `issue` mints
/// tokens with the same key layout and is used by operators and tests.
pub struct AuthService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
            .expect("Invalid JWT Public Key PEM");

        Self { issuer: config.auth_issuer.clone(), encoding_key, decoding_key }
    }

    pub fn issue(&self, user_id: &str, roles: &[&str], ttl: Duration) -> Result<AccessToken, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            csrf_token: csrf_token.clone(),
        };

        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        Ok(AccessToken { token, csrf_token })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected access token: {}", e);
                AppError::Unauthorized
            })
    }

    pub fn principal(claims: &Claims) -> Principal {
        Principal { user_id: claims.sub.clone(), roles: claims.roles.clone() }
    }
}
