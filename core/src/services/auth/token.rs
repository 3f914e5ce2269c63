//! Access token issuing and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use wu_shared::config::{JwtConfig, SecretKey};

use crate::domain::CurrentUser;
use crate::errors::AuthError;

/// Claims stored in an access token
///
/// `sub` and `id` are optional on the wire: a token signed without them is
/// well formed but does not identify a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
}

impl AccessClaims {
    fn into_user(self) -> Option<CurrentUser> {
        Some(CurrentUser {
            username: self.sub?,
            id: self.id?,
            user_role: self.role,
        })
    }
}

/// Outcome of reading the access token cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieIdentity {
    /// No cookie was sent
    Anonymous,
    Authenticated(CurrentUser),
    /// Validly signed but without `sub` or `id`; the cookie should be cleared
    Incomplete,
}

/// Issues and validates symmetric-key access tokens
pub struct AccessTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    default_expiry: Duration,
}

impl AccessTokenService {
    /// Creates a token service
    ///
    /// # Arguments
    ///
    /// * `secret` - Signing secret
    /// * `config` - Algorithm and default token lifetime
    ///
    /// # Returns
    ///
    /// The service, or `UnsupportedAlgorithm` for anything but the HMAC family
    pub fn new(secret: &SecretKey, config: &JwtConfig) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| AuthError::UnsupportedAlgorithm(config.algorithm.clone()))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::UnsupportedAlgorithm(config.algorithm.clone()));
        }

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose().as_bytes()),
            algorithm,
            validation,
            default_expiry: Duration::minutes(config.access_token_minutes),
        })
    }

    /// Sign an access token for a user
    ///
    /// # Arguments
    ///
    /// * `username` - Stored as `sub`
    /// * `user_id` - Stored as `id`
    /// * `role` - Stored as `role`
    /// * `expires_in` - Lifetime, the configured default when `None`
    pub fn create_access_token(
        &self,
        username: &str,
        user_id: i64,
        role: &str,
        expires_in: Option<Duration>,
    ) -> Result<String, AuthError> {
        let expire = Utc::now() + expires_in.unwrap_or(self.default_expiry);
        let claims = AccessClaims {
            sub: Some(username.to_owned()),
            id: Some(user_id),
            role: Some(role.to_owned()),
            exp: expire.timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims with the service key
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(AuthError::TokenGeneration)
    }

    /// Decode and verify a token
    pub fn decode_claims(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "Access token rejected");
                AuthError::CouldNotValidate
            })
    }

    /// Resolve the user of a bearer token
    ///
    /// Fails with [`AuthError::CouldNotValidate`] when the token is invalid,
    /// expired, or lacks `sub` or `id`.
    pub fn current_user(&self, token: &str) -> Result<CurrentUser, AuthError> {
        self.decode_claims(token)?
            .into_user()
            .ok_or(AuthError::CouldNotValidate)
    }

    /// Resolve the user of the access token cookie, if one was sent
    pub fn current_user_from_cookie(
        &self,
        cookie: Option<&str>,
    ) -> Result<CookieIdentity, AuthError> {
        let Some(token) = cookie else {
            return Ok(CookieIdentity::Anonymous);
        };
        Ok(self
            .decode_claims(token)?
            .into_user()
            .map_or(CookieIdentity::Incomplete, CookieIdentity::Authenticated))
    }
}
