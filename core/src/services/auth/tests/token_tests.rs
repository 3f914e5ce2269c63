//! Unit tests for access token issuing and decoding

use chrono::{Duration, Utc};

use wu_shared::config::{JwtConfig, SecretKey};

use crate::errors::AuthError;
use crate::services::auth::{AccessClaims, AccessTokenService, CookieIdentity};

fn service() -> AccessTokenService {
    AccessTokenService::new(&SecretKey::new("test_secret_key"), &JwtConfig::default()).unwrap()
}

#[test]
fn test_token_round_trips_current_user() {
    let service = service();
    let token = service.create_access_token("alice", 42, "admin", None).unwrap();

    let user = service.current_user(&token).unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.id, 42);
    assert!(user.has_role("admin"));
}

#[test]
fn test_default_expiry_is_sixty_minutes() {
    let service = service();
    let before = Utc::now();
    let token = service.create_access_token("alice", 1, "user", None).unwrap();

    let claims = service.decode_claims(&token).unwrap();
    let expected = (before + Duration::minutes(60)).timestamp();

    assert!((claims.exp - expected).abs() <= 2);
}

#[test]
fn test_expired_token_is_rejected() {
    let service = service();
    let token = service
        .create_access_token("alice", 1, "user", Some(Duration::minutes(-5)))
        .unwrap();

    let err = service.current_user(&token).unwrap_err();
    assert!(matches!(err, AuthError::CouldNotValidate));
    assert_eq!(err.to_string(), "Could not validate user.");
}

#[test]
fn test_foreign_signature_is_rejected() {
    let other = AccessTokenService::new(&SecretKey::new("another_key"), &JwtConfig::default())
        .unwrap();
    let token = other.create_access_token("mallory", 7, "admin", None).unwrap();

    assert!(matches!(
        service().current_user(&token),
        Err(AuthError::CouldNotValidate)
    ));
}

#[test]
fn test_missing_identity_claims_are_rejected() {
    let service = service();
    let token = service
        .sign(&AccessClaims {
            sub: None,
            id: Some(3),
            role: None,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        })
        .unwrap();

    assert!(matches!(
        service.current_user(&token),
        Err(AuthError::CouldNotValidate)
    ));
}

#[test]
fn test_cookie_variants() {
    let service = service();
    let token = service.create_access_token("bob", 5, "user", None).unwrap();
    let anonymous_token = service
        .sign(&AccessClaims {
            sub: Some("bob".into()),
            id: None,
            role: None,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        })
        .unwrap();

    assert_eq!(
        service.current_user_from_cookie(None).unwrap(),
        CookieIdentity::Anonymous
    );
    assert!(matches!(
        service.current_user_from_cookie(Some(&token)).unwrap(),
        CookieIdentity::Authenticated(user) if user.username == "bob"
    ));
    assert_eq!(
        service.current_user_from_cookie(Some(&anonymous_token)).unwrap(),
        CookieIdentity::Incomplete
    );
    assert!(service.current_user_from_cookie(Some("garbage")).is_err());
}

#[test]
fn test_asymmetric_algorithm_is_unsupported() {
    let config = JwtConfig {
        algorithm: "RS256".into(),
        ..JwtConfig::default()
    };

    let result = AccessTokenService::new(&SecretKey::new("k"), &config);
    assert!(matches!(result, Err(AuthError::UnsupportedAlgorithm(alg)) if alg == "RS256"));
}
