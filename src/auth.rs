use actix_web::dev::Payload;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Claims, LoginRequest, RegisterRequest, User};
use crate::repository;
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, password_hash)?)
}

pub fn issue_token(user_id: i64, secret: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Validates signature and expiry, returning the user id carried in `sub`.
pub fn verify_token(token: &str, secret: &str) -> Result<i64> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    decoded
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
}

fn validate_registration(req: &RegisterRequest) -> Result<()> {
    let valid_email = match req.email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid_email {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if req.password.trim().is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    Ok(())
}

pub async fn register(pool: &SqlitePool, config: &Config, req: &RegisterRequest) -> Result<(String, User)> {
    validate_registration(req)?;

    if repository::find_user_by_email(pool, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if repository::find_user_by_username(pool, &req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = hash_password(&req.password, config.bcrypt_cost)?;
    let user = repository::insert_user(pool, &req.email, &req.username, &password_hash).await?;
    let token = issue_token(user.id, &config.jwt_secret, Duration::hours(config.token_ttl_hours))?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok((token, user))
}

pub async fn login(pool: &SqlitePool, config: &Config, req: &LoginRequest) -> Result<(String, User)> {
    let user = repository::find_user_by_email(pool, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(user.id, &config.jwt_secret, Duration::hours(config.token_ttl_hours))?;
    Ok((token, user))
}

/// Token from an `Authorization` value. The scheme name is
/// case-insensitive.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_owned)
}

/// The user behind the request's bearer token. Extraction fails with 401 if
/// the token is missing, invalid, expired, or names a user that is gone.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Missing or malformed Authorization header".to_string())
            })?;
            let user_id = verify_token(&token, &state.config.jwt_secret)?;

            repository::find_user_by_id(&state.db_pool, user_id)
                .await?
                .map(AuthenticatedUser)
                .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trip_returns_subject() {
        let token = issue_token(42, SECRET, Duration::hours(1)).unwrap();
        assert_eq!(verify_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = issue_token(7, SECRET, Duration::hours(1)).unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized(_))));

        let expired = issue_token(7, SECRET, Duration::hours(-2)).unwrap();
        assert!(matches!(verify_token(&expired, SECRET), Err(AppError::Unauthorized(_))));

        assert!(matches!(verify_token("not-a-jwt", SECRET), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("BEARER  abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearerabc"), None);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn registration_input_is_validated() {
        let mut req = RegisterRequest {
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            password: "pw".to_string(),
        };
        assert!(validate_registration(&req).is_ok());

        req.email = "no-at-sign".to_string();
        assert!(matches!(validate_registration(&req), Err(AppError::Validation(_))));

        req.email = "user@example.com".to_string();
        req.username = "  ".to_string();
        assert!(matches!(validate_registration(&req), Err(AppError::Validation(_))));
    }
}
