use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::models::UserRole;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // User ID
    pub role: UserRole,
    pub exp: usize,        // Expiration time
    pub iat: usize,        // Issued at
}

/// Identity carried by the session. `role` reflects the moment the token was
/// minted and is not authoritative for privileged actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: UserRole,
}

impl Caller {
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        let id = claims.sub.parse::<i64>().ok().filter(|id| *id > 0)?;
        Some(Self { id, role: claims.role })
    }
}

/// Resolve the caller from a bearer token, `None` when absent or invalid.
pub fn resolve_caller(header: Option<&str>, secret: &str) -> Option<Caller> {
    let token = header?.strip_prefix("Bearer ")?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| tracing::debug!(error = %e, "Rejected session token"))
    .ok()?
    .claims;

    Caller::from_claims(&claims)
}

/// Extractor for the optional caller identity.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Caller>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        Ok(MaybeCaller(resolve_caller(header, &state.jwt_secret)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, role: UserRole, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn valid_bearer_token_resolves_caller() {
        let header = format!("Bearer {}", token("42", UserRole::Admin, 3600));
        let caller = resolve_caller(Some(&header), SECRET).unwrap();
        assert_eq!(caller, Caller { id: 42, role: UserRole::Admin });
    }

    #[test]
    fn missing_or_bad_tokens_resolve_to_none() {
        assert_eq!(resolve_caller(None, SECRET), None);
        assert_eq!(resolve_caller(Some("Basic abc"), SECRET), None);

        let expired = format!("Bearer {}", token("42", UserRole::User, -3600));
        assert_eq!(resolve_caller(Some(&expired), SECRET), None);

        let forged = format!("Bearer {}", token("42", UserRole::User, 3600));
        assert_eq!(resolve_caller(Some(&forged), "other-secret"), None);

        let non_numeric = format!("Bearer {}", token("abc", UserRole::User, 3600));
        assert_eq!(resolve_caller(Some(&non_numeric), SECRET), None);
    }
}
