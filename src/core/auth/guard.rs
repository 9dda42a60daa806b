//! Request authentication helpers used by every protected handler

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use crate::core::auth::jwt::{Claims, JwtService, UserRole};
use crate::core::response::ApiError;

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    Ok(token)
}

/// Validate the bearer token and return its claims
pub fn authenticate(jwt: &JwtService, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers)?;
    Ok(jwt.validate_token(token)?)
}

/// Validate the token and check that its role is one of `roles`
pub fn require_role(
    jwt: &JwtService,
    headers: &HeaderMap,
    roles: &[UserRole],
) -> Result<Claims, ApiError> {
    let claims = authenticate(jwt, headers)?;

    if !roles.contains(&claims.user_role) {
        tracing::debug!("Role {} rejected, expected one of {:?}", claims.user_role, roles);
        return Err(ApiError::unauthorized("Unauthorized access"));
    }

    Ok(claims)
}

/// Database id of the token's user; the env superadmin has none
pub fn user_id(claims: &Claims) -> Result<Uuid, ApiError> {
    claims
        .user_id()
        .map_err(|_| ApiError::unauthorized("Unauthorized access"))
}

/// Require a student token and return the student's id
pub fn require_student(jwt: &JwtService, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let claims = require_role(jwt, headers, &[UserRole::Student])?;
    user_id(&claims)
}

/// Require a lecturer token and return the lecturer's id
pub fn require_lecturer(jwt: &JwtService, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let claims = require_role(jwt, headers, &[UserRole::Lecture])?;
    user_id(&claims)
}

/// Require the superadmin role
pub fn require_superadmin(jwt: &JwtService, headers: &HeaderMap) -> Result<Claims, ApiError> {
    require_role(jwt, headers, &[UserRole::Superadmin])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::{JwtConfig, SUPERADMIN_SUBJECT};
    use axum::http::{HeaderValue, StatusCode};

    fn service() -> JwtService {
        JwtService::new(JwtConfig::new("guard_test_secret"))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    // ========================================================================
    // Bearer Extraction Tests
    // ========================================================================

    #[test]
    fn test_extract_bearer_token_valid() {
        let headers = bearer("my_token_123");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "my_token_123");
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "No token provided");
    }

    #[test]
    fn test_extract_bearer_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic base64credentials"),
        );

        let err = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_extract_bearer_token_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));

        let err = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    // ========================================================================
    // Role Gate Tests
    // ========================================================================

    #[test]
    fn test_require_role_accepts_listed_role() {
        let jwt = service();
        let id = Uuid::new_v4();
        let token = jwt
            .generate_user_token(id, "lecturer@example.com", UserRole::Lecture)
            .unwrap();

        let claims =
            require_role(&jwt, &bearer(&token), &[UserRole::Lecture, UserRole::Superadmin])
                .unwrap();
        assert!(claims.is_lecturer());
        assert_eq!(require_lecturer(&jwt, &bearer(&token)).unwrap(), id);
    }

    #[test]
    fn test_require_role_rejects_other_role() {
        let jwt = service();
        let token = jwt
            .generate_user_token(Uuid::new_v4(), "student@example.com", UserRole::Student)
            .unwrap();

        let err = require_superadmin(&jwt, &bearer(&token)).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Unauthorized access");
    }

    #[test]
    fn test_authenticate_rejects_bad_signature() {
        let other = JwtService::new(JwtConfig::new("different_secret"));
        let token = other
            .generate_user_token(Uuid::new_v4(), "a@example.com", UserRole::Student)
            .unwrap();

        let err = authenticate(&service(), &bearer(&token)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_superadmin_has_no_user_id() {
        let jwt = service();
        let (token, _) = jwt
            .generate_token(SUPERADMIN_SUBJECT, "admin", UserRole::Superadmin)
            .unwrap();

        let claims = require_superadmin(&jwt, &bearer(&token)).unwrap();
        assert!(user_id(&claims).is_err());
    }
}
