//! Authentication module for SmartLMS
//!
//! This module provides authentication functionality including:
//! - JWT token generation and validation
//! - Student and lecturer registration, login and verification
//! - Bearer token and role guards used by every protected handler
//! - REST API endpoints for auth operations

pub mod api;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use guard::{
    authenticate, extract_bearer_token, require_lecturer, require_role, require_student,
    require_superadmin, user_id,
};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, SUPERADMIN_SUBJECT, UserRole};
pub use password::{PasswordError, hash_password, verify_password};
pub use service::{AuthService, AuthUser, LoginRequest, LoginResponse};
