//! Request identity extractors
//!
//! Handlers that need an identity take one of these as an argument; the
//! extractor owns the Bearer-token parsing and role checks so route code
//! never touches headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use surrealdb::RecordId;

use crate::core::ServerState;
use crate::utils::AppError;

use super::jwt::{ADMIN_ROLES, Claims, ROLE_DRIVER};

/// Authenticated driver identity
#[derive(Debug, Clone)]
pub struct CurrentDriver {
    /// Driver's user record id
    pub id: RecordId,
    pub claims: Claims,
}

/// Authenticated admin identity (admin or support role)
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: RecordId,
    pub claims: Claims,
}

/// Customer identity for the dispute endpoints
///
/// 与原始来源一致：客户身份由上游网关验证后以 `x-customer-phone`
/// 头传入。电话号码同时是订单的所有权键。
#[derive(Debug, Clone)]
pub struct CustomerPhone(pub String);

/// Pull `Bearer <token>` out of the Authorization header
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() => Ok(token),
        _ => Err(AppError::Unauthorized),
    }
}

/// Verify the token and parse the subject as a user record id
fn verify_user(state: &ServerState, parts: &Parts) -> Result<(RecordId, Claims), AppError> {
    let token = bearer_token(parts)?;
    let claims = state.jwt_service.verify(token)?;

    let id: RecordId = claims
        .sub
        .parse()
        .map_err(|_| AppError::InvalidToken)?;
    if id.table() != "user" {
        return Err(AppError::InvalidToken);
    }
    Ok((id, claims))
}

impl FromRequestParts<ServerState> for CurrentDriver {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let (id, claims) = verify_user(state, parts)?;
        if claims.role != ROLE_DRIVER {
            return Err(AppError::forbidden("Not a driver token"));
        }
        Ok(CurrentDriver { id, claims })
    }
}

impl FromRequestParts<ServerState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let (id, claims) = verify_user(state, parts)?;
        if !ADMIN_ROLES.contains(&claims.role.as_str()) {
            return Err(AppError::forbidden("Not an admin token"));
        }
        Ok(CurrentAdmin { id, claims })
    }
}

impl FromRequestParts<ServerState> for CustomerPhone {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let phone = parts
            .headers
            .get("x-customer-phone")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;
        Ok(CustomerPhone(phone))
    }
}
