use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the resulting `User` in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    auth: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = auth.map_err(|rejection| {
        if rejection.is_missing() {
            AppError::Auth("Missing authorization header".to_string())
        } else {
            AppError::Auth("Invalid authorization header format".to_string())
        }
    })?;
    let token = auth.token();

    let user = validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;
    debug!("Authenticated {} as {:?}", user.id, user.user_role());

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn require_role(user: &User, allowed: &[UserRole]) -> Result<(), AppError> {
    if allowed.contains(&user.user_role()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {:?} may not perform this operation",
            user.user_role()
        )))
    }
}

/// Providers may only manage their own calendar; admins may manage any.
pub fn require_provider_access(user: &User, provider_id: Uuid) -> Result<(), AppError> {
    require_role(user, &[UserRole::Provider, UserRole::Admin])?;

    if user.acts_for(&provider_id.to_string()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to manage this provider".to_string()))
    }
}
