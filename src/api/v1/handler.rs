use super::context::HeaderRequestContext;
use super::error::*;
use crate::application_port::AuthService;
use crate::domain_model::{LoginId, SessionSubject};
use crate::domain_port::RequestContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_id: LoginId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token_name: String,
    pub token: String,
}

/// Issues a session for an already verified identity. Credentials are the
/// caller's business; put this route behind whatever checks them.
pub async fn login(
    body: LoginRequest,
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ctx = HeaderRequestContext::new(headers);
    let token = auth_service
        .login(body.login_id, &ctx)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let login_response = LoginResponse {
        token_name: auth_service.token_name().to_string(),
        token,
    };
    let mut response = warp::reply::json(&ApiResponse::ok(login_response)).into_response();
    ctx.apply_cookies(response.headers_mut());
    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub removed: bool,
}

pub async fn logout(
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ctx = HeaderRequestContext::new(headers);
    let removed = auth_service
        .logout(&ctx)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse {
        removed,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsLoginResponse {
    pub is_login: bool,
}

pub async fn is_login(
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ctx = HeaderRequestContext::new(headers);
    let is_login = auth_service.is_login(&ctx).await;

    Ok(warp::reply::json(&ApiResponse::ok(IsLoginResponse {
        is_login,
    })))
}

pub async fn session(
    _login_id: LoginId,
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ctx = HeaderRequestContext::new(headers);
    let token = ctx
        .current_token(auth_service.token_name())
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;
    let subject: SessionSubject = auth_service
        .get_subject(&token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;

    Ok(warp::reply::json(&ApiResponse::ok(subject)))
}
