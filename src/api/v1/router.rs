use super::context::HeaderRequestContext;
use super::error::*;
use super::handler;
use crate::application_impl::PermissionGate;
use crate::application_port::{AuthService, Requirement};
use crate::domain_model::LoginId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let is_login = warp::get()
        .and(warp::path("is_login"))
        .and(warp::path::end())
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::is_login);

    let session = warp::get()
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(authenticated(server.auth_service.clone()))
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::session);

    login.or(logout).or(is_login).or(session)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Resolves and refreshes the request's session, rejecting with
/// `Unauthorized` when there is none.
pub fn authenticated(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (LoginId,), Error = warp::Rejection> + Clone {
    warp::header::headers_cloned().and_then(move |headers: HeaderMap| {
        let auth_service = auth_service.clone();
        async move {
            let ctx = HeaderRequestContext::new(headers);
            auth_service
                .authenticate(&ctx)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}

/// [`authenticated`] followed by a permission check, rejecting with
/// `NoPermission` when `requirement` is not met.
pub fn authorized(
    auth_service: Arc<dyn AuthService>,
    gate: Arc<PermissionGate>,
    requirement: Requirement,
) -> impl Filter<Extract = (LoginId,), Error = warp::Rejection> + Clone {
    let requirement = Arc::new(requirement);
    authenticated(auth_service).and_then(move |login_id: LoginId| {
        let gate = gate.clone();
        let requirement = requirement.clone();
        async move {
            gate.check(&login_id, &requirement)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)?;
            Ok::<LoginId, warp::Rejection>(login_id)
        }
    })
}
