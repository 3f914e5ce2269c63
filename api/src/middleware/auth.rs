//! JWT authentication for protected endpoints
//!
//! [`JwtAuth`] verifies the `Authorization: Bearer` header and stores the
//! caller in the request extensions. [`CookieAuth`] does the same with the
//! `access_token` cookie, lets anonymous callers through and clears a cookie
//! whose token does not name a user.

use actix_web::{
    body::EitherBody,
    cookie::Cookie,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use wu_core::services::auth::{AccessTokenService, CookieIdentity};
use wu_core::CurrentUser;

use crate::errors::ApiError;

/// Cookie holding the access token unless configured otherwise
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    tokens: Arc<AccessTokenService>,
}

impl JwtAuth {
    pub fn new(tokens: Arc<AccessTokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    tokens: Arc<AccessTokenService>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = Arc::clone(&self.tokens);

        Box::pin(async move {
            let user = extract_bearer_token(&req)
                .ok_or(wu_core::AuthError::CouldNotValidate)
                .and_then(|token| tokens.current_user(&token));

            match user {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    let response = ApiError::from(err).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Cookie authentication middleware factory
#[derive(Clone)]
pub struct CookieAuth {
    tokens: Arc<AccessTokenService>,
    cookie_name: Rc<str>,
}

impl CookieAuth {
    pub fn new(tokens: Arc<AccessTokenService>) -> Self {
        Self {
            tokens,
            cookie_name: Rc::from(ACCESS_TOKEN_COOKIE),
        }
    }

    pub fn with_cookie_name(mut self, cookie_name: &str) -> Self {
        self.cookie_name = Rc::from(cookie_name);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for CookieAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CookieAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CookieAuthMiddleware {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
            cookie_name: Rc::clone(&self.cookie_name),
        }))
    }
}

pub struct CookieAuthMiddleware<S> {
    service: Rc<S>,
    tokens: Arc<AccessTokenService>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for CookieAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = Arc::clone(&self.tokens);
        let cookie_name = Rc::clone(&self.cookie_name);

        Box::pin(async move {
            let cookie = req.cookie(&cookie_name);
            let identity = match tokens.current_user_from_cookie(cookie.as_ref().map(|c| c.value())) {
                Ok(identity) => identity,
                Err(err) => {
                    let response = ApiError::from(err).error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let clear_cookie = identity == CookieIdentity::Incomplete;
            req.extensions_mut().insert(MaybeUser(match identity {
                CookieIdentity::Authenticated(user) => Some(user),
                CookieIdentity::Anonymous | CookieIdentity::Incomplete => None,
            }));

            let mut res = service.call(req).await?;
            if clear_cookie {
                res.response_mut()
                    .add_removal_cookie(&Cookie::new(cookie_name.to_string(), ""))?;
            }
            Ok(res.map_into_left_body())
        })
    }
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Extractor for a caller authenticated by [`JwtAuth`]
#[derive(Debug, Clone)]
pub struct Authenticated(pub CurrentUser);

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<CurrentUser>()
            .cloned()
            .map(Authenticated)
            .or_else(|| {
                // Handlers outside JwtAuth still accept a bearer token
                let tokens = req.app_data::<web::Data<AccessTokenService>>()?;
                let token = req
                    .headers()
                    .get(AUTHORIZATION)?
                    .to_str()
                    .ok()?
                    .strip_prefix("Bearer ")?;
                tokens.current_user(token).ok().map(Authenticated)
            })
            .ok_or_else(|| Error::from(ApiError::from(wu_core::AuthError::CouldNotValidate)));

        ready(result)
    }
}

/// Caller resolved by [`CookieAuth`], if any
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req.extensions().get::<MaybeUser>().cloned().unwrap_or_default()))
    }
}
