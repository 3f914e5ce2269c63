//! Per-request structured logging
//!
//! Each request outside the skip list gets a UUID v4 request id, stored in
//! the request extensions and returned as `X-Request-ID`.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue, USER_AGENT},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::BTreeSet,
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by [`RequestLogging`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Request logging middleware factory
#[derive(Clone)]
pub struct RequestLogging {
    skip_paths: Arc<BTreeSet<String>>,
}

impl RequestLogging {
    pub fn new(skip_paths: BTreeSet<String>) -> Self {
        Self {
            skip_paths: Arc::new(skip_paths),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware {
            service: Rc::new(service),
            skip_paths: Arc::clone(&self.skip_paths),
        }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: Rc<S>,
    skip_paths: Arc<BTreeSet<String>>,
}

/// Request attributes captured before the handler runs
struct RequestLine {
    request_id: Uuid,
    method: String,
    path: String,
    url: String,
    client_host: String,
    user_agent: String,
}

impl RequestLine {
    fn capture(req: &ServiceRequest, request_id: Uuid) -> Self {
        let info = req.connection_info();
        Self {
            request_id,
            method: req.method().to_string(),
            path: req.path().to_string(),
            url: format!("{}://{}{}", info.scheme(), info.host(), req.uri()),
            client_host: info.realip_remote_addr().unwrap_or("unknown").to_string(),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string(),
        }
    }
}

macro_rules! log_request {
    ($level:ident, $line:ident, $status:expr, $duration_ms:expr) => {
        $level!(
            request_id = %$line.request_id,
            method = %$line.method,
            path = %$line.path,
            url = %$line.url,
            client_host = %$line.client_host,
            user_agent = %$line.user_agent,
            status_code = $status,
            duration_ms = $duration_ms,
            "Request processed"
        )
    };
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if self.skip_paths.contains(req.path()) {
            return Box::pin(async move { service.call(req).await });
        }

        let request_id = Uuid::new_v4();
        let line = RequestLine::capture(&req, request_id);
        req.extensions_mut().insert(RequestId(request_id));
        let started = Instant::now();

        Box::pin(async move {
            match service.call(req).await {
                Ok(mut res) => {
                    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                    let status = res.status().as_u16();
                    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }

                    if status >= 500 {
                        log_request!(error, line, status, duration_ms);
                    } else if status >= 400 {
                        log_request!(warn, line, status, duration_ms);
                    } else {
                        log_request!(info, line, status, duration_ms);
                    }
                    Ok(res)
                }
                Err(err) => {
                    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                    error!(
                        request_id = %line.request_id,
                        method = %line.method,
                        path = %line.path,
                        url = %line.url,
                        client_host = %line.client_host,
                        error = %err,
                        duration_ms,
                        "Request failed"
                    );
                    Err(err)
                }
            }
        })
    }
}
