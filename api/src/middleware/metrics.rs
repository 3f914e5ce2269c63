//! Prometheus request metrics

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::{
    collections::BTreeSet,
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Request counters, latency histogram and in-flight gauge
pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    in_progress: Option<IntGaugeVec>,
}

impl HttpMetrics {
    /// Create and register the metrics with `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: Registry, track_in_progress: bool) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let in_progress = if track_in_progress {
            let gauge = IntGaugeVec::new(
                Opts::new("http_requests_in_progress", "HTTP requests in progress"),
                &["method", "endpoint"],
            )?;
            registry.register(Box::new(gauge.clone()))?;
            Some(gauge)
        } else {
            None
        };

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            in_progress,
        })
    }

    /// Registry in the text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn started(&self, method: &str, endpoint: &str) {
        if let Some(gauge) = &self.in_progress {
            gauge.with_label_values(&[method, endpoint]).inc();
        }
    }

    fn finished(&self, method: &str, endpoint: &str, status: u16, seconds: f64) {
        if let Some(gauge) = &self.in_progress {
            gauge.with_label_values(&[method, endpoint]).dec();
        }
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, endpoint])
            .observe(seconds);
    }
}

/// Metrics middleware factory
#[derive(Clone)]
pub struct Metrics {
    metrics: Arc<HttpMetrics>,
    skip_paths: Arc<BTreeSet<String>>,
}

impl Metrics {
    pub fn new(metrics: Arc<HttpMetrics>, skip_paths: BTreeSet<String>) -> Self {
        Self {
            metrics,
            skip_paths: Arc::new(skip_paths),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Metrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddleware {
            service: Rc::new(service),
            metrics: Arc::clone(&self.metrics),
            skip_paths: Arc::clone(&self.skip_paths),
        }))
    }
}

pub struct MetricsMiddleware<S> {
    service: Rc<S>,
    metrics: Arc<HttpMetrics>,
    skip_paths: Arc<BTreeSet<String>>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddleware<S>
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

        let metrics = Arc::clone(&self.metrics);
        let method = req.method().to_string();
        let endpoint = req.path().to_string();
        metrics.started(&method, &endpoint);
        let started = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let status = match &result {
                Ok(res) => res.status().as_u16(),
                Err(_) => 500,
            };
            metrics.finished(&method, &endpoint, status, started.elapsed().as_secs_f64());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_after_request() {
        let metrics = HttpMetrics::new(Registry::new(), true).unwrap();

        metrics.started("GET", "/api/v1/me");
        metrics.finished("GET", "/api/v1/me", 200, 0.02);

        let text = metrics.render().unwrap();
        let requests = text
            .lines()
            .find(|line| line.starts_with("http_requests_total{"))
            .unwrap();
        assert!(requests.contains(r#"status="200""#));
        assert!(requests.contains(r#"endpoint="/api/v1/me""#));
        assert!(requests.ends_with(" 1"));
        assert!(text.contains("http_request_duration_seconds_bucket"));
        let in_progress = text
            .lines()
            .find(|line| line.starts_with("http_requests_in_progress{"))
            .unwrap();
        assert!(in_progress.ends_with(" 0"));
    }

    #[test]
    fn test_in_progress_gauge_is_optional() {
        let metrics = HttpMetrics::new(Registry::new(), false).unwrap();
        metrics.finished("POST", "/items", 201, 0.1);

        assert!(!metrics.render().unwrap().contains("http_requests_in_progress"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        let _first = HttpMetrics::new(registry.clone(), false).unwrap();

        assert!(HttpMetrics::new(registry, false).is_err());
    }
}
