use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Request headers the API reads
const ALLOWED_HEADERS: [&str; 2] = ["Authorization", "Content-Type"];

/// CORS-safelisted request headers
const SAFELISTED_HEADERS: [&str; 4] = ["Accept", "Accept-Language", "Content-Language", "Content-Type"];

/// Origin allow-list plus the response header rules applied to every API route
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    /// Headers for a response to `request`, given the methods its route accepts
    pub fn response_headers(
        &self,
        request: &HeaderMap,
        allow_methods: &HeaderValue,
    ) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::VARY, HeaderValue::from_static("Authorization, Content-Type, Origin")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ];

        let Some(origin) = request.get(header::ORIGIN) else {
            return headers;
        };
        let allowed = origin
            .to_str()
            .map(|o| self.is_allowed_origin(o))
            .unwrap_or(false);
        if !allowed {
            return headers;
        }

        headers.push((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone()));
        headers.push((
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ));

        if request.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD) {
            headers.push((header::ACCESS_CONTROL_ALLOW_METHODS, allow_methods.clone()));
        }

        if let Some(requested) = request.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            let granted = granted_headers(requested.to_str().unwrap_or_default());
            if !granted.is_empty() {
                if let Ok(value) = HeaderValue::from_str(&granted.join(", ")) {
                    headers.push((header::ACCESS_CONTROL_ALLOW_HEADERS, value));
                }
            }
        }

        headers
    }
}

/// Requested header names that are allowed and not safelisted, in request order.
///
/// Safelisted names are subtracted from the allowed set before intersecting,
/// so `Content-Type` is never echoed even when requested.
///
/// Header names are case-insensitive (RFC 9110), so names are compared ignoring
/// case and the list is split on bare commas with optional whitespace.
fn granted_headers(requested: &str) -> Vec<&'static str> {
    let grantable: Vec<&'static str> = ALLOWED_HEADERS
        .iter()
        .copied()
        .filter(|name| !SAFELISTED_HEADERS.iter().any(|safe| safe.eq_ignore_ascii_case(name)))
        .collect();

    let mut granted = Vec::new();
    for name in requested.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if let Some(canonical) = grantable.iter().find(|g| g.eq_ignore_ascii_case(name)) {
            if !granted.contains(canonical) {
                granted.push(*canonical);
            }
        }
    }
    granted
}

/// Per-route state for [`header_policy`]
#[derive(Clone)]
pub struct RouteHeaders {
    policy: Arc<CorsPolicy>,
    allow_methods: HeaderValue,
}

impl RouteHeaders {
    pub fn new(policy: Arc<CorsPolicy>, methods: &[Method]) -> Self {
        let listed = methods
            .iter()
            .map(Method::as_str)
            .chain(std::iter::once(Method::OPTIONS.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            policy,
            allow_methods: HeaderValue::from_str(&listed)
                .unwrap_or_else(|_| HeaderValue::from_static("OPTIONS")),
        }
    }
}

/// Applies the response header policy; answers OPTIONS itself without running the handler
pub async fn header_policy(State(route): State<RouteHeaders>, request: Request, next: Next) -> Response {
    let headers = route
        .policy
        .response_headers(request.headers(), &route.allow_methods);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let target = response.headers_mut();
    for (name, value) in headers {
        target.insert(name, value);
    }
    response
}
