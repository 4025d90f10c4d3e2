use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use super::error::ApiError;
use super::AppState;

const ADMIN_REALM: &str = "Basic realm=\"footballfeed admin\", charset=\"UTF-8\"";

#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub webhook_secret: String,
    pub admin_password: String,
}

fn secret_eq(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ")
}

/// Password part of a `Basic` authorization header; the user name is ignored.
fn basic_password(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = raw.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (_, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

impl Credentials {
    pub fn accepts_token(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| secret_eq(token, &self.webhook_secret))
    }

    pub fn accepts_admin(&self, headers: &HeaderMap) -> bool {
        basic_password(headers).is_some_and(|password| secret_eq(&password, &self.admin_password))
    }
}

/// Guards automation and API routes. `GET` requests pass through so the
/// endpoint descriptions stay public.
pub(crate) async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        return next.run(request).await;
    }
    let headers = request.headers();
    if state.credentials.accepts_token(headers) || state.credentials.accepts_admin(headers) {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}

/// Whether a browser sent this request from another site. Uses
/// `Sec-Fetch-Site` when present, otherwise compares the `Origin` host with
/// `Host`. Requests carrying neither header are not from a browser form.
fn cross_site(headers: &HeaderMap) -> bool {
    if let Some(site) = headers.get("sec-fetch-site") {
        return !matches!(site.to_str(), Ok("same-origin" | "none"));
    }
    let Some(origin) = headers.get(header::ORIGIN) else {
        return false;
    };
    let origin_host = origin
        .to_str()
        .ok()
        .and_then(|o| o.split_once("://"))
        .map(|(_, host)| host);
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    match (origin_host, host) {
        (Some(origin_host), Some(host)) => !origin_host.eq_ignore_ascii_case(host),
        _ => true,
    }
}

/// Guards the HTML dashboard with HTTP Basic auth so browsers prompt for the
/// admin password. Form posts from other sites are refused even with cached
/// credentials.
pub(crate) async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.credentials.accepts_admin(request.headers()) {
        let safe = matches!(*request.method(), Method::GET | Method::HEAD);
        if !safe && cross_site(request.headers()) {
            log::warn!("refused cross-site {} {}", request.method(), request.uri());
            return (StatusCode::FORBIDDEN, "Cross-site request refused").into_response();
        }
        return next.run(request).await;
    }
    let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(ADMIN_REALM));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            webhook_secret: "s3cret".to_string(),
            admin_password: "hunter2".to_string(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_must_match_exactly() {
        let c = credentials();
        assert!(c.accepts_token(&headers("Bearer s3cret")));
        assert!(!c.accepts_token(&headers("Bearer s3cre")));
        assert!(!c.accepts_token(&headers("s3cret")));
        assert!(!c.accepts_token(&HeaderMap::new()));
    }

    #[test]
    fn basic_checks_password_only() {
        let c = credentials();
        let encoded = STANDARD.encode("anyone:hunter2");
        assert!(c.accepts_admin(&headers(&format!("Basic {encoded}"))));
        let wrong = STANDARD.encode("admin:s3cret");
        assert!(!c.accepts_admin(&headers(&format!("Basic {wrong}"))));
        assert!(!c.accepts_admin(&headers("Basic !!!")));
    }

    fn with(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn cross_site_detection() {
        assert!(!cross_site(&HeaderMap::new()));
        assert!(!cross_site(&with(&[("sec-fetch-site", "same-origin")])));
        assert!(cross_site(&with(&[("sec-fetch-site", "cross-site")])));
        assert!(cross_site(&with(&[("sec-fetch-site", "same-site")])));
        assert!(!cross_site(&with(&[
            ("origin", "http://localhost:3000"),
            ("host", "localhost:3000"),
        ])));
        assert!(cross_site(&with(&[
            ("origin", "https://evil.test"),
            ("host", "localhost:3000"),
        ])));
        assert!(cross_site(&with(&[("origin", "null")])));
    }
}
