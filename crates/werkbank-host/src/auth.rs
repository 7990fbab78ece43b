use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use werkbank_core::Principal;

use crate::internal::is_internal_caller;
use crate::state::AppState;

/// Cookie carrying the bearer token for browser page navigation.
pub const AUTH_COOKIE: &str = "werkbank_auth";

const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
    "/api/modules/register",
    "/api/modules/health",
    "/api/setup/required",
    "/api/setup/complete",
    "/health",
    "/metrics",
];

const PUBLIC_PREFIXES: &[&str] = &[
    "/assets/",
    "/static/",
    "/favicon",
    "/swagger-ui",
    "/api-docs",
    "/api/mobile",
    "/mobile",
];

// Invite/reset links carry their own one-time token in the path.
const PUBLIC_TOKEN_PREFIXES: &[&str] = &["/api/auth/invite/", "/api/auth/reset/"];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
        || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || PUBLIC_TOKEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Classifies every inbound request and attaches exactly one [`Principal`]
/// before it reaches a handler, or rejects it here.
///
/// Order matters: public paths first, then the global auth flag (absent
/// settings row reads as disabled so a fresh install stays reachable), then
/// internal-caller detection, then token validation. A token is always
/// validated when present, internal caller or not; only the consequence of
/// a failed validation differs.
pub async fn auth_gateway<B>(
    State(state): State<AppState>,
    mut req: Request<B>,
    next: Next<B>,
) -> Response {
    let path = req.uri().path().to_string();

    if is_public_path(&path) {
        req.extensions_mut().insert(Principal::Anonymous);
        return next.run(req).await;
    }

    let auth_enabled = state
        .settings
        .load()
        .map(|s| s.auth_enabled)
        .unwrap_or(false);
    if !auth_enabled {
        req.extensions_mut().insert(Principal::ImplicitAdmin);
        return next.run(req).await;
    }

    let host_header = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let remote = remote_ip(&req);
    let internal = is_internal_caller(host_header.as_deref(), remote);
    let peer = describe_peer(host_header.as_deref(), remote);

    match extract_token(req.headers()) {
        Some(token) => match state.validator.validate(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(Principal::User(claims));
                next.run(req).await
            }
            Err(_) if internal => {
                // Internal traffic must not be blocked by a stale or
                // misconfigured token.
                tracing::warn!(path = %path, peer = %peer, "invalid token on internal call, downgrading to InternalService");
                metrics::counter!("werkbank_auth_internal_degraded_total").increment(1);
                req.extensions_mut().insert(Principal::InternalService);
                next.run(req).await
            }
            Err(_) => deny_or_pass(&path, &peer, req, next).await,
        },
        None if internal => {
            req.extensions_mut().insert(Principal::InternalService);
            next.run(req).await
        }
        None => deny_or_pass(&path, &peer, req, next).await,
    }
}

/// No valid identity from an external caller: APIs get a bare 401, page
/// navigation passes through and the client performs the login redirect.
async fn deny_or_pass<B>(path: &str, peer: &str, mut req: Request<B>, next: Next<B>) -> Response {
    if path.starts_with("/api/") {
        tracing::warn!(path = %path, peer = %peer, "rejecting unauthenticated api request");
        metrics::counter!("werkbank_auth_rejected_total").increment(1);
        StatusCode::UNAUTHORIZED.into_response()
    } else {
        req.extensions_mut().insert(Principal::Anonymous);
        next.run(req).await
    }
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(AUTH_COOKIE) {
                if let Some(token) = parts.next().filter(|t| !t.is_empty()) {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

fn remote_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn describe_peer(host_header: Option<&str>, remote: Option<IpAddr>) -> String {
    let host = host_header.unwrap_or("-");
    match remote {
        Some(ip) => format!("{host} ({ip})"),
        None => host.to_string(),
    }
}
