//! Access gate in front of the WebSocket endpoint.
//!
//! The gate decides, from the request headers alone, whether a request may
//! reach the acceptor. It does not authenticate anyone: it only checks that
//! a session credential is present.

use std::{fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::state::AppState;

/// Cookie carrying the session credential
pub const AUTH_COOKIE: &str = "auth";

/// Where requests without a credential are sent
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Errors raised while reading the credential
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// A `Cookie` header could not be read as text
    #[error("unreadable cookie header: {0}")]
    UnreadableCookie(String),
}

/// Name of the session that passed the gate, attached to the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionName(pub String);

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("anonymous")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through
    Proceed(SessionName),
    /// Deny with a redirect to the given location
    Redirect(String),
    /// Deny with a server error
    Deny(GateError),
}

/// Approves or denies each incoming request before the upgrade
#[cfg_attr(test, mockall::automock)]
pub trait AccessGate: Send + Sync {
    fn check(&self, headers: &HeaderMap) -> GateDecision;
}

/// Gate requiring the `auth` cookie
#[derive(Debug, Clone)]
pub struct CookieGate {
    login_path: String,
}

impl CookieGate {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    /// Look up the `auth` cookie across every `Cookie` header.
    fn find_credential(headers: &HeaderMap) -> Result<Option<String>, GateError> {
        for value in headers.get_all(header::COOKIE) {
            let value = value
                .to_str()
                .map_err(|e| GateError::UnreadableCookie(e.to_string()))?;
            let credential = value
                .split(';')
                .map(|pair| {
                    let pair = pair.trim();
                    // a bare name is a cookie with an empty value
                    pair.split_once('=').unwrap_or((pair, ""))
                })
                .find(|(name, _)| *name == AUTH_COOKIE)
                .map(|(_, credential)| credential.trim_matches('"').to_string());
            if credential.is_some() {
                return Ok(credential);
            }
        }
        Ok(None)
    }
}

impl Default for CookieGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH)
    }
}

impl AccessGate for CookieGate {
    fn check(&self, headers: &HeaderMap) -> GateDecision {
        match Self::find_credential(headers) {
            Ok(Some(credential)) => GateDecision::Proceed(SessionName(credential)),
            Ok(None) => GateDecision::Redirect(self.login_path.clone()),
            Err(e) => GateDecision::Deny(e),
        }
    }
}

/// Middleware running the gate before the wrapped handler
pub async fn require_access(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.check(request.headers()) {
        GateDecision::Proceed(session) => {
            tracing::debug!("Session '{}' passed the gate", session);
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GateDecision::Redirect(location) => {
            tracing::info!(
                "No credential on {}, redirecting to {}",
                request.uri(),
                location
            );
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
        }
        GateDecision::Deny(e) => {
            tracing::warn!("Rejecting request to {}: {}", request.uri(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
