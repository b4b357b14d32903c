//! Request origin for audit entries.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use portfolio_core::audit::AuditOrigin;

/// Longest user-agent string kept in an audit entry.
const MAX_USER_AGENT_LEN: usize = 512;

/// Client IP and user agent, when the request carries them.
///
/// The IP is the first `x-forwarded-for` hop, falling back to the peer
/// address when the server was started with connect info.
#[derive(Debug, Clone, Default)]
pub struct ClientOrigin(pub AuditOrigin);

impl<S: Send + Sync> FromRequestParts<S> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Ok(ClientOrigin(AuditOrigin {
            ip_address: forwarded.or(peer),
            user_agent,
        }))
    }
}
