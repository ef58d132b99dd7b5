//! Client address extractor for rate limiting.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::api::AppState;

/// Best-effort client address.
///
/// Behind a trusted proxy this is the first X-Forwarded-For hop, then
/// X-Real-IP. Otherwise forwarding headers are ignored and the socket
/// address is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trust_proxy = AppState::from_ref(state).trust_proxy_headers;
        let connect_info = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(client_identifier(
            &parts.headers,
            connect_info,
            trust_proxy,
        )))
    }
}

/// Resolve the client address from proxy headers (when trusted) or the socket.
pub fn client_identifier(
    headers: &HeaderMap,
    connect_info: Option<SocketAddr>,
    trust_proxy: bool,
) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
        {
            // First entry is the original client
            if let Some(ip) = forwarded.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
                return ip.to_string();
            }
        }

        if let Some(real_ip) = headers.get("X-Real-IP").and_then(|h| h.to_str().ok()) {
            return real_ip.trim().to_string();
        }
    }

    connect_info
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
