//! Client identification for rate limiting.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};

use crate::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Network identity of the caller, as used for lockout bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    /// Resolve the caller's address.
    ///
    /// Uses the first `X-Forwarded-For` entry only when `trust_proxy` is set,
    /// otherwise the peer IP of the connection.
    pub fn resolve(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> Self {
        if trust_proxy {
            let forwarded = headers
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return Self(ip.to_string());
            }
        }

        let peer = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self(peer)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequestParts<Arc<AppState>> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(
            &parts.headers,
            &parts.extensions,
            state.config.trust_proxy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer_extensions() -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 5], 54321))));
        extensions
    }

    fn forwarded_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("198.51.100.23, 10.0.0.1"),
        );
        headers
    }

    #[test]
    fn test_peer_address_without_port() {
        let id = ClientId::resolve(&HeaderMap::new(), &peer_extensions(), false);
        assert_eq!(id.as_str(), "203.0.113.5");
    }

    #[test]
    fn test_forwarded_for_ignored_unless_trusted() {
        let id = ClientId::resolve(&forwarded_headers(), &peer_extensions(), false);
        assert_eq!(id.as_str(), "203.0.113.5");
    }

    #[test]
    fn test_forwarded_for_first_hop_when_trusted() {
        let id = ClientId::resolve(&forwarded_headers(), &peer_extensions(), true);
        assert_eq!(id.as_str(), "198.51.100.23");
    }

    #[test]
    fn test_trusted_without_header_falls_back_to_peer() {
        let id = ClientId::resolve(&HeaderMap::new(), &peer_extensions(), true);
        assert_eq!(id.as_str(), "203.0.113.5");
    }

    #[test]
    fn test_unknown_without_connect_info() {
        let id = ClientId::resolve(&HeaderMap::new(), &Extensions::new(), false);
        assert_eq!(id.as_str(), "unknown");
    }
}
