//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the endpoints that check credentials or trigger outbound email are
//! limited: admin login, community login and mailing list sign-up.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Parse a single-IP header.
fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Key extractor for the client IP.
///
/// By default the key is the socket peer address. Proxy headers
/// (`cf-connecting-ip`, `x-forwarded-for`, `x-real-ip`, `fly-client-ip`) are
/// only read when the server sits behind a proxy that overwrites them;
/// otherwise any client could pick its own key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    /// Key on the socket peer address only.
    pub const PEER_ADDRESS: Self = Self {
        trust_proxy_headers: false,
    };

    /// Key on proxy headers first, then the peer address.
    pub const BEHIND_PROXY: Self = Self {
        trust_proxy_headers: true,
    };

    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }

    /// Whether proxy headers are read.
    #[must_use]
    pub const fn trusts_proxy_headers(self) -> bool {
        self.trust_proxy_headers
    }
}

/// Client IP as reported by a trusted proxy.
fn proxy_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // Cloudflare's real client IP
    header_ip(headers, "cf-connecting-ip")
        // X-Forwarded-For (first IP in the chain)
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| header_ip(headers, "x-real-ip"))
        .or_else(|| header_ip(headers, "fly-client-ip"))
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = proxy_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Render limiter rejections as JSON errors.
fn rate_limit_error(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => AppError::RateLimited {
            retry_after_secs: wait_time,
        },
        GovernorError::UnableToExtractKey => {
            AppError::Internal("client address unavailable for rate limiting".to_owned())
        }
        GovernorError::Other { code, msg, .. } => AppError::Internal(format!(
            "rate limiter failed ({code}): {}",
            msg.unwrap_or_default()
        )),
    }
    .into_response()
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
/// Rejections answer 429 with a JSON body and `Retry-After`.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(key_extractor: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(peer) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        }
        req
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_proxy_headers_ignored_by_default() {
        let req = request(
            &[
                ("x-forwarded-for", "10.0.0.1"),
                ("cf-connecting-ip", "203.0.113.7"),
            ],
            Some("192.0.2.9:5000"),
        );
        let key = ClientIpKeyExtractor::default().extract(&req).unwrap();
        assert_eq!(key, ip("192.0.2.9"));
        assert_eq!(ClientIpKeyExtractor::default(), ClientIpKeyExtractor::PEER_ADDRESS);
    }

    #[test]
    fn test_cloudflare_header_wins_behind_proxy() {
        let req = request(
            &[
                ("x-forwarded-for", "10.0.0.1"),
                ("cf-connecting-ip", "203.0.113.7"),
            ],
            Some("192.0.2.9:5000"),
        );
        let key = ClientIpKeyExtractor::BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(key, ip("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = request(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")], None);
        let key = ClientIpKeyExtractor::BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(key, ip("198.51.100.2"));
    }

    #[test]
    fn test_behind_proxy_falls_back_to_peer_address() {
        let req = request(&[("x-forwarded-for", "garbage")], Some("192.0.2.9:5000"));
        let key = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(key, ip("192.0.2.9"));
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(ClientIpKeyExtractor::PEER_ADDRESS.extract(&request(&[], None)).is_err());
        let spoofed = request(&[("x-forwarded-for", "10.0.0.1")], None);
        assert!(ClientIpKeyExtractor::PEER_ADDRESS.extract(&spoofed).is_err());
    }

    #[test]
    fn test_rejections_map_to_app_errors() {
        let response = rate_limit_error(GovernorError::TooManyRequests {
            wait_time: 4,
            headers: None,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "4");

        let response = rate_limit_error(GovernorError::UnableToExtractKey);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
