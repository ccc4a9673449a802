//! Admission gate: address resolution, allow-list, rate limit.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::access::limiter::RateLimiter;
use crate::access::policy::AccessPolicy;
use crate::config::schema::{AccessConfig, RateLimitConfig};
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Why a request was turned away before reaching a handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// The client address could not be determined. Fail closed.
    #[error("client address could not be determined")]
    InvalidAddress,

    #[error("client network is not allowed")]
    NetworkNotAllowed,

    #[error("rate limit exceeded")]
    RateLimited,
}

/// Combined admission check, applied to every request before routing.
#[derive(Debug)]
pub struct AccessGate {
    policy: AccessPolicy,
    trusted_proxies: AccessPolicy,
    limiter: RateLimiter,
}

impl AccessGate {
    pub fn new(access: &AccessConfig, rate: &RateLimitConfig) -> Result<Self, ipnet::AddrParseError> {
        Ok(Self {
            policy: AccessPolicy::from_strings(&access.allowed_networks)?,
            trusted_proxies: AccessPolicy::from_strings(&access.trusted_proxies)?,
            limiter: RateLimiter::new(rate.max_requests, Duration::from_secs(rate.window_secs)),
        })
    }

    /// Whether a peer may speak for its clients via `X-Forwarded-For`.
    pub fn trusts_proxy(&self, addr: IpAddr) -> bool {
        self.trusted_proxies.permits(addr)
    }

    /// Admit a client given its raw address string. An unparseable
    /// address is denied.
    pub fn admit(&self, client: &str) -> Result<IpAddr, AccessDenied> {
        let addr: IpAddr = client
            .trim()
            .parse()
            .map_err(|_| AccessDenied::InvalidAddress)?;
        self.admit_addr(addr)?;
        Ok(addr)
    }

    /// Admit a client with an already-resolved address.
    pub fn admit_addr(&self, addr: IpAddr) -> Result<(), AccessDenied> {
        if !self.policy.permits(addr) {
            return Err(AccessDenied::NetworkNotAllowed);
        }
        if !self.limiter.check(addr) {
            return Err(AccessDenied::RateLimited);
        }
        Ok(())
    }

    pub fn sweep(&self) {
        self.limiter.sweep();
    }
}

/// Middleware applying the gate to every request.
///
/// The client is the connection peer. `X-Forwarded-For` is honored
/// only when the peer is itself inside the trusted-proxy set, so a
/// client outside the allow-list cannot pick its own address by
/// sending the header.
pub async fn access_gate_middleware(
    State(gate): State<Arc<AccessGate>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let forwarded = if gate.trusts_proxy(peer.ip()) {
        request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
    } else {
        None
    };

    let admitted = match forwarded {
        Some(client) => gate.admit(&client).map(|_| ()),
        None => gate.admit_addr(peer.ip()),
    };

    match admitted {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            let reason = match denial {
                AccessDenied::InvalidAddress => "invalid_address",
                AccessDenied::NetworkNotAllowed => "network",
                AccessDenied::RateLimited => "rate",
            };
            tracing::warn!(peer = %peer.ip(), reason, "BLOCKED: {denial}");
            metrics::record_denied(reason);
            ApiError::from(denial).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(networks: &[&str], max_requests: u32) -> AccessGate {
        gate_with_proxies(networks, &[], max_requests)
    }

    fn gate_with_proxies(networks: &[&str], proxies: &[&str], max_requests: u32) -> AccessGate {
        let access = AccessConfig {
            allowed_networks: networks.iter().map(|s| s.to_string()).collect(),
            trusted_proxies: proxies.iter().map(|s| s.to_string()).collect(),
        };
        let rate = RateLimitConfig {
            max_requests,
            window_secs: 60,
            sweep_interval_secs: 300,
        };
        AccessGate::new(&access, &rate).unwrap()
    }

    #[test]
    fn unparseable_address_is_denied() {
        let g = gate(&["0.0.0.0/0"], 10);
        assert_eq!(g.admit("garbage"), Err(AccessDenied::InvalidAddress));
        assert_eq!(g.admit(""), Err(AccessDenied::InvalidAddress));
    }

    #[test]
    fn network_check_runs_before_rate_check() {
        let g = gate(&["10.0.0.0/8"], 1);
        // Blocked clients never consume rate budget.
        for _ in 0..5 {
            assert_eq!(
                g.admit("192.168.1.1"),
                Err(AccessDenied::NetworkNotAllowed)
            );
        }
        assert!(g.admit("10.1.2.3").is_ok());
    }

    #[test]
    fn rate_limit_applies_to_allowed_clients() {
        let g = gate(&["0.0.0.0/0"], 2);
        assert!(g.admit("10.1.2.3").is_ok());
        assert!(g.admit("10.1.2.3").is_ok());
        assert_eq!(g.admit("10.1.2.3"), Err(AccessDenied::RateLimited));
    }

    #[test]
    fn no_proxy_is_trusted_by_default() {
        let g = gate(&["0.0.0.0/0"], 10);
        assert!(!g.trusts_proxy("127.0.0.1".parse().unwrap()));
        assert!(!g.trusts_proxy("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn trusted_proxy_set_is_honored() {
        let g = gate_with_proxies(&["0.0.0.0/0"], &["127.0.0.0/8"], 10);
        assert!(g.trusts_proxy("127.0.0.1".parse().unwrap()));
        assert!(!g.trusts_proxy("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn admit_trims_whitespace() {
        let g = gate(&["0.0.0.0/0"], 10);
        assert_eq!(g.admit(" 10.1.2.3 ").unwrap(), "10.1.2.3".parse::<IpAddr>().unwrap());
    }
}
