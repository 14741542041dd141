//! Rate limiting for login and registration routes
//!
//! Fixed window per (route, client IP), limits taken from [`Config`].
//!
//! [`Config`]: crate::core::Config

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use shared::{AppError, ErrorCode};
use tokio::time::Instant;

use crate::core::ServerState;
use crate::security_log;

#[derive(Debug)]
struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    entries: Arc<DashMap<(&'static str, String), IpEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the request is allowed
    pub fn check(&self, route: &'static str, ip: &str, max_requests: u32, window_secs: u64) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry((route, ip.to_owned()))
            .or_insert_with(|| IpEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= Duration::from_secs(window_secs) {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drop windows older than five minutes
    pub fn cleanup(&self) {
        let cutoff = Duration::from_secs(300);
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client IP: first `X-Forwarded-For` hop, then the peer address
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    route: &'static str,
    state: &ServerState,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    let allowed = state.rate_limiter.check(
        route,
        &ip,
        state.config.auth_rate_limit,
        state.config.auth_rate_window_secs,
    );
    if !allowed {
        security_log!("WARN", "rate_limited", route = route, ip = ip.as_str());
        return Err(AppError::with_message(
            ErrorCode::TooManyRequests,
            "Too many requests, try again later",
        ));
    }
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit("login", &state, request, next).await
}

pub async fn register_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit("register", &state, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_per_window() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("login", "10.0.0.1", 3, 60));
        }
        assert!(!limiter.check("login", "10.0.0.1", 3, 60));
        // other IPs and routes are independent
        assert!(limiter.check("login", "10.0.0.2", 3, 60));
        assert!(limiter.check("register", "10.0.0.1", 3, 60));
    }

    #[test]
    fn test_zero_window_resets_immediately() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "ip", 1, 0));
        assert!(limiter.check("login", "ip", 1, 0));
    }

    #[test]
    fn test_cleanup_keeps_fresh_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "ip", 5, 60);
        limiter.cleanup();
        assert_eq!(limiter.len(), 1);
    }
}
