//! Fixed-window rate limiting for public write endpoints
//!
//! Single-process counters. A multi-instance deployment must back the same
//! `check` contract with a shared atomic store (e.g. Redis INCR + EXPIRE);
//! the surface is storage-agnostic so that swap is drop-in.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;

struct WindowEntry {
    count: u32,
    /// Unix millis at which the window closes
    reset_at: i64,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Unix millis at which the caller may retry
    pub reset_at: i64,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-window counter check for `identifier`.
    pub fn check(&self, identifier: &str, limit: u32, window_ms: i64) -> RateLimitDecision {
        self.check_at(
            identifier,
            limit,
            window_ms,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    fn check_at(
        &self,
        identifier: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> RateLimitDecision {
        let mut entry = self
            .entries
            .entry(identifier.to_owned())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now_ms + window_ms,
            });

        // Window elapsed: start a fresh one
        if now_ms >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now_ms + window_ms;
        }

        if entry.count >= limit {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: limit - entry.count,
            reset_at: entry.reset_at,
        }
    }

    /// Sweep entries whose window has elapsed to bound memory
    pub fn cleanup(&self) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.entries.retain(|_, entry| entry.reset_at > now_ms);
    }
}

/// Resolve the client identifier from proxy headers.
///
/// Preference order: first `X-Forwarded-For` entry, `X-Real-IP`,
/// `CF-Connecting-IP`, then a shared "unknown" bucket. An unresolvable
/// identifier is never a reason to reject the request outright.
pub fn get_client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // Comma-separated; the first entry is the original client
        if let Some(first) = forwarded.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_owned();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_owned();
        }
    }
    if let Some(cf_ip) = headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()) {
        if !cf_ip.is_empty() {
            return cf_ip.to_owned();
        }
    }
    "unknown".to_owned()
}

/// Rate-limit middleware for the contact/booking endpoint.
///
/// Denied callers get a 429 with `X-RateLimit-Remaining` and a `Retry-After`
/// hint computed from the window's reset time.
pub async fn contact_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = get_client_ip(request.headers());
    let decision = state.rate_limiter.check(
        &ip,
        state.contact_rate_limit,
        state.contact_rate_window_ms,
    );

    if !decision.allowed {
        let retry_after_secs =
            ((decision.reset_at - chrono::Utc::now().timestamp_millis()).max(0) + 999) / 1000;
        tracing::warn!(ip = %ip, "Contact submission rate-limited");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("x-ratelimit-remaining", decision.remaining.to_string()),
                ("retry-after", retry_after_secs.to_string()),
            ],
            axum::Json(json!({ "error": "Too many requests, try again later" })),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}
