//! Request shield for mutating operations: a user-agent bot rule plus a
//! fixed-window rate limit keyed by fingerprint (the caller's user id).

use std::time::{Duration, Instant};

use actix_web::HttpRequest;
use dashmap::DashMap;

use crate::errors::ActionError;

/// Rules applied to one family of operations. Counters are kept per policy name.
#[derive(Debug, Clone, Copy)]
pub struct Policy{
    pub name: &'static str,
    pub detect_bots: bool,
}

pub const COURSE_WRITE: Policy = Policy { name: "course-write", detect_bots: true };
pub const COURSE_DELETE: Policy = Policy { name: "course-delete", detect_bots: false };
pub const ENROLL: Policy = Policy { name: "enroll", detect_bots: false };

const BOT_MARKERS: &[&str] = &["bot", "crawler", "spider", "curl", "wget", "python-requests", "headless"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason{
    RateLimit,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision{
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn into_result(self) -> Result<(), ActionError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::RateLimit) => Err(ActionError::RateLimited),
            Decision::Deny(DenyReason::Bot) => Err(ActionError::Denied),
        }
    }
}

struct Window{
    count: u32,
    started: Instant,
}

pub struct Gateway{
    windows: DashMap<(&'static str, String), Window>,
    max_requests: u32,
    window: Duration,
}

impl Gateway {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Gateway { windows: DashMap::new(), max_requests, window }
    }

    pub fn protect(&self, policy: Policy, req: &HttpRequest, fingerprint: &str) -> Decision {
        let user_agent = req
            .headers()
            .get("User-Agent")
            .and_then(|value| value.to_str().ok());

        self.decide(policy, user_agent, fingerprint, Instant::now())
    }

    fn decide(&self, policy: Policy, user_agent: Option<&str>, fingerprint: &str, now: Instant) -> Decision {
        if policy.detect_bots && looks_like_bot(user_agent) {
            tracing::warn!(policy = policy.name, fingerprint, "bot detected");
            return Decision::Deny(DenyReason::Bot);
        }

        let mut entry = self
            .windows
            .entry((policy.name, fingerprint.to_owned()))
            .or_insert_with(|| Window { count: 0, started: now });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            tracing::warn!(policy = policy.name, fingerprint, "rate limit exceeded");
            return Decision::Deny(DenyReason::RateLimit);
        }

        Decision::Allow
    }

    /// Drops windows that have already expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

fn looks_like_bot(user_agent: Option<&str>) -> bool {
    match user_agent {
        None => true,
        Some(agent) if agent.trim().is_empty() => true,
        Some(agent) => {
            let agent = agent.to_ascii_lowercase();
            BOT_MARKERS.iter().any(|marker| agent.contains(marker))
        }
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    const BROWSER: Option<&str> = Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0");

    #[test]
    fn test_fixed_window_denies_after_max(){
        let gateway = Gateway::new(5, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..5 {
            assert_eq!(gateway.decide(ENROLL, BROWSER, "user-1", now), Decision::Allow);
        }
        assert_eq!(gateway.decide(ENROLL, BROWSER, "user-1", now), Decision::Deny(DenyReason::RateLimit));

        // other fingerprints and other policies have their own counters
        assert_eq!(gateway.decide(ENROLL, BROWSER, "user-2", now), Decision::Allow);
        assert_eq!(gateway.decide(COURSE_DELETE, BROWSER, "user-1", now), Decision::Allow);
    }

    #[test]
    fn test_window_resets(){
        let gateway = Gateway::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert_eq!(gateway.decide(ENROLL, BROWSER, "user-1", start), Decision::Allow);
        assert_eq!(gateway.decide(ENROLL, BROWSER, "user-1", start), Decision::Deny(DenyReason::RateLimit));
        assert_eq!(gateway.decide(ENROLL, BROWSER, "user-1", start + Duration::from_secs(61)), Decision::Allow);
    }

    #[test]
    fn test_bot_rule_only_where_enabled(){
        let gateway = Gateway::new(5, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(gateway.decide(COURSE_WRITE, Some("Googlebot/2.1"), "user-1", now), Decision::Deny(DenyReason::Bot));
        assert_eq!(gateway.decide(COURSE_WRITE, None, "user-1", now), Decision::Deny(DenyReason::Bot));
        assert_eq!(gateway.decide(COURSE_DELETE, Some("curl/8.0"), "user-1", now), Decision::Allow);
    }

    #[test]
    fn test_denials_map_to_messages(){
        let err = Decision::Deny(DenyReason::RateLimit).into_result().unwrap_err();
        assert_eq!(err.to_string(), "You've been blocked due to rate limiting");

        let err = Decision::Deny(DenyReason::Bot).into_result().unwrap_err();
        assert_eq!(err.to_string(), "Decision denied");
    }
}
