//! Contact form guard: per-IP sliding-window rate limit, honeypot trap,
//! field validation, and optional persistence to the CMS.
//!
//! The window table is process-local shared state behind a mutex. A
//! multi-instance deployment gets per-instance limits, not a global one;
//! that is the accepted guarantee, so the guard is injected through app
//! state instead of living in a module-level global.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::cms::CmsClient;
use crate::error::{AppError, AppResult};

pub const RATE_LIMIT_MAX: usize = 5;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(10 * 60);

const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 200;
const MESSAGE_MAX_CHARS: usize = 5000;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot. Hidden in the form; bots fill it, humans never see it.
    #[serde(default)]
    pub website: String,
}

/// Per-IP sliding window of accepted submission timestamps.
pub struct ContactGuard {
    max: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ContactGuard {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Drop expired timestamps and evict IPs with none left. The keys come
    /// from a client-controlled header, so entries must not outlive the
    /// window.
    fn prune(hits: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
        hits.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < window);
            !timestamps.is_empty()
        });
    }

    /// Whether `ip` has exhausted its window. Read-only: never inserts.
    pub fn is_limited(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune(&mut hits, now, self.window);
        hits.get(ip).is_some_and(|timestamps| timestamps.len() >= self.max)
    }

    /// Atomically re-check the window and record one accepted submission.
    /// Returns false when `ip` is out of slots; check and reservation happen
    /// under one lock so concurrent submissions cannot overshoot the limit.
    pub fn try_record(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune(&mut hits, now, self.window);
        let timestamps = hits.entry(ip.to_string()).or_default();
        if timestamps.len() >= self.max {
            return false;
        }
        timestamps.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_ips(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for ContactGuard {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX, RATE_LIMIT_WINDOW)
    }
}

fn clamp(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

struct ValidContact {
    name: String,
    email: String,
    message: String,
}

fn validate(payload: &ContactPayload) -> AppResult<ValidContact> {
    let name = clamp(&payload.name, NAME_MAX_CHARS);
    let email = clamp(&payload.email, EMAIL_MAX_CHARS);
    let message = clamp(&payload.message, MESSAGE_MAX_CHARS);

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::InvalidPayload(
            "name, email and message are required".to_string(),
        ));
    }
    if !email_regex().is_match(&email) {
        return Err(AppError::InvalidPayload(
            "email address is not valid".to_string(),
        ));
    }

    Ok(ValidContact {
        name,
        email,
        message,
    })
}

/// Accept or reject one contact submission from `ip`.
///
/// Order matters: the rate limit rejects first (nothing recorded), the
/// honeypot silently succeeds without persisting, invalid fields reject,
/// and only an accepted submission consumes a window slot.
pub async fn accept(
    guard: &ContactGuard,
    cms: &CmsClient,
    ip: &str,
    payload: &ContactPayload,
) -> AppResult<()> {
    if guard.is_limited(ip) {
        return Err(AppError::RateLimited);
    }

    if !payload.website.trim().is_empty() {
        warn!("Honeypot triggered from {ip}, dropping submission");
        return Ok(());
    }

    let valid = validate(payload)?;
    if !guard.try_record(ip) {
        return Err(AppError::RateLimited);
    }

    if cms.can_write() {
        cms.create(json!({
            "_type": "contactMessage",
            "name": valid.name,
            "email": valid.email,
            "message": valid.message,
            "submittedAt": Utc::now().to_rfc3339(),
        }))
        .await?;
    } else {
        info!("CMS write token not configured, contact message from {ip} not persisted");
    }

    Ok(())
}
