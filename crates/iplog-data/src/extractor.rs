//! Client IP extraction from free-text log messages.
//!
//! Request loggers dump headers as a map-like literal, e.g.
//!
//! ```text
//! 'x-real-ip' => { name: 'x-real-ip', value: '10.0.0.1' }
//! ```
//!
//! The extractor is a narrow text search for exactly that entry. It does not
//! parse the surrounding message and does not validate the captured address:
//! any run of ASCII digits and dots inside the quotes is returned verbatim.

use std::sync::OnceLock;

use regex::Regex;

fn real_ip_re() -> &'static Regex {
    static REAL_IP_RE: OnceLock<Regex> = OnceLock::new();
    REAL_IP_RE.get_or_init(|| {
        Regex::new(
            r"'x-real-ip'\s*=>\s*\{\s*name:\s*'x-real-ip',\s*value:\s*'([0-9.]+)'\s*\}",
        )
        .expect("valid x-real-ip regex")
    })
}

/// Return the first `x-real-ip` header value embedded in `message`.
///
/// `None` means the message carries no such entry; that is not an error.
pub fn extract_ip(message: &str) -> Option<&str> {
    real_ip_re()
        .captures(message)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
