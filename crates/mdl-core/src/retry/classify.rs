//! Classify failure messages and HTTP statuses into retry policy error kinds.
//!
//! The downloader reports failures as free text, so classification is a
//! substring match against a fixed list of transient signals. The list is the
//! contract; anything else is `ErrorKind::Other`.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::policy::ErrorKind;

const TIMEOUT_SIGNALS: &[&str] = &["timed out", "timeout", "etimedout"];
const CONNECTION_SIGNALS: &[&str] = &["connection reset", "econnreset"];
const DNS_SIGNALS: &[&str] = &["temporary failure in name resolution", "eai_again"];

fn http_status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:http error|status(?: code)?:?|http/\d(?:\.\d)?)\s*(\d{3})|\b(\d{3})\s+(?:internal server error|bad gateway|service unavailable|gateway time-?out)",
        )
        .expect("static regex")
    })
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a failure message (subprocess stderr tail, spawn error text).
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_ascii_lowercase();

    if DNS_SIGNALS.iter().any(|s| lower.contains(s)) {
        return ErrorKind::Dns;
    }
    if CONNECTION_SIGNALS.iter().any(|s| lower.contains(s)) {
        return ErrorKind::Connection;
    }
    if TIMEOUT_SIGNALS.iter().any(|s| lower.contains(s)) {
        return ErrorKind::Timeout;
    }

    for caps in http_status_regex().captures_iter(message) {
        let code = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u16>().ok());
        if let Some(code) = code {
            if let kind @ ErrorKind::Http5xx(_) = classify_http_status(code) {
                return kind;
            }
        }
    }

    ErrorKind::Other
}
