//! API handlers and shared validation helpers.

pub mod captcha;
pub mod health;
pub mod login;
pub mod oauth;
pub mod panel;
pub mod root;
pub mod session;
pub mod types;

use regex::Regex;

/// Lightweight email sanity check applied to direct login claims before they
/// reach the ledger.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("user.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }
}
