// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request signature verification.
//!
//! Clients sign `"{timestamp}.{raw_body}"` with HMAC-SHA256 keyed by the
//! shared secret and send:
//!
//! - `x-mcp-timestamp`: unix seconds as a decimal string
//! - `x-mcp-signature`: lowercase hex digest
//!
//! The body is the exact bytes on the wire, before any JSON parsing.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "x-mcp-timestamp";

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "x-mcp-signature";

/// Default tolerance between request timestamp and server time.
pub const SIGNATURE_WINDOW_SECS: i64 = 300;

/// Signature verification failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// No shared secret is configured. This is a server-side fault.
    #[error("Secret token is not configured.")]
    SecretNotConfigured,

    #[error("Missing signature or timestamp.")]
    MissingCredentials,

    #[error("Timestamp expired.")]
    Expired { timestamp: i64, now: i64 },

    #[error("Invalid signature.")]
    InvalidSignature,
}

impl SignatureError {
    /// True when the failure is the operator's fault rather than the caller's.
    pub fn is_config_fault(&self) -> bool {
        matches!(self, SignatureError::SecretNotConfigured)
    }

    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            SignatureError::SecretNotConfigured => "secret_not_configured",
            SignatureError::MissingCredentials => "missing_credentials",
            SignatureError::Expired { .. } => "expired",
            SignatureError::InvalidSignature => "invalid_signature",
        }
    }
}

/// Verifies request signatures against one shared secret.
#[derive(Debug, Clone)]
pub struct SignatureVerifier<'a> {
    secret: &'a str,
    window_secs: i64,
}

impl<'a> SignatureVerifier<'a> {
    /// Create a verifier with the default 300 second window.
    pub fn new(secret: &'a str) -> Self {
        Self {
            secret,
            window_secs: SIGNATURE_WINDOW_SECS,
        }
    }

    /// Override the replay window.
    pub fn with_window(mut self, window_secs: i64) -> Self {
        self.window_secs = window_secs;
        self
    }

    /// Check `timestamp` and `signature` for `body` at time `now`.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        if self.secret.is_empty() {
            return Err(SignatureError::SecretNotConfigured);
        }

        let (timestamp, signature) = match (timestamp, signature) {
            (Some(t), Some(s)) if !t.is_empty() && !s.is_empty() => (t, s),
            _ => return Err(SignatureError::MissingCredentials),
        };

        let parsed = leading_integer(timestamp);
        if now.saturating_sub(parsed).saturating_abs() > self.window_secs {
            debug!(timestamp = parsed, now, window = self.window_secs, "Timestamp outside window");
            return Err(SignatureError::Expired {
                timestamp: parsed,
                now,
            });
        }

        let expected = sign(self.secret, timestamp, body);
        if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            Ok(())
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }
}

/// Integer value of the leading `[+-]?digits` run after leading whitespace.
///
/// Trailing text is ignored (`"1700000000.5"` reads as `1700000000`). No
/// digits, or a run that overflows, reads as 0, which is always stale.
fn leading_integer(raw: &str) -> i64 {
    let trimmed =
        raw.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let sign_len = usize::from(trimmed.starts_with(|c: char| c == '+' || c == '-'));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    trimmed[..sign_len + digits].parse().unwrap_or(0)
}

/// Verify a request with the default window. See [`SignatureVerifier::verify`].
pub fn verify(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    SignatureVerifier::new(secret).verify(timestamp, signature, body, now)
}

/// Compute the lowercase hex signature for `timestamp` and `body`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Generate a fresh shared secret: 32 random bytes as 64 hex characters.
pub fn generate_secret_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s3cr3t";
    const NOW: i64 = 1_700_000_000;

    fn signed(body: &[u8], ts: i64) -> (String, String) {
        let ts = ts.to_string();
        let sig = sign(SECRET, &ts, body);
        (ts, sig)
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"name":"Alice"}"#;
        let (ts, sig) = signed(body, NOW);
        assert_eq!(verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW), Ok(()));
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256 of `1700000000.{}` keyed with `key`.
        assert_eq!(
            sign("key", "1700000000", b"{}"),
            "9d713ed406bb7076d4123f0dc2c39d2df5c654ed4b0cd56b52c8b4c940bd63ae"
        );
    }

    #[test]
    fn test_empty_secret_is_config_fault() {
        let err = verify("", Some("1"), Some("ab"), b"", NOW).unwrap_err();
        assert_eq!(err, SignatureError::SecretNotConfigured);
        assert!(err.is_config_fault());
    }

    #[test]
    fn test_missing_credentials() {
        let (ts, sig) = signed(b"", NOW);
        assert_eq!(
            verify(SECRET, None, Some(sig.as_str()), b"", NOW),
            Err(SignatureError::MissingCredentials)
        );
        assert_eq!(
            verify(SECRET, Some(ts.as_str()), None, b"", NOW),
            Err(SignatureError::MissingCredentials)
        );
        assert_eq!(
            verify(SECRET, Some(""), Some(sig.as_str()), b"", NOW),
            Err(SignatureError::MissingCredentials)
        );
    }

    #[test]
    fn test_window_boundaries() {
        let body = b"payload";

        let (ts, sig) = signed(body, NOW - 300);
        assert!(verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW).is_ok());

        let (ts, sig) = signed(body, NOW + 300);
        assert!(verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW).is_ok());

        let (ts, sig) = signed(body, NOW - 301);
        assert!(matches!(
            verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW),
            Err(SignatureError::Expired { .. })
        ));

        let (ts, sig) = signed(body, NOW + 301);
        assert!(matches!(
            verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW),
            Err(SignatureError::Expired { .. })
        ));
    }

    #[test]
    fn test_custom_window() {
        let (ts, sig) = signed(b"", NOW - 30);
        let verifier = SignatureVerifier::new(SECRET).with_window(10);
        assert!(matches!(
            verifier.verify(Some(ts.as_str()), Some(sig.as_str()), b"", NOW),
            Err(SignatureError::Expired { .. })
        ));
    }

    #[test]
    fn test_non_numeric_timestamp_is_expired() {
        let sig = sign(SECRET, "soon", b"");
        assert!(matches!(
            verify(SECRET, Some("soon"), Some(sig.as_str()), b"", NOW),
            Err(SignatureError::Expired { timestamp: 0, .. })
        ));
    }

    #[test]
    fn test_timestamp_leading_digits() {
        assert_eq!(leading_integer("1700000000"), 1_700_000_000);
        assert_eq!(leading_integer("  1700000000"), 1_700_000_000);
        assert_eq!(leading_integer("1700000000abc"), 1_700_000_000);
        assert_eq!(leading_integer("1700000000.5"), 1_700_000_000);
        assert_eq!(leading_integer("-42"), -42);
        assert_eq!(leading_integer("+7"), 7);
        assert_eq!(leading_integer("abc"), 0);
        assert_eq!(leading_integer("-"), 0);
        assert_eq!(leading_integer(""), 0);
        assert_eq!(leading_integer("99999999999999999999"), 0);
    }

    #[test]
    fn test_timestamp_with_trailing_text_verifies() {
        // The signed message uses the header text exactly as sent.
        for ts in ["1700000000abc", "1700000000.5"] {
            let sig = sign(SECRET, ts, b"{}");
            assert_eq!(verify(SECRET, Some(ts), Some(sig.as_str()), b"{}", NOW), Ok(()));
        }
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = br#"{"amount":"100"}"#;
        let (ts, sig) = signed(body, NOW);
        let tampered = br#"{"amount":"900"}"#;
        assert_eq!(
            verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), tampered, NOW),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"hello";
        let ts = NOW.to_string();
        let sig = sign("other-secret", &ts, body);
        assert_eq!(
            verify(SECRET, Some(ts.as_str()), Some(sig.as_str()), body, NOW),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn test_timestamp_is_part_of_signed_message() {
        let body = b"hello";
        let sig = sign(SECRET, &NOW.to_string(), body);
        let other_ts = (NOW + 1).to_string();
        assert_eq!(
            verify(SECRET, Some(other_ts.as_str()), Some(sig.as_str()), body, NOW),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn test_uppercase_hex_rejected() {
        let (ts, sig) = signed(b"x", NOW);
        let upper = sig.to_uppercase();
        assert_eq!(
            verify(SECRET, Some(ts.as_str()), Some(upper.as_str()), b"x", NOW),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let (ts, sig) = signed(b"x", NOW);
        assert_eq!(
            verify(SECRET, Some(ts.as_str()), Some(&sig[..32]), b"x", NOW),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn test_generated_token_shape() {
        let a = generate_secret_token();
        let b = generate_secret_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
