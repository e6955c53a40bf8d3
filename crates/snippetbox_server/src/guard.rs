//! Anti-forgery protection for state-changing requests.
//!
//! A token is only accepted together with the session it was issued for.
//! The session identifier travels in the `snippetbox_session` cookie and
//! the token in the `csrf_token` form field, so a cross-site form post
//! cannot supply both.
//!
//! ## Token Format
//!
//! - 16 bytes: session id
//! - 8 bytes: issue timestamp (Unix millis, big-endian)
//! - 16 bytes: random nonce
//! - 32 bytes: HMAC-SHA256 over the preceding 40 bytes
//!
//! Total: 72 bytes, URL-safe base64 (no padding) for transport.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "snippetbox_session";

/// Hidden form field carrying the token.
pub const TOKEN_FIELD: &str = "csrf_token";

const SESSION_LEN: usize = 16;
const TIMESTAMP_LEN: usize = 8;
const NONCE_LEN: usize = 16;
const SIGNED_LEN: usize = SESSION_LEN + TIMESTAMP_LEN + NONCE_LEN;
const TOKEN_LEN: usize = SIGNED_LEN + 32;

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Why a write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No session cookie, or one that does not decode.
    MissingSession,
    /// No token field.
    MissingToken,
    /// Token is not valid base64 or has the wrong length.
    MalformedToken,
    /// Token was issued for another session.
    SessionMismatch,
    /// Signature does not verify under the server key.
    BadSignature,
    /// Token is older than the configured expiry.
    Expired,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::MissingSession => "missing session",
            RejectReason::MissingToken => "missing token",
            RejectReason::MalformedToken => "malformed token",
            RejectReason::SessionMismatch => "token issued for another session",
            RejectReason::BadSignature => "bad signature",
            RejectReason::Expired => "token expired",
        };
        f.write_str(text)
    }
}

/// Guard errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The submission failed the anti-forgery check.
    #[error("{0}")]
    Rejected(RejectReason),

    /// The configured secret cannot key the MAC.
    #[error("invalid guard secret: {0}")]
    InvalidSecret(String),
}

impl GuardError {
    /// Returns the rejection reason, if this is a rejection.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            GuardError::Rejected(reason) => Some(*reason),
            GuardError::InvalidSecret(_) => None,
        }
    }
}

impl From<RejectReason> for GuardError {
    fn from(reason: RejectReason) -> Self {
        GuardError::Rejected(reason)
    }
}

/// Guard configuration.
#[derive(Clone)]
pub struct GuardConfig {
    secret: Vec<u8>,
    /// How long an issued token stays valid.
    pub token_expiry: Duration,
}

impl GuardConfig {
    /// Default token lifetime.
    pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(2 * 60 * 60);

    /// Creates a configuration keyed with `secret`.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            token_expiry: Self::DEFAULT_EXPIRY,
        }
    }

    /// Creates a configuration with a fresh random 32-byte key.
    ///
    /// Tokens issued under a random key do not survive a restart.
    pub fn random() -> Self {
        let mut secret = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::random()
    }
}

impl fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardConfig")
            .field("secret", &"<redacted>")
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

/// Opaque per-browser session identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_LEN]);

impl SessionId {
    /// Generates a random session identifier.
    pub fn new() -> Self {
        let mut bytes = [0u8; SESSION_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Creates a session identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; SESSION_LEN]) -> Self {
        Self(bytes)
    }

    /// Decodes the cookie form. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let decoded = URL_SAFE_NO_PAD.decode(s.trim()).ok()?;
        let bytes: [u8; SESSION_LEN] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SESSION_LEN] {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

/// What the server hands out when rendering a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Session the token is bound to; sent as the session cookie.
    pub secret_handle: SessionId,
    /// Name of the hidden form field.
    pub field_name: &'static str,
    /// Encoded token for the hidden form field.
    pub field_value: String,
}

/// The guard-relevant parts of an incoming write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    /// Raw session cookie value, if sent.
    pub session: Option<String>,
    /// Raw token field value, if sent.
    pub token: Option<String>,
}

impl FormSubmission {
    /// Creates a submission from its two raw parts.
    pub fn new(session: Option<impl Into<String>>, token: Option<impl Into<String>>) -> Self {
        Self {
            session: session.map(Into::into),
            token: token.map(Into::into),
        }
    }
}

/// Issues and checks anti-forgery tokens.
#[derive(Clone)]
pub struct MutationGuard {
    mac: HmacSha256,
    token_expiry: Duration,
}

impl MutationGuard {
    /// Creates a guard from its configuration.
    ///
    /// An empty secret is refused.
    pub fn new(config: GuardConfig) -> GuardResult<Self> {
        if config.secret.is_empty() {
            return Err(GuardError::InvalidSecret("secret is empty".into()));
        }
        let mac = HmacSha256::new_from_slice(&config.secret)
            .map_err(|e| GuardError::InvalidSecret(e.to_string()))?;
        Ok(Self {
            mac,
            token_expiry: config.token_expiry,
        })
    }

    /// Token lifetime this guard enforces.
    pub fn token_expiry(&self) -> Duration {
        self.token_expiry
    }

    /// Issues a fresh token bound to `session`.
    pub fn issue_token(&self, session: &SessionId) -> TokenPair {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut token = Vec::with_capacity(TOKEN_LEN);
        token.extend_from_slice(session.as_bytes());
        token.extend_from_slice(&now_millis().to_be_bytes());
        token.extend_from_slice(&nonce);

        let mut mac = self.mac.clone();
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());

        TokenPair {
            secret_handle: *session,
            field_name: TOKEN_FIELD,
            field_value: URL_SAFE_NO_PAD.encode(token),
        }
    }

    /// Checks a submission. Returns the session on success.
    pub fn validate(&self, submission: &FormSubmission) -> GuardResult<SessionId> {
        let session = submission
            .session
            .as_deref()
            .and_then(SessionId::parse)
            .ok_or(RejectReason::MissingSession)?;
        let encoded = submission
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(RejectReason::MissingToken)?;
        let token = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|_| RejectReason::MalformedToken)?;
        if token.len() != TOKEN_LEN {
            return Err(RejectReason::MalformedToken.into());
        }

        let (signed, signature) = token.split_at(SIGNED_LEN);
        if &signed[..SESSION_LEN] != session.as_bytes() {
            return Err(RejectReason::SessionMismatch.into());
        }

        let mut mac = self.mac.clone();
        mac.update(signed);
        mac.verify_slice(signature)
            .map_err(|_| RejectReason::BadSignature)?;

        let mut issued = [0u8; TIMESTAMP_LEN];
        issued.copy_from_slice(&signed[SESSION_LEN..SESSION_LEN + TIMESTAMP_LEN]);
        let issued = u64::from_be_bytes(issued);
        let expiry = u64::try_from(self.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if now_millis() > issued.saturating_add(expiry) {
            return Err(RejectReason::Expired.into());
        }

        Ok(session)
    }
}

impl fmt::Debug for MutationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationGuard")
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> MutationGuard {
        MutationGuard::new(GuardConfig::new(b"test-secret-key-32-bytes-long!!".to_vec())).unwrap()
    }

    fn submission(session: &SessionId, token: &str) -> FormSubmission {
        FormSubmission::new(Some(session.to_string()), Some(token))
    }

    fn rejection(result: GuardResult<SessionId>) -> RejectReason {
        result.unwrap_err().reason().unwrap()
    }

    #[test]
    fn issued_token_validates() {
        let guard = guard();
        let session = SessionId::new();
        let pair = guard.issue_token(&session);

        assert_eq!(pair.secret_handle, session);
        assert_eq!(pair.field_name, TOKEN_FIELD);
        let validated = guard.validate(&submission(&session, &pair.field_value));
        assert_eq!(validated, Ok(session));
    }

    #[test]
    fn tokens_are_url_safe() {
        let pair = guard().issue_token(&SessionId::new());
        assert!(pair
            .field_value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn each_issue_is_distinct() {
        let guard = guard();
        let session = SessionId::new();
        let a = guard.issue_token(&session);
        let b = guard.issue_token(&session);
        assert_ne!(a.field_value, b.field_value);
    }

    #[test]
    fn reject_missing_session() {
        let guard = guard();
        let pair = guard.issue_token(&SessionId::new());
        let sub = FormSubmission::new(None::<String>, Some(pair.field_value));
        assert_eq!(rejection(guard.validate(&sub)), RejectReason::MissingSession);

        let sub = FormSubmission::new(Some("not base64!"), Some("x"));
        assert_eq!(rejection(guard.validate(&sub)), RejectReason::MissingSession);
    }

    #[test]
    fn reject_missing_token() {
        let guard = guard();
        let session = SessionId::new();
        let sub = FormSubmission::new(Some(session.to_string()), None::<String>);
        assert_eq!(rejection(guard.validate(&sub)), RejectReason::MissingToken);
        assert_eq!(
            rejection(guard.validate(&submission(&session, ""))),
            RejectReason::MissingToken
        );
    }

    #[test]
    fn reject_malformed_token() {
        let guard = guard();
        let session = SessionId::new();
        assert_eq!(
            rejection(guard.validate(&submission(&session, "@@@"))),
            RejectReason::MalformedToken
        );
        let short = URL_SAFE_NO_PAD.encode([0u8; 10]);
        assert_eq!(
            rejection(guard.validate(&submission(&session, &short))),
            RejectReason::MalformedToken
        );
    }

    #[test]
    fn reject_other_session() {
        let guard = guard();
        let pair = guard.issue_token(&SessionId::new());
        let other = SessionId::new();
        assert_eq!(
            rejection(guard.validate(&submission(&other, &pair.field_value))),
            RejectReason::SessionMismatch
        );
    }

    #[test]
    fn reject_foreign_key() {
        let session = SessionId::new();
        let foreign = MutationGuard::new(GuardConfig::new(b"another-secret".to_vec())).unwrap();
        let pair = foreign.issue_token(&session);
        assert_eq!(
            rejection(guard().validate(&submission(&session, &pair.field_value))),
            RejectReason::BadSignature
        );
    }

    #[test]
    fn reject_tampered_token() {
        let guard = guard();
        let session = SessionId::new();
        let pair = guard.issue_token(&session);
        let mut raw = URL_SAFE_NO_PAD.decode(&pair.field_value).unwrap();
        raw[SESSION_LEN + TIMESTAMP_LEN] ^= 0xFF;
        let tampered = URL_SAFE_NO_PAD.encode(raw);
        assert_eq!(
            rejection(guard.validate(&submission(&session, &tampered))),
            RejectReason::BadSignature
        );
    }

    #[test]
    fn reject_expired_token() {
        let config = GuardConfig::new(b"test-secret".to_vec()).with_expiry(Duration::from_millis(1));
        let guard = MutationGuard::new(config).unwrap();
        let session = SessionId::new();
        let pair = guard.issue_token(&session);

        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(
            rejection(guard.validate(&submission(&session, &pair.field_value))),
            RejectReason::Expired
        );
    }

    #[test]
    fn empty_secret_is_refused() {
        let err = MutationGuard::new(GuardConfig::new(Vec::new())).unwrap_err();
        assert!(matches!(err, GuardError::InvalidSecret(_)));
    }

    #[test]
    fn session_id_roundtrips_through_cookie_form() {
        let session = SessionId::new();
        assert_eq!(SessionId::parse(&session.to_string()), Some(session));
        assert_eq!(SessionId::parse(""), None);
        assert_eq!(SessionId::parse("AAAA"), None);
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = GuardConfig::new(b"hunter2".to_vec());
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
