//! Opaque one-time share tokens

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Random bytes behind every token (128 bits)
const TOKEN_BYTES: usize = 16;

/// Encoded length of a token in characters
pub const TOKEN_LEN: usize = 22;

/// Characters of a token that may appear in logs
const LOG_PREFIX_LEN: usize = 6;

/// Unguessable URL-safe token granting a single view
///
/// The token is the only credential a share link carries, so it is drawn from the
/// operating system RNG and encoded as unpadded base64url.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    /// Generates a fresh token
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parses a token received from a link
    ///
    /// Returns `None` for anything that could not have been produced by
    /// [`ShareToken::generate`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != TOKEN_LEN {
            return None;
        }

        let decoded = URL_SAFE_NO_PAD.decode(raw).ok()?;
        (decoded.len() == TOKEN_BYTES).then(|| Self(raw.to_string()))
    }

    /// The encoded token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the token, safe to log
    ///
    /// The full token redeems the image, so it never goes to the logs.
    #[must_use]
    pub fn log_prefix(&self) -> &str {
        &self.0[..LOG_PREFIX_LEN]
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
