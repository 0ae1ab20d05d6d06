//! PIN format checks and constant-time comparison.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Shortest accepted PIN.
pub const MIN_PIN_LEN: usize = 4;

/// Longest accepted PIN.
pub const MAX_PIN_LEN: usize = 10;

/// True iff `pin` is 4 to 10 ASCII decimal digits.
pub fn is_valid_format(pin: &str) -> bool {
    (MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Fixed-size digest every compared secret is reduced to.
fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Compare two secrets in time independent of their contents.
///
/// Both inputs are hashed to fixed 32-byte digests first, and the digests are
/// compared with `subtle::ConstantTimeEq`, which always inspects every byte.
/// Neither the position of the first mismatch nor a difference in length
/// changes the amount of work done by the comparison itself.
pub fn secure_compare(a: &str, b: &str) -> bool {
    let (a, b) = (digest(a), digest(b));
    a.as_slice().ct_eq(b.as_slice()).into()
}

/// The configured shared PIN.
///
/// Holds whatever was configured, even if malformed; protection is only
/// active when [`Pin::is_active`] holds. `Debug` never prints the value.
#[derive(Clone)]
pub struct Pin(String);

impl Pin {
    /// Wrap a configured value. Blank values mean "no PIN configured".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    /// Whether the configured value passes its own format check.
    pub fn is_active(&self) -> bool {
        is_valid_format(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, supplied: &str) -> bool {
        secure_compare(supplied, &self.0)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(<redacted>)")
    }
}
