//! Composite agreement identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite primary key of an established agreement.
///
/// An agreement identifier is an opaque string assigned by the
/// agreement protocol and is only unique *within* that protocol, so
/// the pair `(protocol, agreement_id)` is carried everywhere an
/// agreement is referenced: store keys, bus messages and log lines.
///
/// # Slug Encoding
///
/// [`slug`](Self::slug) renders the key as `"{protocol}/{agreement_id}"`,
/// which is also the encoding used for durable store keys. Protocol
/// names never contain `/`, so the first separator is unambiguous and
/// [`from_slug`](Self::from_slug) can split on it even when the
/// agreement id itself contains slashes.
///
/// # Example
///
/// ```
/// use pact_types::AgreementKey;
///
/// let key = AgreementKey::new("basic", "9a2f3c");
/// assert_eq!(key.slug(), "basic/9a2f3c");
///
/// let parsed = AgreementKey::from_slug("basic/9a2f3c").unwrap();
/// assert_eq!(parsed, key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgreementKey {
    /// Agreement protocol name (e.g. `"basic"`).
    pub protocol: String,
    /// Opaque agreement identifier, unique within the protocol.
    pub agreement_id: String,
}

impl AgreementKey {
    /// Creates a key from a protocol name and agreement id.
    #[must_use]
    pub fn new(protocol: impl Into<String>, agreement_id: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
        }
    }

    /// Renders the key as `"{protocol}/{agreement_id}"`.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.protocol, self.agreement_id)
    }

    /// Parses a key from its slug form.
    ///
    /// Returns `None` if the slug has no separator or either part is
    /// empty.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        let (protocol, agreement_id) = slug.split_once('/')?;
        if protocol.is_empty() || agreement_id.is_empty() {
            return None;
        }
        Some(Self::new(protocol, agreement_id))
    }
}

impl fmt::Display for AgreementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.agreement_id)
    }
}
