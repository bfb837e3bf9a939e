//! Device identity for marketplace registry calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of this device in the marketplace registry.
///
/// Issued when the device registers with the marketplace and attached
/// to every registry request as `?token={token}`. The token is a
/// bearer credential, so [`fmt::Debug`] and [`fmt::Display`] redact it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    /// Registry-assigned device identifier.
    pub device_id: String,
    /// Bearer token authorizing registry calls for this device.
    pub token: String,
}

impl DeviceCredentials {
    /// Creates credentials from a device id and token.
    #[must_use]
    pub fn new(device_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("device_id", &self.device_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for DeviceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let creds = DeviceCredentials::new("dev-1", "s3cret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("dev-1"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn display_is_device_id() {
        let creds = DeviceCredentials::new("dev-1", "s3cret");
        assert_eq!(creds.to_string(), "dev-1");
    }
}
