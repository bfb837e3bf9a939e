//! Terms-and-conditions policy embedded in a proposal.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// The policy both parties agreed to run under.
///
/// Only the fields the governance core consumes are modeled; unknown
/// fields are ignored on decode so the policy schema can grow without
/// breaking deployed devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy name.
    #[serde(rename = "header", default)]
    pub header: PolicyHeader,
    /// API specifications of the workload's microservices. The first
    /// entry identifies the agreement's microservice in the registry.
    #[serde(rename = "apiSpec", default)]
    pub api_specs: Vec<ApiSpec>,
}

/// Policy header block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyHeader {
    /// Human-chosen policy name.
    #[serde(default)]
    pub name: String,
    /// Policy schema version.
    #[serde(default)]
    pub version: String,
}

/// One microservice API specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    /// URL-shaped reference identifying the microservice.
    #[serde(rename = "specRef")]
    pub spec_ref: String,
    /// Spec version expression.
    #[serde(default)]
    pub version: String,
}

/// Decodes a serialized policy document.
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] when the document is not valid
/// JSON for the policy schema.
pub fn demarshal_policy(serialized: &str) -> Result<Policy, ProtocolError> {
    Ok(serde_json::from_str(serialized)?)
}
