// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployment descriptor types.
//!
//! The deployment descriptor is the YAML (or JSON) file the host framework
//! deploys from. Only the parts the domain manager reads are modelled here:
//! the service name, the provider section and `custom.customDomain`.
//!
//! # Example
//!
//! ```rust
//! use domain_manager::config::DeploymentDescriptor;
//!
//! let descriptor = DeploymentDescriptor::from_yaml_str(r#"
//! service: orders
//! provider:
//!   stage: prod
//!   region: eu-west-1
//! custom:
//!   customDomain:
//!     domainName: api.example.com
//!     basePath: orders
//! "#).unwrap();
//!
//! assert_eq!(descriptor.service_name(), Some("orders"));
//! assert_eq!(descriptor.raw_domains().unwrap().len(), 1);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_REGION, DEFAULT_STAGE};
use crate::domain_errors::ConfigError;

/// Root of the deployment descriptor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDescriptor {
    /// Service name, either `service: name` or `service: { name: ... }`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceName>,

    /// Provider settings shared by every domain
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Plugin configuration section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomSection>,
}

/// The two shapes a service name can take.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServiceName {
    /// `service: orders`
    Name(String),
    /// `service: { name: orders }`
    Object {
        /// The service name
        name: String,
    },
}

/// Provider section of the descriptor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Default deployment stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Deployment region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Explicit infrastructure stack name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,

    /// Pre-existing API identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_gateway: Option<ApiGatewayConfig>,
}

/// Pre-existing API identifiers that bypass the stack lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayConfig {
    /// REST API to map domains to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_api_id: Option<String>,

    /// Websocket API to map domains to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_api_id: Option<String>,
}

/// `custom` section of the descriptor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSection {
    /// One domain or a list of domains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<OneOrMany<RawDomainConfig>>,
}

/// A value given either once or as a list.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A list of values
    Many(Vec<T>),
    /// A single value
    One(T),
}

impl<T> OneOrMany<T> {
    /// Borrow the values as a list.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Many(values) => values,
            Self::One(value) => std::slice::from_ref(value),
        }
    }
}

/// One `customDomain` entry exactly as the user wrote it.
///
/// Validation and normalization happen in [`crate::domain::DomainSpec::from_raw`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDomainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket: Option<BoolLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<BoolLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_route53_record: Option<BoolLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_private: Option<BoolLike>,
}

/// A boolean as found in hand-written descriptors.
///
/// Accepts real booleans and the strings `"true"`/`"false"`; anything else is
/// kept so that validation can name the offending value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BoolLike {
    Bool(bool),
    Text(String),
    Other(serde_yaml::Value),
}

impl BoolLike {
    /// Evaluate to a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AmbiguousBoolean`] for anything other than a
    /// boolean or the exact strings `"true"` and `"false"`.
    pub fn evaluate(&self, field: &str) -> Result<bool, ConfigError> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Text(text) if text == "true" => Ok(true),
            Self::Text(text) if text == "false" => Ok(false),
            Self::Text(text) => Err(ConfigError::AmbiguousBoolean {
                field: field.to_string(),
                value: text.clone(),
            }),
            Self::Other(value) => Err(ConfigError::AmbiguousBoolean {
                field: field.to_string(),
                value: serde_yaml::to_string(value)
                    .map(|text| text.trim_end().to_string())
                    .unwrap_or_else(|_| format!("{value:?}")),
            }),
        }
    }
}

impl DeploymentDescriptor {
    /// Parse a descriptor from YAML (JSON is accepted as a YAML subset).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the text does not match the schema.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Read and parse a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] if the file cannot be read and
    /// [`ConfigError::Malformed`] if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&text)
    }

    /// The service name, whichever shape it was given in.
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        match self.service.as_ref()? {
            ServiceName::Name(name) | ServiceName::Object { name } => Some(name),
        }
    }

    /// The configured domain entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPluginConfig`] if `custom.customDomain` is absent.
    pub fn raw_domains(&self) -> Result<&[RawDomainConfig], ConfigError> {
        self.custom
            .as_ref()
            .and_then(|custom| custom.custom_domain.as_ref())
            .map(OneOrMany::as_slice)
            .ok_or(ConfigError::MissingPluginConfig)
    }
}

/// Command-line overrides for descriptor values.
#[derive(Clone, Debug, Default)]
pub struct DeploymentOptions {
    /// Overrides `provider.stage`
    pub stage: Option<String>,
    /// Overrides `provider.region`
    pub region: Option<String>,
}

/// Deployment-wide values every component may need, resolved once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentContext {
    /// Service name (empty when the descriptor has none)
    pub service_name: String,
    /// Stage used by domains that do not name their own
    pub stage: String,
    /// Region for regional certificates
    pub region: String,
    /// Explicit stack name, if configured
    pub stack_name: Option<String>,
    /// REST API override
    pub rest_api_id: Option<String>,
    /// Websocket API override
    pub websocket_api_id: Option<String>,
}

impl DeploymentContext {
    /// Resolve the context from a descriptor and command-line overrides.
    ///
    /// Command-line values win over the descriptor, which wins over the defaults.
    #[must_use]
    pub fn resolve(descriptor: &DeploymentDescriptor, options: &DeploymentOptions) -> Self {
        let provider = &descriptor.provider;
        let api_gateway = provider.api_gateway.clone().unwrap_or_default();

        Self {
            service_name: descriptor.service_name().unwrap_or_default().to_string(),
            stage: options
                .stage
                .clone()
                .or_else(|| provider.stage.clone())
                .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            region: options
                .region
                .clone()
                .or_else(|| provider.region.clone())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            stack_name: provider.stack_name.clone(),
            rest_api_id: api_gateway.rest_api_id,
            websocket_api_id: api_gateway.websocket_api_id,
        }
    }

    /// Name of the infrastructure stack for a given stage.
    ///
    /// Uses the explicit stack name when configured, `<service>-<stage>` otherwise.
    #[must_use]
    pub fn stack_name_for(&self, stage: &str) -> String {
        self.stack_name
            .clone()
            .unwrap_or_else(|| format!("{}-{stage}", self.service_name))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
