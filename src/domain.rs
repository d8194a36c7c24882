// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Canonical domain model.
//!
//! A [`DomainSpec`] is the validated, normalized form of one `customDomain`
//! entry. Specs are built once per run from the deployment descriptor, receive
//! the values discovered remotely (certificate, alias target) and are dropped
//! at the end of the run. Nothing is persisted locally.
//!
//! # Example
//!
//! ```rust
//! use domain_manager::config::RawDomainConfig;
//! use domain_manager::domain::{DomainSpec, EndpointType};
//!
//! let raw = RawDomainConfig {
//!     domain_name: Some("ws.example.com".to_string()),
//!     endpoint_type: Some("edge".to_string()),
//!     websocket: Some(domain_manager::config::BoolLike::Bool(true)),
//!     ..Default::default()
//! };
//!
//! let spec = DomainSpec::from_raw(&raw, "prod").unwrap();
//! // Websocket domains are always regional
//! assert_eq!(spec.endpoint_type(), EndpointType::Regional);
//! assert_eq!(spec.stage(), "prod");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DeploymentContext, DeploymentDescriptor, RawDomainConfig};
use crate::domain_errors::ConfigError;

/// Endpoint flavour of a custom domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointType {
    /// Served through the global edge distribution network
    Edge,
    /// Served from a single region
    Regional,
}

impl EndpointType {
    /// Wire representation (`EDGE` / `REGIONAL`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edge => "EDGE",
            Self::Regional => "REGIONAL",
        }
    }
}

impl FromStr for EndpointType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "edge" => Ok(Self::Edge),
            "regional" => Ok(Self::Regional),
            _ => Err(ConfigError::UnsupportedEndpointType {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum TLS version accepted by a custom domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityPolicy {
    #[serde(rename = "TLS_1_0")]
    Tls10,
    #[default]
    #[serde(rename = "TLS_1_2")]
    Tls12,
}

impl SecurityPolicy {
    /// Wire representation (`TLS_1_0` / `TLS_1_2`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tls10 => "TLS_1_0",
            Self::Tls12 => "TLS_1_2",
        }
    }
}

impl FromStr for SecurityPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tls_1_0" => Ok(Self::Tls10),
            "tls_1_2" => Ok(Self::Tls12),
            _ => Err(ConfigError::UnsupportedSecurityPolicy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API protocol family a domain is mapped to.
///
/// The two families use different registration and mapping APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiType {
    Rest,
    Websocket,
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str("REST"),
            Self::Websocket => f.write_str("Websocket"),
        }
    }
}

/// Canonical target of DNS aliases for a created domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAlias {
    /// Provider-assigned endpoint the alias records point to
    pub target: String,
    /// Hosted zone of that endpoint
    pub hosted_zone_id: String,
}

/// One validated custom domain.
///
/// `domain_name`, `endpoint_type` and `websocket` are fixed at construction.
/// The runtime fields have one writer each: the certificate ARN is recorded
/// after certificate resolution, the alias after a registrar lookup or create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSpec {
    domain_name: String,
    base_path: String,
    stage: String,
    security_policy: SecurityPolicy,
    endpoint_type: EndpointType,
    websocket: bool,
    enabled: bool,
    create_route53_record: bool,
    certificate_name: Option<String>,
    certificate_arn: Option<String>,
    hosted_zone_id: Option<String>,
    hosted_zone_private: Option<bool>,
    alias: Option<DomainAlias>,
}

impl DomainSpec {
    /// Validate and normalize one raw domain entry.
    ///
    /// # Arguments
    ///
    /// * `raw` - The entry as written in the descriptor
    /// * `default_stage` - Stage used when the entry does not name one
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `domainName` is missing, the security
    /// policy or endpoint type is unsupported, or a boolean field is ambiguous.
    pub fn from_raw(raw: &RawDomainConfig, default_stage: &str) -> Result<Self, ConfigError> {
        let domain_name = raw
            .domain_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingDomainName)?
            .to_string();

        let enabled = match &raw.enabled {
            Some(value) => value.evaluate("enabled")?,
            None => true,
        };
        let websocket = match &raw.websocket {
            Some(value) => value.evaluate("websocket")?,
            None => false,
        };
        let create_route53_record = match &raw.create_route53_record {
            Some(value) => value.evaluate("createRoute53Record")?,
            None => true,
        };
        let hosted_zone_private = raw
            .hosted_zone_private
            .as_ref()
            .map(|value| value.evaluate("hostedZonePrivate"))
            .transpose()?;

        let base_path = raw
            .base_path
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let security_policy = match &raw.security_policy {
            Some(value) => value.parse()?,
            None => SecurityPolicy::default(),
        };

        // Websocket APIs only support regional domains, whatever was asked for
        let endpoint_type = if websocket {
            EndpointType::Regional
        } else {
            match &raw.endpoint_type {
                Some(value) => value.parse()?,
                None => EndpointType::Edge,
            }
        };

        Ok(Self {
            domain_name,
            base_path,
            stage: raw
                .stage
                .clone()
                .unwrap_or_else(|| default_stage.to_string()),
            security_policy,
            endpoint_type,
            websocket,
            enabled,
            create_route53_record,
            certificate_name: raw.certificate_name.clone(),
            certificate_arn: raw.certificate_arn.clone(),
            hosted_zone_id: raw.hosted_zone_id.clone(),
            hosted_zone_private,
            alias: None,
        })
    }

    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Base path under the domain; empty means the root.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    #[must_use]
    pub fn security_policy(&self) -> SecurityPolicy {
        self.security_policy
    }

    #[must_use]
    pub fn endpoint_type(&self) -> EndpointType {
        self.endpoint_type
    }

    #[must_use]
    pub fn is_regional(&self) -> bool {
        self.endpoint_type == EndpointType::Regional
    }

    #[must_use]
    pub fn is_websocket(&self) -> bool {
        self.websocket
    }

    /// Protocol family selected by the `websocket` flag.
    #[must_use]
    pub fn api_type(&self) -> ApiType {
        if self.websocket {
            ApiType::Websocket
        } else {
            ApiType::Rest
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether alias records are managed for this domain.
    #[must_use]
    pub fn creates_dns_record(&self) -> bool {
        self.create_route53_record
    }

    #[must_use]
    pub fn certificate_name(&self) -> Option<&str> {
        self.certificate_name.as_deref()
    }

    #[must_use]
    pub fn certificate_arn(&self) -> Option<&str> {
        self.certificate_arn.as_deref()
    }

    #[must_use]
    pub fn hosted_zone_id(&self) -> Option<&str> {
        self.hosted_zone_id.as_deref()
    }

    /// `Some(true)` for private zones only, `Some(false)` for public only.
    #[must_use]
    pub fn hosted_zone_private(&self) -> Option<bool> {
        self.hosted_zone_private
    }

    #[must_use]
    pub fn alias(&self) -> Option<&DomainAlias> {
        self.alias.as_ref()
    }

    /// Record the certificate chosen by certificate resolution.
    pub fn set_certificate_arn(&mut self, arn: String) {
        self.certificate_arn = Some(arn);
    }

    /// Record the alias reported by the registrar.
    pub fn set_alias(&mut self, alias: DomainAlias) {
        self.alias = Some(alias);
    }
}

/// The active domains of one run, in descriptor order, keyed by domain name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainSet {
    domains: Vec<DomainSpec>,
}

impl DomainSet {
    /// Build the active set from the descriptor.
    ///
    /// Disabled domains are logged and left out. An empty set is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the plugin section is missing, any entry is
    /// invalid, or a domain name appears twice.
    pub fn from_descriptor(
        descriptor: &DeploymentDescriptor,
        context: &DeploymentContext,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut domains = Vec::new();

        for raw in descriptor.raw_domains()? {
            let spec = DomainSpec::from_raw(raw, &context.stage)?;

            if !seen.insert(spec.domain_name().to_string()) {
                return Err(ConfigError::DuplicateDomain {
                    domain: spec.domain_name().to_string(),
                });
            }

            if !spec.is_enabled() {
                info!(
                    domain = %spec.domain_name(),
                    "Domain generation for {} has been disabled. Skipping...",
                    spec.domain_name()
                );
                continue;
            }

            domains.push(spec);
        }

        Ok(Self { domains })
    }

    /// Build a set directly from specs, dropping disabled ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateDomain`] if a domain name appears twice.
    pub fn from_specs(specs: Vec<DomainSpec>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut domains = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.domain_name().to_string()) {
                return Err(ConfigError::DuplicateDomain {
                    domain: spec.domain_name().to_string(),
                });
            }
            if spec.is_enabled() {
                domains.push(spec);
            }
        }
        Ok(Self { domains })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    #[must_use]
    pub fn get(&self, domain_name: &str) -> Option<&DomainSpec> {
        self.domains
            .iter()
            .find(|spec| spec.domain_name() == domain_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainSpec> {
        self.domains.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DomainSpec> {
        self.domains.iter_mut()
    }
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod domain_tests;
