// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Request and response shapes exchanged with the remote collaborators.
//!
//! The REST (v1) and websocket (v2) gateway APIs describe the same concepts
//! with different shapes and casing; both are kept as the provider sends them
//! and normalized by the reconcilers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{EndpointType, SecurityPolicy};

// ============================================================================
// Domain registration
// ============================================================================

/// Custom domain as described by the websocket (v2) API.
///
/// This is also the shape returned when looking a domain up, whatever its
/// protocol family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainNameDescription {
    pub domain_name: String,
    #[serde(default)]
    pub domain_name_configurations: Vec<DomainNameConfiguration>,
}

/// One endpoint configuration of a v2 custom domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainNameConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_gateway_domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<EndpointType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_policy: Option<SecurityPolicy>,
}

/// Request to create a v2 custom domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDomainNameRequest {
    pub domain_name: String,
    pub domain_name_configurations: Vec<DomainNameConfiguration>,
}

/// Endpoint types of a REST custom domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfiguration {
    pub types: Vec<EndpointType>,
}

/// Request to create a REST (v1) custom domain.
///
/// Exactly one of `certificate_arn` (edge) and `regional_certificate_arn`
/// (regional) is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestDomainRequest {
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_certificate_arn: Option<String>,
    pub endpoint_configuration: EndpointConfiguration,
    pub security_policy: SecurityPolicy,
}

/// REST (v1) custom domain description.
///
/// Edge domains fill the distribution fields, regional domains the regional ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestDomainDescription {
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_hosted_zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_hosted_zone_id: Option<String>,
}

// ============================================================================
// Certificates
// ============================================================================

/// Summary of one issued (or pending) certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateSummary {
    pub certificate_arn: String,
    pub domain_name: String,
}

// ============================================================================
// DNS zones and records
// ============================================================================

/// A hosted DNS zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZone {
    /// Zone id, possibly prefixed with `/hostedzone/`
    pub id: String,
    /// Zone name, usually terminated by a dot
    pub name: String,
    #[serde(default)]
    pub config: HostedZoneConfig,
}

/// Zone visibility.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZoneConfig {
    #[serde(default)]
    pub private_zone: bool,
}

/// Alias record change action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Upsert,
    Delete,
}

impl ChangeAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "UPSERT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of record changes applied atomically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    pub changes: Vec<Change>,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    pub action: ChangeAction,
    pub resource_record_set: ResourceRecordSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordSet {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub alias_target: AliasTarget,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    pub evaluate_target_health: bool,
    pub hosted_zone_id: String,
}

// ============================================================================
// API mappings
// ============================================================================

/// A websocket (v2) API mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiMapping {
    pub api_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_mapping_id: Option<String>,
    #[serde(default)]
    pub api_mapping_key: String,
    pub stage: String,
}

/// Request to create a v2 API mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateApiMappingRequest {
    pub api_id: String,
    pub api_mapping_key: String,
    pub domain_name: String,
    pub stage: String,
}

/// Request to update a v2 API mapping in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateApiMappingRequest {
    pub api_id: String,
    pub api_mapping_id: String,
    pub api_mapping_key: String,
    pub domain_name: String,
    pub stage: String,
}

/// A REST (v1) base path mapping.
///
/// REST mappings have no mapping id; they are addressed by base path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasePathMapping {
    #[serde(default)]
    pub base_path: String,
    pub rest_api_id: String,
    #[serde(default)]
    pub stage: String,
}

// ============================================================================
// Stack inspection
// ============================================================================

/// One resource of the deployment stack.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackResourceDetail {
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}
