// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for custom domain reconciliation.
//!
//! This module provides specialized error types for:
//! - Deployment descriptor validation (fatal before any remote call)
//! - Certificate selection
//! - Hosted zone resolution and alias record changes
//! - Custom domain registration
//! - API mapping reconciliation
//!
//! Remote collaborators report failures as [`RemoteError`], whose variants are
//! branching signals (`NotFound`, `Throttled`) or real failures (`Service`).
//! Components escalate them into [`DomainError`], the type the orchestrator
//! downgrades into per-domain report entries.

use thiserror::Error;

/// Failure reported by a remote collaborator.
///
/// `NotFound` and `Throttled` are expected outcomes that drive control flow;
/// only `Service` represents a genuine failure of the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The addressed resource does not exist (HTTP 404)
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// The service rejected the call because of rate limiting (HTTP 429)
    #[error("Too many requests while calling {operation}")]
    Throttled {
        /// The remote operation that was throttled
        operation: String,
    },

    /// Any other failure of the remote call
    #[error("{operation} failed: {reason}")]
    Service {
        /// The remote operation that failed
        operation: String,
        /// Error detail returned by the service or transport
        reason: String,
    },
}

impl RemoteError {
    /// Escalate this remote failure into a [`DomainError`].
    ///
    /// `NotFound` and `Throttled` keep their signal meaning; `Service` failures
    /// are wrapped by `wrap` into the calling component's own error type.
    #[must_use]
    pub fn escalate<F>(self, wrap: F) -> DomainError
    where
        F: FnOnce(String) -> DomainError,
    {
        match self {
            Self::NotFound { resource } => DomainError::NotFound { resource },
            Self::Throttled { operation } => DomainError::Throttled { operation },
            Self::Service { operation, reason } => wrap(format!("{operation} failed: {reason}")),
        }
    }
}

/// Errors in the deployment descriptor.
///
/// Any of these aborts the whole run before a remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The descriptor has no `custom.customDomain` section
    #[error("domain-manager: Plugin configuration is missing.")]
    MissingPluginConfig,

    /// A configured domain has no `domainName`
    #[error("domainName is required. Pass it on your serverless.yaml file.")]
    MissingDomainName,

    /// `securityPolicy` is not one of the supported TLS versions
    #[error("{value} is not a supported securityPolicy, use tls_1_0 or tls_1_2.")]
    UnsupportedSecurityPolicy {
        /// The rejected value
        value: String,
    },

    /// `endpointType` is not one of the supported endpoint types
    #[error("{value} is not supported endpointType, use edge or regional.")]
    UnsupportedEndpointType {
        /// The rejected value
        value: String,
    },

    /// A boolean-like field holds something other than a boolean or "true"/"false"
    #[error("domain-manager: Ambiguous boolean for {field}: \"{value}\"")]
    AmbiguousBoolean {
        /// Name of the offending field
        field: String,
        /// The rejected value
        value: String,
    },

    /// The same `domainName` appears more than once
    #[error("domain-manager: Domain {domain} is configured more than once.")]
    DuplicateDomain {
        /// The duplicated domain name
        domain: String,
    },

    /// The descriptor file could not be read
    #[error("Unable to read deployment descriptor {path}: {reason}")]
    Unreadable {
        /// Path of the descriptor
        path: String,
        /// I/O error detail
        reason: String,
    },

    /// The descriptor is not valid YAML/JSON or does not match the schema
    #[error("Malformed deployment descriptor: {reason}")]
    Malformed {
        /// Parser error detail
        reason: String,
    },

    /// The control-plane endpoint is not a valid URL
    #[error("Invalid endpoint '{value}': {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint
        value: String,
        /// Parser error detail
        reason: String,
    },
}

/// Errors that can occur while selecting a TLS certificate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// Listing certificates failed
    #[error("Could not list certificates in region {region}: {reason}")]
    ListFailed {
        /// Region that was queried
        region: String,
        /// Error detail
        reason: String,
    },

    /// No certificate matches the requested name or the domain
    #[error("Could not find the certificate {name}.")]
    NotFound {
        /// The certificate name (or domain name) searched for
        name: String,
    },
}

/// Errors that can occur while resolving a hosted zone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// Listing hosted zones failed
    #[error("Unable to list hosted zones: {reason}")]
    ListFailed {
        /// Error detail
        reason: String,
    },

    /// No hosted zone is an ancestor of the domain name
    #[error("Could not find hosted zone \"{domain}\"")]
    NotFound {
        /// The domain name a zone was searched for
        domain: String,
    },
}

/// Errors that can occur while managing the custom domain resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrarError {
    /// Fetching the domain resource failed for a reason other than absence
    #[error("Unable to fetch information about {domain}: {reason}")]
    LookupFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// Creating the domain resource failed
    #[error("Failed to create custom domain {domain}: {reason}")]
    CreateFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// Deleting the domain resource failed
    #[error("Failed to delete custom domain {domain}: {reason}")]
    DeleteFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// The provider answered with a response missing the alias fields
    #[error("Unexpected response for custom domain {domain}: {reason}")]
    MalformedResponse {
        /// The custom domain name
        domain: String,
        /// What was missing
        reason: String,
    },
}

/// Errors that can occur while changing alias records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The change batch was rejected
    #[error("Failed to {action} A Alias for {domain}: {reason}")]
    ChangeFailed {
        /// `UPSERT` or `DELETE`
        action: String,
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// The domain has no alias target to point records at
    #[error("No alias target known for {domain}")]
    MissingAliasTarget {
        /// The custom domain name
        domain: String,
    },
}

/// Errors that can occur while reconciling API mappings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The stack has no physical id for the API resource
    #[error("No {api_kind} associated with stack {stack}")]
    ApiNotFound {
        /// Stack that was inspected
        stack: String,
        /// `RestApiId` or `WebsocketApiId`
        api_kind: String,
    },

    /// Inspecting the stack failed
    #[error("Failed to find stack resources for {domain} in {stack}: {reason}")]
    StackLookupFailed {
        /// The custom domain name
        domain: String,
        /// Stack that was inspected
        stack: String,
        /// Error detail
        reason: String,
    },

    /// Listing mappings failed
    #[error("Unable to get mappings for {domain}: {reason}")]
    ListFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// Creating a mapping failed
    #[error("Unable to create mapping for {domain}: {reason}")]
    CreateFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// Updating a mapping failed
    #[error("Unable to update mapping for {domain}: {reason}")]
    UpdateFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },

    /// Deleting a mapping failed
    #[error("Unable to remove mapping for {domain}: {reason}")]
    DeleteFailed {
        /// The custom domain name
        domain: String,
        /// Error detail
        reason: String,
    },
}

/// Composite error type for every reconciliation step.
///
/// Components return this type; the orchestrator is the only layer that
/// turns it into a report entry instead of propagating it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Descriptor validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Certificate selection error
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    /// Hosted zone resolution error
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Custom domain registration error
    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    /// Alias record change error
    #[error(transparent)]
    Record(#[from] RecordError),

    /// API mapping error
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Expected absence of a remote resource
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Rate limiting signal; the step may be retried
    #[error("Too many requests while calling {operation}")]
    Throttled {
        /// The throttled operation
        operation: String,
    },

    /// A throttled step kept being throttled until the attempt ceiling
    #[error("{operation} still throttled after {attempts} attempts")]
    RetriesExhausted {
        /// The throttled operation
        operation: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// The run was interrupted while waiting to retry
    #[error("{operation} cancelled while waiting to retry")]
    Cancelled {
        /// The interrupted operation
        operation: String,
    },
}

impl DomainError {
    /// Returns true if this is the rate limiting signal.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    /// Returns true if this is the resource absence signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns a CamelCase reason code for this error.
    ///
    /// Used for structured logging and metric labels.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "InvalidConfiguration",

            Self::Certificate(CertificateError::ListFailed { .. }) => "CertificateListFailed",
            Self::Certificate(CertificateError::NotFound { .. }) => "CertificateNotFound",

            Self::Zone(ZoneError::ListFailed { .. }) => "HostedZoneListFailed",
            Self::Zone(ZoneError::NotFound { .. }) => "HostedZoneNotFound",

            Self::Registrar(RegistrarError::LookupFailed { .. }) => "DomainLookupFailed",
            Self::Registrar(RegistrarError::CreateFailed { .. }) => "DomainCreationFailed",
            Self::Registrar(RegistrarError::DeleteFailed { .. }) => "DomainDeletionFailed",
            Self::Registrar(RegistrarError::MalformedResponse { .. }) => "DomainResponseMalformed",

            Self::Record(RecordError::ChangeFailed { .. }) => "RecordChangeFailed",
            Self::Record(RecordError::MissingAliasTarget { .. }) => "AliasTargetMissing",

            Self::Mapping(MappingError::ApiNotFound { .. }) => "ApiNotFound",
            Self::Mapping(MappingError::StackLookupFailed { .. }) => "StackLookupFailed",
            Self::Mapping(MappingError::ListFailed { .. }) => "MappingListFailed",
            Self::Mapping(MappingError::CreateFailed { .. }) => "MappingCreationFailed",
            Self::Mapping(MappingError::UpdateFailed { .. }) => "MappingUpdateFailed",
            Self::Mapping(MappingError::DeleteFailed { .. }) => "MappingDeletionFailed",

            Self::NotFound { .. } => "NotFound",
            Self::Throttled { .. } => "Throttled",
            Self::RetriesExhausted { .. } => "RetriesExhausted",
            Self::Cancelled { .. } => "Cancelled",
        }
    }
}

#[cfg(test)]
#[path = "domain_errors_tests.rs"]
mod domain_errors_tests;
