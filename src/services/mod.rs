// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Remote collaborators of the domain manager.
//!
//! Each remote service is a trait so the reconcilers can be driven by the
//! HTTP client in production and by in-memory fakes in tests:
//!
//! - [`DomainRegistrationService`] - custom domain resources (REST and websocket families)
//! - [`CertificateService`] - certificate listing
//! - [`DnsZoneService`] - hosted zones and alias record changes
//! - [`ApiMappingService`] - API mappings (v2) and base path mappings (v1)
//! - [`StackInspectionService`] - physical ids of deployment stack resources
//!
//! Every call returns `Result<T, RemoteError>`; callers branch on
//! [`RemoteError::NotFound`] and [`RemoteError::Throttled`] instead of
//! inspecting error strings.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain_manager::services::{http::GatewayClient, Services};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GatewayClient::new("http://127.0.0.1:4566", None)?);
//! let services = Services::from_client(client);
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod types;

pub use types::{
    AliasTarget, ApiMapping, BasePathMapping, CertificateSummary, Change, ChangeAction,
    ChangeBatch, CreateApiMappingRequest, CreateDomainNameRequest, CreateRestDomainRequest,
    DomainNameConfiguration, DomainNameDescription, EndpointConfiguration, HostedZone,
    HostedZoneConfig, ResourceRecordSet, RestDomainDescription, StackResourceDetail,
    UpdateApiMappingRequest,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain_errors::RemoteError;

/// Custom domain resources.
#[async_trait]
pub trait DomainRegistrationService: Send + Sync {
    /// Describe an existing custom domain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the domain does not exist.
    async fn get_domain_name(&self, domain_name: &str)
        -> Result<DomainNameDescription, RemoteError>;

    /// Create a REST (v1) custom domain.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the service rejects the request.
    async fn create_rest_domain_name(
        &self,
        request: &CreateRestDomainRequest,
    ) -> Result<RestDomainDescription, RemoteError>;

    /// Create a websocket (v2) custom domain.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the service rejects the request.
    async fn create_domain_name(
        &self,
        request: &CreateDomainNameRequest,
    ) -> Result<DomainNameDescription, RemoteError>;

    /// Delete a custom domain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the domain does not exist.
    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), RemoteError>;
}

/// Certificate listing.
#[async_trait]
pub trait CertificateService: Send + Sync {
    /// List certificates with one of `statuses` in `region`.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the listing fails.
    async fn list_certificates(
        &self,
        statuses: &[&str],
        region: &str,
    ) -> Result<Vec<CertificateSummary>, RemoteError>;
}

/// Hosted zones and alias records.
#[async_trait]
pub trait DnsZoneService: Send + Sync {
    /// List every hosted zone of the account.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the listing fails.
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteError>;

    /// Apply a change batch to a hosted zone.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the batch is rejected.
    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), RemoteError>;
}

/// API mappings of custom domains.
#[async_trait]
pub trait ApiMappingService: Send + Sync {
    /// List the v2 API mappings of a domain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the domain does not exist.
    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, RemoteError>;

    /// Create a v2 API mapping.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the request is rejected.
    async fn create_api_mapping(&self, request: &CreateApiMappingRequest)
        -> Result<(), RemoteError>;

    /// Update a v2 API mapping in place.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the request is rejected.
    async fn update_api_mapping(&self, request: &UpdateApiMappingRequest)
        -> Result<(), RemoteError>;

    /// Delete a v2 API mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the mapping does not exist.
    async fn delete_api_mapping(
        &self,
        domain_name: &str,
        api_mapping_id: &str,
    ) -> Result<(), RemoteError>;

    /// List the v1 base path mappings of a domain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the domain does not exist.
    async fn get_base_path_mappings(
        &self,
        domain_name: &str,
    ) -> Result<Vec<BasePathMapping>, RemoteError>;

    /// Create a v1 base path mapping.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the request is rejected.
    async fn create_base_path_mapping(
        &self,
        domain_name: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError>;

    /// Replace the v1 mapping currently at `current_base_path`.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] if the request is rejected.
    async fn update_base_path_mapping(
        &self,
        domain_name: &str,
        current_base_path: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError>;

    /// Delete the v1 mapping at `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the mapping does not exist.
    async fn delete_base_path_mapping(
        &self,
        domain_name: &str,
        base_path: &str,
    ) -> Result<(), RemoteError>;
}

/// Deployment stack inspection.
#[async_trait]
pub trait StackInspectionService: Send + Sync {
    /// Describe one logical resource of a stack.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the stack or resource does not exist.
    async fn describe_stack_resource(
        &self,
        stack_name: &str,
        logical_resource_id: &str,
    ) -> Result<StackResourceDetail, RemoteError>;
}

/// Handles to every remote collaborator, shared by the reconcilers.
#[derive(Clone)]
pub struct Services {
    pub registration: Arc<dyn DomainRegistrationService>,
    pub certificates: Arc<dyn CertificateService>,
    pub dns: Arc<dyn DnsZoneService>,
    pub mappings: Arc<dyn ApiMappingService>,
    pub stacks: Arc<dyn StackInspectionService>,
}

impl Services {
    /// Use one client that speaks to every collaborator.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: DomainRegistrationService
            + CertificateService
            + DnsZoneService
            + ApiMappingService
            + StackInspectionService
            + 'static,
    {
        Self {
            registration: client.clone(),
            certificates: client.clone(),
            dns: client.clone(),
            mappings: client.clone(),
            stacks: client,
        }
    }
}
