// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom domain resource management.
//!
//! REST domains are created through the v1 API, websocket domains through the
//! v2 API. Both answer with different shapes; this module normalizes them into
//! a [`DomainAlias`] (alias target + alias hosted zone id).
//!
//! Lookups always go through the v2 API, which describes domains of either
//! family.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::FALLBACK_ALIAS_HOSTED_ZONE_ID;
use crate::domain::{DomainAlias, DomainSpec, EndpointType};
use crate::domain_errors::{DomainError, RegistrarError, RemoteError};
use crate::services::{
    CreateDomainNameRequest, CreateRestDomainRequest, DomainNameConfiguration,
    DomainNameDescription, DomainRegistrationService, EndpointConfiguration,
    RestDomainDescription,
};

/// Creates, describes and deletes custom domain resources.
#[derive(Clone)]
pub struct DomainRegistrar {
    registration: Arc<dyn DomainRegistrationService>,
}

impl DomainRegistrar {
    pub fn new(registration: Arc<dyn DomainRegistrationService>) -> Self {
        Self { registration }
    }

    /// Fetch the alias of an existing domain.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the domain does not exist, which
    /// callers use to decide to create it, [`DomainError::Throttled`] when
    /// throttled and [`RegistrarError::LookupFailed`] otherwise.
    pub async fn lookup(&self, spec: &DomainSpec) -> Result<DomainAlias, DomainError> {
        let domain = spec.domain_name();

        let description = self
            .registration
            .get_domain_name(domain)
            .await
            .map_err(|e| {
                e.escalate(|reason| {
                    RegistrarError::LookupFailed {
                        domain: domain.to_string(),
                        reason,
                    }
                    .into()
                })
            })?;

        Ok(alias_from_description(domain, &description)?)
    }

    /// Create the domain resource.
    ///
    /// `spec` must carry a resolved certificate ARN.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] when throttled and
    /// [`RegistrarError::CreateFailed`] or [`RegistrarError::MalformedResponse`]
    /// otherwise.
    pub async fn create(&self, spec: &DomainSpec) -> Result<DomainAlias, DomainError> {
        let domain = spec.domain_name();
        let create_failed = |reason: String| -> DomainError {
            RegistrarError::CreateFailed {
                domain: domain.to_string(),
                reason,
            }
            .into()
        };

        let Some(certificate_arn) = spec.certificate_arn() else {
            return Err(create_failed("no certificate was resolved".to_string()));
        };

        let alias = if spec.is_websocket() {
            let request = websocket_request(spec, certificate_arn);
            debug!(domain = %domain, "Creating websocket custom domain");
            let description = self
                .registration
                .create_domain_name(&request)
                .await
                .map_err(|e| escalate_create(e, create_failed))?;
            alias_from_description(domain, &description)?
        } else {
            let request = rest_request(spec, certificate_arn);
            debug!(domain = %domain, endpoint_type = %spec.endpoint_type(), "Creating REST custom domain");
            let description = self
                .registration
                .create_rest_domain_name(&request)
                .await
                .map_err(|e| escalate_create(e, create_failed))?;
            alias_from_rest(domain, spec.endpoint_type(), &description)?
        };

        info!(domain = %domain, target = %alias.target, "Custom domain created");
        Ok(alias)
    }

    /// Delete the domain resource.
    ///
    /// A domain that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] when throttled and
    /// [`RegistrarError::DeleteFailed`] otherwise.
    pub async fn delete(&self, spec: &DomainSpec) -> Result<(), DomainError> {
        let domain = spec.domain_name();

        match self.registration.delete_domain_name(domain).await {
            Ok(()) => {
                info!(domain = %domain, "Custom domain deleted");
                Ok(())
            }
            Err(RemoteError::NotFound { .. }) => {
                debug!(domain = %domain, "Custom domain already absent");
                Ok(())
            }
            Err(e) => Err(e.escalate(|reason| {
                RegistrarError::DeleteFailed {
                    domain: domain.to_string(),
                    reason,
                }
                .into()
            })),
        }
    }
}

/// On create, a missing resource is a failure like any other.
fn escalate_create<F>(error: RemoteError, create_failed: F) -> DomainError
where
    F: FnOnce(String) -> DomainError,
{
    match error {
        RemoteError::Throttled { operation } => DomainError::Throttled { operation },
        other => create_failed(other.to_string()),
    }
}

/// Build the v1 request; the certificate goes in the slot of the endpoint type.
#[must_use]
pub fn rest_request(spec: &DomainSpec, certificate_arn: &str) -> CreateRestDomainRequest {
    let (certificate_arn, regional_certificate_arn) = match spec.endpoint_type() {
        EndpointType::Edge => (Some(certificate_arn.to_string()), None),
        EndpointType::Regional => (None, Some(certificate_arn.to_string())),
    };

    CreateRestDomainRequest {
        domain_name: spec.domain_name().to_string(),
        certificate_arn,
        regional_certificate_arn,
        endpoint_configuration: EndpointConfiguration {
            types: vec![spec.endpoint_type()],
        },
        security_policy: spec.security_policy(),
    }
}

/// Build the v2 request for a websocket domain.
#[must_use]
pub fn websocket_request(spec: &DomainSpec, certificate_arn: &str) -> CreateDomainNameRequest {
    CreateDomainNameRequest {
        domain_name: spec.domain_name().to_string(),
        domain_name_configurations: vec![DomainNameConfiguration {
            certificate_arn: Some(certificate_arn.to_string()),
            endpoint_type: Some(spec.endpoint_type()),
            security_policy: Some(spec.security_policy()),
            ..Default::default()
        }],
    }
}

/// Normalize a v2 description into an alias.
///
/// # Errors
///
/// Returns [`RegistrarError::MalformedResponse`] if the first endpoint
/// configuration lacks the target or its zone id.
pub fn alias_from_description(
    domain: &str,
    description: &DomainNameDescription,
) -> Result<DomainAlias, RegistrarError> {
    let malformed = |reason: &str| RegistrarError::MalformedResponse {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };

    let configuration = description
        .domain_name_configurations
        .first()
        .ok_or_else(|| malformed("no endpoint configuration"))?;

    let target = configuration
        .api_gateway_domain_name
        .clone()
        .ok_or_else(|| malformed("no gateway domain name"))?;
    let hosted_zone_id = configuration
        .hosted_zone_id
        .clone()
        .ok_or_else(|| malformed("no hosted zone id"))?;

    Ok(DomainAlias {
        target,
        hosted_zone_id,
    })
}

/// Normalize a v1 description into an alias.
///
/// Edge domains answer with distribution fields, regional domains with
/// regional fields. A missing zone id falls back to the edge network's
/// well-known zone.
///
/// # Errors
///
/// Returns [`RegistrarError::MalformedResponse`] if no target is present.
pub fn alias_from_rest(
    domain: &str,
    endpoint_type: EndpointType,
    description: &RestDomainDescription,
) -> Result<DomainAlias, RegistrarError> {
    let (target, zone_id) = match endpoint_type {
        EndpointType::Edge => (
            description
                .distribution_domain_name
                .as_ref()
                .or(description.regional_domain_name.as_ref()),
            description
                .distribution_hosted_zone_id
                .as_ref()
                .or(description.regional_hosted_zone_id.as_ref()),
        ),
        EndpointType::Regional => (
            description
                .regional_domain_name
                .as_ref()
                .or(description.distribution_domain_name.as_ref()),
            description
                .regional_hosted_zone_id
                .as_ref()
                .or(description.distribution_hosted_zone_id.as_ref()),
        ),
    };

    let target = target.ok_or_else(|| RegistrarError::MalformedResponse {
        domain: domain.to_string(),
        reason: "no distribution or regional domain name".to_string(),
    })?;

    Ok(DomainAlias {
        target: target.clone(),
        hosted_zone_id: zone_id
            .cloned()
            .unwrap_or_else(|| FALLBACK_ALIAS_HOSTED_ZONE_ID.to_string()),
    })
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod registrar_tests;
