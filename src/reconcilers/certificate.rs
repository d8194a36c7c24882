// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TLS certificate selection.
//!
//! Certificates are never issued here; one of the already requested
//! certificates is picked for the domain:
//!
//! 1. An explicit `certificateArn` is used as is, without any remote call.
//! 2. Otherwise certificates are listed in the region the domain needs
//!    (`us-east-1` for edge domains, the deployment region for regional ones).
//! 3. With `certificateName`, the certificate whose domain name equals it wins.
//! 4. Without it, the certificate with the longest domain name that is a
//!    suffix of the domain wins. A leading `*` is ignored when comparing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{CERTIFICATE_STATUSES, EDGE_CERTIFICATE_REGION, WILDCARD_PREFIX};
use crate::domain::DomainSpec;
use crate::domain_errors::{CertificateError, DomainError, RemoteError};
use crate::services::{CertificateService, CertificateSummary};

/// Picks the certificate to attach to a custom domain.
#[derive(Clone)]
pub struct CertificateResolver {
    certificates: Arc<dyn CertificateService>,
    deployment_region: String,
}

impl CertificateResolver {
    pub fn new(certificates: Arc<dyn CertificateService>, deployment_region: impl Into<String>) -> Self {
        Self {
            certificates,
            deployment_region: deployment_region.into(),
        }
    }

    /// Region certificates must live in for this domain.
    #[must_use]
    pub fn region_for(&self, spec: &DomainSpec) -> &str {
        if spec.is_regional() {
            &self.deployment_region
        } else {
            EDGE_CERTIFICATE_REGION
        }
    }

    /// Resolve the certificate ARN for `spec`.
    ///
    /// The caller records the result with [`DomainSpec::set_certificate_arn`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] if the listing was throttled,
    /// [`CertificateError::ListFailed`] for any other listing failure and
    /// [`CertificateError::NotFound`] when no certificate matches.
    pub async fn resolve(&self, spec: &DomainSpec) -> Result<String, DomainError> {
        if let Some(arn) = spec.certificate_arn() {
            info!(
                domain = %spec.domain_name(),
                "Selected specific certificateArn {arn}"
            );
            return Ok(arn.to_string());
        }

        let region = self.region_for(spec);
        debug!(domain = %spec.domain_name(), region = region, "Listing certificates");

        let certificates = self
            .certificates
            .list_certificates(&CERTIFICATE_STATUSES, region)
            .await
            .map_err(|e| match e {
                RemoteError::Throttled { operation } => DomainError::Throttled { operation },
                other => CertificateError::ListFailed {
                    region: region.to_string(),
                    reason: other.to_string(),
                }
                .into(),
            })?;

        let selected = match spec.certificate_name() {
            Some(name) => find_by_name(&certificates, name),
            None => find_longest_suffix(&certificates, spec.domain_name()),
        };

        match selected {
            Some(certificate) => {
                debug!(
                    domain = %spec.domain_name(),
                    certificate = %certificate.domain_name,
                    arn = %certificate.certificate_arn,
                    "Selected certificate"
                );
                Ok(certificate.certificate_arn.clone())
            }
            None => Err(CertificateError::NotFound {
                name: spec
                    .certificate_name()
                    .unwrap_or(spec.domain_name())
                    .to_string(),
            }
            .into()),
        }
    }
}

/// The certificate whose domain name is exactly `name`.
#[must_use]
pub fn find_by_name<'a>(
    certificates: &'a [CertificateSummary],
    name: &str,
) -> Option<&'a CertificateSummary> {
    certificates
        .iter()
        .find(|certificate| certificate.domain_name == name)
}

/// The certificate with the longest domain name covering `domain_name`.
///
/// Equal lengths are broken by the lexicographically smallest ARN so the
/// choice does not depend on listing order.
#[must_use]
pub fn find_longest_suffix<'a>(
    certificates: &'a [CertificateSummary],
    domain_name: &str,
) -> Option<&'a CertificateSummary> {
    let domain_name = domain_name.to_ascii_lowercase();
    let mut best: Option<(usize, &CertificateSummary)> = None;

    for certificate in certificates {
        let candidate = certificate
            .domain_name
            .strip_prefix(WILDCARD_PREFIX)
            .unwrap_or(&certificate.domain_name)
            .to_ascii_lowercase();

        if !covers(&domain_name, &candidate) {
            continue;
        }

        let length = candidate.len();
        let better = match best {
            None => true,
            Some((best_length, current)) => {
                length > best_length
                    || (length == best_length
                        && certificate.certificate_arn < current.certificate_arn)
            }
        };
        if better {
            best = Some((length, certificate));
        }
    }

    best.map(|(_, certificate)| certificate)
}

/// Whether `candidate` is a suffix of `domain_name` on a label boundary.
///
/// `candidate` is either a full name (`example.com`) or a stripped wildcard
/// (`.example.com`).
fn covers(domain_name: &str, candidate: &str) -> bool {
    if candidate.is_empty() || candidate == "." {
        return false;
    }
    if candidate.starts_with('.') {
        return domain_name.ends_with(candidate);
    }
    domain_name == candidate
        || domain_name
            .strip_suffix(candidate)
            .is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
