// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosted zone resolution.
//!
//! The zone holding a domain's alias records is the most specific zone that
//! is an ancestor of (or equal to) the domain name. Labels are compared from
//! the right, so `example.com.` covers `api.example.com` but not
//! `api.badexample.com`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::HOSTED_ZONE_ID_PREFIX;
use crate::domain::DomainSpec;
use crate::domain_errors::{DomainError, RemoteError, ZoneError};
use crate::services::{DnsZoneService, HostedZone};

/// Finds the hosted zone of a domain.
#[derive(Clone)]
pub struct DnsZoneResolver {
    dns: Arc<dyn DnsZoneService>,
}

impl DnsZoneResolver {
    pub fn new(dns: Arc<dyn DnsZoneService>) -> Self {
        Self { dns }
    }

    /// Resolve the zone id for a domain spec.
    ///
    /// # Errors
    ///
    /// See [`DnsZoneResolver::resolve`].
    pub async fn resolve_for(&self, spec: &DomainSpec) -> Result<String, DomainError> {
        self.resolve(
            spec.domain_name(),
            spec.hosted_zone_id(),
            spec.hosted_zone_private(),
        )
        .await
    }

    /// Resolve the zone id for `domain_name`.
    ///
    /// # Arguments
    ///
    /// * `domain_name` - The custom domain
    /// * `explicit_zone_id` - Returned unchanged when given
    /// * `private` - Only consider private (`Some(true)`) or public (`Some(false)`) zones
    ///
    /// # Returns
    ///
    /// The zone id without its `/hostedzone/` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] if the listing was throttled,
    /// [`ZoneError::ListFailed`] for any other listing failure and
    /// [`ZoneError::NotFound`] when no zone is an ancestor of the domain.
    pub async fn resolve(
        &self,
        domain_name: &str,
        explicit_zone_id: Option<&str>,
        private: Option<bool>,
    ) -> Result<String, DomainError> {
        if let Some(zone_id) = explicit_zone_id {
            info!(domain = %domain_name, "Selected specific hostedZoneId {zone_id}");
            return Ok(zone_id.to_string());
        }

        match private {
            Some(true) => info!(domain = %domain_name, "Filtering to only private zones."),
            Some(false) => info!(domain = %domain_name, "Filtering to only public zones."),
            None => {}
        }

        let zones = self.dns.list_hosted_zones().await.map_err(|e| match e {
            RemoteError::Throttled { operation } => DomainError::Throttled { operation },
            other => ZoneError::ListFailed {
                reason: other.to_string(),
            }
            .into(),
        })?;

        let zone = select_zone(&zones, domain_name, private).ok_or_else(|| ZoneError::NotFound {
            domain: domain_name.to_string(),
        })?;

        let zone_id = strip_zone_id(&zone.id);
        debug!(domain = %domain_name, zone = %zone.name, zone_id = zone_id, "Resolved hosted zone");
        Ok(zone_id.to_string())
    }
}

/// Pick the most specific zone covering `domain_name`.
///
/// Among zones of the same length the first listed wins.
#[must_use]
pub fn select_zone<'a>(
    zones: &'a [HostedZone],
    domain_name: &str,
    private: Option<bool>,
) -> Option<&'a HostedZone> {
    let domain_labels: Vec<&str> = domain_name.trim_end_matches('.').rsplit('.').collect();
    let mut best: Option<(usize, &HostedZone)> = None;

    for zone in zones {
        if private.is_some_and(|private| private != zone.config.private_zone) {
            continue;
        }

        let zone_name = zone.name.strip_suffix('.').unwrap_or(&zone.name);
        if zone_name.is_empty() {
            continue;
        }

        let zone_labels: Vec<&str> = zone_name.rsplit('.').collect();
        if zone_labels.len() > domain_labels.len() {
            continue;
        }

        let is_ancestor = zone_labels
            .iter()
            .zip(&domain_labels)
            .all(|(zone_label, domain_label)| zone_label.eq_ignore_ascii_case(domain_label));
        if !is_ancestor {
            continue;
        }

        if best.is_none_or(|(best_length, _)| zone_name.len() > best_length) {
            best = Some((zone_name.len(), zone));
        }
    }

    best.map(|(_, zone)| zone)
}

/// Strip the provider path prefix from a zone id.
///
/// `/hostedzone/Z123` becomes `Z123`; ids without the prefix are unchanged.
#[must_use]
pub fn strip_zone_id(zone_id: &str) -> &str {
    zone_id
        .strip_prefix(HOSTED_ZONE_ID_PREFIX)
        .unwrap_or(zone_id)
}

#[cfg(test)]
#[path = "hosted_zone_tests.rs"]
mod hosted_zone_tests;
