// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Alias record synchronization.
//!
//! A custom domain is published through one IPv4 and one IPv6 alias record
//! pointing at the domain's alias target. Both records are changed in a single
//! batch so that they are created or removed together.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{ALIAS_RECORD_TYPES, RECORD_CHANGE_COMMENT};
use crate::domain::{DomainAlias, DomainSpec};
use crate::domain_errors::{DomainError, RecordError, RemoteError};
use crate::reconcilers::hosted_zone::DnsZoneResolver;
use crate::services::{AliasTarget, Change, ChangeAction, ChangeBatch, DnsZoneService, ResourceRecordSet};

/// What happened to a domain's alias records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The batch was applied to this zone
    Changed { hosted_zone_id: String },
    /// The domain does not manage DNS records
    Skipped,
}

/// Upserts and deletes the alias records of custom domains.
#[derive(Clone)]
pub struct DnsRecordSynchronizer {
    dns: Arc<dyn DnsZoneService>,
    zones: DnsZoneResolver,
}

impl DnsRecordSynchronizer {
    pub fn new(dns: Arc<dyn DnsZoneService>) -> Self {
        Self {
            zones: DnsZoneResolver::new(dns.clone()),
            dns,
        }
    }

    /// Apply `action` to the alias records of `spec`.
    ///
    /// Domains with `createRoute53Record: false` are skipped without any
    /// remote call.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingAliasTarget`] if the domain has no alias yet,
    /// zone resolution errors, [`DomainError::Throttled`] when throttled and
    /// [`RecordError::ChangeFailed`] if the batch is rejected.
    pub async fn change(
        &self,
        action: ChangeAction,
        spec: &DomainSpec,
    ) -> Result<RecordOutcome, DomainError> {
        let domain = spec.domain_name();

        if !spec.creates_dns_record() {
            info!(domain = %domain, "Skipping creation of Route53 record.");
            return Ok(RecordOutcome::Skipped);
        }

        let alias = spec.alias().ok_or_else(|| RecordError::MissingAliasTarget {
            domain: domain.to_string(),
        })?;

        let hosted_zone_id = self.zones.resolve_for(spec).await?;
        let batch = alias_change_batch(action, domain, alias);

        debug!(
            domain = %domain,
            action = %action,
            zone_id = %hosted_zone_id,
            target = %alias.target,
            "Submitting alias record change"
        );

        self.dns
            .change_resource_record_sets(&hosted_zone_id, &batch)
            .await
            .map_err(|e| match e {
                RemoteError::Throttled { operation } => DomainError::Throttled { operation },
                other => RecordError::ChangeFailed {
                    action: action.to_string(),
                    domain: domain.to_string(),
                    reason: other.to_string(),
                }
                .into(),
            })?;

        Ok(RecordOutcome::Changed { hosted_zone_id })
    }
}

/// One change per alias record type, all for the same target.
#[must_use]
pub fn alias_change_batch(action: ChangeAction, domain_name: &str, alias: &DomainAlias) -> ChangeBatch {
    let changes = ALIAS_RECORD_TYPES
        .iter()
        .map(|record_type| Change {
            action,
            resource_record_set: ResourceRecordSet {
                name: domain_name.to_string(),
                record_type: (*record_type).to_string(),
                alias_target: AliasTarget {
                    dns_name: alias.target.clone(),
                    evaluate_target_health: false,
                    hosted_zone_id: alias.hosted_zone_id.clone(),
                },
            },
        })
        .collect();

    ChangeBatch {
        changes,
        comment: RECORD_CHANGE_COMMENT.to_string(),
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
