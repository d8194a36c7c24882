// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lifecycle operations over the whole domain set.
//!
//! Domains are processed strictly one after the other. Each domain runs to
//! completion or to an isolated failure; a failing domain is recorded in the
//! [`RunReport`] and the next domain is processed as if nothing happened.
//!
//! # Create
//!
//! ```text
//! lookup ─┬─ found ─────► skip ("already exists")
//!         └─ not found ─► resolve certificate ─► create domain ─► upsert records
//! ```
//!
//! # Delete
//!
//! ```text
//! lookup ─┬─ found ─────► delete domain ─► delete records
//!         └─ not found ─► skip ("couldn't find")
//! ```
//!
//! Every remote step is wrapped in [`retry_throttled`]: a throttled step is
//! retried in place and the steps already completed for the domain are kept.
//! This is the only layer that turns errors into report entries.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DeploymentContext;
use crate::domain::{DomainAlias, DomainSet, DomainSpec};
use crate::domain_errors::DomainError;
use crate::metrics;
use crate::reconcilers::certificate::CertificateResolver;
use crate::reconcilers::mappings::{MappingOutcome, MappingReconciler};
use crate::reconcilers::records::DnsRecordSynchronizer;
use crate::reconcilers::registrar::DomainRegistrar;
use crate::reconcilers::retry::{retry_throttled, ThrottlePolicy};
use crate::report::{DomainOutcome, OutcomeStatus, RunReport, SummaryEntry};
use crate::services::{ChangeAction, Services};

/// Message logged when the active domain set is empty.
pub const NO_DOMAINS_ENABLED: &str =
    "No domains are enabled. To use Domain Manager pass 'enabled: true' in your serverless.yaml";

/// The operations exposed to the deployment lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleOperation {
    /// Create missing domains and their alias records
    CreateDomains,
    /// Delete domains and their alias records
    DeleteDomains,
    /// Converge API mappings (after deploy)
    SyncMappings,
    /// Delete API mappings (before removal)
    RemoveMappings,
    /// Print the alias of every domain (after info)
    Summarize,
}

impl LifecycleOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateDomains => "create-domains",
            Self::DeleteDomains => "delete-domains",
            Self::SyncMappings => "sync-mappings",
            Self::RemoveMappings => "remove-mappings",
            Self::Summarize => "summarize",
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives the reconcilers across a [`DomainSet`].
pub struct DomainSetOrchestrator {
    certificates: CertificateResolver,
    registrar: DomainRegistrar,
    records: DnsRecordSynchronizer,
    mappings: MappingReconciler,
    policy: ThrottlePolicy,
    cancel: CancellationToken,
}

impl DomainSetOrchestrator {
    /// Wire every reconciler to the given collaborators.
    pub fn new(services: &Services, context: &DeploymentContext) -> Self {
        Self {
            certificates: CertificateResolver::new(
                services.certificates.clone(),
                context.region.clone(),
            ),
            registrar: DomainRegistrar::new(services.registration.clone()),
            records: DnsRecordSynchronizer::new(services.dns.clone()),
            mappings: MappingReconciler::new(
                services.mappings.clone(),
                services.stacks.clone(),
                context.clone(),
            ),
            policy: ThrottlePolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_throttle_policy(mut self, policy: ThrottlePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use `cancel` to interrupt throttle waits and stop before the next domain.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one lifecycle operation over `domains`.
    pub async fn run(&self, operation: LifecycleOperation, domains: &mut DomainSet) -> RunReport {
        let start = Instant::now();
        info!(operation = %operation, domains = domains.len(), "Starting lifecycle operation");

        if domains.is_empty() {
            info!("{NO_DOMAINS_ENABLED}");
        }

        let report = match operation {
            LifecycleOperation::CreateDomains => self.create_domains(domains).await,
            LifecycleOperation::DeleteDomains => self.delete_domains(domains).await,
            LifecycleOperation::SyncMappings => self.sync_mappings(domains).await,
            LifecycleOperation::RemoveMappings => self.remove_mappings(domains).await,
            LifecycleOperation::Summarize => self.summarize(domains).await,
        };

        metrics::record_run_duration(operation.as_str(), start.elapsed());
        info!(
            operation = %operation,
            succeeded = report.count(OutcomeStatus::Succeeded),
            skipped = report.count(OutcomeStatus::Skipped),
            failed = report.count(OutcomeStatus::Failed),
            elapsed = ?start.elapsed(),
            "Lifecycle operation finished"
        );
        report
    }

    /// Create every domain that does not exist yet.
    pub async fn create_domains(&self, domains: &mut DomainSet) -> RunReport {
        let operation = LifecycleOperation::CreateDomains;
        let mut report = RunReport::new(operation.as_str());

        for spec in domains.iter_mut() {
            let name = spec.domain_name().to_string();
            let outcome = match self.interrupted(operation) {
                Some(error) => Err(error),
                None => self.create_domain(spec).await,
            };
            let outcome = outcome.unwrap_or_else(|error| {
                failure(&name, format!("Unable to create {name}."), &error)
            });
            record(&mut report, operation, outcome);
        }

        report.finish();
        report
    }

    async fn create_domain(&self, spec: &mut DomainSpec) -> Result<DomainOutcome, DomainError> {
        let name = spec.domain_name().to_string();

        let existing = self.lookup(spec).await;
        match existing {
            Ok(alias) => {
                spec.set_alias(alias);
                return Ok(DomainOutcome::skipped(
                    &name,
                    format!("Domain {name} already exists. Skipping..."),
                ));
            }
            Err(error) if error.is_not_found() => {
                debug!(domain = %name, "Domain {name} not found. Creating...");
            }
            Err(error) => return Err(error),
        }

        let certificates = &self.certificates;
        let current: &DomainSpec = spec;
        let certificate_arn = self
            .step(&format!("resolve certificate for {name}"), move || {
                certificates.resolve(current)
            })
            .await?;
        spec.set_certificate_arn(certificate_arn);

        let registrar = &self.registrar;
        let current: &DomainSpec = spec;
        let alias = self
            .step(&format!("create domain {name}"), move || registrar.create(current))
            .await?;
        spec.set_alias(alias);

        let records = &self.records;
        let current: &DomainSpec = spec;
        self.step(&format!("upsert records for {name}"), move || {
            records.change(ChangeAction::Upsert, current)
        })
        .await?;

        Ok(DomainOutcome::succeeded(
            &name,
            format!("{name} was created. Could take up to 40 minutes to be initialized."),
        ))
    }

    /// Delete every domain that exists, with its alias records.
    pub async fn delete_domains(&self, domains: &mut DomainSet) -> RunReport {
        let operation = LifecycleOperation::DeleteDomains;
        let mut report = RunReport::new(operation.as_str());

        for spec in domains.iter_mut() {
            let name = spec.domain_name().to_string();
            let outcome = match self.interrupted(operation) {
                Some(error) => Err(error),
                None => self.delete_domain(spec).await,
            };
            let outcome = outcome.unwrap_or_else(|error| {
                failure(&name, format!("Unable to delete {name}."), &error)
            });
            record(&mut report, operation, outcome);
        }

        report.finish();
        report
    }

    async fn delete_domain(&self, spec: &mut DomainSpec) -> Result<DomainOutcome, DomainError> {
        let name = spec.domain_name().to_string();

        let existing = self.lookup(spec).await;
        match existing {
            Ok(alias) => spec.set_alias(alias),
            Err(error) if error.is_not_found() => {
                return Ok(DomainOutcome::skipped(
                    &name,
                    format!("Couldn't find {name}. Skipping delete..."),
                ));
            }
            Err(error) => return Err(error),
        }

        let registrar = &self.registrar;
        let current: &DomainSpec = spec;
        self.step(&format!("delete domain {name}"), move || registrar.delete(current))
            .await?;

        let records = &self.records;
        self.step(&format!("delete records for {name}"), move || {
            records.change(ChangeAction::Delete, current)
        })
        .await?;

        Ok(DomainOutcome::succeeded(&name, format!("Domain {name} was deleted.")))
    }

    /// Converge the API mapping of every domain, then summarize if anything changed.
    ///
    /// Created or updated mappings also export the domain's alias as stack outputs.
    pub async fn sync_mappings(&self, domains: &mut DomainSet) -> RunReport {
        let operation = LifecycleOperation::SyncMappings;
        let mut report = RunReport::new(operation.as_str());
        let mut changed = 0usize;

        for spec in domains.iter_mut() {
            let name = spec.domain_name().to_string();
            let outcome = match self.interrupted(operation) {
                Some(error) => Err(error),
                None => self.sync_mapping(spec).await,
            };

            let outcome = match outcome {
                Ok(mapping_outcome) => {
                    if mapping_outcome != MappingOutcome::Unchanged {
                        changed += 1;
                        self.export_outputs(spec, &mut report).await;
                    }
                    mapping_message(&name, spec, &mapping_outcome)
                }
                Err(error) => failure(&name, format!("Unable to sync mapping for {name}."), &error),
            };
            record(&mut report, operation, outcome);
        }

        if changed > 0 {
            let entries = self.summary_entries(domains).await;
            report.set_summary(entries);
        }

        report.finish();
        report
    }

    async fn sync_mapping(&self, spec: &DomainSpec) -> Result<MappingOutcome, DomainError> {
        let name = spec.domain_name();
        let mappings = &self.mappings;

        let api_id = self
            .step(&format!("resolve API id for {name}"), move || {
                mappings.resolve_api_id(spec)
            })
            .await?;

        let api = api_id.as_str();
        let current = self
            .step(&format!("get mappings for {name}"), move || {
                mappings.current_mapping(api, spec)
            })
            .await?;

        let current = current.as_ref();
        self.step(&format!("converge mapping for {name}"), move || {
            mappings.converge(api, current, spec)
        })
        .await
    }

    /// Look up the alias of a changed domain and record it as stack outputs.
    async fn export_outputs(&self, spec: &mut DomainSpec, report: &mut RunReport) {
        let lookup = self.lookup(spec).await;
        match lookup {
            Ok(alias) => {
                report.add_output(spec.domain_name(), &alias);
                spec.set_alias(alias);
            }
            Err(error) => {
                debug!(
                    domain = %spec.domain_name(),
                    error = %error,
                    "Unable to read alias for stack outputs"
                );
            }
        }
    }

    /// Delete the API mapping of every domain.
    pub async fn remove_mappings(&self, domains: &mut DomainSet) -> RunReport {
        let operation = LifecycleOperation::RemoveMappings;
        let mut report = RunReport::new(operation.as_str());

        for spec in domains.iter() {
            let name = spec.domain_name().to_string();
            let outcome = match self.interrupted(operation) {
                Some(error) => Err(error),
                None => self.remove_mapping(spec).await,
            };
            let outcome = outcome.unwrap_or_else(|error| {
                failure(&name, format!("Unable to remove mapping for {name}."), &error)
            });
            record(&mut report, operation, outcome);
        }

        report.finish();
        report
    }

    async fn remove_mapping(&self, spec: &DomainSpec) -> Result<DomainOutcome, DomainError> {
        let name = spec.domain_name();
        let mappings = &self.mappings;
        let not_found = || {
            DomainOutcome::skipped(name, format!("Mappings for domain {name} not found. Skipping..."))
        };

        let api_id = self
            .step(&format!("resolve API id for {name}"), move || {
                mappings.resolve_api_id(spec)
            })
            .await?;

        let api = api_id.as_str();
        let current = match self
            .step(&format!("get mappings for {name}"), move || {
                mappings.current_mapping(api, spec)
            })
            .await
        {
            Ok(Some(current)) => current,
            Ok(None) => return Ok(not_found()),
            Err(error) if error.is_not_found() => return Ok(not_found()),
            Err(error) => return Err(error),
        };

        let current = &current;
        match self
            .step(&format!("delete mapping for {name}"), move || {
                mappings.delete(current, spec)
            })
            .await
        {
            Ok(()) => Ok(DomainOutcome::succeeded(
                name,
                format!("Removed mapping for {name}."),
            )),
            Err(error) if error.is_not_found() => Ok(not_found()),
            Err(error) => Err(error),
        }
    }

    /// Summarize the alias of every domain.
    pub async fn summarize(&self, domains: &mut DomainSet) -> RunReport {
        let mut report = RunReport::new(LifecycleOperation::Summarize.as_str());
        let entries = self.summary_entries(domains).await;
        report.set_summary(entries);
        report.finish();
        report
    }

    async fn summary_entries(&self, domains: &mut DomainSet) -> Vec<SummaryEntry> {
        let operation = LifecycleOperation::Summarize.as_str();
        let mut entries = Vec::with_capacity(domains.len());

        for spec in domains.iter_mut() {
            let name = spec.domain_name().to_string();

            if !spec.creates_dns_record() {
                metrics::record_domain_outcome(operation, OutcomeStatus::Skipped.as_str());
                entries.push(SummaryEntry::notice(&name, "Route53 record not created."));
                continue;
            }

            let lookup = self.lookup(spec).await;
            match lookup {
                Ok(alias) => {
                    metrics::record_domain_outcome(operation, OutcomeStatus::Succeeded.as_str());
                    entries.push(SummaryEntry::alias(&name, spec.api_type(), &alias));
                    spec.set_alias(alias);
                }
                Err(error) => {
                    debug!(domain = %name, error = %error, "Summary lookup failed");
                    metrics::record_domain_outcome(operation, OutcomeStatus::Failed.as_str());
                    entries.push(SummaryEntry::notice(
                        &name,
                        format!("Unable to print summary for {name}"),
                    ));
                }
            }
        }

        entries
    }

    /// Throttle-aware alias lookup shared by every operation.
    async fn lookup(&self, spec: &DomainSpec) -> Result<DomainAlias, DomainError> {
        let registrar = &self.registrar;
        self.step(&format!("lookup domain {}", spec.domain_name()), move || {
            registrar.lookup(spec)
        })
        .await
    }

    async fn step<T, F, Fut>(&self, operation: &str, step: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        retry_throttled(&self.policy, &self.cancel, operation, step).await
    }

    /// `Some` once the run was cancelled; remaining domains are not touched.
    fn interrupted(&self, operation: LifecycleOperation) -> Option<DomainError> {
        self.cancel.is_cancelled().then(|| DomainError::Cancelled {
            operation: operation.to_string(),
        })
    }
}

fn mapping_message(name: &str, spec: &DomainSpec, outcome: &MappingOutcome) -> DomainOutcome {
    match outcome {
        MappingOutcome::Created => {
            DomainOutcome::succeeded(name, format!("Created API mapping for {name}."))
        }
        MappingOutcome::Updated { previous_base_path } => DomainOutcome::succeeded(
            name,
            format!(
                "Updated API mapping for {name} from '{previous_base_path}' to '{}'.",
                spec.base_path()
            ),
        ),
        MappingOutcome::Unchanged => DomainOutcome::skipped(
            name,
            format!("Path for {name} is already current. Skipping..."),
        ),
    }
}

/// Downgrade an error into the domain's report entry.
fn failure(name: &str, message: String, error: &DomainError) -> DomainOutcome {
    warn!(domain = %name, reason = error.status_reason(), "{message}");
    debug!(domain = %name, error = %error, "Failure detail");
    DomainOutcome::failed(
        name,
        format!("{message} Run with --debug for more info."),
        error,
    )
}

fn record(report: &mut RunReport, operation: LifecycleOperation, outcome: DomainOutcome) {
    metrics::record_domain_outcome(operation.as_str(), outcome.status.as_str());
    report.push(outcome);
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
