// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of custom domains against the remote gateway.
//!
//! Each reconciler owns one concern and takes a [`DomainSpec`] by reference;
//! values it discovers are returned, never written into the `DomainSpec`. The
//! [`DomainSetOrchestrator`] is the single writer of discovered values and the
//! only place where errors become report entries.
//!
//! # Available Reconcilers
//!
//! - [`CertificateResolver`] - Selects the certificate a domain is created with
//! - [`DnsZoneResolver`] - Finds the hosted zone that holds a domain's records
//! - [`DomainRegistrar`] - Looks up, creates and deletes custom domains
//! - [`DnsRecordSynchronizer`] - Upserts and deletes the A/AAAA alias records
//! - [`MappingReconciler`] - Converges the base path mapping to the deployed API
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_manager::config::{DeploymentContext, DeploymentDescriptor, DeploymentOptions};
//! use domain_manager::domain::DomainSet;
//! use domain_manager::reconcilers::{DomainSetOrchestrator, LifecycleOperation};
//! use domain_manager::services::{http::GatewayClient, Services};
//!
//! async fn create(descriptor: DeploymentDescriptor) -> anyhow::Result<()> {
//!     let context = DeploymentContext::resolve(&descriptor, &DeploymentOptions::default());
//!     let mut domains = DomainSet::from_descriptor(&descriptor, &context)?;
//!     let client = GatewayClient::new("http://localhost:4566", None)?;
//!     let services = Services::from_client(Arc::new(client));
//!
//!     let report = DomainSetOrchestrator::new(&services, &context)
//!         .run(LifecycleOperation::CreateDomains, &mut domains)
//!         .await;
//!     print!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! [`DomainSpec`]: crate::domain::DomainSpec

pub mod certificate;
pub mod hosted_zone;
pub mod mappings;
pub mod orchestrator;
pub mod records;
pub mod registrar;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificate::CertificateResolver;
pub use hosted_zone::DnsZoneResolver;
pub use mappings::{CurrentMapping, MappingOutcome, MappingReconciler};
pub use orchestrator::{DomainSetOrchestrator, LifecycleOperation};
pub use records::{DnsRecordSynchronizer, RecordOutcome};
pub use registrar::DomainRegistrar;
pub use retry::{retry_throttled, ThrottlePolicy};
