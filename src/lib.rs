// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Domain Manager - custom domains for API gateway deployments
//!
//! Domain Manager reconciles the custom domains declared in a deployment
//! descriptor against a remote API gateway: it creates and deletes the domains
//! themselves, keeps their DNS alias records in step and converges the base
//! path mapping of each domain to the API that was just deployed.
//!
//! ## Overview
//!
//! The library is driven by deployment lifecycle hooks, each of which maps to
//! one [`LifecycleOperation`](reconcilers::LifecycleOperation):
//!
//! - **create-domains** - create missing domains with certificate and alias records
//! - **delete-domains** - delete domains together with their alias records
//! - **sync-mappings** - create or update base path mappings after a deploy
//! - **remove-mappings** - delete base path mappings before a removal
//! - **summarize** - print the alias target of every domain
//!
//! ## Modules
//!
//! - [`config`] - Deployment descriptor parsing and deployment context
//! - [`domain`] - Validated per-domain configuration and the active domain set
//! - [`reconcilers`] - Reconcilers for each concern and the orchestrator
//! - [`services`] - Remote collaborator traits and the HTTP client
//! - [`report`] - Per-domain outcomes, summary and stack outputs
//! - [`domain_errors`] - Error types for every reconciliation step
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use domain_manager::config::{DeploymentContext, DeploymentDescriptor, DeploymentOptions};
//! use domain_manager::domain::DomainSet;
//!
//! let descriptor = DeploymentDescriptor::from_yaml_str(
//!     r"
//! service: orders
//! custom:
//!   customDomain:
//!     domainName: api.example.com
//!     basePath: orders
//!     endpointType: regional
//! ",
//! )?;
//! let context = DeploymentContext::resolve(&descriptor, &DeploymentOptions::default());
//! let domains = DomainSet::from_descriptor(&descriptor, &context)?;
//! assert_eq!(domains.len(), 1);
//! # Ok::<(), domain_manager::domain_errors::ConfigError>(())
//! ```

pub mod config;
pub mod constants;
pub mod domain;
pub mod domain_errors;
pub mod metrics;
pub mod reconcilers;
pub mod report;
pub mod services;
