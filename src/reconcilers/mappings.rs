// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! API mapping reconciliation.
//!
//! A mapping ties a base path of a custom domain to a deployed API and stage.
//! Websocket domains use v2 API mappings, which carry a mapping id. REST
//! domains use v1 base path mappings, which are addressed by base path and are
//! normalized here into the same [`CurrentMapping`] shape without an id.
//!
//! # Convergence
//!
//! | Current mapping for the API | Action |
//! |-----------------------------|--------|
//! | none | create |
//! | different base path | update in place |
//! | same base path | nothing |

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DeploymentContext;
use crate::constants::{REST_API_LOGICAL_ID, REST_ROOT_BASE_PATH, WEBSOCKET_API_LOGICAL_ID};
use crate::domain::DomainSpec;
use crate::domain_errors::{DomainError, MappingError, RemoteError};
use crate::services::{
    ApiMappingService, BasePathMapping, CreateApiMappingRequest, StackInspectionService,
    UpdateApiMappingRequest,
};

/// A mapping as it exists remotely, in either protocol family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentMapping {
    pub api_id: String,
    /// Only websocket (v2) mappings have an id
    pub api_mapping_id: Option<String>,
    /// Empty for the root path
    pub base_path: String,
    pub stage: String,
}

/// Result of converging one domain's mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingOutcome {
    Created,
    Updated { previous_base_path: String },
    Unchanged,
}

/// Converges the API mapping of each domain to its desired base path.
#[derive(Clone)]
pub struct MappingReconciler {
    mappings: Arc<dyn ApiMappingService>,
    stacks: Arc<dyn StackInspectionService>,
    context: DeploymentContext,
}

impl MappingReconciler {
    pub fn new(
        mappings: Arc<dyn ApiMappingService>,
        stacks: Arc<dyn StackInspectionService>,
        context: DeploymentContext,
    ) -> Self {
        Self {
            mappings,
            stacks,
            context,
        }
    }

    /// Resolve the id of the API the domain maps to.
    ///
    /// A configured API id wins; otherwise the physical id of the API resource
    /// is read from the deployment stack.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] when throttled,
    /// [`MappingError::StackLookupFailed`] if the stack cannot be inspected and
    /// [`MappingError::ApiNotFound`] if the resource has no physical id.
    pub async fn resolve_api_id(&self, spec: &DomainSpec) -> Result<String, DomainError> {
        let domain = spec.domain_name();
        let configured = if spec.is_websocket() {
            self.context.websocket_api_id.as_deref()
        } else {
            self.context.rest_api_id.as_deref()
        };

        if let Some(api_id) = configured {
            info!(domain = %domain, "Mapping {domain} to existing API {api_id}.");
            return Ok(api_id.to_string());
        }

        let stack = self.context.stack_name_for(spec.stage());
        let (logical_id, api_kind) = if spec.is_websocket() {
            (WEBSOCKET_API_LOGICAL_ID, "WebsocketApiId")
        } else {
            (REST_API_LOGICAL_ID, "RestApiId")
        };

        debug!(domain = %domain, stack = %stack, logical_id = logical_id, "Looking up API id");

        let detail = self
            .stacks
            .describe_stack_resource(&stack, logical_id)
            .await
            .map_err(|e| match e {
                RemoteError::Throttled { operation } => DomainError::Throttled { operation },
                other => MappingError::StackLookupFailed {
                    domain: domain.to_string(),
                    stack: stack.clone(),
                    reason: other.to_string(),
                }
                .into(),
            })?;

        detail
            .physical_resource_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                MappingError::ApiNotFound {
                    stack,
                    api_kind: api_kind.to_string(),
                }
                .into()
            })
    }

    /// Find the domain's current mapping to `api_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the domain itself does not exist,
    /// [`DomainError::Throttled`] when throttled and
    /// [`MappingError::ListFailed`] otherwise.
    pub async fn current_mapping(
        &self,
        api_id: &str,
        spec: &DomainSpec,
    ) -> Result<Option<CurrentMapping>, DomainError> {
        let domain = spec.domain_name();
        let list_failed = |reason: String| -> DomainError {
            MappingError::ListFailed {
                domain: domain.to_string(),
                reason,
            }
            .into()
        };

        let mappings: Vec<CurrentMapping> = if spec.is_websocket() {
            self.mappings
                .get_api_mappings(domain)
                .await
                .map_err(|e| e.escalate(list_failed))?
                .into_iter()
                .map(|mapping| CurrentMapping {
                    api_id: mapping.api_id,
                    api_mapping_id: mapping.api_mapping_id,
                    base_path: mapping.api_mapping_key,
                    stage: mapping.stage,
                })
                .collect()
        } else {
            let items = self
                .mappings
                .get_base_path_mappings(domain)
                .await
                .map_err(|e| e.escalate(list_failed))?;
            normalize_base_path_mappings(items)
        };

        Ok(mappings.into_iter().find(|mapping| mapping.api_id == api_id))
    }

    /// Create, update or keep the mapping so it matches `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Throttled`] when throttled and
    /// [`MappingError::CreateFailed`] or [`MappingError::UpdateFailed`] otherwise.
    pub async fn converge(
        &self,
        api_id: &str,
        current: Option<&CurrentMapping>,
        spec: &DomainSpec,
    ) -> Result<MappingOutcome, DomainError> {
        match current {
            None => {
                self.create(api_id, spec).await?;
                Ok(MappingOutcome::Created)
            }
            Some(mapping) if mapping.base_path != spec.base_path() => {
                self.update(api_id, mapping, spec).await?;
                Ok(MappingOutcome::Updated {
                    previous_base_path: mapping.base_path.clone(),
                })
            }
            Some(_) => {
                debug!(
                    domain = %spec.domain_name(),
                    "Path for {} is already current. Skipping...",
                    spec.domain_name()
                );
                Ok(MappingOutcome::Unchanged)
            }
        }
    }

    async fn create(&self, api_id: &str, spec: &DomainSpec) -> Result<(), DomainError> {
        let domain = spec.domain_name();

        let result = if spec.is_websocket() {
            self.mappings
                .create_api_mapping(&CreateApiMappingRequest {
                    api_id: api_id.to_string(),
                    api_mapping_key: spec.base_path().to_string(),
                    domain_name: domain.to_string(),
                    stage: spec.stage().to_string(),
                })
                .await
        } else {
            self.mappings
                .create_base_path_mapping(domain, &desired_base_path_mapping(api_id, spec))
                .await
        };

        result.map_err(|e| {
            fail_unless_throttled(e, |reason| MappingError::CreateFailed {
                domain: domain.to_string(),
                reason,
            })
        })?;

        info!(domain = %domain, base_path = %spec.base_path(), "Created API mapping for {domain}.");
        Ok(())
    }

    async fn update(
        &self,
        api_id: &str,
        current: &CurrentMapping,
        spec: &DomainSpec,
    ) -> Result<(), DomainError> {
        let domain = spec.domain_name();
        let update_failed = |reason: String| MappingError::UpdateFailed {
            domain: domain.to_string(),
            reason,
        };

        let result = if spec.is_websocket() {
            let Some(api_mapping_id) = current.api_mapping_id.as_deref() else {
                return Err(update_failed("the current mapping has no id".to_string()).into());
            };
            self.mappings
                .update_api_mapping(&UpdateApiMappingRequest {
                    api_id: api_id.to_string(),
                    api_mapping_id: api_mapping_id.to_string(),
                    api_mapping_key: spec.base_path().to_string(),
                    domain_name: domain.to_string(),
                    stage: spec.stage().to_string(),
                })
                .await
        } else {
            self.mappings
                .update_base_path_mapping(
                    domain,
                    &current.base_path,
                    &desired_base_path_mapping(api_id, spec),
                )
                .await
        };

        result.map_err(|e| fail_unless_throttled(e, update_failed))?;

        info!(
            domain = %domain,
            from = %current.base_path,
            to = %spec.base_path(),
            "Updated API mapping for {domain}"
        );
        Ok(())
    }

    /// Delete the domain's current mapping.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the mapping is already gone,
    /// [`DomainError::Throttled`] when throttled and
    /// [`MappingError::DeleteFailed`] otherwise.
    pub async fn delete(&self, current: &CurrentMapping, spec: &DomainSpec) -> Result<(), DomainError> {
        let domain = spec.domain_name();
        let delete_failed = |reason: String| -> DomainError {
            MappingError::DeleteFailed {
                domain: domain.to_string(),
                reason,
            }
            .into()
        };

        let result = if spec.is_websocket() {
            let Some(api_mapping_id) = current.api_mapping_id.as_deref() else {
                return Err(delete_failed("the current mapping has no id".to_string()));
            };
            self.mappings.delete_api_mapping(domain, api_mapping_id).await
        } else {
            self.mappings
                .delete_base_path_mapping(domain, &current.base_path)
                .await
        };

        result.map_err(|e| e.escalate(delete_failed))?;

        info!(domain = %domain, "Removed mapping for {domain}.");
        Ok(())
    }
}

/// Map a mapping write failure; only throttling keeps its signal meaning.
fn fail_unless_throttled<F>(error: RemoteError, wrap: F) -> DomainError
where
    F: FnOnce(String) -> MappingError,
{
    match error {
        RemoteError::Throttled { operation } => DomainError::Throttled { operation },
        other => wrap(other.to_string()).into(),
    }
}

fn desired_base_path_mapping(api_id: &str, spec: &DomainSpec) -> BasePathMapping {
    BasePathMapping {
        base_path: spec.base_path().to_string(),
        rest_api_id: api_id.to_string(),
        stage: spec.stage().to_string(),
    }
}

/// Convert v1 base path mappings into [`CurrentMapping`]s.
///
/// The v1 API reports the root path as `(none)`; it becomes the empty path.
#[must_use]
pub fn normalize_base_path_mappings(items: Vec<BasePathMapping>) -> Vec<CurrentMapping> {
    items
        .into_iter()
        .map(|item| CurrentMapping {
            api_id: item.rest_api_id,
            api_mapping_id: None,
            base_path: if item.base_path == REST_ROOT_BASE_PATH {
                String::new()
            } else {
                item.base_path
            },
            stage: item.stage,
        })
        .collect()
}

#[cfg(test)]
#[path = "mappings_tests.rs"]
mod mappings_tests;
