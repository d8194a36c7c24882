// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators for reconciler unit tests.
//!
//! [`FakeGateway`] implements every service trait over plain maps, counts
//! calls per operation and can be scripted to throttle or fail specific
//! operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{DeploymentContext, DeploymentDescriptor, DeploymentOptions, RawDomainConfig};
use crate::domain::{DomainSpec, EndpointType};
use crate::domain_errors::RemoteError;
use crate::reconcilers::retry::ThrottlePolicy;
use crate::services::{
    ApiMapping, ApiMappingService, BasePathMapping, CertificateService, CertificateSummary,
    ChangeBatch, CreateApiMappingRequest, CreateDomainNameRequest, CreateRestDomainRequest,
    DnsZoneService, DomainNameConfiguration, DomainNameDescription, DomainRegistrationService,
    HostedZone, HostedZoneConfig, RestDomainDescription, Services, StackInspectionService,
    StackResourceDetail, UpdateApiMappingRequest,
};

pub const EDGE_ZONE_ID: &str = "Z2FDTNDATAQYW2";
pub const REGIONAL_ZONE_ID: &str = "Z1UJRXOUMOOFQ8";

#[derive(Default)]
pub struct FakeState {
    pub domains: HashMap<String, DomainNameDescription>,
    pub certificates: Vec<CertificateSummary>,
    pub certificate_regions: Vec<String>,
    pub zones: Vec<HostedZone>,
    pub record_changes: Vec<(String, ChangeBatch)>,
    pub api_mappings: HashMap<String, Vec<ApiMapping>>,
    pub base_path_mappings: HashMap<String, Vec<BasePathMapping>>,
    pub stack_resources: HashMap<(String, String), Option<String>>,
    pub rest_requests: Vec<CreateRestDomainRequest>,
    pub websocket_requests: Vec<CreateDomainNameRequest>,
    /// Remaining throttled answers per operation
    pub throttles: HashMap<String, u32>,
    /// Permanent failures per `operation:key`
    pub failures: HashMap<String, RemoteError>,
    pub calls: HashMap<String, u32>,
    next_id: u32,
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> Services {
        Services::from_client(Arc::new(self.clone()))
    }

    pub fn with_certificate(self, domain_name: &str, arn: &str) -> Self {
        self.state.lock().unwrap().certificates.push(CertificateSummary {
            certificate_arn: arn.to_string(),
            domain_name: domain_name.to_string(),
        });
        self
    }

    pub fn with_zone(self, name: &str, id: &str, private_zone: bool) -> Self {
        self.state.lock().unwrap().zones.push(HostedZone {
            id: format!("/hostedzone/{id}"),
            name: name.to_string(),
            config: HostedZoneConfig { private_zone },
        });
        self
    }

    /// Register an existing custom domain.
    pub fn with_domain(self, domain_name: &str, target: &str, zone_id: &str) -> Self {
        self.state.lock().unwrap().domains.insert(
            domain_name.to_string(),
            DomainNameDescription {
                domain_name: domain_name.to_string(),
                domain_name_configurations: vec![DomainNameConfiguration {
                    api_gateway_domain_name: Some(target.to_string()),
                    hosted_zone_id: Some(zone_id.to_string()),
                    ..Default::default()
                }],
            },
        );
        self
    }

    pub fn with_stack_resource(self, stack: &str, logical_id: &str, physical: Option<&str>) -> Self {
        self.state.lock().unwrap().stack_resources.insert(
            (stack.to_string(), logical_id.to_string()),
            physical.map(str::to_string),
        );
        self
    }

    pub fn with_api_mapping(self, domain_name: &str, mapping: ApiMapping) -> Self {
        self.state
            .lock()
            .unwrap()
            .api_mappings
            .entry(domain_name.to_string())
            .or_default()
            .push(mapping);
        self
    }

    pub fn with_base_path_mapping(self, domain_name: &str, mapping: BasePathMapping) -> Self {
        self.state
            .lock()
            .unwrap()
            .base_path_mappings
            .entry(domain_name.to_string())
            .or_default()
            .push(mapping);
        self
    }

    /// Answer the next `times` calls of `operation` with a throttle.
    pub fn throttle(self, operation: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .throttles
            .insert(operation.to_string(), times);
        self
    }

    /// Fail every call of `operation` addressing `key` with `error`.
    pub fn fail(self, operation: &str, key: &str, error: RemoteError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(format!("{operation}:{key}"), error);
        self
    }

    pub fn calls(&self, operation: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn has_domain(&self, domain_name: &str) -> bool {
        self.state.lock().unwrap().domains.contains_key(domain_name)
    }

    pub fn record_changes(&self) -> Vec<(String, ChangeBatch)> {
        self.state.lock().unwrap().record_changes.clone()
    }

    pub fn api_mappings(&self, domain_name: &str) -> Vec<ApiMapping> {
        self.state
            .lock()
            .unwrap()
            .api_mappings
            .get(domain_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn base_path_mappings(&self, domain_name: &str) -> Vec<BasePathMapping> {
        self.state
            .lock()
            .unwrap()
            .base_path_mappings
            .get(domain_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Count the call and apply scripted throttles and failures.
    fn enter(&self, operation: &str, key: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation.to_string()).or_insert(0) += 1;

        if let Some(remaining) = state.throttles.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::Throttled {
                    operation: operation.to_string(),
                });
            }
        }

        if let Some(error) = state.failures.get(&format!("{operation}:{key}")) {
            return Err(error.clone());
        }
        Ok(())
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.next_id
    }
}

fn not_found(resource: String) -> RemoteError {
    RemoteError::NotFound { resource }
}

#[async_trait]
impl DomainRegistrationService for FakeGateway {
    async fn get_domain_name(
        &self,
        domain_name: &str,
    ) -> Result<DomainNameDescription, RemoteError> {
        self.enter("GetDomainName", domain_name)?;
        self.state
            .lock()
            .unwrap()
            .domains
            .get(domain_name)
            .cloned()
            .ok_or_else(|| not_found(format!("Domain {domain_name}")))
    }

    async fn create_rest_domain_name(
        &self,
        request: &CreateRestDomainRequest,
    ) -> Result<RestDomainDescription, RemoteError> {
        self.enter("CreateDomainName", &request.domain_name)?;
        let id = self.next_id();
        let regional = request.endpoint_configuration.types.contains(&EndpointType::Regional);

        let (target, zone_id) = if regional {
            (
                format!("d-{id}.execute-api.us-west-2.amazonaws.com"),
                REGIONAL_ZONE_ID,
            )
        } else {
            (format!("d{id}.cloudfront.net"), EDGE_ZONE_ID)
        };

        let mut state = self.state.lock().unwrap();
        state.rest_requests.push(request.clone());
        state.domains.insert(
            request.domain_name.clone(),
            DomainNameDescription {
                domain_name: request.domain_name.clone(),
                domain_name_configurations: vec![DomainNameConfiguration {
                    api_gateway_domain_name: Some(target.clone()),
                    hosted_zone_id: Some(zone_id.to_string()),
                    ..Default::default()
                }],
            },
        );

        Ok(if regional {
            RestDomainDescription {
                domain_name: request.domain_name.clone(),
                regional_domain_name: Some(target),
                regional_hosted_zone_id: Some(zone_id.to_string()),
                ..Default::default()
            }
        } else {
            // Edge answers without a zone id exercise the static fallback
            RestDomainDescription {
                domain_name: request.domain_name.clone(),
                distribution_domain_name: Some(target),
                ..Default::default()
            }
        })
    }

    async fn create_domain_name(
        &self,
        request: &CreateDomainNameRequest,
    ) -> Result<DomainNameDescription, RemoteError> {
        self.enter("CreateDomainName", &request.domain_name)?;
        let id = self.next_id();

        let description = DomainNameDescription {
            domain_name: request.domain_name.clone(),
            domain_name_configurations: vec![DomainNameConfiguration {
                api_gateway_domain_name: Some(format!(
                    "d-{id}.execute-api.us-west-2.amazonaws.com"
                )),
                hosted_zone_id: Some(REGIONAL_ZONE_ID.to_string()),
                ..Default::default()
            }],
        };

        let mut state = self.state.lock().unwrap();
        state.websocket_requests.push(request.clone());
        state
            .domains
            .insert(request.domain_name.clone(), description.clone());
        Ok(description)
    }

    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), RemoteError> {
        self.enter("DeleteDomainName", domain_name)?;
        self.state
            .lock()
            .unwrap()
            .domains
            .remove(domain_name)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Domain {domain_name}")))
    }
}

#[async_trait]
impl CertificateService for FakeGateway {
    async fn list_certificates(
        &self,
        _statuses: &[&str],
        region: &str,
    ) -> Result<Vec<CertificateSummary>, RemoteError> {
        self.enter("ListCertificates", region)?;
        let mut state = self.state.lock().unwrap();
        state.certificate_regions.push(region.to_string());
        Ok(state.certificates.clone())
    }
}

#[async_trait]
impl DnsZoneService for FakeGateway {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteError> {
        self.enter("ListHostedZones", "")?;
        Ok(self.state.lock().unwrap().zones.clone())
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), RemoteError> {
        let key = batch
            .changes
            .first()
            .map(|change| change.resource_record_set.name.clone())
            .unwrap_or_default();
        self.enter("ChangeResourceRecordSets", &key)?;
        self.state
            .lock()
            .unwrap()
            .record_changes
            .push((hosted_zone_id.to_string(), batch.clone()));
        Ok(())
    }
}

#[async_trait]
impl ApiMappingService for FakeGateway {
    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, RemoteError> {
        self.enter("GetApiMappings", domain_name)?;
        Ok(self.api_mappings(domain_name))
    }

    async fn create_api_mapping(
        &self,
        request: &CreateApiMappingRequest,
    ) -> Result<(), RemoteError> {
        self.enter("CreateApiMapping", &request.domain_name)?;
        let id = self.next_id();
        self.state
            .lock()
            .unwrap()
            .api_mappings
            .entry(request.domain_name.clone())
            .or_default()
            .push(ApiMapping {
                api_id: request.api_id.clone(),
                api_mapping_id: Some(format!("mapping-{id}")),
                api_mapping_key: request.api_mapping_key.clone(),
                stage: request.stage.clone(),
            });
        Ok(())
    }

    async fn update_api_mapping(
        &self,
        request: &UpdateApiMappingRequest,
    ) -> Result<(), RemoteError> {
        self.enter("UpdateApiMapping", &request.domain_name)?;
        let mut state = self.state.lock().unwrap();
        let mapping = state
            .api_mappings
            .get_mut(&request.domain_name)
            .and_then(|mappings| {
                mappings
                    .iter_mut()
                    .find(|m| m.api_mapping_id.as_deref() == Some(request.api_mapping_id.as_str()))
            })
            .ok_or_else(|| not_found(format!("Mapping {}", request.api_mapping_id)))?;
        mapping.api_id = request.api_id.clone();
        mapping.api_mapping_key = request.api_mapping_key.clone();
        mapping.stage = request.stage.clone();
        Ok(())
    }

    async fn delete_api_mapping(
        &self,
        domain_name: &str,
        api_mapping_id: &str,
    ) -> Result<(), RemoteError> {
        self.enter("DeleteApiMapping", domain_name)?;
        let mut state = self.state.lock().unwrap();
        let mappings = state
            .api_mappings
            .get_mut(domain_name)
            .ok_or_else(|| not_found(format!("Mapping {api_mapping_id}")))?;
        let before = mappings.len();
        mappings.retain(|m| m.api_mapping_id.as_deref() != Some(api_mapping_id));
        if mappings.len() == before {
            return Err(not_found(format!("Mapping {api_mapping_id}")));
        }
        Ok(())
    }

    async fn get_base_path_mappings(
        &self,
        domain_name: &str,
    ) -> Result<Vec<BasePathMapping>, RemoteError> {
        self.enter("GetBasePathMappings", domain_name)?;
        Ok(self.base_path_mappings(domain_name))
    }

    async fn create_base_path_mapping(
        &self,
        domain_name: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError> {
        self.enter("CreateBasePathMapping", domain_name)?;
        self.state
            .lock()
            .unwrap()
            .base_path_mappings
            .entry(domain_name.to_string())
            .or_default()
            .push(mapping.clone());
        Ok(())
    }

    async fn update_base_path_mapping(
        &self,
        domain_name: &str,
        current_base_path: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError> {
        self.enter("UpdateBasePathMapping", domain_name)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .base_path_mappings
            .get_mut(domain_name)
            .and_then(|mappings| {
                mappings
                    .iter_mut()
                    .find(|m| m.base_path == current_base_path)
            })
            .ok_or_else(|| not_found(format!("Base path mapping {current_base_path}")))?;
        *existing = mapping.clone();
        Ok(())
    }

    async fn delete_base_path_mapping(
        &self,
        domain_name: &str,
        base_path: &str,
    ) -> Result<(), RemoteError> {
        self.enter("DeleteBasePathMapping", domain_name)?;
        let mut state = self.state.lock().unwrap();
        let mappings = state
            .base_path_mappings
            .get_mut(domain_name)
            .ok_or_else(|| not_found(format!("Base path mapping {base_path}")))?;
        let before = mappings.len();
        mappings.retain(|m| m.base_path != base_path);
        if mappings.len() == before {
            return Err(not_found(format!("Base path mapping {base_path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl StackInspectionService for FakeGateway {
    async fn describe_stack_resource(
        &self,
        stack_name: &str,
        logical_resource_id: &str,
    ) -> Result<StackResourceDetail, RemoteError> {
        self.enter("DescribeStackResource", stack_name)?;
        let state = self.state.lock().unwrap();
        let physical = state
            .stack_resources
            .get(&(stack_name.to_string(), logical_resource_id.to_string()))
            .ok_or_else(|| not_found(format!("Stack {stack_name}")))?;
        Ok(StackResourceDetail {
            logical_resource_id: logical_resource_id.to_string(),
            physical_resource_id: physical.clone(),
        })
    }
}

/// Build a spec from a YAML snippet of one `customDomain` entry.
pub fn spec_from_yaml(yaml: &str) -> DomainSpec {
    let raw: RawDomainConfig = serde_yaml::from_str(yaml).unwrap();
    DomainSpec::from_raw(&raw, "dev").unwrap()
}

pub fn spec(domain_name: &str) -> DomainSpec {
    spec_from_yaml(&format!("domainName: {domain_name}"))
}

/// Context of a service `orders` deployed to `dev` in `us-west-2`.
pub fn context() -> DeploymentContext {
    let descriptor = DeploymentDescriptor::from_yaml_str(
        r"
service: orders
provider:
  region: us-west-2
",
    )
    .unwrap();
    DeploymentContext::resolve(&descriptor, &DeploymentOptions::default())
}

/// Throttle policy with millisecond waits.
pub fn fast_policy() -> ThrottlePolicy {
    ThrottlePolicy {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(2),
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_attempts: 5,
    }
}
