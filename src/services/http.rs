// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP client for the gateway control plane.
//!
//! [`GatewayClient`] implements every collaborator trait against a single
//! control-plane endpoint. Request signing and credential acquisition are left
//! to whatever sits behind that endpoint; the client only attaches an optional
//! bearer token.
//!
//! Status codes map onto [`RemoteError`]:
//!
//! | HTTP Code | Result |
//! |-----------|--------|
//! | 2xx | success |
//! | 404 | [`RemoteError::NotFound`] |
//! | 429 | [`RemoteError::Throttled`] |
//! | other | [`RemoteError::Service`] |
//!
//! Transport failures are reported as [`RemoteError::Service`]. Nothing is
//! retried here: throttling is handled by the orchestrator, and every other
//! failure is final for the current domain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use super::{
    ApiMapping, ApiMappingService, BasePathMapping, CertificateService, CertificateSummary,
    ChangeBatch, CreateApiMappingRequest, CreateDomainNameRequest, CreateRestDomainRequest,
    DnsZoneService, DomainNameDescription, DomainRegistrationService, HostedZone,
    RestDomainDescription, StackInspectionService, StackResourceDetail, UpdateApiMappingRequest,
};
use crate::constants::{HTTP_REQUEST_TIMEOUT_SECS, REST_ROOT_BASE_PATH};
use crate::domain_errors::{ConfigError, RemoteError};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateList {
    #[serde(default)]
    certificate_summary_list: Vec<CertificateSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZoneList {
    #[serde(default)]
    hosted_zones: Vec<HostedZone>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeRequest<'a> {
    change_batch: &'a ChangeBatch,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiMappingList {
    #[serde(default)]
    items: Vec<ApiMapping>,
}

#[derive(Deserialize)]
struct BasePathMappingList {
    #[serde(default)]
    items: Vec<BasePathMapping>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackResourceResponse {
    stack_resource_detail: StackResourceDetail,
}

/// Build the API base URL from a server address
///
/// Converts "gateway.internal:4566" to `<http://gateway.internal:4566>` and
/// leaves addresses that already carry a scheme untouched.
#[must_use]
pub fn build_api_url(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", server.trim_end_matches('/'))
    }
}

/// The path segment the REST mapping API uses for a base path.
fn rest_base_path_segment(base_path: &str) -> &str {
    if base_path.is_empty() {
        REST_ROOT_BASE_PATH
    } else {
        base_path
    }
}

/// HTTP client for every remote collaborator.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl GatewayClient {
    /// Create a client for the control plane at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if `endpoint` is not a usable
    /// base URL or the HTTP client cannot be built.
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            value: endpoint.to_string(),
            reason,
        };

        let base_url = Url::parse(&build_api_url(endpoint)).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }

        let client = HttpClient::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// The control-plane base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL below the base URL, percent-encoding every segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and classify the response.
    ///
    /// # Arguments
    /// * `request` - The request to send
    /// * `operation` - Remote operation name, used in errors and logs
    /// * `resource` - Description of the addressed resource for `NotFound`
    async fn execute(
        &self,
        request: RequestBuilder,
        operation: &str,
        resource: &str,
    ) -> Result<String, RemoteError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        debug!(operation = operation, resource = resource, "Control-plane request");

        let response = request.send().await.map_err(|e| RemoteError::Service {
            operation: operation.to_string(),
            reason: format!("Failed to send HTTP request: {e}"),
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.is_success() {
            return Ok(body);
        }

        match status {
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: resource.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(RemoteError::Throttled {
                operation: operation.to_string(),
            }),
            _ => {
                error!(
                    operation = operation,
                    status = %status,
                    error = %body,
                    "Control-plane request failed"
                );
                Err(RemoteError::Service {
                    operation: operation.to_string(),
                    reason: format!("HTTP {status}: {body}"),
                })
            }
        }
    }

    /// Send a request and decode a JSON response body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
        resource: &str,
    ) -> Result<T, RemoteError> {
        let body = self.execute(request, operation, resource).await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Service {
            operation: operation.to_string(),
            reason: format!("Invalid response body: {e}"),
        })
    }
}

#[async_trait]
impl DomainRegistrationService for GatewayClient {
    async fn get_domain_name(
        &self,
        domain_name: &str,
    ) -> Result<DomainNameDescription, RemoteError> {
        let url = self.url(&["v2", "domainnames", domain_name]);
        self.execute_json(
            self.client.get(url),
            "GetDomainName",
            &format!("Domain {domain_name}"),
        )
        .await
    }

    async fn create_rest_domain_name(
        &self,
        request: &CreateRestDomainRequest,
    ) -> Result<RestDomainDescription, RemoteError> {
        let url = self.url(&["domainnames"]);
        self.execute_json(
            self.client.post(url).json(request),
            "CreateDomainName",
            &format!("Domain {}", request.domain_name),
        )
        .await
    }

    async fn create_domain_name(
        &self,
        request: &CreateDomainNameRequest,
    ) -> Result<DomainNameDescription, RemoteError> {
        let url = self.url(&["v2", "domainnames"]);
        self.execute_json(
            self.client.post(url).json(request),
            "CreateDomainName",
            &format!("Domain {}", request.domain_name),
        )
        .await
    }

    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), RemoteError> {
        let url = self.url(&["v2", "domainnames", domain_name]);
        self.execute(
            self.client.delete(url),
            "DeleteDomainName",
            &format!("Domain {domain_name}"),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl CertificateService for GatewayClient {
    async fn list_certificates(
        &self,
        statuses: &[&str],
        region: &str,
    ) -> Result<Vec<CertificateSummary>, RemoteError> {
        let mut url = self.url(&["certificates"]);
        {
            let mut query = url.query_pairs_mut();
            for status in statuses {
                query.append_pair("statuses", status);
            }
            query.append_pair("region", region);
        }

        let list: CertificateList = self
            .execute_json(self.client.get(url), "ListCertificates", "Certificates")
            .await?;
        Ok(list.certificate_summary_list)
    }
}

#[async_trait]
impl DnsZoneService for GatewayClient {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteError> {
        let url = self.url(&["hostedzones"]);
        let list: HostedZoneList = self
            .execute_json(self.client.get(url), "ListHostedZones", "Hosted zones")
            .await?;
        Ok(list.hosted_zones)
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["hostedzones", hosted_zone_id, "rrset"]);
        self.execute(
            self.client
                .post(url)
                .json(&ChangeRequest { change_batch: batch }),
            "ChangeResourceRecordSets",
            &format!("Hosted zone {hosted_zone_id}"),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl ApiMappingService for GatewayClient {
    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, RemoteError> {
        let url = self.url(&["v2", "domainnames", domain_name, "apimappings"]);
        let list: ApiMappingList = self
            .execute_json(
                self.client.get(url),
                "GetApiMappings",
                &format!("Mappings for domain {domain_name}"),
            )
            .await?;
        Ok(list.items)
    }

    async fn create_api_mapping(
        &self,
        request: &CreateApiMappingRequest,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["v2", "domainnames", &request.domain_name, "apimappings"]);
        self.execute(
            self.client.post(url).json(request),
            "CreateApiMapping",
            &format!("Domain {}", request.domain_name),
        )
        .await
        .map(|_| ())
    }

    async fn update_api_mapping(
        &self,
        request: &UpdateApiMappingRequest,
    ) -> Result<(), RemoteError> {
        let url = self.url(&[
            "v2",
            "domainnames",
            &request.domain_name,
            "apimappings",
            &request.api_mapping_id,
        ]);
        self.execute(
            self.client.patch(url).json(request),
            "UpdateApiMapping",
            &format!("Mapping {}", request.api_mapping_id),
        )
        .await
        .map(|_| ())
    }

    async fn delete_api_mapping(
        &self,
        domain_name: &str,
        api_mapping_id: &str,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["v2", "domainnames", domain_name, "apimappings", api_mapping_id]);
        self.execute(
            self.client.delete(url),
            "DeleteApiMapping",
            &format!("Mapping {api_mapping_id}"),
        )
        .await
        .map(|_| ())
    }

    async fn get_base_path_mappings(
        &self,
        domain_name: &str,
    ) -> Result<Vec<BasePathMapping>, RemoteError> {
        let url = self.url(&["domainnames", domain_name, "basepathmappings"]);
        let list: BasePathMappingList = self
            .execute_json(
                self.client.get(url),
                "GetBasePathMappings",
                &format!("Mappings for domain {domain_name}"),
            )
            .await?;
        Ok(list.items)
    }

    async fn create_base_path_mapping(
        &self,
        domain_name: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["domainnames", domain_name, "basepathmappings"]);
        self.execute(
            self.client.post(url).json(mapping),
            "CreateBasePathMapping",
            &format!("Domain {domain_name}"),
        )
        .await
        .map(|_| ())
    }

    async fn update_base_path_mapping(
        &self,
        domain_name: &str,
        current_base_path: &str,
        mapping: &BasePathMapping,
    ) -> Result<(), RemoteError> {
        let url = self.url(&[
            "domainnames",
            domain_name,
            "basepathmappings",
            rest_base_path_segment(current_base_path),
        ]);
        self.execute(
            self.client.patch(url).json(mapping),
            "UpdateBasePathMapping",
            &format!("Base path mapping {domain_name}/{current_base_path}"),
        )
        .await
        .map(|_| ())
    }

    async fn delete_base_path_mapping(
        &self,
        domain_name: &str,
        base_path: &str,
    ) -> Result<(), RemoteError> {
        let url = self.url(&[
            "domainnames",
            domain_name,
            "basepathmappings",
            rest_base_path_segment(base_path),
        ]);
        self.execute(
            self.client.delete(url),
            "DeleteBasePathMapping",
            &format!("Base path mapping {domain_name}/{base_path}"),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl StackInspectionService for GatewayClient {
    async fn describe_stack_resource(
        &self,
        stack_name: &str,
        logical_resource_id: &str,
    ) -> Result<StackResourceDetail, RemoteError> {
        let url = self.url(&["stacks", stack_name, "resources", logical_resource_id]);
        let response: StackResourceResponse = self
            .execute_json(
                self.client.get(url),
                "DescribeStackResource",
                &format!("Resource {logical_resource_id} in stack {stack_name}"),
            )
            .await?;
        Ok(response.stack_resource_detail)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
