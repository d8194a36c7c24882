// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use domain_manager::config::{DeploymentContext, DeploymentDescriptor, DeploymentOptions};
use domain_manager::domain::DomainSet;
use domain_manager::reconcilers::{DomainSetOrchestrator, ThrottlePolicy};
use domain_manager::services::{http::GatewayClient, Services};
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A descriptor written to a temporary directory.
pub struct Deployment {
    _dir: TempDir,
    pub path: PathBuf,
}

/// Write `yaml` as `serverless.yml` in a fresh temporary directory.
pub fn write_descriptor(yaml: &str) -> Deployment {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("serverless.yml");
    std::fs::write(&path, yaml).expect("Failed to write descriptor");
    Deployment { _dir: dir, path }
}

/// Load the descriptor the way the binary does.
pub fn load(deployment: &Deployment) -> (DeploymentContext, DomainSet) {
    let descriptor =
        DeploymentDescriptor::from_path(&deployment.path).expect("Descriptor should parse");
    let context = DeploymentContext::resolve(&descriptor, &DeploymentOptions::default());
    let domains =
        DomainSet::from_descriptor(&descriptor, &context).expect("Descriptor should validate");
    (context, domains)
}

/// Orchestrator talking HTTP to `server`, with millisecond throttle waits.
pub fn orchestrator(server: &MockServer, context: &DeploymentContext) -> DomainSetOrchestrator {
    let client = GatewayClient::new(&server.uri(), None).expect("Mock server URI is valid");
    let services = Services::from_client(Arc::new(client));
    let policy = ThrottlePolicy::default()
        .with_initial_interval(Duration::from_millis(1))
        .with_max_attempts(3);
    DomainSetOrchestrator::new(&services, context).with_throttle_policy(policy)
}

/// Answer `verb path` with `status` and a JSON body.
pub async fn mount_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer `verb path` with an empty `status` response.
pub async fn mount_status(server: &MockServer, verb: &str, route: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests `server` received for `verb path`.
pub async fn request_count(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == verb && request.url.path() == route)
        .count()
}
