// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the domain manager.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Deployment Defaults
// ============================================================================

/// Stage used when neither the domain, the command line nor the provider names one
pub const DEFAULT_STAGE: &str = "dev";

/// Deployment region used when neither the command line nor the provider names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default deployment descriptor path
pub const DEFAULT_CONFIG_PATH: &str = "serverless.yml";

// ============================================================================
// Certificate Constants
// ============================================================================

/// Edge-optimized domains must use certificates issued in this region
pub const EDGE_CERTIFICATE_REGION: &str = "us-east-1";

/// Certificate statuses considered when selecting a certificate
pub const CERTIFICATE_STATUSES: [&str; 3] = ["PENDING_VALIDATION", "ISSUED", "INACTIVE"];

/// Leading marker of a wildcard certificate domain name
pub const WILDCARD_PREFIX: char = '*';

// ============================================================================
// Domain Registration Constants
// ============================================================================

/// Hosted zone id of the global edge distribution network.
///
/// Used as the alias hosted zone when the provider omits one from an
/// edge-optimized domain response.
pub const FALLBACK_ALIAS_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// Base path value the REST mapping API uses for the root path
pub const REST_ROOT_BASE_PATH: &str = "(none)";

// ============================================================================
// DNS Record Constants
// ============================================================================

/// Record types written for every alias (IPv4 and IPv6)
pub const ALIAS_RECORD_TYPES: [&str; 2] = ["A", "AAAA"];

/// Comment attached to every record change batch
pub const RECORD_CHANGE_COMMENT: &str = "Record created by domain-manager";

/// Prefix the DNS service puts in front of hosted zone ids
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

// ============================================================================
// Stack Inspection Constants
// ============================================================================

/// Logical resource id of the REST API in the deployment stack
pub const REST_API_LOGICAL_ID: &str = "ApiGatewayRestApi";

/// Logical resource id of the websocket API in the deployment stack
pub const WEBSOCKET_API_LOGICAL_ID: &str = "WebsocketsApi";

// ============================================================================
// Throttle Retry Constants
// ============================================================================

/// Initial wait after a throttled call (5 seconds)
pub const THROTTLE_INITIAL_INTERVAL_MILLIS: u64 = 5_000;

/// Maximum wait between throttled attempts (60 seconds)
pub const THROTTLE_MAX_INTERVAL_SECS: u64 = 60;

/// Maximum number of attempts for a single throttled step
pub const THROTTLE_MAX_ATTEMPTS: u32 = 10;

/// Backoff multiplier (exponential growth factor)
pub const THROTTLE_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to spread retries (±10%)
pub const THROTTLE_RANDOMIZATION_FACTOR: f64 = 0.1;

// ============================================================================
// HTTP Client Constants
// ============================================================================

/// Timeout applied to every control-plane HTTP request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default control-plane endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4566";

// ============================================================================
// Logging Constants
// ============================================================================

/// Prefix of every user-facing status line
pub const LOG_PREFIX: &str = "Domain Manager";
