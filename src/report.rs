// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Run reports.
//!
//! Lifecycle operations never print while they work. Each domain contributes
//! one [`DomainOutcome`] and the whole [`RunReport`] is rendered once every
//! domain was processed. Full error detail goes to the debug log instead.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::LOG_PREFIX;
use crate::domain::{ApiType, DomainAlias};
use crate::domain_errors::DomainError;

/// Final state of one domain for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl OutcomeStatus {
    /// Metric label value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// One line of the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainOutcome {
    pub domain_name: String,
    pub status: OutcomeStatus,
    /// Human-readable one-line message
    pub message: String,
    /// Full error text for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// CamelCase reason code for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DomainOutcome {
    pub fn succeeded(domain_name: &str, message: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            status: OutcomeStatus::Succeeded,
            message: message.into(),
            detail: None,
            reason: None,
        }
    }

    pub fn skipped(domain_name: &str, message: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            status: OutcomeStatus::Skipped,
            message: message.into(),
            detail: None,
            reason: None,
        }
    }

    pub fn failed(domain_name: &str, message: impl Into<String>, error: &DomainError) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            status: OutcomeStatus::Failed,
            message: message.into(),
            detail: Some(error.to_string()),
            reason: Some(error.status_reason().to_string()),
        }
    }
}

/// One entry of the domain summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SummaryEntry {
    /// A domain and the alias its records point at
    #[serde(rename_all = "camelCase")]
    Alias {
        domain_name: String,
        api_type: String,
        alias_target: String,
        alias_hosted_zone_id: String,
    },
    /// A domain that cannot be summarized
    #[serde(rename_all = "camelCase")]
    Notice { domain_name: String, message: String },
}

impl SummaryEntry {
    pub fn alias(domain_name: &str, api_type: ApiType, alias: &DomainAlias) -> Self {
        Self::Alias {
            domain_name: domain_name.to_string(),
            api_type: api_type.to_string(),
            alias_target: alias.target.clone(),
            alias_hosted_zone_id: alias.hosted_zone_id.clone(),
        }
    }

    pub fn notice(domain_name: &str, message: impl Into<String>) -> Self {
        Self::Notice {
            domain_name: domain_name.to_string(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn domain_name(&self) -> &str {
        match self {
            Self::Alias { domain_name, .. } | Self::Notice { domain_name, .. } => domain_name,
        }
    }
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias {
                domain_name,
                api_type,
                alias_target,
                alias_hosted_zone_id,
            } => {
                writeln!(f, "{domain_name} ({api_type}):")?;
                writeln!(f, "  Target Domain: {alias_target}")?;
                write!(f, "  Hosted Zone Id: {alias_hosted_zone_id}")
            }
            Self::Notice { message, .. } => f.write_str(message),
        }
    }
}

/// Alias values of a domain exported as deployment stack outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputs {
    pub alias_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_hosted_zone_id: Option<String>,
}

/// Everything one lifecycle operation produced.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub operation: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<DomainOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<SummaryEntry>,
    /// Stack outputs keyed by domain name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, StackOutputs>,
}

impl RunReport {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            summary: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, outcome: DomainOutcome) {
        self.outcomes.push(outcome);
    }

    /// Replace the summary, sorted by domain name.
    pub fn set_summary(&mut self, mut entries: Vec<SummaryEntry>) {
        entries.sort_by(|a, b| a.domain_name().cmp(b.domain_name()));
        self.summary = entries;
    }

    pub fn add_output(&mut self, domain_name: &str, alias: &DomainAlias) {
        self.outputs.insert(
            domain_name.to_string(),
            StackOutputs {
                alias_target: alias.target.clone(),
                alias_hosted_zone_id: Some(alias.hosted_zone_id.clone())
                    .filter(|zone_id| !zone_id.is_empty()),
            },
        );
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failed) > 0
    }

    #[must_use]
    pub fn outcome(&self, domain_name: &str) -> Option<&DomainOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.domain_name == domain_name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{LOG_PREFIX}: {}", outcome.message)?;
        }

        if !self.summary.is_empty() {
            writeln!(f, "{LOG_PREFIX} Summary")?;
            for entry in &self.summary {
                writeln!(f, "{entry}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
