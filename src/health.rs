//! Health reporting for the facades.
//!
//! A facade bound to its live backend is healthy. One that fell back after a
//! setup failure is degraded: it still serves calls, but not the way it was
//! configured to. A facade whose flag was off is healthy, since running
//! without the backend is what was asked for.

use crate::facade::{DegradedReason, FacadeMode};
use serde::{Deserialize, Serialize};

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Derive a component's health from how its facade was bound.
    pub fn from_binding(
        name: impl Into<String>,
        mode: FacadeMode,
        reason: Option<&DegradedReason>,
    ) -> Self {
        let (status, message) = match (mode, reason) {
            (FacadeMode::Live, _) => (HealthStatus::Healthy, None),
            (FacadeMode::Degraded, Some(DegradedReason::Fallback(reason))) => {
                (HealthStatus::Degraded, Some(reason.clone()))
            }
            (FacadeMode::Degraded, _) => (HealthStatus::Healthy, Some("disabled".to_string())),
        };

        Self {
            name: name.into(),
            status,
            message,
        }
    }
}

/// Overall health across every component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl HealthReport {
    /// Combine component results; the overall status is the worst one.
    pub fn from_checks(checks: Vec<ComponentHealth>) -> Self {
        let mut overall_status = HealthStatus::Healthy;

        for check in &checks {
            match check.status {
                HealthStatus::Unhealthy => overall_status = HealthStatus::Unhealthy,
                HealthStatus::Degraded if overall_status == HealthStatus::Healthy => {
                    overall_status = HealthStatus::Degraded
                }
                _ => {}
            }
        }

        Self {
            status: overall_status,
            checks,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Look up one component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.checks.iter().find(|check| check.name == name)
    }
}
