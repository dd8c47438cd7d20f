//! Append-only record of generation outcomes.
//!
//! The router emits one [`TelemetryEvent`] per terminal outcome of an attempt
//! (the fallback attempt gets its own event). Events are flat and serialize to
//! a single JSON line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryStatus {
    Success,
    Error,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    Technical,
    Policy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    /// Shared by every event of one `generate` call.
    pub request_id: String,
    pub provider: ProviderId,
    pub status: TelemetryStatus,
    pub latency_ms: Option<u64>,
    pub cost: Option<f64>,
    pub error: Option<String>,
    /// Set only when `status` is `Error`.
    pub failure_type: Option<FailureType>,
    /// Caller metadata copied from the request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TelemetryEvent {
    fn base(request_id: &str, provider: &ProviderId, status: TelemetryStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
            provider: provider.clone(),
            status,
            latency_ms: None,
            cost: None,
            error: None,
            failure_type: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn success(request_id: &str, provider: &ProviderId, latency_ms: u64, cost: f64) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            cost: Some(cost),
            ..Self::base(request_id, provider, TelemetryStatus::Success)
        }
    }

    pub fn fallback(request_id: &str, provider: &ProviderId, latency_ms: u64, cost: f64) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            cost: Some(cost),
            ..Self::base(request_id, provider, TelemetryStatus::Fallback)
        }
    }

    pub fn failure(
        request_id: &str,
        provider: &ProviderId,
        failure_type: FailureType,
        error: impl Into<String>,
        latency_ms: Option<u64>,
    ) -> Self {
        Self {
            latency_ms,
            error: Some(error.into()),
            failure_type: Some(failure_type),
            ..Self::base(request_id, provider, TelemetryStatus::Error)
        }
    }
}

/// Destination for telemetry events. Implementations must be cheap and must
/// not fail the generation call.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Writes every event as one JSON line to the `telemetry` log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => match event.status {
                TelemetryStatus::Error => log::warn!(target: "telemetry", "{}", line),
                _ => log::info!(target: "telemetry", "{}", line),
            },
            Err(e) => log::error!(target: "telemetry", "Failed to serialize event: {}", e),
        }
    }
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryTelemetrySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl TelemetrySink for MemoryTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub total: usize,
    pub successes: usize,
    pub fallbacks: usize,
    pub technical_failures: usize,
    pub policy_failures: usize,
    pub total_cost: f64,
    pub mean_latency_ms: Option<f64>,
}

impl TelemetrySummary {
    pub fn from_events(events: &[TelemetryEvent]) -> Self {
        let mut summary = TelemetrySummary {
            total: events.len(),
            ..Default::default()
        };
        let mut latency_sum = 0u64;
        let mut latency_count = 0u64;

        for event in events {
            match (event.status, event.failure_type) {
                (TelemetryStatus::Success, _) => summary.successes += 1,
                (TelemetryStatus::Fallback, _) => summary.fallbacks += 1,
                (TelemetryStatus::Error, Some(FailureType::Policy)) => summary.policy_failures += 1,
                (TelemetryStatus::Error, _) => summary.technical_failures += 1,
            }
            summary.total_cost += event.cost.unwrap_or(0.0);
            if let Some(latency) = event.latency_ms {
                latency_sum += latency;
                latency_count += 1;
            }
        }

        if latency_count > 0 {
            summary.mean_latency_ms = Some(latency_sum as f64 / latency_count as f64);
        }
        summary
    }

    /// Share of delivered images that came from a fallback attempt.
    pub fn fallback_rate(&self) -> f64 {
        let delivered = self.successes + self.fallbacks;
        if delivered == 0 {
            0.0
        } else {
            self.fallbacks as f64 / delivered as f64
        }
    }
}
