//! Readiness of the upstream geocoder.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::models::InterpolationRequest;
use crate::provider::Geocoder;

const PROBE_CITY: &str = "Bruxelles";

/// Known address used to probe the interpolation service.
const PROBE_INTERPOLATION: (f64, f64, &str, &str) = (50.83582, 4.33844, "20", "Avenue Fonsny");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    /// Geocoding works, interpolation does not
    Degraded,
    Down,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthReport {
    fn up() -> Self {
        Self {
            status: HealthStatus::Up,
            error_message: None,
            details: None,
        }
    }

    fn failed(status: HealthStatus, error_message: &str, details: impl Into<String>) -> Self {
        Self {
            status,
            error_message: Some(error_message.to_string()),
            details: Some(details.into()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

pub struct HealthCheck {
    geocoder: Arc<dyn Geocoder>,
    wait: RetryPolicy,
}

impl HealthCheck {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            wait: RetryPolicy {
                max_attempts: 10,
                initial_delay: Duration::from_secs(2),
                delay_step: Duration::from_millis(500),
            },
        }
    }

    pub fn with_wait_policy(mut self, wait: RetryPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Probe the geocoder, then the interpolation service.
    pub async fn check(&self) -> HealthReport {
        let response = match self.geocoder.geocode_text(PROBE_CITY, None).await {
            Ok(response) => response,
            Err(e) => {
                return HealthReport::failed(HealthStatus::Down, "Pelias not reachable", e.to_string())
            }
        };

        let echoed = response.query_text().unwrap_or_default();
        if !echoed.eq_ignore_ascii_case(PROBE_CITY) {
            return HealthReport::failed(
                HealthStatus::Down,
                "Pelias not ready",
                format!("Unexpected query echo: '{}'", echoed),
            );
        }

        let (lat, lon, number, street) = PROBE_INTERPOLATION;
        let request = InterpolationRequest {
            lat,
            lon,
            number: number.to_string(),
            street: street.to_string(),
        };
        match self.geocoder.interpolate(&request).await {
            Err(e) => HealthReport::failed(
                HealthStatus::Degraded,
                "Pelias interpolation not reachable",
                e.to_string(),
            ),
            Ok(interpolation) if !interpolation.is_empty() && interpolation.point().is_none() => {
                HealthReport::failed(
                    HealthStatus::Degraded,
                    "Pelias interpolation not ready",
                    format!("No geometry in interpolation answer: {:?}", interpolation.extra),
                )
            }
            Ok(_) => HealthReport::up(),
        }
    }

    /// Poll [`check`](Self::check) until the geocoder answers. Returns false
    /// when it is still down after the last probe.
    pub async fn wait_until_ready(&self) -> bool {
        for attempt in 0..self.wait.max_attempts {
            let report = self.check().await;
            if report.status != HealthStatus::Down {
                info!("Geocoder ready ({:?})", report.status);
                return true;
            }
            if attempt + 1 == self.wait.max_attempts {
                break;
            }
            let delay = self.wait.delay_for(attempt);
            debug!("Geocoder not ready, waiting {:?}: {:?}", delay, report.details);
            tokio::time::sleep(delay).await;
        }
        warn!("Geocoder still down after {} probes", self.wait.max_attempts);
        false
    }
}
