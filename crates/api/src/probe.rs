//! External service status probe.
//!
//! Each configured service is checked with one independent HTTP request;
//! probes run in parallel and are joined settle-all, so one slow or dead
//! service never blocks or fails the others.

use std::time::Duration;

use futures::future::join_all;

use flightbay_core::status::ServiceStatus;

use crate::wire::ServiceStatusResponse;

/// Probes a fixed set of named services.
pub struct StatusProbe {
    client: reqwest::Client,
    services: Vec<(String, Option<String>)>,
}

impl StatusProbe {
    /// Build a probe over `services` (name to optional health URL) with a
    /// per-request timeout.
    pub fn new(services: Vec<(String, Option<String>)>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self { client, services }
    }

    /// Names of all configured services, in declaration order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|(name, _)| name.as_str())
    }

    /// Probe a single service by name. `None` for unknown names.
    pub async fn probe(&self, name: &str) -> Option<ServiceStatusResponse> {
        let (_, url) = self.services.iter().find(|(n, _)| n == name)?;
        Some(self.check(name, url.as_deref()).await)
    }

    /// Probe every configured service in parallel (settle-all join).
    pub async fn probe_all(&self) -> Vec<(String, ServiceStatusResponse)> {
        let checks = self
            .services
            .iter()
            .map(|(name, url)| async move {
                (name.clone(), self.check(name, url.as_deref()).await)
            });
        join_all(checks).await
    }

    async fn check(&self, name: &str, url: Option<&str>) -> ServiceStatusResponse {
        let Some(url) = url else {
            return ServiceStatusResponse {
                status: ServiceStatus::Unchecked,
                message: format!("Unchecked: {name} has no health endpoint configured"),
            };
        };

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ServiceStatusResponse {
                status: ServiceStatus::Ok,
                message: format!("{name} is healthy"),
            },
            Ok(response) => ServiceStatusResponse {
                status: ServiceStatus::Warning,
                message: format!(
                    "{name} responded with HTTP {}",
                    response.status().as_u16()
                ),
            },
            Err(err) if err.is_timeout() => ServiceStatusResponse {
                status: ServiceStatus::Error,
                message: format!("{name} timed out"),
            },
            Err(err) => ServiceStatusResponse {
                status: ServiceStatus::Error,
                message: format!("{name} is unreachable: {err}"),
            },
        }
    }
}
