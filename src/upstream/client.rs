//! HTTP gateway to the upstream services.
//!
//! One thin fetch function per upstream concern. A non-success status or a
//! body that does not match the expected shape normalizes to the empty
//! value; only network-level failures (connect, timeout) surface as
//! `UpstreamError`, so callers can decide per branch whether to tolerate
//! them. No retries: one failed attempt yields the empty result.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::models::{
    CatalogFilter, CompanyRecord, CountyOrganizations, MunicipalityOrganizations,
    QualityAssessment, RegistryOrganization,
};
use crate::sparql;
use crate::upstream::bindings::{count_list_from_bindings, Binding, OrgCount, SparqlResponse};

/// Network-level failure against one upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {service} timed out")]
    Timeout { service: &'static str },

    #[error("cannot connect to {service}: {message}")]
    Connection {
        service: &'static str,
        message: String,
    },
}

/// Outcome of one dependency availability check.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub reason: String,
}

/// Aggregated readiness of all upstream dependencies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadyReport {
    /// Hard-required dependencies that failed; readiness fails when non-empty.
    pub errors: Vec<ServiceStatus>,
    /// Soft dependencies that failed; reported without failing readiness.
    pub warnings: Vec<ServiceStatus>,
}

impl ReadyReport {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Gateway client holding the shared HTTP connection pool and the upstream
/// endpoint configuration.
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn classify(service: &'static str, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout { service }
        } else {
            UpstreamError::Connection {
                service,
                message: error.to_string(),
            }
        }
    }

    /// GET a JSON document. Non-success status and undecodable bodies yield
    /// `Ok(None)`.
    pub async fn fetch_json(
        &self,
        service: &'static str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>, UpstreamError> {
        let mut request = self.http.get(url).header("Accept", "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|error| Self::classify(service, error))?;

        if !response.status().is_success() {
            debug!("{} answered {} for {}", service, response.status(), url);
            return Ok(None);
        }

        Ok(response.json().await.ok())
    }

    /// POST a JSON body and read a JSON document back. Same normalization
    /// as `fetch_json`.
    pub async fn fetch_json_post(
        &self,
        service: &'static str,
        url: &str,
        body: &Value,
    ) -> Result<Option<Value>, UpstreamError> {
        let response = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|error| Self::classify(service, error))?;

        if !response.status().is_success() {
            debug!("{} answered {} for {}", service, response.status(), url);
            return Ok(None);
        }

        Ok(response.json().await.ok())
    }

    fn decode_or_default<T: DeserializeOwned + Default>(value: Option<Value>) -> T {
        value
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Run a query against the triple store. Anything but a well-formed
    /// bindings table normalizes to an empty one.
    pub async fn query_sparql(&self, query: &str) -> Result<SparqlResponse, UpstreamError> {
        let value = self
            .fetch_json("sparql", &self.config.sparql_url, &[("query", query)])
            .await?;
        Ok(Self::decode_or_default(value))
    }

    async fn query_bindings(&self, query: &str) -> Result<Vec<Binding>, UpstreamError> {
        Ok(self.query_sparql(query).await?.into_bindings())
    }

    async fn query_count_list(&self, query: &str) -> Result<Vec<OrgCount>, UpstreamError> {
        Ok(count_list_from_bindings(&self.query_sparql(query).await?))
    }

    /// One organization from the organization registry.
    pub async fn fetch_organization(
        &self,
        id: &str,
    ) -> Result<RegistryOrganization, UpstreamError> {
        let url = format!(
            "{}/organizations/{}",
            self.config.organization_catalog_url, id
        );
        let value = self.fetch_json("organization registry", &url, &[]).await?;
        Ok(Self::decode_or_default(value))
    }

    /// The organization population, optionally restricted to an org-path.
    pub async fn fetch_organizations(
        &self,
        org_path: Option<&str>,
    ) -> Result<Vec<RegistryOrganization>, UpstreamError> {
        let url = format!("{}/organizations", self.config.organization_catalog_url);
        let params: Vec<(&str, &str)> = match org_path {
            Some(org_path) => vec![("orgPath", org_path)],
            None => Vec::new(),
        };
        let value = self
            .fetch_json("organization registry", &url, &params)
            .await?;
        Ok(Self::decode_or_default(value))
    }

    /// One organization from the national company registry.
    pub async fn fetch_company_record(&self, id: &str) -> Result<CompanyRecord, UpstreamError> {
        let url = format!(
            "{}/enhetsregisteret/api/enheter/{}",
            self.config.company_registry_url, id
        );
        let value = self.fetch_json("company registry", &url, &[]).await?;
        Ok(Self::decode_or_default(value))
    }

    /// Quality assessment for a set of dataset URIs.
    pub async fn fetch_dataset_scores(
        &self,
        dataset_uris: &[String],
    ) -> Result<QualityAssessment, UpstreamError> {
        let url = format!("{}/api/scores", self.config.metadata_quality_url);
        let value = self
            .fetch_json_post("metadata quality", &url, &json!({ "datasets": dataset_uris }))
            .await?;
        Ok(Self::decode_or_default(value))
    }

    /// County organizations from the reference data service.
    pub async fn fetch_county_organizations(
        &self,
    ) -> Result<CountyOrganizations, UpstreamError> {
        let url = format!("{}/fylkeorganisasjoner", self.config.reference_data_url);
        let value = self.fetch_json("reference data", &url, &[]).await?;
        Ok(Self::decode_or_default(value))
    }

    /// Municipality organizations from the reference data service.
    pub async fn fetch_municipality_organizations(
        &self,
    ) -> Result<MunicipalityOrganizations, UpstreamError> {
        let url = format!("{}/kommuneorganisasjoner", self.config.reference_data_url);
        let value = self.fetch_json("reference data", &url, &[]).await?;
        Ok(Self::decode_or_default(value))
    }

    /// Datasets published by one organization.
    pub async fn query_publisher_datasets(
        &self,
        id: &str,
        filter: CatalogFilter,
    ) -> Result<Vec<Binding>, UpstreamError> {
        let query = if filter.is_nap() {
            sparql::nap_org_datasets_query(id)
        } else {
            sparql::org_datasets_query(id)
        };
        self.query_bindings(&query).await
    }

    /// Data services published by one organization. The transport filter
    /// has no data services, so it short-circuits to an empty list.
    pub async fn query_publisher_data_services(
        &self,
        id: &str,
        filter: CatalogFilter,
    ) -> Result<Vec<Binding>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_bindings(&sparql::org_data_services_query(id))
            .await
    }

    /// Concepts published by one organization; empty under the transport
    /// filter.
    pub async fn query_publisher_concepts(
        &self,
        id: &str,
        filter: CatalogFilter,
    ) -> Result<Vec<Binding>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_bindings(&sparql::org_concepts_query(id)).await
    }

    /// Information models published by one organization; empty under the
    /// transport filter.
    pub async fn query_publisher_information_models(
        &self,
        id: &str,
        filter: CatalogFilter,
    ) -> Result<Vec<Binding>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_bindings(&sparql::org_information_models_query(id))
            .await
    }

    /// Dataset counts grouped by publisher.
    pub async fn query_datasets_by_publisher(
        &self,
        filter: CatalogFilter,
    ) -> Result<Vec<OrgCount>, UpstreamError> {
        let query = if filter.is_nap() {
            sparql::nap_datasets_by_publisher_query()
        } else {
            sparql::datasets_by_publisher_query()
        };
        self.query_count_list(&query).await
    }

    /// Data service counts grouped by publisher; empty under the transport
    /// filter.
    pub async fn query_data_services_by_publisher(
        &self,
        filter: CatalogFilter,
    ) -> Result<Vec<OrgCount>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_count_list(&sparql::data_services_by_publisher_query())
            .await
    }

    /// Concept counts grouped by publisher; empty under the transport filter.
    pub async fn query_concepts_by_publisher(
        &self,
        filter: CatalogFilter,
    ) -> Result<Vec<OrgCount>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_count_list(&sparql::concepts_by_publisher_query())
            .await
    }

    /// Information model counts grouped by publisher; empty under the
    /// transport filter.
    pub async fn query_information_models_by_publisher(
        &self,
        filter: CatalogFilter,
    ) -> Result<Vec<OrgCount>, UpstreamError> {
        if filter.is_nap() {
            return Ok(Vec::new());
        }
        self.query_count_list(&sparql::information_models_by_publisher_query())
            .await
    }

    /// Format metrics stream for the dataset report.
    pub async fn query_dataset_format_metrics(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::dataset_format_report_query())
            .await
    }

    /// General metrics stream for the dataset report.
    pub async fn query_dataset_general_metrics(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::dataset_general_report_query())
            .await
    }

    /// Publisher metrics stream for the dataset report.
    pub async fn query_dataset_publisher_metrics(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::dataset_publisher_report_query())
            .await
    }

    /// Metrics stream for the data service report.
    pub async fn query_data_services_report(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::data_services_report_query())
            .await
    }

    /// Metrics stream for the concept report.
    pub async fn query_concepts_report(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::concepts_report_query()).await
    }

    /// Metrics stream for the information model report.
    pub async fn query_information_models_report(&self) -> Result<Vec<Binding>, UpstreamError> {
        self.query_bindings(&sparql::information_models_report_query())
            .await
    }

    async fn check_available(&self, service: &'static str, url: &str) -> Option<ServiceStatus> {
        let outcome = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await;

        match outcome {
            Ok(response) if response.status().is_success() => None,
            Ok(response) => Some(ServiceStatus {
                service,
                reason: format!("{} answered {}", url, response.status()),
            }),
            Err(error) => Some(ServiceStatus {
                service,
                reason: format!("error contacting {}: {}", url, error),
            }),
        }
    }

    /// Probe all upstream dependencies concurrently. The organization
    /// registry is hard-required; the rest are soft.
    pub async fn check_ready(&self) -> ReadyReport {
        let registry_url = format!("{}/ping", self.config.organization_catalog_url);
        let sparql_url = format!("{}?query=ASK%20%7B%7D", self.config.sparql_url);
        let quality_url = format!("{}/ping", self.config.metadata_quality_url);
        let company_url = format!(
            "{}/enhetsregisteret/api",
            self.config.company_registry_url
        );

        let (registry, sparql, quality, company) = tokio::join!(
            self.check_available("organization registry", &registry_url),
            self.check_available("sparql", &sparql_url),
            self.check_available("metadata quality", &quality_url),
            self.check_available("company registry", &company_url),
        );

        let mut report = ReadyReport::default();
        if let Some(status) = registry {
            report.errors.push(status);
        }
        for status in [sparql, quality, company].into_iter().flatten() {
            report.warnings.push(status);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_or_default_tolerates_wrong_shape() {
        // A list where an organization record is expected.
        let decoded: RegistryOrganization =
            UpstreamClient::decode_or_default(Some(json!(["item1", "item2"])));
        assert!(decoded.organization_id.is_none());

        let decoded: QualityAssessment = UpstreamClient::decode_or_default(None);
        assert!(decoded.aggregations.is_empty());
    }

    #[test]
    fn test_decode_or_default_accepts_expected_shape() {
        let decoded: RegistryOrganization = UpstreamClient::decode_or_default(Some(json!({
            "organizationId": "12345678",
            "name": "Test Org"
        })));
        assert_eq!(decoded.organization_id.as_deref(), Some("12345678"));
        assert_eq!(decoded.name.as_deref(), Some("Test Org"));
    }

    #[test]
    fn test_ready_report_is_ready() {
        let mut report = ReadyReport::default();
        assert!(report.is_ready());

        report.warnings.push(ServiceStatus {
            service: "sparql",
            reason: "timeout".to_string(),
        });
        assert!(report.is_ready());

        report.errors.push(ServiceStatus {
            service: "organization registry",
            reason: "connection refused".to_string(),
        });
        assert!(!report.is_ready());
    }
}
