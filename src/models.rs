//! Data models for the organization catalog BFF.
//!
//! This module contains the core data structures: the typed records read
//! from upstream services and the response shapes served by the HTTP layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Filter mode selected by the `filter` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFilter {
    /// No filtering, the default.
    None,
    /// Restrict to entities flagged for the national transport portal.
    Nap,
}

impl CatalogFilter {
    /// Parse the `filter` query parameter. `None` means the parameter value
    /// was invalid and the request should be rejected with 400.
    pub fn from_param(param: Option<&str>) -> Option<Self> {
        match param {
            None => Some(CatalogFilter::None),
            Some("transportportal") => Some(CatalogFilter::Nap),
            Some(_) => None,
        }
    }

    pub fn is_nap(self) -> bool {
        self == CatalogFilter::Nap
    }
}

/// Theme profile selected by the `themeprofile` query parameter on the
/// dataset report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeProfile {
    Transport,
}

impl ThemeProfile {
    /// Parse the `themeprofile` query parameter. `Err` means the value was
    /// invalid; `Ok(None)` means no profile was requested.
    pub fn from_param(param: Option<&str>) -> Result<Option<Self>, ()> {
        match param {
            None => Ok(None),
            Some("transport") => Ok(Some(ThemeProfile::Transport)),
            Some(_) => Err(()),
        }
    }
}

/// Organization record as served by the organization registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryOrganization {
    pub organization_id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub pref_label: HashMap<String, String>,
    pub org_path: Option<String>,
}

/// Nested legal-form block in a company registry record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyOrgForm {
    pub beskrivelse: Option<String>,
}

/// Nested code block (industry or sector) in a company registry record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyCode {
    pub kode: Option<String>,
    pub beskrivelse: Option<String>,
}

/// Organization record as served by the national company registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyRecord {
    pub organisasjonsform: Option<CompanyOrgForm>,
    pub naeringskode1: Option<CompanyCode>,
    #[serde(rename = "institusjonellSektorkode")]
    pub institusjonell_sektorkode: Option<CompanyCode>,
    pub hjemmeside: Option<String>,
    /// Served as either a number or a numeric string depending on registry
    /// version, so kept raw until mapped.
    #[serde(rename = "antallAnsatte")]
    pub antall_ansatte: Option<serde_json::Value>,
}

/// One score/max-score pair from the metadata quality service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreAggregation {
    pub score: Option<serde_json::Value>,
    pub max_score: Option<serde_json::Value>,
}

/// Quality assessment response for a set of dataset URIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QualityAssessment {
    #[serde(default)]
    pub aggregations: Vec<ScoreAggregation>,
}

/// Region organization entry from the reference-data tables. The county and
/// municipality tables use different field names for the same concepts.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionOrganization {
    #[serde(alias = "fylkesnummer", alias = "kommunenummer")]
    pub number: String,
    #[serde(rename = "organisasjonsnummer")]
    pub organization_number: String,
    #[serde(alias = "fylkesnavn", alias = "kommunenavn")]
    pub name: String,
}

/// Reference-data response listing county organizations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountyOrganizations {
    #[serde(rename = "fylkeOrganisasjoner", default)]
    pub organizations: Vec<RegionOrganization>,
}

/// Reference-data response listing municipality organizations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalityOrganizations {
    #[serde(rename = "kommuneOrganisasjoner", default)]
    pub organizations: Vec<RegionOrganization>,
}

/// Merged organization details served in a catalog response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetails {
    pub organization_id: String,
    pub name: Option<String>,
    pub pref_label: HashMap<String, String>,
    pub org_path: Option<String>,
    pub org_type: Option<String>,
    pub sector_code: Option<String>,
    pub industry_code: Option<String>,
    pub homepage: Option<String>,
    pub see_also: Option<String>,
    pub number_of_employees: Option<i64>,
    pub icon: String,
}

/// Normalized 0-100 quality metric for an organization's dataset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogQualityScore {
    pub score: u64,
    pub percentage: u64,
}

/// Dataset count section of an organization catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetCounts {
    pub total_count: u64,
    pub new_count: u64,
    pub authoritative_count: u64,
    pub open_count: u64,
    pub quality: Option<CatalogQualityScore>,
}

/// Count section for data services, concepts and information models.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub total_count: u64,
    pub new_count: u64,
}

/// One organization's full catalog.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationCatalog {
    pub organization: Option<OrganizationDetails>,
    pub datasets: DatasetCounts,
    pub dataservices: EntityCounts,
    pub concepts: EntityCounts,
    pub informationmodels: EntityCounts,
}

/// Lightweight per-organization entry for the catalog list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCatalogSummary {
    pub id: String,
    pub name: Option<String>,
    pub pref_label: HashMap<String, String>,
    pub org_path: Option<String>,
    pub dataset_count: u64,
    pub dataservice_count: u64,
    pub concept_count: u64,
    pub informationmodel_count: u64,
}

impl OrganizationCatalogSummary {
    /// True when the organization has no registered content of any type.
    pub fn is_empty(&self) -> bool {
        self.dataset_count == 0
            && self.dataservice_count == 0
            && self.concept_count == 0
            && self.informationmodel_count == 0
    }
}

/// Response wrapper for the catalog list view.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationCatalogList {
    pub organizations: Vec<OrganizationCatalogSummary>,
}

/// Grouping key of a category node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One category node with the summaries grouped under it.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationCategory {
    pub category: Category,
    pub organizations: Vec<OrganizationCatalogSummary>,
}

/// Response wrapper for the category views.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryList {
    pub categories: Vec<OrganizationCategory>,
}

/// Key/occurrence-count pair, ordered by first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

/// Flat statistical report over all datasets.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetsReport {
    pub total_objects: u64,
    pub new_last_week: u64,
    pub organization_count: usize,
    pub opendata: u64,
    pub national_component: u64,
    pub org_paths: Vec<KeyCount>,
    pub all_themes: Vec<KeyCount>,
    pub formats: Vec<KeyCount>,
    pub access_rights: Vec<KeyCount>,
}

/// Flat statistical report over all data services.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataServicesReport {
    pub total_objects: u64,
    pub new_last_week: u64,
    pub organization_count: usize,
    pub org_paths: Vec<KeyCount>,
    pub formats: Vec<KeyCount>,
}

/// Flat statistical report over all concepts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptsReport {
    pub total_objects: u64,
    pub new_last_week: u64,
    pub organization_count: usize,
    pub org_paths: Vec<KeyCount>,
    pub most_in_use: Vec<KeyCount>,
}

/// Flat statistical report over all information models.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationModelsReport {
    pub total_objects: u64,
    pub new_last_week: u64,
    pub organization_count: usize,
    pub org_paths: Vec<KeyCount>,
}
