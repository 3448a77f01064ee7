//! Mapping fetched organization and catalog data into response records.
//!
//! Everything here is pure: the service layer fetches, these functions
//! merge. Numeric values from upstream arrive as numbers or numeric
//! strings; anything unparsable is treated as absent.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::aggregation::recency::issued_is_new;
use crate::config::UpstreamConfig;
use crate::models::{
    CatalogQualityScore, Category, CompanyCode, CompanyRecord, DatasetCounts, EntityCounts,
    OrganizationCatalog, OrganizationCatalogSummary, OrganizationCategory, OrganizationDetails,
    QualityAssessment, RegionOrganization, RegistryOrganization,
};
use crate::upstream::bindings::{binding_value, Binding, OrgCount};

fn value_to_i64(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        serde_json::Value::String(string) => string.parse().ok(),
        _ => None,
    }
}

fn value_to_u64(value: Option<&serde_json::Value>) -> Option<u64> {
    value_to_i64(value).and_then(|number| u64::try_from(number).ok())
}

/// Sum score/max-score pairs into a catalog quality score.
///
/// Returns `None` for an empty aggregation list, any pair with a missing or
/// non-numeric member, or a zero maximum.
pub fn map_catalog_quality_score(assessment: &QualityAssessment) -> Option<CatalogQualityScore> {
    if assessment.aggregations.is_empty() {
        return None;
    }

    let mut score_sum = 0;
    let mut max_sum = 0;
    for aggregation in &assessment.aggregations {
        score_sum += value_to_u64(aggregation.score.as_ref())?;
        max_sum += value_to_u64(aggregation.max_score.as_ref())?;
    }

    if max_sum == 0 {
        return None;
    }

    Some(CatalogQualityScore {
        score: score_sum,
        percentage: ((score_sum * 100) as f64 / max_sum as f64).round() as u64,
    })
}

fn code_with_description(code: Option<&CompanyCode>) -> Option<String> {
    let code = code?;
    match (&code.kode, &code.beskrivelse) {
        (Some(kode), Some(beskrivelse)) => Some(format!("{} {}", kode, beskrivelse)),
        (Some(kode), None) => Some(kode.clone()),
        _ => None,
    }
}

fn company_record_is_empty(company: &CompanyRecord) -> bool {
    company.organisasjonsform.is_none()
        && company.naeringskode1.is_none()
        && company.institusjonell_sektorkode.is_none()
        && company.hjemmeside.is_none()
        && company.antall_ansatte.is_none()
}

/// Merge the organization registry record with the company registry record.
///
/// The registry record carries the identity (id, name, labels, org-path);
/// the company record fills in legal form, sector/industry codes, homepage
/// and employee count. `None` when the registry record has no id.
pub fn map_org_details(
    registry: &RegistryOrganization,
    company: &CompanyRecord,
    config: &UpstreamConfig,
) -> Option<OrganizationDetails> {
    let organization_id = registry
        .organization_id
        .clone()
        .filter(|id| !id.is_empty())?;

    let see_also = if company_record_is_empty(company) {
        None
    } else {
        Some(format!(
            "{}/enhetsregisteret/oppslag/enheter/{}",
            config.company_registry_url, organization_id
        ))
    };

    Some(OrganizationDetails {
        icon: format!("{}/{}", config.org_logo_url, organization_id),
        organization_id,
        name: registry.name.clone(),
        pref_label: registry.pref_label.clone(),
        org_path: registry.org_path.clone(),
        org_type: company
            .organisasjonsform
            .as_ref()
            .and_then(|form| form.beskrivelse.clone()),
        sector_code: code_with_description(company.institusjonell_sektorkode.as_ref()),
        industry_code: code_with_description(company.naeringskode1.as_ref()),
        homepage: company.hjemmeside.clone(),
        see_also,
        number_of_employees: value_to_i64(company.antall_ansatte.as_ref()),
    })
}

fn flag_is_true(row: &Binding, var: &str) -> bool {
    binding_value(row, var) == Some("true")
}

/// Derive the dataset count section from the publisher-scoped dataset rows
/// and the quality assessment.
pub fn map_org_datasets(
    rows: &[Binding],
    assessment: &QualityAssessment,
    cutoff: DateTime<Utc>,
) -> DatasetCounts {
    DatasetCounts {
        total_count: rows.len() as u64,
        new_count: rows.iter().filter(|row| issued_is_new(row, cutoff)).count() as u64,
        authoritative_count: rows
            .iter()
            .filter(|row| flag_is_true(row, "isAuthoritative"))
            .count() as u64,
        open_count: rows
            .iter()
            .filter(|row| flag_is_true(row, "isOpenData"))
            .count() as u64,
        quality: map_catalog_quality_score(assessment),
    }
}

/// Derive a total/new count section from publisher-scoped entity rows.
pub fn map_org_entity_counts(rows: &[Binding], cutoff: DateTime<Utc>) -> EntityCounts {
    EntityCounts {
        total_count: rows.len() as u64,
        new_count: rows.iter().filter(|row| issued_is_new(row, cutoff)).count() as u64,
    }
}

/// Dataset URIs from publisher-scoped dataset rows, input to the quality
/// score lookup.
pub fn dataset_uris(rows: &[Binding]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| binding_value(row, "dataset"))
        .map(str::to_string)
        .collect()
}

/// Compose one organization's catalog from its fetched parts.
///
/// Having a catalog means having at least one dataset: with no dataset rows
/// the catalog is absent, even when the registry knows the organization.
pub fn build_organization_catalog(
    registry: &RegistryOrganization,
    company: &CompanyRecord,
    datasets: &[Binding],
    data_services: &[Binding],
    concepts: &[Binding],
    information_models: &[Binding],
    assessment: &QualityAssessment,
    cutoff: DateTime<Utc>,
    config: &UpstreamConfig,
) -> Option<OrganizationCatalog> {
    if datasets.is_empty() {
        return None;
    }

    Some(OrganizationCatalog {
        organization: map_org_details(registry, company, config),
        datasets: map_org_datasets(datasets, assessment, cutoff),
        dataservices: map_org_entity_counts(data_services, cutoff),
        concepts: map_org_entity_counts(concepts, cutoff),
        informationmodels: map_org_entity_counts(information_models, cutoff),
    })
}

/// Per-organization entity counts merged from the four grouped count lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrgCounts {
    pub datasets: u64,
    pub dataservices: u64,
    pub concepts: u64,
    pub informationmodels: u64,
}

/// Merge the four count lists into one record per organization id.
pub fn collect_org_counts(
    datasets: &[OrgCount],
    dataservices: &[OrgCount],
    concepts: &[OrgCount],
    informationmodels: &[OrgCount],
) -> HashMap<String, OrgCounts> {
    let mut counts: HashMap<String, OrgCounts> = HashMap::new();
    for entry in datasets {
        counts.entry(entry.org.clone()).or_default().datasets = entry.count;
    }
    for entry in dataservices {
        counts.entry(entry.org.clone()).or_default().dataservices = entry.count;
    }
    for entry in concepts {
        counts.entry(entry.org.clone()).or_default().concepts = entry.count;
    }
    for entry in informationmodels {
        counts.entry(entry.org.clone()).or_default().informationmodels = entry.count;
    }
    counts
}

/// Build one summary per organization in the population. Organizations
/// absent from a count list get 0; all-zero summaries are dropped unless
/// `include_empty` is set.
pub fn map_org_summaries(
    organizations: &[RegistryOrganization],
    counts: &HashMap<String, OrgCounts>,
    include_empty: bool,
) -> Vec<OrganizationCatalogSummary> {
    let mut summaries = Vec::new();
    for organization in organizations {
        let Some(id) = organization
            .organization_id
            .clone()
            .filter(|id| !id.is_empty())
        else {
            continue;
        };

        let org_counts = counts.get(&id).copied().unwrap_or_default();
        let summary = OrganizationCatalogSummary {
            id,
            name: organization.name.clone(),
            pref_label: organization.pref_label.clone(),
            org_path: organization.org_path.clone(),
            dataset_count: org_counts.datasets,
            dataservice_count: org_counts.dataservices,
            concept_count: org_counts.concepts,
            informationmodel_count: org_counts.informationmodels,
        };
        if include_empty || !summary.is_empty() {
            summaries.push(summary);
        }
    }
    summaries
}

/// Drop summaries with no registered content of any type.
pub fn remove_empty_summaries(
    summaries: Vec<OrganizationCatalogSummary>,
) -> Vec<OrganizationCatalogSummary> {
    summaries
        .into_iter()
        .filter(|summary| !summary.is_empty())
        .collect()
}

fn group_into_categories(
    summaries: Vec<OrganizationCatalogSummary>,
    category_for: impl Fn(&OrganizationCatalogSummary) -> Option<Category>,
) -> Vec<OrganizationCategory> {
    let mut categories: Vec<OrganizationCategory> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for summary in summaries {
        let Some(category) = category_for(&summary) else {
            continue;
        };
        let position = match index.get(&category.id) {
            Some(position) => *position,
            None => {
                index.insert(category.id.clone(), categories.len());
                categories.push(OrganizationCategory {
                    category,
                    organizations: Vec::new(),
                });
                categories.len() - 1
            }
        };
        categories[position].organizations.push(summary);
    }

    categories
}

fn parent_segment(summary: &OrganizationCatalogSummary) -> String {
    let path = summary.org_path.as_deref().unwrap_or("");
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    // Paths not ending in the organization's own id do not fit the expected
    // shape; those group under the literal last segment.
    if parts.len() >= 2 && parts.last() == Some(&summary.id.as_str()) {
        parts[parts.len() - 2].to_string()
    } else {
        parts.last().copied().unwrap_or("").to_string()
    }
}

/// Group summaries by the org-path segment immediately preceding the
/// organization's own id segment.
pub fn categorise_by_parent_org(
    summaries: Vec<OrganizationCatalogSummary>,
    include_empty: bool,
) -> Vec<OrganizationCategory> {
    let summaries = if include_empty {
        summaries
    } else {
        remove_empty_summaries(summaries)
    };

    let mut categories = group_into_categories(summaries, |summary| {
        Some(Category {
            id: parent_segment(summary),
            name: None,
        })
    });
    if !include_empty {
        categories.retain(|node| !node.organizations.is_empty());
    }
    categories
}

/// Region lookup tables, mapping county and municipality numbers to the
/// region organization that represents them.
#[derive(Debug, Clone, Default)]
pub struct RegionLookup {
    counties: HashMap<String, RegionOrganization>,
    municipalities: HashMap<String, RegionOrganization>,
}

impl RegionLookup {
    pub fn new(counties: Vec<RegionOrganization>, municipalities: Vec<RegionOrganization>) -> Self {
        Self {
            counties: counties
                .into_iter()
                .map(|region| (region.number.clone(), region))
                .collect(),
            municipalities: municipalities
                .into_iter()
                .map(|region| (region.number.clone(), region))
                .collect(),
        }
    }

    fn region_for_path(&self, org_path: Option<&str>) -> Option<&RegionOrganization> {
        let parts: Vec<&str> = org_path?.trim_matches('/').split('/').collect();
        if parts.len() < 2 {
            return None;
        }
        match parts[0] {
            "FYLKE" => self.counties.get(parts[1]),
            "KOMMUNE" => self.municipalities.get(parts[1]),
            _ => None,
        }
    }
}

/// Group summaries by county/municipality membership. Organizations whose
/// org-path does not resolve against the lookup are omitted.
pub fn categorise_by_municipality(
    summaries: Vec<OrganizationCatalogSummary>,
    lookup: &RegionLookup,
    include_empty: bool,
) -> Vec<OrganizationCategory> {
    let summaries = if include_empty {
        summaries
    } else {
        remove_empty_summaries(summaries)
    };

    let mut categories = group_into_categories(summaries, |summary| {
        lookup
            .region_for_path(summary.org_path.as_deref())
            .map(|region| Category {
                id: region.organization_number.clone(),
                name: Some(region.name.clone()),
            })
    });
    if !include_empty {
        categories.retain(|node| !node.organizations.is_empty());
    }
    categories
}
