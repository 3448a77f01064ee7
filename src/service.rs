//! Per-request orchestration: concurrent upstream fan-out and merging.
//!
//! Each operation launches its gateway calls together and suspends until
//! all complete. Branch failures degrade to their empty defaults except
//! where a branch is load-bearing: the dataset existence check for a single
//! catalog, and the organization population for the list and category
//! views. Those propagate to the HTTP layer.

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::aggregation::catalog::{
    build_organization_catalog, categorise_by_municipality, categorise_by_parent_org,
    collect_org_counts, dataset_uris, map_org_summaries, RegionLookup,
};
use crate::aggregation::metrics::{
    gather_concept_metrics, gather_data_service_metrics, gather_dataset_metrics,
    gather_information_model_metrics,
};
use crate::aggregation::recency::week_cutoff;
use crate::aggregation::report::{
    build_concept_report, build_data_service_report, build_dataset_report,
    build_information_model_report,
};
use crate::models::{
    CatalogFilter, CategoryList, ConceptsReport, DataServicesReport, DatasetsReport,
    InformationModelsReport, OrganizationCatalog, OrganizationCatalogList,
    OrganizationCatalogSummary, RegistryOrganization, ThemeProfile,
};
use crate::upstream::{UpstreamClient, UpstreamError};

const STATE_ORG_PATH: &str = "/STAT";
const MUNICIPALITY_ORG_PATHS: [&str; 2] = ["/FYLKE", "/KOMMUNE"];

fn tolerate<T: Default>(outcome: Result<T, UpstreamError>, branch: &str) -> T {
    match outcome {
        Ok(value) => value,
        Err(error) => {
            warn!("{} degraded to empty: {}", branch, error);
            T::default()
        }
    }
}

/// Build one organization's catalog, or `None` when the organization has no
/// datasets under the current filter.
pub async fn get_organization_catalog(
    client: &UpstreamClient,
    id: &str,
    filter: CatalogFilter,
) -> Result<Option<OrganizationCatalog>, UpstreamError> {
    debug!("fetching catalog for organization {}", id);

    let (registry, company, datasets, data_services, concepts, information_models) = tokio::join!(
        client.fetch_organization(id),
        client.fetch_company_record(id),
        client.query_publisher_datasets(id, filter),
        client.query_publisher_data_services(id, filter),
        client.query_publisher_concepts(id, filter),
        client.query_publisher_information_models(id, filter),
    );

    // Having a catalog means having at least one dataset; this branch is
    // load-bearing and its failure propagates.
    let datasets = datasets?;
    if datasets.is_empty() {
        return Ok(None);
    }

    let registry = tolerate(registry, "organization registry record");
    let company = tolerate(company, "company registry record");
    let data_services = tolerate(data_services, "publisher data services");
    let concepts = tolerate(concepts, "publisher concepts");
    let information_models = tolerate(information_models, "publisher information models");

    // The score lookup needs the dataset URIs, so it runs after the dataset
    // branch; a failure here only costs the quality score.
    let assessment = tolerate(
        client.fetch_dataset_scores(&dataset_uris(&datasets)).await,
        "dataset score lookup",
    );

    Ok(build_organization_catalog(
        &registry,
        &company,
        &datasets,
        &data_services,
        &concepts,
        &information_models,
        &assessment,
        week_cutoff(Utc::now().date_naive()),
        client.config(),
    ))
}

/// Fetch the organization population, optionally restricted to a set of
/// org-paths, first occurrence winning on duplicates.
async fn fetch_population(
    client: &UpstreamClient,
    org_paths: Option<&[&str]>,
) -> Result<Vec<RegistryOrganization>, UpstreamError> {
    let Some(org_paths) = org_paths else {
        return client.fetch_organizations(None).await;
    };

    let batches = try_join_all(
        org_paths
            .iter()
            .map(|&org_path| client.fetch_organizations(Some(org_path))),
    )
    .await?;

    let mut seen = std::collections::HashSet::new();
    let mut population = Vec::new();
    for organization in batches.into_iter().flatten() {
        let Some(id) = organization.organization_id.clone() else {
            continue;
        };
        if seen.insert(id) {
            population.push(organization);
        }
    }
    Ok(population)
}

async fn summarize_catalogs(
    client: &UpstreamClient,
    filter: CatalogFilter,
    org_paths: Option<&[&str]>,
    include_empty: bool,
) -> Result<Vec<OrganizationCatalogSummary>, UpstreamError> {
    let (organizations, datasets, data_services, concepts, information_models) = tokio::join!(
        fetch_population(client, org_paths),
        client.query_datasets_by_publisher(filter),
        client.query_data_services_by_publisher(filter),
        client.query_concepts_by_publisher(filter),
        client.query_information_models_by_publisher(filter),
    );

    // Without the population there is nothing to serve.
    let organizations = organizations?;

    let counts = collect_org_counts(
        &tolerate(datasets, "dataset counts"),
        &tolerate(data_services, "data service counts"),
        &tolerate(concepts, "concept counts"),
        &tolerate(information_models, "information model counts"),
    );

    Ok(map_org_summaries(&organizations, &counts, include_empty))
}

/// List all organization catalogs.
pub async fn get_organization_catalogs(
    client: &UpstreamClient,
    filter: CatalogFilter,
    include_empty: bool,
) -> Result<OrganizationCatalogList, UpstreamError> {
    debug!("fetching all catalogs");
    let organizations = summarize_catalogs(client, filter, None, include_empty).await?;
    Ok(OrganizationCatalogList { organizations })
}

/// State-sector organizations grouped by their parent organization.
pub async fn get_state_categories(
    client: &UpstreamClient,
    filter: CatalogFilter,
    include_empty: bool,
) -> Result<CategoryList, UpstreamError> {
    let summaries = summarize_catalogs(client, filter, Some(&[STATE_ORG_PATH][..]), true).await?;
    Ok(CategoryList {
        categories: categorise_by_parent_org(summaries, include_empty),
    })
}

/// County and municipality organizations grouped by region membership.
pub async fn get_municipality_categories(
    client: &UpstreamClient,
    filter: CatalogFilter,
    include_empty: bool,
) -> Result<CategoryList, UpstreamError> {
    let (summaries, counties, municipalities) = tokio::join!(
        summarize_catalogs(client, filter, Some(&MUNICIPALITY_ORG_PATHS[..]), true),
        client.fetch_county_organizations(),
        client.fetch_municipality_organizations(),
    );

    let summaries = summaries?;
    let lookup = RegionLookup::new(
        tolerate(counties, "county reference data").organizations,
        tolerate(municipalities, "municipality reference data").organizations,
    );

    Ok(CategoryList {
        categories: categorise_by_municipality(summaries, &lookup, include_empty),
    })
}

/// Build the dataset report. Reports are best-effort: a failed binding
/// stream contributes nothing instead of failing the report.
pub async fn get_dataset_report(
    client: &UpstreamClient,
    org_path: Option<&str>,
    theme_profile: Option<ThemeProfile>,
) -> DatasetsReport {
    let (format_rows, general_rows, publisher_rows) = tokio::join!(
        client.query_dataset_format_metrics(),
        client.query_dataset_general_metrics(),
        client.query_dataset_publisher_metrics(),
    );

    let metrics = gather_dataset_metrics(
        &tolerate(format_rows, "dataset format metrics"),
        &tolerate(general_rows, "dataset general metrics"),
        &tolerate(publisher_rows, "dataset publisher metrics"),
    );

    build_dataset_report(
        &metrics,
        org_path,
        theme_profile,
        week_cutoff(Utc::now().date_naive()),
    )
}

/// Build the data service report.
pub async fn get_data_service_report(
    client: &UpstreamClient,
    org_path: Option<&str>,
) -> DataServicesReport {
    let rows = tolerate(
        client.query_data_services_report().await,
        "data service metrics",
    );
    let metrics = gather_data_service_metrics(&rows);
    build_data_service_report(&metrics, org_path, week_cutoff(Utc::now().date_naive()))
}

/// Build the concept report.
pub async fn get_concept_report(
    client: &UpstreamClient,
    org_path: Option<&str>,
) -> ConceptsReport {
    let rows = tolerate(client.query_concepts_report().await, "concept metrics");
    let metrics = gather_concept_metrics(&rows);
    build_concept_report(&metrics, org_path, week_cutoff(Utc::now().date_naive()))
}

/// Build the information model report.
pub async fn get_information_model_report(
    client: &UpstreamClient,
    org_path: Option<&str>,
) -> InformationModelsReport {
    let rows = tolerate(
        client.query_information_models_report().await,
        "information model metrics",
    );
    let metrics = gather_information_model_metrics(&rows);
    build_information_model_report(&metrics, org_path, week_cutoff(Utc::now().date_naive()))
}
