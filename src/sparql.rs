//! SPARQL query catalog.
//!
//! Query text for the triple store, one builder per report type and
//! publisher-scoped lookup. The queries are plain strings; the gateway
//! sends them as the `query` parameter.

const DCAT_PREFIXES: &str = "\
PREFIX dct: <http://purl.org/dc/terms/>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX dcat: <http://www.w3.org/ns/dcat#>";

const FDK_PREFIX: &str = "\
PREFIX fdk: <https://raw.githubusercontent.com/Informasjonsforvaltning/fdk-reasoning-service/main/src/main/resources/ontology/fdk.owl#>";

const ORG_PREFIX: &str = "\
PREFIX br: <https://raw.githubusercontent.com/Informasjonsforvaltning/organization-catalog/main/src/main/resources/ontology/organization-catalog.owl#>";

const SKOS_PREFIX: &str = "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>";

const MODELLDCAT_PREFIX: &str =
    "PREFIX modelldcatno: <https://data.norge.no/vocabulary/modelldcatno#>";

/// Datasets published by one organization.
pub fn org_datasets_query(organization_id: &str) -> String {
    format!(
        r#"{DCAT_PREFIXES}
{FDK_PREFIX}

SELECT DISTINCT ?dataset ?issued ?isAuthoritative ?isOpenData
WHERE {{
    ?dataset a dcat:Dataset .
    ?record foaf:primaryTopic ?dataset .
    ?record a dcat:CatalogRecord .
    ?record dct:issued ?issued .
    OPTIONAL {{ ?dataset fdk:isOpenData ?isOpenData . }}
    OPTIONAL {{ ?dataset fdk:isAuthoritative ?isAuthoritative . }}
    ?dataset dct:publisher ?publisher .
    ?publisher dct:identifier "{organization_id}" .
}}"#
    )
}

/// Transport-portal datasets published by one organization.
pub fn nap_org_datasets_query(organization_id: &str) -> String {
    format!(
        r#"{DCAT_PREFIXES}
{FDK_PREFIX}

SELECT DISTINCT ?dataset ?issued ?isAuthoritative ?isOpenData
WHERE {{
    ?dataset a dcat:Dataset .
    ?dataset fdk:isRelatedToTransportportal ?isNAP .
    FILTER (STR(?isNAP) = "true")
    ?record foaf:primaryTopic ?dataset .
    ?record a dcat:CatalogRecord .
    ?record dct:issued ?issued .
    OPTIONAL {{ ?dataset fdk:isOpenData ?isOpenData . }}
    OPTIONAL {{ ?dataset fdk:isAuthoritative ?isAuthoritative . }}
    ?dataset dct:publisher ?publisher .
    ?publisher dct:identifier "{organization_id}" .
}}"#
    )
}

/// Data services published by one organization.
pub fn org_data_services_query(organization_id: &str) -> String {
    format!(
        r#"{DCAT_PREFIXES}

SELECT DISTINCT ?service ?issued
WHERE {{
    ?service a dcat:DataService .
    ?record foaf:primaryTopic ?service .
    ?record a dcat:CatalogRecord .
    ?record dct:issued ?issued .
    ?service dct:publisher ?publisher .
    ?publisher dct:identifier "{organization_id}" .
}}"#
    )
}

/// Concepts published by one organization.
pub fn org_concepts_query(organization_id: &str) -> String {
    format!(
        r#"{DCAT_PREFIXES}
{SKOS_PREFIX}

SELECT DISTINCT ?concept ?issued
WHERE {{
    ?concept a skos:Concept .
    ?record foaf:primaryTopic ?concept .
    ?record a dcat:CatalogRecord .
    ?record dct:issued ?issued .
    ?concept dct:publisher ?publisher .
    ?publisher dct:identifier "{organization_id}" .
}}"#
    )
}

/// Information models published by one organization.
pub fn org_information_models_query(organization_id: &str) -> String {
    format!(
        r#"{DCAT_PREFIXES}
{MODELLDCAT_PREFIX}

SELECT DISTINCT ?model ?issued
WHERE {{
    ?model a modelldcatno:InformationModel .
    ?record foaf:primaryTopic ?model .
    ?record a dcat:CatalogRecord .
    ?record dct:issued ?issued .
    ?model dct:publisher ?publisher .
    ?publisher dct:identifier "{organization_id}" .
}}"#
    )
}

/// Dataset counts grouped by publisher.
pub fn datasets_by_publisher_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
SELECT ?organizationNumber (COUNT(DISTINCT ?dataset) AS ?count)
WHERE {{
    ?dataset a dcat:Dataset .
    ?record foaf:primaryTopic ?dataset .
    ?record a dcat:CatalogRecord .
    ?dataset dct:publisher ?publisher .
    ?publisher dct:identifier ?organizationNumber .
}}
GROUP BY ?organizationNumber"#
    )
}

/// Transport-portal dataset counts grouped by publisher.
pub fn nap_datasets_by_publisher_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{FDK_PREFIX}

SELECT ?organizationNumber (COUNT(DISTINCT ?dataset) AS ?count)
WHERE {{
    ?dataset a dcat:Dataset .
    ?record foaf:primaryTopic ?dataset .
    ?record a dcat:CatalogRecord .
    ?dataset fdk:isRelatedToTransportportal ?isNAP .
    FILTER (STR(?isNAP) = "true")
    ?dataset dct:publisher ?publisher .
    ?publisher dct:identifier ?organizationNumber .
}}
GROUP BY ?organizationNumber"#
    )
}

/// Data service counts grouped by publisher.
pub fn data_services_by_publisher_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
SELECT ?organizationNumber (COUNT(DISTINCT ?service) AS ?count)
WHERE {{
    ?service a dcat:DataService .
    ?record foaf:primaryTopic ?service .
    ?record a dcat:CatalogRecord .
    ?service dct:publisher ?publisher .
    ?publisher dct:identifier ?organizationNumber .
}}
GROUP BY ?organizationNumber"#
    )
}

/// Concept counts grouped by publisher.
pub fn concepts_by_publisher_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{SKOS_PREFIX}

SELECT ?organizationNumber (COUNT(DISTINCT ?concept) AS ?count)
WHERE {{
    ?concept a skos:Concept .
    ?record foaf:primaryTopic ?concept .
    ?record a dcat:CatalogRecord .
    ?concept dct:publisher ?publisher .
    ?publisher dct:identifier ?organizationNumber .
}}
GROUP BY ?organizationNumber"#
    )
}

/// Information model counts grouped by publisher.
pub fn information_models_by_publisher_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{MODELLDCAT_PREFIX}

SELECT ?organizationNumber (COUNT(DISTINCT ?model) AS ?count)
WHERE {{
    ?model a modelldcatno:InformationModel .
    ?record foaf:primaryTopic ?model .
    ?record a dcat:CatalogRecord .
    ?model dct:publisher ?publisher .
    ?publisher dct:identifier ?organizationNumber .
}}
GROUP BY ?organizationNumber"#
    )
}

/// General metrics stream for the dataset report.
pub fn dataset_general_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{FDK_PREFIX}
SELECT ?dataset ?firstHarvested ?theme ?accessRights ?provenance ?isOpenData ?transportportal
WHERE {{
  ?dataset a dcat:Dataset .
  ?record foaf:primaryTopic ?dataset .
  ?record a dcat:CatalogRecord .
  ?record dct:issued ?firstHarvested .

  OPTIONAL {{ ?dataset dcat:theme ?theme . }}
  OPTIONAL {{ ?dataset dct:accessRights ?accessRights . }}
  OPTIONAL {{ ?dataset dct:provenance ?provenance . }}
  OPTIONAL {{ ?dataset fdk:isOpenData ?isOpenData . }}
  OPTIONAL {{ ?dataset fdk:isRelatedToTransportportal ?transportportal . }}
}}"#
    )
}

/// Format metrics stream for the dataset report.
pub fn dataset_format_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
SELECT ?dataset ?mediaType ?format
WHERE {{
  ?dataset a dcat:Dataset .
  ?record foaf:primaryTopic ?dataset .
  ?record a dcat:CatalogRecord .

  ?dataset dcat:distribution ?distribution .
  ?distribution dcat:mediaType ?mediaType .
  ?distribution dct:format ?format .
}}"#
    )
}

/// Publisher metrics stream for the dataset report.
pub fn dataset_publisher_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{ORG_PREFIX}
SELECT ?dataset ?orgId ?orgPath
WHERE {{
  ?dataset a dcat:Dataset .
  ?record foaf:primaryTopic ?dataset .
  ?record a dcat:CatalogRecord .

  ?dataset dct:publisher ?publisher .
  ?publisher dct:identifier ?orgId .
  ?publisher br:orgPath ?orgPath .
}}"#
    )
}

/// Single metrics stream for the data service report.
pub fn data_services_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{ORG_PREFIX}
SELECT DISTINCT ?service ?firstHarvested ?mediaType ?format ?orgId ?orgPath
WHERE {{
  ?service a dcat:DataService .
  ?record foaf:primaryTopic ?service .
  ?record a dcat:CatalogRecord .
  ?record dct:issued ?firstHarvested .

  OPTIONAL {{ ?service dcat:mediaType ?mediaType . }}
  OPTIONAL {{ ?service dct:format ?format . }}

  OPTIONAL {{
    ?service dct:publisher ?publisher .
    ?publisher dct:identifier ?orgId .
    ?publisher br:orgPath ?orgPath .
  }}
}}"#
    )
}

/// Single metrics stream for the concept report.
pub fn concepts_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{SKOS_PREFIX}
{ORG_PREFIX}
SELECT DISTINCT ?concept ?firstHarvested ?referer ?orgId ?orgPath
WHERE {{
  ?concept a skos:Concept .
  ?record foaf:primaryTopic ?concept .
  ?record a dcat:CatalogRecord .
  ?record dct:issued ?firstHarvested .

  OPTIONAL {{ ?referer dct:subject ?concept . }}

  OPTIONAL {{
    ?concept dct:publisher ?publisher .
    ?publisher dct:identifier ?orgId .
    ?publisher br:orgPath ?orgPath .
  }}
}}"#
    )
}

/// Single metrics stream for the information model report.
pub fn information_models_report_query() -> String {
    format!(
        r#"{DCAT_PREFIXES}
{MODELLDCAT_PREFIX}
{ORG_PREFIX}
SELECT DISTINCT ?model ?firstHarvested ?orgId ?orgPath
WHERE {{
  ?model a modelldcatno:InformationModel .
  ?record foaf:primaryTopic ?model .
  ?record a dcat:CatalogRecord .
  ?record dct:issued ?firstHarvested .

  OPTIONAL {{
    ?model dct:publisher ?publisher .
    ?publisher dct:identifier ?orgId .
    ?publisher br:orgPath ?orgPath .
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_queries_embed_the_organization_id() {
        assert!(org_datasets_query("910244132").contains(r#"dct:identifier "910244132""#));
        assert!(org_data_services_query("910244132").contains(r#"dct:identifier "910244132""#));
        assert!(org_concepts_query("910244132").contains(r#"dct:identifier "910244132""#));
        assert!(
            org_information_models_query("910244132").contains(r#"dct:identifier "910244132""#)
        );
    }

    #[test]
    fn test_nap_queries_filter_on_transport_flag() {
        assert!(nap_org_datasets_query("910244132").contains("isRelatedToTransportportal"));
        assert!(nap_datasets_by_publisher_query().contains("isRelatedToTransportportal"));
        assert!(!org_datasets_query("910244132").contains("isRelatedToTransportportal"));
    }

    #[test]
    fn test_count_queries_group_by_organization_number() {
        for query in [
            datasets_by_publisher_query(),
            data_services_by_publisher_query(),
            concepts_by_publisher_query(),
            information_models_by_publisher_query(),
        ] {
            assert!(query.contains("GROUP BY ?organizationNumber"));
            assert!(query.contains("AS ?count"));
        }
    }
}
