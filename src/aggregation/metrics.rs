//! Joining SPARQL binding streams into per-entity metric records.
//!
//! Each report type gets its rows from one or more query streams. The
//! streams are joined by entity URI into a single record per entity: the
//! record set is the union of all URIs seen across all streams, set-valued
//! fields accumulate via union, scalar fields are last-write-wins. Rows
//! without the entity variable are skipped.

use std::collections::{BTreeSet, HashMap};

use crate::upstream::bindings::{binding_value, Binding};

/// Record store keyed by entity URI, iterated in first-seen order.
#[derive(Debug, Clone)]
pub struct MetricRecords<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T: Default> MetricRecords<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Fetch the record for a URI, creating a default one on first sight.
    pub fn entry(&mut self, uri: &str) -> &mut T {
        let position = match self.index.get(uri) {
            Some(position) => *position,
            None => {
                self.entries.push((uri.to_string(), T::default()));
                let position = self.entries.len() - 1;
                self.index.insert(uri.to_string(), position);
                position
            }
        };
        &mut self.entries[position].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .map(|(uri, record)| (uri.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Default> Default for MetricRecords<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Joined metrics for one dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetMetric {
    pub formats: BTreeSet<String>,
    pub themes: BTreeSet<String>,
    pub first_harvested: Option<String>,
    pub is_open_data: Option<String>,
    pub transportportal: Option<String>,
    pub provenance: Option<String>,
    pub access_rights: Option<String>,
    pub org_id: Option<String>,
    pub org_path: Option<String>,
}

/// Joined metrics for one data service.
#[derive(Debug, Clone, Default)]
pub struct DataServiceMetric {
    pub formats: BTreeSet<String>,
    pub first_harvested: Option<String>,
    pub org_id: Option<String>,
    pub org_path: Option<String>,
}

/// Joined metrics for one concept.
#[derive(Debug, Clone, Default)]
pub struct ConceptMetric {
    pub referrers: BTreeSet<String>,
    pub first_harvested: Option<String>,
    pub org_id: Option<String>,
    pub org_path: Option<String>,
}

/// Joined metrics for one information model.
#[derive(Debug, Clone, Default)]
pub struct InformationModelMetric {
    pub first_harvested: Option<String>,
    pub org_id: Option<String>,
    pub org_path: Option<String>,
}

fn set_string(target: &mut Option<String>, row: &Binding, var: &str) {
    if let Some(value) = binding_value(row, var) {
        *target = Some(value.to_string());
    }
}

fn add_to_set(target: &mut BTreeSet<String>, row: &Binding, var: &str) {
    if let Some(value) = binding_value(row, var) {
        target.insert(value.to_string());
    }
}

/// Join the three dataset streams (format, general, publisher) by URI.
pub fn gather_dataset_metrics(
    format_rows: &[Binding],
    general_rows: &[Binding],
    publisher_rows: &[Binding],
) -> MetricRecords<DatasetMetric> {
    let mut metrics: MetricRecords<DatasetMetric> = MetricRecords::new();

    for row in format_rows {
        let Some(uri) = binding_value(row, "dataset") else {
            continue;
        };
        let record = metrics.entry(uri);
        add_to_set(&mut record.formats, row, "format");
        add_to_set(&mut record.formats, row, "mediaType");
    }

    for row in general_rows {
        let Some(uri) = binding_value(row, "dataset") else {
            continue;
        };
        let record = metrics.entry(uri);
        set_string(&mut record.first_harvested, row, "firstHarvested");
        set_string(&mut record.is_open_data, row, "isOpenData");
        set_string(&mut record.transportportal, row, "transportportal");
        set_string(&mut record.provenance, row, "provenance");
        record.access_rights = Some(
            binding_value(row, "accessRights")
                .unwrap_or("MISSING")
                .to_string(),
        );
        add_to_set(&mut record.themes, row, "theme");
    }

    for row in publisher_rows {
        let Some(uri) = binding_value(row, "dataset") else {
            continue;
        };
        let record = metrics.entry(uri);
        set_string(&mut record.org_id, row, "orgId");
        record.org_path = Some(
            binding_value(row, "orgPath")
                .unwrap_or("/MISSING")
                .to_string(),
        );
    }

    metrics
}

/// Accumulate the single data service stream by URI.
pub fn gather_data_service_metrics(rows: &[Binding]) -> MetricRecords<DataServiceMetric> {
    let mut metrics: MetricRecords<DataServiceMetric> = MetricRecords::new();

    for row in rows {
        let Some(uri) = binding_value(row, "service") else {
            continue;
        };
        let record = metrics.entry(uri);
        set_string(&mut record.first_harvested, row, "firstHarvested");
        set_string(&mut record.org_id, row, "orgId");
        record.org_path = Some(
            binding_value(row, "orgPath")
                .unwrap_or("/MISSING")
                .to_string(),
        );
        add_to_set(&mut record.formats, row, "format");
        add_to_set(&mut record.formats, row, "mediaType");
    }

    metrics
}

/// Accumulate the single concept stream by URI.
pub fn gather_concept_metrics(rows: &[Binding]) -> MetricRecords<ConceptMetric> {
    let mut metrics: MetricRecords<ConceptMetric> = MetricRecords::new();

    for row in rows {
        let Some(uri) = binding_value(row, "concept") else {
            continue;
        };
        let record = metrics.entry(uri);
        set_string(&mut record.first_harvested, row, "firstHarvested");
        set_string(&mut record.org_id, row, "orgId");
        record.org_path = Some(
            binding_value(row, "orgPath")
                .unwrap_or("/MISSING")
                .to_string(),
        );
        add_to_set(&mut record.referrers, row, "referer");
    }

    metrics
}

/// Accumulate the single information model stream by URI.
pub fn gather_information_model_metrics(rows: &[Binding]) -> MetricRecords<InformationModelMetric> {
    let mut metrics: MetricRecords<InformationModelMetric> = MetricRecords::new();

    for row in rows {
        let Some(uri) = binding_value(row, "model") else {
            continue;
        };
        let record = metrics.entry(uri);
        set_string(&mut record.first_harvested, row, "firstHarvested");
        set_string(&mut record.org_id, row, "orgId");
        record.org_path = Some(
            binding_value(row, "orgPath")
                .unwrap_or("/MISSING")
                .to_string(),
        );
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::bindings::BoundValue;

    fn row(pairs: &[(&str, &str)]) -> Binding {
        pairs
            .iter()
            .map(|(var, value)| {
                (
                    var.to_string(),
                    BoundValue {
                        value: value.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_dataset_join_is_union_of_streams() {
        let format_rows = vec![row(&[("dataset", "http://d/1"), ("format", "CSV")])];
        let general_rows = vec![row(&[
            ("dataset", "http://d/2"),
            ("firstHarvested", "2024-01-12T10:00:00.000Z"),
        ])];
        let publisher_rows = vec![row(&[("dataset", "http://d/3"), ("orgId", "12345678")])];

        let metrics = gather_dataset_metrics(&format_rows, &general_rows, &publisher_rows);

        assert_eq!(metrics.len(), 3);
        let uris: Vec<&str> = metrics.iter().map(|(uri, _)| uri).collect();
        assert_eq!(uris, vec!["http://d/1", "http://d/2", "http://d/3"]);
    }

    #[test]
    fn test_dataset_formats_accumulate_across_rows() {
        let format_rows = vec![
            row(&[
                ("dataset", "http://d/1"),
                ("format", "CSV"),
                ("mediaType", "text/csv"),
            ]),
            row(&[("dataset", "http://d/1"), ("format", "JSON")]),
        ];

        let metrics = gather_dataset_metrics(&format_rows, &[], &[]);

        let (_, record) = metrics.iter().next().unwrap();
        assert_eq!(record.formats.len(), 3);
        assert!(record.formats.contains("CSV"));
        assert!(record.formats.contains("JSON"));
        assert!(record.formats.contains("text/csv"));
    }

    #[test]
    fn test_dataset_access_rights_defaults_to_missing() {
        let general_rows = vec![row(&[
            ("dataset", "http://d/1"),
            ("firstHarvested", "2024-01-12T10:00:00.000Z"),
        ])];

        let metrics = gather_dataset_metrics(&[], &general_rows, &[]);

        let (_, record) = metrics.iter().next().unwrap();
        assert_eq!(record.access_rights.as_deref(), Some("MISSING"));
        assert!(record.org_path.is_none());
    }

    #[test]
    fn test_dataset_org_path_defaults_on_publisher_row() {
        let publisher_rows = vec![row(&[("dataset", "http://d/1"), ("orgId", "12345678")])];

        let metrics = gather_dataset_metrics(&[], &[], &publisher_rows);

        let (_, record) = metrics.iter().next().unwrap();
        assert_eq!(record.org_path.as_deref(), Some("/MISSING"));
        assert_eq!(record.org_id.as_deref(), Some("12345678"));
    }

    #[test]
    fn test_rows_without_entity_uri_are_skipped() {
        let general_rows = vec![row(&[("firstHarvested", "2024-01-12T10:00:00.000Z")])];
        let metrics = gather_dataset_metrics(&[], &general_rows, &[]);
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_concept_referrers_accumulate() {
        let rows = vec![
            row(&[
                ("concept", "http://c/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
                ("referer", "http://d/1"),
            ]),
            row(&[
                ("concept", "http://c/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
                ("referer", "http://d/2"),
            ]),
        ];

        let metrics = gather_concept_metrics(&rows);

        assert_eq!(metrics.len(), 1);
        let (_, record) = metrics.iter().next().unwrap();
        assert_eq!(record.referrers.len(), 2);
    }

    #[test]
    fn test_scalar_fields_are_last_write_wins() {
        let rows = vec![
            row(&[
                ("service", "http://s/1"),
                ("firstHarvested", "2024-01-01T10:00:00.000Z"),
            ]),
            row(&[
                ("service", "http://s/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
            ]),
        ];

        let metrics = gather_data_service_metrics(&rows);

        let (_, record) = metrics.iter().next().unwrap();
        assert_eq!(
            record.first_harvested.as_deref(),
            Some("2024-01-12T10:00:00.000Z")
        );
    }
}
