//! Reduction of joined metric records into flat statistical reports.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::aggregation::metrics::{
    ConceptMetric, DataServiceMetric, DatasetMetric, InformationModelMetric, MetricRecords,
};
use crate::aggregation::recency::timestamp_is_after;
use crate::models::{
    ConceptsReport, DataServicesReport, DatasetsReport, InformationModelsReport, KeyCount,
    ThemeProfile,
};

/// Provenance URI marking a dataset as a national component.
pub const NATIONAL_PROVENANCE_URI: &str = "http://data.brreg.no/datakatalog/provinens/nasjonal";

/// Occurrence counter that preserves first-seen key order on output.
#[derive(Debug, Clone, Default)]
pub struct CountBucket {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl CountBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: u64) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += n;
        } else {
            self.order.push(key.to_string());
            self.counts.insert(key.to_string(), n);
        }
    }

    /// Drain into an ordered key/count list.
    pub fn into_list(mut self) -> Vec<KeyCount> {
        self.order
            .drain(..)
            .map(|key| {
                let count = self.counts.remove(&key).unwrap_or(0);
                KeyCount { key, count }
            })
            .collect()
    }
}

/// Split an org-path into every prefix from root to leaf, so counts can be
/// rolled up at each hierarchy level: `/A/B/C` yields `/A`, `/A/B`, `/A/B/C`.
pub fn split_org_path(org_path: &str) -> Vec<String> {
    let parts: Vec<&str> = org_path.trim_matches('/').split('/').collect();
    let mut result = Vec::with_capacity(parts.len());
    let mut current = String::new();
    for part in parts {
        current.push('/');
        current.push_str(part);
        result.push(current.clone());
    }
    result
}

fn matches_org_path(record_path: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        Some(filter) => record_path.unwrap_or("").contains(filter),
        None => true,
    }
}

/// Reduce joined dataset metrics into the dataset report.
pub fn build_dataset_report(
    metrics: &MetricRecords<DatasetMetric>,
    org_path: Option<&str>,
    theme_profile: Option<ThemeProfile>,
    cutoff: DateTime<Utc>,
) -> DatasetsReport {
    let mut total = 0;
    let mut new_last_week = 0;
    let mut opendata = 0;
    let mut national_component = 0;
    let mut orgs: HashSet<&str> = HashSet::new();
    let mut access_rights_counts = CountBucket::new();
    let mut org_path_counts = CountBucket::new();
    let mut format_counts = CountBucket::new();
    let mut theme_counts = CountBucket::new();

    for (_, record) in metrics.iter() {
        if theme_profile == Some(ThemeProfile::Transport)
            && record.transportportal.as_deref() != Some("true")
        {
            continue;
        }
        if !matches_org_path(record.org_path.as_deref(), org_path) {
            continue;
        }

        total += 1;
        if let Some(access_right) = &record.access_rights {
            access_rights_counts.add(access_right);
        }
        if let Some(org_id) = &record.org_id {
            orgs.insert(org_id);
        }
        if record.is_open_data.as_deref() == Some("true") {
            opendata += 1;
        }
        if record.provenance.as_deref() == Some(NATIONAL_PROVENANCE_URI) {
            national_component += 1;
        }
        if let Some(harvested) = &record.first_harvested {
            if timestamp_is_after(harvested, cutoff) {
                new_last_week += 1;
            }
        }
        for format in &record.formats {
            format_counts.add(format);
        }
        for theme in &record.themes {
            theme_counts.add(theme);
        }
        for part in split_org_path(record.org_path.as_deref().unwrap_or("/MISSING")) {
            org_path_counts.add(&part);
        }
    }

    DatasetsReport {
        total_objects: total,
        new_last_week,
        organization_count: orgs.len(),
        opendata,
        national_component,
        org_paths: org_path_counts.into_list(),
        all_themes: theme_counts.into_list(),
        formats: format_counts.into_list(),
        access_rights: access_rights_counts.into_list(),
    }
}

/// Reduce joined data service metrics into the data service report.
pub fn build_data_service_report(
    metrics: &MetricRecords<DataServiceMetric>,
    org_path: Option<&str>,
    cutoff: DateTime<Utc>,
) -> DataServicesReport {
    let mut total = 0;
    let mut new_last_week = 0;
    let mut orgs: HashSet<&str> = HashSet::new();
    let mut org_path_counts = CountBucket::new();
    let mut format_counts = CountBucket::new();

    for (_, record) in metrics.iter() {
        if !matches_org_path(record.org_path.as_deref(), org_path) {
            continue;
        }

        total += 1;
        if let Some(org_id) = &record.org_id {
            orgs.insert(org_id);
        }
        if let Some(harvested) = &record.first_harvested {
            if timestamp_is_after(harvested, cutoff) {
                new_last_week += 1;
            }
        }
        for format in &record.formats {
            format_counts.add(format);
        }
        for part in split_org_path(record.org_path.as_deref().unwrap_or("/MISSING")) {
            org_path_counts.add(&part);
        }
    }

    DataServicesReport {
        total_objects: total,
        new_last_week,
        organization_count: orgs.len(),
        org_paths: org_path_counts.into_list(),
        formats: format_counts.into_list(),
    }
}

/// Reduce joined concept metrics into the concept report.
pub fn build_concept_report(
    metrics: &MetricRecords<ConceptMetric>,
    org_path: Option<&str>,
    cutoff: DateTime<Utc>,
) -> ConceptsReport {
    let mut total = 0;
    let mut new_last_week = 0;
    let mut orgs: HashSet<&str> = HashSet::new();
    let mut org_path_counts = CountBucket::new();
    let mut referrer_counts = CountBucket::new();

    for (uri, record) in metrics.iter() {
        if !matches_org_path(record.org_path.as_deref(), org_path) {
            continue;
        }

        total += 1;
        if let Some(org_id) = &record.org_id {
            orgs.insert(org_id);
        }
        if let Some(harvested) = &record.first_harvested {
            if timestamp_is_after(harvested, cutoff) {
                new_last_week += 1;
            }
        }
        if !record.referrers.is_empty() {
            referrer_counts.add_n(uri, record.referrers.len() as u64);
        }
        for part in split_org_path(record.org_path.as_deref().unwrap_or("/MISSING")) {
            org_path_counts.add(&part);
        }
    }

    ConceptsReport {
        total_objects: total,
        new_last_week,
        organization_count: orgs.len(),
        org_paths: org_path_counts.into_list(),
        most_in_use: referrer_counts.into_list(),
    }
}

/// Reduce joined information model metrics into the information model report.
pub fn build_information_model_report(
    metrics: &MetricRecords<InformationModelMetric>,
    org_path: Option<&str>,
    cutoff: DateTime<Utc>,
) -> InformationModelsReport {
    let mut total = 0;
    let mut new_last_week = 0;
    let mut orgs: HashSet<&str> = HashSet::new();
    let mut org_path_counts = CountBucket::new();

    for (_, record) in metrics.iter() {
        if !matches_org_path(record.org_path.as_deref(), org_path) {
            continue;
        }

        total += 1;
        if let Some(org_id) = &record.org_id {
            orgs.insert(org_id);
        }
        if let Some(harvested) = &record.first_harvested {
            if timestamp_is_after(harvested, cutoff) {
                new_last_week += 1;
            }
        }
        for part in split_org_path(record.org_path.as_deref().unwrap_or("/MISSING")) {
            org_path_counts.add(&part);
        }
    }

    InformationModelsReport {
        total_objects: total,
        new_last_week,
        organization_count: orgs.len(),
        org_paths: org_path_counts.into_list(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::metrics::{gather_concept_metrics, gather_dataset_metrics};
    use crate::aggregation::recency::week_cutoff;
    use crate::upstream::bindings::{Binding, BoundValue};
    use chrono::NaiveDate;

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

    fn fixed_cutoff() -> DateTime<Utc> {
        week_cutoff(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    #[test]
    fn test_split_org_path() {
        assert_eq!(
            split_org_path("/ANNET/910244132"),
            vec!["/ANNET".to_string(), "/ANNET/910244132".to_string()]
        );
        assert_eq!(
            split_org_path("/STAT/912660680/971203420"),
            vec![
                "/STAT".to_string(),
                "/STAT/912660680".to_string(),
                "/STAT/912660680/971203420".to_string()
            ]
        );
    }

    #[test]
    fn test_count_bucket_preserves_first_seen_order() {
        let mut bucket = CountBucket::new();
        bucket.add("b");
        bucket.add("a");
        bucket.add("b");
        bucket.add("c");

        let list = bucket.into_list();
        assert_eq!(
            list,
            vec![
                KeyCount {
                    key: "b".to_string(),
                    count: 2
                },
                KeyCount {
                    key: "a".to_string(),
                    count: 1
                },
                KeyCount {
                    key: "c".to_string(),
                    count: 1
                },
            ]
        );
    }

    fn sample_dataset_metrics() -> MetricRecords<DatasetMetric> {
        let format_rows = vec![
            row(&[("dataset", "http://d/1"), ("format", "CSV")]),
            row(&[("dataset", "http://d/2"), ("format", "JSON")]),
        ];
        let general_rows = vec![
            row(&[
                ("dataset", "http://d/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
                ("isOpenData", "true"),
                ("transportportal", "true"),
                ("accessRights", "PUBLIC"),
            ]),
            row(&[
                ("dataset", "http://d/2"),
                ("firstHarvested", "2024-01-01T10:00:00.000Z"),
                (
                    "provenance",
                    "http://data.brreg.no/datakatalog/provinens/nasjonal",
                ),
            ]),
        ];
        let publisher_rows = vec![
            row(&[
                ("dataset", "http://d/1"),
                ("orgId", "910244132"),
                ("orgPath", "/ANNET/910244132"),
            ]),
            row(&[
                ("dataset", "http://d/2"),
                ("orgId", "971203420"),
                ("orgPath", "/STAT/912660680/971203420"),
            ]),
        ];
        gather_dataset_metrics(&format_rows, &general_rows, &publisher_rows)
    }

    #[test]
    fn test_dataset_report_totals() {
        let report = build_dataset_report(&sample_dataset_metrics(), None, None, fixed_cutoff());

        assert_eq!(report.total_objects, 2);
        assert_eq!(report.new_last_week, 1);
        assert_eq!(report.organization_count, 2);
        assert_eq!(report.opendata, 1);
        assert_eq!(report.national_component, 1);
        assert_eq!(report.formats.len(), 2);
        assert_eq!(report.access_rights[0].key, "PUBLIC");
        assert_eq!(report.access_rights[1].key, "MISSING");
        // Both roll-up levels of the second org path are counted.
        assert!(report
            .org_paths
            .iter()
            .any(|entry| entry.key == "/STAT/912660680" && entry.count == 1));
        assert!(report
            .org_paths
            .iter()
            .any(|entry| entry.key == "/ANNET" && entry.count == 1));
    }

    #[test]
    fn test_dataset_report_org_path_filter() {
        let report =
            build_dataset_report(&sample_dataset_metrics(), Some("/STAT"), None, fixed_cutoff());

        assert_eq!(report.total_objects, 1);
        assert_eq!(report.organization_count, 1);
        assert_eq!(report.opendata, 0);
        assert_eq!(report.national_component, 1);
    }

    #[test]
    fn test_dataset_report_transport_profile() {
        let report = build_dataset_report(
            &sample_dataset_metrics(),
            None,
            Some(ThemeProfile::Transport),
            fixed_cutoff(),
        );

        // Only http://d/1 carries the transport flag.
        assert_eq!(report.total_objects, 1);
        assert_eq!(report.opendata, 1);
        assert_eq!(report.national_component, 0);
    }

    #[test]
    fn test_dataset_report_is_deterministic() {
        let metrics = sample_dataset_metrics();
        let first = build_dataset_report(&metrics, None, None, fixed_cutoff());
        let second = build_dataset_report(&metrics, None, None, fixed_cutoff());

        assert_eq!(first.org_paths, second.org_paths);
        assert_eq!(first.formats, second.formats);
        assert_eq!(first.all_themes, second.all_themes);
        assert_eq!(first.access_rights, second.access_rights);
    }

    #[test]
    fn test_concept_report_most_in_use() {
        let rows = vec![
            row(&[
                ("concept", "http://c/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
                ("orgId", "910244132"),
                ("orgPath", "/ANNET/910244132"),
                ("referer", "http://d/1"),
            ]),
            row(&[
                ("concept", "http://c/1"),
                ("firstHarvested", "2024-01-12T10:00:00.000Z"),
                ("referer", "http://d/2"),
            ]),
            row(&[
                ("concept", "http://c/2"),
                ("firstHarvested", "2024-01-01T10:00:00.000Z"),
                ("orgId", "910244132"),
                ("orgPath", "/ANNET/910244132"),
            ]),
        ];
        let metrics = gather_concept_metrics(&rows);

        let report = build_concept_report(&metrics, None, fixed_cutoff());

        assert_eq!(report.total_objects, 2);
        assert_eq!(report.new_last_week, 1);
        assert_eq!(report.organization_count, 1);
        assert_eq!(report.most_in_use.len(), 1);
        assert_eq!(report.most_in_use[0].key, "http://c/1");
        assert_eq!(report.most_in_use[0].count, 2);
    }

    #[test]
    fn test_unparsable_timestamp_never_counts_as_new() {
        let general_rows = vec![row(&[
            ("dataset", "http://d/1"),
            ("firstHarvested", "not-a-date"),
        ])];
        let metrics = gather_dataset_metrics(&[], &general_rows, &[]);

        let report = build_dataset_report(&metrics, None, None, fixed_cutoff());

        assert_eq!(report.total_objects, 1);
        assert_eq!(report.new_last_week, 0);
    }
}
