//! SPARQL result bindings and their normalization.
//!
//! The triple store answers with the standard bindings-table JSON shape:
//! `{"results": {"bindings": [{var: {"value": "..."}}]}}`. Every level may
//! be absent, which normalizes to an empty binding list.

use serde::Deserialize;
use std::collections::HashMap;

/// One row of a query result: query variable name to typed value wrapper.
pub type Binding = HashMap<String, BoundValue>;

/// Typed value wrapper for a single bound variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundValue {
    #[serde(default)]
    pub value: String,
}

/// Results block of a SPARQL response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// Full SPARQL query response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparqlResponse {
    #[serde(default)]
    pub results: SparqlResults,
}

impl SparqlResponse {
    pub fn into_bindings(self) -> Vec<Binding> {
        self.results.bindings
    }
}

/// Per-organization occurrence count extracted from a grouped count query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgCount {
    pub org: String,
    pub count: u64,
}

/// Look up a variable's bound value in a result row.
pub fn binding_value<'a>(row: &'a Binding, var: &str) -> Option<&'a str> {
    row.get(var).map(|bound| bound.value.as_str())
}

/// Canonical form of an organization number: formatting whitespace removed.
pub fn canonical_org_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extract the `(organizationNumber, count)` projection from one row.
///
/// Rows with a missing or empty organization number or count are dropped;
/// a count that does not parse folds to 0.
pub fn org_count_from_binding(row: &Binding) -> Option<OrgCount> {
    let org = binding_value(row, "organizationNumber")?;
    let count = binding_value(row, "count")?;
    if org.is_empty() || count.is_empty() {
        return None;
    }

    Some(OrgCount {
        org: canonical_org_number(org),
        count: count.parse().unwrap_or(0),
    })
}

/// Convert a grouped count response into an ordered count list.
pub fn count_list_from_bindings(response: &SparqlResponse) -> Vec<OrgCount> {
    response
        .results
        .bindings
        .iter()
        .filter_map(org_count_from_binding)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(value: &str) -> BoundValue {
        BoundValue {
            value: value.to_string(),
        }
    }

    fn count_row(org: &str, count: &str) -> Binding {
        let mut row = Binding::new();
        row.insert("organizationNumber".to_string(), bound(org));
        row.insert("count".to_string(), bound(count));
        row
    }

    #[test]
    fn test_count_list_with_valid_data() {
        let response = SparqlResponse {
            results: SparqlResults {
                bindings: vec![count_row("12345678", "10"), count_row("87654321", "5")],
            },
        };

        let result = count_list_from_bindings(&response);

        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0],
            OrgCount {
                org: "12345678".to_string(),
                count: 10
            }
        );
        assert_eq!(
            result[1],
            OrgCount {
                org: "87654321".to_string(),
                count: 5
            }
        );
    }

    #[test]
    fn test_count_list_with_empty_bindings() {
        let response: SparqlResponse =
            serde_json::from_str(r#"{"results": {"bindings": []}}"#).unwrap();
        assert!(count_list_from_bindings(&response).is_empty());
    }

    #[test]
    fn test_count_list_with_no_bindings_key() {
        let response: SparqlResponse = serde_json::from_str(r#"{"results": {}}"#).unwrap();
        assert!(count_list_from_bindings(&response).is_empty());
    }

    #[test]
    fn test_count_list_with_no_results_key() {
        let response: SparqlResponse = serde_json::from_str("{}").unwrap();
        assert!(count_list_from_bindings(&response).is_empty());
    }

    #[test]
    fn test_org_number_with_spaces_is_canonicalized() {
        let result = org_count_from_binding(&count_row("123 456 78", "10")).unwrap();
        assert_eq!(result.org, "12345678");
        assert_eq!(result.count, 10);
    }

    #[test]
    fn test_row_with_missing_org_is_dropped() {
        let mut row = Binding::new();
        row.insert("count".to_string(), bound("10"));
        assert!(org_count_from_binding(&row).is_none());
    }

    #[test]
    fn test_row_with_missing_count_is_dropped() {
        let mut row = Binding::new();
        row.insert("organizationNumber".to_string(), bound("12345678"));
        assert!(org_count_from_binding(&row).is_none());
    }

    #[test]
    fn test_row_with_empty_values_is_dropped() {
        assert!(org_count_from_binding(&count_row("", "")).is_none());
    }
}
