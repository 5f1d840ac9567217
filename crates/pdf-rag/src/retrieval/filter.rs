//! Metadata filter restricting retrieval to one ingested document

use serde_json::{json, Value};

use crate::config::DocumentConfig;
use crate::types::SourceId;

/// Predicate "metadata field `source` equals `value`"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFilter {
    value: String,
}

impl SourceFilter {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The `source` value records must carry
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, source: &str) -> bool {
        self.value == source
    }

    /// Metadata filter in the `{"source": {"$eq": value}}` form
    pub fn to_metadata_filter(&self) -> Value {
        json!({ "source": { "$eq": self.value } })
    }
}

impl From<&SourceId> for SourceFilter {
    fn from(id: &SourceId) -> Self {
        Self::new(id.as_str())
    }
}

/// Derive the source filter from configuration.
///
/// A configured URL wins over a path; a path alone maps to
/// `local://<basename>`; neither means unrestricted search. Blank values count
/// as unset.
pub fn build_filter(config: &DocumentConfig) -> Option<SourceFilter> {
    let url = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let path = config
        .path
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty());

    match (url, path) {
        (Some(url), _) => Some(SourceFilter::from(&SourceId::url(url))),
        (None, Some(path)) => Some(SourceFilter::from(&SourceId::local(path))),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(url: Option<&str>, path: Option<&str>) -> DocumentConfig {
        DocumentConfig {
            url: url.map(String::from),
            path: path.map(PathBuf::from),
        }
    }

    #[test]
    fn test_no_document_means_no_filter() {
        assert_eq!(build_filter(&doc(None, None)), None);
        assert_eq!(build_filter(&doc(Some("  "), Some(""))), None);
    }

    #[test]
    fn test_path_derives_local_identifier() {
        let filter = build_filter(&doc(None, Some("/tmp/report.pdf"))).unwrap();
        assert_eq!(filter.value(), "local://report.pdf");
    }

    #[test]
    fn test_url_wins_over_path() {
        let url = "https://example.com/report.pdf";
        let filter = build_filter(&doc(Some(url), Some("/tmp/report.pdf"))).unwrap();
        assert_eq!(filter.value(), url);
    }

    #[test]
    fn test_same_config_same_filter() {
        let config = doc(None, Some("uploads/handbook.pdf"));
        assert_eq!(build_filter(&config), build_filter(&config));

        let config = doc(None, None);
        assert_eq!(build_filter(&config), build_filter(&config));
    }

    #[test]
    fn test_metadata_filter_shape() {
        let filter = SourceFilter::new("local://report.pdf");
        assert_eq!(
            filter.to_metadata_filter(),
            json!({"source": {"$eq": "local://report.pdf"}})
        );
        assert!(filter.matches("local://report.pdf"));
        assert!(!filter.matches("local://other.pdf"));
    }
}
