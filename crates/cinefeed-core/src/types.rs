//! Core types: stored records, sort direction, and limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Page size used when a list request does not specify one.
pub const DEFAULT_LIMIT: usize = 10;

/// Version stamped onto every record written by this build.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attribute names owned by the store. Callers may never set these.
pub const SYSTEM_ATTRIBUTES: &[&str] = &["PK", "SK", "id", "createdOn", "savedOn", "appVersion"];

/// A stored entity.
///
/// `sort_key` and `id` are always equal: ids are time-sortable, so creation
/// order and sort-key order coincide within a partition. Entity-specific
/// attributes live in `fields` and are flattened into the document on the
/// wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "PK")]
    pub partition: String,
    #[serde(rename = "SK")]
    pub sort_key: String,
    pub id: String,
    pub created_on: DateTime<Utc>,
    pub saved_on: DateTime<Utc>,
    pub app_version: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Look up an entity-specific attribute.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Ordering of a list request by sort key (creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "createdOn_ASC", alias = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "createdOn_DESC", alias = "DESC")]
    Desc,
}

impl SortDirection {
    /// Whether a scan in this direction walks the index from the high end.
    pub fn is_reverse(self) -> bool {
        self != SortDirection::Asc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_shape() {
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Estrenos"));
        let record = Record {
            partition: "Noticia".to_string(),
            sort_key: "01J0000000000000000000000A".to_string(),
            id: "01J0000000000000000000000A".to_string(),
            created_on: now,
            saved_on: now,
            app_version: APP_VERSION.to_string(),
            fields,
        };

        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc["PK"], "Noticia");
        assert_eq!(doc["SK"], doc["id"]);
        assert_eq!(doc["title"], "Estrenos");
        assert!(doc.get("createdOn").is_some());
        assert!(doc.get("fields").is_none());

        let back: Record = serde_json::from_value(doc).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_sort_direction_names() {
        let asc: SortDirection = serde_json::from_value(json!("createdOn_ASC")).unwrap();
        assert_eq!(asc, SortDirection::Asc);
        let desc: SortDirection = serde_json::from_value(json!("DESC")).unwrap();
        assert_eq!(desc, SortDirection::Desc);
        assert_eq!(SortDirection::default(), SortDirection::Desc);
        assert!(SortDirection::Desc.is_reverse());
        assert!(!SortDirection::Asc.is_reverse());
    }
}
