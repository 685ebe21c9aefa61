//! Raw payloads as returned by the remote API
//!
//! Mirrors the GraphQL response shape field for field. Anything the remote
//! side may omit is optional here; [`crate::parse`] decides what is required.

use serde::{Deserialize, Serialize};

/// Board with its groups and items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBoard {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Sales reference number stored on the board at creation
    #[serde(default)]
    pub external_ref: Option<String>,
    /// `active`, `archived` or `deleted`
    pub state: Option<String>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
    /// Items of all groups, in board order
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// Board group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGroup {
    pub id: Option<String>,
    pub title: Option<String>,
    pub color: Option<String>,
}

/// Reference from an item to its group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGroupRef {
    pub id: Option<String>,
}

/// Board item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub group: Option<RawGroupRef>,
    #[serde(default)]
    pub column_values: Vec<RawColumnValue>,
    #[serde(default)]
    pub subitems: Vec<RawSubitem>,
}

/// Sub-item of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubitem {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub column_values: Vec<RawColumnValue>,
}

/// Column value with its display text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnValue {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
}

impl RawColumnValue {
    /// Column value of a given type
    pub fn new(id: impl Into<String>, kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(kind.into()),
            title: None,
            text: Some(text.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_graphql_shape() {
        let json = r##"{
            "id": "1",
            "name": "Acme",
            "state": "active",
            "external_ref": "SF-42",
            "groups": [{"id": "g1", "title": "Infrastructure", "color": "#00c875"}],
            "items": [{
                "id": "i1",
                "name": "Provision",
                "group": {"id": "g1"},
                "column_values": [{"id": "status", "type": "status", "text": "Done"}]
            }]
        }"##;

        let board: RawBoard = serde_json::from_str(json).unwrap();
        assert_eq!(board.groups.len(), 1);
        assert_eq!(board.items[0].column_values[0].kind.as_deref(), Some("status"));
        assert!(board.items[0].subitems.is_empty());
        assert!(board.description.is_none());
        assert_eq!(board.external_ref.as_deref(), Some("SF-42"));
    }
}
