//! Block records emitted by the document analysis provider.
//!
//! Field names follow the provider's PascalCase JSON so a raw response can be
//! deserialized without an intermediate mapping layer.

use serde::{Deserialize, Serialize};

/// One typed node of the provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    /// Unique block identifier.
    pub id: String,

    /// Block type.
    pub block_type: BlockType,

    /// Recognized text (WORD, LINE, QUERY_RESULT).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// 1-based row index (CELL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,

    /// 1-based column index (CELL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<u32>,

    /// Entity types, e.g. KEY / VALUE for KEY_VALUE_SET blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<String>,

    /// Outgoing relationships in provider order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    /// Query definition (QUERY).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,

    /// Page number the block appears on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Provider confidence (0 - 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Block {
    /// Create a block with only an id and a type.
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            text: None,
            row_index: None,
            column_index: None,
            entity_types: Vec::new(),
            relationships: Vec::new(),
            query: None,
            page: None,
            confidence: None,
        }
    }

    /// Create a WORD block.
    pub fn word(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, BlockType::Word).with_text(text)
    }

    /// Create a CELL block at the given 1-based position.
    pub fn cell(id: impl Into<String>, row: u32, column: u32) -> Self {
        let mut block = Self::new(id, BlockType::Cell);
        block.row_index = Some(row);
        block.column_index = Some(column);
        block
    }

    /// Set the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a CHILD relationship.
    pub fn with_children<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_relationship(RelationshipType::Child, ids)
    }

    /// Append a relationship of the given type.
    pub fn with_relationship<I, S>(mut self, kind: RelationshipType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships.push(Relationship {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add an entity type.
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_types.push(entity_type.into());
        self
    }

    /// Check whether the block carries the given entity type.
    pub fn has_entity_type(&self, entity_type: &str) -> bool {
        self.entity_types.iter().any(|e| e.eq_ignore_ascii_case(entity_type))
    }

    /// Target ids of every relationship of the given type, in order.
    pub fn related_ids(&self, kind: RelationshipType) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(move |r| r.kind == kind)
            .flat_map(|r| r.ids.iter().map(String::as_str))
    }
}

/// Provider block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    Table,
    Cell,
    MergedCell,
    KeyValueSet,
    SelectionElement,
    Query,
    QueryResult,
    /// Any block type this crate does not interpret.
    #[serde(other)]
    Other,
}

/// A typed, ordered edge list from one block to others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relationship {
    /// Relationship kind.
    #[serde(rename = "Type")]
    pub kind: RelationshipType,

    /// Target block ids in provider order.
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Child,
    Value,
    Answer,
    MergedCell,
    #[serde(other)]
    Other,
}

/// Query attached to a QUERY block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Query {
    /// Natural language question.
    pub text: String,

    /// Caller supplied alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_provider_block() {
        let json = r#"{
            "Id": "c-1",
            "BlockType": "CELL",
            "RowIndex": 2,
            "ColumnIndex": 3,
            "Relationships": [{"Type": "CHILD", "Ids": ["w-1", "w-2"]}]
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.block_type, BlockType::Cell);
        assert_eq!(block.row_index, Some(2));
        assert_eq!(block.column_index, Some(3));
        assert_eq!(
            block.related_ids(RelationshipType::Child).collect::<Vec<_>>(),
            vec!["w-1", "w-2"]
        );
    }

    #[test]
    fn test_unknown_types_are_tolerated() {
        let json = r#"{
            "Id": "x",
            "BlockType": "LAYOUT_FIGURE",
            "Relationships": [{"Type": "COMPLEX_FEATURES", "Ids": ["y"]}]
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.block_type, BlockType::Other);
        assert_eq!(block.relationships[0].kind, RelationshipType::Other);
    }

    #[test]
    fn test_entity_type_is_case_insensitive() {
        let block = Block::new("k", BlockType::KeyValueSet).with_entity_type("KEY");
        assert!(block.has_entity_type("key"));
        assert!(!block.has_entity_type("VALUE"));
    }
}
