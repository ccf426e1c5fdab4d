//! Arena-backed graph over provider blocks.
//!
//! Blocks are stored once and addressed by index; relationships are resolved
//! through an id → index map. A reference to an id that is not in the graph
//! contributes nothing. CHILD edges must form a DAG, which is checked when the
//! graph is built.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::models::block::{Block, BlockType, RelationshipType};

/// Immutable block graph for one document.
///
/// The graph either owns its blocks or borrows them from the analyzed
/// document, so building one per document does not copy the block list.
#[derive(Debug, Clone)]
pub struct BlockGraph<'a> {
    blocks: Cow<'a, [Block]>,
    index: HashMap<String, usize>,
}

/// A resolved KEY_VALUE_SET pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// A QUERY block with its resolved answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    pub alias: Option<String>,
    pub answer: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl<'a> BlockGraph<'a> {
    /// Build a graph, rejecting duplicate ids and CHILD cycles.
    pub fn new(blocks: impl Into<Cow<'a, [Block]>>) -> Result<Self, GraphError> {
        let blocks = blocks.into();
        let mut index = HashMap::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            if index.insert(block.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateId(block.id.clone()));
            }
        }

        let graph = Self { blocks, index };
        graph.check_acyclic()?;

        debug!("Built block graph with {} blocks", graph.blocks.len());
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let edges: Vec<Vec<usize>> = self
            .blocks
            .iter()
            .map(|b| {
                b.related_ids(RelationshipType::Child)
                    .filter_map(|id| self.index.get(id).copied())
                    .collect()
            })
            .collect();

        let mut marks = vec![Mark::Unvisited; self.blocks.len()];

        for start in 0..self.blocks.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }

            marks[start] = Mark::InProgress;
            let mut stack = vec![(start, 0usize)];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                match edges[node].get(top.1).copied() {
                    Some(child) => {
                        top.1 += 1;
                        match marks[child] {
                            Mark::InProgress => {
                                return Err(GraphError::Cycle(self.blocks[child].id.clone()));
                            }
                            Mark::Unvisited => {
                                marks[child] = Mark::InProgress;
                                stack.push((child, 0));
                            }
                            Mark::Done => {}
                        }
                    }
                    None => {
                        marks[node] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }

        Ok(())
    }

    /// Look up a block by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in provider order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Blocks of one type, in provider order.
    pub fn blocks_of_type(&self, block_type: BlockType) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.block_type == block_type)
    }

    /// TABLE blocks in provider order.
    pub fn tables(&self) -> impl Iterator<Item = &Block> {
        self.blocks_of_type(BlockType::Table)
    }

    /// Resolve the targets of one relationship kind, skipping unknown ids.
    pub fn related<'s>(
        &'s self,
        block: &'s Block,
        kind: RelationshipType,
    ) -> impl Iterator<Item = &'s Block> + 's {
        block.related_ids(kind).filter_map(move |id| {
            let target = self.get(id);
            if target.is_none() {
                debug!("Block {} references missing block {}", block.id, id);
            }
            target
        })
    }

    /// Resolve CHILD targets, skipping unknown ids.
    pub fn children<'s>(&'s self, block: &'s Block) -> impl Iterator<Item = &'s Block> + 's {
        self.related(block, RelationshipType::Child)
    }

    /// Text of the WORD children of a block, joined with single spaces.
    pub fn text_of(&self, block: &Block) -> String {
        self.children(block)
            .filter(|b| b.block_type == BlockType::Word)
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolve every KEY block of a KEY_VALUE_SET to its value text.
    pub fn key_value_pairs(&self) -> Vec<KeyValue> {
        self.blocks_of_type(BlockType::KeyValueSet)
            .filter(|b| b.has_entity_type("KEY"))
            .map(|key| {
                let value = self
                    .related(key, RelationshipType::Value)
                    .map(|v| self.text_of(v))
                    .collect::<Vec<_>>()
                    .join(" ");
                KeyValue {
                    key: self.text_of(key),
                    value,
                }
            })
            .filter(|kv| !kv.key.is_empty())
            .collect()
    }

    /// Resolve every QUERY block to its first QUERY_RESULT.
    pub fn query_answers(&self) -> Vec<QueryAnswer> {
        self.blocks_of_type(BlockType::Query)
            .filter_map(|q| {
                let query = q.query.as_ref()?;
                let answer = self
                    .related(q, RelationshipType::Answer)
                    .find(|b| b.block_type == BlockType::QueryResult)
                    .and_then(|b| b.text.clone());
                Some(QueryAnswer {
                    question: query.text.clone(),
                    alias: query.alias.clone(),
                    answer,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::block::Query;

    fn sample() -> Vec<Block> {
        vec![
            Block::new("page", BlockType::Page).with_children(["table"]),
            Block::new("table", BlockType::Table).with_children(["cell"]),
            Block::cell("cell", 1, 1).with_children(["w1", "line", "w2", "ghost"]),
            Block::word("w1", "Unit"),
            Block::new("line", BlockType::Line).with_text("Unit Price"),
            Block::word("w2", "Price"),
        ]
    }

    #[test]
    fn test_lookup_and_traversal() {
        let graph = BlockGraph::new(sample()).unwrap();
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.tables().count(), 1);

        let cell = graph.get("cell").unwrap();
        assert_eq!(graph.children(cell).count(), 3);
        assert_eq!(graph.text_of(cell), "Unit Price");
    }

    #[test]
    fn test_borrowed_blocks_are_not_copied() {
        let blocks = sample();
        let graph = BlockGraph::new(&blocks).unwrap();

        assert!(std::ptr::eq(graph.get("cell").unwrap(), &blocks[2]));
        assert_eq!(graph.text_of(&blocks[2]), "Unit Price");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let blocks = vec![Block::word("a", "x"), Block::word("a", "y")];
        assert_eq!(
            BlockGraph::new(blocks).unwrap_err(),
            GraphError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let blocks = vec![
            Block::new("a", BlockType::Table).with_children(["b"]),
            Block::cell("b", 1, 1).with_children(["c"]),
            Block::new("c", BlockType::Line).with_children(["a"]),
        ];
        assert!(matches!(BlockGraph::new(blocks), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let blocks = vec![
            Block::new("t", BlockType::Table).with_children(["c1", "c2"]),
            Block::cell("c1", 1, 1).with_children(["w"]),
            Block::cell("c2", 1, 2).with_children(["w"]),
            Block::word("w", "shared"),
        ];
        assert!(BlockGraph::new(blocks).is_ok());
    }

    #[test]
    fn test_key_values_and_queries() {
        let mut query = Block::new("q", BlockType::Query)
            .with_relationship(RelationshipType::Answer, ["qr"]);
        query.query = Some(Query {
            text: "What is the PO number?".to_string(),
            alias: Some("PO_NUMBER".to_string()),
        });

        let blocks = vec![
            Block::new("k", BlockType::KeyValueSet)
                .with_entity_type("KEY")
                .with_children(["kw"])
                .with_relationship(RelationshipType::Value, ["v"]),
            Block::new("v", BlockType::KeyValueSet)
                .with_entity_type("VALUE")
                .with_children(["vw"]),
            Block::word("kw", "Terms:"),
            Block::word("vw", "30 days"),
            query,
            Block::new("qr", BlockType::QueryResult).with_text("PO-4471"),
        ];
        let graph = BlockGraph::new(blocks).unwrap();

        assert_eq!(
            graph.key_value_pairs(),
            vec![KeyValue {
                key: "Terms:".to_string(),
                value: "30 days".to_string()
            }]
        );

        let answers = graph.query_answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].alias.as_deref(), Some("PO_NUMBER"));
        assert_eq!(answers[0].answer.as_deref(), Some("PO-4471"));
    }
}
