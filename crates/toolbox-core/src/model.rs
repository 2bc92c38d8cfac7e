//! Normalized toolbox model: categories owning block trees.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use toolbox_xml::Entry;

/// Field name → text value, in document order.
pub type Fields = IndexMap<String, String>;
/// Value-slot name → plugged block.
pub type Values = IndexMap<String, Slot>;
/// Statement-slot name → plugged content.
pub type Statements = IndexMap<String, StatementContent>;

/// A named, coloured group of blocks in the toolbox.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    /// Dynamic category marker such as `VARIABLE` or `PROCEDURE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    /// `None` when the category had no `<block>` children at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
}

impl Category {
    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_deref().unwrap_or_default()
    }
}

/// A block or shadow block with everything plugged into it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    /// Whether the node came from a `<shadow>` element.
    pub shadow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Values>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Slot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<Statements>,
}

impl Block {
    pub fn new(block_type: impl Into<String>, shadow: bool) -> Self {
        Self {
            block_type: block_type.into(),
            shadow,
            ..Self::default()
        }
    }

    /// Visit this block and every block reachable through its values,
    /// statements and next link, depth first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Block)) {
        f(self);
        for slot in self.values.iter().flat_map(|values| values.values()) {
            if let Some(block) = slot.block() {
                block.visit(f);
            }
        }
        for content in self.statements.iter().flat_map(|s| s.values()) {
            match content {
                StatementContent::Block(block) => block.visit(f),
                StatementContent::Values(values) => {
                    for block in values.values().filter_map(Slot::block) {
                        block.visit(f);
                    }
                }
                StatementContent::Empty => {}
            }
        }
        if let Some(block) = self.next.as_ref().and_then(Slot::block) {
            block.visit(f);
        }
    }
}

/// Block-specific payload carried by a `<mutation>` element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    pub attributes: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_content: Option<String>,
    /// Child elements of the mutation (e.g. procedure `<arg>` lists) in
    /// their generic form.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, Entry>,
}

/// Content of a value slot or next link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Block(Box<Block>),
    /// The slot element was present but held neither a block nor a shadow.
    Empty,
}

impl Slot {
    pub fn block(&self) -> Option<&Block> {
        match self {
            Slot::Block(block) => Some(block),
            Slot::Empty => None,
        }
    }
}

impl From<Block> for Slot {
    fn from(block: Block) -> Self {
        Slot::Block(Box::new(block))
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Block(block) => block.serialize(serializer),
            Slot::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Content of a statement slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementContent {
    Block(Box<Block>),
    /// Bare `<value>` children directly under the statement.
    Values(Values),
    Empty,
}

impl Serialize for StatementContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatementContent::Block(block) => block.serialize(serializer),
            StatementContent::Values(values) => values.serialize(serializer),
            StatementContent::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}
