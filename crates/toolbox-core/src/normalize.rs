//! Flattened toolbox mapping → [`Category`] / [`Block`] tree.
//!
//! Every place that may hold either a `<block>` or a `<shadow>` (value slots,
//! next links, statement slots) goes through [`resolve_slot`]. A `<block>`
//! always wins over a sibling `<shadow>`; when several candidates of the same
//! tag are present the first one in document order is used.

use indexmap::IndexMap;
use toolbox_xml::{Entry, Node, TEXT_KEY};
use tracing::{debug, warn};

use crate::model::{Block, Category, Fields, Mutation, Slot, StatementContent, Statements, Values};
use crate::MalformedToolboxError;

const ROOT_TAG: &str = "xml";
const CATEGORY_TAG: &str = "category";
const BLOCK_TAG: &str = "block";
const SHADOW_TAG: &str = "shadow";
const FIELD_TAG: &str = "field";
const VALUE_TAG: &str = "value";
const STATEMENT_TAG: &str = "statement";
const NEXT_TAG: &str = "next";
const MUTATION_TAG: &str = "mutation";

const NAME_ATTR: &str = "name";
const TYPE_ATTR: &str = "type";

/// Which tag a block node was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Block,
    Shadow,
}

/// Normalize a flattened toolbox document (the wrapper returned by
/// [`toolbox_xml::flatten`]).
pub fn normalize(document: &Node) -> Result<Vec<Category>, MalformedToolboxError> {
    let root = match document.first(ROOT_TAG) {
        Some(root) => root,
        None => {
            return Err(match document.iter().next() {
                Some((tag, _)) => MalformedToolboxError::UnexpectedRoot(tag.clone()),
                None => MalformedToolboxError::MissingRoot,
            })
        }
    };

    let categories: Vec<Category> = root.children(CATEGORY_TAG).map(resolve_category).collect();
    if categories.is_empty() {
        return Err(MalformedToolboxError::NoCategories);
    }
    debug!(categories = categories.len(), "normalized toolbox");
    Ok(categories)
}

fn resolve_category(node: &Node) -> Category {
    let blocks = node.has_children(BLOCK_TAG).then(|| {
        node.children(BLOCK_TAG)
            .map(|block| resolve_block(block, BlockKind::Block))
            .collect::<Vec<_>>()
    });
    Category {
        name: string_entry(node, "name"),
        colour: string_entry(node, "colour"),
        custom: string_entry(node, "custom"),
        blocks,
    }
}

/// Category properties are normally attributes, but `name`/`colour`/`custom`
/// written as child elements land in lists; take the first one's text.
fn string_entry(node: &Node, key: &str) -> Option<String> {
    match node.get(key)? {
        Entry::Text(text) => Some(text.clone()),
        entry => entry.nodes().next().and_then(Node::value).map(str::to_string),
    }
}

/// Resolve one `<block>` or `<shadow>` node and everything plugged into it.
pub fn resolve_block(node: &Node, kind: BlockKind) -> Block {
    let shadow = kind == BlockKind::Shadow;
    let block_type = match node.text(TYPE_ATTR) {
        Some(block_type) => block_type.to_string(),
        None => {
            warn!(shadow, "block without a type attribute");
            String::new()
        }
    };

    Block {
        block_type,
        shadow,
        mutation: node.first(MUTATION_TAG).map(resolve_mutation),
        fields: node.has_children(FIELD_TAG).then(|| resolve_fields(node)),
        values: node
            .has_children(VALUE_TAG)
            .then(|| resolve_values(node.children(VALUE_TAG))),
        next: node.first(NEXT_TAG).map(resolve_slot),
        statements: node
            .has_children(STATEMENT_TAG)
            .then(|| resolve_statements(node)),
    }
}

/// Resolve the content of a `<value>` or `<next>` element.
pub fn resolve_slot(container: &Node) -> Slot {
    match slot_block(container) {
        Some(block) => block.into(),
        None => Slot::Empty,
    }
}

fn slot_block(container: &Node) -> Option<Block> {
    let (node, kind) = match container.first(BLOCK_TAG) {
        Some(block) => {
            if container.has_children(SHADOW_TAG) {
                debug!("slot holds both block and shadow; using the block");
            }
            (block, BlockKind::Block)
        }
        None => (container.first(SHADOW_TAG)?, BlockKind::Shadow),
    };
    Some(resolve_block(node, kind))
}

fn resolve_mutation(node: &Node) -> Mutation {
    let mut mutation = Mutation::default();
    for (key, entry) in node.iter() {
        match entry {
            Entry::Text(text) => {
                if key == TEXT_KEY {
                    mutation.inner_content = Some(text.clone());
                }
                mutation.attributes.insert(key.clone(), text.clone());
            }
            _ => {
                mutation.children.insert(key.clone(), entry.clone());
            }
        }
    }
    mutation
}

fn resolve_fields(block: &Node) -> Fields {
    let mut fields = Fields::new();
    for field in block.children(FIELD_TAG) {
        let Some(name) = field.text(NAME_ATTR) else {
            debug!("skipping field without a name");
            continue;
        };
        let value = field.value().unwrap_or_default().to_string();
        if fields.insert(name.to_string(), value).is_some() {
            debug!(field = name, "duplicate field name; later value wins");
        }
    }
    fields
}

fn resolve_values<'a>(slots: impl Iterator<Item = &'a Node>) -> Values {
    let mut values = Values::new();
    for slot in slots {
        let Some(name) = slot.text(NAME_ATTR) else {
            debug!("skipping value slot without a name");
            continue;
        };
        if values.insert(name.to_string(), resolve_slot(slot)).is_some() {
            debug!(value = name, "duplicate value slot; later one wins");
        }
    }
    values
}

fn resolve_statements(block: &Node) -> Statements {
    let mut statements: Statements = IndexMap::new();
    for statement in block.children(STATEMENT_TAG) {
        let Some(name) = statement.text(NAME_ATTR) else {
            debug!("skipping statement slot without a name");
            continue;
        };
        let content = match slot_block(statement) {
            Some(block) => StatementContent::Block(Box::new(block)),
            None if statement.has_children(VALUE_TAG) => {
                StatementContent::Values(resolve_values(statement.children(VALUE_TAG)))
            }
            None => StatementContent::Empty,
        };
        if statements.insert(name.to_string(), content).is_some() {
            debug!(statement = name, "duplicate statement slot; later one wins");
        }
    }
    statements
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use toolbox_xml::parse_and_flatten;

    use super::*;

    fn normalize_str(xml: &str) -> Result<Vec<Category>, MalformedToolboxError> {
        normalize(&parse_and_flatten(xml).expect("parse xml"))
    }

    fn single_block(xml: &str) -> Block {
        let wrapped = format!(r#"<xml><category name="C">{xml}</category></xml>"#);
        let mut categories = normalize_str(&wrapped).expect("normalize");
        let mut blocks = categories.remove(0).blocks.expect("blocks");
        blocks.remove(0)
    }

    #[test]
    fn logic_category_end_to_end() {
        let categories = normalize_str(
            r##"<xml><category name="Logic" colour="#5C81A6"><block type="controls_if"><value name="IF0"><block type="logic_compare"/></value></block></category></xml>"##,
        )
        .expect("normalize");
        assert_eq!(categories.len(), 1);
        assert_eq!(
            serde_json::to_value(&categories[0]).expect("serialize"),
            json!({
                "name": "Logic",
                "colour": "#5C81A6",
                "blocks": [{
                    "type": "controls_if",
                    "shadow": false,
                    "values": {"IF0": {"type": "logic_compare", "shadow": false}}
                }]
            })
        );
    }

    #[test]
    fn categories_keep_document_order() {
        let categories = normalize_str(
            r#"<xml>
                <category name="Logic"/>
                <category name="Loops"/>
                <category name="Math"/>
                <category name="Variables" custom="VARIABLE"/>
            </xml>"#,
        )
        .expect("normalize");
        let names: Vec<_> = categories.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, ["Logic", "Loops", "Math", "Variables"]);
        assert_eq!(categories[3].custom.as_deref(), Some("VARIABLE"));
    }

    #[test]
    fn category_without_blocks_has_no_blocks_entry() {
        let categories = normalize_str(r#"<xml><category name="Empty"/></xml>"#).expect("normalize");
        assert_eq!(categories[0].blocks, None);
        assert_eq!(
            serde_json::to_value(&categories[0]).expect("serialize"),
            json!({"name": "Empty"})
        );
    }

    #[test]
    fn blocks_keep_document_order() {
        let categories = normalize_str(
            r#"<xml><category name="Text">
                <block type="text"/>
                <block type="text_join"/>
                <block type="text_print"/>
            </category></xml>"#,
        )
        .expect("normalize");
        let types: Vec<_> = categories[0]
            .blocks()
            .iter()
            .map(|b| b.block_type.as_str())
            .collect();
        assert_eq!(types, ["text", "text_join", "text_print"]);
    }

    #[test]
    fn field_text_becomes_field_value() {
        let block = single_block(r#"<block type="math_number"><field name="X">hello</field></block>"#);
        let fields = block.fields.expect("fields");
        assert_eq!(fields["X"], "hello");
    }

    #[test]
    fn duplicate_field_names_keep_later_value() {
        let block = single_block(
            r#"<block type="t"><field name="X">first</field><field name="X">second</field><field>anon</field></block>"#,
        );
        let fields = block.fields.expect("fields");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["X"], "second");
    }

    #[test]
    fn empty_field_yields_empty_string() {
        let block = single_block(r#"<block type="text"><field name="TEXT"></field></block>"#);
        assert_eq!(block.fields.expect("fields")["TEXT"], "");
    }

    #[test]
    fn value_with_block_is_not_shadow() {
        let block = single_block(r#"<block type="p"><value name="A"><block type="T"/></value></block>"#);
        let values = block.values.expect("values");
        assert_eq!(values["A"], Slot::from(Block::new("T", false)));
    }

    #[test]
    fn value_with_only_shadow_is_shadow() {
        let block = single_block(r#"<block type="p"><value name="A"><shadow type="T"/></value></block>"#);
        let values = block.values.expect("values");
        assert_eq!(values["A"], Slot::from(Block::new("T", true)));
    }

    // Historically one resolver let a later <shadow> overwrite the <block>
    // in value slots and the other did so for <next>; both now prefer the block.
    #[test]
    fn block_wins_over_shadow_in_every_slot() {
        let block = single_block(
            r#"<block type="p">
                <value name="A"><shadow type="S"/><block type="B"/></value>
                <next><block type="B2"/><shadow type="S2"/></next>
                <statement name="DO"><shadow type="S3"/><block type="B3"/></statement>
            </block>"#,
        );
        let values = block.values.expect("values");
        assert_eq!(values["A"], Slot::from(Block::new("B", false)));
        assert_eq!(block.next, Some(Slot::from(Block::new("B2", false))));
        let statements = block.statements.expect("statements");
        assert_eq!(
            statements["DO"],
            StatementContent::Block(Box::new(Block::new("B3", false)))
        );
    }

    #[test]
    fn empty_slots_resolve_to_empty() {
        let block = single_block(
            r#"<block type="p"><value name="A"/><next/><statement name="DO"/></block>"#,
        );
        assert_eq!(block.values.expect("values")["A"], Slot::Empty);
        assert_eq!(block.next, Some(Slot::Empty));
        assert_eq!(block.statements.expect("statements")["DO"], StatementContent::Empty);
    }

    #[test]
    fn statement_with_bare_values_resolves_to_values() {
        let block = single_block(
            r#"<block type="p"><statement name="DO">
                <value name="X"><shadow type="math_number"/></value>
                <value name="Y"><block type="logic_boolean"/></value>
            </statement></block>"#,
        );
        let statements = block.statements.expect("statements");
        let StatementContent::Values(values) = &statements["DO"] else {
            panic!("expected values, got {:?}", statements["DO"]);
        };
        assert_eq!(values["X"], Slot::from(Block::new("math_number", true)));
        assert_eq!(values["Y"], Slot::from(Block::new("logic_boolean", false)));
    }

    #[test]
    fn every_statement_slot_is_recorded() {
        let block = single_block(
            r#"<block type="controls_if">
                <mutation else="1"/>
                <statement name="DO0"><block type="a"/></statement>
                <statement name="ELSE"><block type="b"/></statement>
            </block>"#,
        );
        let statements = block.statements.expect("statements");
        let names: Vec<_> = statements.keys().map(String::as_str).collect();
        assert_eq!(names, ["DO0", "ELSE"]);
    }

    #[test]
    fn next_chain_and_shadow_children_resolve_recursively() {
        let block = single_block(
            r#"<block type="a">
                <next><block type="b"><next><shadow type="c">
                    <value name="V"><shadow type="d"/></value>
                </shadow></next></block></next>
            </block>"#,
        );
        let b = block.next.as_ref().and_then(Slot::block).expect("b");
        assert_eq!(b.block_type, "b");
        let c = b.next.as_ref().and_then(Slot::block).expect("c");
        assert!(c.shadow);
        let d = c.values.as_ref().and_then(|v| v["V"].block()).expect("d");
        assert_eq!(d, &Block::new("d", true));
    }

    #[test]
    fn mutation_splits_attributes_text_and_children() {
        let block = single_block(
            r#"<block type="procedures_callnoreturn">
                <mutation name="do something" items="2">inner<arg name="x"/></mutation>
            </block>"#,
        );
        let mutation = block.mutation.expect("mutation");
        assert_eq!(mutation.attributes["name"], "do something");
        assert_eq!(mutation.attributes["items"], "2");
        assert_eq!(mutation.inner_content.as_deref(), Some("inner"));
        assert!(matches!(mutation.children.get("arg"), Some(Entry::Node(_))));
        assert!(!mutation.attributes.contains_key("arg"));
    }

    #[test]
    fn mutation_value_attribute_is_kept_in_attributes() {
        let block = single_block(
            r#"<block type="math_change"><mutation value="5" items="2"/></block>"#,
        );
        let mutation = block.mutation.expect("mutation");
        assert_eq!(mutation.attributes.get("value").map(String::as_str), Some("5"));
        assert_eq!(mutation.attributes["items"], "2");
        assert_eq!(mutation.inner_content.as_deref(), Some("5"));
    }

    #[test]
    fn first_of_several_blocks_fills_the_slot() {
        let block = single_block(
            r#"<block type="p">
                <value name="A"><block type="X"/><block type="Y"/></value>
                <next><shadow type="S1"/><shadow type="S2"/></next>
            </block>"#,
        );
        assert_eq!(block.values.expect("values")["A"], Slot::from(Block::new("X", false)));
        assert_eq!(block.next, Some(Slot::from(Block::new("S1", true))));
    }

    #[test]
    fn statement_shadow_wins_over_bare_values() {
        let block = single_block(
            r#"<block type="p"><statement name="S">
                <value name="V"><block type="v"/></value>
                <shadow type="sh"/>
            </statement></block>"#,
        );
        let statements = block.statements.expect("statements");
        assert_eq!(
            statements["S"],
            StatementContent::Block(Box::new(Block::new("sh", true)))
        );
    }

    #[test]
    fn single_category_counts() {
        let categories = normalize_str(r#"<xml><category name="Only"/></xml>"#).expect("normalize");
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn missing_categories_is_malformed() {
        assert_eq!(
            normalize_str("<xml><block type=\"a\"/></xml>"),
            Err(MalformedToolboxError::NoCategories)
        );
        assert_eq!(
            normalize_str("<toolbox><category/></toolbox>"),
            Err(MalformedToolboxError::UnexpectedRoot("toolbox".into()))
        );
        assert_eq!(normalize(&Node::new()), Err(MalformedToolboxError::MissingRoot));
    }

    #[test]
    fn normalization_is_deterministic() {
        let doc = parse_and_flatten(
            r#"<xml><category name="Loops" colour="120">
                <block type="controls_repeat_ext">
                    <value name="TIMES"><shadow type="math_number"><field name="NUM">10</field></shadow></value>
                </block>
            </category></xml>"#,
        )
        .expect("parse xml");
        assert_eq!(normalize(&doc), normalize(&doc));
    }
}
