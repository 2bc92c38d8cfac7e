use std::error::Error;

use toolbox_rs::xml::{flatten, Entry, Node, QuickXmlParser, XmlParser};
use tracing_subscriber::EnvFilter;

const DOCUMENT: &str = r#"
<xml>
  <category name="Math">
    <block type="math_number"><field name="NUM">1</field></block>
    <block type="math_arithmetic"/>
  </category>
</xml>
"#;

fn describe(node: &Node, depth: usize) {
    let pad = "  ".repeat(depth);
    for (key, entry) in node.iter() {
        match entry {
            Entry::Text(text) => println!("{pad}{key} = {text:?}"),
            Entry::Node(child) => {
                println!("{pad}{key}:");
                describe(child, depth + 1);
            }
            Entry::List(children) => {
                for (index, child) in children.iter().enumerate() {
                    println!("{pad}{key}[{index}]:");
                    describe(child, depth + 1);
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let root = QuickXmlParser.parse(DOCUMENT)?;
    let document = flatten(&root);
    describe(&document, 0);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
