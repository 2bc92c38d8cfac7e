use std::error::Error;

use toolbox_rs::{parse_toolbox, Slot};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TOOLBOX: &str = r##"
<xml id="toolbox" style="display: none">
  <category name="Logic" colour="#5C81A6">
    <block type="controls_if">
      <value name="IF0"><block type="logic_compare"/></value>
    </block>
    <block type="logic_boolean"><field name="BOOL">TRUE</field></block>
  </category>
  <category name="Loops" colour="#5CA65C">
    <block type="controls_repeat_ext">
      <value name="TIMES">
        <shadow type="math_number"><field name="NUM">10</field></shadow>
      </value>
      <statement name="DO">
        <block type="text_print">
          <value name="TEXT"><shadow type="text"><field name="TEXT">abc</field></shadow></value>
        </block>
      </statement>
    </block>
  </category>
  <category name="Lists" colour="#745CA6">
    <block type="lists_create_with"><mutation items="3"/></block>
  </category>
  <category name="Variables" colour="#A65C81" custom="VARIABLE"/>
</xml>
"##;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let categories = parse_toolbox(TOOLBOX)?;
    info!(count = categories.len(), "parsed toolbox");

    for category in &categories {
        let shadows = category
            .blocks()
            .iter()
            .flat_map(|block| block.values.iter().flat_map(|v| v.values()))
            .filter_map(Slot::block)
            .filter(|block| block.shadow)
            .count();
        info!(
            name = category.name.as_deref().unwrap_or("-"),
            blocks = category.blocks().len(),
            shadows,
            "category"
        );
    }

    println!("{}", serde_json::to_string_pretty(&categories)?);
    Ok(())
}
