//! Toolbox model: normalized categories and block trees.
//!
//! The pipeline is `text → Element → Node → Vec<Category>`; parsing and
//! flattening live in [`toolbox_xml`], this crate owns the last step.

pub mod model;
pub mod normalize;

use thiserror::Error;
use toolbox_xml::{flatten, Element, ParseFailure, QuickXmlParser, XmlParser};

pub use model::{Block, Category, Fields, Mutation, Slot, StatementContent, Statements, Values};
pub use normalize::{normalize, resolve_block, resolve_slot, BlockKind};

/// The flattened document does not have the toolbox shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedToolboxError {
    /// Nothing to normalize: the document wrapper is empty.
    #[error("document has no root element")]
    MissingRoot,
    /// The document element is not `<xml>`.
    #[error("root element is <{0}>, expected <xml>")]
    UnexpectedRoot(String),
    /// `<xml>` has no `<category>` children.
    #[error("toolbox has no <category> elements")]
    NoCategories,
}

/// Error type for the text-to-model entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolboxError {
    #[error("parse failure: {0}")]
    Parse(#[from] ParseFailure),
    #[error("malformed toolbox: {0}")]
    Malformed(#[from] MalformedToolboxError),
}

/// Flatten and normalize an already-parsed toolbox document.
pub fn transform(root: &Element) -> Result<Vec<Category>, MalformedToolboxError> {
    normalize(&flatten(root))
}

/// Parse toolbox text with the supplied parser and normalize it.
pub fn parse_toolbox_with<P: XmlParser + ?Sized>(
    parser: &P,
    xml: &str,
) -> Result<Vec<Category>, ToolboxError> {
    let root = parser.parse(xml)?;
    Ok(transform(&root)?)
}

/// Parse toolbox text with [`QuickXmlParser`] and normalize it.
pub fn parse_toolbox(xml: &str) -> Result<Vec<Category>, ToolboxError> {
    parse_toolbox_with(&QuickXmlParser, xml)
}
