//! Toolbox XML parsing and schema-agnostic flattening.
//!
//! Two layers live here:
//!
//! - [`XmlParser`] turns text into an owned DOM ([`Element`]). The default
//!   implementation, [`QuickXmlParser`], uses quick-xml.
//! - [`flatten`] converts that DOM into a generic [`Node`] mapping, resolving
//!   the single-child vs. repeated-children ambiguity with [`Entry`].
//!
//! Neither layer knows anything about categories or blocks.

pub mod dom;
pub mod flatten;
pub mod parser;

pub use dom::{DomNode, Element};
pub use flatten::{flatten, Entry, Node, LIST_TAGS, TEXT_KEY};
pub use parser::{ParseFailure, QuickXmlParser, XmlParser};

/// Parse `text` with [`QuickXmlParser`] and flatten the result.
pub fn parse_and_flatten(text: &str) -> Result<Node, ParseFailure> {
    let root = QuickXmlParser.parse(text)?;
    Ok(flatten(&root))
}
