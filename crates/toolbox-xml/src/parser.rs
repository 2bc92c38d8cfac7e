//! Text → DOM parsing collaborator backed by quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

use crate::dom::{DomNode, Element};

/// Raised when the raw text is not a well-formed single-rooted document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("xml syntax at byte {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("invalid attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },
    #[error("unclosed element <{0}> at end of input")]
    Unclosed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("unexpected second top-level element <{0}>")]
    MultipleRoots(String),
    #[error("text outside the document element at byte {0}")]
    TextOutsideRoot(usize),
}

/// Parsing seam: anything that can turn toolbox text into a DOM tree.
///
/// The pipeline only ever sees the returned [`Element`]; swapping the backend
/// means providing another implementation of this trait.
pub trait XmlParser {
    /// Parse `text` and return its document element.
    fn parse(&self, text: &str) -> Result<Element, ParseFailure>;
}

/// Default [`XmlParser`] built on `quick_xml::Reader`.
///
/// Comments, processing instructions, the XML declaration and doctype are
/// dropped. CDATA content is merged into the adjacent text node.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlParser;

impl XmlParser for QuickXmlParser {
    fn parse(&self, text: &str) -> Result<Element, ParseFailure> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        reader.check_end_names(true);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = open_element(&e)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(ParseFailure::MultipleRoots(element.name));
                    }
                    stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    let element = open_element(&e)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::End(e)) => {
                    let element = stack.pop().ok_or_else(|| ParseFailure::Syntax {
                        position,
                        message: format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    let value = e.unescape().map_err(|err| ParseFailure::Syntax {
                        position,
                        message: err.to_string(),
                    })?;
                    push_text(&mut stack, &value, position)?;
                }
                Ok(Event::CData(e)) => {
                    let value = String::from_utf8(e.into_inner().into_owned()).map_err(|err| {
                        ParseFailure::Syntax {
                            position,
                            message: format!("invalid UTF-8 in CDATA: {err}"),
                        }
                    })?;
                    push_text(&mut stack, &value, position)?;
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(ParseFailure::Syntax {
                        position,
                        message: err.to_string(),
                    })
                }
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(ParseFailure::Unclosed(open.name));
        }
        let root = root.ok_or(ParseFailure::NoRoot)?;
        debug!(root = %root.name, children = root.children.len(), "parsed document");
        Ok(root)
    }
}

fn open_element(event: &BytesStart<'_>) -> Result<Element, ParseFailure> {
    let name = String::from_utf8_lossy(event.name().as_ref()).to_string();
    let mut element = Element::new(name);
    for attr in event.attributes() {
        let attr = attr.map_err(|err| ParseFailure::Attribute {
            element: element.name.clone(),
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| ParseFailure::Attribute {
                element: element.name.clone(),
                message: err.to_string(),
            })?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseFailure> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(DomNode::Element(element));
    } else if root.is_some() {
        return Err(ParseFailure::MultipleRoots(element.name));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], value: &str, position: usize) -> Result<(), ParseFailure> {
    let Some(parent) = stack.last_mut() else {
        if value.trim().is_empty() {
            return Ok(());
        }
        return Err(ParseFailure::TextOutsideRoot(position));
    };
    if let Some(DomNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(value);
    } else {
        parent.children.push(DomNode::Text(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Element, ParseFailure> {
        QuickXmlParser.parse(text)
    }

    #[test]
    fn parse_nested_elements_with_attributes() {
        let root = parse(
            r##"<?xml version="1.0"?>
            <xml>
                <category name="Logic" colour="#5C81A6">
                    <block type="controls_if"/>
                </category>
            </xml>"##,
        )
        .expect("parse xml");
        assert_eq!(root.name, "xml");
        let category = root.elements().next().expect("category");
        assert_eq!(category.name, "category");
        assert_eq!(category.attribute("name"), Some("Logic"));
        assert_eq!(category.attribute("colour"), Some("#5C81A6"));
        let block = category.elements().next().expect("block");
        assert_eq!(block.attribute("type"), Some("controls_if"));
        assert!(block.children.is_empty());
    }

    #[test]
    fn text_is_unescaped_and_kept_raw() {
        let root = parse("<field name=\"OP\">  a &lt; b </field>").expect("parse xml");
        assert_eq!(root.children, vec![DomNode::Text("  a < b ".to_string())]);
    }

    #[test]
    fn cdata_merges_into_text_and_comments_are_dropped() {
        let root = parse("<m>x<!-- note --><![CDATA[<y>]]></m>").expect("parse xml");
        assert_eq!(root.children, vec![DomNode::Text("x<y>".to_string())]);
    }

    #[test]
    fn attribute_entities_are_unescaped() {
        let root = parse(r#"<mutation text="&quot;hi&quot;"/>"#).expect("parse xml");
        assert_eq!(root.attribute("text"), Some("\"hi\""));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            parse("<xml><category></xml>"),
            Err(ParseFailure::Syntax { .. })
        ));
        assert!(matches!(
            parse("<xml><category>"),
            Err(ParseFailure::Unclosed(name)) if name == "category"
        ));
        assert_eq!(parse("   "), Err(ParseFailure::NoRoot));
        assert!(matches!(
            parse("<a/><b/>"),
            Err(ParseFailure::MultipleRoots(name)) if name == "b"
        ));
        assert!(matches!(
            parse("<a/>junk"),
            Err(ParseFailure::TextOutsideRoot(_))
        ));
    }
}
