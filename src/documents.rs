//! Wildcard XML content
//!
//! Schema wildcards (`xs:any`) and mixed content hold arbitrary XML: filter
//! predicates, GML features inside an Insert, vendor payloads of a Native
//! action. [`AnyElement`] keeps such content as a small element tree that
//! the encoder writes back verbatim.

use crate::error::{Error, Result};
use crate::namespaces::{NamespaceContext, QName};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Attribute of a wildcard element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name (unprefixed attributes have no namespace)
    pub name: QName,
    /// Attribute value
    pub value: String,
}

/// Node of mixed content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    /// Child element
    Element(AnyElement),
    /// Character data
    Text(String),
}

/// XML element held by a wildcard slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyElement {
    /// Element qualified name
    pub qname: QName,
    /// Attributes in document order
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element, as (prefix, uri);
    /// an empty prefix is the default namespace
    pub namespaces: Vec<(String, String)>,
    /// Child elements and text in document order
    pub content: Vec<Content>,
}

impl AnyElement {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Create an element with a single text node
    pub fn with_text(qname: QName, text: impl Into<String>) -> Self {
        let mut element = Self::new(qname);
        element.push_text(text);
        element
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.local_name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| &attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, replacing any attribute with the same name
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Declare a namespace prefix on this element
    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.push((prefix.into(), uri.into()));
    }

    /// Add a child element
    pub fn add_child(&mut self, child: AnyElement) {
        self.content.push(Content::Element(child));
    }

    /// Append character data
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(Content::Text(text.into()));
    }

    /// Concatenated character data of this element (not descendants)
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = &AnyElement> {
        self.content.iter().filter_map(|c| match c {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&AnyElement> {
        self.children()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Parse a single-rooted XML fragment
    pub fn parse(xml: &str) -> Result<AnyElement> {
        Self::parse_with_context(xml, &NamespaceContext::new())
    }

    /// Parse a fragment whose prefixes may be bound by an enclosing document
    pub fn parse_with_context(xml: &str, context: &NamespaceContext) -> Result<AnyElement> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut stack: Vec<(AnyElement, NamespaceContext)> = Vec::new();
        let mut root: Option<AnyElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let scope = stack.last().map(|(_, ctx)| ctx).unwrap_or(context);
                    let (element, ctx) = parse_element(&e, scope)?;
                    stack.push((element, ctx));
                }
                Ok(Event::Empty(e)) => {
                    let scope = stack.last().map(|(_, ctx)| ctx).unwrap_or(context);
                    let (element, _) = parse_element(&e, scope)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    if let Some((element, _)) = stack.pop() {
                        attach(&mut stack, &mut root, element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    if let Some((current, _)) = stack.last_mut() {
                        if !text.trim().is_empty() {
                            current.push_text(text.into_owned());
                        }
                    } else if !text.trim().is_empty() {
                        return Err(Error::Xml("text outside of the root element".to_string()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some((current, _)) = stack.last_mut() {
                        let text = String::from_utf8(e.into_inner().into_owned())
                            .map_err(|e| Error::Xml(format!("Invalid CDATA: {}", e)))?;
                        current.push_text(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Comments, processing instructions, declarations
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unexpected end of fragment".to_string()));
        }
        root.ok_or_else(|| Error::Xml("fragment has no root element".to_string()))
    }
}

fn attach(
    stack: &mut [(AnyElement, NamespaceContext)],
    root: &mut Option<AnyElement>,
    element: AnyElement,
) -> Result<()> {
    if let Some((parent, _)) = stack.last_mut() {
        parent.add_child(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(Error::Xml("fragment has more than one root element".to_string()));
    }
    Ok(())
}

/// Parse an element start tag, returning the element and its in-scope context
fn parse_element(
    start: &BytesStart,
    scope: &NamespaceContext,
) -> Result<(AnyElement, NamespaceContext)> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
        .to_string();

    let mut ctx = scope.clone();
    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();

    for attr_result in start.attributes() {
        let attr =
            attr_result.map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

        let attr_name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
            .to_string();

        let attr_value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
            .into_owned();

        // Namespace declarations apply to the element's own name and attributes
        if attr_name == "xmlns" {
            ctx.set_default_namespace(&attr_value);
            declarations.push((String::new(), attr_value));
        } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
            ctx.add_prefix(prefix, &attr_value);
            declarations.push((prefix.to_string(), attr_value));
        } else {
            raw_attributes.push((attr_name, attr_value));
        }
    }

    let mut element = AnyElement::new(ctx.resolve(&name)?);
    element.namespaces = declarations;

    for (attr_name, value) in raw_attributes {
        // Unprefixed attributes are in no namespace
        let name = if attr_name.contains(':') {
            ctx.resolve(&attr_name)?
        } else {
            QName::parse_lexical(&attr_name)?
        };
        element.attributes.push(Attribute { name, value });
    }

    Ok((element, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{FES_NAMESPACE, GML_NAMESPACE};

    #[test]
    fn test_parse_filter_fragment() {
        let xml = r#"<fes:Filter xmlns:fes="http://www.opengis.net/fes/2.0">
            <fes:PropertyIsEqualTo matchCase="false">
                <fes:ValueReference>STATE_NAME</fes:ValueReference>
                <fes:Literal>Utah</fes:Literal>
            </fes:PropertyIsEqualTo>
        </fes:Filter>"#;

        let filter = AnyElement::parse(xml).unwrap();
        assert_eq!(filter.local_name(), "Filter");
        assert_eq!(filter.namespace(), Some(FES_NAMESPACE));
        assert_eq!(filter.namespaces, vec![("fes".to_string(), FES_NAMESPACE.to_string())]);

        let predicate = filter.children().next().unwrap();
        assert_eq!(predicate.namespace(), Some(FES_NAMESPACE));
        assert_eq!(predicate.get_attribute("matchCase"), Some("false"));
        assert_eq!(predicate.find_children("Literal")[0].text(), "Utah");
    }

    #[test]
    fn test_parse_mixed_content() {
        let xml = r#"<note>before <b>bold</b> after</note>"#;
        let note = AnyElement::parse(xml).unwrap();

        assert_eq!(note.content.len(), 3);
        assert_eq!(note.text(), "before  after");
        assert!(matches!(&note.content[1], Content::Element(e) if e.local_name() == "b"));
    }

    #[test]
    fn test_parse_with_outer_context() {
        let mut ctx = NamespaceContext::ogc();
        ctx.add_prefix("topp", "http://www.openplans.org/topp");

        let xml = r#"<topp:states gml:id="s1"><topp:NAME>Utah</topp:NAME></topp:states>"#;
        let feature = AnyElement::parse_with_context(xml, &ctx).unwrap();

        assert_eq!(feature.namespace(), Some("http://www.openplans.org/topp"));
        assert_eq!(
            feature.get_attribute_qname(&QName::namespaced(GML_NAMESPACE, "id")),
            Some("s1")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(AnyElement::parse(""), Err(Error::Xml(_))));
        assert!(matches!(AnyElement::parse("<a/><b/>"), Err(Error::Xml(_))));
        assert!(matches!(AnyElement::parse("<x:a/>"), Err(Error::Namespace(_))));
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut element = AnyElement::with_text(QName::local("Literal"), "10");
        element.set_attribute(QName::local("unit"), "m");
        element.set_attribute(QName::local("unit"), "km");

        assert_eq!(element.attributes.len(), 1);
        assert_eq!(element.get_attribute("unit"), Some("km"));
        assert_eq!(element.text(), "10");
    }
}
