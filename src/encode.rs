//! XML encoding of WFS records
//!
//! The encoder walks records through [`Describe`] and writes WFS 2.0 XML.
//! The root element declares the OGC prefixes (`wfs`, `fes`, `ows`, `gml`,
//! `xlink`) and any document bindings; wildcard content brings its own
//! declarations and gets generated prefixes for namespaces that have none.
//!
//! Elements whose content includes text are written inline so no
//! whitespace is added to character data.

use crate::documents::{AnyElement, Content};
use crate::error::{Error, Result};
use crate::model::{Describe, PropertyValue};
use crate::namespaces::{Ns, QName, XML_NAMESPACE, XSI_NAMESPACE};
use crate::wfs::WfsDocument;
use indexmap::IndexMap;
use quick_xml::escape::escape;
use std::io::Write;

/// Default nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Spaces per nesting level; 0 writes everything on one line
    indent: usize,
    /// Whether to start with an XML declaration
    declaration: bool,
    /// Deepest element nesting accepted
    max_depth: usize,
    /// Extra prefix bindings declared on every root
    namespaces: IndexMap<String, String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
            max_depth: DEFAULT_MAX_DEPTH,
            namespaces: IndexMap::new(),
        }
    }
}

impl EncoderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the indentation width
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Whether the XML declaration is written
    pub fn declaration(&self) -> bool {
        self.declaration
    }

    /// Get the nesting limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Set the indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether to write the XML declaration
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Declare `prefix` on every root element
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }
}

/// Prefix bindings in scope while writing
#[derive(Debug, Default)]
struct Scope {
    bindings: Vec<(String, String)>,
    generated: usize,
}

impl Scope {
    fn mark(&self) -> usize {
        self.bindings.len()
    }

    fn reset(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    fn bind(&mut self, prefix: &str, uri: &str) {
        self.bindings.push((prefix.to_string(), uri.to_string()));
    }

    fn namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Non-empty prefix currently bound to `uri`
    fn prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        self.bindings
            .iter()
            .rev()
            .filter(|(p, u)| !p.is_empty() && u == uri)
            .map(|(p, _)| p.as_str())
            .find(|p| self.namespace(p) == Some(uri))
    }

    fn default_namespace(&self) -> Option<&str> {
        self.namespace("").filter(|uri| !uri.is_empty())
    }

    fn fresh_prefix(&mut self) -> String {
        loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if self.namespace(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

/// Writes records as XML text
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    /// Create an encoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with custom configuration
    pub fn with_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode a whole document
    pub fn encode_document(&self, document: &WfsDocument) -> Result<String> {
        let name = document.element_name();
        tracing::debug!(root = %name, "encoding document");

        let mut bindings: Vec<(String, String)> = document
            .prefixes
            .iter()
            .map(|(p, u)| (p.clone(), u.clone()))
            .collect();
        let locations = document.schema_location();
        if locations.is_some() {
            bindings.push(("xsi".to_string(), XSI_NAMESPACE.to_string()));
        }

        let mut out = String::new();
        self.write_root(&mut out, &name, document.root.as_describe(), bindings, locations)?;
        Ok(out)
    }

    /// Encode any record as the root element `name`
    pub fn encode(&self, name: &QName, node: &dyn Describe) -> Result<String> {
        tracing::debug!(root = %name, type_name = node.type_name(), "encoding record");
        let mut out = String::new();
        self.write_root(&mut out, name, node, Vec::new(), None)?;
        Ok(out)
    }

    /// Encode a document into a writer
    pub fn write_document<W: Write>(&self, document: &WfsDocument, mut writer: W) -> Result<()> {
        let text = self.encode_document(document)?;
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn write_root(
        &self,
        out: &mut String,
        name: &QName,
        node: &dyn Describe,
        extra_bindings: Vec<(String, String)>,
        schema_location: Option<String>,
    ) -> Result<()> {
        if self.config.declaration {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            self.newline(out);
        }

        let mut scope = Scope::default();
        let mut declarations = Vec::new();
        for ns in Ns::DECLARED {
            if let (Some(prefix), Some(uri)) = (ns.prefix(), ns.uri()) {
                declarations.push((prefix.to_string(), uri.to_string()));
            }
        }
        for (prefix, uri) in self.config.namespaces.iter() {
            declarations.push((prefix.clone(), uri.clone()));
        }
        declarations.extend(extra_bindings);
        for (prefix, uri) in &declarations {
            scope.bind(prefix, uri);
        }

        let mut head = Vec::with_capacity(declarations.len() + 1);
        for (prefix, uri) in &declarations {
            head.push((xmlns_name(prefix), uri.clone()));
        }
        if let Some(locations) = schema_location {
            head.push(("xsi:schemaLocation".to_string(), locations));
        }

        self.write_record(out, name, node, &head, 0, false, &mut scope)?;
        if self.config.indent > 0 {
            out.push('\n');
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_record(
        &self,
        out: &mut String,
        name: &QName,
        node: &dyn Describe,
        head: &[(String, String)],
        depth: usize,
        inline: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        self.check_depth(depth, name)?;
        let tag = record_name(scope, name)?;
        let properties = node.describe();

        let mark = scope.mark();
        let mut declarations = Vec::new();
        let mut values = Vec::with_capacity(properties.len());
        for property in &properties {
            let value = match &property.qnames {
                Some(qnames) => Some(qname_values(scope, qnames, &mut declarations)?),
                None => None,
            };
            values.push(value);
        }

        out.push('<');
        out.push_str(&tag);
        for (attr, value) in head {
            push_attribute(out, attr, value);
        }
        for (prefix, uri) in &declarations {
            push_attribute(out, &xmlns_name(prefix), uri);
        }
        for (property, value) in properties.iter().zip(&values) {
            if let PropertyValue::Attribute(lexical) = &property.value {
                let attr = record_name(scope, &property.name)?;
                push_attribute(out, &attr, value.as_deref().unwrap_or(lexical.as_str()));
            }
        }

        let content: Vec<_> = properties
            .iter()
            .zip(&values)
            .filter(|(p, _)| !p.is_attribute())
            .collect();
        if content.is_empty() {
            out.push_str("/>");
            scope.reset(mark);
            return Ok(());
        }
        out.push('>');

        let mixed =
            inline || content.iter().any(|(p, _)| matches!(p.value, PropertyValue::Text(_)));
        for (property, value) in &content {
            match &property.value {
                PropertyValue::Text(text) => {
                    out.push_str(&escape(value.as_deref().unwrap_or(text.as_str())));
                }
                PropertyValue::Element(text) => {
                    self.break_line(out, depth + 1, mixed);
                    self.check_depth(depth + 1, &property.name)?;
                    let child = record_name(scope, &property.name)?;
                    out.push('<');
                    out.push_str(&child);
                    out.push('>');
                    out.push_str(&escape(value.as_deref().unwrap_or(text.as_str())));
                    out.push_str("</");
                    out.push_str(&child);
                    out.push('>');
                }
                PropertyValue::Child(child) => {
                    self.break_line(out, depth + 1, mixed);
                    self.write_record(out, &property.name, *child, &[], depth + 1, mixed, scope)?;
                }
                PropertyValue::Any(element) => {
                    self.break_line(out, depth + 1, mixed);
                    self.write_any(out, element, depth + 1, mixed, scope)?;
                }
                PropertyValue::Attribute(_) => {}
            }
        }

        self.break_line(out, depth, mixed);
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
        scope.reset(mark);
        Ok(())
    }

    fn write_any(
        &self,
        out: &mut String,
        element: &AnyElement,
        depth: usize,
        inline: bool,
        scope: &mut Scope,
    ) -> Result<()> {
        self.check_depth(depth, &element.qname)?;
        let mark = scope.mark();
        let mut declarations = element.namespaces.clone();
        for (prefix, uri) in &element.namespaces {
            scope.bind(prefix, uri);
        }

        let tag = any_name(scope, &element.qname, true, &mut declarations)?;
        let mut attributes = Vec::with_capacity(element.attributes.len());
        for attribute in &element.attributes {
            let attr = any_name(scope, &attribute.name, false, &mut declarations)?;
            attributes.push((attr, attribute.value.as_str()));
        }

        out.push('<');
        out.push_str(&tag);
        for (prefix, uri) in &declarations {
            push_attribute(out, &xmlns_name(prefix), uri);
        }
        for (attr, value) in &attributes {
            push_attribute(out, attr, value);
        }

        if element.content.is_empty() {
            out.push_str("/>");
            scope.reset(mark);
            return Ok(());
        }
        out.push('>');

        let mixed = inline || element.content.iter().any(|c| matches!(c, Content::Text(_)));
        for content in &element.content {
            match content {
                Content::Text(text) => out.push_str(&escape(text.as_str())),
                Content::Element(child) => {
                    self.break_line(out, depth + 1, mixed);
                    self.write_any(out, child, depth + 1, mixed, scope)?;
                }
            }
        }

        self.break_line(out, depth, mixed);
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
        scope.reset(mark);
        Ok(())
    }

    fn check_depth(&self, depth: usize, name: &QName) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::Encode(format!(
                "element {} nested deeper than {} levels",
                name, self.config.max_depth
            )));
        }
        Ok(())
    }

    fn break_line(&self, out: &mut String, depth: usize, inline: bool) {
        if inline || self.config.indent == 0 {
            return;
        }
        out.push('\n');
        out.extend(std::iter::repeat(' ').take(depth * self.config.indent));
    }

    fn newline(&self, out: &mut String) {
        if self.config.indent > 0 {
            out.push('\n');
        }
    }
}

/// Encode a document with the default configuration
pub fn to_xml_string(document: &WfsDocument) -> Result<String> {
    Encoder::new().encode_document(document)
}

fn xmlns_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn qualified(prefix: &str, local_name: &str) -> String {
    format!("{}:{}", prefix, local_name)
}

/// Lexical name of a record element or attribute; its prefix must be bound
fn record_name(scope: &Scope, name: &QName) -> Result<String> {
    match name.namespace.as_deref() {
        Some(uri) => {
            if let Some(prefix) = name.prefix.as_deref() {
                if scope.namespace(prefix) == Some(uri) {
                    return Ok(qualified(prefix, &name.local_name));
                }
            }
            scope
                .prefix(uri)
                .map(|prefix| qualified(prefix, &name.local_name))
                .ok_or_else(|| Error::Encode(format!("no prefix bound for namespace {}", uri)))
        }
        None => match name.prefix.as_deref() {
            Some(prefix) if scope.namespace(prefix).is_none() => {
                Err(Error::Encode(format!("prefix '{}' is not bound", prefix)))
            }
            _ => Ok(name.prefixed()),
        },
    }
}

/// Lexical form of QName values, declaring namespaces that have no prefix
fn qname_values(
    scope: &mut Scope,
    qnames: &[QName],
    declarations: &mut Vec<(String, String)>,
) -> Result<String> {
    let mut names = Vec::with_capacity(qnames.len());
    for qname in qnames {
        names.push(any_name(scope, qname, false, declarations)?);
    }
    Ok(names.join(" "))
}

/// Lexical name of a wildcard element or attribute, declaring what is missing
fn any_name(
    scope: &mut Scope,
    name: &QName,
    is_element: bool,
    declarations: &mut Vec<(String, String)>,
) -> Result<String> {
    let Some(uri) = name.namespace.clone() else {
        if let Some(prefix) = name.prefix.as_deref() {
            if scope.namespace(prefix).is_none() {
                return Err(Error::Encode(format!("prefix '{}' is not bound", prefix)));
            }
            return Ok(name.prefixed());
        }
        if is_element && scope.default_namespace().is_some() {
            scope.bind("", "");
            declarations.push((String::new(), String::new()));
        }
        return Ok(name.local_name.clone());
    };

    if let Some(prefix) = name.prefix.as_deref() {
        if scope.namespace(prefix) == Some(uri.as_str()) {
            return Ok(qualified(prefix, &name.local_name));
        }
    }
    if is_element && name.prefix.is_none() && scope.default_namespace() == Some(uri.as_str()) {
        return Ok(name.local_name.clone());
    }
    if let Some(prefix) = scope.prefix(&uri) {
        return Ok(qualified(prefix, &name.local_name));
    }

    let prefix = match name.prefix.as_deref() {
        Some(prefix) if scope.namespace(prefix).is_none() => prefix.to_string(),
        _ => scope.fresh_prefix(),
    };
    tracing::trace!(prefix = %prefix, namespace = %uri, "declaring prefix");
    scope.bind(&prefix, &uri);
    declarations.push((prefix.clone(), uri));
    Ok(qualified(&prefix, &name.local_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Attribute;
    use crate::namespaces::GML_NAMESPACE;
    use crate::wfs::{
        Empty, ExecutionStatus, GetCapabilities, GetFeature, Query, RootElement, Title,
    };
    use pretty_assertions::assert_eq;

    const TOPP: &str = "http://www.openplans.org/topp";

    fn compact() -> Encoder {
        Encoder::with_config(EncoderConfig::new().with_indent(0).with_declaration(false))
    }

    const DECLS: &str = concat!(
        " xmlns:wfs=\"http://www.opengis.net/wfs/2.0\"",
        " xmlns:fes=\"http://www.opengis.net/fes/2.0\"",
        " xmlns:ows=\"http://www.opengis.net/ows/1.1\"",
        " xmlns:gml=\"http://www.opengis.net/gml/3.2\"",
        " xmlns:xlink=\"http://www.w3.org/1999/xlink\""
    );

    #[test]
    fn test_empty_root() {
        let xml = compact().encode(&QName::wfs("Empty"), &Empty).unwrap();
        assert_eq!(xml, format!("<wfs:Empty{}/>", DECLS));
    }

    #[test]
    fn test_declaration_and_unset_status() {
        let doc = WfsDocument::new(RootElement::CreateStoredQueryResponse(ExecutionStatus::ok()));
        let xml = Encoder::new().encode_document(&doc).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("<wfs:CreateStoredQueryResponse"));
        assert!(!xml.contains("status="));

        let mut status = ExecutionStatus::ok();
        status.status.set("OK".to_string());
        let xml = compact()
            .encode(&QName::wfs("CreateStoredQueryResponse"), &status)
            .unwrap();
        assert_eq!(
            xml,
            format!("<wfs:CreateStoredQueryResponse{} status=\"OK\"/>", DECLS)
        );
    }

    #[test]
    fn test_qname_value_uses_bound_prefix() {
        let query = Query::new(QName::namespaced(TOPP, "states"))
            .with_property(QName::namespaced(TOPP, "STATE_NAME"));
        let config = EncoderConfig::new()
            .with_indent(0)
            .with_declaration(false)
            .with_namespace("topp", TOPP);
        let xml = Encoder::with_config(config)
            .encode(&QName::wfs("Query"), &query)
            .unwrap();
        assert_eq!(
            xml,
            format!(
                "<wfs:Query{} xmlns:topp=\"{}\" typeNames=\"topp:states\"><wfs:PropertyName>topp:STATE_NAME</wfs:PropertyName></wfs:Query>",
                DECLS, TOPP
            )
        );
    }

    #[test]
    fn test_qname_value_declares_missing_namespace() {
        let query = Query::new(QName::namespaced(TOPP, "states"));
        let xml = compact().encode(&QName::wfs("Query"), &query).unwrap();
        assert_eq!(
            xml,
            format!(
                "<wfs:Query{} xmlns:ns1=\"{}\" typeNames=\"ns1:states\"/>",
                DECLS, TOPP
            )
        );

        let query = Query::new(QName::namespaced(TOPP, "states").with_prefix("topp"));
        let xml = compact().encode(&QName::wfs("Query"), &query).unwrap();
        let expected = format!(" xmlns:topp=\"{}\" typeNames=\"topp:states\"/>", TOPP);
        assert!(xml.ends_with(&expected));
    }

    #[test]
    fn test_qname_value_with_unbound_prefix_fails() {
        let query = Query::new(QName::parse_lexical("topp:states").unwrap());
        let err = compact().encode(&QName::wfs("Query"), &query).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(err.to_string().contains("prefix 'topp' is not bound"));
    }

    #[test]
    fn test_qname_value_declaration_is_scoped() {
        let mut request = GetFeature::new();
        request.add_query(Query::new(QName::namespaced(TOPP, "states")));
        request.add_query(Query::new(QName::namespaced(TOPP, "roads")));
        let xml = compact().encode_document(&WfsDocument::new(request)).unwrap();
        let states = format!("<wfs:Query xmlns:ns1=\"{}\" typeNames=\"ns1:states\"/>", TOPP);
        let roads = format!("<wfs:Query xmlns:ns2=\"{}\" typeNames=\"ns2:roads\"/>", TOPP);
        assert_eq!(xml.matches("xmlns:ns1=").count(), 1);
        assert!(xml.contains(&states));
        assert!(xml.contains(&roads));
    }

    #[test]
    fn test_text_is_escaped_and_inline() {
        let title = Title::in_language("Roads & <Rails>", "en");
        let xml = Encoder::with_config(EncoderConfig::new().with_declaration(false))
            .encode(&QName::wfs("Title"), &title)
            .unwrap();
        assert_eq!(
            xml,
            format!(
                "<wfs:Title{} xml:lang=\"en\">Roads &amp; &lt;Rails&gt;</wfs:Title>\n",
                DECLS
            )
        );
    }

    #[test]
    fn test_children_are_indented() {
        let mut request = GetCapabilities::new();
        request
            .accept_versions
            .set(crate::ows::AcceptVersions::new(["2.0.0"]));
        let xml = Encoder::with_config(EncoderConfig::new().with_declaration(false))
            .encode(&QName::wfs("GetCapabilities"), &request)
            .unwrap();
        let expected = format!(
            "<wfs:GetCapabilities{} service=\"WFS\">\n  <ows:AcceptVersions>\n    <ows:Version>2.0.0</ows:Version>\n  </ows:AcceptVersions>\n</wfs:GetCapabilities>\n",
            DECLS
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_any_element_declares_unbound_namespace() {
        let mut feature = AnyElement::new(QName::namespaced("http://example.com/topp", "roads"));
        feature.attributes.push(Attribute {
            name: QName::namespaced(GML_NAMESPACE, "id"),
            value: "roads.1".to_string(),
        });
        feature.add_child(AnyElement::with_text(
            QName::namespaced("http://example.com/topp", "surface"),
            "gravel",
        ));

        let mut out = String::new();
        let mut scope = Scope::default();
        scope.bind("gml", GML_NAMESPACE);
        compact().write_any(&mut out, &feature, 0, false, &mut scope).unwrap();
        assert_eq!(
            out,
            "<ns1:roads xmlns:ns1=\"http://example.com/topp\" gml:id=\"roads.1\"><ns1:surface>gravel</ns1:surface></ns1:roads>"
        );
        assert_eq!(scope.mark(), 1);
    }

    #[test]
    fn test_parsed_fragment_round_trips() {
        let xml = r#"<fes:PropertyIsEqualTo xmlns:fes="http://www.opengis.net/fes/2.0"><fes:ValueReference>topp:STATE_NAME</fes:ValueReference><fes:Literal>Ohio</fes:Literal></fes:PropertyIsEqualTo>"#;
        let element = AnyElement::parse(xml).unwrap();
        let mut out = String::new();
        let mut scope = Scope::default();
        compact().write_any(&mut out, &element, 0, false, &mut scope).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn test_unbound_lexical_prefix_fails() {
        let element = AnyElement::new(QName::parse_lexical("topp:roads").unwrap());
        let mut scope = Scope::default();
        let err = compact()
            .write_any(&mut String::new(), &element, 0, false, &mut scope)
            .unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn test_depth_limit() {
        let mut element = AnyElement::new(QName::local("a"));
        element.add_child(AnyElement::new(QName::local("b")));
        let encoder = Encoder::with_config(EncoderConfig::new().with_max_depth(0));
        let mut scope = Scope::default();
        let err = encoder
            .write_any(&mut String::new(), &element, 0, false, &mut scope)
            .unwrap_err();
        assert!(err.to_string().contains("nested deeper than 0 levels"));
    }
}
