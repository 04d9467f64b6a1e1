//! XML namespace handling
//!
//! This module provides qualified names (QNames), prefix mappings and the
//! namespaces of the OGC schemas a WFS 2.0 document draws on.

use crate::error::{Error, Result};
use crate::names::{split_qname, validate_qname};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// WFS 2.0 namespace
pub const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs/2.0";

/// Filter Encoding 2.0 namespace
pub const FES_NAMESPACE: &str = "http://www.opengis.net/fes/2.0";

/// OWS 1.1 namespace
pub const OWS_NAMESPACE: &str = "http://www.opengis.net/ows/1.1";

/// GML 3.2 namespace
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";

/// XLink namespace
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
///
/// The prefix is carried for round-tripping only; two names are equal when
/// namespace and local name match.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
    /// Prefix used in the source document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Prefix>,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Create a QName in the WFS 2.0 namespace with the `wfs` prefix
    pub fn wfs(local_name: impl Into<String>) -> Self {
        Self::namespaced(WFS_NAMESPACE, local_name).with_prefix("wfs")
    }

    /// Create a QName in the FES 2.0 namespace with the `fes` prefix
    pub fn fes(local_name: impl Into<String>) -> Self {
        Self::namespaced(FES_NAMESPACE, local_name).with_prefix("fes")
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Name in `prefix:local` form, or the bare local name without a prefix
    pub fn prefixed(&self) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, self.local_name),
            _ => self.local_name.clone(),
        }
    }

    /// Parse a lexical `prefix:local` name without resolving the prefix
    pub fn parse_lexical(lexical: &str) -> Result<Self> {
        let lexical = lexical.trim();
        validate_qname(lexical)?;
        let (prefix, local) = split_qname(lexical);
        Ok(Self {
            namespace: None,
            local_name: local.to_string(),
            prefix: prefix.map(String::from),
        })
    }

    /// Check whether namespace and local name match
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Well-known namespaces used when describing records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ns {
    /// Unqualified (plain attributes)
    None,
    /// WFS 2.0
    Wfs,
    /// Filter Encoding 2.0
    Fes,
    /// OWS 1.1
    Ows,
    /// GML 3.2
    Gml,
    /// XLink
    Xlink,
    /// The reserved `xml` namespace
    Xml,
}

impl Ns {
    /// All namespaces declared on an encoded root element
    pub const DECLARED: [Ns; 5] = [Ns::Wfs, Ns::Fes, Ns::Ows, Ns::Gml, Ns::Xlink];

    /// Namespace URI
    pub fn uri(self) -> Option<&'static str> {
        match self {
            Ns::None => None,
            Ns::Wfs => Some(WFS_NAMESPACE),
            Ns::Fes => Some(FES_NAMESPACE),
            Ns::Ows => Some(OWS_NAMESPACE),
            Ns::Gml => Some(GML_NAMESPACE),
            Ns::Xlink => Some(XLINK_NAMESPACE),
            Ns::Xml => Some(XML_NAMESPACE),
        }
    }

    /// Conventional prefix
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Ns::None => None,
            Ns::Wfs => Some("wfs"),
            Ns::Fes => Some("fes"),
            Ns::Ows => Some("ows"),
            Ns::Gml => Some("gml"),
            Ns::Xlink => Some("xlink"),
            Ns::Xml => Some("xml"),
        }
    }

    /// Look up a well-known namespace by URI
    pub fn from_uri(uri: Option<&str>) -> Option<Ns> {
        match uri {
            None => Some(Ns::None),
            Some(WFS_NAMESPACE) => Some(Ns::Wfs),
            Some(FES_NAMESPACE) => Some(Ns::Fes),
            Some(OWS_NAMESPACE) => Some(Ns::Ows),
            Some(GML_NAMESPACE) => Some(Ns::Gml),
            Some(XLINK_NAMESPACE) => Some(Ns::Xlink),
            Some(XML_NAMESPACE) => Some(Ns::Xml),
            Some(_) => None,
        }
    }

    /// Qualify a local name with the conventional prefix
    pub fn qualify(self, local_name: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_string(),
        }
    }

    /// Build a QName in this namespace
    pub fn qname(self, local_name: impl Into<String>) -> QName {
        let qname = QName::new(self.uri(), local_name);
        match self.prefix() {
            Some(prefix) => qname.with_prefix(prefix),
            None => qname,
        }
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self {
            prefixes: HashMap::new(),
            default_namespace: None,
        }
    }

    /// Context with the conventional OGC prefixes bound
    pub fn ogc() -> Self {
        let mut ctx = Self::new();
        for ns in Ns::DECLARED {
            if let (Some(prefix), Some(uri)) = (ns.prefix(), ns.uri()) {
                ctx.add_prefix(prefix, uri);
            }
        }
        ctx
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Find a prefix bound to a namespace URI
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Iterate over prefix bindings
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &NamespaceUri)> {
        self.prefixes.iter()
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        let mut qname = QName::parse_lexical(prefixed_name)?;
        match qname.prefix.as_deref() {
            Some(prefix) => {
                let namespace = self
                    .get_namespace(prefix)
                    .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
                qname.namespace = Some(namespace.to_string());
            }
            None => qname.namespace = self.default_namespace.clone(),
        }
        Ok(qname)
    }

    /// Fill in the namespace of a QName parsed without context
    pub fn resolve_qname(&self, qname: &QName) -> Result<QName> {
        if qname.namespace.is_some() {
            return Ok(qname.clone());
        }
        self.resolve(&qname.prefixed())
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced("http://www.openplans.org/topp", "states");
        assert_eq!(
            qname.namespace,
            Some("http://www.openplans.org/topp".to_string())
        );
        assert_eq!(qname.local_name, "states");
    }

    #[test]
    fn test_qname_display() {
        let qname = QName::wfs("GetFeature");
        assert_eq!(qname.to_string(), "{http://www.opengis.net/wfs/2.0}GetFeature");
        assert_eq!(qname.prefixed(), "wfs:GetFeature");

        let qname_local = QName::local("states");
        assert_eq!(qname_local.to_string(), "states");
    }

    #[test]
    fn test_qname_equality_ignores_prefix() {
        let a = QName::namespaced(WFS_NAMESPACE, "Query").with_prefix("wfs");
        let b = QName::namespaced(WFS_NAMESPACE, "Query").with_prefix("w");
        assert_eq!(a, b);
        assert_ne!(a, QName::local("Query"));
    }

    #[test]
    fn test_parse_lexical() {
        let qname = QName::parse_lexical("topp:states").unwrap();
        assert_eq!(qname.prefix.as_deref(), Some("topp"));
        assert_eq!(qname.local_name, "states");
        assert!(qname.namespace.is_none());

        assert!(QName::parse_lexical("topp:").is_err());
    }

    #[test]
    fn test_namespace_context() {
        let mut ctx = NamespaceContext::ogc();
        ctx.set_default_namespace("http://example.com");

        assert_eq!(ctx.get_namespace("wfs"), Some(WFS_NAMESPACE));
        assert_eq!(ctx.get_namespace("xml"), Some(XML_NAMESPACE));
        assert_eq!(ctx.get_default_namespace(), Some("http://example.com"));
        assert_eq!(ctx.prefix_for(FES_NAMESPACE), Some("fes"));
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("topp", "http://www.openplans.org/topp");

        let qname = ctx.resolve("topp:states").unwrap();
        assert_eq!(
            qname.namespace,
            Some("http://www.openplans.org/topp".to_string())
        );
        assert_eq!(qname.prefix.as_deref(), Some("topp"));

        assert!(matches!(ctx.resolve("nope:states"), Err(Error::Namespace(_))));
    }

    #[test]
    fn test_ns_lookup() {
        assert_eq!(Ns::from_uri(Some(GML_NAMESPACE)), Some(Ns::Gml));
        assert_eq!(Ns::from_uri(None), Some(Ns::None));
        assert_eq!(Ns::from_uri(Some("urn:other")), None);
        assert_eq!(Ns::Wfs.qualify("Query"), "wfs:Query");
        assert_eq!(Ns::None.qualify("handle"), "handle");
        assert_eq!(Ns::Fes.qname("Filter"), QName::fes("Filter"));
    }
}
