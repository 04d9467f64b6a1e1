//! Per-type property mapping
//!
//! Generic traversal of a record (encoding, dumping, diffing) goes through
//! [`Describe`]: each record type lists its set properties in document order,
//! built with the [`Properties`] helper. Attributes come before content.

use crate::datatypes::Lexical;
use crate::documents::AnyElement;
use crate::model::reference::Reference;
use crate::model::unsettable::Unsettable;
use crate::namespaces::{Ns, QName};
use std::fmt;

/// Record that can list its properties
pub trait Describe: fmt::Debug {
    /// Schema type name, e.g. `GetFeatureType`
    fn type_name(&self) -> &'static str;

    /// Properties in document order
    fn describe(&self) -> Vec<Property<'_>>;
}

/// Value of a described property
#[derive(Debug, Clone)]
pub enum PropertyValue<'a> {
    /// Attribute in lexical form
    Attribute(String),
    /// Simple-typed child element in lexical form
    Element(String),
    /// Simple content of the record itself
    Text(String),
    /// Complex child record
    Child(&'a dyn Describe),
    /// Wildcard element written as is
    Any(&'a AnyElement),
}

/// A named property of a record
#[derive(Debug, Clone)]
pub struct Property<'a> {
    /// Attribute or element name
    pub name: QName,
    /// Property value
    pub value: PropertyValue<'a>,
    /// QNames behind a lexical value, prefixed against the scope when written
    pub qnames: Option<Vec<QName>>,
}

impl Property<'_> {
    /// Whether this property is an attribute
    pub fn is_attribute(&self) -> bool {
        matches!(self.value, PropertyValue::Attribute(_))
    }

    /// Lexical value of an attribute, simple element or text property
    pub fn lexical(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Attribute(v) | PropertyValue::Element(v) | PropertyValue::Text(v) => {
                Some(v.as_str())
            }
            PropertyValue::Child(_) | PropertyValue::Any(_) => None,
        }
    }
}

/// Find the lexical value of a named attribute in a property list
pub fn attribute_value<'p>(properties: &'p [Property<'_>], local_name: &str) -> Option<&'p str> {
    properties
        .iter()
        .find(|p| p.is_attribute() && p.name.local_name == local_name)
        .and_then(Property::lexical)
}

/// Builder for a property list
#[derive(Debug, Default)]
pub struct Properties<'a> {
    items: Vec<Property<'a>>,
}

impl<'a> Properties<'a> {
    /// Empty list
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn push(mut self, name: QName, value: PropertyValue<'a>) -> Self {
        self.items.push(Property {
            name,
            value,
            qnames: None,
        });
        self
    }

    fn push_lexical<T, F>(mut self, name: QName, value: &T, wrap: F) -> Self
    where
        T: Lexical,
        F: FnOnce(String) -> PropertyValue<'a>,
    {
        self.items.push(Property {
            name,
            value: wrap(value.to_lexical()),
            qnames: value.qnames(),
        });
        self
    }

    /// Unqualified attribute, emitted when present
    pub fn attr<T: Lexical>(self, name: &str, value: Option<&T>) -> Self {
        self.ns_attr(Ns::None, name, value)
    }

    /// Attribute in a namespace, emitted when present
    pub fn ns_attr<T: Lexical>(self, ns: Ns, name: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.push_lexical(ns.qname(name), value, PropertyValue::Attribute),
            None => self,
        }
    }

    /// Optional attribute with a default, emitted only when explicitly set
    pub fn attr_unsettable<T: Lexical + Clone>(self, name: &str, value: &Unsettable<T>) -> Self {
        self.attr(name, value.explicit())
    }

    /// Namespaced optional attribute with a default, emitted only when set
    pub fn ns_attr_unsettable<T: Lexical + Clone>(
        self,
        ns: Ns,
        name: &str,
        value: &Unsettable<T>,
    ) -> Self {
        self.ns_attr(ns, name, value.explicit())
    }

    /// Required attribute, always emitted with its current value
    pub fn attr_required<T: Lexical + Clone>(self, name: &str, value: &Unsettable<T>) -> Self {
        self.attr(name, Some(value.get()))
    }

    /// Simple-typed child element, emitted when present
    pub fn element<T: Lexical>(self, ns: Ns, name: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.push_lexical(ns.qname(name), value, PropertyValue::Element),
            None => self,
        }
    }

    /// Repeated simple-typed child elements
    pub fn elements<'v, T, I>(mut self, ns: Ns, name: &str, values: I) -> Self
    where
        T: Lexical + 'v,
        I: IntoIterator<Item = &'v T>,
    {
        for value in values {
            self = self.element(ns, name, Some(value));
        }
        self
    }

    /// Simple content of the record
    pub fn text<T: Lexical>(self, value: &T) -> Self {
        if value.to_lexical().is_empty() {
            return self;
        }
        self.push_lexical(QName::local("#text"), value, PropertyValue::Text)
    }

    /// Complex child, emitted when present
    pub fn child<D: Describe>(self, ns: Ns, name: &str, value: Option<&'a D>) -> Self {
        match value {
            Some(value) => self.push(ns.qname(name), PropertyValue::Child(value)),
            None => self,
        }
    }

    /// Repeated complex children
    pub fn children<D, I>(mut self, ns: Ns, name: &str, values: I) -> Self
    where
        D: Describe + 'a,
        I: IntoIterator<Item = &'a D>,
    {
        for value in values {
            self = self.child(ns, name, Some(value));
        }
        self
    }

    /// Complex child written under an explicit element name
    pub fn tagged_child(self, tag: &QName, value: &'a dyn Describe) -> Self {
        self.push(tag.clone(), PropertyValue::Child(value))
    }

    /// Referenced child, emitted only when resolved
    pub fn reference<D: Describe>(
        self,
        ns: Ns,
        name: &str,
        value: Option<&'a Reference<D>>,
    ) -> Self {
        match value {
            Some(Reference::Resolved(target)) => {
                self.push(ns.qname(name), PropertyValue::Child(target.as_ref()))
            }
            Some(Reference::Unresolved(id)) => {
                tracing::warn!(property = name, id = %id, "skipping unresolved reference");
                self
            }
            None => self,
        }
    }

    /// Wildcard element
    pub fn any(self, value: &'a AnyElement) -> Self {
        let name = value.qname.clone();
        self.push(name, PropertyValue::Any(value))
    }

    /// Wildcard element, emitted when present
    pub fn any_opt(self, value: Option<&'a AnyElement>) -> Self {
        match value {
            Some(value) => self.any(value),
            None => self,
        }
    }

    /// Repeated wildcard elements
    pub fn anys<I: IntoIterator<Item = &'a AnyElement>>(mut self, values: I) -> Self {
        for value in values {
            self = self.any(value);
        }
        self
    }

    /// Inline the properties of a base type
    pub fn extend(mut self, properties: Vec<Property<'a>>) -> Self {
        self.items.extend(properties);
        self
    }

    /// Finish the list
    pub fn build(self) -> Vec<Property<'a>> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf {
        name: Option<String>,
        lang: Unsettable<String>,
    }

    impl Describe for Leaf {
        fn type_name(&self) -> &'static str {
            "LeafType"
        }

        fn describe(&self) -> Vec<Property<'_>> {
            Properties::new()
                .ns_attr_unsettable(Ns::Xml, "lang", &self.lang)
                .text(&self.name.clone().unwrap_or_default())
                .build()
        }
    }

    #[test]
    fn test_unsettable_attribute_omitted_until_set() {
        let mut leaf = Leaf {
            name: Some("Roads".to_string()),
            lang: Unsettable::new("en".to_string()),
        };
        let props = leaf.describe();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].lexical(), Some("Roads"));

        leaf.lang.set("en".to_string());
        let props = leaf.describe();
        assert_eq!(props[0].name.prefixed(), "xml:lang");
        assert_eq!(attribute_value(&props, "lang"), Some("en"));
    }

    #[test]
    fn test_unresolved_reference_is_skipped() {
        let unresolved: Reference<Leaf> = Reference::unresolved("x");
        let props = Properties::new()
            .reference(Ns::Wfs, "Query", Some(&unresolved))
            .build();
        assert!(props.is_empty());

        let resolved = Reference::resolved(Leaf {
            name: None,
            lang: Unsettable::new("en".to_string()),
        });
        let props = Properties::new()
            .reference(Ns::Wfs, "Query", Some(&resolved))
            .build();
        assert_eq!(props.len(), 1);
        assert!(matches!(props[0].value, PropertyValue::Child(c) if c.type_name() == "LeafType"));
    }

    #[test]
    fn test_required_attribute_always_emitted() {
        let service = Unsettable::new("WFS".to_string());
        let props = Properties::new()
            .attr_required("service", &service)
            .attr_unsettable("version", &Unsettable::new("2.0.0".to_string()))
            .elements(Ns::Wfs, "TypeName", &["a".to_string(), "b".to_string()])
            .build();
        assert_eq!(props.len(), 3);
        assert_eq!(attribute_value(&props, "service"), Some("WFS"));
        assert_eq!(props[2].lexical(), Some("b"));
    }

    #[test]
    fn test_qname_values_keep_their_names() {
        let names = vec![QName::namespaced("http://www.openplans.org/topp", "states")];
        let props = Properties::new()
            .attr("typeNames", Some(&names))
            .attr("handle", Some(&"h1".to_string()))
            .build();
        assert_eq!(props[0].lexical(), Some("states"));
        assert_eq!(props[0].qnames, Some(names));
        assert_eq!(props[1].qnames, None);
    }
}
