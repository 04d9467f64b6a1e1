//! Filter Encoding 2.0 types used by WFS queries
//!
//! Only the clause containers are typed. Predicates inside a filter stay
//! wildcard elements, except resource identifiers which transactions and
//! lock responses refer to directly.

use crate::datatypes::{Lexical, SortOrder};
use crate::documents::{AnyElement, Content};
use crate::error::{Error, Result, ValidationError};
use crate::model::validate::{require_text, validate_all, Validate};
use crate::model::{ChildList, Describe, Occurs, Properties, Property};
use crate::namespaces::{Ns, FES_NAMESPACE};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// fes:Filter, the selection clause of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// fes:ResourceId members
    pub resource_ids: ChildList<ResourceId>,
    /// Other predicates (comparison, spatial, temporal, logical, extension)
    pub predicates: ChildList<AnyElement>,
}

impl Filter {
    /// Empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter selecting features by identifier
    pub fn by_ids<I, S>(rids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource_ids: rids.into_iter().map(ResourceId::new).collect(),
            predicates: ChildList::new(),
        }
    }

    /// Filter with a single predicate
    pub fn predicate(predicate: AnyElement) -> Self {
        Self {
            resource_ids: ChildList::new(),
            predicates: ChildList::from(vec![predicate]),
        }
    }

    /// Parse a `fes:Filter` element
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_element(&AnyElement::parse(xml)?)
    }

    /// Build from a parsed `fes:Filter` element
    pub fn from_element(element: &AnyElement) -> Result<Self> {
        if !element.qname.matches(Some(FES_NAMESPACE), "Filter") {
            return Err(Error::Value(format!(
                "expected fes:Filter, found {}",
                element.qname
            )));
        }

        let mut filter = Filter::new();
        for content in &element.content {
            match content {
                Content::Element(child)
                    if child.qname.matches(Some(FES_NAMESPACE), "ResourceId") =>
                {
                    filter.resource_ids.push(ResourceId::from_element(child)?);
                }
                Content::Element(child) => filter.predicates.push(child.clone()),
                Content::Text(text) => {
                    return Err(Error::Value(format!(
                        "unexpected text in fes:Filter: '{}'",
                        text.trim()
                    )))
                }
            }
        }
        Ok(filter)
    }
}

impl Describe for Filter {
    fn type_name(&self) -> &'static str {
        "FilterType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Fes, "ResourceId", &self.resource_ids)
            .anys(&self.predicates)
            .build()
    }
}

impl Validate for Filter {
    fn validate(&self) -> Result<()> {
        if !self.resource_ids.is_empty() && !self.predicates.is_empty() {
            return Err(ValidationError::new(
                "fes:ResourceId cannot be combined with other predicates",
            )
            .with_type_name("FilterType")
            .into());
        }
        if self.resource_ids.is_empty() {
            Occurs::once().check(self.predicates.len(), "FilterType", "predicate")
        } else {
            validate_all(&self.resource_ids, "ResourceId")
        }
    }
}

/// fes:ResourceId
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceId {
    /// rid attribute (required)
    pub rid: Option<String>,
    /// previousRid attribute
    pub previous_rid: Option<String>,
    /// version attribute (`FIRST`, `LATEST`, `PREVIOUS`, `NEXT`, `ALL`, an index or a date)
    pub version: Option<String>,
    /// startDate attribute
    pub start_date: Option<DateTime<FixedOffset>>,
    /// endDate attribute
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl ResourceId {
    /// Identifier for `rid`
    pub fn new(rid: impl Into<String>) -> Self {
        Self {
            rid: Some(rid.into()),
            ..Self::default()
        }
    }

    /// Build from a parsed `fes:ResourceId` element
    pub fn from_element(element: &AnyElement) -> Result<Self> {
        let date = |name: &str| {
            element
                .get_attribute(name)
                .map(DateTime::<FixedOffset>::from_lexical)
                .transpose()
        };
        Ok(Self {
            rid: element.get_attribute("rid").map(String::from),
            previous_rid: element.get_attribute("previousRid").map(String::from),
            version: element.get_attribute("version").map(String::from),
            start_date: date("startDate")?,
            end_date: date("endDate")?,
        })
    }
}

impl Describe for ResourceId {
    fn type_name(&self) -> &'static str {
        "ResourceIdType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("rid", self.rid.as_ref())
            .attr("previousRid", self.previous_rid.as_ref())
            .attr("version", self.version.as_ref())
            .attr("startDate", self.start_date.as_ref())
            .attr("endDate", self.end_date.as_ref())
            .build()
    }
}

impl Validate for ResourceId {
    fn validate(&self) -> Result<()> {
        require_text(self.rid.as_ref(), "ResourceIdType", "rid")
    }
}

/// fes:SortBy, the sorting clause of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    /// fes:SortProperty members
    pub properties: ChildList<SortProperty>,
}

impl SortBy {
    /// Sort on one property
    pub fn single(value_reference: impl Into<String>, order: SortOrder) -> Self {
        Self {
            properties: ChildList::from(vec![SortProperty::new(value_reference, Some(order))]),
        }
    }

    /// Parse `path [ASC|DESC], ...` as used by the KVP `SORTBY` parameter
    pub fn parse_kvp(text: &str) -> Result<Self> {
        let mut sort_by = SortBy::default();
        for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut parts = item.split_whitespace();
            let path = parts.next().unwrap_or_default();
            let order = parts.next().map(SortOrder::from_lexical).transpose()?;
            if parts.next().is_some() {
                return Err(Error::Value(format!("invalid sort property: '{}'", item)));
            }
            sort_by.properties.push(SortProperty::new(path, order));
        }
        Ok(sort_by)
    }
}

impl Describe for SortBy {
    fn type_name(&self) -> &'static str {
        "SortByType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Fes, "SortProperty", &self.properties)
            .build()
    }
}

impl Validate for SortBy {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.properties.len(), "SortByType", "SortProperty")?;
        validate_all(&self.properties, "SortProperty")
    }
}

/// fes:SortProperty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortProperty {
    /// fes:ValueReference (required XPath)
    pub value_reference: Option<String>,
    /// fes:SortOrder
    pub sort_order: Option<SortOrder>,
}

impl SortProperty {
    /// Sort on `value_reference`
    pub fn new(value_reference: impl Into<String>, sort_order: Option<SortOrder>) -> Self {
        Self {
            value_reference: Some(value_reference.into()),
            sort_order,
        }
    }
}

impl Describe for SortProperty {
    fn type_name(&self) -> &'static str {
        "SortPropertyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .element(Ns::Fes, "ValueReference", self.value_reference.as_ref())
            .element(Ns::Fes, "SortOrder", self.sort_order.as_ref())
            .build()
    }
}

impl Validate for SortProperty {
    fn validate(&self) -> Result<()> {
        require_text(self.value_reference.as_ref(), "SortPropertyType", "ValueReference")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_from_xml_splits_resource_ids() {
        let xml = r#"<fes:Filter xmlns:fes="http://www.opengis.net/fes/2.0">
            <fes:ResourceId rid="states.1" startDate="2010-01-01T00:00:00Z"/>
            <fes:ResourceId rid="states.2"/>
        </fes:Filter>"#;
        let filter = Filter::from_xml(xml).unwrap();

        assert_eq!(filter.resource_ids.len(), 2);
        assert_eq!(filter.resource_ids.get(1).unwrap().rid.as_deref(), Some("states.2"));
        assert!(filter.resource_ids.first().unwrap().start_date.is_some());
        assert!(filter.predicates.is_empty());
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_filter_rejects_other_roots() {
        let err = Filter::from_xml("<Filter/>").unwrap_err();
        assert!(matches!(err, Error::Value(_)));
    }

    #[test]
    fn test_filter_choice_is_exclusive() {
        let mut filter = Filter::by_ids(["a.1"]);
        filter
            .predicates
            .push(AnyElement::new(Ns::Fes.qname("PropertyIsNull")));
        assert!(filter.validate().is_err());
        assert!(Filter::new().validate().is_err());
    }

    #[test]
    fn test_sort_by_kvp() {
        let sort_by = SortBy::parse_kvp("NAME ASC, POPULATION DESC,AREA").unwrap();
        let orders: Vec<_> = sort_by.properties.iter().map(|p| p.sort_order).collect();
        assert_eq!(orders, vec![Some(SortOrder::Asc), Some(SortOrder::Desc), None]);
        assert!(sort_by.validate().is_ok());

        assert!(SortBy::parse_kvp("NAME UP").is_err());
    }
}
