//! Query expressions and the feature retrieval requests
//!
//! An ad hoc [`Query`] keeps its three clauses in separate typed slots:
//! projection (`wfs:PropertyName`), selection (`fes:Filter`) and sorting
//! (`fes:SortBy`). Requests that accept several query expressions hold them
//! in a [`FeatureMap`] so ad hoc and stored queries keep their relative order.

use crate::datatypes::{AnyUri, AllSome, PositiveInteger, GML32_FORMAT};
use crate::error::{Result, ValidationError};
use crate::fes::{Filter, SortBy};
use crate::model::validate::{require, require_text, validate_all, validate_child, Validate};
use crate::model::{
    ChildList, ChildSlot, Describe, FeatureMap, Occurs, Properties, Property, Reference,
    Unsettable,
};
use crate::namespaces::{Ns, QName};
use crate::wfs::base::{BaseRequest, MixedContent, StandardPresentation, StandardResolve};
use crate::wfs::tags;
use serde::{Deserialize, Serialize};

/// wfs:Query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// handle attribute
    pub handle: Option<String>,
    /// typeNames attribute (required, one or more)
    pub type_names: Vec<QName>,
    /// aliases attribute, one per type name
    pub aliases: Vec<String>,
    /// srsName attribute
    pub srs_name: Option<AnyUri>,
    /// featureVersion attribute
    pub feature_version: Option<String>,
    /// Projection clause: wfs:PropertyName members
    pub property_names: ChildList<PropertyName>,
    /// Selection clause: fes:Filter
    pub filter: ChildSlot<Filter>,
    /// Sorting clause: fes:SortBy
    pub sort_by: ChildSlot<SortBy>,
}

impl Query {
    /// Query over one feature type
    pub fn new(type_name: QName) -> Self {
        Self {
            type_names: vec![type_name],
            ..Self::default()
        }
    }

    /// Set the selection clause
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter.set(filter);
        self
    }

    /// Set the sorting clause
    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by.set(sort_by);
        self
    }

    /// Add a property to the projection clause
    pub fn with_property(mut self, name: QName) -> Self {
        self.property_names.push(PropertyName::new(name));
        self
    }

    /// Whether the query joins several feature types
    pub fn is_join(&self) -> bool {
        self.type_names.len() > 1
    }
}

impl Describe for Query {
    fn type_name(&self) -> &'static str {
        "QueryType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr("typeNames", Some(&self.type_names).filter(|v| !v.is_empty()))
            .attr("aliases", Some(&self.aliases).filter(|v| !v.is_empty()))
            .attr("srsName", self.srs_name.as_ref())
            .attr("featureVersion", self.feature_version.as_ref())
            .children(Ns::Wfs, "PropertyName", &self.property_names)
            .child(Ns::Fes, "Filter", self.filter.get())
            .child(Ns::Fes, "SortBy", self.sort_by.get())
            .build()
    }
}

impl Validate for Query {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.type_names.len(), "QueryType", "typeNames")?;
        if !self.aliases.is_empty() && self.aliases.len() != self.type_names.len() {
            return Err(ValidationError::new(format!(
                "{} aliases given for {} type names",
                self.aliases.len(),
                self.type_names.len()
            ))
            .with_type_name("QueryType")
            .with_path("aliases")
            .into());
        }
        validate_child(self.filter.get(), "Filter")?;
        validate_child(self.sort_by.get(), "SortBy")
    }
}

/// wfs:PropertyName
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyName {
    /// The property QName (element content)
    pub name: QName,
    /// Resolve parameters for this property
    pub resolve: StandardResolve,
    /// resolvePath attribute
    pub resolve_path: Option<String>,
}

impl PropertyName {
    /// Projection of `name`
    pub fn new(name: QName) -> Self {
        Self {
            name,
            resolve: StandardResolve::new(),
            resolve_path: None,
        }
    }
}

impl Describe for PropertyName {
    fn type_name(&self) -> &'static str {
        "PropertyNameType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.resolve.properties())
            .attr("resolvePath", self.resolve_path.as_ref())
            .text(&self.name)
            .build()
    }
}

/// wfs:StoredQuery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredQuery {
    /// handle attribute
    pub handle: Option<String>,
    /// id attribute (required)
    pub id: Option<AnyUri>,
    /// wfs:Parameter members
    pub parameters: ChildList<Parameter>,
}

impl StoredQuery {
    /// Invocation of the stored query `id`
    pub fn new(id: impl Into<AnyUri>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Add a text parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::text(name, value));
        self
    }

    /// Find a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }
}

impl Describe for StoredQuery {
    fn type_name(&self) -> &'static str {
        "StoredQueryType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr("id", self.id.as_ref())
            .children(Ns::Wfs, "Parameter", &self.parameters)
            .build()
    }
}

impl Validate for StoredQuery {
    fn validate(&self) -> Result<()> {
        require(self.id.as_ref(), "StoredQueryType", "id")?;
        validate_all(&self.parameters, "Parameter")
    }
}

/// wfs:Parameter of a stored query invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// name attribute (required)
    pub name: Option<String>,
    /// Mixed content value
    pub content: FeatureMap<MixedContent>,
}

impl Parameter {
    /// Parameter with a text value
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut content = FeatureMap::new();
        MixedContent::Text(value.into()).push_into(&mut content);
        Self {
            name: Some(name.into()),
            content,
        }
    }

    /// Concatenated text of the value
    pub fn text_value(&self) -> String {
        self.content
            .list(&tags::TEXT)
            .iter()
            .filter_map(|c| match c {
                MixedContent::Text(text) => Some(text.as_str()),
                MixedContent::Element(_) => None,
            })
            .collect()
    }
}

impl Describe for Parameter {
    fn type_name(&self) -> &'static str {
        "ParameterType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("name", self.name.as_ref())
            .extend(MixedContent::sequence_properties(&self.content))
            .build()
    }
}

impl Validate for Parameter {
    fn validate(&self) -> Result<()> {
        require_text(self.name.as_ref(), "ParameterType", "name")
    }
}

/// Member of the fes:AbstractQueryExpression substitution group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryExpression {
    /// wfs:Query
    Query(Query),
    /// wfs:StoredQuery
    StoredQuery(StoredQuery),
}

impl QueryExpression {
    /// Element name of this expression
    pub fn tag(&self) -> QName {
        match self {
            QueryExpression::Query(_) => tags::QUERY.clone(),
            QueryExpression::StoredQuery(_) => tags::STORED_QUERY.clone(),
        }
    }

    /// handle attribute
    pub fn handle(&self) -> Option<&str> {
        match self {
            QueryExpression::Query(q) => q.handle.as_deref(),
            QueryExpression::StoredQuery(q) => q.handle.as_deref(),
        }
    }

    /// The ad hoc query, if this is one
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            QueryExpression::Query(q) => Some(q),
            QueryExpression::StoredQuery(_) => None,
        }
    }

    /// The stored query invocation, if this is one
    pub fn as_stored_query(&self) -> Option<&StoredQuery> {
        match self {
            QueryExpression::StoredQuery(q) => Some(q),
            QueryExpression::Query(_) => None,
        }
    }

    fn inner(&self) -> &dyn Describe {
        match self {
            QueryExpression::Query(q) => q,
            QueryExpression::StoredQuery(q) => q,
        }
    }
}

impl From<Query> for QueryExpression {
    fn from(query: Query) -> Self {
        QueryExpression::Query(query)
    }
}

impl From<StoredQuery> for QueryExpression {
    fn from(query: StoredQuery) -> Self {
        QueryExpression::StoredQuery(query)
    }
}

impl Describe for QueryExpression {
    fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }

    fn describe(&self) -> Vec<Property<'_>> {
        self.inner().describe()
    }
}

impl Validate for QueryExpression {
    fn validate(&self) -> Result<()> {
        match self {
            QueryExpression::Query(q) => q.validate(),
            QueryExpression::StoredQuery(q) => q.validate(),
        }
    }
}

/// Properties for every entry of a query expression group
pub(crate) fn query_group_properties(group: &FeatureMap<QueryExpression>) -> Vec<Property<'_>> {
    let mut properties = Properties::new();
    for entry in group {
        properties = properties.tagged_child(&entry.tag, &entry.value);
    }
    properties.build()
}

/// Validate a query expression group with bounds
pub(crate) fn validate_query_group(
    group: &FeatureMap<QueryExpression>,
    occurs: Occurs,
    type_name: &str,
) -> Result<()> {
    occurs.check(group.len(), type_name, "AbstractQueryExpression")?;
    validate_all(group.iter().map(|entry| &entry.value), "AbstractQueryExpression")
}

/// wfs:GetFeature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetFeature {
    /// Request base attributes
    pub base: BaseRequest,
    /// Presentation parameters
    pub presentation: StandardPresentation,
    /// Resolve parameters
    pub resolve: StandardResolve,
    /// Query expressions in document order
    pub queries: FeatureMap<QueryExpression>,
}

impl GetFeature {
    /// Request with schema defaults and no queries
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query expression
    pub fn add_query(&mut self, query: impl Into<QueryExpression>) {
        let query = query.into();
        self.queries.push(query.tag(), query);
    }

    /// Ad hoc queries only
    pub fn ad_hoc_queries(&self) -> impl Iterator<Item = &Query> {
        self.queries
            .list(&tags::QUERY)
            .iter()
            .filter_map(QueryExpression::as_query)
    }

    /// Stored query invocations only
    pub fn stored_queries(&self) -> impl Iterator<Item = &StoredQuery> {
        self.queries
            .list(&tags::STORED_QUERY)
            .iter()
            .filter_map(QueryExpression::as_stored_query)
    }

    fn attribute_properties(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .extend(self.presentation.properties())
            .extend(self.resolve.properties())
            .build()
    }
}

impl Describe for GetFeature {
    fn type_name(&self) -> &'static str {
        "GetFeatureType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.attribute_properties())
            .extend(query_group_properties(&self.queries))
            .build()
    }
}

impl Validate for GetFeature {
    fn validate(&self) -> Result<()> {
        self.base.check("GetFeatureType")?;
        validate_query_group(&self.queries, Occurs::one_or_more(), "GetFeatureType")
    }
}

/// wfs:GetFeatureWithLock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetFeatureWithLock {
    /// Inherited GetFeature content
    pub get_feature: GetFeature,
    /// expiry in seconds, default 300
    pub expiry: Unsettable<PositiveInteger>,
    /// lockAction, default `ALL`
    pub lock_action: Unsettable<AllSome>,
}

impl GetFeatureWithLock {
    /// Request with schema defaults
    pub fn new() -> Self {
        Self {
            get_feature: GetFeature::new(),
            expiry: Unsettable::new(PositiveInteger::DEFAULT_TIMEOUT),
            lock_action: Unsettable::new(AllSome::All),
        }
    }
}

impl Default for GetFeatureWithLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for GetFeatureWithLock {
    fn type_name(&self) -> &'static str {
        "GetFeatureWithLockType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.get_feature.attribute_properties())
            .attr_unsettable("expiry", &self.expiry)
            .attr_unsettable("lockAction", &self.lock_action)
            .extend(query_group_properties(&self.get_feature.queries))
            .build()
    }
}

impl Validate for GetFeatureWithLock {
    fn validate(&self) -> Result<()> {
        self.get_feature.base.check("GetFeatureWithLockType")?;
        validate_query_group(
            &self.get_feature.queries,
            Occurs::one_or_more(),
            "GetFeatureWithLockType",
        )
    }
}

/// wfs:GetPropertyValue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetPropertyValue {
    /// Request base attributes
    pub base: BaseRequest,
    /// Presentation parameters
    pub presentation: StandardPresentation,
    /// Resolve parameters
    pub resolve: StandardResolve,
    /// valueReference attribute (required XPath)
    pub value_reference: Option<String>,
    /// resolvePath attribute
    pub resolve_path: Option<String>,
    /// The query expression, possibly shared with other requests
    pub query: Option<Reference<QueryExpression>>,
}

impl GetPropertyValue {
    /// Request for `value_reference` over `query`
    pub fn new(value_reference: impl Into<String>, query: impl Into<QueryExpression>) -> Self {
        Self {
            value_reference: Some(value_reference.into()),
            query: Some(Reference::resolved(query.into())),
            ..Self::default()
        }
    }
}

impl Describe for GetPropertyValue {
    fn type_name(&self) -> &'static str {
        "GetPropertyValueType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        let mut properties = Properties::new()
            .extend(self.base.properties())
            .extend(self.presentation.properties())
            .extend(self.resolve.properties())
            .attr("valueReference", self.value_reference.as_ref())
            .attr("resolvePath", self.resolve_path.as_ref());

        match &self.query {
            Some(Reference::Resolved(query)) => {
                properties = properties.tagged_child(&query.tag(), query.as_ref());
            }
            Some(Reference::Unresolved(id)) => {
                tracing::warn!(id = %id, "skipping unresolved query expression");
            }
            None => {}
        }
        properties.build()
    }
}

impl Validate for GetPropertyValue {
    fn validate(&self) -> Result<()> {
        self.base.check("GetPropertyValueType")?;
        require_text(self.value_reference.as_ref(), "GetPropertyValueType", "valueReference")?;
        require(self.query.as_ref(), "GetPropertyValueType", "AbstractQueryExpression")?;
        match self.query.as_ref().and_then(Reference::get) {
            Some(query) => validate_child(Some(query), "AbstractQueryExpression"),
            None => Err(ValidationError::new("query expression reference is unresolved")
                .with_type_name("GetPropertyValueType")
                .with_path("AbstractQueryExpression")
                .into()),
        }
    }
}

/// wfs:DescribeFeatureType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeFeatureType {
    /// Request base attributes
    pub base: BaseRequest,
    /// wfs:TypeName members; empty describes every type
    pub type_names: Vec<QName>,
    /// outputFormat, default GML 3.2 application schema
    pub output_format: Unsettable<String>,
}

impl DescribeFeatureType {
    /// Request with schema defaults
    pub fn new() -> Self {
        Self {
            base: BaseRequest::new(),
            type_names: Vec::new(),
            output_format: Unsettable::new(GML32_FORMAT.to_string()),
        }
    }
}

impl Default for DescribeFeatureType {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for DescribeFeatureType {
    fn type_name(&self) -> &'static str {
        "DescribeFeatureTypeType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .attr_unsettable("outputFormat", &self.output_format)
            .elements(Ns::Wfs, "TypeName", &self.type_names)
            .build()
    }
}

impl Validate for DescribeFeatureType {
    fn validate(&self) -> Result<()> {
        self.base.check("DescribeFeatureTypeType")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::SortOrder;
    use crate::model::{attribute_value, PropertyValue};
    use pretty_assertions::assert_eq;

    fn states() -> QName {
        QName::parse_lexical("topp:states").unwrap()
    }

    #[test]
    fn test_query_clauses_are_independent() {
        let query = Query::new(states())
            .with_property(QName::parse_lexical("topp:STATE_NAME").unwrap())
            .with_filter(Filter::by_ids(["states.1"]))
            .with_sort_by(SortBy::single("STATE_NAME", SortOrder::Asc));

        let props = query.describe();
        let names: Vec<_> = props.iter().map(|p| p.name.prefixed()).collect();
        assert_eq!(names, vec!["typeNames", "wfs:PropertyName", "fes:Filter", "fes:SortBy"]);
        assert_eq!(attribute_value(&props, "typeNames"), Some("topp:states"));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_requires_type_names() {
        assert!(Query::default().validate().is_err());

        let mut query = Query::new(states());
        query.aliases = vec!["a".to_string(), "b".to_string()];
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_get_feature_keeps_query_order() {
        let mut request = GetFeature::new();
        request.add_query(Query::new(states()));
        request.add_query(
            StoredQuery::new("urn:ogc:def:query:OGC-WFS::GetFeatureById")
                .with_parameter("ID", "states.3"),
        );
        request.add_query(Query::new(QName::parse_lexical("topp:roads").unwrap()));

        assert_eq!(request.ad_hoc_queries().count(), 2);
        assert_eq!(request.stored_queries().count(), 1);

        let children: Vec<_> = request
            .describe()
            .into_iter()
            .filter(|p| matches!(p.value, PropertyValue::Child(_)))
            .map(|p| p.name.local_name)
            .collect();
        assert_eq!(children, vec!["Query", "StoredQuery", "Query"]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_get_feature_needs_a_query() {
        let err = GetFeature::new().validate().unwrap_err();
        assert!(err.to_string().contains("AbstractQueryExpression"));
    }

    #[test]
    fn test_stored_query_parameter_text() {
        let stored = StoredQuery::new("urn:ogc:def:query:OGC-WFS::GetFeatureById")
            .with_parameter("ID", "states.3");
        assert_eq!(stored.parameter("ID").unwrap().text_value(), "states.3");
        assert!(stored.parameter("id").is_none());
    }

    #[test]
    fn test_get_property_value_with_unresolved_query() {
        let mut request = GetPropertyValue::new("topp:STATE_NAME", Query::new(states()));
        assert!(request.validate().is_ok());

        request.query = Some(Reference::unresolved("q1"));
        assert!(request.validate().is_err());
        let children = request
            .describe()
            .iter()
            .filter(|p| !p.is_attribute())
            .count();
        assert_eq!(children, 0);
    }

    #[test]
    fn test_lock_defaults_hidden_until_set() {
        let mut request = GetFeatureWithLock::new();
        request.get_feature.add_query(Query::new(states()));
        assert_eq!(attribute_value(&request.describe(), "expiry"), None);

        request.expiry.set(PositiveInteger::new(60).unwrap());
        assert_eq!(attribute_value(&request.describe(), "expiry"), Some("60"));
        assert!(request.validate().is_ok());
    }
}
