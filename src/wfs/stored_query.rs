//! Stored query management requests and responses

use crate::datatypes::AnyUri;
use crate::error::{Result, ValidationError};
use crate::model::validate::{require, require_text, validate_all, Validate};
use crate::model::{
    ChildList, Describe, FeatureMap, Occurs, Properties, Property, UniqueList, Unsettable,
};
use crate::namespaces::{Ns, QName};
use crate::ows::Metadata;
use crate::wfs::base::{Abstract, BaseRequest, ExecutionStatus, MixedContent, Title};
use serde::{Deserialize, Serialize};

/// Language of query expression texts written as WFS query elements
pub const WFS_QUERY_LANGUAGE: &str = "urn:ogc:def:queryLanguage:OGC-WFS::WFSQueryExpression";

/// wfs:ListStoredQueries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListStoredQueries {
    /// Request base attributes
    pub base: BaseRequest,
}

impl Describe for ListStoredQueries {
    fn type_name(&self) -> &'static str {
        "ListStoredQueriesType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        self.base.properties()
    }
}

impl Validate for ListStoredQueries {
    fn validate(&self) -> Result<()> {
        self.base.check("ListStoredQueriesType")
    }
}

/// wfs:ListStoredQueriesResponse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListStoredQueriesResponse {
    /// wfs:StoredQuery entries
    pub stored_queries: ChildList<StoredQueryListItem>,
}

impl ListStoredQueriesResponse {
    /// Identifiers of the listed queries
    pub fn ids(&self) -> impl Iterator<Item = &AnyUri> {
        self.stored_queries.iter().filter_map(|item| item.id.as_ref())
    }
}

impl Describe for ListStoredQueriesResponse {
    fn type_name(&self) -> &'static str {
        "ListStoredQueriesResponseType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "StoredQuery", &self.stored_queries)
            .build()
    }
}

impl Validate for ListStoredQueriesResponse {
    fn validate(&self) -> Result<()> {
        validate_all(&self.stored_queries, "StoredQuery")
    }
}

/// wfs:StoredQueryListItemType
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredQueryListItem {
    /// id attribute (required)
    pub id: Option<AnyUri>,
    /// wfs:Title
    pub titles: ChildList<Title>,
    /// wfs:ReturnFeatureType, one or more
    pub return_feature_types: Vec<QName>,
}

impl StoredQueryListItem {
    /// Entry for `id` returning `feature_type`
    pub fn new(id: impl Into<AnyUri>, feature_type: QName) -> Self {
        Self {
            id: Some(id.into()),
            titles: ChildList::new(),
            return_feature_types: vec![feature_type],
        }
    }
}

impl Describe for StoredQueryListItem {
    fn type_name(&self) -> &'static str {
        "StoredQueryListItemType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("id", self.id.as_ref())
            .children(Ns::Wfs, "Title", &self.titles)
            .elements(Ns::Wfs, "ReturnFeatureType", &self.return_feature_types)
            .build()
    }
}

impl Validate for StoredQueryListItem {
    fn validate(&self) -> Result<()> {
        require(self.id.as_ref(), "StoredQueryListItemType", "id")?;
        Occurs::one_or_more().check(
            self.return_feature_types.len(),
            "StoredQueryListItemType",
            "ReturnFeatureType",
        )
    }
}

/// wfs:DescribeStoredQueries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeStoredQueries {
    /// Request base attributes
    pub base: BaseRequest,
    /// wfs:StoredQueryId values; empty describes every query
    pub stored_query_ids: UniqueList<AnyUri>,
}

impl DescribeStoredQueries {
    /// Request describing the given queries
    pub fn for_ids<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<AnyUri>,
    {
        let mut request = Self::default();
        for id in ids {
            request.stored_query_ids.push(id.into())?;
        }
        Ok(request)
    }
}

impl Describe for DescribeStoredQueries {
    fn type_name(&self) -> &'static str {
        "DescribeStoredQueriesType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .elements(Ns::Wfs, "StoredQueryId", &self.stored_query_ids)
            .build()
    }
}

impl Validate for DescribeStoredQueries {
    fn validate(&self) -> Result<()> {
        self.base.check("DescribeStoredQueriesType")
    }
}

/// wfs:DescribeStoredQueriesResponse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeStoredQueriesResponse {
    /// wfs:StoredQueryDescription entries
    pub descriptions: ChildList<StoredQueryDescription>,
}

impl DescribeStoredQueriesResponse {
    /// Description of the query `id`
    pub fn description(&self, id: &str) -> Option<&StoredQueryDescription> {
        self.descriptions
            .iter()
            .find(|d| d.id.as_ref().is_some_and(|uri| uri.as_str() == id))
    }
}

impl Describe for DescribeStoredQueriesResponse {
    fn type_name(&self) -> &'static str {
        "DescribeStoredQueriesResponseType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "StoredQueryDescription", &self.descriptions)
            .build()
    }
}

impl Validate for DescribeStoredQueriesResponse {
    fn validate(&self) -> Result<()> {
        validate_all(&self.descriptions, "StoredQueryDescription")
    }
}

/// wfs:StoredQueryDescriptionType
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredQueryDescription {
    /// id attribute (required)
    pub id: Option<AnyUri>,
    /// wfs:Title
    pub titles: ChildList<Title>,
    /// wfs:Abstract
    pub abstracts: ChildList<Abstract>,
    /// ows:Metadata
    pub metadata: ChildList<Metadata>,
    /// wfs:Parameter declarations
    pub parameters: ChildList<ParameterExpression>,
    /// wfs:QueryExpressionText, one or more
    pub query_expression_texts: ChildList<QueryExpressionText>,
}

impl StoredQueryDescription {
    /// Description with an identifier and no content
    pub fn new(id: impl Into<AnyUri>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterExpression> {
        self.parameters
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }
}

impl Describe for StoredQueryDescription {
    fn type_name(&self) -> &'static str {
        "StoredQueryDescriptionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("id", self.id.as_ref())
            .children(Ns::Wfs, "Title", &self.titles)
            .children(Ns::Wfs, "Abstract", &self.abstracts)
            .children(Ns::Ows, "Metadata", &self.metadata)
            .children(Ns::Wfs, "Parameter", &self.parameters)
            .children(Ns::Wfs, "QueryExpressionText", &self.query_expression_texts)
            .build()
    }
}

impl Validate for StoredQueryDescription {
    fn validate(&self) -> Result<()> {
        require(self.id.as_ref(), "StoredQueryDescriptionType", "id")?;
        Occurs::one_or_more().check(
            self.query_expression_texts.len(),
            "StoredQueryDescriptionType",
            "QueryExpressionText",
        )?;
        let mut seen: Vec<&str> = Vec::new();
        for parameter in &self.parameters {
            if let Some(name) = parameter.name.as_deref() {
                if seen.contains(&name) {
                    return Err(ValidationError::new(format!("parameter '{}' declared twice", name))
                        .with_type_name("StoredQueryDescriptionType")
                        .with_path("Parameter")
                        .into());
                }
                seen.push(name);
            }
        }
        validate_all(&self.parameters, "Parameter")?;
        validate_all(&self.query_expression_texts, "QueryExpressionText")
    }
}

/// wfs:ParameterExpressionType, a stored query parameter declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterExpression {
    /// name attribute (required)
    pub name: Option<String>,
    /// type attribute (required)
    pub parameter_type: Option<QName>,
    /// wfs:Title
    pub titles: ChildList<Title>,
    /// wfs:Abstract
    pub abstracts: ChildList<Abstract>,
    /// ows:Metadata
    pub metadata: ChildList<Metadata>,
}

impl ParameterExpression {
    /// Declaration of `name` with type `parameter_type`
    pub fn new(name: impl Into<String>, parameter_type: QName) -> Self {
        Self {
            name: Some(name.into()),
            parameter_type: Some(parameter_type),
            ..Self::default()
        }
    }
}

impl Describe for ParameterExpression {
    fn type_name(&self) -> &'static str {
        "ParameterExpressionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("name", self.name.as_ref())
            .attr("type", self.parameter_type.as_ref())
            .children(Ns::Wfs, "Title", &self.titles)
            .children(Ns::Wfs, "Abstract", &self.abstracts)
            .children(Ns::Ows, "Metadata", &self.metadata)
            .build()
    }
}

impl Validate for ParameterExpression {
    fn validate(&self) -> Result<()> {
        require_text(self.name.as_ref(), "ParameterExpressionType", "name")?;
        require(self.parameter_type.as_ref(), "ParameterExpressionType", "type")
    }
}

/// wfs:QueryExpressionTextType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpressionText {
    /// returnFeatureTypes attribute (required, may be empty)
    pub return_feature_types: Vec<QName>,
    /// language attribute (required)
    pub language: Option<AnyUri>,
    /// isPrivate attribute, default false
    pub is_private: Unsettable<bool>,
    /// Query body: mixed text and elements
    pub content: FeatureMap<MixedContent>,
}

impl QueryExpressionText {
    /// Empty text in the WFS query language
    pub fn new() -> Self {
        Self {
            return_feature_types: Vec::new(),
            language: Some(AnyUri::from(WFS_QUERY_LANGUAGE)),
            is_private: Unsettable::new(false),
            content: FeatureMap::new(),
        }
    }

    /// Append body content
    pub fn push(&mut self, content: impl Into<MixedContent>) {
        content.into().push_into(&mut self.content);
    }
}

impl Default for QueryExpressionText {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for QueryExpressionText {
    fn type_name(&self) -> &'static str {
        "QueryExpressionTextType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("returnFeatureTypes", Some(&self.return_feature_types))
            .attr("language", self.language.as_ref())
            .attr_unsettable("isPrivate", &self.is_private)
            .extend(MixedContent::sequence_properties(&self.content))
            .build()
    }
}

impl Validate for QueryExpressionText {
    fn validate(&self) -> Result<()> {
        require(self.language.as_ref(), "QueryExpressionTextType", "language")
    }
}

/// wfs:CreateStoredQuery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateStoredQuery {
    /// Request base attributes
    pub base: BaseRequest,
    /// wfs:StoredQueryDefinition entries
    pub definitions: ChildList<StoredQueryDescription>,
}

impl Describe for CreateStoredQuery {
    fn type_name(&self) -> &'static str {
        "CreateStoredQueryType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .children(Ns::Wfs, "StoredQueryDefinition", &self.definitions)
            .build()
    }
}

impl Validate for CreateStoredQuery {
    fn validate(&self) -> Result<()> {
        self.base.check("CreateStoredQueryType")?;
        validate_all(&self.definitions, "StoredQueryDefinition")
    }
}

/// wfs:CreateStoredQueryResponse
pub type CreateStoredQueryResponse = ExecutionStatus;

/// wfs:DropStoredQuery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropStoredQuery {
    /// Request base attributes
    pub base: BaseRequest,
    /// id attribute (required)
    pub id: Option<AnyUri>,
}

impl DropStoredQuery {
    /// Request dropping `id`
    pub fn new(id: impl Into<AnyUri>) -> Self {
        Self {
            base: BaseRequest::new(),
            id: Some(id.into()),
        }
    }
}

impl Describe for DropStoredQuery {
    fn type_name(&self) -> &'static str {
        "DropStoredQueryType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .attr("id", self.id.as_ref())
            .build()
    }
}

impl Validate for DropStoredQuery {
    fn validate(&self) -> Result<()> {
        self.base.check("DropStoredQueryType")?;
        require(self.id.as_ref(), "DropStoredQueryType", "id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::AnyElement;
    use crate::error::Error;
    use crate::model::attribute_value;
    use pretty_assertions::assert_eq;

    const BY_ID: &str = "urn:ogc:def:query:OGC-WFS::GetFeatureById";

    fn description() -> StoredQueryDescription {
        let mut description = StoredQueryDescription::new(BY_ID);
        description.titles.push(Title::new("Get feature by identifier"));
        description
            .parameters
            .push(ParameterExpression::new("ID", QName::parse_lexical("xs:string").unwrap()));
        let mut text = QueryExpressionText::new();
        text.push(AnyElement::new(QName::wfs("Query")));
        description.query_expression_texts.push(text);
        description
    }

    #[test]
    fn test_description_is_valid() {
        let description = description();
        assert!(description.validate().is_ok());
        assert!(description.parameter("ID").is_some());
    }

    #[test]
    fn test_description_needs_expression_text() {
        let mut description = description();
        description.query_expression_texts.clear();
        let err = description.validate().unwrap_err();
        assert!(err.to_string().contains("QueryExpressionText"));
    }

    #[test]
    fn test_duplicate_parameter_declaration() {
        let mut description = description();
        description
            .parameters
            .push(ParameterExpression::new("ID", QName::parse_lexical("xs:int").unwrap()));
        assert!(description.validate().is_err());
    }

    #[test]
    fn test_expression_text_always_states_return_types() {
        let text = QueryExpressionText::new();
        let props = text.describe();
        assert_eq!(attribute_value(&props, "returnFeatureTypes"), Some(""));
        assert_eq!(attribute_value(&props, "language"), Some(WFS_QUERY_LANGUAGE));
        assert_eq!(attribute_value(&props, "isPrivate"), None);
    }

    #[test]
    fn test_describe_ids_are_unique() {
        let err = DescribeStoredQueries::for_ids([BY_ID, BY_ID]).unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));

        let request = DescribeStoredQueries::for_ids([BY_ID]).unwrap();
        let props = request.describe();
        assert_eq!(props.last().unwrap().lexical(), Some(BY_ID));
    }

    #[test]
    fn test_drop_requires_id() {
        assert!(DropStoredQuery::new(BY_ID).validate().is_ok());
        assert!(DropStoredQuery::default().validate().is_err());
    }

    #[test]
    fn test_list_response_ids() {
        let mut response = ListStoredQueriesResponse::default();
        response
            .stored_queries
            .push(StoredQueryListItem::new(BY_ID, QName::parse_lexical("topp:states").unwrap()));
        let ids: Vec<_> = response.ids().map(AnyUri::as_str).collect();
        assert_eq!(ids, vec![BY_ID]);
        assert!(response.validate().is_ok());
    }
}
