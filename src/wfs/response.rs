//! Feature and value collections returned by GetFeature and GetPropertyValue

use crate::datatypes::{now, AnyUri, NonNegativeIntegerOrUnknown, StateValue};
use crate::documents::AnyElement;
use crate::error::{Result, ValidationError};
use crate::model::validate::{require, validate_all, validate_child, Validate};
use crate::model::{ChildList, ChildSlot, Describe, FeatureMap, Occurs, Properties, Property};
use crate::namespaces::{Ns, QName};
use crate::ows::{ExceptionReport, SimpleLink};
use crate::wfs::tags;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// wfs:SimpleFeatureCollection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleFeatureCollection {
    /// wfs:boundedBy
    pub bounded_by: ChildSlot<EnvelopeProperty>,
    /// wfs:member entries
    pub members: ChildList<MemberProperty>,
}

impl Describe for SimpleFeatureCollection {
    fn type_name(&self) -> &'static str {
        "SimpleFeatureCollectionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .child(Ns::Wfs, "boundedBy", self.bounded_by.get())
            .children(Ns::Wfs, "member", &self.members)
            .build()
    }
}

impl Validate for SimpleFeatureCollection {
    fn validate(&self) -> Result<()> {
        validate_child(self.bounded_by.get(), "boundedBy")?;
        validate_all(&self.members, "member")
    }
}

/// wfs:FeatureCollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// lockId attribute, set by GetFeatureWithLock
    pub lock_id: Option<String>,
    /// timeStamp attribute (required)
    pub time_stamp: Option<DateTime<FixedOffset>>,
    /// numberMatched attribute (required)
    pub number_matched: NonNegativeIntegerOrUnknown,
    /// numberReturned attribute (required)
    pub number_returned: u64,
    /// next attribute
    pub next: Option<AnyUri>,
    /// previous attribute
    pub previous: Option<AnyUri>,
    /// wfs:boundedBy
    pub bounded_by: ChildSlot<EnvelopeProperty>,
    /// wfs:member entries
    pub members: ChildList<MemberProperty>,
    /// wfs:additionalObjects
    pub additional_objects: ChildSlot<AdditionalObjects>,
    /// wfs:truncatedResponse
    pub truncated_response: ChildSlot<TruncatedResponse>,
}

impl FeatureCollection {
    /// Empty collection stamped with the current time
    pub fn new() -> Self {
        Self {
            lock_id: None,
            time_stamp: Some(now()),
            number_matched: NonNegativeIntegerOrUnknown::Count(0),
            number_returned: 0,
            next: None,
            previous: None,
            bounded_by: ChildSlot::empty(),
            members: ChildList::new(),
            additional_objects: ChildSlot::empty(),
            truncated_response: ChildSlot::empty(),
        }
    }

    /// Hits-only response: counts without members
    pub fn hits(number_matched: NonNegativeIntegerOrUnknown) -> Self {
        Self {
            number_matched,
            ..Self::new()
        }
    }

    /// Append a feature member and bump `number_returned`
    pub fn add_feature(&mut self, feature: AnyElement) {
        self.members.push(MemberProperty::feature(feature));
        self.number_returned += 1;
    }

    /// Features carried inline by the members
    pub fn features(&self) -> impl Iterator<Item = &AnyElement> {
        self.members.iter().filter_map(MemberProperty::element)
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for FeatureCollection {
    fn type_name(&self) -> &'static str {
        "FeatureCollectionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("lockId", self.lock_id.as_ref())
            .attr("timeStamp", self.time_stamp.as_ref())
            .attr("numberMatched", Some(&self.number_matched))
            .attr("numberReturned", Some(&self.number_returned))
            .attr("next", self.next.as_ref())
            .attr("previous", self.previous.as_ref())
            .child(Ns::Wfs, "boundedBy", self.bounded_by.get())
            .children(Ns::Wfs, "member", &self.members)
            .child(Ns::Wfs, "additionalObjects", self.additional_objects.get())
            .child(Ns::Wfs, "truncatedResponse", self.truncated_response.get())
            .build()
    }
}

impl Validate for FeatureCollection {
    fn validate(&self) -> Result<()> {
        require(self.time_stamp.as_ref(), "FeatureCollectionType", "timeStamp")?;
        validate_child(self.bounded_by.get(), "boundedBy")?;
        validate_all(&self.members, "member")?;
        validate_child(self.additional_objects.get(), "additionalObjects")?;
        validate_child(self.truncated_response.get(), "truncatedResponse")
    }
}

/// Member of the wfs:SimpleFeatureCollection substitution group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureCollectionGroup {
    /// wfs:SimpleFeatureCollection
    Simple(SimpleFeatureCollection),
    /// wfs:FeatureCollection
    Full(FeatureCollection),
}

impl FeatureCollectionGroup {
    /// Element name of this collection
    pub fn tag(&self) -> QName {
        match self {
            FeatureCollectionGroup::Simple(_) => tags::SIMPLE_FEATURE_COLLECTION.clone(),
            FeatureCollectionGroup::Full(_) => tags::FEATURE_COLLECTION.clone(),
        }
    }

    /// Members of either collection kind
    pub fn members(&self) -> &ChildList<MemberProperty> {
        match self {
            FeatureCollectionGroup::Simple(c) => &c.members,
            FeatureCollectionGroup::Full(c) => &c.members,
        }
    }
}

impl Describe for FeatureCollectionGroup {
    fn type_name(&self) -> &'static str {
        match self {
            FeatureCollectionGroup::Simple(c) => c.type_name(),
            FeatureCollectionGroup::Full(c) => c.type_name(),
        }
    }

    fn describe(&self) -> Vec<Property<'_>> {
        match self {
            FeatureCollectionGroup::Simple(c) => c.describe(),
            FeatureCollectionGroup::Full(c) => c.describe(),
        }
    }
}

impl Validate for FeatureCollectionGroup {
    fn validate(&self) -> Result<()> {
        match self {
            FeatureCollectionGroup::Simple(c) => c.validate(),
            FeatureCollectionGroup::Full(c) => c.validate(),
        }
    }
}

macro_rules! additional_content {
    ($(#[$meta:meta])* $name:ident, $type_name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            /// wfs:ValueCollection
            pub value_collection: ChildSlot<ValueCollection>,
            /// Member of the wfs:SimpleFeatureCollection group, at most one
            pub feature_collections: FeatureMap<FeatureCollectionGroup>,
        }

        impl $name {
            /// Wrap a feature collection
            pub fn collection(collection: FeatureCollectionGroup) -> Self {
                let mut content = Self::default();
                content.feature_collections.set_single(collection.tag(), collection);
                content
            }

            /// Wrap a value collection
            pub fn values(values: ValueCollection) -> Self {
                Self {
                    value_collection: ChildSlot::new(values),
                    feature_collections: FeatureMap::new(),
                }
            }
        }

        impl Describe for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn describe(&self) -> Vec<Property<'_>> {
                let mut properties = Properties::new()
                    .child(Ns::Wfs, "ValueCollection", self.value_collection.get());
                for entry in &self.feature_collections {
                    properties = properties.tagged_child(&entry.tag, &entry.value);
                }
                properties.build()
            }
        }

        impl Validate for $name {
            fn validate(&self) -> Result<()> {
                let count = self.feature_collections.len()
                    + usize::from(self.value_collection.is_some());
                Occurs::once().check(count, $type_name, "ValueCollection|SimpleFeatureCollection")?;
                validate_child(self.value_collection.get(), "ValueCollection")?;
                validate_all(
                    self.feature_collections.iter().map(|e| &e.value),
                    "SimpleFeatureCollection",
                )
            }
        }
    };
}

additional_content!(
    /// wfs:additionalObjects
    AdditionalObjects, "AdditionalObjectsType"
);
additional_content!(
    /// wfs:additionalValues
    AdditionalValues, "AdditionalValuesType"
);

/// wfs:ValueCollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCollection {
    /// timeStamp attribute (required)
    pub time_stamp: Option<DateTime<FixedOffset>>,
    /// numberMatched attribute (required)
    pub number_matched: NonNegativeIntegerOrUnknown,
    /// numberReturned attribute (required)
    pub number_returned: u64,
    /// next attribute
    pub next: Option<AnyUri>,
    /// previous attribute
    pub previous: Option<AnyUri>,
    /// wfs:member entries
    pub members: ChildList<MemberProperty>,
    /// wfs:additionalValues
    pub additional_values: ChildSlot<AdditionalValues>,
    /// wfs:truncatedResponse
    pub truncated_response: ChildSlot<TruncatedResponse>,
}

impl ValueCollection {
    /// Empty collection stamped with the current time
    pub fn new() -> Self {
        Self {
            time_stamp: Some(now()),
            number_matched: NonNegativeIntegerOrUnknown::Count(0),
            number_returned: 0,
            next: None,
            previous: None,
            members: ChildList::new(),
            additional_values: ChildSlot::empty(),
            truncated_response: ChildSlot::empty(),
        }
    }

    /// Append a text value and bump `number_returned`
    pub fn add_value(&mut self, value: impl Into<String>) {
        self.members.push(MemberProperty::text(value));
        self.number_returned += 1;
    }
}

impl Default for ValueCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for ValueCollection {
    fn type_name(&self) -> &'static str {
        "ValueCollectionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("timeStamp", self.time_stamp.as_ref())
            .attr("numberMatched", Some(&self.number_matched))
            .attr("numberReturned", Some(&self.number_returned))
            .attr("next", self.next.as_ref())
            .attr("previous", self.previous.as_ref())
            .children(Ns::Wfs, "member", &self.members)
            .child(Ns::Wfs, "additionalValues", self.additional_values.get())
            .child(Ns::Wfs, "truncatedResponse", self.truncated_response.get())
            .build()
    }
}

impl Validate for ValueCollection {
    fn validate(&self) -> Result<()> {
        require(self.time_stamp.as_ref(), "ValueCollectionType", "timeStamp")?;
        validate_all(&self.members, "member")?;
        validate_child(self.additional_values.get(), "additionalValues")?;
        validate_child(self.truncated_response.get(), "truncatedResponse")
    }
}

/// wfs:truncatedResponse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TruncatedResponse {
    /// ows:ExceptionReport (required)
    pub exception_report: ChildSlot<ExceptionReport>,
}

impl Describe for TruncatedResponse {
    fn type_name(&self) -> &'static str {
        "TruncatedResponseType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .child(Ns::Ows, "ExceptionReport", self.exception_report.get())
            .build()
    }
}

impl Validate for TruncatedResponse {
    fn validate(&self) -> Result<()> {
        require(self.exception_report.get(), "TruncatedResponseType", "ExceptionReport")?;
        validate_child(self.exception_report.get(), "ExceptionReport")
    }
}

/// Content of a member: mixed text, at most one element or collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberContent {
    /// Character data
    Text(String),
    /// A feature or any other element
    Element(AnyElement),
    /// wfs:Tuple
    Tuple(Tuple),
    /// Nested member of the wfs:SimpleFeatureCollection group
    Collection(FeatureCollectionGroup),
}

impl MemberContent {
    /// Tag this content carries in a member's feature map
    pub fn tag(&self) -> QName {
        match self {
            MemberContent::Text(_) => tags::TEXT.clone(),
            MemberContent::Element(element) => element.qname.clone(),
            MemberContent::Tuple(_) => tags::TUPLE.clone(),
            MemberContent::Collection(collection) => collection.tag(),
        }
    }
}

/// wfs:member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProperty {
    /// state attribute
    pub state: Option<StateValue>,
    /// xlink attributes, for members given by reference
    pub link: SimpleLink,
    /// Mixed content
    pub content: FeatureMap<MemberContent>,
}

impl MemberProperty {
    /// Empty member
    pub fn new() -> Self {
        Self {
            state: None,
            link: SimpleLink::new(),
            content: FeatureMap::new(),
        }
    }

    /// Member holding a feature inline
    pub fn feature(feature: AnyElement) -> Self {
        let mut member = Self::new();
        member.push(MemberContent::Element(feature));
        member
    }

    /// Member holding a text value
    pub fn text(value: impl Into<String>) -> Self {
        let mut member = Self::new();
        member.push(MemberContent::Text(value.into()));
        member
    }

    /// Member given by reference
    pub fn by_reference(href: impl Into<AnyUri>) -> Self {
        Self {
            link: SimpleLink::to(href),
            ..Self::new()
        }
    }

    /// Append content under its own tag
    pub fn push(&mut self, content: MemberContent) {
        self.content.push(content.tag(), content);
    }

    /// The inline element, if any
    pub fn element(&self) -> Option<&AnyElement> {
        self.content.iter().find_map(|entry| match &entry.value {
            MemberContent::Element(element) => Some(element),
            _ => None,
        })
    }
}

impl Default for MemberProperty {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for MemberProperty {
    fn type_name(&self) -> &'static str {
        "MemberPropertyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        let mut properties = Properties::new()
            .attr("state", self.state.as_ref())
            .extend(self.link.properties());
        for entry in &self.content {
            properties = match &entry.value {
                MemberContent::Text(text) => properties.text(text),
                MemberContent::Element(element) => properties.any(element),
                MemberContent::Tuple(tuple) => properties.tagged_child(&entry.tag, tuple),
                MemberContent::Collection(collection) => {
                    properties.tagged_child(&entry.tag, collection)
                }
            };
        }
        properties.build()
    }
}

impl Validate for MemberProperty {
    fn validate(&self) -> Result<()> {
        let mut elements = 0;
        for (index, entry) in self.content.iter().enumerate() {
            let path = format!("content[{}]", index);
            match &entry.value {
                MemberContent::Text(_) => continue,
                MemberContent::Element(_) => {}
                MemberContent::Tuple(tuple) => validate_child(Some(tuple), &path)?,
                MemberContent::Collection(collection) => validate_child(Some(collection), &path)?,
            }
            elements += 1;
        }
        if elements > 0 && self.link.href.is_some() {
            return Err(ValidationError::new("member has both inline content and xlink:href")
                .with_type_name("MemberPropertyType")
                .into());
        }
        Occurs::optional().check(elements, "MemberPropertyType", "content")
    }
}

/// wfs:Tuple
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    /// wfs:member entries, two or more
    pub members: ChildList<MemberProperty>,
}

impl Describe for Tuple {
    fn type_name(&self) -> &'static str {
        "TupleType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "member", &self.members)
            .build()
    }
}

impl Validate for Tuple {
    fn validate(&self) -> Result<()> {
        Occurs::at_least(2).check(self.members.len(), "TupleType", "member")?;
        validate_all(&self.members, "member")
    }
}

/// wfs:boundedBy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeProperty {
    /// gml:Envelope or other bounding element (required)
    pub envelope: Option<AnyElement>,
}

impl Describe for EnvelopeProperty {
    fn type_name(&self) -> &'static str {
        "EnvelopePropertyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new().any_opt(self.envelope.as_ref()).build()
    }
}

impl Validate for EnvelopeProperty {
    fn validate(&self) -> Result<()> {
        require(self.envelope.as_ref(), "EnvelopePropertyType", "envelope")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attribute_value, PropertyValue};
    use crate::ows::OwsException;
    use pretty_assertions::assert_eq;

    fn feature(id: &str) -> AnyElement {
        let mut element = AnyElement::new(QName::parse_lexical("topp:states").unwrap());
        element.set_attribute(Ns::Gml.qname("id"), id);
        element
    }

    #[test]
    fn test_collection_counts_features() {
        let mut collection = FeatureCollection::new();
        collection.number_matched = NonNegativeIntegerOrUnknown::Unknown;
        collection.add_feature(feature("states.1"));
        collection.add_feature(feature("states.2"));

        let props = collection.describe();
        assert_eq!(attribute_value(&props, "numberReturned"), Some("2"));
        assert_eq!(attribute_value(&props, "numberMatched"), Some("unknown"));
        assert!(attribute_value(&props, "timeStamp").is_some());
        assert_eq!(collection.features().count(), 2);
        assert!(collection.validate().is_ok());
    }

    #[test]
    fn test_hits_has_no_members() {
        let hits = FeatureCollection::hits(NonNegativeIntegerOrUnknown::Count(42));
        let children = hits.describe().iter().filter(|p| !p.is_attribute()).count();
        assert_eq!(children, 0);
        assert_eq!(attribute_value(&hits.describe(), "numberMatched"), Some("42"));
    }

    #[test]
    fn test_tuple_needs_two_members() {
        let mut tuple = Tuple::default();
        tuple.members.push(MemberProperty::feature(feature("states.1")));
        assert!(tuple.validate().is_err());
        tuple.members.push(MemberProperty::feature(feature("states.2")));
        assert!(tuple.validate().is_ok());

        let mut member = MemberProperty::new();
        member.push(MemberContent::Tuple(tuple));
        let props = member.describe();
        assert_eq!(props[0].name, tags::TUPLE.clone());
        assert!(matches!(props[0].value, PropertyValue::Child(_)));
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_member_holds_one_element() {
        let mut member = MemberProperty::feature(feature("states.1"));
        member.push(MemberContent::Text(" ".to_string()));
        assert!(member.validate().is_ok());
        member.push(MemberContent::Element(feature("states.2")));
        assert!(member.validate().is_err());

        let by_ref = MemberProperty::by_reference("#states.1");
        assert_eq!(attribute_value(&by_ref.describe(), "href"), Some("#states.1"));
        assert!(by_ref.validate().is_ok());
    }

    #[test]
    fn test_additional_objects_is_a_choice() {
        let additional = AdditionalObjects::collection(FeatureCollectionGroup::Simple(
            SimpleFeatureCollection::default(),
        ));
        assert!(additional.validate().is_ok());
        assert_eq!(additional.describe()[0].name.local_name, "SimpleFeatureCollection");

        let mut both = additional.clone();
        both.value_collection.set(ValueCollection::new());
        assert!(both.validate().is_err());
        assert!(AdditionalObjects::default().validate().is_err());
    }

    #[test]
    fn test_truncated_response_carries_report() {
        let mut truncated = TruncatedResponse::default();
        assert!(truncated.validate().is_err());
        truncated
            .exception_report
            .set(ExceptionReport::single(OwsException::new("ResponseCacheExpired", "too slow")));
        assert!(truncated.validate().is_ok());
    }

    #[test]
    fn test_value_collection_members() {
        let mut values = ValueCollection::new();
        values.add_value("Alabama");
        values.add_value("Alaska");
        assert_eq!(values.number_returned, 2);
        let first = values.members.first().unwrap().describe();
        assert_eq!(first[0].lexical(), Some("Alabama"));
    }
}
