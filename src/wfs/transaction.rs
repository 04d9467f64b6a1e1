//! Transactions and their responses
//!
//! A [`Transaction`] keeps its actions in one [`FeatureMap`] so inserts,
//! updates, replaces, deletes and native actions are sent in the order they
//! were added. Typed views give per-kind access.

use crate::datatypes::{AllSome, AnyUri, UpdateAction, GML32_FORMAT};
use crate::documents::AnyElement;
use crate::error::Result;
use crate::fes::{Filter, ResourceId};
use crate::model::validate::{require, require_text, validate_all, validate_child, Validate};
use crate::model::{
    ChildList, ChildSlot, Describe, FeatureMap, Occurs, Properties, Property, Reference,
    UniqueList, Unsettable,
};
use crate::namespaces::{Ns, QName};
use crate::wfs::base::{BaseRequest, MixedContent, VERSION};
use crate::wfs::tags;
use serde::{Deserialize, Serialize};

/// wfs:Transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Request base attributes
    pub base: BaseRequest,
    /// Actions in document order
    pub actions: FeatureMap<TransactionAction>,
    /// lockId attribute
    pub lock_id: Option<String>,
    /// releaseAction, default `ALL`
    pub release_action: Unsettable<AllSome>,
    /// srsName attribute
    pub srs_name: Option<AnyUri>,
}

impl Transaction {
    /// Empty transaction with schema defaults
    pub fn new() -> Self {
        Self {
            base: BaseRequest::new(),
            actions: FeatureMap::new(),
            lock_id: None,
            release_action: Unsettable::new(AllSome::All),
            srs_name: None,
        }
    }

    /// Append an action
    pub fn add(&mut self, action: impl Into<TransactionAction>) {
        let action = action.into();
        self.actions.push(action.tag(), action);
    }

    /// Insert actions only
    pub fn inserts(&self) -> impl Iterator<Item = &Insert> {
        self.actions.list(&tags::INSERT).iter().filter_map(|a| match a {
            TransactionAction::Insert(insert) => Some(insert),
            _ => None,
        })
    }

    /// Update actions only
    pub fn updates(&self) -> impl Iterator<Item = &Update> {
        self.actions.list(&tags::UPDATE).iter().filter_map(|a| match a {
            TransactionAction::Update(update) => Some(update),
            _ => None,
        })
    }

    /// Delete actions only
    pub fn deletes(&self) -> impl Iterator<Item = &Delete> {
        self.actions.list(&tags::DELETE).iter().filter_map(|a| match a {
            TransactionAction::Delete(delete) => Some(delete),
            _ => None,
        })
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for Transaction {
    fn type_name(&self) -> &'static str {
        "TransactionType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        let mut properties = Properties::new()
            .extend(self.base.properties())
            .attr("lockId", self.lock_id.as_ref())
            .attr_unsettable("releaseAction", &self.release_action)
            .attr("srsName", self.srs_name.as_ref());
        for entry in &self.actions {
            properties = properties.tagged_child(&entry.tag, &entry.value);
        }
        properties.build()
    }
}

impl Validate for Transaction {
    fn validate(&self) -> Result<()> {
        self.base.check("TransactionType")?;
        validate_all(self.actions.iter().map(|entry| &entry.value), "AbstractTransactionAction")
    }
}

/// Member of the wfs:AbstractTransactionAction substitution group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionAction {
    /// wfs:Insert
    Insert(Insert),
    /// wfs:Update
    Update(Update),
    /// wfs:Replace
    Replace(Replace),
    /// wfs:Delete
    Delete(Delete),
    /// wfs:Native
    Native(Native),
}

impl TransactionAction {
    /// Element name of this action
    pub fn tag(&self) -> QName {
        let tag = match self {
            TransactionAction::Insert(_) => &tags::INSERT,
            TransactionAction::Update(_) => &tags::UPDATE,
            TransactionAction::Replace(_) => &tags::REPLACE,
            TransactionAction::Delete(_) => &tags::DELETE,
            TransactionAction::Native(_) => &tags::NATIVE,
        };
        QName::clone(tag)
    }

    /// handle attribute
    pub fn handle(&self) -> Option<&str> {
        match self {
            TransactionAction::Insert(a) => a.handle.as_deref(),
            TransactionAction::Update(a) => a.handle.as_deref(),
            TransactionAction::Replace(a) => a.handle.as_deref(),
            TransactionAction::Delete(a) => a.handle.as_deref(),
            TransactionAction::Native(a) => a.handle.as_deref(),
        }
    }

    fn inner(&self) -> &dyn Describe {
        match self {
            TransactionAction::Insert(a) => a,
            TransactionAction::Update(a) => a,
            TransactionAction::Replace(a) => a,
            TransactionAction::Delete(a) => a,
            TransactionAction::Native(a) => a,
        }
    }
}

impl Describe for TransactionAction {
    fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }

    fn describe(&self) -> Vec<Property<'_>> {
        self.inner().describe()
    }
}

impl Validate for TransactionAction {
    fn validate(&self) -> Result<()> {
        match self {
            TransactionAction::Insert(a) => a.validate(),
            TransactionAction::Update(a) => a.validate(),
            TransactionAction::Replace(a) => a.validate(),
            TransactionAction::Delete(a) => a.validate(),
            TransactionAction::Native(a) => a.validate(),
        }
    }
}

macro_rules! action_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for TransactionAction {
                fn from(action: $variant) -> Self {
                    TransactionAction::$variant(action)
                }
            }
        )+
    };
}

action_from!(Insert, Update, Replace, Delete, Native);

/// wfs:Insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    /// handle attribute
    pub handle: Option<String>,
    /// inputFormat, default GML 3.2
    pub input_format: Unsettable<String>,
    /// srsName attribute
    pub srs_name: Option<AnyUri>,
    /// Features to insert
    pub features: ChildList<AnyElement>,
}

impl Insert {
    /// Insert of one feature
    pub fn new(feature: AnyElement) -> Self {
        Self {
            handle: None,
            input_format: Unsettable::new(GML32_FORMAT.to_string()),
            srs_name: None,
            features: ChildList::from(vec![feature]),
        }
    }
}

impl Describe for Insert {
    fn type_name(&self) -> &'static str {
        "InsertType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr_unsettable("inputFormat", &self.input_format)
            .attr("srsName", self.srs_name.as_ref())
            .anys(&self.features)
            .build()
    }
}

impl Validate for Insert {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.features.len(), "InsertType", "feature")
    }
}

/// wfs:Update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// handle attribute
    pub handle: Option<String>,
    /// typeName attribute (required)
    pub type_name: Option<QName>,
    /// inputFormat, default GML 3.2
    pub input_format: Unsettable<String>,
    /// srsName attribute
    pub srs_name: Option<AnyUri>,
    /// wfs:Property members, one or more
    pub properties: ChildList<UpdateProperty>,
    /// fes:Filter
    pub filter: ChildSlot<Filter>,
}

impl Update {
    /// Update of features of `type_name`
    pub fn new(type_name: QName) -> Self {
        Self {
            handle: None,
            type_name: Some(type_name),
            input_format: Unsettable::new(GML32_FORMAT.to_string()),
            srs_name: None,
            properties: ChildList::new(),
            filter: ChildSlot::empty(),
        }
    }

    /// Add a property assignment
    pub fn with_property(mut self, property: UpdateProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Restrict the update with a filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter.set(filter);
        self
    }
}

impl Describe for Update {
    fn type_name(&self) -> &'static str {
        "UpdateType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr("typeName", self.type_name.as_ref())
            .attr_unsettable("inputFormat", &self.input_format)
            .attr("srsName", self.srs_name.as_ref())
            .children(Ns::Wfs, "Property", &self.properties)
            .child(Ns::Fes, "Filter", self.filter.get())
            .build()
    }
}

impl Validate for Update {
    fn validate(&self) -> Result<()> {
        require(self.type_name.as_ref(), "UpdateType", "typeName")?;
        Occurs::one_or_more().check(self.properties.len(), "UpdateType", "Property")?;
        validate_all(&self.properties, "Property")?;
        validate_child(self.filter.get(), "Filter")
    }
}

/// wfs:Property of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProperty {
    /// wfs:ValueReference naming the property; not owned
    pub value_reference: Option<Reference<ValueReference>>,
    /// wfs:Value, absent to set the property to null
    pub value: Option<MixedContent>,
}

impl UpdateProperty {
    /// Assign `value` to the property at `path`
    pub fn new(path: impl Into<String>, value: impl Into<MixedContent>) -> Self {
        Self {
            value_reference: Some(Reference::resolved(ValueReference::new(path))),
            value: Some(value.into()),
        }
    }

    /// Apply `action` to the property at `path` without a value
    pub fn action(path: impl Into<String>, action: UpdateAction) -> Self {
        let mut reference = ValueReference::new(path);
        reference.action.set(action);
        Self {
            value_reference: Some(Reference::resolved(reference)),
            value: None,
        }
    }
}

impl Describe for UpdateProperty {
    fn type_name(&self) -> &'static str {
        "PropertyType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .reference(Ns::Wfs, "ValueReference", self.value_reference.as_ref())
            .child(Ns::Wfs, "Value", self.value.as_ref())
            .build()
    }
}

impl Validate for UpdateProperty {
    fn validate(&self) -> Result<()> {
        require(self.value_reference.as_ref(), "PropertyType", "ValueReference")?;
        match self.value_reference.as_ref().and_then(Reference::get) {
            Some(reference) => validate_child(Some(reference), "ValueReference"),
            None => Ok(()),
        }
    }
}

/// wfs:ValueReference of an update property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueReference {
    /// XPath to the property
    pub value: String,
    /// action attribute, default `replace`
    pub action: Unsettable<UpdateAction>,
}

impl ValueReference {
    /// Reference to `path` with the default action
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            value: path.into(),
            action: Unsettable::new(UpdateAction::Replace),
        }
    }
}

impl Describe for ValueReference {
    fn type_name(&self) -> &'static str {
        "ValueReferenceType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_unsettable("action", &self.action)
            .text(&self.value)
            .build()
    }
}

impl Validate for ValueReference {
    fn validate(&self) -> Result<()> {
        require_text(Some(&self.value), "ValueReferenceType", "value")
    }
}

/// wfs:Replace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replace {
    /// handle attribute
    pub handle: Option<String>,
    /// inputFormat, default GML 3.2
    pub input_format: Unsettable<String>,
    /// srsName attribute
    pub srs_name: Option<AnyUri>,
    /// Replacement feature (required)
    pub feature: Option<AnyElement>,
    /// fes:Filter (required)
    pub filter: ChildSlot<Filter>,
}

impl Replace {
    /// Replace features selected by `filter` with `feature`
    pub fn new(feature: AnyElement, filter: Filter) -> Self {
        Self {
            handle: None,
            input_format: Unsettable::new(GML32_FORMAT.to_string()),
            srs_name: None,
            feature: Some(feature),
            filter: ChildSlot::new(filter),
        }
    }
}

impl Describe for Replace {
    fn type_name(&self) -> &'static str {
        "ReplaceType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr_unsettable("inputFormat", &self.input_format)
            .attr("srsName", self.srs_name.as_ref())
            .any_opt(self.feature.as_ref())
            .child(Ns::Fes, "Filter", self.filter.get())
            .build()
    }
}

impl Validate for Replace {
    fn validate(&self) -> Result<()> {
        require(self.feature.as_ref(), "ReplaceType", "feature")?;
        require(self.filter.get(), "ReplaceType", "Filter")?;
        validate_child(self.filter.get(), "Filter")
    }
}

/// wfs:Delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    /// handle attribute
    pub handle: Option<String>,
    /// typeName attribute (required)
    pub type_name: Option<QName>,
    /// fes:Filter (required)
    pub filter: ChildSlot<Filter>,
}

impl Delete {
    /// Delete features of `type_name` selected by `filter`
    pub fn new(type_name: QName, filter: Filter) -> Self {
        Self {
            handle: None,
            type_name: Some(type_name),
            filter: ChildSlot::new(filter),
        }
    }
}

impl Describe for Delete {
    fn type_name(&self) -> &'static str {
        "DeleteType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr("typeName", self.type_name.as_ref())
            .child(Ns::Fes, "Filter", self.filter.get())
            .build()
    }
}

impl Validate for Delete {
    fn validate(&self) -> Result<()> {
        require(self.type_name.as_ref(), "DeleteType", "typeName")?;
        require(self.filter.get(), "DeleteType", "Filter")?;
        validate_child(self.filter.get(), "Filter")
    }
}

/// wfs:Native, a vendor specific action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Native {
    /// handle attribute
    pub handle: Option<String>,
    /// vendorId attribute (required)
    pub vendor_id: Option<String>,
    /// safeToIgnore attribute (required)
    pub safe_to_ignore: Option<bool>,
    /// Vendor content
    pub content: FeatureMap<MixedContent>,
}

impl Native {
    /// Vendor action with text content
    pub fn new(vendor_id: impl Into<String>, safe_to_ignore: bool, text: &str) -> Self {
        let mut content = FeatureMap::new();
        MixedContent::from(text).push_into(&mut content);
        Self {
            handle: None,
            vendor_id: Some(vendor_id.into()),
            safe_to_ignore: Some(safe_to_ignore),
            content,
        }
    }
}

impl Describe for Native {
    fn type_name(&self) -> &'static str {
        "NativeType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .attr("vendorId", self.vendor_id.as_ref())
            .attr("safeToIgnore", self.safe_to_ignore.as_ref())
            .extend(MixedContent::sequence_properties(&self.content))
            .build()
    }
}

impl Validate for Native {
    fn validate(&self) -> Result<()> {
        require_text(self.vendor_id.as_ref(), "NativeType", "vendorId")?;
        require(self.safe_to_ignore.as_ref(), "NativeType", "safeToIgnore")
    }
}

/// wfs:TransactionResponse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// version attribute (required, fixed `2.0.0`)
    pub version: Unsettable<String>,
    /// wfs:TransactionSummary (required)
    pub summary: ChildSlot<TransactionSummary>,
    /// wfs:InsertResults
    pub insert_results: ChildSlot<ActionResults>,
    /// wfs:UpdateResults
    pub update_results: ChildSlot<ActionResults>,
    /// wfs:ReplaceResults
    pub replace_results: ChildSlot<ActionResults>,
}

impl TransactionResponse {
    /// Response with a summary
    pub fn new(summary: TransactionSummary) -> Self {
        Self {
            version: Unsettable::new(VERSION.to_string()),
            summary: ChildSlot::new(summary),
            insert_results: ChildSlot::empty(),
            update_results: ChildSlot::empty(),
            replace_results: ChildSlot::empty(),
        }
    }
}

impl Describe for TransactionResponse {
    fn type_name(&self) -> &'static str {
        "TransactionResponseType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr_required("version", &self.version)
            .child(Ns::Wfs, "TransactionSummary", self.summary.get())
            .child(Ns::Wfs, "InsertResults", self.insert_results.get())
            .child(Ns::Wfs, "UpdateResults", self.update_results.get())
            .child(Ns::Wfs, "ReplaceResults", self.replace_results.get())
            .build()
    }
}

impl Validate for TransactionResponse {
    fn validate(&self) -> Result<()> {
        require(self.summary.get(), "TransactionResponseType", "TransactionSummary")?;
        validate_child(self.insert_results.get(), "InsertResults")?;
        validate_child(self.update_results.get(), "UpdateResults")?;
        validate_child(self.replace_results.get(), "ReplaceResults")
    }
}

/// wfs:TransactionSummaryType
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// wfs:totalInserted
    pub total_inserted: Option<u64>,
    /// wfs:totalUpdated
    pub total_updated: Option<u64>,
    /// wfs:totalReplaced
    pub total_replaced: Option<u64>,
    /// wfs:totalDeleted
    pub total_deleted: Option<u64>,
}

impl Describe for TransactionSummary {
    fn type_name(&self) -> &'static str {
        "TransactionSummaryType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .element(Ns::Wfs, "totalInserted", self.total_inserted.as_ref())
            .element(Ns::Wfs, "totalUpdated", self.total_updated.as_ref())
            .element(Ns::Wfs, "totalReplaced", self.total_replaced.as_ref())
            .element(Ns::Wfs, "totalDeleted", self.total_deleted.as_ref())
            .build()
    }
}

/// wfs:ActionResultsType
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResults {
    /// wfs:Feature entries, one or more
    pub features: ChildList<CreatedOrModifiedFeature>,
}

impl Describe for ActionResults {
    fn type_name(&self) -> &'static str {
        "ActionResultsType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .children(Ns::Wfs, "Feature", &self.features)
            .build()
    }
}

impl Validate for ActionResults {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(self.features.len(), "ActionResultsType", "Feature")?;
        validate_all(&self.features, "Feature")
    }
}

/// wfs:CreatedOrModifiedFeatureType
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedOrModifiedFeature {
    /// handle of the action that produced the feature
    pub handle: Option<String>,
    /// fes:ResourceId values, one or more
    pub resource_ids: UniqueList<ResourceId>,
}

impl CreatedOrModifiedFeature {
    /// Entry for one identifier
    pub fn new(rid: impl Into<String>) -> Self {
        let mut resource_ids = UniqueList::new();
        // a fresh list cannot hold a duplicate
        let _ = resource_ids.push(ResourceId::new(rid));
        Self {
            handle: None,
            resource_ids,
        }
    }
}

impl Describe for CreatedOrModifiedFeature {
    fn type_name(&self) -> &'static str {
        "CreatedOrModifiedFeatureType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("handle", self.handle.as_ref())
            .children(Ns::Fes, "ResourceId", &self.resource_ids)
            .build()
    }
}

impl Validate for CreatedOrModifiedFeature {
    fn validate(&self) -> Result<()> {
        Occurs::one_or_more().check(
            self.resource_ids.len(),
            "CreatedOrModifiedFeatureType",
            "ResourceId",
        )?;
        validate_all(&self.resource_ids, "ResourceId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{attribute_value, PropertyValue};
    use pretty_assertions::assert_eq;

    fn roads() -> QName {
        QName::parse_lexical("topp:roads").unwrap()
    }

    #[test]
    fn test_actions_keep_order() {
        let mut transaction = Transaction::new();
        transaction.add(Insert::new(AnyElement::new(roads())));
        transaction.add(Delete::new(roads(), Filter::by_ids(["roads.1"])));
        transaction.add(
            Update::new(roads())
                .with_property(UpdateProperty::new("topp:surface", "gravel"))
                .with_filter(Filter::by_ids(["roads.2"])),
        );
        transaction.add(Insert::new(AnyElement::new(roads())));

        let tags: Vec<_> = transaction.actions.iter().map(|e| e.tag.local_name.as_str()).collect();
        assert_eq!(tags, vec!["Insert", "Delete", "Update", "Insert"]);
        assert_eq!(transaction.inserts().count(), 2);
        assert_eq!(transaction.updates().count(), 1);
        assert_eq!(transaction.deletes().count(), 1);
        assert!(transaction.validate().is_ok());
    }

    #[test]
    fn test_delete_requires_filter() {
        let mut delete = Delete::new(roads(), Filter::by_ids(["roads.1"]));
        delete.filter.take();
        let err = delete.validate().unwrap_err();
        match err {
            Error::Validation(inner) => assert_eq!(inner.path.as_deref(), Some("Filter")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_action_path() {
        let mut transaction = Transaction::new();
        transaction.add(Insert::new(AnyElement::new(roads())));
        transaction.add(Update::new(roads()));
        let err = transaction.validate().unwrap_err();
        match err {
            Error::Validation(inner) => assert_eq!(
                inner.path.as_deref(),
                Some("AbstractTransactionAction[1]/Property")
            ),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_update_property_with_unresolved_reference() {
        let property = UpdateProperty {
            value_reference: Some(Reference::unresolved("vr1")),
            value: Some(MixedContent::from("1")),
        };
        let props = property.describe();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name.local_name, "Value");
    }

    #[test]
    fn test_value_reference_action_emitted_when_set() {
        let property = UpdateProperty::action("topp:surface", UpdateAction::Remove);
        let props = property.describe();
        match &props[0].value {
            PropertyValue::Child(child) => {
                let inner = child.describe();
                assert_eq!(attribute_value(&inner, "action"), Some("remove"));
                assert_eq!(inner[1].lexical(), Some("topp:surface"));
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_native_requires_vendor_and_flag() {
        assert!(Native::new("acme", true, "VACUUM").validate().is_ok());
        assert!(Native::default().validate().is_err());
    }

    #[test]
    fn test_response_requires_summary() {
        let mut response = TransactionResponse::new(TransactionSummary {
            total_inserted: Some(1),
            ..TransactionSummary::default()
        });
        let mut results = ActionResults::default();
        results.features.push(CreatedOrModifiedFeature::new("roads.9"));
        response.insert_results.set(results);
        assert!(response.validate().is_ok());
        assert_eq!(attribute_value(&response.describe(), "version"), Some("2.0.0"));

        response.summary.take();
        assert!(response.validate().is_err());
    }
}
