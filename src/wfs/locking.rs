//! Feature locking

use crate::datatypes::{AllSome, PositiveInteger};
use crate::error::Result;
use crate::fes::ResourceId;
use crate::model::validate::{validate_all, validate_child, Validate};
use crate::model::{ChildSlot, Describe, FeatureMap, Occurs, Properties, Property, Unsettable};
use crate::namespaces::Ns;
use crate::wfs::base::BaseRequest;
use crate::wfs::query::{query_group_properties, validate_query_group, QueryExpression};
use crate::wfs::tags;
use serde::{Deserialize, Serialize};

/// wfs:LockFeature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFeature {
    /// Request base attributes
    pub base: BaseRequest,
    /// Query expressions selecting the features to lock
    pub queries: FeatureMap<QueryExpression>,
    /// lockId of an existing lock to reset
    pub lock_id: Option<String>,
    /// expiry in seconds, default 300
    pub expiry: Unsettable<PositiveInteger>,
    /// lockAction, default `ALL`
    pub lock_action: Unsettable<AllSome>,
}

impl LockFeature {
    /// Request with schema defaults
    pub fn new() -> Self {
        Self {
            base: BaseRequest::new(),
            queries: FeatureMap::new(),
            lock_id: None,
            expiry: Unsettable::new(PositiveInteger::DEFAULT_TIMEOUT),
            lock_action: Unsettable::new(AllSome::All),
        }
    }

    /// Request renewing the lock `lock_id`
    pub fn renew(lock_id: impl Into<String>) -> Self {
        Self {
            lock_id: Some(lock_id.into()),
            ..Self::new()
        }
    }

    /// Append a query expression
    pub fn add_query(&mut self, query: impl Into<QueryExpression>) {
        let query = query.into();
        self.queries.push(query.tag(), query);
    }
}

impl Default for LockFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl Describe for LockFeature {
    fn type_name(&self) -> &'static str {
        "LockFeatureType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .extend(self.base.properties())
            .attr("lockId", self.lock_id.as_ref())
            .attr_unsettable("expiry", &self.expiry)
            .attr_unsettable("lockAction", &self.lock_action)
            .extend(query_group_properties(&self.queries))
            .build()
    }
}

impl Validate for LockFeature {
    fn validate(&self) -> Result<()> {
        self.base.check("LockFeatureType")?;
        validate_query_group(&self.queries, Occurs::zero_or_more(), "LockFeatureType")
    }
}

/// wfs:LockFeatureResponse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockFeatureResponse {
    /// lockId attribute
    pub lock_id: Option<String>,
    /// wfs:FeaturesLocked
    pub features_locked: ChildSlot<FeaturesLocked>,
    /// wfs:FeaturesNotLocked
    pub features_not_locked: ChildSlot<FeaturesNotLocked>,
}

impl LockFeatureResponse {
    /// Whether every requested feature was locked
    pub fn is_complete(&self) -> bool {
        self.features_not_locked.get().map_or(true, |group| group.is_empty())
    }
}

impl Describe for LockFeatureResponse {
    fn type_name(&self) -> &'static str {
        "LockFeatureResponseType"
    }

    fn describe(&self) -> Vec<Property<'_>> {
        Properties::new()
            .attr("lockId", self.lock_id.as_ref())
            .child(Ns::Wfs, "FeaturesLocked", self.features_locked.get())
            .child(Ns::Wfs, "FeaturesNotLocked", self.features_not_locked.get())
            .build()
    }
}

impl Validate for LockFeatureResponse {
    fn validate(&self) -> Result<()> {
        validate_child(self.features_locked.get(), "FeaturesLocked")?;
        validate_child(self.features_not_locked.get(), "FeaturesNotLocked")
    }
}

macro_rules! resource_id_group {
    ($(#[$meta:meta])* $name:ident, $type_name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            /// fes:AbstractId members
            pub group: FeatureMap<ResourceId>,
        }

        impl $name {
            /// Group of identifiers
            pub fn new<I, S>(rids: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let mut group = Self::default();
                for rid in rids {
                    group.add(ResourceId::new(rid));
                }
                group
            }

            /// Append an identifier
            pub fn add(&mut self, id: ResourceId) {
                self.group.push(tags::RESOURCE_ID.clone(), id);
            }

            /// The fes:ResourceId members
            pub fn resource_ids(&self) -> Vec<&ResourceId> {
                self.group.list(&tags::RESOURCE_ID).to_vec()
            }

            /// Identifier strings
            pub fn rids(&self) -> Vec<&str> {
                self.group
                    .iter()
                    .filter_map(|entry| entry.value.rid.as_deref())
                    .collect()
            }

            /// Number of identifiers
            pub fn len(&self) -> usize {
                self.group.len()
            }

            /// Check if the group is empty
            pub fn is_empty(&self) -> bool {
                self.group.is_empty()
            }
        }

        impl Describe for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn describe(&self) -> Vec<Property<'_>> {
                let mut properties = Properties::new();
                for entry in &self.group {
                    properties = properties.tagged_child(&entry.tag, &entry.value);
                }
                properties.build()
            }
        }

        impl Validate for $name {
            fn validate(&self) -> Result<()> {
                Occurs::one_or_more().check(self.group.len(), $type_name, "AbstractId")?;
                validate_all(self.group.iter().map(|entry| &entry.value), "AbstractId")
            }
        }
    };
}

resource_id_group!(
    /// wfs:FeaturesLocked
    FeaturesLocked, "FeaturesLockedType"
);
resource_id_group!(
    /// wfs:FeaturesNotLocked
    FeaturesNotLocked, "FeaturesNotLockedType"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attribute_value;
    use crate::namespaces::QName;
    use crate::wfs::query::Query;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lock_without_queries_is_a_renewal() {
        let request = LockFeature::renew("lock-7");
        assert!(request.validate().is_ok());
        assert_eq!(attribute_value(&request.describe(), "lockId"), Some("lock-7"));
    }

    #[test]
    fn test_lock_with_query() {
        let mut request = LockFeature::new();
        request.add_query(Query::new(QName::parse_lexical("topp:states").unwrap()));
        request.lock_action.set(AllSome::Some);
        let props = request.describe();
        assert_eq!(attribute_value(&props, "lockAction"), Some("SOME"));
        assert_eq!(props.last().unwrap().name.local_name, "Query");
    }

    #[test]
    fn test_response_groups() {
        let mut response = LockFeatureResponse {
            lock_id: Some("lock-7".to_string()),
            ..LockFeatureResponse::default()
        };
        response.features_locked.set(FeaturesLocked::new(["states.1", "states.2"]));
        assert!(response.is_complete());
        assert!(response.validate().is_ok());

        response.features_not_locked.set(FeaturesNotLocked::new(["states.3"]));
        assert!(!response.is_complete());
        assert_eq!(response.features_locked.get().unwrap().rids(), vec!["states.1", "states.2"]);
        assert_eq!(response.features_not_locked.get().unwrap().resource_ids().len(), 1);
    }

    #[test]
    fn test_empty_group_is_invalid() {
        assert!(FeaturesLocked::default().validate().is_err());
    }
}
