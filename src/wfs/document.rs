//! Document root: a global WFS element with its namespace bindings

use crate::datatypes::{AnyUri, Lexical};
use crate::error::{Error, Result};
use crate::model::{Describe, Validate};
use crate::names::validate_ncname;
use crate::namespaces::{Ns, QName, WFS_NAMESPACE};
use crate::wfs::base::ExecutionStatus;
use crate::wfs::capabilities::{GetCapabilities, WfsCapabilities};
use crate::wfs::locking::{LockFeature, LockFeatureResponse};
use crate::wfs::query::{
    DescribeFeatureType, GetFeature, GetFeatureWithLock, GetPropertyValue, Query, StoredQuery,
};
use crate::wfs::response::{FeatureCollection, SimpleFeatureCollection, ValueCollection};
use crate::wfs::stored_query::{
    CreateStoredQuery, DescribeStoredQueries, DescribeStoredQueriesResponse, DropStoredQuery,
    ListStoredQueries, ListStoredQueriesResponse,
};
use crate::wfs::transaction::{Transaction, TransactionResponse};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Location of the WFS 2.0 schema
pub const WFS_SCHEMA_LOCATION: &str = "http://schemas.opengis.net/wfs/2.0/wfs.xsd";

macro_rules! root_elements {
    (
        typed { $( $variant:ident($ty:ty) => $local:literal ),+ $(,)? }
        shared { $( $svariant:ident($sty:ty) => $slocal:literal ),+ $(,)? }
    ) => {
        /// A global element of the WFS namespace
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum RootElement {
            $(
                #[doc = concat!("wfs:", $local)]
                $variant($ty),
            )+
            $(
                #[doc = concat!("wfs:", $slocal)]
                $svariant($sty),
            )+
        }

        impl RootElement {
            /// Qualified name of the element
            pub fn element_name(&self) -> QName {
                match self {
                    $( RootElement::$variant(_) => Ns::Wfs.qname($local), )+
                    $( RootElement::$svariant(_) => Ns::Wfs.qname($slocal), )+
                }
            }

            /// The record as a describable node
            pub fn as_describe(&self) -> &dyn Describe {
                match self {
                    $( RootElement::$variant(record) => record, )+
                    $( RootElement::$svariant(record) => record, )+
                }
            }
        }

        impl Validate for RootElement {
            fn validate(&self) -> Result<()> {
                match self {
                    $( RootElement::$variant(record) => record.validate(), )+
                    $( RootElement::$svariant(record) => record.validate(), )+
                }
            }
        }

        $(
            impl From<$ty> for RootElement {
                fn from(record: $ty) -> Self {
                    RootElement::$variant(record)
                }
            }
        )+
    };
}

root_elements! {
    typed {
        GetCapabilities(GetCapabilities) => "GetCapabilities",
        Capabilities(WfsCapabilities) => "WFS_Capabilities",
        DescribeFeatureType(DescribeFeatureType) => "DescribeFeatureType",
        GetFeature(GetFeature) => "GetFeature",
        GetFeatureWithLock(GetFeatureWithLock) => "GetFeatureWithLock",
        GetPropertyValue(GetPropertyValue) => "GetPropertyValue",
        LockFeature(LockFeature) => "LockFeature",
        LockFeatureResponse(LockFeatureResponse) => "LockFeatureResponse",
        Transaction(Transaction) => "Transaction",
        TransactionResponse(TransactionResponse) => "TransactionResponse",
        ListStoredQueries(ListStoredQueries) => "ListStoredQueries",
        ListStoredQueriesResponse(ListStoredQueriesResponse) => "ListStoredQueriesResponse",
        DescribeStoredQueries(DescribeStoredQueries) => "DescribeStoredQueries",
        DescribeStoredQueriesResponse(DescribeStoredQueriesResponse) => "DescribeStoredQueriesResponse",
        CreateStoredQuery(CreateStoredQuery) => "CreateStoredQuery",
        DropStoredQuery(DropStoredQuery) => "DropStoredQuery",
        FeatureCollection(FeatureCollection) => "FeatureCollection",
        SimpleFeatureCollection(SimpleFeatureCollection) => "SimpleFeatureCollection",
        ValueCollection(ValueCollection) => "ValueCollection",
        Query(Query) => "Query",
        StoredQuery(StoredQuery) => "StoredQuery",
    }
    shared {
        CreateStoredQueryResponse(ExecutionStatus) => "CreateStoredQueryResponse",
        DropStoredQueryResponse(ExecutionStatus) => "DropStoredQueryResponse",
    }
}

/// A WFS document ready for encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WfsDocument {
    /// Extra prefix bindings declared on the root, beyond the OGC ones
    pub prefixes: IndexMap<String, String>,
    /// Namespace to schema location pairs for `xsi:schemaLocation`
    pub schema_locations: IndexMap<String, String>,
    /// The root record
    pub root: RootElement,
}

impl WfsDocument {
    /// Document around `root` with no extra bindings
    pub fn new(root: impl Into<RootElement>) -> Self {
        Self {
            prefixes: IndexMap::new(),
            schema_locations: IndexMap::new(),
            root: root.into(),
        }
    }

    /// Bind `prefix` to `uri` on the root element
    ///
    /// The OGC prefixes (`wfs`, `fes`, `ows`, `gml`, `xlink`) are always
    /// declared and may only be rebound to their own namespace.
    pub fn with_prefix(mut self, prefix: &str, uri: &str) -> Result<Self> {
        validate_ncname(prefix)?;
        if prefix == "xml" || prefix == "xmlns" || prefix.eq_ignore_ascii_case("xsi") {
            return Err(Error::Namespace(format!("prefix '{}' is reserved", prefix)));
        }
        if let Some(ns) = Ns::DECLARED.iter().find(|ns| ns.prefix() == Some(prefix)) {
            if ns.uri() != Some(uri) {
                return Err(Error::Namespace(format!(
                    "prefix '{}' is bound to {}",
                    prefix,
                    ns.uri().unwrap_or_default()
                )));
            }
            return Ok(self);
        }
        AnyUri::from_lexical(uri)?;
        self.prefixes.insert(prefix.to_string(), uri.to_string());
        Ok(self)
    }

    /// Add a schema location for `namespace`
    pub fn with_schema_location(mut self, namespace: &str, location: &str) -> Result<Self> {
        AnyUri::from_lexical(namespace)?;
        AnyUri::from_lexical(location)?;
        self.schema_locations
            .insert(namespace.to_string(), location.to_string());
        Ok(self)
    }

    /// Point the WFS namespace at the official schema
    pub fn with_wfs_schema_location(mut self) -> Self {
        self.schema_locations
            .insert(WFS_NAMESPACE.to_string(), WFS_SCHEMA_LOCATION.to_string());
        self
    }

    /// Lexical value of `xsi:schemaLocation`, if any location is set
    pub fn schema_location(&self) -> Option<String> {
        if self.schema_locations.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .schema_locations
            .iter()
            .map(|(ns, location)| format!("{} {}", ns, location))
            .collect();
        Some(pairs.join(" "))
    }

    /// Qualified name of the root element
    pub fn element_name(&self) -> QName {
        self.root.element_name()
    }
}

impl Validate for WfsDocument {
    fn validate(&self) -> Result<()> {
        self.root.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::GML_NAMESPACE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_names() {
        let doc = WfsDocument::new(GetCapabilities::new());
        assert_eq!(doc.element_name().prefixed(), "wfs:GetCapabilities");
        assert_eq!(doc.root.as_describe().type_name(), "GetCapabilitiesType");

        let doc = WfsDocument::new(RootElement::DropStoredQueryResponse(ExecutionStatus::ok()));
        assert_eq!(doc.element_name().local_name, "DropStoredQueryResponse");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_prefix_bindings() {
        let doc = WfsDocument::new(GetFeature::new())
            .with_prefix("topp", "http://www.openplans.org/topp")
            .unwrap()
            .with_prefix("gml", GML_NAMESPACE)
            .unwrap();
        assert_eq!(doc.prefixes.len(), 1);

        let doc = WfsDocument::new(GetFeature::new());
        assert!(doc.clone().with_prefix("gml", "urn:other").is_err());
        assert!(doc.clone().with_prefix("xsi", "urn:other").is_err());
        assert!(doc.with_prefix("1bad", "urn:x").is_err());
    }

    #[test]
    fn test_schema_location_pairs() {
        let doc = WfsDocument::new(GetFeature::new())
            .with_wfs_schema_location()
            .with_schema_location("http://www.openplans.org/topp", "http://example.com/topp.xsd")
            .unwrap();
        assert_eq!(
            doc.schema_location().unwrap(),
            format!(
                "{} {} http://www.openplans.org/topp http://example.com/topp.xsd",
                WFS_NAMESPACE, WFS_SCHEMA_LOCATION
            )
        );
        assert!(WfsDocument::new(GetFeature::new()).schema_location().is_none());
    }

    #[test]
    fn test_document_validation_reaches_root() {
        let doc = WfsDocument::new(GetFeature::new());
        assert!(doc.validate().is_err());
    }
}
