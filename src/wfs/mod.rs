//! WFS 2.0 records
//!
//! One struct per schema type of `wfs.xsd`. Fields are public and typed;
//! defaults follow the schema; each type lists its properties through
//! [`Describe`](crate::model::Describe) and checks required content through
//! [`Validate`](crate::model::Validate).

pub mod base;
pub mod capabilities;
pub mod document;
pub mod locking;
pub mod query;
pub mod response;
pub mod stored_query;
pub mod transaction;

pub use base::{
    Abstract, BaseRequest, Empty, ExecutionStatus, MixedContent, StandardPresentation,
    StandardResolve, Title,
};
pub use capabilities::{
    DescriptionElement, ExtendedDescription, FeatureType, FeatureTypeList, GetCapabilities,
    MetadataUrl, NoCrs, OutputFormatList, ValueList, WfsCapabilities, Wsdl,
};
pub use document::{RootElement, WfsDocument};
pub use locking::{FeaturesLocked, FeaturesNotLocked, LockFeature, LockFeatureResponse};
pub use query::{
    DescribeFeatureType, GetFeature, GetFeatureWithLock, GetPropertyValue, Parameter,
    PropertyName, Query, QueryExpression, StoredQuery,
};
pub use response::{
    AdditionalObjects, AdditionalValues, EnvelopeProperty, FeatureCollection,
    FeatureCollectionGroup, MemberContent, MemberProperty, SimpleFeatureCollection, Tuple,
    TruncatedResponse, ValueCollection,
};
pub use stored_query::{
    CreateStoredQuery, CreateStoredQueryResponse, DescribeStoredQueries,
    DescribeStoredQueriesResponse, DropStoredQuery, ListStoredQueries, ListStoredQueriesResponse,
    ParameterExpression, QueryExpressionText, StoredQueryDescription, StoredQueryListItem,
};
pub use transaction::{
    ActionResults, CreatedOrModifiedFeature, Delete, Insert, Native, Replace, Transaction,
    TransactionAction, TransactionResponse, TransactionSummary, Update, UpdateProperty,
    ValueReference,
};

/// Element names used as feature map tags
pub mod tags {
    use crate::namespaces::{Ns, QName};
    use once_cell::sync::Lazy;

    /// wfs:Query
    pub static QUERY: Lazy<QName> = Lazy::new(|| QName::wfs("Query"));
    /// wfs:StoredQuery
    pub static STORED_QUERY: Lazy<QName> = Lazy::new(|| QName::wfs("StoredQuery"));
    /// wfs:Insert
    pub static INSERT: Lazy<QName> = Lazy::new(|| QName::wfs("Insert"));
    /// wfs:Update
    pub static UPDATE: Lazy<QName> = Lazy::new(|| QName::wfs("Update"));
    /// wfs:Replace
    pub static REPLACE: Lazy<QName> = Lazy::new(|| QName::wfs("Replace"));
    /// wfs:Delete
    pub static DELETE: Lazy<QName> = Lazy::new(|| QName::wfs("Delete"));
    /// wfs:Native
    pub static NATIVE: Lazy<QName> = Lazy::new(|| QName::wfs("Native"));
    /// wfs:Format
    pub static FORMAT: Lazy<QName> = Lazy::new(|| QName::wfs("Format"));
    /// wfs:Value
    pub static VALUE: Lazy<QName> = Lazy::new(|| QName::wfs("Value"));
    /// wfs:Tuple
    pub static TUPLE: Lazy<QName> = Lazy::new(|| QName::wfs("Tuple"));
    /// wfs:SimpleFeatureCollection
    pub static SIMPLE_FEATURE_COLLECTION: Lazy<QName> =
        Lazy::new(|| QName::wfs("SimpleFeatureCollection"));
    /// wfs:FeatureCollection
    pub static FEATURE_COLLECTION: Lazy<QName> = Lazy::new(|| QName::wfs("FeatureCollection"));
    /// fes:ResourceId
    pub static RESOURCE_ID: Lazy<QName> = Lazy::new(|| Ns::Fes.qname("ResourceId"));
    /// Character data in mixed content
    pub static TEXT: Lazy<QName> = Lazy::new(|| QName::local("#text"));
}
