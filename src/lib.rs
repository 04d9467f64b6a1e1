//! # wfs20
//!
//! Typed records for OGC Web Feature Service 2.0 requests and responses.
//!
//! Every type of the WFS 2.0 schema is a plain Rust struct with public
//! fields. The record model around them handles the parts a schema brings
//! that plain fields do not:
//!
//! - Tri-state attributes with schema defaults ([`model::Unsettable`])
//! - Exclusively owned children and lists ([`model::ChildSlot`], [`model::ChildList`])
//! - Substitution groups and mixed content in document order ([`model::FeatureMap`])
//! - Shared, explicitly resolved references ([`model::Reference`])
//! - Opt-in change notifications ([`model::Observer`])
//! - A per-type property listing for generic traversal ([`model::Describe`])
//! - Cardinality and required-content checks ([`model::Validate`])
//!
//! Records are written as XML by [`encode::Encoder`]. Wildcard content such
//! as filter predicates or GML features is kept as [`documents::AnyElement`].
//!
//! ## Example
//!
//! ```rust
//! use wfs20::fes::Filter;
//! use wfs20::namespaces::QName;
//! use wfs20::wfs::{GetFeature, Query, WfsDocument};
//! use wfs20::model::Validate;
//!
//! let states = QName::parse_lexical("topp:states")?;
//! let mut request = GetFeature::new();
//! request.presentation.count = Some(10);
//! request.add_query(Query::new(states).with_filter(Filter::by_ids(["states.1"])));
//! request.validate()?;
//!
//! let document = WfsDocument::new(request).with_prefix("topp", "http://www.openplans.org/topp")?;
//! let xml = wfs20::encode::to_xml_string(&document)?;
//! assert!(xml.contains("<fes:ResourceId rid=\"states.1\"/>"));
//! # Ok::<(), wfs20::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;
pub mod datatypes;

// Wildcard content
pub mod documents;

// Record model
pub mod model;

// Schema types
pub mod ows;
pub mod fes;
pub mod wfs;

// Output
pub mod encode;

// Re-exports for convenience
pub use encode::{Encoder, EncoderConfig};
pub use error::{Error, Result, ValidationError};
pub use model::{Describe, Validate};
pub use namespaces::QName;
pub use wfs::{RootElement, WfsDocument};

/// Version of the wfs20 library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WFS protocol version implemented by the records
pub const WFS_VERSION: &str = wfs::base::VERSION;
