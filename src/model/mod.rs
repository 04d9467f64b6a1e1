//! Record model primitives
//!
//! Every WFS record is a plain struct built from a handful of slot types:
//!
//! - [`Unsettable`] for attributes with a schema default
//! - [`ChildSlot`], [`ChildList`] and [`UniqueList`] for owned content
//! - [`FeatureMap`] for interleaved choice and wildcard content
//! - [`Reference`] for non-owning links resolved through a [`Resolver`]
//!
//! Mutation is silent unless a slot is wrapped with
//! [`Observable::observed`]. Generic traversal goes through [`Describe`].

pub mod containment;
pub mod describe;
pub mod feature_map;
pub mod notify;
pub mod reference;
pub mod unsettable;
pub mod validate;

pub use containment::{ChildList, ChildSlot, Occurs, UniqueList};
pub use describe::{attribute_value, Describe, Properties, Property, PropertyValue};
pub use feature_map::{Entry, FeatureMap, TaggedView, TaggedViewMut};
pub use notify::{
    Callback, NoopObserver, Notification, NotificationKind, Observable, Observed, Observer,
    Recorder, Snapshot, ToSnapshot,
};
pub use reference::{IdRegistry, Reference, Resolver};
pub use unsettable::Unsettable;
pub use validate::Validate;
