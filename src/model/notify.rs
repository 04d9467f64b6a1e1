//! Opt-in change notification
//!
//! Record mutation is silent by default. Callers that want to observe a
//! change wrap the slot with [`Observable::observed`] and pass an
//! [`Observer`]; the wrapper performs the same mutation and then delivers one
//! [`Notification`] per change.

use crate::datatypes::{
    ActuateType, AllSome, AnyUri, Lexical, NonNegativeIntegerOrUnknown, PositiveInteger,
    PositiveIntegerWithStar, ResolveValue, ResultType, ShowType, SortOrder, StateValue,
    UpdateAction,
};
use crate::model::describe::Describe;
use crate::namespaces::QName;
use chrono::{DateTime, FixedOffset};
use std::cell::RefCell;
use std::fmt;

/// What happened to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A value or child was assigned
    Set,
    /// A tri-state value was reset to its default
    Unset,
    /// An item was added to a list
    Add,
    /// An item was removed from a list
    Remove,
    /// An item changed position within a list
    Move,
    /// A placeholder reference was swapped for its target
    Resolve,
}

/// Value carried by a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Lexical form of a simple value
    Text(String),
    /// Type name of a record
    Node(&'static str),
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Snapshot::Text(text) => write!(f, "\"{}\"", text),
            Snapshot::Node(type_name) => write!(f, "<{}>", type_name),
        }
    }
}

/// A single change to a record slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Name of the slot that changed
    pub feature: &'static str,
    /// Kind of change
    pub kind: NotificationKind,
    /// Value before the change
    pub old: Option<Snapshot>,
    /// Value after the change
    pub new: Option<Snapshot>,
    /// Whether the slot was explicitly set before the change
    pub was_set: bool,
    /// List position affected
    pub position: Option<usize>,
    /// Extension map tag of the affected entry
    pub tag: Option<QName>,
}

impl Notification {
    /// Create a notification with no values attached
    pub fn new(feature: &'static str, kind: NotificationKind) -> Self {
        Self {
            feature,
            kind,
            old: None,
            new: None,
            was_set: false,
            position: None,
            tag: None,
        }
    }

    /// Set the old value
    pub fn with_old(mut self, old: Option<Snapshot>) -> Self {
        self.old = old;
        self
    }

    /// Set the new value
    pub fn with_new(mut self, new: Option<Snapshot>) -> Self {
        self.new = new;
        self
    }

    /// Set the previous explicit-set flag
    pub fn with_was_set(mut self, was_set: bool) -> Self {
        self.was_set = was_set;
        self
    }

    /// Set the list position
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the extension map tag
    pub fn with_tag(mut self, tag: QName) -> Self {
        self.tag = Some(tag);
        self
    }

    /// A set on an already-set slot that left the value unchanged
    pub fn is_touch(&self) -> bool {
        self.kind == NotificationKind::Set && self.was_set && self.old == self.new
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.feature)?;
        if let Some(tag) = &self.tag {
            write!(f, "[{}]", tag)?;
        }
        if let Some(position) = self.position {
            write!(f, "@{}", position)?;
        }
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, ": {} -> {}", old, new),
            (Some(old), None) => write!(f, ": {} -> none", old),
            (None, Some(new)) => write!(f, ": none -> {}", new),
            (None, None) => Ok(()),
        }
    }
}

/// Receiver of change notifications
pub trait Observer {
    /// Called once per change, after the mutation
    fn notify(&self, notification: &Notification);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&self, _notification: &Notification) {}
}

/// Adapts a closure into an [`Observer`]
pub struct Callback<F>(pub F);

impl<F: Fn(&Notification)> Observer for Callback<F> {
    fn notify(&self, notification: &Notification) {
        (self.0)(notification)
    }
}

/// Observer that records notifications in delivery order
#[derive(Debug, Default)]
pub struct Recorder {
    events: RefCell<Vec<Notification>>,
}

impl Recorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded notifications
    pub fn events(&self) -> Vec<Notification> {
        self.events.borrow().clone()
    }

    /// Number of recorded notifications
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<Notification> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl Observer for Recorder {
    fn notify(&self, notification: &Notification) {
        self.events.borrow_mut().push(notification.clone());
    }
}

/// Conversion of a slot value into a notification payload
pub trait ToSnapshot {
    /// Capture the value
    fn snapshot(&self) -> Snapshot;
}

impl<T: Describe> ToSnapshot for T {
    fn snapshot(&self) -> Snapshot {
        Snapshot::Node(self.type_name())
    }
}

macro_rules! lexical_snapshot {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSnapshot for $ty {
                fn snapshot(&self) -> Snapshot {
                    Snapshot::Text(self.to_lexical())
                }
            }
        )+
    };
}

lexical_snapshot!(
    String,
    bool,
    u64,
    f64,
    QName,
    AnyUri,
    PositiveInteger,
    DateTime<FixedOffset>,
    AllSome,
    ResolveValue,
    ResultType,
    UpdateAction,
    SortOrder,
    ActuateType,
    ShowType,
    StateValue,
    NonNegativeIntegerOrUnknown,
    PositiveIntegerWithStar,
    Vec<QName>,
    Vec<String>,
);

/// A slot borrowed together with the observer that hears about its changes
pub struct Observed<'a, S> {
    pub(crate) target: &'a mut S,
    observer: &'a dyn Observer,
    feature: &'static str,
}

impl<'a, S> Observed<'a, S> {
    /// Wrap a slot
    pub fn new(target: &'a mut S, observer: &'a dyn Observer, feature: &'static str) -> Self {
        Self {
            target,
            observer,
            feature,
        }
    }

    /// Name of the observed slot
    pub fn feature(&self) -> &'static str {
        self.feature
    }

    /// Read access to the wrapped slot
    pub fn get_ref(&self) -> &S {
        self.target
    }

    pub(crate) fn notification(&self, kind: NotificationKind) -> Notification {
        Notification::new(self.feature, kind)
    }

    pub(crate) fn emit(&self, notification: Notification) {
        tracing::trace!(
            feature = notification.feature,
            kind = ?notification.kind,
            "{}",
            notification
        );
        self.observer.notify(&notification);
    }
}

impl<T: ToSnapshot> Observed<'_, Option<T>> {
    /// Assign a plain optional value, returning the previous one
    pub fn set(&mut self, value: Option<T>) -> Option<T> {
        let was_set = self.target.is_some();
        let old = std::mem::replace(self.target, value);
        let notification = self
            .notification(NotificationKind::Set)
            .with_old(old.as_ref().map(ToSnapshot::snapshot))
            .with_new(self.target.as_ref().map(ToSnapshot::snapshot))
            .with_was_set(was_set);
        self.emit(notification);
        old
    }
}

/// Entry point for observed mutation, available on every slot type
pub trait Observable: Sized {
    /// Borrow this slot so that mutations notify `observer`
    fn observed<'a>(
        &'a mut self,
        observer: &'a dyn Observer,
        feature: &'static str,
    ) -> Observed<'a, Self> {
        Observed::new(self, observer, feature)
    }
}

impl<T> Observable for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_collects_in_order() {
        let recorder = Recorder::new();
        recorder.notify(&Notification::new("a", NotificationKind::Add));
        recorder.notify(&Notification::new("b", NotificationKind::Remove));

        let events = recorder.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].feature, "a");
        assert_eq!(events[1].kind, NotificationKind::Remove);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_callback_observer() {
        let seen = RefCell::new(Vec::new());
        let observer = Callback(|n: &Notification| seen.borrow_mut().push(n.feature));

        let mut srs_name: Option<String> = None;
        srs_name
            .observed(&observer, "srsName")
            .set(Some("urn:ogc:def:crs:EPSG::4326".to_string()));

        assert_eq!(seen.into_inner(), vec!["srsName"]);
        assert_eq!(srs_name.as_deref(), Some("urn:ogc:def:crs:EPSG::4326"));
    }

    #[test]
    fn test_optional_set_notification() {
        let recorder = Recorder::new();
        let mut count: Option<u64> = Some(10);
        let old = count.observed(&recorder, "count").set(None);

        assert_eq!(old, Some(10));
        let event = &recorder.events()[0];
        assert_eq!(event.old, Some(Snapshot::Text("10".to_string())));
        assert_eq!(event.new, None);
        assert!(event.was_set);
    }

    #[test]
    fn test_is_touch() {
        let touch = Notification::new("count", NotificationKind::Set)
            .with_old(Some(Snapshot::Text("5".to_string())))
            .with_new(Some(Snapshot::Text("5".to_string())))
            .with_was_set(true);
        assert!(touch.is_touch());

        let first = touch.clone().with_was_set(false);
        assert!(!first.is_touch());
    }

    #[test]
    fn test_notification_display() {
        let n = Notification::new("titles", NotificationKind::Add)
            .with_new(Some(Snapshot::Node("Title")))
            .with_position(2);
        assert_eq!(n.to_string(), "Add titles@2: none -> <Title>");
    }
}
