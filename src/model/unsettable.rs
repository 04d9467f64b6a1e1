//! Tri-state fields
//!
//! Schema attributes with a default value distinguish "never assigned" from
//! "assigned the default". [`Unsettable`] keeps the default next to the value
//! and an explicit-set flag, so the encoder can omit what was never set.

use crate::model::notify::{NotificationKind, Observed, ToSnapshot};
use serde::{Deserialize, Serialize};

/// Field with a schema default and an explicit-set flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unsettable<T> {
    value: T,
    default: T,
    set: bool,
}

impl<T: Clone> Unsettable<T> {
    /// Unset field holding its default
    pub fn new(default: T) -> Self {
        Self {
            value: default.clone(),
            default,
            set: false,
        }
    }

    /// Field explicitly set to `value`
    pub fn with_value(default: T, value: T) -> Self {
        Self {
            value,
            default,
            set: true,
        }
    }

    /// Current value; the default while unset
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Schema default
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Whether the field was explicitly assigned
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// The value, only if explicitly assigned
    pub fn explicit(&self) -> Option<&T> {
        if self.set {
            Some(&self.value)
        } else {
            None
        }
    }

    /// Assign a value and return the previous one
    pub fn set(&mut self, value: T) -> T {
        self.set = true;
        std::mem::replace(&mut self.value, value)
    }

    /// Restore the default; returns the previous value if one was set
    pub fn unset(&mut self) -> Option<T> {
        let old = std::mem::replace(&mut self.value, self.default.clone());
        if std::mem::replace(&mut self.set, false) {
            Some(old)
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Unsettable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + ToSnapshot> Observed<'_, Unsettable<T>> {
    /// Assign a value, notifying with the previous value and set flag
    pub fn set(&mut self, value: T) -> T {
        let was_set = self.target.is_set();
        let old = self.target.set(value);
        let notification = self
            .notification(NotificationKind::Set)
            .with_old(Some(old.snapshot()))
            .with_new(Some(self.target.get().snapshot()))
            .with_was_set(was_set);
        self.emit(notification);
        old
    }

    /// Restore the default, notifying with the prior value and set flag
    pub fn unset(&mut self) -> Option<T> {
        let was_set = self.target.is_set();
        let old_snapshot = self.target.get().snapshot();
        let old = self.target.unset();
        let notification = self
            .notification(NotificationKind::Unset)
            .with_old(Some(old_snapshot))
            .with_new(Some(self.target.get().snapshot()))
            .with_was_set(was_set);
        self.emit(notification);
        old
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notify::{Observable, Recorder, Snapshot};

    #[test]
    fn test_fresh_field_reports_default() {
        let service = Unsettable::new("WFS".to_string());
        assert!(!service.is_set());
        assert_eq!(service.get(), "WFS");
        assert_eq!(service.explicit(), None);
    }

    #[test]
    fn test_set_default_differs_from_unset() {
        let mut start_index = Unsettable::new(0u64);
        start_index.set(0);
        assert!(start_index.is_set());
        assert_eq!(start_index.explicit(), Some(&0));

        assert_eq!(start_index.unset(), Some(0));
        assert!(!start_index.is_set());
        assert_eq!(start_index.unset(), None);
    }

    #[test]
    fn test_observed_set_and_unset() {
        let recorder = Recorder::new();
        let mut expiry = Unsettable::new(300u64);

        expiry.observed(&recorder, "expiry").set(60);
        expiry.observed(&recorder, "expiry").set(60);
        expiry.observed(&recorder, "expiry").unset();

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert!(!events[0].was_set);
        assert!(!events[0].is_touch());
        assert!(events[1].is_touch());
        assert_eq!(events[2].kind, NotificationKind::Unset);
        assert_eq!(events[2].old, Some(Snapshot::Text("60".to_string())));
        assert_eq!(events[2].new, Some(Snapshot::Text("300".to_string())));
        assert_eq!(*expiry.get(), 300);
    }
}
