//! Containment slots
//!
//! A record owns its complex children. [`ChildSlot`] holds at most one child,
//! [`ChildList`] an ordered sequence and [`UniqueList`] an ordered sequence of
//! values that must be pairwise distinct. Ownership is the Rust ownership of
//! the child value, so a child can never sit under two parents: moving it
//! between slots goes through [`ChildSlot::take`] or [`ChildList::remove`].
//!
//! [`Occurs`] carries the schema cardinality of a slot for validation.

use crate::error::{Error, Result, ValidationError};
use crate::model::notify::{NotificationKind, Observed, ToSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single owned child
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildSlot<T>(Option<Box<T>>);

impl<T> ChildSlot<T> {
    /// Empty slot
    pub fn empty() -> Self {
        Self(None)
    }

    /// Slot holding `child`
    pub fn new(child: T) -> Self {
        Self(Some(Box::new(child)))
    }

    /// The child, if any
    pub fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    /// Mutable access to the child
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }

    /// Attach a child, returning the detached previous occupant
    pub fn set(&mut self, child: T) -> Option<T> {
        self.0.replace(Box::new(child)).map(|previous| *previous)
    }

    /// Attach or clear
    pub fn set_option(&mut self, child: Option<T>) -> Option<T> {
        match child {
            Some(child) => self.set(child),
            None => self.take(),
        }
    }

    /// Detach the child, leaving the slot empty
    pub fn take(&mut self) -> Option<T> {
        self.0.take().map(|child| *child)
    }

    /// Move the child of `other` into this slot
    ///
    /// `other` is empty afterwards; the previous occupant of this slot is
    /// returned.
    pub fn adopt(&mut self, other: &mut ChildSlot<T>) -> Option<T> {
        match other.take() {
            Some(child) => self.set(child),
            None => self.take(),
        }
    }

    /// Get the child, attaching `T::default()` first if the slot is empty
    pub fn get_or_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.0.get_or_insert_with(Box::default)
    }

    /// Whether a child is attached
    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Whether the slot is empty
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl<T> Default for ChildSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for ChildSlot<T> {
    fn from(child: T) -> Self {
        Self::new(child)
    }
}

impl<T: fmt::Debug> fmt::Debug for ChildSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(child) => child.fmt(f),
            None => f.write_str("None"),
        }
    }
}

impl<T: ToSnapshot> Observed<'_, ChildSlot<T>> {
    /// Attach a child with one coalesced notification
    pub fn set(&mut self, child: T) -> Option<T> {
        let was_set = self.target.is_some();
        let old = self.target.set(child);
        let notification = self
            .notification(NotificationKind::Set)
            .with_old(old.as_ref().map(ToSnapshot::snapshot))
            .with_new(self.target.get().map(ToSnapshot::snapshot))
            .with_was_set(was_set);
        self.emit(notification);
        old
    }

    /// Detach the child
    pub fn take(&mut self) -> Option<T> {
        let was_set = self.target.is_some();
        let old = self.target.take();
        let notification = self
            .notification(NotificationKind::Set)
            .with_old(old.as_ref().map(ToSnapshot::snapshot))
            .with_was_set(was_set);
        self.emit(notification);
        old
    }
}

/// Ordered sequence of owned children
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildList<T>(Vec<T>);

impl<T> ChildList<T> {
    /// Empty list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an item
    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    /// Insert an item at `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.0.len() {
            return Err(Error::index(index, self.0.len()));
        }
        self.0.insert(index, item);
        Ok(())
    }

    /// Remove and return the item at `index`
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.0.len() {
            return Err(Error::index(index, self.0.len()));
        }
        Ok(self.0.remove(index))
    }

    /// Remove every item, returning them in order
    pub fn clear(&mut self) -> Vec<T> {
        std::mem::take(&mut self.0)
    }

    /// Move an item from one position to another
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.0.len();
        if from >= len {
            return Err(Error::index(from, len));
        }
        if to >= len {
            return Err(Error::index(to, len));
        }
        let item = self.0.remove(from);
        self.0.insert(to, item);
        Ok(())
    }

    /// Position of the first item equal to `item`
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.0.iter().position(|candidate| candidate == item)
    }

    /// Item at `index`
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    /// Mutable item at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.0.get_mut(index)
    }

    /// First item
    pub fn first(&self) -> Option<&T> {
        self.0.first()
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Iterate mutably in order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.0.iter_mut()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Items as a slice
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T> Default for ChildList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ChildList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T> From<Vec<T>> for ChildList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for ChildList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for ChildList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ChildList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: ToSnapshot> Observed<'_, ChildList<T>> {
    /// Append with an ADD notification
    pub fn push(&mut self, item: T) {
        let position = self.target.len();
        let notification = self
            .notification(NotificationKind::Add)
            .with_new(Some(item.snapshot()))
            .with_position(position);
        self.target.push(item);
        self.emit(notification);
    }

    /// Insert with an ADD notification
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        let snapshot = item.snapshot();
        self.target.insert(index, item)?;
        let notification = self
            .notification(NotificationKind::Add)
            .with_new(Some(snapshot))
            .with_position(index);
        self.emit(notification);
        Ok(())
    }

    /// Remove with a REMOVE notification
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let item = self.target.remove(index)?;
        let notification = self
            .notification(NotificationKind::Remove)
            .with_old(Some(item.snapshot()))
            .with_was_set(true)
            .with_position(index);
        self.emit(notification);
        Ok(item)
    }

    /// Clear with one REMOVE notification per detached item
    pub fn clear(&mut self) -> Vec<T> {
        let items = self.target.clear();
        for (position, item) in items.iter().enumerate() {
            let notification = self
                .notification(NotificationKind::Remove)
                .with_old(Some(item.snapshot()))
                .with_was_set(true)
                .with_position(position);
            self.emit(notification);
        }
        items
    }

    /// Move with a MOVE notification carrying the new position
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.target.move_item(from, to)?;
        let moved = self.target.get(to).map(ToSnapshot::snapshot);
        let notification = self
            .notification(NotificationKind::Move)
            .with_old(Some(crate::model::notify::Snapshot::Text(from.to_string())))
            .with_new(moved)
            .with_position(to);
        self.emit(notification);
        Ok(())
    }
}

/// Ordered sequence of pairwise distinct values
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueList<T>(Vec<T>);

impl<T: PartialEq + fmt::Debug> UniqueList<T> {
    /// Empty list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn check_unique(&self, item: &T) -> Result<()> {
        if self.0.contains(item) {
            Err(Error::Duplicate(format!("{:?}", item)))
        } else {
            Ok(())
        }
    }

    /// Append a value not already present
    pub fn push(&mut self, item: T) -> Result<()> {
        self.check_unique(&item)?;
        self.0.push(item);
        Ok(())
    }

    /// Insert a value not already present at `index`
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.0.len() {
            return Err(Error::index(index, self.0.len()));
        }
        self.check_unique(&item)?;
        self.0.insert(index, item);
        Ok(())
    }

    /// Remove and return the value at `index`
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.0.len() {
            return Err(Error::index(index, self.0.len()));
        }
        Ok(self.0.remove(index))
    }

    /// Remove every value
    pub fn clear(&mut self) -> Vec<T> {
        std::mem::take(&mut self.0)
    }

    /// Whether `item` is present
    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    /// Position of `item`
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == item)
    }

    /// Value at `index`
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: PartialEq + fmt::Debug> Default for UniqueList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for UniqueList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T: PartialEq + fmt::Debug> TryFrom<Vec<T>> for UniqueList<T> {
    type Error = Error;

    fn try_from(items: Vec<T>) -> Result<Self> {
        let mut list = Self::new();
        for item in items {
            list.push(item)?;
        }
        Ok(list)
    }
}

impl<'a, T> IntoIterator for &'a UniqueList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: PartialEq + fmt::Debug + ToSnapshot> Observed<'_, UniqueList<T>> {
    /// Append with an ADD notification; duplicates notify nothing
    pub fn push(&mut self, item: T) -> Result<()> {
        let position = self.target.len();
        let snapshot = item.snapshot();
        self.target.push(item)?;
        let notification = self
            .notification(NotificationKind::Add)
            .with_new(Some(snapshot))
            .with_position(position);
        self.emit(notification);
        Ok(())
    }

    /// Remove with a REMOVE notification
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let item = self.target.remove(index)?;
        let notification = self
            .notification(NotificationKind::Remove)
            .with_old(Some(item.snapshot()))
            .with_was_set(true)
            .with_position(index);
        self.emit(notification);
        Ok(item)
    }

    /// Clear with one REMOVE notification per value
    pub fn clear(&mut self) -> Vec<T> {
        let items = self.target.clear();
        for (position, item) in items.iter().enumerate() {
            let notification = self
                .notification(NotificationKind::Remove)
                .with_old(Some(item.snapshot()))
                .with_was_set(true)
                .with_position(position);
            self.emit(notification);
        }
        items
    }
}

/// Occurrence bounds of a slot (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: usize,
    /// Maximum number of occurrences (None = unbounded)
    pub max: Option<usize>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Exactly one (1, 1)
    pub const fn once() -> Self {
        Self::new(1, Some(1))
    }

    /// Optional (0, 1)
    pub const fn optional() -> Self {
        Self::new(0, Some(1))
    }

    /// Zero or more (0, unbounded)
    pub const fn zero_or_more() -> Self {
        Self::new(0, None)
    }

    /// One or more (1, unbounded)
    pub const fn one_or_more() -> Self {
        Self::new(1, None)
    }

    /// `n` or more (n, unbounded)
    pub const fn at_least(n: usize) -> Self {
        Self::new(n, None)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: usize) -> bool {
        count < self.min
    }

    /// Check if occurrence count exceeds the maximum
    pub fn is_exceeded(&self, count: usize) -> bool {
        match self.max {
            Some(max) => count > max,
            None => false,
        }
    }

    /// Validate `count` occurrences of `field` in a record of type `type_name`
    pub fn check(&self, count: usize, type_name: &str, field: &str) -> Result<()> {
        if self.is_missing(count) {
            return Err(ValidationError::new(format!(
                "'{}' occurs {} times, at least {} required",
                field, count, self.min
            ))
            .with_type_name(type_name)
            .with_path(field)
            .into());
        }
        if self.is_exceeded(count) {
            return Err(ValidationError::new(format!(
                "'{}' occurs {} times, at most {} allowed",
                field,
                count,
                self.max.unwrap_or_default()
            ))
            .with_type_name(type_name)
            .with_path(field)
            .into());
        }
        Ok(())
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notify::{Observable, Recorder, Snapshot};

    #[test]
    fn test_child_slot_set_returns_previous() {
        let mut slot = ChildSlot::new("first".to_string());
        let previous = slot.set("second".to_string());
        assert_eq!(previous.as_deref(), Some("first"));
        assert_eq!(slot.get().map(String::as_str), Some("second"));
    }

    #[test]
    fn test_child_slot_adopt_detaches_source() {
        let mut a = ChildSlot::new(7u64);
        let mut b = ChildSlot::empty();

        assert_eq!(b.adopt(&mut a), None);
        assert!(a.is_none());
        assert_eq!(b.get(), Some(&7));
    }

    #[test]
    fn test_child_list_index_errors() {
        let mut list: ChildList<u64> = vec![1, 2, 3].into();
        assert!(matches!(list.insert(5, 9), Err(Error::Index { index: 5, len: 3 })));
        assert!(matches!(list.remove(3), Err(Error::Index { .. })));

        list.insert(3, 4).unwrap();
        list.move_item(0, 3).unwrap();
        assert_eq!(list.as_slice(), &[2, 3, 4, 1]);
        assert_eq!(list.index_of(&4), Some(2));
    }

    #[test]
    fn test_observed_clear_emits_per_item() {
        let recorder = Recorder::new();
        let mut list: ChildList<String> = ChildList::new();
        for name in ["a", "b", "c"] {
            list.observed(&recorder, "typeName").push(name.to_string());
        }
        recorder.take();

        let removed = list.observed(&recorder, "typeName").clear();
        assert_eq!(removed.len(), 3);
        assert!(list.is_empty());

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.kind == NotificationKind::Remove));
        assert_eq!(events[2].old, Some(Snapshot::Text("c".to_string())));
        assert_eq!(events[2].position, Some(2));
    }

    #[test]
    fn test_unique_list_rejects_duplicates() {
        let mut ids = UniqueList::new();
        ids.push("urn:ogc:def:query:OGC-WFS::GetFeatureById".to_string())
            .unwrap();
        let err = ids
            .push("urn:ogc:def:query:OGC-WFS::GetFeatureById".to_string())
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));
        assert_eq!(ids.len(), 1);

        assert!(UniqueList::try_from(vec![1u64, 2, 1]).is_err());
    }

    #[test]
    fn test_occurs_check() {
        assert!(Occurs::one_or_more().check(0, "FeatureTypeList", "FeatureType").is_err());
        assert!(Occurs::at_least(2).check(2, "Tuple", "member").is_ok());
        let err = Occurs::optional().check(2, "Update", "Filter").unwrap_err();
        assert!(err.to_string().contains("at most 1"));
    }
}
