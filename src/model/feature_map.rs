//! Tagged ordered sequences for choice and wildcard content
//!
//! A schema `xs:choice` or `xs:any` with `maxOccurs > 1` allows its members to
//! interleave, and document order matters. [`FeatureMap`] stores every member
//! once, in order, tagged with the element name it was read from or will be
//! written as. Each declared member is then reachable as a virtual list via
//! [`FeatureMap::list`] and [`FeatureMap::list_mut`]; those views filter the
//! single backing sequence rather than copying it.

use crate::error::{Error, Result};
use crate::model::notify::{NotificationKind, Observed, ToSnapshot};
use crate::namespaces::QName;
use serde::{Deserialize, Serialize};

/// One tagged member of a feature map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// Element name this entry represents
    pub tag: QName,
    /// The member
    pub value: V,
}

impl<V> Entry<V> {
    /// Create an entry
    pub fn new(tag: QName, value: V) -> Self {
        Self { tag, value }
    }
}

/// Ordered heterogeneous sequence of tagged entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap<V> {
    entries: Vec<Entry<V>>,
}

impl<V> FeatureMap<V> {
    /// Empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry
    pub fn push(&mut self, tag: QName, value: V) {
        self.entries.push(Entry::new(tag, value));
    }

    /// Insert an entry at a raw position (`index == len` appends)
    pub fn insert(&mut self, index: usize, tag: QName, value: V) -> Result<()> {
        if index > self.entries.len() {
            return Err(Error::index(index, self.entries.len()));
        }
        self.entries.insert(index, Entry::new(tag, value));
        Ok(())
    }

    /// Remove the entry at a raw position
    pub fn remove(&mut self, index: usize) -> Result<Entry<V>> {
        if index >= self.entries.len() {
            return Err(Error::index(index, self.entries.len()));
        }
        Ok(self.entries.remove(index))
    }

    /// Remove every entry
    pub fn clear(&mut self) -> Vec<Entry<V>> {
        std::mem::take(&mut self.entries)
    }

    /// Entry at a raw position
    pub fn get(&self, index: usize) -> Option<&Entry<V>> {
        self.entries.get(index)
    }

    /// Iterate over all entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, Entry<V>> {
        self.entries.iter()
    }

    /// Iterate mutably over all entries in order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry<V>> {
        self.entries.iter_mut()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying `tag`
    pub fn count(&self, tag: &QName) -> usize {
        self.entries.iter().filter(|e| &e.tag == tag).count()
    }

    /// Distinct tags in order of first appearance
    pub fn tags(&self) -> Vec<&QName> {
        let mut tags: Vec<&QName> = Vec::new();
        for entry in &self.entries {
            if !tags.contains(&&entry.tag) {
                tags.push(&entry.tag);
            }
        }
        tags
    }

    /// First value carrying `tag`
    pub fn first(&self, tag: &QName) -> Option<&V> {
        self.entries
            .iter()
            .find(|e| &e.tag == tag)
            .map(|e| &e.value)
    }

    /// Replace the first value carrying `tag`, or append one
    pub fn set_single(&mut self, tag: QName, value: V) -> Option<V> {
        match self.entries.iter_mut().find(|e| e.tag == tag) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.push(Entry::new(tag, value));
                None
            }
        }
    }

    /// Read-only view of the entries carrying `tag`
    pub fn list<'a>(&'a self, tag: &'a QName) -> TaggedView<'a, V> {
        TaggedView { map: self, tag }
    }

    /// Mutable view of the entries carrying `tag`
    pub fn list_mut(&mut self, tag: QName) -> TaggedViewMut<'_, V> {
        TaggedViewMut { map: self, tag }
    }

    fn raw_position(&self, tag: &QName, index: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.tag == tag)
            .nth(index)
            .map(|(position, _)| position)
    }
}

impl<V> Default for FeatureMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(QName, V)> for FeatureMap<V> {
    fn from_iter<I: IntoIterator<Item = (QName, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(tag, value)| Entry::new(tag, value))
                .collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a FeatureMap<V> {
    type Item = &'a Entry<V>;
    type IntoIter = std::slice::Iter<'a, Entry<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Entries of one tag, in backing order
pub struct TaggedView<'a, V> {
    map: &'a FeatureMap<V>,
    tag: &'a QName,
}

impl<'a, V> TaggedView<'a, V> {
    /// Iterate over the values carrying the tag
    pub fn iter(&self) -> impl Iterator<Item = &'a V> + 'a {
        let (map, tag) = (self.map, self.tag);
        map.entries
            .iter()
            .filter(move |e| &e.tag == tag)
            .map(|e| &e.value)
    }

    /// Number of values carrying the tag
    pub fn len(&self) -> usize {
        self.map.count(self.tag)
    }

    /// Check if no entry carries the tag
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `index`-th value carrying the tag
    pub fn get(&self, index: usize) -> Option<&'a V> {
        self.iter().nth(index)
    }

    /// First value carrying the tag
    pub fn first(&self) -> Option<&'a V> {
        self.iter().next()
    }

    /// Collect references to the tagged values
    pub fn to_vec(&self) -> Vec<&'a V> {
        self.iter().collect()
    }
}

/// Mutable view of the entries of one tag
///
/// Indices count only tagged entries. New entries are placed relative to the
/// existing tagged entries, so the untagged neighbours keep their order.
pub struct TaggedViewMut<'a, V> {
    map: &'a mut FeatureMap<V>,
    tag: QName,
}

impl<V> TaggedViewMut<'_, V> {
    /// Number of values carrying the tag
    pub fn len(&self) -> usize {
        self.map.count(&self.tag)
    }

    /// Check if no entry carries the tag
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `index`-th value carrying the tag
    pub fn get(&self, index: usize) -> Option<&V> {
        self.map
            .raw_position(&self.tag, index)
            .map(|position| &self.map.entries[position].value)
    }

    /// Mutable access to the `index`-th value carrying the tag
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        let position = self.map.raw_position(&self.tag, index)?;
        Some(&mut self.map.entries[position].value)
    }

    /// Iterate over the tagged values
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        let tag = &self.tag;
        self.map
            .entries
            .iter()
            .filter(move |e| &e.tag == tag)
            .map(|e| &e.value)
    }

    /// Append a value at the end of the backing sequence
    pub fn push(&mut self, value: V) {
        self.map.push(self.tag.clone(), value);
    }

    /// Insert before the `index`-th tagged entry; `index == len` appends
    pub fn insert(&mut self, index: usize, value: V) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(Error::index(index, len));
        }
        match self.map.raw_position(&self.tag, index) {
            Some(position) => self.map.insert(position, self.tag.clone(), value),
            None => {
                self.map.push(self.tag.clone(), value);
                Ok(())
            }
        }
    }

    /// Remove the `index`-th tagged value
    pub fn remove(&mut self, index: usize) -> Result<V> {
        let position = self
            .map
            .raw_position(&self.tag, index)
            .ok_or_else(|| Error::index(index, self.len()))?;
        Ok(self.map.entries.remove(position).value)
    }

    /// Replace the `index`-th tagged value, returning the old one
    pub fn set(&mut self, index: usize, value: V) -> Result<V> {
        let len = self.len();
        let slot = self.get_mut(index).ok_or_else(|| Error::index(index, len))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Remove every tagged value, leaving other entries in place
    pub fn clear(&mut self) -> Vec<V> {
        let entries = std::mem::take(&mut self.map.entries);
        let mut removed = Vec::new();
        for entry in entries {
            if entry.tag == self.tag {
                removed.push(entry.value);
            } else {
                self.map.entries.push(entry);
            }
        }
        removed
    }
}

impl<V: ToSnapshot> Observed<'_, FeatureMap<V>> {
    /// Append an entry with an ADD notification
    pub fn push(&mut self, tag: QName, value: V) {
        let notification = self
            .notification(NotificationKind::Add)
            .with_new(Some(value.snapshot()))
            .with_position(self.target.len())
            .with_tag(tag.clone());
        self.target.push(tag, value);
        self.emit(notification);
    }

    /// Insert an entry with an ADD notification
    pub fn insert(&mut self, index: usize, tag: QName, value: V) -> Result<()> {
        let snapshot = value.snapshot();
        self.target.insert(index, tag.clone(), value)?;
        let notification = self
            .notification(NotificationKind::Add)
            .with_new(Some(snapshot))
            .with_position(index)
            .with_tag(tag);
        self.emit(notification);
        Ok(())
    }

    /// Remove an entry with a REMOVE notification
    pub fn remove(&mut self, index: usize) -> Result<Entry<V>> {
        let entry = self.target.remove(index)?;
        let notification = self
            .notification(NotificationKind::Remove)
            .with_old(Some(entry.value.snapshot()))
            .with_was_set(true)
            .with_position(index)
            .with_tag(entry.tag.clone());
        self.emit(notification);
        Ok(entry)
    }

    /// Clear with one REMOVE notification per entry
    pub fn clear(&mut self) -> Vec<Entry<V>> {
        let entries = self.target.clear();
        for (position, entry) in entries.iter().enumerate() {
            let notification = self
                .notification(NotificationKind::Remove)
                .with_old(Some(entry.value.snapshot()))
                .with_was_set(true)
                .with_position(position)
                .with_tag(entry.tag.clone());
            self.emit(notification);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notify::{Observable, Recorder};
    use pretty_assertions::assert_eq;

    fn tag(name: &str) -> QName {
        QName::wfs(name)
    }

    fn sample() -> FeatureMap<&'static str> {
        let mut map = FeatureMap::new();
        map.push(tag("Query"), "q1");
        map.push(tag("StoredQuery"), "s1");
        map.push(tag("Query"), "q2");
        map.push(tag("StoredQuery"), "s2");
        map
    }

    #[test]
    fn test_raw_order_and_filtered_view() {
        let map = sample();
        let raw: Vec<_> = map.iter().map(|e| e.value).collect();
        assert_eq!(raw, vec!["q1", "s1", "q2", "s2"]);

        let query = tag("Query");
        let queries: Vec<_> = map.list(&query).iter().copied().collect();
        assert_eq!(queries, vec!["q1", "q2"]);
        assert_eq!(map.list(&query).get(1), Some(&"q2"));
        assert_eq!(map.count(&tag("StoredQuery")), 2);
        assert_eq!(map.tags(), vec![&tag("Query"), &tag("StoredQuery")]);
    }

    #[test]
    fn test_view_insert_is_relative_to_tagged_entries() {
        let mut map = sample();
        map.list_mut(tag("StoredQuery")).insert(1, "s1b").unwrap();
        map.list_mut(tag("Query")).insert(2, "q3").unwrap();

        let raw: Vec<_> = map.iter().map(|e| e.value).collect();
        assert_eq!(raw, vec!["q1", "s1", "q2", "s1b", "s2", "q3"]);

        assert!(map.list_mut(tag("Query")).insert(5, "x").is_err());
    }

    #[test]
    fn test_view_remove_set_and_clear() {
        let mut map = sample();
        {
            let mut queries = map.list_mut(tag("Query"));
            assert_eq!(queries.set(1, "q2b").unwrap(), "q2");
            assert_eq!(queries.remove(0).unwrap(), "q1");
            assert!(matches!(queries.remove(4), Err(Error::Index { .. })));
        }
        let raw: Vec<_> = map.iter().map(|e| e.value).collect();
        assert_eq!(raw, vec!["s1", "q2b", "s2"]);

        let removed = map.list_mut(tag("StoredQuery")).clear();
        assert_eq!(removed, vec!["s1", "s2"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_set_single() {
        let mut map: FeatureMap<u64> = FeatureMap::new();
        assert_eq!(map.set_single(tag("Format"), 1), None);
        assert_eq!(map.set_single(tag("Format"), 2), Some(1));
        assert_eq!(map.first(&tag("Format")), Some(&2));
    }

    #[test]
    fn test_first_outlives_the_tag() {
        let map = sample();
        let found = {
            let stored = tag("StoredQuery");
            map.first(&stored)
        };
        assert_eq!(found, Some(&"s1"));
        assert_eq!(map.first(&tag("Missing")), None);
    }

    #[test]
    fn test_observed_map_notifications_carry_tags() {
        let recorder = Recorder::new();
        let mut map: FeatureMap<String> = FeatureMap::new();

        map.observed(&recorder, "group")
            .push(tag("Format"), "text/xml".to_string());
        map.observed(&recorder, "group")
            .push(tag("Format"), "application/json".to_string());
        map.observed(&recorder, "group").clear();

        let events = recorder.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].position, Some(1));
        assert_eq!(events[3].kind, NotificationKind::Remove);
        assert_eq!(events[3].tag, Some(tag("Format")));
    }
}
