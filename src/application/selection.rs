//! Selection Model
//!
//! Tracks selected rows by their stable identity key, independent of which
//! pages are loaded. Pages being discarded never prune the selection; only
//! [`SelectionSet::clear`] does.

use std::collections::BTreeSet;

use crate::domain::Identified;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership; returns whether `id` is selected afterwards
    pub fn toggle(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn toggle_item<T: Identified>(&mut self, item: &T) -> bool {
        self.toggle(item.identity())
    }

    /// Add every given id. Ids already selected stay selected.
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(ids.into_iter().map(Into::into));
    }

    pub fn select_all_items<'a, T, I>(&mut self, items: I)
    where
        T: Identified + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.select_all(items.into_iter().map(Identified::identity));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_item_selected<T: Identified>(&self, item: &T) -> bool {
        self.is_selected(&item.identity())
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Confirm actions ("add N students") need at least one row
    pub fn can_confirm(&self) -> bool {
        !self.is_empty()
    }

    /// Selected ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Room;
    use serde_json::json;

    fn room(id: i64) -> Room {
        Room {
            id,
            name: format!("Room {id}"),
            capacity: None,
            has_piano: true,
        }
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        assert!(!selection.can_confirm());

        assert!(selection.toggle("s-1"));
        assert!(selection.is_selected("s-1"));
        assert!(selection.can_confirm());

        assert!(!selection.toggle("s-1"));
        assert!(!selection.is_selected("s-1"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_then_clear_is_empty() {
        let mut selection = SelectionSet::new();
        let loaded: Vec<Room> = (1..=25).map(room).collect();

        selection.toggle_item(&loaded[3]);
        selection.select_all_items(&loaded);
        assert_eq!(selection.len(), 25);

        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.can_confirm());
    }

    #[test]
    fn test_identity_is_entity_key() {
        let mut selection = SelectionSet::new();
        let record = json!({"id": "stu-42", "name": "Mei"});

        selection.toggle_item(&record);
        assert!(selection.is_selected("stu-42"));
        assert!(selection.is_item_selected(&json!({"id": "stu-42", "name": "renamed"})));

        selection.select_all(["stu-7", "stu-42"]);
        let ids: Vec<&str> = selection.ids().collect();
        assert_eq!(ids, ["stu-42", "stu-7"]);
    }
}
