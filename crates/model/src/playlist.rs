use crate::item::ItemDescriptor;
use crate::properties::{AnnotatedProperties, Field};
use std::collections::HashMap;
use std::collections::HashSet;

/// One row of a [`Playlist`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub item: ItemDescriptor,
    pub properties: AnnotatedProperties,
}

/// An ordered collection of items keyed by title.
///
/// Titles are unique. Inserting a title that is already present replaces the
/// earlier entry (last write wins) but keeps the earlier entry's *position*,
/// so the listing order stays the upstream playlist order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Playlist {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item with [default](AnnotatedProperties::defaults)
    /// properties. Returns `true` if it replaced an existing title.
    pub fn insert(&mut self, item: ItemDescriptor) -> bool {
        let properties = AnnotatedProperties::defaults(&item.title);
        match self.index.get(&item.title) {
            Some(&position) => {
                self.entries[position] = Entry { item, properties };
                true
            },
            None => {
                self.index.insert(item.title.clone(), self.entries.len());
                self.entries.push(Entry { item, properties });
                false
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&Entry> {
        self.index.get(title).map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.entries.iter().map(|entry| &entry.item)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.item.title.as_str())
    }

    /// Drops an item from the batch.
    pub fn remove(&mut self, title: &str) -> Option<Entry> {
        let position = self.index.remove(title)?;
        let removed = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Applies an annotation result to one item: a match replaces its
    /// properties, `None` resets them to the defaults.
    pub fn annotate(&mut self, title: &str, properties: Option<AnnotatedProperties>) -> bool {
        let Some(&position) = self.index.get(title) else {
            return false;
        };
        let entry = &mut self.entries[position];
        entry.properties = properties.unwrap_or_else(|| AnnotatedProperties::defaults(&entry.item.title));
        true
    }

    /// Edits a single property of a single item.
    pub fn set(&mut self, title: &str, field: Field, value: impl Into<String>) -> bool {
        match self.index.get(title) {
            Some(&position) => {
                self.entries[position].properties.set(field, value);
                true
            },
            None => false,
        }
    }

    /// Sets one property to the same value on every item, returning how many
    /// items were touched.
    ///
    /// Song names are per-item by nature (they become the filenames), so
    /// [`Field::Song`] is refused and nothing changes.
    pub fn set_all(&mut self, field: Field, value: &str) -> usize {
        if field == Field::Song {
            return 0;
        }
        for entry in &mut self.entries {
            entry.properties.set(field, value);
        }
        self.entries.len()
    }

    /// Reverts every item to its default properties.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.properties = AnnotatedProperties::defaults(&entry.item.title);
        }
    }

    /// One filename stem per entry (in order), guaranteed distinct even when
    /// two songs sanitize to the same name or differ only in case. Later
    /// duplicates get a ` (2)`, ` (3)`, ... suffix.
    pub fn file_stems(&self) -> Vec<String> {
        let mut taken = HashSet::new();
        self.entries
            .iter()
            .map(|entry| {
                let base = entry.properties.file_stem();
                let mut stem = base.clone();
                let mut n = 1;
                while !taken.insert(stem.to_lowercase()) {
                    n += 1;
                    stem = format!("{base} ({n})");
                }
                stem
            })
            .collect()
    }
}

impl FromIterator<ItemDescriptor> for Playlist {
    fn from_iter<T: IntoIterator<Item = ItemDescriptor>>(iter: T) -> Self {
        let mut playlist = Self::new();
        for item in iter {
            playlist.insert(item);
        }
        playlist
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::UNKNOWN;

    fn item(title: &str, id: &str) -> ItemDescriptor {
        ItemDescriptor::new(title, id, 100)
    }

    #[test]
    fn test_duplicate_titles_last_write_wins() {
        let playlist: Playlist = [item("A", "1"), item("B", "2"), item("A", "3")].into_iter().collect();
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.titles().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(playlist.get("A").unwrap().item.external_id, "3");
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut playlist: Playlist = [item("A", "1"), item("B", "2"), item("C", "3")].into_iter().collect();
        assert_eq!(playlist.remove("A").unwrap().item.external_id, "1");
        assert!(playlist.remove("A").is_none());
        assert_eq!(playlist.get("C").unwrap().item.external_id, "3");
        assert!(playlist.set("C", Field::Genre, "Pop"));
        assert_eq!(playlist.get("C").unwrap().properties.genre, "Pop");
    }

    #[test]
    fn test_annotate_and_reset() {
        let mut playlist: Playlist = [item("A", "1")].into_iter().collect();
        let mut matched = AnnotatedProperties::defaults("Real Song");
        matched.artist = "Real Artist".into();
        assert!(playlist.annotate("A", Some(matched.clone())));
        assert_eq!(playlist.get("A").unwrap().properties, matched);
        assert!(!playlist.annotate("missing", None));

        playlist.reset();
        assert_eq!(playlist.get("A").unwrap().properties, AnnotatedProperties::defaults("A"));
    }

    #[test]
    fn test_set_all_skips_song() {
        let mut playlist: Playlist = [item("A", "1"), item("B", "2")].into_iter().collect();
        assert_eq!(playlist.set_all(Field::Album, "Mixtape"), 2);
        assert!(playlist.iter().all(|e| e.properties.album == "Mixtape"));
        assert_eq!(playlist.set_all(Field::Song, "Same"), 0);
        assert_eq!(playlist.titles().collect::<Vec<_>>(), ["A", "B"]);
        assert!(playlist.iter().all(|e| e.properties.artist == UNKNOWN));
    }

    #[test]
    fn test_file_stems_are_distinct() {
        let playlist: Playlist =
            [item("AC/DC", "1"), item("ACDC", "2"), item("acdc", "3"), item("Other", "4")].into_iter().collect();
        assert_eq!(playlist.file_stems(), ["ACDC", "ACDC (2)", "acdc (3)", "Other"]);
    }
}
