//! Entity cache
//!
//! A flat vector scanned linearly by id. Collections are a page of rows, so
//! no index is kept.

use mailreach_common::types::Entity;
use mailreach_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCache<T> {
    items: Vec<T>,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(Entity::id).collect()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Replace the whole collection with a freshly fetched page
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Prepend a new entity. An entry with the same id is dropped first so
    /// ids stay unique. Returns true if the id was not cached before.
    pub fn prepend(&mut self, item: T) -> bool {
        let existed = match self.position(item.id()) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        };
        self.items.insert(0, item);
        !existed
    }

    /// Replace the entry with the same id in place, or prepend it
    pub fn upsert(&mut self, item: T) {
        match self.position(item.id()) {
            Some(index) => self.items[index] = item,
            None => self.items.insert(0, item),
        }
    }

    /// Mutate the entry with `id` in place. Returns false if it is not cached.
    pub fn update_with(&mut self, id: i64, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Remove the entry with `id`
    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.position(id).map(|index| self.items.remove(index))
    }
}

impl<T: Entity + Serialize + DeserializeOwned> EntityCache<T> {
    /// Shallow-merge `fields` into the entry with `id`.
    ///
    /// Returns `Ok(false)` when the id is not cached. On error the cached
    /// entry is left as it was.
    pub fn merge(&mut self, id: i64, fields: &Map<String, Value>) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        self.items[index] = merge_fields(&self.items[index], fields)?;
        Ok(true)
    }
}

/// Copy of `item` with the top-level `fields` overlaid. The id never changes.
///
/// Fields sent under an alias replace the field they stand for.
pub fn merge_fields<T>(item: &T, fields: &Map<String, Value>) -> Result<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(item)?;
    let Value::Object(current) = &mut value else {
        return Err(Error::Decode(format!("entity {} is not an object", item.id())));
    };

    let aliases = T::field_aliases();
    for (key, field) in fields {
        let name = aliases
            .iter()
            .find(|(alias, _)| *alias == key.as_str())
            .map_or(key.as_str(), |(_, name)| *name);
        if name != "id" {
            current.insert(name.to_string(), field.clone());
        }
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        #[serde(alias = "title")]
        name: String,
        #[serde(default)]
        active: bool,
    }

    impl Entity for Row {
        fn id(&self) -> i64 {
            self.id
        }

        fn field_aliases() -> &'static [(&'static str, &'static str)] {
            &[("title", "name")]
        }
    }

    fn row(id: i64, name: &str) -> Row {
        Row {
            id,
            name: name.to_string(),
            active: true,
        }
    }

    fn cache_of(n: i64) -> EntityCache<Row> {
        let mut cache = EntityCache::new();
        cache.replace_all((1..=n).map(|i| row(i, &format!("row {}", i))).collect());
        cache
    }

    #[test]
    fn test_prepend_grows_by_one_without_duplicates() {
        let mut cache = cache_of(3);
        assert!(cache.prepend(row(10, "new")));
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.items()[0].id, 10);

        assert!(!cache.prepend(row(2, "replaced")));
        assert_eq!(cache.len(), 4);
        let mut ids = cache.ids();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(cache.items()[0].name, "replaced");
    }

    #[test]
    fn test_merge_only_touches_target() {
        let mut cache = cache_of(3);
        let before = cache.clone();

        let fields = json!({"id": 2, "name": "renamed"});
        assert!(cache.merge(2, fields.as_object().unwrap()).unwrap());

        let merged = cache.get(2).unwrap();
        assert_eq!(merged.name, "renamed");
        assert!(merged.active);
        assert_eq!(cache.get(1), before.get(1));
        assert_eq!(cache.get(3), before.get(3));
    }

    #[test]
    fn test_merge_never_changes_id_and_skips_unknown() {
        let mut cache = cache_of(2);
        let fields = json!({"id": 99, "active": false});
        assert!(cache.merge(1, fields.as_object().unwrap()).unwrap());
        assert_eq!(cache.get(1).unwrap().id, 1);
        assert!(!cache.get(1).unwrap().active);

        assert!(!cache.merge(42, fields.as_object().unwrap()).unwrap());
    }

    #[test]
    fn test_merge_maps_alias_onto_field() {
        let mut cache = cache_of(2);
        let fields = json!({"id": 1, "title": "retitled", "active": false});
        assert!(cache.merge(1, fields.as_object().unwrap()).unwrap());

        let merged = cache.get(1).unwrap();
        assert_eq!(merged.name, "retitled");
        assert!(!merged.active);
        assert_eq!(cache.get(2).unwrap().name, "row 2");
    }

    #[test]
    fn test_merge_with_wrong_type_is_error() {
        let mut cache = cache_of(1);
        let fields = json!({"name": 5});
        assert!(matches!(
            cache.merge(1, fields.as_object().unwrap()),
            Err(Error::Decode(_))
        ));
        assert_eq!(cache.get(1).unwrap().name, "row 1");
    }

    #[test]
    fn test_remove() {
        let mut cache = cache_of(3);
        assert_eq!(cache.remove(2).map(|r| r.id), Some(2));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(2));
        assert!(cache.remove(2).is_none());
    }
}
