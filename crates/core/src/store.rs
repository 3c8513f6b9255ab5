//! Keyed record storage.
//!
//! Business layers never issue raw queries; they load whole records by id or
//! by predicate and decide on the loaded snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::Entity;

/// Keyed record store abstraction.
pub trait RecordStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V);
    /// All records, ordered by key.
    fn list(&self) -> Vec<V>;

    /// Upsert a record under its own id.
    fn save(&self, record: V)
    where
        V: Entity<Id = K>,
    {
        let id = record.id();
        self.upsert(id, record);
    }

    /// First record matching `pred`, in key order.
    fn find(&self, pred: &dyn Fn(&V) -> bool) -> Option<V> {
        self.list().into_iter().find(|v| pred(v))
    }

    /// Every record matching `pred`, in key order.
    fn filter(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        self.list().into_iter().filter(|v| pred(v)).collect()
    }
}

impl<K, V, S> RecordStore<K, V> for Arc<S>
where
    S: RecordStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert(&self, key: K, value: V) {
        (**self).upsert(key, value)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }
}

/// In-memory store for tests/dev and the demo binary.
#[derive(Debug)]
pub struct InMemoryRecordStore<K, V> {
    inner: RwLock<BTreeMap<K, V>>,
}

impl<K, V> InMemoryRecordStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryRecordStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecordStore<K, V> for InMemoryRecordStore<K, V>
where
    K: Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key, value);
        }
    }

    fn list(&self) -> Vec<V> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_and_list_is_key_ordered() {
        let store: InMemoryRecordStore<u32, &'static str> = InMemoryRecordStore::new();
        store.upsert(2, "b");
        store.upsert(1, "a");
        store.upsert(2, "B");

        assert_eq!(store.get(&2), Some("B"));
        assert_eq!(store.list(), vec!["a", "B"]);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        text: &'static str,
    }

    impl Entity for Note {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn save_keys_by_entity_id() {
        let store: Box<dyn RecordStore<u32, Note>> = Box::new(InMemoryRecordStore::new());
        store.save(Note { id: 7, text: "first" });
        store.save(Note { id: 7, text: "second" });

        assert_eq!(store.list(), vec![Note { id: 7, text: "second" }]);
    }

    #[test]
    fn find_and_filter_use_predicate() {
        let store = Arc::new(InMemoryRecordStore::<u32, u32>::new());
        for i in 0..6 {
            store.upsert(i, i * 10);
        }

        assert_eq!(store.find(&|v| *v > 25), Some(30));
        assert_eq!(store.filter(&|v| v % 20 == 0), vec![0, 20, 40]);
        assert_eq!(store.find(&|v| *v > 100), None);
    }
}
