//! Component storage
//!
//! A [`ComponentStore`] is a sparse set: components live densely packed in a
//! `Vec` for tight iteration, and a hash index maps entity id to slot for
//! O(1) lookup. Removal swap-removes, so iteration order depends only on
//! the sequence of inserts and removes (deterministic across runs).

use super::EntityId;
use std::collections::HashMap;

/// Sparse map from entity id to one kind of component
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    dense: Vec<(EntityId, T)>,
    index: HashMap<EntityId, usize>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a component, returning the one it replaced
    pub fn insert(&mut self, id: EntityId, component: T) -> Option<T> {
        if let Some(&slot) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.dense[slot].1, component));
        }
        self.index.insert(id, self.dense.len());
        self.dense.push((id, component));
        None
    }

    /// Remove a component; removing an absent id is a no-op
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.index.remove(&id)?;
        let (_, component) = self.dense.swap_remove(slot);
        if let Some((moved, _)) = self.dense.get(slot) {
            self.index.insert(*moved, slot);
        }
        Some(component)
    }

    /// Look up a component
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.index.get(&id).map(|&slot| &self.dense[slot].1)
    }

    /// Look up a component mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.dense[slot].1)
    }

    /// Whether `id` has this component
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterate `(id, component)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.dense.iter().map(|(id, c)| (*id, c))
    }

    /// Iterate `(id, component)` pairs mutably in storage order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.dense.iter_mut().map(|(id, c)| (*id, c))
    }

    /// Snapshot of the stored ids
    pub fn ids(&self) -> Vec<EntityId> {
        self.dense.iter().map(|(id, _)| *id).collect()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.dense.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut store = ComponentStore::new();
        assert!(store.insert(id(1), "a").is_none());
        assert_eq!(store.insert(id(1), "b"), Some("a"));
        assert_eq!(store.get(id(1)), Some(&"b"));
        assert_eq!(store.remove(id(1)), Some("b"));
        assert!(store.get(id(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_absent_lookup_is_none() {
        let store: ComponentStore<u32> = ComponentStore::new();
        assert!(store.get(id(42)).is_none());
        assert!(!store.contains(id(42)));
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let mut store = ComponentStore::new();
        for raw in 1..=5 {
            store.insert(id(raw), raw * 10);
        }
        store.remove(id(2));
        store.remove(id(99));

        assert_eq!(store.len(), 4);
        for raw in [1, 3, 4, 5] {
            assert_eq!(store.get(id(raw)), Some(&(raw * 10)));
        }
        *store.get_mut(id(5)).unwrap() = 7;
        assert_eq!(store.get(id(5)), Some(&7));
    }

    #[test]
    fn test_iteration_order_is_deterministic() {
        let build = || {
            let mut store = ComponentStore::new();
            for raw in 1..=6 {
                store.insert(id(raw), ());
            }
            store.remove(id(3));
            store.remove(id(1));
            store.ids()
        };
        assert_eq!(build(), build());
    }
}
