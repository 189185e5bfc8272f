use slotmap::{Key, SlotMap};

/// Generational storage that remembers insertion order.
///
/// Handles stay valid until their entry is removed; a removed handle never aliases a
/// later entry. Iteration and the `previous`/`next` navigation follow the order in
/// which entries were created.
#[derive(Debug, Clone)]
pub struct Registry<K: Key, V> {
    items: SlotMap<K, V>,
    order: Vec<K>,
}

impl<K: Key, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: V) -> K {
        let key = self.items.insert(value);
        self.order.push(key);
        key
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let value = self.items.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(value)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handles in creation order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    /// Entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.items.get(*key).map(|value| (*key, value)))
    }

    /// Entries in storage order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.items.values_mut()
    }

    pub fn first(&self) -> Option<K> {
        self.order.first().copied()
    }

    /// The entry created just before `key`. `None` when `key` is first or absent.
    pub fn previous(&self, key: K) -> Option<K> {
        let index = self.position(key)?;
        index.checked_sub(1).map(|i| self.order[i])
    }

    /// The entry created just after `key`. `None` when `key` is last or absent.
    pub fn next(&self, key: K) -> Option<K> {
        let index = self.position(key)?;
        self.order.get(index + 1).copied()
    }

    fn position(&self, key: K) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::DefaultKey;

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut registry: Registry<DefaultKey, &str> = Registry::new();
        let a = registry.insert("a");
        let b = registry.insert("b");
        let c = registry.insert("c");

        registry.remove(b);
        let d = registry.insert("d");

        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(keys, vec![a, c, d]);
        assert_eq!(registry.get(b), None);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_navigation() {
        let mut registry: Registry<DefaultKey, u32> = Registry::new();
        let a = registry.insert(1);
        let b = registry.insert(2);

        assert_eq!(registry.previous(a), None);
        assert_eq!(registry.previous(b), Some(a));
        assert_eq!(registry.next(a), Some(b));
        assert_eq!(registry.next(b), None);

        registry.remove(a);
        assert_eq!(registry.previous(a), None);
        assert_eq!(registry.previous(b), None);
    }
}
