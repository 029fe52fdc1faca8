use std::collections::HashMap;

/// A map from names to entries which iterates in insertion order. Replacing
/// an entry keeps its original position.
#[derive(Clone, Debug)]
pub(crate) struct OrderedMap<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts an entry, replacing any entry with the same name in place.
    pub fn insert(&mut self, name: &str, value: V) {
        match self.index.get(name) {
            Some(&position) => self.entries[position].1 = value,
            None => self.push(name, value),
        }
    }

    /// Inserts an entry unless one with the same name already exists.
    pub fn insert_if_absent(&mut self, name: &str, value: V) {
        if !self.index.contains_key(name) {
            self.push(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    fn push(&mut self, name: &str, value: V) {
        self.index.insert(name.to_owned(), self.entries.len());
        self.entries.push((name.to_owned(), value));
    }
}
