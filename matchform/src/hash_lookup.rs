//! Bidirectional mapping between column names and their ordinal position in a feature vector.

use std::hash::Hash;
use std::ops::Index;

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("duplicate item at index {index}, previously at {existing_index}")]
pub struct DuplicateItem {
    pub index: usize,
    pub existing_index: usize,
}

#[derive(Debug, Clone)]
pub struct HashLookup<T: Eq + Hash> {
    item_to_index: FxHashMap<T, usize>,
    index_to_item: Vec<T>,
}
impl<T: Eq + Hash + Clone> HashLookup<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            item_to_index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            index_to_item: Vec::with_capacity(capacity),
        }
    }

    /// Appends a unique item, returning its assigned index.
    pub fn push(&mut self, item: T) -> Result<usize, DuplicateItem> {
        let index = self.index_to_item.len();
        if let Some(&existing_index) = self.item_to_index.get(&item) {
            return Err(DuplicateItem {
                index,
                existing_index,
            });
        }
        self.item_to_index.insert(item.clone(), index);
        self.index_to_item.push(item);
        Ok(index)
    }

    pub fn try_from_vec(items: Vec<T>) -> Result<Self, DuplicateItem> {
        let mut lookup = Self::with_capacity(items.len());
        for item in items {
            lookup.push(item)?;
        }
        Ok(lookup)
    }
}

impl<T: Eq + Hash> HashLookup<T> {
    pub fn item_at(&self, index: usize) -> Option<&T> {
        self.index_to_item.get(index)
    }

    pub fn index_of<Q>(&self, item: &Q) -> Option<usize>
    where
        T: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.item_to_index.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.index_to_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_item.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.index_to_item
    }
}

impl<T: Eq + Hash> PartialEq for HashLookup<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index_to_item == other.index_to_item
    }
}

impl<T: Eq + Hash> Index<usize> for HashLookup<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.item_at(index)
            .unwrap_or_else(|| panic!("no item at index {index}"))
    }
}
