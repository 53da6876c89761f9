use uuid::Uuid;

use super::{Combinator, FilterModel};

/// Insertion-ordered set of filters keyed by id, plus the combinator that
/// joins their clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCollection {
    filters: Vec<FilterModel>,
    combinator: Combinator,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn set_combinator(&mut self, combinator: Combinator) {
        self.combinator = combinator;
    }

    /// Adds a filter. A filter with the same id is replaced in place.
    pub fn add(&mut self, filter: FilterModel) {
        match self.filters.iter_mut().find(|f| f.id == filter.id) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&FilterModel> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut FilterModel> {
        self.filters.iter_mut().find(|f| f.id == id)
    }

    /// Removes and returns the filter with `id`.
    pub fn remove(&mut self, id: Uuid) -> Option<FilterModel> {
        let index = self.filters.iter().position(|f| f.id == id)?;
        Some(self.filters.remove(index))
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterModel> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterCollection {
    type Item = &'a FilterModel;
    type IntoIter = std::slice::Iter<'a, FilterModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

impl FromIterator<FilterModel> for FilterCollection {
    fn from_iter<I: IntoIterator<Item = FilterModel>>(iter: I) -> Self {
        let mut collection = Self::new();
        for filter in iter {
            collection.add(filter);
        }
        collection
    }
}
