// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Required attribute sets.
//!
//! A loader asks the caches which feature attributes their dynamic parts read
//! so it can skip everything else. Sets are built once during evaluation with
//! an [`AttributeSetBuilder`] and then frozen into an immutable, cheaply
//! cloneable [`RequiredAttributes`].

use std::collections::BTreeSet;
use std::sync::Arc;

/// An immutable set of attribute names.
///
/// The empty set is [`RequiredAttributes::EMPTY`] and never allocates.
/// Iteration order is sorted and therefore deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequiredAttributes(Option<Arc<BTreeSet<Arc<str>>>>);

impl RequiredAttributes {
    /// The shared empty set.
    pub const EMPTY: Self = Self(None);

    /// Returns `true` if no attribute is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |set| set.len())
    }

    /// Returns `true` if `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.as_ref().is_some_and(|set| set.contains(name))
    }

    /// Iterates over the names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().flat_map(|set| set.iter().map(|n| &**n))
    }

    /// Returns the names as owned strings (sorted).
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }
}

impl<'a> IntoIterator for &'a RequiredAttributes {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Mutable accumulator for attribute names.
#[derive(Clone, Debug, Default)]
pub struct AttributeSetBuilder {
    names: BTreeSet<Arc<str>>,
}

impl AttributeSetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one name.
    pub fn insert(&mut self, name: Arc<str>) {
        self.names.insert(name);
    }

    /// Adds every name of a frozen set.
    pub fn extend(&mut self, other: &RequiredAttributes) {
        if let Some(set) = &other.0 {
            self.names.extend(set.iter().cloned());
        }
    }

    /// Returns `true` if nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Freezes the builder. An empty builder yields
    /// [`RequiredAttributes::EMPTY`].
    #[must_use]
    pub fn freeze(self) -> RequiredAttributes {
        if self.names.is_empty() {
            RequiredAttributes::EMPTY
        } else {
            RequiredAttributes(Some(Arc::new(self.names)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_shared_empty() {
        let set = AttributeSetBuilder::new().freeze();
        assert_eq!(set, RequiredAttributes::EMPTY);
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn union_is_sorted_and_unique() {
        let mut a = AttributeSetBuilder::new();
        a.insert(Arc::from("width_mm"));
        a.insert(Arc::from("pop"));
        let a = a.freeze();

        let mut b = AttributeSetBuilder::new();
        b.insert(Arc::from("pop"));
        b.extend(&a);
        b.extend(&RequiredAttributes::EMPTY);
        let b = b.freeze();

        assert_eq!(b.to_vec(), ["pop", "width_mm"]);
        assert!(b.contains("pop"));
        assert!(!b.contains("name"));
    }
}
