// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolution of external graphic sources to bytes.
//!
//! Fetching is a collaborator concern: the caches only need a
//! [`ResourceResolver`]. [`NoResources`] resolves nothing (every external
//! graphic falls back), [`MemoryResources`] serves a fixed table.

use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::ResourceError;

/// Resolves an external graphic URI to its bytes.
pub trait ResourceResolver: fmt::Debug + Send + Sync {
    /// Fetches the bytes behind `uri`.
    fn fetch(&self, uri: &str) -> Result<Arc<[u8]>, ResourceError>;
}

/// A resolver that knows no resources.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResources;

impl ResourceResolver for NoResources {
    fn fetch(&self, uri: &str) -> Result<Arc<[u8]>, ResourceError> {
        Err(ResourceError::NotFound(uri.to_owned()))
    }
}

/// A resolver backed by an in-memory table.
#[derive(Clone, Debug, Default)]
pub struct MemoryResources {
    entries: FxHashMap<String, Arc<[u8]>>,
}

impl MemoryResources {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` under `uri`.
    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(uri.into(), bytes.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(uri, bytes);
        self
    }
}

impl ResourceResolver for MemoryResources {
    fn fetch(&self, uri: &str) -> Result<Arc<[u8]>, ResourceError> {
        self.entries
            .get(uri)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(uri.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_resources_lookup() {
        let res = MemoryResources::new().with("mem://a", vec![1_u8, 2, 3]);
        assert_eq!(&*res.fetch("mem://a").unwrap(), &[1, 2, 3]);
        assert_eq!(
            res.fetch("mem://b"),
            Err(ResourceError::NotFound(String::from("mem://b")))
        );
        assert!(NoResources.fetch("mem://a").is_err());
    }
}
