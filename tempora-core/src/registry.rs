//! Operator implementation registries

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Maps operator keys to implementations of one backend.
///
/// Registries are plain values: build one at startup and pass it to
/// evaluation.
pub struct Registry<I: ?Sized> {
    implementations: BTreeMap<&'static str, Arc<I>>,
}

impl<I: ?Sized> Registry<I> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            implementations: BTreeMap::new(),
        }
    }

    /// Register `implementation` under `key`, replacing any previous one
    pub fn register(&mut self, key: &'static str, implementation: Arc<I>) -> &mut Self {
        self.implementations.insert(key, implementation);
        self
    }

    /// Get the implementation registered under `key`
    pub fn get(&self, key: &str) -> Result<&Arc<I>> {
        self.implementations.get(key).ok_or_else(|| {
            Error::Unsupported(format!("No implementation registered for operator \"{key}\""))
        })
    }

    /// Check if `key` has an implementation
    pub fn contains(&self, key: &str) -> bool {
        self.implementations.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.implementations.keys().copied()
    }

    /// Number of registered implementations
    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

impl<I: ?Sized> Default for Registry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> fmt::Debug for Registry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.implementations.keys().collect::<Vec<_>>())
            .finish()
    }
}
