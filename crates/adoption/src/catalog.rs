//! In-memory catalog of animal records.

use crate::error::{CatalogError, Result};
use crate::model::Animal;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Seed catalog embedded at build time.
const SEED_CATALOG: &str = include_str!("../seed/animals.yaml");

/// Aggregate availability counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub total: usize,
    pub available: usize,
    pub adopted: usize,
}

/// Owns the animal records in insertion order.
///
/// Lookups clone records out of the store; the store itself never changes a record. The only
/// write path is [`CatalogStore::update`], used by the adoption service.
#[derive(Debug)]
pub struct CatalogStore {
    records: RwLock<Vec<Animal>>,
}

impl CatalogStore {
    /// Build a store from owned records.
    ///
    /// # Errors
    ///
    /// Returns an error if any id is empty or appears more than once.
    pub fn new(records: Vec<Animal>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for (idx, animal) in records.iter().enumerate() {
            if animal.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(idx));
            }
            if !seen.insert(animal.id.as_str()) {
                return Err(CatalogError::DuplicateId(animal.id.clone()));
            }
        }

        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Build a store from the embedded seed catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to parse or validate.
    pub fn seeded() -> Result<Self> {
        Self::from_yaml_str(SEED_CATALOG)
    }

    /// Parse a YAML (or JSON) sequence of animal records.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or the ids are invalid.
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        let records: Vec<Animal> = serde_yaml::from_str(doc)?;
        Self::new(records)
    }

    /// Load a catalog file. JSON is accepted as well since it parses as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = std::fs::read_to_string(path)?;
        let store = Self::from_yaml_str(&doc)?;
        tracing::debug!(path = %path.display(), records = store.len(), "loaded catalog file");
        Ok(store)
    }

    /// All records not yet adopted, in insertion order.
    #[must_use]
    pub fn list_available(&self) -> Vec<Animal> {
        self.records
            .read()
            .iter()
            .filter(|a| !a.adopted)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<Animal> {
        self.records.read().iter().find(|a| a.id == id).cloned()
    }

    /// Case-insensitive name lookup. When several records share a name, the first in insertion
    /// order wins.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Animal> {
        let wanted = name.to_lowercase();
        self.records
            .read()
            .iter()
            .find(|a| a.name.to_lowercase() == wanted)
            .cloned()
    }

    /// Every record, adopted or not.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Animal> {
        self.records.read().clone()
    }

    #[must_use]
    pub fn counts(&self) -> CatalogCounts {
        let records = self.records.read();
        let adopted = records.iter().filter(|a| a.adopted).count();
        CatalogCounts {
            total: records.len(),
            available: records.len() - adopted,
            adopted,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Run `f` against the record with `id` while holding the write lock.
    ///
    /// Returns `None` if no record has that id.
    pub(crate) fn update<R>(&self, id: &str, f: impl FnOnce(&mut Animal) -> R) -> Option<R> {
        let mut records = self.records.write();
        records.iter_mut().find(|a| a.id == id).map(f)
    }
}
