//! Adoption service: read queries plus the single-adoption invariant.

use crate::catalog::CatalogStore;
use crate::error::AdoptionError;
use crate::model::{AdoptionCertificate, Animal};
use chrono::Utc;
use std::sync::Arc;

/// Pickup location printed on every certificate unless overridden.
pub const DEFAULT_PICKUP_LOCATION: &str = "123 Main St, Anytown, USA";

/// Wraps a [`CatalogStore`] and is the only thing that mutates it.
#[derive(Debug, Clone)]
pub struct AdoptionService {
    store: Arc<CatalogStore>,
    pickup_location: String,
}

impl AdoptionService {
    #[must_use]
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            pickup_location: DEFAULT_PICKUP_LOCATION.to_string(),
        }
    }

    #[must_use]
    pub fn with_pickup_location(mut self, pickup_location: impl Into<String>) -> Self {
        self.pickup_location = pickup_location.into();
        self
    }

    #[must_use]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    #[must_use]
    pub fn pickup_location(&self) -> &str {
        &self.pickup_location
    }

    /// Animals still available for adoption.
    #[must_use]
    pub fn list_animals(&self) -> Vec<Animal> {
        self.store.list_available()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Animal> {
        let found = self.store.find_by_id(id);
        tracing::debug!(animal_id = %id, found = found.is_some(), "lookup by id");
        found
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Animal> {
        let found = self.store.find_by_name(name);
        tracing::debug!(
            animal_name = %name,
            animal_id = found.as_ref().map(|a| a.id.as_str()),
            "lookup by name"
        );
        found
    }

    /// Adopt the animal with `id`.
    ///
    /// The availability check and the flag flip happen under one write lock, so concurrent
    /// callers for the same id get exactly one certificate between them.
    ///
    /// # Errors
    ///
    /// Returns [`AdoptionError::NotFound`] if no record has `id`, or
    /// [`AdoptionError::AlreadyAdopted`] if it was adopted earlier.
    pub fn adopt(&self, id: &str) -> Result<AdoptionCertificate, AdoptionError> {
        let flipped = self.store.update(id, |animal| {
            if animal.adopted {
                false
            } else {
                animal.adopted = true;
                true
            }
        });

        match flipped {
            None => {
                tracing::debug!(animal_id = %id, "adoption refused: unknown id");
                Err(AdoptionError::NotFound { id: id.to_string() })
            }
            Some(false) => {
                tracing::debug!(animal_id = %id, "adoption refused: already adopted");
                Err(AdoptionError::AlreadyAdopted { id: id.to_string() })
            }
            Some(true) => {
                let certificate = AdoptionCertificate {
                    animal_id: id.to_string(),
                    timestamp: Utc::now(),
                    pickup_location: self.pickup_location.clone(),
                };
                tracing::info!(
                    animal_id = %id,
                    timestamp = %certificate.timestamp,
                    "animal adopted"
                );
                Ok(certificate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Barrier;

    fn service() -> AdoptionService {
        AdoptionService::new(Arc::new(CatalogStore::seeded().unwrap()))
    }

    fn available_ids(service: &AdoptionService) -> BTreeSet<String> {
        service.list_animals().into_iter().map(|a| a.id).collect()
    }

    #[test]
    fn adopting_max_removes_him_from_the_list() {
        let service = service();
        assert!(service.list_animals().iter().any(|a| a.name == "Max"));

        let certificate = service.adopt("dog-001").unwrap();
        assert_eq!(certificate.animal_id, "dog-001");
        assert_eq!(certificate.pickup_location, DEFAULT_PICKUP_LOCATION);

        assert!(!service.list_animals().iter().any(|a| a.name == "Max"));
        assert!(service.get_by_id("dog-001").unwrap().adopted);
        assert_eq!(
            service.adopt("dog-001"),
            Err(AdoptionError::AlreadyAdopted {
                id: "dog-001".to_string()
            })
        );
    }

    #[test]
    fn name_variants_resolve_to_the_same_record() {
        let service = service();
        let by_id = service.get_by_id("dog-001").unwrap();
        for query in ["MAX", "max", "Max"] {
            assert_eq!(service.get_by_name(query).as_ref(), Some(&by_id));
        }
    }

    #[test]
    fn unknown_ids_are_not_found_everywhere() {
        let service = service();
        for id in ["dog-999", "Max", "", "cat-001 "] {
            assert!(service.get_by_id(id).is_none());
            assert_eq!(
                service.adopt(id),
                Err(AdoptionError::NotFound { id: id.to_string() })
            );
        }
        assert_eq!(service.list_animals().len(), 8);
    }

    #[test]
    fn list_equals_all_minus_adopted() {
        let service = service();
        let all: BTreeSet<String> = service.store().snapshot().into_iter().map(|a| a.id).collect();
        let mut adopted = BTreeSet::new();

        for id in ["cat-002", "nope", "rabbit-001", "cat-002", "dog-004", "dog-004"] {
            if service.adopt(id).is_ok() {
                adopted.insert(id.to_string());
            }
            let expected: BTreeSet<String> = all.difference(&adopted).cloned().collect();
            assert_eq!(available_ids(&service), expected);
        }

        assert_eq!(adopted.len(), 3);
        assert_eq!(service.store().counts().adopted, 3);
    }

    #[test]
    fn pickup_location_can_be_overridden() {
        let service = service().with_pickup_location("42 Shelter Lane");
        let certificate = service.adopt("cat-003").unwrap();
        assert_eq!(certificate.pickup_location, "42 Shelter Lane");
    }

    #[test]
    fn clones_share_the_same_catalog() {
        let a = service();
        let b = a.clone();
        a.adopt("dog-002").unwrap();
        assert!(b.adopt("dog-002").is_err());
    }

    #[test]
    fn concurrent_adoption_issues_exactly_one_certificate() {
        const CALLERS: usize = 16;
        let service = service();
        let barrier = Barrier::new(CALLERS);

        let results: Vec<Result<AdoptionCertificate, AdoptionError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        service.adopt("cat-001")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("adopt thread panicked"))
                .collect()
        });

        let certificates = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(certificates, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, AdoptionError::AlreadyAdopted { .. }))
        );
        assert!(service.get_by_id("cat-001").unwrap().adopted);
    }
}
