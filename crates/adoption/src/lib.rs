//! Animal catalog and adoption service.
//!
//! [`CatalogStore`] owns the animal records and answers lookups. [`AdoptionService`] wraps a
//! store and is the only component that mutates it.

pub mod catalog;
pub mod error;
pub mod model;
pub mod service;

pub use catalog::{CatalogCounts, CatalogStore};
pub use error::{AdoptionError, CatalogError};
pub use model::{AdoptionCertificate, Animal, EnergyLevel, Gender, Size};
pub use service::{AdoptionService, DEFAULT_PICKUP_LOCATION};
