//! Animal and certificate value types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "male",
            Self::Female => "female",
        })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        })
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// An adoptable animal.
///
/// Everything except `adopted` is fixed for the lifetime of the record. `adopted` only ever
/// moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Animal {
    /// Unique id, conventionally prefixed by species (`dog-001`, `cat-002`, ...)
    pub id: String,
    /// Display name; not unique
    pub name: String,
    pub species: String,
    pub breed: String,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    pub size: Size,
    pub color: String,
    pub description: String,
    pub vaccinated: bool,
    pub spayed_neutered: bool,
    pub good_with_kids: bool,
    pub good_with_pets: bool,
    pub energy_level: EnergyLevel,
    /// Fee in whole dollars
    pub adoption_fee: u32,
    pub date_arrived: NaiveDate,
    #[serde(default)]
    pub adopted: bool,
}

/// Proof of a successful adoption. Generated once per adoption and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct AdoptionCertificate {
    pub animal_id: String,
    pub timestamp: DateTime<Utc>,
    pub pickup_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Gender::Female).unwrap(), "female");
        assert_eq!(serde_json::to_value(Size::Large).unwrap(), "large");
        assert_eq!(serde_json::to_value(EnergyLevel::High).unwrap(), "high");
        assert_eq!(EnergyLevel::Low.to_string(), "low");
    }

    #[test]
    fn adopted_defaults_to_false() {
        let animal: Animal = serde_yaml::from_str(
            r"
id: test-001
name: TestPet
species: dog
breed: Test Breed
age: 3
gender: male
size: medium
color: brown
description: A test animal
vaccinated: true
spayed_neutered: true
good_with_kids: true
good_with_pets: true
energy_level: medium
adoption_fee: 200
date_arrived: 2024-01-01
",
        )
        .unwrap();

        assert!(!animal.adopted);
        assert_eq!(animal.date_arrived.to_string(), "2024-01-01");
    }

    #[test]
    fn unknown_enum_variant_is_rejected() {
        let err = serde_yaml::from_str::<Size>("huge").unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }
}
