//! Plain-text rendering of tool results for the calling agent.

use animal_rescue_adoption::{AdoptionCertificate, Animal};
use std::fmt::Write as _;

fn yes_no(v: bool) -> &'static str {
    if v { "Yes" } else { "No" }
}

pub(crate) fn missing_argument(field: &str) -> String {
    format!("Error: {field} is required")
}

pub(crate) fn animal_list(animals: &[Animal]) -> String {
    if animals.is_empty() {
        return "No animals are currently available for adoption.".to_string();
    }

    let mut out = String::from("Available animals for adoption:\n");
    for a in animals {
        let _ = write!(
            out,
            "\n• {} ({}) - {}, Age: {}",
            a.name, a.species, a.breed, a.age
        );
    }
    out
}

pub(crate) fn animal_details(a: &Animal) -> String {
    format!(
        "Animal Details:\n\n\
         ID: {}\n\
         Name: {}\n\
         Species: {}\n\
         Breed: {}\n\
         Age: {} years\n\
         Gender: {}\n\
         Size: {}\n\
         Color: {}\n\
         Description: {}\n\
         Vaccinated: {}\n\
         Spayed/Neutered: {}\n\
         Good with kids: {}\n\
         Good with pets: {}\n\
         Energy level: {}\n\
         Adoption fee: ${}\n\
         Date arrived: {}\n\
         Status: {}",
        a.id,
        a.name,
        a.species,
        a.breed,
        a.age,
        a.gender,
        a.size,
        a.color,
        a.description,
        yes_no(a.vaccinated),
        yes_no(a.spayed_neutered),
        yes_no(a.good_with_kids),
        yes_no(a.good_with_pets),
        a.energy_level,
        a.adoption_fee,
        a.date_arrived,
        if a.adopted { "adopted" } else { "available" },
    )
}

pub(crate) fn animal_summary(a: &Animal) -> String {
    format!(
        "Found animal: {}\n\
         ID: {}\n\
         Species: {}\n\
         Breed: {}\n\
         Age: {} years\n\
         Description: {}\n\
         Adoption fee: ${}",
        a.name, a.id, a.species, a.breed, a.age, a.description, a.adoption_fee,
    )
}

pub(crate) fn not_found_by_id(id: &str) -> String {
    format!("No animal found with ID: {id}")
}

pub(crate) fn not_found_by_name(name: &str) -> String {
    format!("No animal found with name: {name}")
}

pub(crate) fn not_found_by_id_or_name(input: &str) -> String {
    format!("No animal found with name or ID: {input}")
}

pub(crate) fn name_resolved(input: &str, id: &str) -> String {
    format!("Found '{input}' -> ID: {id}\n\n")
}

pub(crate) fn certificate(c: &AdoptionCertificate) -> String {
    format!(
        "🎉 Adoption successful!\n\n\
         Adoption Certificate:\n\
         Animal ID: {}\n\
         Adoption Date: {}\n\
         Pickup Location: {}\n\n\
         Congratulations on your new pet!",
        c.animal_id,
        c.timestamp.to_rfc3339(),
        c.pickup_location,
    )
}

pub(crate) fn adoption_failed(id: &str) -> String {
    format!(
        "Unable to adopt animal with ID: {id}. Animal may not exist or may already be adopted."
    )
}
