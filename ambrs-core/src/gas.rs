//! Gas species reference data

use serde::{Deserialize, Serialize};

/// A gas-phase species.
///
/// Species are reference data: they are looked up by name and never mutated
/// once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpecies {
    /// Unique name of the species
    pub name: String,
    /// Molar mass (g/mol)
    pub molar_mass: f64,
}

impl GasSpecies {
    pub fn new(name: impl Into<String>, molar_mass: f64) -> Self {
        Self {
            name: name.into(),
            molar_mass,
        }
    }
}
