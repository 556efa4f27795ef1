//! TOML configuration for ensembles and runs
//!
//! An ensemble configuration declares species in tables keyed by name and
//! lets modes refer to them by name. Leaves are either bare numbers (held
//! fixed) or distribution tables tagged with their family:
//!
//! ```toml
//! name = "aitken_only"
//! size = 50
//! method = "lhs"
//! seed = 42
//!
//! flux = 0.0
//! relative_humidity = { type = "uniform", low = 0.1, high = 0.9 }
//! temperature = 298.0
//! pressure = 101325.0
//! height = 500.0
//!
//! [aerosols.so4]
//! molar_mass = 97.071
//! density = 1770.0
//! hygroscopicity = 0.507
//!
//! [gases.so2]
//! molar_mass = 64.07
//!
//! [gas_concs]
//! so2 = { type = "log_uniform", low = 1e3, high = 1e6 }
//!
//! [[modes]]
//! name = "aitken"
//! species = ["so4"]
//! number = { type = "log_uniform", low = 3e7, high = 2e12 }
//! geom_mean_diam = 1e-7
//! log10_geom_std_dev = 0.2041
//! mass_fractions = [1.0]
//! ```

use crate::aerosol::{
    AerosolModalSizeDistribution, AerosolModeDistribution, AerosolProcesses, AerosolSpecies,
};
use crate::distribution::Parameter;
use crate::errors::{AmbrsError, AmbrsResult};
use crate::gas::GasSpecies;
use crate::input::ScenarioInputBuilder;
use crate::ppe::{EnsembleSpecification, SamplingMethod};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolSpeciesConfig {
    pub molar_mass: f64,
    pub density: f64,
    pub hygroscopicity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpeciesConfig {
    pub molar_mass: f64,
}

/// A mode whose species are referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    pub species: Vec<String>,
    pub number: Parameter,
    pub geom_mean_diam: Parameter,
    pub log10_geom_std_dev: Parameter,
    pub mass_fractions: Vec<Parameter>,
}

/// How to run the simulator over an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Path to the simulator executable
    pub executable: PathBuf,
    /// Command template containing `{exe}` and `{prefix}`
    pub invocation: String,
    /// Directory holding one subdirectory per job
    pub root: PathBuf,
    /// Maximum concurrent processes, defaults to the available threads
    pub max_workers: Option<usize>,
    pub job_timeout_secs: Option<f64>,
    pub timeout_secs: Option<f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::new(),
            invocation: "{exe} {prefix}".to_string(),
            root: PathBuf::from("runs"),
            max_workers: None,
            job_timeout_secs: None,
            timeout_secs: None,
        }
    }
}

fn default_name() -> String {
    "ensemble".to_string()
}

fn default_size() -> usize {
    100
}

fn default_dt() -> f64 {
    1.0
}

fn default_nstep() -> usize {
    1
}

/// A complete ensemble study: the specification, how to sample it and how to run it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of members to draw
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub method: SamplingMethod,
    /// Seed for reproducible sampling
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub processes: AerosolProcesses,
    /// Simulation timestep (s)
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_nstep")]
    pub nstep: usize,

    pub aerosols: IndexMap<String, AerosolSpeciesConfig>,
    #[serde(default)]
    pub gases: IndexMap<String, GasSpeciesConfig>,
    pub modes: Vec<ModeConfig>,
    /// Gas concentration leaves keyed by gas name
    #[serde(default)]
    pub gas_concs: IndexMap<String, Parameter>,
    pub flux: Parameter,
    pub relative_humidity: Parameter,
    pub temperature: Parameter,
    pub pressure: Parameter,
    pub height: Parameter,

    #[serde(default)]
    pub runner: Option<RunnerConfig>,
}

impl EnsembleConfig {
    pub fn from_toml_str(contents: &str) -> AmbrsResult<Self> {
        toml::from_str(contents)
            .map_err(|e| AmbrsError::Config(format!("invalid ensemble configuration: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> AmbrsResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            AmbrsError::Config(message) => {
                AmbrsError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// The RNG used for sampling: seeded if a seed is configured.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn input_builder(&self) -> AmbrsResult<ScenarioInputBuilder> {
        ScenarioInputBuilder::new(self.dt, self.nstep)
    }

    /// Resolve species names and build the specification.
    ///
    /// Species keep the order in which their tables appear.
    pub fn into_specification(self) -> AmbrsResult<EnsembleSpecification> {
        let aerosols: Vec<AerosolSpecies> = self
            .aerosols
            .iter()
            .map(|(name, props)| {
                AerosolSpecies::new(
                    name.as_str(),
                    props.molar_mass,
                    props.density,
                    props.hygroscopicity,
                )
            })
            .collect();
        let gases: Vec<GasSpecies> = self
            .gases
            .iter()
            .map(|(name, props)| GasSpecies::new(name.as_str(), props.molar_mass))
            .collect();

        let modes = self
            .modes
            .into_iter()
            .map(|mode| {
                let species = mode
                    .species
                    .iter()
                    .map(|name| {
                        aerosols
                            .iter()
                            .find(|s| &s.name == name)
                            .cloned()
                            .ok_or_else(|| {
                                AmbrsError::Config(format!(
                                    "mode '{}' refers to unknown aerosol species '{}'",
                                    mode.name, name
                                ))
                            })
                    })
                    .collect::<AmbrsResult<Vec<_>>>()?;
                AerosolModeDistribution::new(
                    mode.name,
                    species,
                    mode.number,
                    mode.geom_mean_diam,
                    mode.log10_geom_std_dev,
                    mode.mass_fractions,
                )
            })
            .collect::<AmbrsResult<Vec<_>>>()?;

        if let Some(unknown) = self
            .gas_concs
            .keys()
            .find(|name| !self.gases.contains_key(*name))
        {
            return Err(AmbrsError::Config(format!(
                "gas concentration given for unknown gas '{}'",
                unknown
            )));
        }
        let gas_concs = gases
            .iter()
            .map(|gas| {
                self.gas_concs.get(&gas.name).cloned().ok_or_else(|| {
                    AmbrsError::Config(format!("no concentration given for gas '{}'", gas.name))
                })
            })
            .collect::<AmbrsResult<Vec<_>>>()?;

        EnsembleSpecification::new(
            self.name,
            aerosols,
            gases,
            AerosolModalSizeDistribution::new(modes)?,
            gas_concs,
            self.flux,
            self.relative_humidity,
            self.temperature,
            self.pressure,
            self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppe::sample_ensemble;
    use is_close::is_close;

    const CONFIG: &str = r#"
name = "two_mode"
size = 20
method = "random"
seed = 7
dt = 30.0
nstep = 120

flux = { type = "log_uniform", low = 1e-11, high = 1e-8 }
relative_humidity = { type = "uniform", low = 0.1, high = 0.99 }
temperature = { type = "uniform", low = 240, high = 310 }
pressure = 101325
height = 500.0

[processes]
coagulation = true
condensation = true

[aerosols.so4]
molar_mass = 97.071
density = 1770.0
hygroscopicity = 0.507

[aerosols.soa]
molar_mass = 12.01
density = 1000.0
hygroscopicity = 0.5

[aerosols.ncl]
molar_mass = 58.44
density = 1000.0
hygroscopicity = 0.5

[gases.so2]
molar_mass = 64.07

[gases.h2so4]
molar_mass = 98.079

[gas_concs]
h2so4 = 1e5
so2 = { type = "uniform", low = 1e5, high = 1.1e6 }

[[modes]]
name = "accumulation"
species = ["so4", "soa", "ncl"]
number = { type = "log_uniform", low = 3e7, high = 2e12 }
geom_mean_diam = { type = "log_uniform", low = 0.5e-7, high = 1.1e-7 }
log10_geom_std_dev = 0.2041
mass_fractions = [
    { type = "uniform", low = 0, high = 1 },
    { type = "uniform", low = 0, high = 1 },
    0.5,
]

[[modes]]
name = "aitken"
species = ["ncl", "so4"]
number = { type = "empirical", values = [1e8, 5e8, 1e9] }
geom_mean_diam = { type = "log_uniform", low = 0.5e-8, high = 3e-8 }
log10_geom_std_dev = 0.2041
mass_fractions = [0.5, 0.5]

[runner]
executable = "/usr/local/bin/box_model"
invocation = "{exe} {prefix}.toml"
max_workers = 4
"#;

    #[test]
    fn parse_config() {
        let config = EnsembleConfig::from_toml_str(CONFIG).unwrap();

        assert_eq!(config.name, "two_mode");
        assert_eq!(config.size, 20);
        assert_eq!(config.method, SamplingMethod::Random);
        assert_eq!(config.seed, Some(7));
        assert!(config.processes.coagulation);
        assert!(!config.processes.nucleation);
        assert_eq!(
            config.aerosols.keys().collect::<Vec<_>>(),
            vec!["so4", "soa", "ncl"]
        );

        let runner = config.runner.as_ref().unwrap();
        assert_eq!(runner.max_workers, Some(4));
        assert_eq!(runner.root, PathBuf::from("runs"));
        assert_eq!(runner.timeout_secs, None);

        let builder = config.input_builder().unwrap();
        assert!(is_close!(builder.dt, 30.0));
        assert_eq!(builder.nstep, 120);
    }

    #[test]
    fn resolve_specification() {
        let specification = EnsembleConfig::from_toml_str(CONFIG)
            .unwrap()
            .into_specification()
            .unwrap();

        assert_eq!(specification.name, "two_mode");
        assert_eq!(specification.size.modes.len(), 2);
        let aitken = &specification.size.modes[1];
        assert_eq!(aitken.species[0].name, "ncl");
        assert!(is_close!(aitken.species[1].density, 1770.0));

        // gas concentrations follow the order of the gas tables
        assert_eq!(specification.gases[0].name, "so2");
        assert!(!specification.gas_concs[0].is_fixed());
        assert!(matches!(specification.gas_concs[1], Parameter::Fixed(c) if c == 1e5));
        assert!(matches!(specification.pressure, Parameter::Fixed(p) if p == 101325.0));
    }

    #[test]
    fn seeded_config_samples_reproducibly() {
        let config = EnsembleConfig::from_toml_str(CONFIG).unwrap();
        let specification = config.clone().into_specification().unwrap();

        let a = sample_ensemble(&specification, config.size, config.method, &mut config.rng())
            .unwrap();
        let b = sample_ensemble(&specification, config.size, config.method, &mut config.rng())
            .unwrap();

        assert_eq!(a.len(), 20);
        assert_eq!(a.temperature(), b.temperature());
        for member in &a {
            let number = member.size.modes[1].number;
            assert!((1e8..=1e9).contains(&number));
            assert_eq!(member.size.modes[0].mass_fractions.len(), 3);
        }
    }

    #[test]
    fn unknown_species_rejected() {
        let contents = CONFIG.replace(r#"species = ["ncl", "so4"]"#, r#"species = ["ncl", "dst"]"#);
        let result = EnsembleConfig::from_toml_str(&contents)
            .unwrap()
            .into_specification();
        match result {
            Err(AmbrsError::Config(message)) => assert!(message.contains("dst")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn gas_concentrations_must_match_gases() {
        let missing = CONFIG.replace("h2so4 = 1e5\n", "");
        assert!(matches!(
            EnsembleConfig::from_toml_str(&missing)
                .unwrap()
                .into_specification(),
            Err(AmbrsError::Config(_))
        ));

        let extra = CONFIG.replace("h2so4 = 1e5\n", "h2so4 = 1e5\nsoag = 1e6\n");
        assert!(matches!(
            EnsembleConfig::from_toml_str(&extra)
                .unwrap()
                .into_specification(),
            Err(AmbrsError::Config(_))
        ));
    }

    #[test]
    fn invalid_toml() {
        assert!(matches!(
            EnsembleConfig::from_toml_str("name = "),
            Err(AmbrsError::Config(_))
        ));
        // modes are required
        assert!(matches!(
            EnsembleConfig::from_toml_str("name = \"empty\""),
            Err(AmbrsError::Config(_))
        ));
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ensemble.toml");
        fs::write(&path, CONFIG).unwrap();

        let config = EnsembleConfig::from_file(&path).unwrap();
        assert_eq!(config.modes.len(), 2);

        assert!(matches!(
            EnsembleConfig::from_file(dir.path().join("missing.toml")),
            Err(AmbrsError::Io(_))
        ));
    }

    #[test]
    fn runner_defaults() {
        let config: RunnerConfig = toml::from_str(r#"executable = "partmc""#).unwrap();
        assert_eq!(config.invocation, "{exe} {prefix}");
        assert_eq!(config.max_workers, None);
    }
}
