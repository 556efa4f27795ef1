//! Simulator inputs generated from ensemble members
//!
//! The runner does not know anything about simulator input formats. It asks
//! each [`InputBundle`] to write itself into a job directory under a file
//! prefix, then invokes the simulator with that prefix. An [`InputBuilder`]
//! turns an ensemble into one bundle per member.

use crate::aerosol::AerosolProcesses;
use crate::errors::{AmbrsError, AmbrsResult};
use crate::ppe::Ensemble;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The inputs for a single simulator run.
pub trait InputBundle: Send + Sync {
    /// File prefix this bundle wants to be written under.
    ///
    /// `None` lets the runner choose.
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Write all input files for the run into `dir`, named after `prefix`.
    fn write(&self, dir: &Path, prefix: &str) -> AmbrsResult<()>;
}

/// Produces one input bundle per ensemble member.
///
/// Run configuration such as time stepping is held by the builder itself.
pub trait InputBuilder {
    type Bundle: InputBundle;

    fn create_inputs(
        &self,
        ensemble: &Ensemble,
        processes: &AerosolProcesses,
    ) -> AmbrsResult<Vec<Self::Bundle>>;
}

/// A simulator-agnostic description of one member: the scenario, the
/// processes to enable and the time stepping, written as `<prefix>.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Row of the member in its ensemble
    pub index: usize,
    /// Timestep (s)
    pub dt: f64,
    pub nstep: usize,
    pub processes: AerosolProcesses,
    pub scenario: Scenario,
}

impl InputBundle for ScenarioInput {
    fn write(&self, dir: &Path, prefix: &str) -> AmbrsResult<()> {
        let contents = toml::to_string(self).map_err(|e| {
            AmbrsError::Config(format!("failed to serialise input {}: {}", self.index, e))
        })?;
        fs::write(dir.join(format!("{}.toml", prefix)), contents)?;
        Ok(())
    }
}

/// Builds [`ScenarioInput`] bundles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputBuilder {
    /// Timestep (s)
    pub dt: f64,
    /// Number of timesteps
    pub nstep: usize,
}

impl ScenarioInputBuilder {
    pub fn new(dt: f64, nstep: usize) -> AmbrsResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(AmbrsError::Config(format!(
                "timestep must be positive, got {}",
                dt
            )));
        }
        if nstep == 0 {
            return Err(AmbrsError::Config(
                "number of timesteps must be positive".to_string(),
            ));
        }
        Ok(Self { dt, nstep })
    }
}

impl InputBuilder for ScenarioInputBuilder {
    type Bundle = ScenarioInput;

    fn create_inputs(
        &self,
        ensemble: &Ensemble,
        processes: &AerosolProcesses,
    ) -> AmbrsResult<Vec<ScenarioInput>> {
        ensemble
            .iter()
            .enumerate()
            .map(|(index, scenario)| {
                Ok(ScenarioInput {
                    index,
                    dt: self.dt,
                    nstep: self.nstep,
                    processes: *processes,
                    scenario,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppe::testing::{reference_ensemble, reference_scenario};

    #[test]
    fn one_bundle_per_member() {
        let builder = ScenarioInputBuilder::new(30.0, 120).unwrap();
        let processes = AerosolProcesses {
            coagulation: true,
            condensation: true,
            ..Default::default()
        };

        let inputs = builder
            .create_inputs(&reference_ensemble(5), &processes)
            .unwrap();

        assert_eq!(inputs.len(), 5);
        for (i, input) in inputs.iter().enumerate() {
            assert_eq!(input.index, i);
            assert_eq!(input.scenario, reference_scenario());
            assert!(input.processes.coagulation);
            assert!(!input.processes.nucleation);
            assert_eq!(input.prefix(), None);
        }
    }

    #[test]
    fn written_input_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ScenarioInputBuilder::new(1.0, 10).unwrap();
        let inputs = builder
            .create_inputs(&reference_ensemble(1), &AerosolProcesses::default())
            .unwrap();

        inputs[0].write(dir.path(), "member").unwrap();

        let contents = fs::read_to_string(dir.path().join("member.toml")).unwrap();
        let restored: ScenarioInput = toml::from_str(&contents).unwrap();
        assert_eq!(restored, inputs[0]);
    }

    #[test]
    fn invalid_time_stepping() {
        assert!(matches!(
            ScenarioInputBuilder::new(0.0, 10),
            Err(AmbrsError::Config(_))
        ));
        assert!(matches!(
            ScenarioInputBuilder::new(1.0, 0),
            Err(AmbrsError::Config(_))
        ));
    }
}
