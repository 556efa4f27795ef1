//! Perturbed-parameter ensembles
//!
//! An [`EnsembleSpecification`] describes how each field of a scenario
//! varies. It is turned into an [`Ensemble`] either by sampling
//! ([`sample`], [`lhs`]) or, for one-at-a-time studies around a baseline
//! scenario, by a [`sweep`].

mod ensemble;
mod sampling;
mod specification;
mod sweep;

pub use ensemble::{ensemble_from_scenarios, Ensemble, EnsembleIter};
pub use sampling::{lhs, lhs_with_rng, sample, sample_ensemble, sample_with_rng, SamplingMethod};
pub use specification::EnsembleSpecification;
pub use sweep::{
    sweep, AerosolModalSizeParameterSweeps, AerosolModeParameterSweeps, AerosolParameterSweeps,
    ParameterSweep, Sweep,
};

#[cfg(test)]
pub(crate) mod testing {
    use super::{Ensemble, EnsembleSpecification};
    use crate::aerosol::{
        AerosolModalSizeDistribution, AerosolModalSizePopulation, AerosolModalSizeState,
        AerosolModeDistribution, AerosolModeState, AerosolSpecies,
    };
    use crate::distribution::{LogUniform, Parameter, Uniform};
    use crate::gas::GasSpecies;
    use crate::scenario::Scenario;
    use ndarray::Array1;

    pub const P0: f64 = 101325.0;
    pub const H0: f64 = 500.0;

    pub fn so4() -> AerosolSpecies {
        AerosolSpecies::new("so4", 97.071, 1770.0, 0.507)
    }
    pub fn pom() -> AerosolSpecies {
        AerosolSpecies::new("pom", 12.01, 1000.0, 0.5)
    }
    pub fn soa() -> AerosolSpecies {
        AerosolSpecies::new("soa", 12.01, 1000.0, 0.5)
    }
    pub fn bc() -> AerosolSpecies {
        AerosolSpecies::new("bc", 12.01, 1000.0, 0.5)
    }
    pub fn dst() -> AerosolSpecies {
        AerosolSpecies::new("dst", 135.065, 1000.0, 0.5)
    }
    pub fn ncl() -> AerosolSpecies {
        AerosolSpecies::new("ncl", 58.44, 1000.0, 0.5)
    }

    pub fn gases() -> Vec<GasSpecies> {
        vec![
            GasSpecies::new("so2", 64.07),
            GasSpecies::new("h2so4", 98.079),
            GasSpecies::new("soag", 12.01),
        ]
    }

    /// A single aitken mode scenario.
    pub fn reference_scenario() -> Scenario {
        let aitken = AerosolModeState::new(
            "aitken",
            vec![so4(), soa(), ncl()],
            5e8,
            1e-7,
            1.6_f64.log10(),
            vec![0.4, 0.3, 0.3],
        )
        .unwrap();

        Scenario::new(
            vec![so4(), soa(), ncl()],
            gases(),
            AerosolModalSizeState::new(vec![aitken]).unwrap(),
            vec![1e4, 1e5, 1e6],
            0.0,
            0.5,
            298.0,
            P0,
            H0,
        )
        .unwrap()
    }

    /// `n` copies of [`reference_scenario`], built column by column.
    pub fn reference_ensemble(n: usize) -> Ensemble {
        let reference = reference_scenario();
        let column = |value: f64| Array1::from_elem(n, value);

        Ensemble::new(
            reference.aerosols.clone(),
            reference.gases.clone(),
            AerosolModalSizePopulation::broadcast(&reference.size, n),
            reference.gas_concs.iter().map(|&c| column(c)).collect(),
            column(reference.flux),
            column(reference.relative_humidity),
            column(reference.temperature),
            column(P0),
            column(H0),
        )
        .unwrap()
    }

    fn mode(
        name: &str,
        species: Vec<AerosolSpecies>,
        diameter: (f64, f64),
        geom_std_dev: f64,
    ) -> AerosolModeDistribution {
        let mass_fractions = species
            .iter()
            .map(|_| Parameter::from(Uniform::new(0.0, 1.0).unwrap()))
            .collect();
        AerosolModeDistribution::new(
            name,
            species,
            LogUniform::new(3e7, 2e12).unwrap(),
            LogUniform::new(diameter.0, diameter.1).unwrap(),
            geom_std_dev.log10(),
            mass_fractions,
        )
        .unwrap()
    }

    /// Four-mode MAM4-like specification.
    pub fn mam4_specification() -> EnsembleSpecification {
        let size = AerosolModalSizeDistribution::new(vec![
            mode(
                "accumulation",
                vec![so4(), pom(), soa(), bc(), dst(), ncl()],
                (0.5e-7, 1.1e-7),
                1.6,
            ),
            mode("aitken", vec![so4(), soa(), ncl()], (0.5e-8, 3e-8), 1.6),
            mode(
                "coarse",
                vec![dst(), ncl(), so4(), bc(), pom(), soa()],
                (1e-6, 2e-6),
                1.8,
            ),
            mode("primary carbon", vec![pom(), bc()], (1e-8, 6e-8), 1.8),
        ])
        .unwrap();

        EnsembleSpecification::new(
            "mam4_ensemble",
            vec![so4(), pom(), soa(), bc(), dst(), ncl()],
            gases(),
            size,
            (0..3)
                .map(|_| Parameter::from(Uniform::new(1e5, 1.1e6).unwrap()))
                .collect(),
            LogUniform::new(1e-11, 1e-8).unwrap(),
            LogUniform::new(1e-5, 0.99).unwrap(),
            Uniform::new(240.0, 310.0).unwrap(),
            P0,
            H0,
        )
        .unwrap()
    }
}
