use crate::aerosol::{AerosolModalSizePopulation, AerosolModePopulation, AerosolSpecies};
use crate::errors::{AmbrsError, AmbrsResult};
use crate::gas::GasSpecies;
use crate::ppe::specification::EnsembleSpecification;
use crate::scenario::Scenario;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::sync::Arc;

/// A collection of scenarios stored column-wise.
///
/// Every field of a [`Scenario`] becomes a column with one entry per member.
/// All columns have the same length, and row `i` across all columns forms
/// member `i`. Members are extracted as owned snapshots; the ensemble itself
/// is immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ensemble {
    #[serde(skip)]
    specification: Option<Arc<EnsembleSpecification>>,
    aerosols: Vec<AerosolSpecies>,
    gases: Vec<GasSpecies>,
    size: AerosolModalSizePopulation,
    gas_concs: Vec<Array1<f64>>,
    flux: Array1<f64>,
    relative_humidity: Array1<f64>,
    temperature: Array1<f64>,
    pressure: Array1<f64>,
    height: Array1<f64>,
}

impl Ensemble {
    /// Create an ensemble from its columns.
    ///
    /// Fails with a shape error if any column length differs from the others,
    /// or if a mode's mass fraction columns do not match its species. A member
    /// whose mass fractions do not sum to one is a mass fraction error.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aerosols: Vec<AerosolSpecies>,
        gases: Vec<GasSpecies>,
        size: AerosolModalSizePopulation,
        gas_concs: Vec<Array1<f64>>,
        flux: Array1<f64>,
        relative_humidity: Array1<f64>,
        temperature: Array1<f64>,
        pressure: Array1<f64>,
        height: Array1<f64>,
    ) -> AmbrsResult<Self> {
        let ensemble = Self {
            specification: None,
            aerosols,
            gases,
            size,
            gas_concs,
            flux,
            relative_humidity,
            temperature,
            pressure,
            height,
        };
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Attach the specification this ensemble was drawn from.
    pub fn with_specification(mut self, specification: Arc<EnsembleSpecification>) -> Self {
        self.specification = Some(specification);
        self
    }

    /// Check that all columns share the ensemble size and that every
    /// member's mass fractions sum to one.
    ///
    /// Ensembles built through [`Ensemble::new`] are always valid; this is
    /// useful after deserialising one.
    pub fn validate(&self) -> AmbrsResult<()> {
        let n = self.len();

        let columns = [
            ("relative_humidity", &self.relative_humidity),
            ("temperature", &self.temperature),
            ("pressure", &self.pressure),
            ("height", &self.height),
        ];
        for (field, column) in columns {
            if column.len() != n {
                return Err(AmbrsError::Shape(format!(
                    "ensemble field '{}' has {} values, expected {}",
                    field,
                    column.len(),
                    n
                )));
            }
        }

        if self.gas_concs.len() != self.gases.len() {
            return Err(AmbrsError::Shape(format!(
                "ensemble has {} gases but {} gas concentration columns",
                self.gases.len(),
                self.gas_concs.len()
            )));
        }
        for (gas, column) in self.gases.iter().zip(&self.gas_concs) {
            if column.len() != n {
                return Err(AmbrsError::Shape(format!(
                    "concentration of gas '{}' has {} values, expected {}",
                    gas.name,
                    column.len(),
                    n
                )));
            }
        }

        self.size
            .modes
            .iter()
            .try_for_each(|mode| mode.check_shape(n))
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// The specification this ensemble was sampled from, if any.
    pub fn specification(&self) -> Option<&EnsembleSpecification> {
        self.specification.as_deref()
    }

    pub fn aerosols(&self) -> &[AerosolSpecies] {
        &self.aerosols
    }

    pub fn gases(&self) -> &[GasSpecies] {
        &self.gases
    }

    pub fn size(&self) -> &AerosolModalSizePopulation {
        &self.size
    }

    pub fn gas_concs(&self) -> &[Array1<f64>] {
        &self.gas_concs
    }

    pub fn flux(&self) -> &Array1<f64> {
        &self.flux
    }

    pub fn relative_humidity(&self) -> &Array1<f64> {
        &self.relative_humidity
    }

    pub fn temperature(&self) -> &Array1<f64> {
        &self.temperature
    }

    pub fn pressure(&self) -> &Array1<f64> {
        &self.pressure
    }

    pub fn height(&self) -> &Array1<f64> {
        &self.height
    }

    /// Extract member `i` as a scenario.
    pub fn member(&self, i: usize) -> AmbrsResult<Scenario> {
        if i >= self.len() {
            return Err(AmbrsError::IndexOutOfRange {
                index: i,
                size: self.len(),
            });
        }

        Ok(Scenario {
            aerosols: self.aerosols.clone(),
            gases: self.gases.clone(),
            size: self.size.state(i),
            gas_concs: self.gas_concs.iter().map(|column| column[i]).collect(),
            flux: self.flux[i],
            relative_humidity: self.relative_humidity[i],
            temperature: self.temperature[i],
            pressure: self.pressure[i],
            height: self.height[i],
        })
    }

    /// Iterate over the members in row order.
    pub fn iter(&self) -> EnsembleIter<'_> {
        EnsembleIter {
            ensemble: self,
            range: 0..self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a Ensemble {
    type Item = Scenario;
    type IntoIter = EnsembleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the members of an [`Ensemble`].
#[derive(Debug, Clone)]
pub struct EnsembleIter<'a> {
    ensemble: &'a Ensemble,
    range: std::ops::Range<usize>,
}

impl Iterator for EnsembleIter<'_> {
    type Item = Scenario;

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().and_then(|i| self.ensemble.member(i).ok())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for EnsembleIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range
            .next_back()
            .and_then(|i| self.ensemble.member(i).ok())
    }
}

impl ExactSizeIterator for EnsembleIter<'_> {}

impl FusedIterator for EnsembleIter<'_> {}

/// Pack a sequence of scenarios into an ensemble, one member per scenario.
///
/// All scenarios must share the same aerosol species, gases and mode layout.
pub fn ensemble_from_scenarios(scenarios: &[Scenario]) -> AmbrsResult<Ensemble> {
    let first = scenarios.first().ok_or_else(|| {
        AmbrsError::Shape("cannot build an ensemble from zero scenarios".to_string())
    })?;
    for scenario in scenarios {
        scenario.validate()?;
        first.check_same_layout(scenario)?;
    }

    let modes = first
        .size
        .modes
        .iter()
        .enumerate()
        .map(|(m, mode)| AerosolModePopulation {
            name: mode.name.clone(),
            species: mode.species.clone(),
            number: column(scenarios, |s| s.size.modes[m].number),
            geom_mean_diam: column(scenarios, |s| s.size.modes[m].geom_mean_diam),
            log10_geom_std_dev: column(scenarios, |s| s.size.modes[m].log10_geom_std_dev),
            mass_fractions: (0..mode.species.len())
                .map(|k| column(scenarios, |s| s.size.modes[m].mass_fractions[k]))
                .collect(),
        })
        .collect();

    Ensemble::new(
        first.aerosols.clone(),
        first.gases.clone(),
        AerosolModalSizePopulation { modes },
        (0..first.gases.len())
            .map(|g| column(scenarios, |s| s.gas_concs[g]))
            .collect(),
        column(scenarios, |s| s.flux),
        column(scenarios, |s| s.relative_humidity),
        column(scenarios, |s| s.temperature),
        column(scenarios, |s| s.pressure),
        column(scenarios, |s| s.height),
    )
}

fn column(scenarios: &[Scenario], field: impl Fn(&Scenario) -> f64) -> Array1<f64> {
    scenarios.iter().map(field).collect()
}
