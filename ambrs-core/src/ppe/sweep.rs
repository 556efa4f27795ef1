//! One-at-a-time parameter sweeps around a baseline scenario
//!
//! A sweep tree mirrors the shape of a [`Scenario`]. Each node is either
//! [`Sweep::Fixed`], meaning "hold at the baseline", or [`Sweep::Swept`]
//! carrying the rule (or sub-tree) for that position. All swept leaves of a
//! single sweep advance together, so they must produce the same number of
//! values; the result is a one-dimensional trajectory through parameter
//! space rather than a Cartesian product.

use crate::aerosol::{AerosolModalSizePopulation, AerosolModePopulation, AerosolSpecies};
use crate::errors::{AmbrsError, AmbrsResult};
use crate::ppe::ensemble::Ensemble;
use crate::scenario::Scenario;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A rule generating a monotonic sequence of `count` values starting at `start`.
///
/// The step is `(stop - start) / count`, taken in log10 space for
/// logarithmic sweeps, so value `i` is `start + i * step` and `stop` itself
/// is never reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterSweep {
    Linear { start: f64, stop: f64, count: usize },
    Logarithmic { start: f64, stop: f64, count: usize },
}

impl ParameterSweep {
    pub fn linear(start: f64, stop: f64, count: usize) -> Self {
        ParameterSweep::Linear { start, stop, count }
    }

    pub fn logarithmic(start: f64, stop: f64, count: usize) -> Self {
        ParameterSweep::Logarithmic { start, stop, count }
    }

    /// Number of values generated.
    pub fn count(&self) -> usize {
        match *self {
            ParameterSweep::Linear { count, .. } | ParameterSweep::Logarithmic { count, .. } => {
                count
            }
        }
    }

    fn validate(&self) -> AmbrsResult<()> {
        let (start, stop, count) = match *self {
            ParameterSweep::Linear { start, stop, count }
            | ParameterSweep::Logarithmic { start, stop, count } => (start, stop, count),
        };
        if count == 0 {
            return Err(AmbrsError::Sampling(
                "sweep must generate at least one value".to_string(),
            ));
        }
        if !(start.is_finite() && stop.is_finite()) || start == stop {
            return Err(AmbrsError::Sampling(format!(
                "sweep requires distinct finite endpoints, got {} and {}",
                start, stop
            )));
        }
        if matches!(self, ParameterSweep::Logarithmic { .. }) && (start <= 0.0 || stop <= 0.0) {
            return Err(AmbrsError::Sampling(format!(
                "logarithmic sweep requires positive endpoints, got {} and {}",
                start, stop
            )));
        }
        Ok(())
    }

    /// Generate the sequence of values.
    pub fn values(&self) -> AmbrsResult<Array1<f64>> {
        self.validate()?;

        Ok(match *self {
            ParameterSweep::Linear { start, stop, count } => {
                let step = (stop - start) / count as f64;
                Array1::from_iter((0..count).map(|i| start + i as f64 * step))
            }
            ParameterSweep::Logarithmic { start, stop, count } => {
                let log_start = start.log10();
                let step = (stop.log10() - log_start) / count as f64;
                Array1::from_iter((0..count).map(|i| 10f64.powf(log_start + i as f64 * step)))
            }
        })
    }
}

/// A node of a sweep tree: held at the baseline, or swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sweep<T> {
    Fixed,
    Swept(T),
}

impl<T> Default for Sweep<T> {
    fn default() -> Self {
        Sweep::Fixed
    }
}

impl<T> Sweep<T> {
    pub fn is_swept(&self) -> bool {
        matches!(self, Sweep::Swept(_))
    }

    pub fn as_swept(&self) -> Option<&T> {
        match self {
            Sweep::Fixed => None,
            Sweep::Swept(inner) => Some(inner),
        }
    }
}

impl<T> From<T> for Sweep<T> {
    fn from(inner: T) -> Self {
        Sweep::Swept(inner)
    }
}

/// Sweeps within a single aerosol mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AerosolModeParameterSweeps {
    /// Species of the baseline mode, in order
    pub species: Vec<AerosolSpecies>,
    pub number: Sweep<ParameterSweep>,
    pub geom_mean_diam: Sweep<ParameterSweep>,
    pub log10_geom_std_dev: Sweep<ParameterSweep>,
    /// One node per species, aligned with `species`
    pub mass_fractions: Sweep<Vec<Sweep<ParameterSweep>>>,
}

/// Sweeps across the modes of a modal size distribution.
///
/// There is exactly one node per baseline mode, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AerosolModalSizeParameterSweeps {
    pub modes: Vec<Sweep<AerosolModeParameterSweeps>>,
}

/// The root of a sweep tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AerosolParameterSweeps {
    pub size: Sweep<AerosolModalSizeParameterSweeps>,
    /// One node per gas, aligned with the baseline gases
    pub gas_concs: Sweep<Vec<Sweep<ParameterSweep>>>,
    pub flux: Sweep<ParameterSweep>,
    pub relative_humidity: Sweep<ParameterSweep>,
    pub temperature: Sweep<ParameterSweep>,
    pub pressure: Sweep<ParameterSweep>,
    pub height: Sweep<ParameterSweep>,
}

impl AerosolParameterSweeps {
    /// Paths and rules of every swept leaf, in tree order.
    pub fn swept_fields(&self) -> Vec<(String, &ParameterSweep)> {
        let mut fields = Vec::new();

        if let Sweep::Swept(size) = &self.size {
            for (m, mode) in size.modes.iter().enumerate() {
                let Sweep::Swept(mode) = mode else { continue };
                let leaves = [
                    ("number", &mode.number),
                    ("geom_mean_diam", &mode.geom_mean_diam),
                    ("log10_geom_std_dev", &mode.log10_geom_std_dev),
                ];
                for (field, leaf) in leaves {
                    if let Sweep::Swept(rule) = leaf {
                        fields.push((format!("size.modes[{}].{}", m, field), rule));
                    }
                }
                if let Sweep::Swept(fractions) = &mode.mass_fractions {
                    for (k, leaf) in fractions.iter().enumerate() {
                        if let Sweep::Swept(rule) = leaf {
                            fields.push((format!("size.modes[{}].mass_fractions[{}]", m, k), rule));
                        }
                    }
                }
            }
        }
        if let Sweep::Swept(gas_concs) = &self.gas_concs {
            for (g, leaf) in gas_concs.iter().enumerate() {
                if let Sweep::Swept(rule) = leaf {
                    fields.push((format!("gas_concs[{}]", g), rule));
                }
            }
        }
        let leaves = [
            ("flux", &self.flux),
            ("relative_humidity", &self.relative_humidity),
            ("temperature", &self.temperature),
            ("pressure", &self.pressure),
            ("height", &self.height),
        ];
        for (field, leaf) in leaves {
            if let Sweep::Swept(rule) = leaf {
                fields.push((field.to_string(), rule));
            }
        }

        fields
    }

    /// Check that the tree matches the layout of `baseline`.
    fn check_layout(&self, baseline: &Scenario) -> AmbrsResult<()> {
        if let Sweep::Swept(gas_concs) = &self.gas_concs {
            if gas_concs.len() != baseline.gases.len() {
                return Err(AmbrsError::Shape(format!(
                    "sweep has {} gas concentration nodes, baseline has {} gases",
                    gas_concs.len(),
                    baseline.gases.len()
                )));
            }
        }

        let Sweep::Swept(size) = &self.size else {
            return Ok(());
        };
        if size.modes.len() != baseline.size.modes.len() {
            return Err(AmbrsError::Shape(format!(
                "sweep has {} mode nodes, baseline has {} modes",
                size.modes.len(),
                baseline.size.modes.len()
            )));
        }
        for (node, state) in size.modes.iter().zip(&baseline.size.modes) {
            let Sweep::Swept(mode) = node else { continue };
            if mode.species != state.species {
                return Err(AmbrsError::Shape(format!(
                    "sweep species for mode '{}' differ from the baseline",
                    state.name
                )));
            }
            if let Sweep::Swept(fractions) = &mode.mass_fractions {
                if fractions.len() != state.species.len() {
                    return Err(AmbrsError::Shape(format!(
                        "sweep has {} mass fraction nodes for mode '{}' with {} species",
                        fractions.len(),
                        state.name,
                        state.species.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn apply(column: &mut Array1<f64>, node: &Sweep<ParameterSweep>) -> AmbrsResult<()> {
    if let Sweep::Swept(rule) = node {
        *column = rule.values()?;
    }
    Ok(())
}

fn apply_mode(population: &mut AerosolModePopulation, sweeps: &AerosolModeParameterSweeps) -> AmbrsResult<()> {
    apply(&mut population.number, &sweeps.number)?;
    apply(&mut population.geom_mean_diam, &sweeps.geom_mean_diam)?;
    apply(&mut population.log10_geom_std_dev, &sweeps.log10_geom_std_dev)?;

    if let Sweep::Swept(fractions) = &sweeps.mass_fractions {
        for (column, node) in population.mass_fractions.iter_mut().zip(fractions) {
            apply(column, node)?;
        }
        if fractions.iter().any(Sweep::is_swept) {
            population.normalize_mass_fractions()?;
        }
    }
    Ok(())
}

/// Generate an ensemble that walks the swept fields of `sweeps` away from `baseline`.
///
/// Every field not swept is broadcast unchanged from the baseline. All swept
/// fields must share the same count, which becomes the ensemble size. Swept
/// mass fractions are renormalised member by member.
pub fn sweep(baseline: &Scenario, sweeps: &AerosolParameterSweeps) -> AmbrsResult<Ensemble> {
    baseline.validate()?;
    sweeps.check_layout(baseline)?;

    let fields = sweeps.swept_fields();
    let count = match fields.first() {
        Some((_, rule)) => rule.count(),
        None => {
            return Err(AmbrsError::Shape(
                "sweep does not vary any field".to_string(),
            ))
        }
    };
    if let Some((path, rule)) = fields.iter().find(|(_, rule)| rule.count() != count) {
        return Err(AmbrsError::Shape(format!(
            "all swept fields must have the same count: '{}' has {}, '{}' has {}",
            fields[0].0,
            count,
            path,
            rule.count()
        )));
    }

    info!(
        n = count,
        fields = ?fields.iter().map(|(path, _)| path.as_str()).collect::<Vec<_>>(),
        "Sweeping scenario"
    );

    let broadcast = |value: f64| Array1::from_elem(count, value);

    let mut size = AerosolModalSizePopulation::broadcast(&baseline.size, count);
    if let Sweep::Swept(size_sweeps) = &sweeps.size {
        for (population, node) in size.modes.iter_mut().zip(&size_sweeps.modes) {
            if let Sweep::Swept(mode_sweeps) = node {
                apply_mode(population, mode_sweeps)?;
            }
        }
    }

    let mut gas_concs: Vec<Array1<f64>> = baseline.gas_concs.iter().map(|&c| broadcast(c)).collect();
    if let Sweep::Swept(nodes) = &sweeps.gas_concs {
        for (column, node) in gas_concs.iter_mut().zip(nodes) {
            apply(column, node)?;
        }
    }

    let mut flux = broadcast(baseline.flux);
    let mut relative_humidity = broadcast(baseline.relative_humidity);
    let mut temperature = broadcast(baseline.temperature);
    let mut pressure = broadcast(baseline.pressure);
    let mut height = broadcast(baseline.height);
    apply(&mut flux, &sweeps.flux)?;
    apply(&mut relative_humidity, &sweeps.relative_humidity)?;
    apply(&mut temperature, &sweeps.temperature)?;
    apply(&mut pressure, &sweeps.pressure)?;
    apply(&mut height, &sweeps.height)?;

    Ensemble::new(
        baseline.aerosols.clone(),
        baseline.gases.clone(),
        size,
        gas_concs,
        flux,
        relative_humidity,
        temperature,
        pressure,
        height,
    )
}
