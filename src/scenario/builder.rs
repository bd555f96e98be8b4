//! Scenario builder over a borrowed baseline.
//!
//! Purpose
//! -------
//! Collect cell overrides against a baseline [`Background`] and produce an
//! independent [`Scenario`] whose coefficients, intensities and stimulus
//! reflect them.
//!
//! Key behaviors
//! -------------
//! - The baseline is borrowed, never modified; [`ScenarioBuilder::build`]
//!   works on a clone.
//! - Any coefficient override triggers a full Leontief re-solve, so a
//!   scenario never pairs modified `A` with the baseline `L`.
//! - Intensity and stimulus overrides leave `L` untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - The stimulus total column equals the sum of its components after every
//!   override.
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    background::{assembly::Background, stimulus::StimulusColumn},
    mrio::{errors::MrioResult, leontief::LeontiefSystem},
    scenario::overrides::{
        CoefficientOverride, IntensityOverride, SectorKey, StimulusOverride, adapt_coefficients,
        adapt_intensities, adapt_stimulus,
    },
};

/// Overrides applied to a baseline, in application order per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverrides {
    pub coefficients: Vec<CoefficientOverride>,
    pub intensities: Vec<IntensityOverride>,
    pub stimulus: Vec<StimulusOverride>,
}

impl ScenarioOverrides {
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty() && self.intensities.is_empty() && self.stimulus.is_empty()
    }
}

/// `Scenario` — a modified background and the overrides that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub background: Background,
    pub overrides: ScenarioOverrides,
}

/// `ScenarioBuilder` — collects overrides against a baseline.
///
/// Example
/// -------
/// ```ignore
/// let scenario = ScenarioBuilder::new("greener-pharma", &baseline)
///     .coefficient(("NL", "A_ELEC"), ("NL", "A_CHEM"), 0.01)
///     .intensity("GWP", ("NL", "A_CHEM"), 0.0)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioBuilder<'a> {
    name: String,
    baseline: &'a Background,
    overrides: ScenarioOverrides,
}

impl<'a> ScenarioBuilder<'a> {
    pub fn new(name: impl Into<String>, baseline: &'a Background) -> Self {
        ScenarioBuilder { name: name.into(), baseline, overrides: ScenarioOverrides::default() }
    }

    /// Set `A[input, output]`.
    pub fn coefficient(mut self, input: (&str, &str), output: (&str, &str), value: f64) -> Self {
        self.overrides.coefficients.push(CoefficientOverride {
            input: SectorKey::new(input.0, input.1),
            output: SectorKey::new(output.0, output.1),
            value,
        });
        self
    }

    /// Set `B[category, sector]`; `category` is a code or display name.
    pub fn intensity(mut self, category: &str, sector: (&str, &str), value: f64) -> Self {
        self.overrides.intensities.push(IntensityOverride {
            category: category.to_string(),
            sector: SectorKey::new(sector.0, sector.1),
            value,
        });
        self
    }

    /// Set the stimulus demand on `sector` in a component column.
    pub fn stimulus(mut self, sector: (&str, &str), column: StimulusColumn, value: f64) -> Self {
        self.overrides.stimulus.push(StimulusOverride { sector: SectorKey::new(sector.0, sector.1), column, value });
        self
    }

    /// Append a prepared override set, e.g. one loaded from JSON.
    pub fn with_overrides(mut self, overrides: ScenarioOverrides) -> Self {
        self.overrides.coefficients.extend(overrides.coefficients);
        self.overrides.intensities.extend(overrides.intensities);
        self.overrides.stimulus.extend(overrides.stimulus);
        self
    }

    /// Apply every override to a copy of the baseline.
    ///
    /// Errors
    /// ------
    /// - Lookup and value errors from the `adapt_*` functions.
    /// - Any [`LeontiefSystem::solve`] error for the modified `A`
    ///   (negative coefficients, spectral radius, singularity).
    pub fn build(self) -> MrioResult<Scenario> {
        let mut background = self.baseline.clone();
        let labels = &self.baseline.labels;

        if !self.overrides.coefficients.is_empty() {
            let a = adapt_coefficients(labels, self.baseline.a(), &self.overrides.coefficients)?;
            let start = Instant::now();
            background.system = LeontiefSystem::solve(a)?;
            log::info!(
                "Scenario {}: recalculated Leontief inverse in {:.2} s",
                self.name,
                start.elapsed().as_secs_f64()
            );
        }
        if !self.overrides.intensities.is_empty() {
            background.b = adapt_intensities(labels, &self.baseline.b, &self.overrides.intensities)?;
        }
        if !self.overrides.stimulus.is_empty() {
            background.stimulus.y = adapt_stimulus(labels, &self.baseline.stimulus.y, &self.overrides.stimulus)?;
        }
        log::debug!(
            "Scenario {}: {} coefficient, {} intensity, {} stimulus overrides",
            self.name,
            self.overrides.coefficients.len(),
            self.overrides.intensities.len(),
            self.overrides.stimulus.len()
        );
        Ok(Scenario { name: self.name, background, overrides: self.overrides })
    }
}
