//! scenario — counterfactual variants of a background.
//!
//! Purpose
//! -------
//! Override individual cells of the technical coefficients `A`, the
//! per-unit-output impacts `B`, or the stimulus demand, and re-derive what
//! depends on them, so that footprints can be compared against the
//! baseline.
//!
//! Key behaviors
//! -------------
//! - [`overrides`]: code-addressed override records and the
//!   [`adapt_coefficients`], [`adapt_intensities`], [`adapt_stimulus`]
//!   functions.
//! - [`builder`]: [`ScenarioBuilder`] applies a set of overrides to a clone
//!   of the baseline and re-solves `L` when `A` changed.
//!
//! Invariants & assumptions
//! ------------------------
//! - The baseline is never mutated.
//! - A scenario's `L` always belongs to its `A`.

pub mod builder;
pub mod overrides;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::builder::{Scenario, ScenarioBuilder, ScenarioOverrides};
pub use self::overrides::{
    CoefficientOverride, IntensityOverride, SectorKey, StimulusOverride, adapt_coefficients, adapt_intensities,
    adapt_stimulus,
};

pub mod prelude {
    pub use super::{Scenario, ScenarioBuilder, ScenarioOverrides, SectorKey};
}
