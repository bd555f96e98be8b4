//! background — healthcare stimulus and the per-year background record.
//!
//! Purpose
//! -------
//! Assemble the immutable inputs of the footprint engine for one reference
//! year: characterized per-unit-output impacts, household impacts, the
//! Leontief system, and the healthcare stimulus derived from national
//! accounts.
//!
//! Key behaviors
//! -------------
//! - [`stimulus`]: [`build_stimulus`] and the [`StimulusMatrix`] type whose
//!   total column is always the sum of its components.
//! - [`units`]: explicit per-category unit conversions.
//! - [`assembly`]: [`Background::assemble`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`Background`] is never mutated in place; scenarios clone it.
//! - Every characterized row states its unit, and every conversion names
//!   its factor.

pub mod assembly;
pub mod stimulus;
pub mod units;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::assembly::{Background, WASTE_CATEGORY, WASTE_CATEGORY_NAME};
pub use self::stimulus::{
    SERVICES_PRICE_BASIS, SERVICES_PRICE_BASIS_GAP, Stimulus, StimulusAnchors, StimulusColumn, StimulusMatrix,
    build_stimulus, import_shares,
};
pub use self::units::{KG_TO_KT, KT_TO_KG, TONNE_TO_KT, UnitConversion, apply_conversions, default_unit_conversions};

pub mod prelude {
    pub use super::{Background, Stimulus, StimulusAnchors, StimulusColumn, StimulusMatrix, UnitConversion};
}
