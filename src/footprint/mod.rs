//! footprint — decompositions and report tables.
//!
//! Purpose
//! -------
//! Turn a [`Background`](crate::background::Background) (or any `B`, `L`,
//! `Y` triple) into attributed impacts: per producing region×sector
//! (hotspot), per demanded region×sector (contribution), and grouped into
//! the seven report breakdowns.
//!
//! Key behaviors
//! -------------
//! - [`decomposition`]: [`hotspot`], [`contribution`], [`total_footprint`].
//! - [`table`]: [`FootprintTable`] row and column labelling.
//! - [`breakdown`]: [`Breakdown`] groupings with sheet names.
//!
//! Invariants & assumptions
//! ------------------------
//! - Hotspot and contribution results for the same demand column have equal
//!   column sums, and every breakdown preserves them.

pub mod breakdown;
pub mod decomposition;
pub mod table;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::breakdown::{ALL_SECTORS, Breakdown, WORLD, column_totals};
pub use self::decomposition::{
    contribution, hotspot, stimulus_contribution, stimulus_hotspot, total_footprint,
};
pub use self::table::FootprintTable;

pub mod prelude {
    pub use super::{Breakdown, FootprintTable, contribution, hotspot, total_footprint};
}
