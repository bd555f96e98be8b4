//! mrio — label catalogs, coefficient assembly, and the Leontief system.
//!
//! Purpose
//! -------
//! Provide the validated numeric core of the background pipeline: the
//! ordered catalogs that index every matrix, the characterization of raw
//! extensions into impact categories, the assembled MRIO record with its
//! derived output and transactions, and the Leontief inverse bound to the
//! coefficient matrix it was solved from.
//!
//! Key behaviors
//! -------------
//! - [`labels`]: [`LabelCatalog`] / [`LabelSet`] with code → position
//!   lookups and flat region×sector index helpers.
//! - [`characterization`]: [`IndicatorMatrix::build`] scatters
//!   characterization factors into Q.
//! - [`system`]: [`Mrio::assemble`] validates `(A, Y, V, R, H, Q)`;
//!   [`Mrio::process`] derives `x` and `Z`.
//! - [`leontief`]: [`LeontiefSystem::solve`] checks the spectral radius and
//!   runs a dense LU solve for `L = (I − A)⁻¹`.
//! - [`waste`]: maps the waste supply table onto the MRIO catalogs.
//! - [`aggregation`]: 0/1 grouping matrices for reporting.
//!
//! Invariants & assumptions
//! ------------------------
//! - Catalog order is the matrix order everywhere; nothing in this module
//!   permutes rows or columns after construction.
//! - `L` is never stored apart from the `A` it was solved from.
//!
//! Conventions
//! -----------
//! - Flat indices are region-major: `region * ns + sector` and
//!   `region * ny + category`.
//! - All fallible operations return [`MrioResult`]. The only numerical edge
//!   case recovered locally is zero output, mapped to zero per-unit
//!   coefficients.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests on small hand-computed systems
//!   (2 regions × 2 sectors and similar).

pub mod aggregation;
pub mod characterization;
pub mod errors;
pub mod labels;
pub mod leontief;
pub mod system;
pub mod waste;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::aggregation::{Aggregation, DEFAULT_REGION_GROUPS};
pub use self::characterization::{
    CharacterizationSheet, IndicatorMatrix, IndicatorSpec, exiobase_indicator_specs,
};
pub use self::errors::{MrioError, MrioResult};
pub use self::labels::{Label, LabelCatalog, LabelSet};
pub use self::leontief::LeontiefSystem;
pub use self::system::{
    Mrio, ProcessedMrio, RawTables, output_inverse, per_unit_output, total_output, transactions,
};
pub use self::waste::{WasteExtension, WasteTables, default_industry_aliases};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::{
        Aggregation, IndicatorMatrix, IndicatorSpec, Label, LabelCatalog, LabelSet, LeontiefSystem,
        Mrio, MrioError, MrioResult, ProcessedMrio, RawTables, WasteExtension,
    };
}
