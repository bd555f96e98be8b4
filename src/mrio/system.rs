//! Coefficient assembly — the consistent MRIO tuple and its derived flows.
//!
//! Purpose
//! -------
//! Turn raw per-region/per-industry tables into the validated MRIO record
//! `(labels, A, Y, V, R, H, Q)` and derive total output `x` and the
//! inter-industry transaction matrix `Z` from the Leontief inverse.
//!
//! Key behaviors
//! -------------
//! - [`Mrio::assemble`] splits the superimposed factor table `F` into primary
//!   inputs `V` (its first `nv` rows) and the full extension block `R`,
//!   then checks every matrix against the catalog sizes.
//! - [`Mrio::process`] computes `x = L · rowsum(Y)` and `Z = A · diag(x)`.
//! - [`output_inverse`] maps `x` to `1/x` with zero outputs kept at zero.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x` is derived from final demand, never read from source data; `Z` is
//!   only meaningful for that self-consistent `x`.
//! - All matrices share the catalog order of the [`LabelSet`]; nothing here
//!   permutes rows or columns.
//!
//! Conventions
//! -----------
//! - Shapes: `A` is `(nr·ns)²`, `Y` is `(nr·ns) × (nr·ny)`, `V` is
//!   `nv × (nr·ns)`, `R` is `ne × (nr·ns)`, `H` is `ne × (nr·ny)`, `Q` is
//!   `nq × ne`.
use ndarray::{Array1, Array2, Axis, s};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    characterization::IndicatorMatrix,
    errors::{MrioError, MrioResult},
    labels::LabelSet,
    leontief::LeontiefSystem,
};

/// Raw numeric tables as delivered by the data loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTables {
    /// Technical coefficients.
    pub a: Array2<f64>,
    /// Final demand.
    pub y: Array2<f64>,
    /// Primary inputs and industry extensions, superimposed (`ne` rows).
    pub f: Array2<f64>,
    /// Final-demand extensions (`ne` rows).
    pub f_hh: Array2<f64>,
}

/// `Mrio` — validated multi-regional input-output record for one year.
///
/// Fields
/// ------
/// - `labels`: [`LabelSet`] indexing every matrix below.
/// - `a`, `y`, `v`, `r`, `h`, `q`: the coefficient, demand, primary-input,
///   extension, household-extension, and indicator matrices.
///
/// Invariants
/// ----------
/// - All shapes agree with `labels` and all entries are finite; both are
///   checked by [`Mrio::assemble`] and again on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mrio {
    pub labels: LabelSet,
    pub a: Array2<f64>,
    pub y: Array2<f64>,
    pub v: Array2<f64>,
    pub r: Array2<f64>,
    pub h: Array2<f64>,
    pub q: Array2<f64>,
}

impl Mrio {
    /// Assemble and validate the MRIO record.
    ///
    /// Parameters
    /// ----------
    /// - `labels`: [`LabelSet`]
    ///   Catalogs for regions, industries, final demand, primary inputs and
    ///   extensions. Its characterization catalog is replaced by the one in
    ///   `indicator`.
    /// - `tables`: [`RawTables`]
    ///   Raw `A`, `Y`, `F`, `F_hh` arrays.
    /// - `indicator`: [`IndicatorMatrix`]
    ///   Q and its impact-category catalog.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` for any shape disagreement.
    /// - `MrioError::NonFiniteEntry` for NaN/±inf entries.
    pub fn assemble(labels: LabelSet, tables: RawTables, indicator: IndicatorMatrix) -> MrioResult<Self> {
        let labels = labels.with_characterization(indicator.categories);
        let n = labels.n_sectors();
        let nd = labels.n_demands();
        let (ne, nv, nq) = (labels.ne(), labels.nv(), labels.nq());

        check_shape("A", &tables.a, (n, n))?;
        check_shape("Y", &tables.y, (n, nd))?;
        check_shape("F", &tables.f, (ne, n))?;
        check_shape("F_hh", &tables.f_hh, (ne, nd))?;
        check_shape("Q", &indicator.q, (nq, ne))?;

        let v = tables.f.slice(s![..nv, ..]).to_owned();
        let mrio = Mrio { labels, a: tables.a, y: tables.y, v, r: tables.f, h: tables.f_hh, q: indicator.q };
        mrio.validate()?;
        Ok(mrio)
    }

    /// Re-check shapes and finiteness (used after deserialization).
    pub fn validate(&self) -> MrioResult<()> {
        let n = self.labels.n_sectors();
        let nd = self.labels.n_demands();
        let (ne, nv, nq) = (self.labels.ne(), self.labels.nv(), self.labels.nq());
        for (name, m, shape) in [
            ("A", &self.a, (n, n)),
            ("Y", &self.y, (n, nd)),
            ("V", &self.v, (nv, n)),
            ("R", &self.r, (ne, n)),
            ("H", &self.h, (ne, nd)),
            ("Q", &self.q, (nq, ne)),
        ] {
            check_shape(name, m, shape)?;
            check_finite(name, m)?;
        }
        Ok(())
    }

    /// Derive total output and inter-industry transactions.
    ///
    /// Parameters
    /// ----------
    /// - `system`: `&LeontiefSystem`
    ///   Must have been solved from `self.a`.
    ///
    /// Returns
    /// -------
    /// `MrioResult<ProcessedMrio>`
    ///   `x = L · rowsum(Y)` and `Z = A · diag(x)` alongside a copy of `self`.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `system` has a different size.
    /// - `MrioError::StaleLeontief` when `system` was solved from a
    ///   different coefficient matrix.
    pub fn process(&self, system: &LeontiefSystem) -> MrioResult<ProcessedMrio> {
        let n = self.labels.n_sectors();
        if system.dim() != n {
            return Err(MrioError::DimensionMismatch {
                matrix: "L",
                expected: (n, n),
                found: (system.dim(), system.dim()),
            });
        }
        if system.coefficients() != &self.a {
            return Err(MrioError::StaleLeontief { residual: f64::NAN });
        }
        let x = total_output(system.leontief(), &self.y);
        let z = transactions(&self.a, &x);
        Ok(ProcessedMrio { mrio: self.clone(), x, z })
    }
}

/// MRIO record extended with total output `x` and transactions `Z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedMrio {
    pub mrio: Mrio,
    pub x: Array1<f64>,
    pub z: Array2<f64>,
}

impl ProcessedMrio {
    /// Re-check the MRIO record plus the shapes of `x` and `Z`.
    pub fn validate(&self) -> MrioResult<()> {
        self.mrio.validate()?;
        let n = self.mrio.labels.n_sectors();
        if self.x.len() != n {
            return Err(MrioError::DimensionMismatch { matrix: "x", expected: (n, 1), found: (self.x.len(), 1) });
        }
        check_shape("Z", &self.z, (n, n))?;
        check_finite("Z", &self.z)
    }
}

/// `x = L · rowsum(Y)`.
pub fn total_output(l: &Array2<f64>, y: &Array2<f64>) -> Array1<f64> {
    l.dot(&y.sum_axis(Axis(1)))
}

/// `Z = A · diag(x)`: column `j` of `A` scaled by `x[j]`.
pub fn transactions(a: &Array2<f64>, x: &Array1<f64>) -> Array2<f64> {
    a * &x.view().insert_axis(Axis(0))
}

/// Elementwise `1/x` with `x == 0` mapped to exactly `0`.
///
/// A zero-output sector has no defined per-unit intensity but carries no
/// weight in later sums, so its coefficient column is defined as zero.
pub fn output_inverse(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| if v != 0.0 { 1.0 / v } else { 0.0 })
}

/// Per-unit-output coefficients `M · diag(1/x)`.
pub fn per_unit_output(m: &Array2<f64>, x: &Array1<f64>) -> MrioResult<Array2<f64>> {
    if m.ncols() != x.len() {
        return Err(MrioError::DimensionMismatch {
            matrix: "per-unit-output input",
            expected: (m.nrows(), x.len()),
            found: m.dim(),
        });
    }
    let zeros = x.iter().filter(|&&v| v == 0.0).count();
    if zeros > 0 {
        log::warn!("{zeros} sectors have zero output; their coefficients are set to zero");
    }
    let xinv = output_inverse(x);
    Ok(m * &xinv.view().insert_axis(Axis(0)))
}

pub(crate) fn check_shape(matrix: &'static str, m: &Array2<f64>, expected: (usize, usize)) -> MrioResult<()> {
    if m.dim() != expected {
        return Err(MrioError::DimensionMismatch { matrix, expected, found: m.dim() });
    }
    Ok(())
}

pub(crate) fn check_finite(matrix: &'static str, m: &Array2<f64>) -> MrioResult<()> {
    match m.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(MrioError::NonFiniteEntry { matrix, row, col, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mrio::labels::{Label, LabelCatalog};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Assembly shape checks and the V/R split of F.
    // - x and Z on a hand-computed 2-region × 2-sector economy.
    // - Zero-output handling in per-unit coefficients.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    // 2 regions × 2 sectors, 1 final-demand category, 1 primary input,
    // 2 extension rows, 1 impact category.
    fn toy_labels() -> LabelSet {
        LabelSet::new(
            LabelCatalog::from_codes("region", &["NL", "DE"]).unwrap(),
            LabelCatalog::from_codes("industry", &["S1", "S2"]).unwrap(),
            LabelCatalog::from_codes("final", &["HH"]).unwrap(),
            LabelCatalog::from_codes("primary", &["VA"]).unwrap(),
            LabelCatalog::from_codes("extension", &["VA", "CO2"]).unwrap(),
            LabelCatalog::from_codes("characterization", &["placeholder"]).unwrap(),
        )
        .unwrap()
    }

    fn toy_indicator() -> IndicatorMatrix {
        IndicatorMatrix {
            categories: LabelCatalog::new("characterization", vec![Label::with_unit("GWP", "Global warming", "kg")])
                .unwrap(),
            q: array![[0.0, 1.0]],
        }
    }

    fn toy_tables() -> RawTables {
        RawTables {
            a: array![
                [0.0, 0.2, 0.0, 0.0],
                [0.0, 0.0, 0.5, 0.0],
                [0.0, 0.0, 0.0, 0.1],
                [0.0, 0.0, 0.0, 0.0]
            ],
            y: array![[10.0, 0.0], [0.0, 5.0], [2.0, 3.0], [4.0, 0.0]],
            f: array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
            f_hh: array![[0.0, 0.0], [1.0, 2.0]],
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that assembly keeps F as R, slices V from its leading rows, and
    // adopts the indicator catalog.
    //
    // Given
    // -----
    // - The toy tables with nv = 1.
    //
    // Expect
    // ------
    // - V = first row of F; R = F; characterization code "GWP".
    fn assemble_splits_primary_inputs_from_extensions() {
        let mrio = Mrio::assemble(toy_labels(), toy_tables(), toy_indicator()).unwrap();

        assert_eq!(mrio.v, array![[1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(mrio.r, toy_tables().f);
        assert_eq!(mrio.labels.characterization.label(0).code, "GWP");
    }

    #[test]
    // Purpose
    // -------
    // Ensure catalog/table size disagreements are reported.
    //
    // Given
    // -----
    // - Y with 3 columns instead of nr·ny = 2.
    //
    // Expect
    // ------
    // - `DimensionMismatch` for matrix "Y".
    fn assemble_rejects_misshaped_tables() {
        let mut tables = toy_tables();
        tables.y = Array2::zeros((4, 3));

        let err = Mrio::assemble(toy_labels(), tables, toy_indicator()).unwrap_err();

        assert_eq!(err, MrioError::DimensionMismatch { matrix: "Y", expected: (4, 2), found: (4, 3) });
    }

    #[test]
    // Purpose
    // -------
    // Compare x and Z against hand-computed values.
    //
    // Given
    // -----
    // - Nilpotent A (L = I + A + A² + A³) and rowsum(Y) = [10, 5, 5, 4].
    //
    // Expect
    // ------
    // - x = [11.54, 7.7, 5.4, 4]; Z has 1.54 at (0,1), 2.7 at (1,2), 0.4 at
    //   (2,3), zeros elsewhere; x = Z·1 + y.
    fn process_matches_hand_computed_output_and_transactions() {
        let mrio = Mrio::assemble(toy_labels(), toy_tables(), toy_indicator()).unwrap();
        let sys = LeontiefSystem::solve(mrio.a.clone()).unwrap();

        let p = mrio.process(&sys).unwrap();

        let x_expected = [11.54, 7.7, 5.4, 4.0];
        for (got, want) in p.x.iter().zip(x_expected) {
            assert_relative_eq!(*got, want, epsilon = TOL);
        }
        let mut z_expected = Array2::<f64>::zeros((4, 4));
        z_expected[[0, 1]] = 1.54;
        z_expected[[1, 2]] = 2.7;
        z_expected[[2, 3]] = 0.4;
        for ((i, j), &v) in p.z.indexed_iter() {
            assert_relative_eq!(v, z_expected[[i, j]], epsilon = TOL);
        }
        let balance = p.z.sum_axis(Axis(1)) + mrio.y.sum_axis(Axis(1));
        for (b, x) in balance.iter().zip(p.x.iter()) {
            assert_relative_eq!(*b, *x, epsilon = TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure processing refuses a Leontief system solved from another A.
    //
    // Given
    // -----
    // - A system solved from a modified A.
    //
    // Expect
    // ------
    // - `StaleLeontief`.
    fn process_rejects_system_from_other_coefficients() {
        let mrio = Mrio::assemble(toy_labels(), toy_tables(), toy_indicator()).unwrap();
        let mut other = mrio.a.clone();
        other[[3, 0]] = 0.1;
        let sys = LeontiefSystem::solve(other).unwrap();

        assert!(matches!(mrio.process(&sys).unwrap_err(), MrioError::StaleLeontief { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a zero-output sector gets an exactly-zero coefficient
    // column, never NaN or ±inf.
    //
    // Given
    // -----
    // - M = [[1, 2, 3], [4, 5, 6]], x = [2, 0, 4].
    //
    // Expect
    // ------
    // - Column 1 is exactly zero; the others are divided by x.
    fn per_unit_output_maps_zero_output_to_zero() {
        let m = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let x = array![2.0, 0.0, 4.0];

        let b = per_unit_output(&m, &x).unwrap();

        assert_eq!(b, array![[0.5, 0.0, 0.75], [2.0, 0.0, 1.5]]);
        assert!(b.iter().all(|v| v.is_finite()));
    }
}
