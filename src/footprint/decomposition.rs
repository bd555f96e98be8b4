//! Hotspot and contribution decompositions.
//!
//! Purpose
//! -------
//! Attribute the impacts triggered by each column of a demand matrix to
//! region×sector rows, either where the impacts occur (hotspot) or where
//! the demand lands (contribution).
//!
//! Key behaviors
//! -------------
//! - [`hotspot`]: for demand column `k`, `B · diag(L · y_k)`, transposed to
//!   `(nr·ns) × nq`. Row `i` is the impact emitted by producer `i`.
//! - [`contribution`]: for demand column `k`, `(B · L) · diag(y_k)`,
//!   transposed to `(nr·ns) × nq`. Row `i` is the supply-chain impact of
//!   the demand placed on sector `i`. `B · L` is computed once.
//! - [`total_footprint`]: `B · L · ystim + Hstim` for one stimulus column.
//!
//! Invariants & assumptions
//! ------------------------
//! - For every column `k`, the hotspot and contribution matrices have the
//!   same column sums: both equal `B · L · y_k`.
//!
//! Performance
//! -----------
//! - Diagonal products are broadcasts, never dense `diag(·)` matrices.
use ndarray::{Array1, Array2, Axis};

use crate::{
    background::{assembly::Background, stimulus::StimulusColumn},
    mrio::errors::{MrioError, MrioResult},
};

/// Production-side decomposition, one `(nr·ns) × nq` matrix per column of
/// `y`.
///
/// Parameters
/// ----------
/// - `b`: `&Array2<f64>`
///   Per-unit-output impacts (`nq × n`).
/// - `l`: `&Array2<f64>`
///   Leontief inverse (`n × n`).
/// - `y`: `&Array2<f64>`
///   Demand (`n × m`).
///
/// Errors
/// ------
/// - `MrioError::DimensionMismatch` for inconsistent shapes.
pub fn hotspot(b: &Array2<f64>, l: &Array2<f64>, y: &Array2<f64>) -> MrioResult<Vec<Array2<f64>>> {
    check_operands(b, l, y)?;
    let x = l.dot(y);
    Ok(x.columns()
        .into_iter()
        .map(|xk| (b * &xk.insert_axis(Axis(0))).reversed_axes())
        .collect())
}

/// Consumption-side decomposition, one `(nr·ns) × nq` matrix per column of
/// `y`.
///
/// Errors
/// ------
/// - `MrioError::DimensionMismatch` for inconsistent shapes.
pub fn contribution(b: &Array2<f64>, l: &Array2<f64>, y: &Array2<f64>) -> MrioResult<Vec<Array2<f64>>> {
    check_operands(b, l, y)?;
    let bl = b.dot(l);
    Ok(y.columns()
        .into_iter()
        .map(|yk| (&bl * &yk.insert_axis(Axis(0))).reversed_axes())
        .collect())
}

/// Indirect plus direct impacts of one stimulus column (`nq`).
pub fn total_footprint(background: &Background, column: StimulusColumn) -> Array1<f64> {
    let y = background.stimulus.y.column(column);
    let indirect = background.b.dot(&background.l().dot(&y));
    indirect + background.stimulus.h.column(column)
}

/// [`hotspot`] over the four stimulus columns of a background.
pub fn stimulus_hotspot(background: &Background) -> MrioResult<Vec<Array2<f64>>> {
    hotspot(&background.b, background.l(), background.stimulus.y.values())
}

/// [`contribution`] over the four stimulus columns of a background.
pub fn stimulus_contribution(background: &Background) -> MrioResult<Vec<Array2<f64>>> {
    contribution(&background.b, background.l(), background.stimulus.y.values())
}

fn check_operands(b: &Array2<f64>, l: &Array2<f64>, y: &Array2<f64>) -> MrioResult<()> {
    let n = l.nrows();
    if l.ncols() != n {
        return Err(MrioError::DimensionMismatch { matrix: "L", expected: (n, n), found: l.dim() });
    }
    if b.ncols() != n {
        return Err(MrioError::DimensionMismatch { matrix: "B", expected: (b.nrows(), n), found: b.dim() });
    }
    if y.nrows() != n {
        return Err(MrioError::DimensionMismatch { matrix: "Y", expected: (n, y.ncols()), found: y.dim() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hand-computed hotspot and contribution matrices.
    // - Conservation: equal column sums for every demand column.
    // - Shape guards.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-12;

    fn operands() -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        let b = array![[1.0, 2.0, 0.5], [0.0, 1.0, 3.0]];
        let l = array![[1.25, 0.5, 0.0], [0.125, 1.25, 0.2], [0.0, 0.1, 1.1]];
        let y = array![[1.0, 0.0], [2.0, 4.0], [0.0, 1.0]];
        (b, l, y)
    }

    #[test]
    // Purpose
    // -------
    // Compare the first demand column against a hand computation.
    //
    // Given
    // -----
    // - y_0 = [1, 2, 0]; L · y_0 = [2.25, 2.625, 0.2].
    //
    // Expect
    // ------
    // - hotspot row i = B[:, i] · x_i; contribution row i = (B·L)[:, i] · y_i.
    fn decompositions_match_hand_computation() {
        let (b, l, y) = operands();

        let hs = hotspot(&b, &l, &y).unwrap();
        let ct = contribution(&b, &l, &y).unwrap();

        assert_eq!(hs.len(), 2);
        assert_eq!(hs[0].dim(), (3, 2));
        let expected_hs = array![[2.25, 0.0], [5.25, 2.625], [0.1, 0.6]];
        let bl = b.dot(&l);
        for i in 0..3 {
            for q in 0..2 {
                assert_relative_eq!(hs[0][[i, q]], expected_hs[[i, q]], epsilon = TOL);
                assert_relative_eq!(ct[0][[i, q]], bl[[q, i]] * y[[i, 0]], epsilon = TOL);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify conservation of impact between the two perspectives.
    //
    // Given
    // -----
    // - Both demand columns of the toy operands.
    //
    // Expect
    // ------
    // - Column sums of hotspot and contribution agree and equal B·L·y_k.
    fn hotspot_and_contribution_conserve_total_impact() {
        let (b, l, y) = operands();

        let hs = hotspot(&b, &l, &y).unwrap();
        let ct = contribution(&b, &l, &y).unwrap();

        for k in 0..y.ncols() {
            let total = b.dot(&l.dot(&y.column(k)));
            let hs_sum = hs[k].sum_axis(Axis(0));
            let ct_sum = ct[k].sum_axis(Axis(0));
            for q in 0..b.nrows() {
                assert_relative_eq!(hs_sum[q], ct_sum[q], epsilon = 1e-10);
                assert_relative_eq!(hs_sum[q], total[q], epsilon = 1e-10);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure mismatched operands are rejected.
    //
    // Given
    // -----
    // - Y with 2 rows for a 3-sector system.
    //
    // Expect
    // ------
    // - `DimensionMismatch` for "Y".
    fn decompositions_reject_mismatched_demand() {
        let (b, l, _) = operands();
        let y = Array2::<f64>::zeros((2, 1));

        let err = hotspot(&b, &l, &y).unwrap_err();

        assert!(matches!(err, MrioError::DimensionMismatch { matrix: "Y", .. }));
    }
}
