//! Leontief solver — dense inversion of (I − A) with input validation.
//!
//! Purpose
//! -------
//! Compute the Leontief inverse `L = (I − A)⁻¹` for a technical coefficient
//! matrix and keep it bound to the exact `A` it was derived from, so a
//! modified `A` can never be paired with a stale `L`.
//!
//! Key behaviors
//! -------------
//! - Validate `A` (square, finite, non-negative up to
//!   [`NEGATIVE_COEFFICIENT_TOL`]) and bound its spectral radius before
//!   solving. When the bounds stay undecided, `ρ(A) < 1` is settled by the
//!   sign of the solved inverse.
//! - Copy `I − A` into a column-major `nalgebra::DMatrix`, factor it once
//!   with LU, and solve against the identity in place.
//! - [`LeontiefSystem::from_parts`] re-associates a persisted `L` with its
//!   `A` only after an O(n²) residual check.
//!
//! Invariants & assumptions
//! ------------------------
//! - For `A ≥ 0` with spectral radius `ρ(A) < 1`, `L = Σₖ Aᵏ` exists and is
//!   non-negative. A dominant eigenvalue ≥ 1 means the coefficient data is
//!   malformed and is reported as [`MrioError::SpectralRadius`].
//! - No incremental updates: every new `A` triggers a full O(n³) solve.
//!
//! Conventions
//! -----------
//! - Inputs and outputs are `ndarray::Array2<f64>`; `nalgebra` is used only
//!   internally for the factorization.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the identity property `L(I − A) = (I − A)L = I`, a
//!   hand-computed nilpotent example, spectral-radius detection on both
//!   fast and power-iteration paths, stale-inverse rejection, and locality
//!   of a single-cell change.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::mrio::errors::{MrioError, MrioResult};

/// Coefficients below `-NEGATIVE_COEFFICIENT_TOL` are treated as malformed.
pub const NEGATIVE_COEFFICIENT_TOL: f64 = 1e-6;

/// Maximum number of power iterations used to bound `ρ(|A|)`.
pub const MAX_POWER_ITERATIONS: usize = 500;

/// Relative tolerance of the residual check in [`LeontiefSystem::from_parts`].
pub const RESIDUAL_TOL: f64 = 1e-8;

/// `LeontiefSystem` — technical coefficients bound to their inverse.
///
/// Purpose
/// -------
/// Own `A` and `L = (I − A)⁻¹` together. The only constructors either
/// compute `L` from `A` or verify a supplied `L` against `A`, which rules out
/// silently reusing an inverse after `A` has changed.
///
/// Fields
/// ------
/// - `a`: `Array2<f64>`
///   Square `n×n` technical coefficient matrix.
/// - `l`: `Array2<f64>`
///   Square `n×n` Leontief inverse of `a`.
///
/// Performance
/// -----------
/// - [`LeontiefSystem::solve`] holds three dense `n×n` buffers at peak
///   (the input, the LU factors, and the solution, which becomes `L`
///   without a copy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LeontiefRecord", into = "LeontiefRecord")]
pub struct LeontiefSystem {
    a: Array2<f64>,
    l: Array2<f64>,
}

/// Serialized form; reloading goes through [`LeontiefSystem::from_parts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeontiefRecord {
    a: Array2<f64>,
    l: Array2<f64>,
}

impl TryFrom<LeontiefRecord> for LeontiefSystem {
    type Error = MrioError;

    fn try_from(record: LeontiefRecord) -> MrioResult<Self> {
        LeontiefSystem::from_parts(record.a, record.l)
    }
}

impl From<LeontiefSystem> for LeontiefRecord {
    fn from(system: LeontiefSystem) -> Self {
        LeontiefRecord { a: system.a, l: system.l }
    }
}

impl LeontiefSystem {
    /// Validate `a` and compute its Leontief inverse.
    ///
    /// Parameters
    /// ----------
    /// - `a`: `Array2<f64>`
    ///   Square technical coefficient matrix; consumed and stored.
    ///
    /// Returns
    /// -------
    /// `MrioResult<LeontiefSystem>`
    ///   The coefficient matrix paired with `(I − a)⁻¹`.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `a` is not square.
    /// - `MrioError::NonFiniteEntry` for NaN/±inf in `a` or in the result.
    /// - `MrioError::NegativeCoefficient` for entries below
    ///   `-NEGATIVE_COEFFICIENT_TOL`.
    /// - `MrioError::SpectralRadius` when `ρ(|a|) ≥ 1` is detected, or when
    ///   the bounds are undecided after [`MAX_POWER_ITERATIONS`] and `I − a`
    ///   is singular or has an inverse with negative entries.
    /// - `MrioError::SingularSystem` when the LU solve fails.
    pub fn solve(a: Array2<f64>) -> MrioResult<Self> {
        validate_coefficients(&a)?;
        match bound_spectral_radius(&a)? {
            RadiusBound::Below => {
                let l = leontief_inverse(&a)?;
                Ok(LeontiefSystem { a, l })
            }
            RadiusBound::Undecided(estimate) => {
                log::debug!("Spectral radius bound undecided ({estimate:.6}); checking the sign of L");
                let l = leontief_inverse(&a).map_err(|err| match err {
                    MrioError::SingularSystem | MrioError::NonFiniteEntry { .. } => {
                        MrioError::SpectralRadius { estimate }
                    }
                    other => other,
                })?;
                check_inverse_sign(&l, estimate)?;
                Ok(LeontiefSystem { a, l })
            }
        }
    }

    /// Pair a previously computed inverse with its coefficient matrix.
    ///
    /// Notes
    /// -----
    /// - Verifies `(I − a)(l · 1) ≈ 1` elementwise within [`RESIDUAL_TOL`]
    ///   (relative to `max|l · 1|`), an O(n²) check that catches an inverse
    ///   computed from a different `a`.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when shapes disagree.
    /// - `MrioError::StaleLeontief` when the residual check fails.
    pub fn from_parts(a: Array2<f64>, l: Array2<f64>) -> MrioResult<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(MrioError::DimensionMismatch { matrix: "A", expected: (n, n), found: a.dim() });
        }
        if l.dim() != (n, n) {
            return Err(MrioError::DimensionMismatch { matrix: "L", expected: (n, n), found: l.dim() });
        }
        let w = l.sum_axis(Axis(1));
        let scale = w.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let residual = (&w - &a.dot(&w)).iter().fold(0.0_f64, |acc, v| acc.max((v - 1.0).abs()));
        if !(residual <= RESIDUAL_TOL * scale) {
            return Err(MrioError::StaleLeontief { residual });
        }
        Ok(LeontiefSystem { a, l })
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn leontief(&self) -> &Array2<f64> {
        &self.l
    }

    pub fn dim(&self) -> usize {
        self.a.nrows()
    }

    /// Total output required by a final-demand vector: `x = L · y`.
    pub fn output_for(&self, y: &Array1<f64>) -> MrioResult<Array1<f64>> {
        if y.len() != self.dim() {
            return Err(MrioError::DimensionMismatch {
                matrix: "demand vector",
                expected: (self.dim(), 1),
                found: (y.len(), 1),
            });
        }
        Ok(self.l.dot(y))
    }

    /// Decompose into `(A, L)`.
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.a, self.l)
    }
}

/// Reject non-square, non-finite, or clearly negative coefficient matrices.
fn validate_coefficients(a: &Array2<f64>) -> MrioResult<()> {
    let n = a.nrows();
    if a.ncols() != n || n == 0 {
        return Err(MrioError::DimensionMismatch { matrix: "A", expected: (n, n), found: a.dim() });
    }
    for ((row, col), &value) in a.indexed_iter() {
        if !value.is_finite() {
            return Err(MrioError::NonFiniteEntry { matrix: "A", row, col, value });
        }
        if value < -NEGATIVE_COEFFICIENT_TOL {
            return Err(MrioError::NegativeCoefficient { row, col, value });
        }
    }
    Ok(())
}

/// Outcome of the pre-solve spectral-radius bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RadiusBound {
    /// `ρ(|A|) < 1` is established.
    Below,
    /// Neither bound decided within [`MAX_POWER_ITERATIONS`]; carries the
    /// last upper bound.
    Undecided(f64),
}

/// Bound `ρ(|A|)`, which bounds `ρ(A)` as well.
///
/// Notes
/// -----
/// - Fast path: the maximum column sum or row sum of `|A|` is an upper
///   bound on the spectral radius; below one the check is done.
/// - Otherwise iterate `v ← |A| v` from `v = 1`. With `v` rescaled to
///   `max v = 1` each step and `m_k` the rescaling factors,
///   `(Π m_k)^{1/k} = ‖|A|ᵏ‖_∞^{1/k} ≥ ρ` gives an upper bound, and for a
///   strictly positive `v`, `min_i (|A|v)_i / v_i ≤ ρ` gives a lower bound
///   (Collatz–Wielandt).
/// - `|A|` is never materialized; products are taken row by row.
///
/// Errors
/// ------
/// - `MrioError::SpectralRadius` when the lower bound reaches one.
fn bound_spectral_radius(a: &Array2<f64>) -> MrioResult<RadiusBound> {
    let n = a.nrows();
    let mut col_sums = Array1::<f64>::zeros(n);
    let mut max_row = 0.0_f64;
    for row in a.rows() {
        let mut row_sum = 0.0;
        for (j, &v) in row.iter().enumerate() {
            col_sums[j] += v.abs();
            row_sum += v.abs();
        }
        max_row = max_row.max(row_sum);
    }
    let max_col = col_sums.fold(0.0_f64, |acc, &v| acc.max(v));
    if max_col.min(max_row) < 1.0 {
        return Ok(RadiusBound::Below);
    }

    let mut v = Array1::<f64>::ones(n);
    let mut log_norm = 0.0_f64;
    let mut upper = f64::INFINITY;
    for k in 1..=MAX_POWER_ITERATIONS {
        let w: Array1<f64> =
            a.rows().into_iter().map(|row| row.iter().zip(v.iter()).map(|(x, vi)| x.abs() * vi).sum()).collect();
        if v.iter().all(|&vi| vi > 0.0) {
            let lower = w.iter().zip(v.iter()).fold(f64::INFINITY, |acc, (wi, vi)| acc.min(wi / vi));
            if lower >= 1.0 {
                return Err(MrioError::SpectralRadius { estimate: lower });
            }
        }
        let m = w.fold(0.0_f64, |acc, &x| acc.max(x));
        if m == 0.0 {
            // |A| is nilpotent along this orbit: ρ = 0.
            return Ok(RadiusBound::Below);
        }
        log_norm += m.ln();
        upper = (log_norm / k as f64).exp();
        if upper < 1.0 {
            return Ok(RadiusBound::Below);
        }
        v = w / m;
    }
    Ok(RadiusBound::Undecided(upper))
}

/// Decide an undecided bound from the solved inverse.
///
/// For `A ≥ 0`, `ρ(A) < 1` holds exactly when `I − A` is nonsingular and
/// `(I − A)⁻¹ ≥ 0`. Entries below `-NEGATIVE_COEFFICIENT_TOL · max|L|`
/// count as negative.
fn check_inverse_sign(l: &Array2<f64>, estimate: f64) -> MrioResult<()> {
    let scale = l.fold(1.0_f64, |acc, v| acc.max(v.abs()));
    if l.iter().any(|&v| v < -NEGATIVE_COEFFICIENT_TOL * scale) {
        return Err(MrioError::SpectralRadius { estimate });
    }
    Ok(())
}

/// Copy `I − A` into a column-major `DMatrix`.
fn fill_identity_minus(a: &Array2<f64>) -> DMatrix<f64> {
    let n = a.nrows();
    let mut m = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            let delta = if i == j { 1.0 } else { 0.0 };
            m[(i, j)] = delta - a[[i, j]];
        }
    }
    m
}

/// Dense `(I − A)⁻¹` via one LU factorization solved in place.
///
/// The solution buffer is moved into the returned array in column-major
/// layout, without a copy.
fn leontief_inverse(a: &Array2<f64>) -> MrioResult<Array2<f64>> {
    let n = a.nrows();
    let lu = fill_identity_minus(a).lu();
    let mut inv = DMatrix::<f64>::identity(n, n);
    if !lu.solve_mut(&mut inv) {
        return Err(MrioError::SingularSystem);
    }
    drop(lu);
    let data: Vec<f64> = inv.data.into();
    let l = Array2::from_shape_vec((n, n).f(), data).map_err(|_| MrioError::DimensionMismatch {
        matrix: "L",
        expected: (n, n),
        found: (n, n),
    })?;
    if let Some(((row, col), &value)) = l.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(MrioError::NonFiniteEntry { matrix: "L", row, col, value });
    }
    Ok(l)
}
