//! Background assembly — everything the footprint engine needs for one year.
//!
//! Purpose
//! -------
//! Combine the processed MRIO, its Leontief system, the waste extension and
//! the national accounts into a single immutable [`Background`] record:
//! characterized per-unit-output impacts `B`, characterized household
//! impacts `H`, the Leontief system, final demand, the region aggregation,
//! and the healthcare stimulus.
//!
//! Key behaviors
//! -------------
//! - Characterize: `R ← Q·R`, `H ← Q·H`, then append the waste row
//!   ("Waste generation", tonne) to both.
//! - `B = R · diag(1/x)` with zero outputs mapped to zero columns.
//! - Build the stimulus in source units, then apply unit conversions
//!   (global warming kg → kt, waste tonne → kt) to `B`, `H` and the
//!   direct-impact stimulus together, relabelling the category units.
//!
//! Invariants & assumptions
//! ------------------------
//! - The Leontief system must have been solved from the same `A` as the
//!   processed MRIO.
//! - Every characterized matrix has one row per entry of
//!   `labels.characterization`, waste row last.
use ndarray::{Array2, ArrayView2, Axis, concatenate};
use serde::{Deserialize, Serialize};

use crate::{
    background::{
        stimulus::{Stimulus, StimulusAnchors, StimulusColumn, build_stimulus},
        units::{UnitConversion, apply_conversions, default_unit_conversions},
    },
    mrio::{
        aggregation::Aggregation,
        errors::{MrioError, MrioResult},
        labels::{Label, LabelSet},
        leontief::LeontiefSystem,
        system::{ProcessedMrio, per_unit_output},
        waste::WasteExtension,
    },
    statistics::national::NationalAccounts,
};

/// Code of the appended waste category.
pub const WASTE_CATEGORY: &str = "WASTE";
/// Display name of the appended waste category.
pub const WASTE_CATEGORY_NAME: &str = "Waste generation";

/// `Background` — immutable footprint inputs for one reference year.
///
/// Fields
/// ------
/// - `labels`: catalogs; `characterization` includes the waste row and the
///   converted units.
/// - `ragg`: region aggregation used for reporting.
/// - `system`: `A` and `L` bound together.
/// - `b`: per-unit-output impacts (`nq × nr·ns`).
/// - `h`: household direct impacts (`nq × nr·ny`).
/// - `y`: final demand.
/// - `q`: indicator matrix (without the waste row).
/// - `stimulus`: healthcare stimulus matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub labels: LabelSet,
    pub ragg: Aggregation,
    pub system: LeontiefSystem,
    pub b: Array2<f64>,
    pub h: Array2<f64>,
    pub y: Array2<f64>,
    pub q: Array2<f64>,
    pub stimulus: Stimulus,
}

impl Background {
    /// Assemble the background with the default unit conversions.
    ///
    /// Errors
    /// ------
    /// - `MrioError::StaleLeontief` when `system` does not belong to
    ///   `processed`.
    /// - `MrioError::DimensionMismatch` when the waste vectors or `ragg` do
    ///   not match the catalogs.
    /// - Any stimulus error (see [`build_stimulus`]).
    pub fn assemble(
        processed: &ProcessedMrio, system: LeontiefSystem, waste: &WasteExtension, accounts: &NationalAccounts,
        anchors: &StimulusAnchors, ragg: Aggregation,
    ) -> MrioResult<Self> {
        let conversions = default_unit_conversions(&anchors.global_warming, WASTE_CATEGORY)?;
        Background::assemble_with(processed, system, waste, accounts, anchors, ragg, &conversions)
    }

    /// Assemble the background with explicit unit conversions.
    pub fn assemble_with(
        processed: &ProcessedMrio, system: LeontiefSystem, waste: &WasteExtension, accounts: &NationalAccounts,
        anchors: &StimulusAnchors, ragg: Aggregation, conversions: &[UnitConversion],
    ) -> MrioResult<Self> {
        let mrio = &processed.mrio;
        if system.coefficients() != &mrio.a {
            return Err(MrioError::StaleLeontief { residual: f64::NAN });
        }
        let (n, nd) = (mrio.labels.n_sectors(), mrio.labels.n_demands());
        if waste.r.len() != n || waste.h.len() != nd {
            return Err(MrioError::DimensionMismatch {
                matrix: "waste extension",
                expected: (n, nd),
                found: (waste.r.len(), waste.h.len()),
            });
        }
        if ragg.members() != mrio.labels.nr() {
            return Err(MrioError::DimensionMismatch {
                matrix: "region aggregation",
                expected: (ragg.len(), mrio.labels.nr()),
                found: ragg.g.dim(),
            });
        }

        let r = append_row(&mrio.q.dot(&mrio.r), &waste.r.view().insert_axis(Axis(0)))?;
        let mut h = append_row(&mrio.q.dot(&mrio.h), &waste.h.view().insert_axis(Axis(0)))?;
        let categories = mrio.labels.characterization.extended(vec![Label::with_unit(
            WASTE_CATEGORY,
            WASTE_CATEGORY_NAME,
            waste.unit.clone(),
        )])?;
        let mut b = per_unit_output(&r, &processed.x)?;

        let mut stimulus = build_stimulus(processed, &b, &categories, accounts, anchors)?;

        for conv in conversions {
            stimulus.h.scale_row(categories.position(&conv.category)?, conv.factor);
        }
        let categories = apply_conversions(&categories, conversions, &mut [&mut b, &mut h])?;

        log::debug!(
            "Background: {} impact categories over {} sectors and {} demand columns",
            categories.len(),
            n,
            nd
        );
        Ok(Background {
            labels: mrio.labels.with_characterization(categories),
            ragg,
            system,
            b,
            h,
            y: mrio.y.clone(),
            q: mrio.q.clone(),
            stimulus,
        })
    }

    /// Leontief inverse.
    pub fn l(&self) -> &Array2<f64> {
        self.system.leontief()
    }

    /// Technical coefficients.
    pub fn a(&self) -> &Array2<f64> {
        self.system.coefficients()
    }

    /// Check shapes after loading from storage.
    ///
    /// `q` excludes the waste row, so it has one row fewer than the
    /// category catalog.
    pub fn validate(&self) -> MrioResult<()> {
        let n = self.labels.n_sectors();
        let nq = self.labels.nq();
        let (nr, nv, ne) = (self.labels.nr(), self.labels.nv(), self.labels.ne());
        for (name, m, shape) in [
            ("B", &self.b, (nq, n)),
            ("H", &self.h, (nq, self.labels.n_demands())),
            ("Y", &self.y, (n, self.labels.n_demands())),
            ("Q", &self.q, (nq.saturating_sub(1), ne)),
        ] {
            if m.dim() != shape {
                return Err(MrioError::DimensionMismatch { matrix: name, expected: shape, found: m.dim() });
            }
        }
        if self.system.dim() != n || self.stimulus.y.nrows() != n || self.stimulus.h.nrows() != nq {
            return Err(MrioError::DimensionMismatch {
                matrix: "background system",
                expected: (n, nq),
                found: (self.stimulus.y.nrows(), self.stimulus.h.nrows()),
            });
        }
        if self.stimulus.v.nrows() != nv {
            return Err(MrioError::DimensionMismatch {
                matrix: "primary-input stimulus",
                expected: (nv, StimulusColumn::ALL.len()),
                found: (self.stimulus.v.nrows(), StimulusColumn::ALL.len()),
            });
        }
        if self.ragg.members() != nr {
            return Err(MrioError::DimensionMismatch {
                matrix: "region aggregation",
                expected: (self.ragg.len(), nr),
                found: self.ragg.g.dim(),
            });
        }
        Ok(())
    }
}

fn append_row(m: &Array2<f64>, row: &ArrayView2<'_, f64>) -> MrioResult<Array2<f64>> {
    concatenate(Axis(0), &[m.view(), row.view()]).map_err(|_| MrioError::DimensionMismatch {
        matrix: "characterized extension",
        expected: (m.nrows() + 1, m.ncols()),
        found: (m.nrows() + row.nrows(), row.ncols()),
    })
}
