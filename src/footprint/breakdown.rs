//! Report breakdowns of region×sector results.
//!
//! A decomposition result has one row per region×sector. Reports group it
//! seven ways, combining a region grouping (all regions, aggregate regions,
//! one world total) with a sector grouping (all sectors, aggregate sectors,
//! one economy total). Every breakdown is `out = (G_r ⊗ G_s) · values`,
//! evaluated per impact category as `G_r · V_q · G_sᵀ`.
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    aggregation::Aggregation,
    errors::{MrioError, MrioResult},
};

/// Row key used for the world total.
pub const WORLD: &str = "World";
/// Row key used for the whole-economy total.
pub const ALL_SECTORS: &str = "Total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breakdown {
    AllSectorsAllRegions,
    AggSectorsAllRegions,
    AggSectorsAggRegions,
    AllSectorsWorld,
    AggSectorsWorld,
    EconomyAllRegions,
    EconomyAggRegions,
}

#[derive(Clone, Copy)]
enum Grouping {
    All,
    Aggregate,
    Single,
}

impl Breakdown {
    pub const ALL: [Breakdown; 7] = [
        Breakdown::AllSectorsAllRegions,
        Breakdown::AggSectorsAllRegions,
        Breakdown::AggSectorsAggRegions,
        Breakdown::AllSectorsWorld,
        Breakdown::AggSectorsWorld,
        Breakdown::EconomyAllRegions,
        Breakdown::EconomyAggRegions,
    ];

    /// Report sheet name.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Breakdown::AllSectorsAllRegions => "all_sec_all_reg",
            Breakdown::AggSectorsAllRegions => "agg_sec_all_reg",
            Breakdown::AggSectorsAggRegions => "agg_sec_agg_reg",
            Breakdown::AllSectorsWorld => "all_sec_sin_reg",
            Breakdown::AggSectorsWorld => "agg_sec_sin_reg",
            Breakdown::EconomyAllRegions => "sin_sec_all_reg",
            Breakdown::EconomyAggRegions => "sin_sec_agg_reg",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Breakdown::AllSectorsAllRegions => "Breakdown by all regions and all sectors",
            Breakdown::AggSectorsAllRegions => "Breakdown by all regions and aggregate sectors",
            Breakdown::AggSectorsAggRegions => "Breakdown by aggregate regions and aggregate sectors",
            Breakdown::AllSectorsWorld => "Breakdown by all sectors (in the world)",
            Breakdown::AggSectorsWorld => "Breakdown by aggregate sectors (in the world)",
            Breakdown::EconomyAllRegions => "Breakdown by all regions (all economy)",
            Breakdown::EconomyAggRegions => "Breakdown by aggregate regions (all economy)",
        }
    }

    fn groupings(self) -> (Grouping, Grouping) {
        use Grouping::*;
        match self {
            Breakdown::AllSectorsAllRegions => (All, All),
            Breakdown::AggSectorsAllRegions => (All, Aggregate),
            Breakdown::AggSectorsAggRegions => (Aggregate, Aggregate),
            Breakdown::AllSectorsWorld => (Single, All),
            Breakdown::AggSectorsWorld => (Single, Aggregate),
            Breakdown::EconomyAllRegions => (All, Single),
            Breakdown::EconomyAggRegions => (Aggregate, Single),
        }
    }

    /// Group a `(nr·ns) × nq` result.
    ///
    /// Parameters
    /// ----------
    /// - `values`: `&Array2<f64>`
    ///   Region-major rows (`region * ns + sector`).
    /// - `nr`, `ns`: `usize`
    /// - `ragg`: `&Aggregation`
    ///   Region grouping over `nr` members.
    /// - `sagg`: `&Aggregation`
    ///   Sector grouping over `ns` members.
    ///
    /// Returns
    /// -------
    /// `MrioResult<Array2<f64>>`
    ///   `(kr·ks) × nq`, rows region-major over the output groups.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `values`, `ragg` or `sagg` do
    ///   not match `nr` and `ns`.
    pub fn apply(
        self, values: &Array2<f64>, nr: usize, ns: usize, ragg: &Aggregation, sagg: &Aggregation,
    ) -> MrioResult<Array2<f64>> {
        if values.nrows() != nr * ns {
            return Err(MrioError::DimensionMismatch {
                matrix: "breakdown input",
                expected: (nr * ns, values.ncols()),
                found: values.dim(),
            });
        }
        if ragg.members() != nr || sagg.members() != ns {
            return Err(MrioError::DimensionMismatch {
                matrix: "breakdown grouping",
                expected: (nr, ns),
                found: (ragg.members(), sagg.members()),
            });
        }
        let (rg, sg) = self.groupings();
        let gr = grouping_matrix(rg, nr, ragg);
        let gs = grouping_matrix(sg, ns, sagg);
        let (kr, ks) = (gr.nrows(), gs.nrows());

        let nq = values.ncols();
        let mut out = Array2::<f64>::zeros((kr * ks, nq));
        let mut block = Array2::<f64>::zeros((nr, ns));
        for q in 0..nq {
            for (idx, v) in values.column(q).iter().enumerate() {
                block[[idx / ns, idx % ns]] = *v;
            }
            let grouped = gr.dot(&block).dot(&gs.t());
            for ((a, c), v) in grouped.indexed_iter() {
                out[[a * ks + c, q]] = *v;
            }
        }
        Ok(out)
    }

    /// `(region, sector)` keys of the rows produced by [`Breakdown::apply`].
    pub fn row_keys(
        self, regions: &[String], sectors: &[String], ragg: &Aggregation, sagg: &Aggregation,
    ) -> Vec<(String, String)> {
        let (rg, sg) = self.groupings();
        let rk = grouping_keys(rg, regions, ragg, WORLD);
        let sk = grouping_keys(sg, sectors, sagg, ALL_SECTORS);
        let mut keys = Vec::with_capacity(rk.len() * sk.len());
        for r in &rk {
            for s in &sk {
                keys.push((r.clone(), s.clone()));
            }
        }
        keys
    }
}

fn grouping_matrix(grouping: Grouping, n: usize, agg: &Aggregation) -> Array2<f64> {
    match grouping {
        Grouping::All => Array2::eye(n),
        Grouping::Aggregate => agg.g.clone(),
        Grouping::Single => Array2::ones((1, n)),
    }
}

fn grouping_keys(grouping: Grouping, members: &[String], agg: &Aggregation, single: &str) -> Vec<String> {
    match grouping {
        Grouping::All => members.to_vec(),
        Grouping::Aggregate => agg.groups.codes().map(str::to_string).collect(),
        Grouping::Single => vec![single.to_string()],
    }
}

/// Sum of each column; the same for every breakdown of one result.
pub fn column_totals(values: &Array2<f64>) -> ndarray::Array1<f64> {
    values.sum_axis(Axis(0))
}
