//! Stimulus builder — healthcare-attributable final demand.
//!
//! Purpose
//! -------
//! Turn national accounts (expenditure, price-basis conversion, direct
//! emissions) into three stimulus matrices sharing one column layout
//! (total, services, pharmaceuticals, appliances):
//!
//! - `y`: demand on every region×sector (`nr·ns` rows),
//! - `h`: direct impacts per impact category (`nq` rows),
//! - `v`: primary inputs (`nv` rows).
//!
//! Key behaviors
//! -------------
//! - Services: the domestic health-services column of `Z` is scaled by
//!   `expenditure / x[health]`. This assumes expenditure and the sector's
//!   existing production recipe are proportional. The same factor scales
//!   the sector's primary inputs, and its direct impacts are
//!   `B[:, health] · expenditure`.
//! - Reported direct emissions replace (not add to) the modelled global
//!   warming impact of the services column.
//! - Pharmaceuticals and appliances: basic-price expenditure is spread over
//!   the producing regions of that product in proportion to the country's
//!   current final consumption from each region.
//!
//! Invariants & assumptions
//! ------------------------
//! - The total column of a [`StimulusMatrix`] is always the elementwise sum
//!   of its three component columns; it is never stored independently.
//! - A zero allocation base is a validation error, never a division by
//!   zero.
//!
//! Conventions
//! -----------
//! - Expenditure is in million euro, matching the monetary unit of `Z`.
//! - Direct emissions arrive in kt and are written in kg so that they
//!   share the unit of the characterized matrices until unit conversion.
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use serde::{Deserialize, Serialize};

use crate::{
    background::units::KT_TO_KG,
    mrio::{
        errors::{MrioError, MrioResult},
        labels::{LabelCatalog, LabelSet},
        system::ProcessedMrio,
    },
    statistics::national::{CategoryAccount, NationalAccounts},
};

/// Purchaser → basic price factor applied to services expenditure.
///
/// Services expenditure is used at purchaser prices. The supply-table
/// factor for human health services differs from one by about 0.38 %
/// ([`SERVICES_PRICE_BASIS_GAP`]); that gap is deliberately left out.
pub const SERVICES_PRICE_BASIS: f64 = 1.0;

/// Approximate relative gap left out by [`SERVICES_PRICE_BASIS`].
pub const SERVICES_PRICE_BASIS_GAP: f64 = 0.0038;

/// Column of a stimulus matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StimulusColumn {
    Total,
    Services,
    Pharmaceuticals,
    Appliances,
}

impl StimulusColumn {
    pub const ALL: [StimulusColumn; 4] = [
        StimulusColumn::Total,
        StimulusColumn::Services,
        StimulusColumn::Pharmaceuticals,
        StimulusColumn::Appliances,
    ];

    pub fn index(self) -> usize {
        match self {
            StimulusColumn::Total => 0,
            StimulusColumn::Services => 1,
            StimulusColumn::Pharmaceuticals => 2,
            StimulusColumn::Appliances => 3,
        }
    }

    /// File stem of the report for this column.
    pub fn file_stem(self) -> &'static str {
        match self {
            StimulusColumn::Total => "healthcare_total",
            StimulusColumn::Services => "healthcare_only",
            StimulusColumn::Pharmaceuticals => "pharmaceuticals",
            StimulusColumn::Appliances => "appliances",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StimulusColumn::Total => {
                "Healthcare combined with household purchases of pharmaceuticals and medical appliances"
            }
            StimulusColumn::Services => "Healthcare sector only",
            StimulusColumn::Pharmaceuticals => "Household purchases of pharmaceuticals",
            StimulusColumn::Appliances => "Household purchases of medical appliances",
        }
    }
}

/// `StimulusMatrix` — `n × 4` matrix whose total column is derived.
///
/// Columns follow [`StimulusColumn::index`]. Only the three component
/// columns are stored on disk; the total is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StimulusRecord", into = "StimulusRecord")]
pub struct StimulusMatrix {
    values: Array2<f64>,
}

#[derive(Serialize, Deserialize)]
struct StimulusRecord {
    components: Array2<f64>,
}

impl From<StimulusRecord> for StimulusMatrix {
    fn from(record: StimulusRecord) -> Self {
        StimulusMatrix::from_component_block(record.components)
    }
}

impl From<StimulusMatrix> for StimulusRecord {
    fn from(m: StimulusMatrix) -> Self {
        StimulusRecord { components: m.values.slice(s![.., 1..]).to_owned() }
    }
}

impl StimulusMatrix {
    /// Build from the three component columns.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when the columns differ in length.
    pub fn from_components(
        services: Array1<f64>, pharmaceuticals: Array1<f64>, appliances: Array1<f64>,
    ) -> MrioResult<Self> {
        let n = services.len();
        for col in [&pharmaceuticals, &appliances] {
            if col.len() != n {
                return Err(MrioError::DimensionMismatch {
                    matrix: "stimulus component",
                    expected: (n, 1),
                    found: (col.len(), 1),
                });
            }
        }
        let mut block = Array2::<f64>::zeros((n, 3));
        block.column_mut(0).assign(&services);
        block.column_mut(1).assign(&pharmaceuticals);
        block.column_mut(2).assign(&appliances);
        Ok(StimulusMatrix::from_component_block(block))
    }

    fn from_component_block(components: Array2<f64>) -> Self {
        let n = components.nrows();
        let mut values = Array2::<f64>::zeros((n, 4));
        values.slice_mut(s![.., 1..]).assign(&components);
        let mut m = StimulusMatrix { values };
        m.recompute_total();
        m
    }

    fn recompute_total(&mut self) {
        for mut row in self.values.rows_mut() {
            row[0] = row[1] + row[2] + row[3];
        }
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column(&self, col: StimulusColumn) -> ArrayView1<'_, f64> {
        self.values.column(col.index())
    }

    /// Copy with one component entry replaced and the total recomputed.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DerivedOverride` for the total column.
    /// - `MrioError::RowOutOfRange` for `row >= nrows()`.
    pub fn with_entry(&self, row: usize, col: StimulusColumn, value: f64) -> MrioResult<Self> {
        let mut out = self.clone();
        out.set_entry(row, col, value)?;
        Ok(out)
    }

    pub(crate) fn set_entry(&mut self, row: usize, col: StimulusColumn, value: f64) -> MrioResult<()> {
        if col == StimulusColumn::Total {
            return Err(MrioError::DerivedOverride { target: "stimulus total column".to_string() });
        }
        if row >= self.nrows() {
            return Err(MrioError::RowOutOfRange { table: "stimulus".to_string(), row, len: self.nrows() });
        }
        if !value.is_finite() {
            return Err(MrioError::NonFiniteEntry { matrix: "stimulus", row, col: col.index(), value });
        }
        self.values[[row, col.index()]] = value;
        self.values[[row, 0]] = self.values[[row, 1]] + self.values[[row, 2]] + self.values[[row, 3]];
        Ok(())
    }

    /// Multiply one row of every component by `factor`, keeping the total
    /// consistent.
    pub fn scale_row(&mut self, row: usize, factor: f64) {
        let mut r = self.values.row_mut(row);
        for j in 1..4 {
            r[j] *= factor;
        }
        r[0] = r[1] + r[2] + r[3];
    }

    /// Stimulus as an `n × 4` block; the caller owns the copy.
    pub fn to_array(&self) -> Array2<f64> {
        self.values.clone()
    }
}

/// Catalog codes locating the stimulus in the MRIO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusAnchors {
    /// Region whose healthcare consumption is modelled.
    pub country: String,
    /// Health and social work services.
    pub services_sector: String,
    /// Sector supplying pharmaceuticals.
    pub pharmaceuticals_sector: String,
    /// Sector supplying medical appliances.
    pub appliances_sector: String,
    /// Impact category receiving the reported direct emissions.
    pub global_warming: String,
}

impl Default for StimulusAnchors {
    fn default() -> Self {
        StimulusAnchors {
            country: "NL".to_string(),
            services_sector: "A_HEAL".to_string(),
            pharmaceuticals_sector: "A_CHEM".to_string(),
            appliances_sector: "A_MEDI".to_string(),
            global_warming: "GWP".to_string(),
        }
    }
}

/// The three stimulus matrices of one analysis year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub y: StimulusMatrix,
    pub h: StimulusMatrix,
    pub v: StimulusMatrix,
}

/// Build the stimulus from processed MRIO data and national accounts.
///
/// Parameters
/// ----------
/// - `processed`: `&ProcessedMrio`
///   Supplies `x`, `Z`, `Y`, `V` and the catalogs.
/// - `b`: `&Array2<f64>`
///   Characterized per-unit-output impacts (`nq × nr·ns`), in source units.
/// - `categories`: `&LabelCatalog`
///   Row catalog of `b`.
/// - `accounts`: `&NationalAccounts`
/// - `anchors`: `&StimulusAnchors`
///
/// Returns
/// -------
/// `MrioResult<Stimulus>`
///
/// Errors
/// ------
/// - `MrioError::LabelNotFound` for unknown anchor codes.
/// - `MrioError::InvalidFactor` for negative or non-finite expenditure,
///   non-positive conversion factors, or a zero health-services output.
/// - `MrioError::ZeroAllocationBase` when the country consumes nothing of
///   a product category.
/// - `MrioError::DimensionMismatch` when `b` does not match the catalogs.
pub fn build_stimulus(
    processed: &ProcessedMrio, b: &Array2<f64>, categories: &LabelCatalog, accounts: &NationalAccounts,
    anchors: &StimulusAnchors,
) -> MrioResult<Stimulus> {
    let labels = &processed.mrio.labels;
    let n = labels.n_sectors();
    if b.dim() != (categories.len(), n) {
        return Err(MrioError::DimensionMismatch { matrix: "B", expected: (categories.len(), n), found: b.dim() });
    }
    let health = labels.sector_index(&anchors.country, &anchors.services_sector)?;
    let gwp = categories.position(&anchors.global_warming)?;

    // Services: scale the health sector's inputs to reported expenditure.
    let services = checked_account("services", &accounts.services)?;
    let expenditure = services.expenditure * SERVICES_PRICE_BASIS;
    let output = processed.x[health];
    let scale = expenditure / output;
    if output <= 0.0 || !scale.is_finite() {
        return Err(MrioError::InvalidFactor { name: format!("output of {}", anchors.services_sector), value: output });
    }
    let y_services = processed.z.column(health).mapv(|v| v * scale);
    let v_services = processed.mrio.v.column(health).mapv(|v| v * scale);
    let mut h_services = b.column(health).mapv(|v| v * (output * scale));
    h_services[gwp] = services.direct_emissions * KT_TO_KG;

    // Goods: spread basic-price expenditure over producing regions.
    let pharma = checked_account("pharmaceuticals", &accounts.pharmaceuticals)?;
    let appliances = checked_account("appliances", &accounts.appliances)?;
    let y_pharma = import_shares(labels, &processed.mrio.y, &anchors.country, &anchors.pharmaceuticals_sector)?
        * (pharma.expenditure * pharma.conversion);
    let y_appliances = import_shares(labels, &processed.mrio.y, &anchors.country, &anchors.appliances_sector)?
        * (appliances.expenditure * appliances.conversion);

    let nq = categories.len();
    let nv = labels.nv();
    log::debug!("Stimulus scale factor for {} is {scale}", anchors.services_sector);
    Ok(Stimulus {
        y: StimulusMatrix::from_components(y_services, y_pharma, y_appliances)?,
        h: StimulusMatrix::from_components(h_services, Array1::zeros(nq), Array1::zeros(nq))?,
        v: StimulusMatrix::from_components(v_services, Array1::zeros(nv), Array1::zeros(nv))?,
    })
}

fn checked_account<'a>(name: &str, account: &'a CategoryAccount) -> MrioResult<&'a CategoryAccount> {
    if !account.expenditure.is_finite() || account.expenditure < 0.0 {
        return Err(MrioError::InvalidFactor { name: format!("{name} expenditure"), value: account.expenditure });
    }
    if !account.conversion.is_finite() || account.conversion <= 0.0 {
        return Err(MrioError::InvalidFactor { name: format!("{name} conversion"), value: account.conversion });
    }
    if !account.direct_emissions.is_finite() {
        return Err(MrioError::InvalidFactor {
            name: format!("{name} direct emissions"),
            value: account.direct_emissions,
        });
    }
    Ok(account)
}

/// Share of each region in `country`'s final consumption of `sector`.
///
/// Returns an `nr·ns` vector that is zero except at `(r, sector)` for every
/// region `r`; those entries sum to one.
///
/// Errors
/// ------
/// - `MrioError::LabelNotFound` for unknown codes.
/// - `MrioError::ZeroAllocationBase` when the consumption sums to zero.
pub fn import_shares(labels: &LabelSet, y: &Array2<f64>, country: &str, sector: &str) -> MrioResult<Array1<f64>> {
    let (ns, ny) = (labels.ns(), labels.ny());
    let c = labels.region.position(country)?;
    let k = labels.industry.position(sector)?;
    let consumption = y.slice(s![.., c * ny..(c + 1) * ny]).sum_axis(Axis(1));
    let base: Array1<f64> = (0..labels.nr()).map(|r| consumption[r * ns + k]).collect();
    let total = base.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(MrioError::ZeroAllocationBase { category: sector.to_string() });
    }
    let mut shares = Array1::<f64>::zeros(labels.n_sectors());
    for (r, v) in base.iter().enumerate() {
        shares[r * ns + k] = v / total;
    }
    Ok(shares)
}
