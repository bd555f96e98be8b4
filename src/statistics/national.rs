//! National accounts for the healthcare stimulus.
//!
//! Purpose
//! -------
//! Reduce the national statistics needed by the stimulus builder to three
//! numbers per consumption category: expenditure at purchaser prices, the
//! purchaser → basic price conversion factor, and reported direct
//! greenhouse-gas emissions.
//!
//! Key behaviors
//! -------------
//! - [`StatisticsCodes`] holds the table identifiers and dimension codes
//!   that select the relevant observations for one reference year.
//! - [`direct_emissions`] and [`care_expenditure`] select single
//!   observations from fetched tables.
//! - [`SupplyTable::conversion`] derives basic-price supply ÷ total supply
//!   for one product.
//! - [`ExpenditureTable::healthcare_totals`] sums COICOP-keyed columns of a
//!   national expenditure table into the three categories.
//! - [`NationalAccounts::from_statistics`] combines the pieces.
//!
//! Conventions
//! -----------
//! - Expenditure is in million euro, emissions in kilotonnes CO2-eq.
//! - Services expenditure from the care-function table is the total minus
//!   pharmaceuticals and appliances.
use serde::{Deserialize, Serialize};

use crate::statistics::{
    errors::{StatsError, StatsResult},
    odata::{Observation, select_value},
};

/// Observations of the sectoral greenhouse-gas emissions table.
pub const EMISSIONS_TABLE_URL: &str = "https://odata4.cbs.nl/CBS/83300NED/Observations";
/// Observations of the care expenditure by function table.
pub const EXPENDITURE_TABLE_URL: &str = "https://odata4.cbs.nl/CBS/84043NED/Observations";

/// Dimension and measure codes for one reference year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsCodes {
    /// Greenhouse-gas equivalent measure.
    pub emissions_measure: String,
    /// Economic activity code of the health and welfare sector.
    pub economy_code: String,
    /// Care function: total care and welfare expenditure.
    pub total_care: String,
    /// Care function: pharmaceuticals and medical consumables.
    pub pharmaceuticals: String,
    /// Care function: therapeutic appliances.
    pub appliances: String,
    /// Financing scheme: all schemes.
    pub financing: String,
    pub period: String,
}

impl StatisticsCodes {
    pub fn for_year(year: u16) -> StatisticsCodes {
        StatisticsCodes {
            emissions_measure: "M006309".to_string(),
            economy_code: "422400".to_string(),
            total_care: "T001104".to_string(),
            pharmaceuticals: "A019196".to_string(),
            appliances: "A019197".to_string(),
            financing: "T001103".to_string(),
            period: format!("{year}JJ00"),
        }
    }
}

/// Reported direct emissions of the health sector, kt CO2-eq.
pub fn direct_emissions(observations: &[Observation], codes: &StatisticsCodes) -> StatsResult<f64> {
    select_value(
        observations,
        &[
            ("Measure", codes.emissions_measure.as_str()),
            ("Perioden", codes.period.as_str()),
            ("NederlandseEconomie", codes.economy_code.as_str()),
        ],
    )
}

/// Expenditure per consumption category, million euro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CareExpenditure {
    pub services: f64,
    pub pharmaceuticals: f64,
    pub appliances: f64,
}

/// Care expenditure by function for the configured period.
pub fn care_expenditure(observations: &[Observation], codes: &StatisticsCodes) -> StatsResult<CareExpenditure> {
    let pick = |function: &str| {
        select_value(
            observations,
            &[
                ("Zorgfuncties", function),
                ("FinancieringsregelingenZorg", codes.financing.as_str()),
                ("Perioden", codes.period.as_str()),
            ],
        )
    };
    let total = pick(&codes.total_care)?;
    let pharmaceuticals = pick(&codes.pharmaceuticals)?;
    let appliances = pick(&codes.appliances)?;
    Ok(CareExpenditure { services: total - pharmaceuticals - appliances, pharmaceuticals, appliances })
}

/// Product rows of the national supply table used for price conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProducts {
    pub services: String,
    pub pharmaceuticals: String,
    pub appliances: String,
}

impl Default for ConversionProducts {
    fn default() -> Self {
        ConversionProducts {
            services: "Human health services".to_string(),
            pharmaceuticals: "Basic pharmaceutical products and preparations".to_string(),
            appliances: "Computer, electronic and optical products".to_string(),
        }
    }
}

/// `SupplyTable` — supply at basic prices and total supply per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyTable {
    products: Vec<String>,
    basic: Vec<f64>,
    total: Vec<f64>,
}

impl SupplyTable {
    pub fn new(products: Vec<String>, basic: Vec<f64>, total: Vec<f64>) -> StatsResult<Self> {
        for len in [basic.len(), total.len()] {
            if len != products.len() {
                return Err(StatsError::LengthMismatch {
                    table: "supply table",
                    expected: products.len(),
                    found: len,
                });
            }
        }
        Ok(SupplyTable { products, basic, total })
    }

    /// Basic-price supply ÷ total supply for `product`.
    ///
    /// Product names are compared after trimming surrounding whitespace.
    ///
    /// Errors
    /// ------
    /// - `StatsError::KeyNotFound` for unknown products.
    /// - `StatsError::InvalidConversion` when total supply is zero or the
    ///   ratio is not finite and positive.
    pub fn conversion(&self, product: &str) -> StatsResult<f64> {
        let key = product.trim();
        let i = self
            .products
            .iter()
            .position(|p| p.trim() == key)
            .ok_or_else(|| StatsError::KeyNotFound { table: "supply table", key: key.to_string() })?;
        let (basic, total) = (self.basic[i], self.total[i]);
        let ratio = basic / total;
        if total == 0.0 || !ratio.is_finite() || ratio <= 0.0 {
            return Err(StatsError::InvalidConversion { product: key.to_string(), basic, total });
        }
        Ok(ratio)
    }
}

/// Column key of a national expenditure table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureKey {
    pub transaction: String,
    pub category: String,
    pub coicop: String,
}

impl ExpenditureKey {
    pub fn new(transaction: &str, category: &str, coicop: &str) -> ExpenditureKey {
        ExpenditureKey {
            transaction: transaction.to_string(),
            category: category.to_string(),
            coicop: coicop.to_string(),
        }
    }
}

const HOUSEHOLD: &str = "Household consumption (Transaction code 3110)";
const GOV_MARKET: &str = "Marketed individual government consumption (Transaction code 3141)";
const GOV_NON_MARKET: &str = "Non-market individual government consumption (Transaction code 3142)";

/// Expenditure columns summed into each consumption category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthExpenditureKeys {
    pub services: Vec<ExpenditureKey>,
    pub pharmaceuticals: Vec<ExpenditureKey>,
    pub appliances: Vec<ExpenditureKey>,
}

impl Default for HealthExpenditureKeys {
    fn default() -> Self {
        const PHARMA: &str = "Pharmaceutical products and other medical products";
        const APPLIANCES: &str = "Therapeutic appliances and equipment";
        const OUTPATIENT: &str = "Out-patient services";
        const HOSPITAL: &str = "Hospital services";
        HealthExpenditureKeys {
            pharmaceuticals: vec![
                ExpenditureKey::new(HOUSEHOLD, PHARMA, "06112"),
                ExpenditureKey::new(GOV_MARKET, PHARMA, "06112"),
            ],
            appliances: vec![
                ExpenditureKey::new(HOUSEHOLD, APPLIANCES, "06130"),
                ExpenditureKey::new(GOV_MARKET, APPLIANCES, "06130"),
                ExpenditureKey::new(GOV_NON_MARKET, APPLIANCES, "06130"),
            ],
            services: vec![
                ExpenditureKey::new(HOUSEHOLD, OUTPATIENT, "06200"),
                ExpenditureKey::new(GOV_MARKET, OUTPATIENT, "06200"),
                ExpenditureKey::new(GOV_NON_MARKET, OUTPATIENT, "06200"),
                ExpenditureKey::new(HOUSEHOLD, HOSPITAL, "06300"),
                ExpenditureKey::new(GOV_NON_MARKET, HOSPITAL, "06300"),
            ],
        }
    }
}

/// `ExpenditureTable` — keyed columns of national expenditure.
///
/// Each column holds one or more rows (e.g. sub-items or years already
/// filtered by the loader); a column's contribution is the sum of its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenditureTable {
    pub keys: Vec<ExpenditureKey>,
    pub columns: Vec<Vec<f64>>,
}

impl ExpenditureTable {
    pub fn new(keys: Vec<ExpenditureKey>, columns: Vec<Vec<f64>>) -> StatsResult<Self> {
        if keys.len() != columns.len() {
            return Err(StatsError::LengthMismatch {
                table: "expenditure table",
                expected: keys.len(),
                found: columns.len(),
            });
        }
        Ok(ExpenditureTable { keys, columns })
    }

    /// Sum of all rows of the listed columns.
    ///
    /// Keys are matched after trimming every component.
    pub fn sum(&self, keys: &[ExpenditureKey]) -> StatsResult<f64> {
        keys.iter().try_fold(0.0, |acc, key| -> StatsResult<f64> {
            let i = self.keys.iter().position(|k| same_key(k, key)).ok_or_else(|| StatsError::KeyNotFound {
                table: "expenditure table",
                key: format!("{} / {} / {}", key.transaction, key.category, key.coicop),
            })?;
            Ok(acc + self.columns[i].iter().sum::<f64>())
        })
    }

    pub fn healthcare_totals(&self, keys: &HealthExpenditureKeys) -> StatsResult<CareExpenditure> {
        Ok(CareExpenditure {
            services: self.sum(&keys.services)?,
            pharmaceuticals: self.sum(&keys.pharmaceuticals)?,
            appliances: self.sum(&keys.appliances)?,
        })
    }
}

fn same_key(a: &ExpenditureKey, b: &ExpenditureKey) -> bool {
    a.transaction.trim() == b.transaction.trim()
        && a.category.trim() == b.category.trim()
        && a.coicop.trim() == b.coicop.trim()
}

/// Figures for one consumption category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryAccount {
    /// Expenditure at purchaser prices, million euro.
    pub expenditure: f64,
    /// Purchaser → basic price factor.
    pub conversion: f64,
    /// Reported direct emissions, kt CO2-eq.
    pub direct_emissions: f64,
}

/// `NationalAccounts` — the statistics consumed by the stimulus builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NationalAccounts {
    pub services: CategoryAccount,
    pub pharmaceuticals: CategoryAccount,
    pub appliances: CategoryAccount,
}

impl NationalAccounts {
    /// Combine expenditure, supply-table conversions, and direct emissions.
    ///
    /// Direct emissions are attributed to services only.
    pub fn from_statistics(
        expenditure: &CareExpenditure, supply: &SupplyTable, products: &ConversionProducts, direct_emissions: f64,
    ) -> StatsResult<Self> {
        Ok(NationalAccounts {
            services: CategoryAccount {
                expenditure: expenditure.services,
                conversion: supply.conversion(&products.services)?,
                direct_emissions,
            },
            pharmaceuticals: CategoryAccount {
                expenditure: expenditure.pharmaceuticals,
                conversion: supply.conversion(&products.pharmaceuticals)?,
                direct_emissions: 0.0,
            },
            appliances: CategoryAccount {
                expenditure: expenditure.appliances,
                conversion: supply.conversion(&products.appliances)?,
                direct_emissions: 0.0,
            },
        })
    }
}
