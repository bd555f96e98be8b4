//! statistics — national statistics feeding the healthcare stimulus.
//!
//! Purpose
//! -------
//! Collect the figures the stimulus builder needs from national sources:
//! paginated observation tables (care expenditure by function, sectoral
//! emissions), the national supply table (price-basis conversion), and
//! COICOP-keyed expenditure tables.
//!
//! Key behaviors
//! -------------
//! - [`odata`]: bounded pagination through a caller-supplied
//!   [`PageSource`] and single-observation selection.
//! - [`national`]: statistics codes, supply-table conversion, expenditure
//!   key sums, and [`NationalAccounts`].
//!
//! Conventions
//! -----------
//! - No HTTP client is bundled; callers implement [`PageSource`] over the
//!   transport of their choice.
//! - Errors are reported as [`StatsError`]; only transport failures are
//!   retried.

pub mod errors;
pub mod national;
pub mod odata;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{StatsError, StatsResult};
pub use self::national::{
    CareExpenditure, CategoryAccount, ConversionProducts, EMISSIONS_TABLE_URL, EXPENDITURE_TABLE_URL,
    ExpenditureKey, ExpenditureTable, HealthExpenditureKeys, NationalAccounts, StatisticsCodes, SupplyTable,
    care_expenditure, direct_emissions,
};
pub use self::odata::{FetchPolicy, Observation, PageSource, fetch_all, select_value};

pub mod prelude {
    pub use super::{
        CategoryAccount, FetchPolicy, NationalAccounts, Observation, PageSource, StatisticsCodes, StatsError,
        StatsResult, SupplyTable, fetch_all,
    };
}
