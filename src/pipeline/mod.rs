//! pipeline — staged construction of the footprint background.
//!
//! Purpose
//! -------
//! Run the background pipeline for one reference year as explicit stages,
//! each reading its inputs from an [`ArtifactStore`] and persisting its
//! output, so that a stage can be re-run without repeating earlier ones.
//!
//! Stages
//! ------
//! 1. [`Pipeline::prepare_mrio`]: raw tables + catalogs + indicator → `Mrio`.
//! 2. [`Pipeline::solve_leontief`]: `Mrio` → `LeontiefSystem`.
//! 3. [`Pipeline::process`]: `Mrio` + `LeontiefSystem` → `ProcessedMrio`.
//! 4. [`Pipeline::prepare_waste`]: waste supply table → `WasteExtension`.
//! 5. [`Pipeline::fetch_national_accounts`] (or
//!    [`Pipeline::store_national_accounts`]): national statistics →
//!    `NationalAccounts`.
//! 6. [`Pipeline::build_background`]: everything above → `Background`.
//!
//! Conventions
//! -----------
//! - Each stage logs its elapsed time at `info` level.
//! - A stage whose input artifact is absent fails with
//!   `PipelineError::MissingArtifact` naming the artifact.

pub mod errors;

use std::time::Instant;

use crate::{
    background::assembly::Background,
    config::PipelineConfig,
    mrio::{
        aggregation::Aggregation,
        characterization::IndicatorMatrix,
        labels::{Label, LabelSet},
        leontief::LeontiefSystem,
        system::{Mrio, ProcessedMrio, RawTables},
        waste::{WasteExtension, WasteTables, default_industry_aliases},
    },
    statistics::{
        national::{
            EMISSIONS_TABLE_URL, EXPENDITURE_TABLE_URL, NationalAccounts, StatisticsCodes, SupplyTable,
            care_expenditure, direct_emissions,
        },
        odata::{PageSource, fetch_all},
    },
    store::{
        artifact::{Artifact, ArtifactStore},
        json::JsonStore,
    },
};

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{PipelineError, PipelineResult};

/// `Pipeline` — stages bound to one configuration and one store.
#[derive(Debug, Clone)]
pub struct Pipeline<S: ArtifactStore> {
    config: PipelineConfig,
    store: S,
}

impl Pipeline<JsonStore> {
    /// Pipeline over a [`JsonStore`] rooted at `config.data_root`.
    ///
    /// Artifacts land in `data_root/<year>/<stem>.json`.
    ///
    /// Errors
    /// ------
    /// - As [`Pipeline::new`].
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let store = JsonStore::new(config.data_root.clone());
        Pipeline::new(config, store)
    }
}

impl<S: ArtifactStore> Pipeline<S> {
    /// Errors
    /// ------
    /// - `PipelineError::InvalidConfig` / `PipelineError::Stats` from
    ///   [`PipelineConfig::validate`].
    pub fn new(config: PipelineConfig, store: S) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Pipeline { config, store })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn year(&self) -> u16 {
        self.config.year
    }

    fn require<A: Artifact>(&self) -> PipelineResult<A> {
        if !self.store.contains(A::KIND, self.year()) {
            return Err(PipelineError::MissingArtifact { kind: A::KIND.stem(), year: self.year() });
        }
        Ok(self.store.load(self.year())?)
    }

    fn timed<T>(&self, stage: &str, f: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
        log::info!("Starting {stage} for {}", self.year());
        let start = Instant::now();
        let out = f()?;
        log::info!("Done {stage} in {:.2} s", start.elapsed().as_secs_f64());
        Ok(out)
    }

    /// Assemble and persist the MRIO tuple.
    pub fn prepare_mrio(
        &self, labels: LabelSet, tables: RawTables, indicator: IndicatorMatrix,
    ) -> PipelineResult<Mrio> {
        self.timed("preparing MRIO", || {
            let mrio = Mrio::assemble(labels, tables, indicator)?;
            self.store.save(self.year(), &mrio)?;
            Ok(mrio)
        })
    }

    /// Solve and persist the Leontief system of the stored MRIO.
    pub fn solve_leontief(&self) -> PipelineResult<LeontiefSystem> {
        let mrio: Mrio = self.require()?;
        self.timed("calculating Leontief inverse", || {
            let system = LeontiefSystem::solve(mrio.a)?;
            self.store.save(self.year(), &system)?;
            Ok(system)
        })
    }

    /// Derive and persist total output and transactions.
    pub fn process(&self) -> PipelineResult<ProcessedMrio> {
        let mrio: Mrio = self.require()?;
        let system: LeontiefSystem = self.require()?;
        self.timed("processing MRIO", || {
            let processed = mrio.process(&system)?;
            self.store.save(self.year(), &processed)?;
            Ok(processed)
        })
    }

    /// Map the waste supply table onto the stored catalogs.
    pub fn prepare_waste(&self, tables: &WasteTables) -> PipelineResult<WasteExtension> {
        let mrio: Mrio = self.require()?;
        self.timed("preparing waste extension", || {
            let waste = WasteExtension::from_tables(&mrio.labels, tables, &default_industry_aliases())?;
            self.store.save(self.year(), &waste)?;
            Ok(waste)
        })
    }

    /// Fetch emissions and care expenditure, combine them with the supply
    /// table, and persist the national accounts.
    ///
    /// Errors
    /// ------
    /// - `PipelineError::Stats` for transport, pagination, selection and
    ///   conversion failures.
    pub fn fetch_national_accounts<P: PageSource + ?Sized>(
        &self, source: &mut P, supply: &SupplyTable,
    ) -> PipelineResult<NationalAccounts> {
        self.timed("retrieving national statistics", || {
            let codes = StatisticsCodes::for_year(self.year());
            let policy = &self.config.fetch_policy;
            let emissions = direct_emissions(&fetch_all(&mut *source, EMISSIONS_TABLE_URL, policy)?, &codes)?;
            let expenditure = care_expenditure(&fetch_all(&mut *source, EXPENDITURE_TABLE_URL, policy)?, &codes)?;
            let accounts =
                NationalAccounts::from_statistics(&expenditure, supply, &self.config.conversion_products, emissions)?;
            self.store.save(self.year(), &accounts)?;
            Ok(accounts)
        })
    }

    /// Persist national accounts gathered elsewhere.
    pub fn store_national_accounts(&self, accounts: &NationalAccounts) -> PipelineResult<()> {
        Ok(self.store.save(self.year(), accounts)?)
    }

    /// Assemble and persist the background.
    ///
    /// Parameters
    /// ----------
    /// - `membership`: `&[Label]`
    ///   Region-group code and name for each region, in region catalog
    ///   order; grouped in the order of `config.region_groups`.
    pub fn build_background(&self, membership: &[Label]) -> PipelineResult<Background> {
        let processed: ProcessedMrio = self.require()?;
        let system: LeontiefSystem = self.require()?;
        let waste: WasteExtension = self.require()?;
        let accounts: NationalAccounts = self.require()?;
        self.timed("building background", || {
            let ragg = Aggregation::regions(&processed.mrio.labels.region, membership, &self.config.region_groups)?;
            let background =
                Background::assemble(&processed, system, &waste, &accounts, &self.config.anchors, ragg)?;
            self.store.save(self.year(), &background)?;
            Ok(background)
        })
    }

    /// Load the stored background of the configured year.
    pub fn background(&self) -> PipelineResult<Background> {
        self.require()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mrio::labels::LabelCatalog,
        statistics::{errors::StatsError, national::CategoryAccount},
        store::{artifact::ArtifactKind, json::JsonStore},
    };
    use ndarray::array;
    use serde_json::{Value, json};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Stage ordering: missing inputs are named.
    // - Persistence of each stage's output.
    // - National accounts from paginated observation pages.
    // - Artifact placement under the configured data root.
    // -------------------------------------------------------------------------

    fn pipeline(dir: &std::path::Path) -> Pipeline<JsonStore> {
        Pipeline::from_config(PipelineConfig::new(dir, 2016).unwrap()).unwrap()
    }

    fn supply() -> SupplyTable {
        SupplyTable::new(
            vec![
                "Human health services".into(),
                "Basic pharmaceutical products and preparations".into(),
                "Computer, electronic and optical products".into(),
            ],
            vec![99.0, 80.0, 60.0],
            vec![100.0, 100.0, 100.0],
        )
        .unwrap()
    }

    fn observation(fields: &[(&str, &str)], value: f64) -> Value {
        let mut row = serde_json::Map::new();
        for (k, v) in fields {
            row.insert(k.to_string(), json!(v));
        }
        row.insert("Value".into(), json!(value));
        Value::Object(row)
    }

    #[test]
    // Purpose
    // -------
    // Ensure a stage run before its inputs exist names the missing
    // artifact.
    //
    // Expect
    // ------
    // - `MissingArtifact { kind: "exio", year: 2016 }`.
    fn stage_without_inputs_reports_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();

        let err = pipeline(dir.path()).solve_leontief().unwrap_err();

        assert_eq!(err, PipelineError::MissingArtifact { kind: "exio", year: 2016 });
    }

    #[test]
    // Purpose
    // -------
    // Verify national accounts are assembled from paginated statistics and
    // persisted.
    //
    // Given
    // -----
    // - Emissions table: two pages, the matching row on the second.
    // - Expenditure table: total 100, pharmaceuticals 10, appliances 5.
    //
    // Expect
    // ------
    // - services expenditure 85, direct emissions 7.5, conversions
    //   0.99 / 0.8 / 0.6; the artifact is stored.
    fn fetch_national_accounts_combines_tables() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let codes = StatisticsCodes::for_year(2016);
        let emissions_p1 = json!({ "value": [], "@odata.nextLink": "emissions-2" });
        let emissions_p2 = json!({ "value": [observation(&[
            ("Measure", codes.emissions_measure.as_str()),
            ("Perioden", codes.period.as_str()),
            ("NederlandseEconomie", codes.economy_code.as_str()),
        ], 7.5)] });
        let care = |function: &str, value: f64| {
            observation(
                &[
                    ("Zorgfuncties", function),
                    ("FinancieringsregelingenZorg", codes.financing.as_str()),
                    ("Perioden", codes.period.as_str()),
                ],
                value,
            )
        };
        let expenditure = json!({ "value": [
            care(&codes.total_care, 100.0),
            care(&codes.pharmaceuticals, 10.0),
            care(&codes.appliances, 5.0),
        ] });
        let mut source = |url: &str| -> anyhow::Result<Value> {
            match url {
                EMISSIONS_TABLE_URL => Ok(emissions_p1.clone()),
                "emissions-2" => Ok(emissions_p2.clone()),
                EXPENDITURE_TABLE_URL => Ok(expenditure.clone()),
                other => anyhow::bail!("unexpected url {other}"),
            }
        };

        let accounts = p.fetch_national_accounts(&mut source, &supply()).unwrap();

        assert_eq!(accounts.services.expenditure, 85.0);
        assert_eq!(accounts.services.direct_emissions, 7.5);
        assert_eq!(accounts.pharmaceuticals.conversion, 0.8);
        assert_eq!(accounts.appliances.conversion, 0.6);
        assert!(p.store().contains(ArtifactKind::NationalAccounts, 2016));
    }

    #[test]
    // Purpose
    // -------
    // Ensure a failing transport surfaces as a statistics error after the
    // configured number of attempts.
    //
    // Expect
    // ------
    // - `PipelineError::Stats(Transport)` after 3 calls.
    fn fetch_national_accounts_reports_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let mut calls = 0;
        let mut source = |_: &str| -> anyhow::Result<Value> {
            calls += 1;
            anyhow::bail!("connection reset")
        };

        let err = p.fetch_national_accounts(&mut source, &supply()).unwrap_err();

        assert!(matches!(err, PipelineError::Stats(StatsError::Transport { .. })));
        assert_eq!(calls, 3);
    }

    #[test]
    // Purpose
    // -------
    // Verify the MRIO, Leontief and processing stages chain through the
    // store.
    //
    // Expect
    // ------
    // - x = L · rowsum(Y) in the processed artifact; all three stored.
    fn first_three_stages_chain_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let labels = LabelSet::new(
            LabelCatalog::from_codes("region", &["NL"]).unwrap(),
            LabelCatalog::from_codes("industry", &["A_HEAL", "A_CHEM"]).unwrap(),
            LabelCatalog::from_codes("final", &["HH"]).unwrap(),
            LabelCatalog::from_codes("primary", &["VA"]).unwrap(),
            LabelCatalog::from_codes("extension", &["VA", "CO2"]).unwrap(),
            LabelCatalog::from_codes("characterization", &["GWP"]).unwrap(),
        )
        .unwrap();
        let tables = RawTables {
            a: array![[0.1, 0.2], [0.0, 0.1]],
            y: array![[9.0], [18.0]],
            f: array![[1.0, 1.0], [5.0, 2.0]],
            f_hh: array![[0.0], [1.0]],
        };
        let indicator = IndicatorMatrix { categories: labels.characterization.clone(), q: array![[0.0, 1.0]] };

        p.prepare_mrio(labels, tables, indicator).unwrap();
        let system = p.solve_leontief().unwrap();
        let processed = p.process().unwrap();

        let expected = system.output_for(&array![9.0, 18.0]).unwrap();
        assert_eq!(processed.x, expected);
        for kind in [ArtifactKind::Mrio, ArtifactKind::Leontief, ArtifactKind::Processed] {
            assert!(p.store().contains(kind, 2016));
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify a pipeline built from configuration writes under the
    // configured data root.
    //
    // Given
    // -----
    // - `data_root` = <tmp>/footprint, year 2016.
    //
    // Expect
    // ------
    // - The store root is the data root.
    // - National accounts land in <tmp>/footprint/2016/national_accounts.json.
    fn from_config_writes_under_data_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("footprint");
        let p = Pipeline::from_config(PipelineConfig::new(&root, 2016).unwrap()).unwrap();
        let account = CategoryAccount { expenditure: 1.0, conversion: 1.0, direct_emissions: 0.0 };
        let accounts = NationalAccounts { services: account, pharmaceuticals: account, appliances: account };

        p.store_national_accounts(&accounts).unwrap();

        assert_eq!(p.store().root(), root.as_path());
        assert!(root.join("2016").join("national_accounts.json").is_file());
        assert_eq!(p.store().load::<NationalAccounts>(2016).unwrap(), accounts);
    }
}
