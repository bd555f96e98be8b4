//! Pipeline configuration.
//!
//! [`PipelineConfig`] replaces any reliance on the working directory: the
//! data root, the reference year and every domain anchor are explicit. All
//! fields have defaults, so a JSON file only needs the values it changes:
//!
//! ```json
//! { "data_root": "/data/footprint", "year": 2022 }
//! ```
//!
//! Defaults
//! --------
//! - `year`: 2022
//! - `anchors`: NL / A_HEAL / A_CHEM / A_MEDI / GWP
//! - `region_groups`: NL, WE, WA, WL, WM, WF
//! - `fetch_policy`: 1000 pages, 3 attempts per page
//! - `conversion_products`: supply-table rows for health services,
//!   pharmaceuticals and appliances
use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{
    background::stimulus::StimulusAnchors,
    mrio::aggregation::DEFAULT_REGION_GROUPS,
    pipeline::errors::{PipelineError, PipelineResult},
    statistics::{national::ConversionProducts, odata::FetchPolicy},
};

/// First and last reference years with published MRIO tables.
pub const YEAR_RANGE: (u16, u16) = (1995, 2030);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding one sub-directory of artifacts per year.
    pub data_root: PathBuf,
    pub year: u16,
    pub anchors: StimulusAnchors,
    /// Region-group codes in report order.
    pub region_groups: Vec<String>,
    pub fetch_policy: FetchPolicy,
    pub conversion_products: ConversionProducts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_root: PathBuf::from("data"),
            year: 2022,
            anchors: StimulusAnchors::default(),
            region_groups: DEFAULT_REGION_GROUPS.iter().map(|s| s.to_string()).collect(),
            fetch_policy: FetchPolicy::default(),
            conversion_products: ConversionProducts::default(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration for `year` under `data_root`.
    pub fn new(data_root: impl Into<PathBuf>, year: u16) -> PipelineResult<Self> {
        let config = PipelineConfig { data_root: data_root.into(), year, ..PipelineConfig::default() };
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    ///
    /// Errors
    /// ------
    /// - `PipelineError::ConfigFile` when the file cannot be read or parsed.
    /// - `PipelineError::InvalidConfig` from [`PipelineConfig::validate`].
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::ConfigFile {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        let config: PipelineConfig = serde_json::from_str(&text).map_err(|e| PipelineError::ConfigFile {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and non-empty anchors.
    pub fn validate(&self) -> PipelineResult<()> {
        let (first, last) = YEAR_RANGE;
        if !(first..=last).contains(&self.year) {
            return Err(PipelineError::InvalidConfig {
                field: "year",
                reason: format!("{} outside {first}..={last}", self.year),
            });
        }
        if self.region_groups.is_empty() {
            return Err(PipelineError::InvalidConfig { field: "region_groups", reason: "empty".into() });
        }
        let anchors = [
            ("anchors.country", &self.anchors.country),
            ("anchors.services_sector", &self.anchors.services_sector),
            ("anchors.pharmaceuticals_sector", &self.anchors.pharmaceuticals_sector),
            ("anchors.appliances_sector", &self.anchors.appliances_sector),
            ("anchors.global_warming", &self.anchors.global_warming),
        ];
        for (field, code) in anchors {
            if code.trim().is_empty() {
                return Err(PipelineError::InvalidConfig { field, reason: "empty code".into() });
            }
        }
        self.fetch_policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Defaults filled in for missing JSON fields.
    // - Range and anchor validation.
    // - Unreadable and malformed files.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify a partial JSON file keeps the defaults for omitted fields.
    //
    // Given
    // -----
    // - JSON with `year` and a custom services sector only.
    //
    // Expect
    // ------
    // - year 2019, services A_HOSP, country NL, six region groups.
    fn from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "year": 2019, "anchors": {{ "services_sector": "A_HOSP" }} }}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.year, 2019);
        assert_eq!(config.anchors.services_sector, "A_HOSP");
        assert_eq!(config.anchors.country, "NL");
        assert_eq!(config.region_groups.len(), 6);
        assert_eq!(config.fetch_policy, FetchPolicy::default());
    }

    #[test]
    // Purpose
    // -------
    // Ensure out-of-range years, empty anchors and zero fetch bounds are
    // rejected.
    //
    // Expect
    // ------
    // - `InvalidConfig` for year and country; `Stats` for the fetch policy.
    fn validate_rejects_bad_values() {
        let year = PipelineConfig { year: 1900, ..PipelineConfig::default() };
        let mut country = PipelineConfig::default();
        country.anchors.country = " ".into();
        let mut policy = PipelineConfig::default();
        policy.fetch_policy.max_pages = 0;

        assert!(matches!(year.validate(), Err(PipelineError::InvalidConfig { field: "year", .. })));
        assert!(matches!(country.validate(), Err(PipelineError::InvalidConfig { field: "anchors.country", .. })));
        assert!(matches!(policy.validate(), Err(PipelineError::Stats(_))));
    }

    #[test]
    // Purpose
    // -------
    // Ensure missing and malformed files surface as `ConfigFile`.
    //
    // Expect
    // ------
    // - `ConfigFile` in both cases.
    fn from_json_file_reports_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "{{ year: }}").unwrap();

        assert!(matches!(PipelineConfig::from_json_file(&missing), Err(PipelineError::ConfigFile { .. })));
        assert!(matches!(PipelineConfig::from_json_file(bad.path()), Err(PipelineError::ConfigFile { .. })));
    }
}
