//! Label catalogs — ordered, indexed axes for every MRIO matrix.
//!
//! Purpose
//! -------
//! Provide the fixed, ordered catalogs (regions, industries, final-demand
//! categories, primary inputs, raw extensions, impact categories) that
//! index every matrix in the pipeline, together with stable integer
//! positions and a code → position lookup.
//!
//! Key behaviors
//! -------------
//! - [`LabelCatalog`] stores labels in order and rejects empty catalogs and
//!   duplicate codes at construction time.
//! - [`LabelCatalog::reindexed`] reorders a catalog to the row order found
//!   in raw tables, requiring an exact permutation.
//! - [`LabelSet`] bundles the six catalogs and maps (region, sector) and
//!   (region, final-demand category) pairs to flat indices.
//!
//! Invariants & assumptions
//! ------------------------
//! - Position `i` of a catalog is row/column `i` of every matrix indexed by
//!   it. Catalogs are never permuted after construction; reordering always
//!   produces a new catalog.
//! - Flat region×sector indices follow `region * ns + sector`; flat
//!   region×final-demand indices follow `region * ny + category`.
//!
//! Conventions
//! -----------
//! - Lookups by code return [`MrioError::LabelNotFound`] instead of a
//!   default position.
//! - Units are optional metadata on a label; only extension rows and impact
//!   categories carry them.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction guards, lookups, reindexing, order
//!   checks, flat-index helpers, and the serde round-trip that rebuilds the
//!   lookup map.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mrio::errors::{MrioError, MrioResult};

/// One catalog entry: a short code, a readable name, and an optional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub code: String,
    pub name: String,
    pub unit: Option<String>,
}

impl Label {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Label {
        Label { code: code.into(), name: name.into(), unit: None }
    }

    pub fn with_unit(code: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Label {
        Label { code: code.into(), name: name.into(), unit: Some(unit.into()) }
    }
}

/// `LabelCatalog` — ordered labels with a code → position index.
///
/// Purpose
/// -------
/// Replace multi-level labeled axes with an explicit catalog: integer
/// positions are the matrix indices, and codes resolve to positions through
/// a hash map built once at construction.
///
/// Fields
/// ------
/// - `kind`: `String`
///   Catalog name used in error messages (e.g. `"region"`).
/// - `labels`: `Vec<Label>`
///   Ordered entries; position `i` indexes row/column `i`.
/// - `index`: `HashMap<String, usize>`
///   Code → position map; rebuilt on deserialization.
///
/// Invariants
/// ----------
/// - `labels` is non-empty and codes are unique.
/// - `index[labels[i].code] == i` for all `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CatalogRecord", into = "CatalogRecord")]
pub struct LabelCatalog {
    kind: String,
    labels: Vec<Label>,
    index: HashMap<String, usize>,
}

impl PartialEq for LabelCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.labels == other.labels
    }
}

impl LabelCatalog {
    /// Construct a validated catalog.
    ///
    /// Errors
    /// ------
    /// - `MrioError::EmptyCatalog` when `labels` is empty.
    /// - `MrioError::DuplicateLabel` when a code appears twice.
    pub fn new(kind: impl Into<String>, labels: Vec<Label>) -> MrioResult<Self> {
        let kind = kind.into();
        if labels.is_empty() {
            return Err(MrioError::EmptyCatalog { catalog: kind });
        }
        let mut index = HashMap::with_capacity(labels.len());
        for (pos, label) in labels.iter().enumerate() {
            if index.insert(label.code.clone(), pos).is_some() {
                return Err(MrioError::DuplicateLabel { catalog: kind, code: label.code.clone() });
            }
        }
        Ok(LabelCatalog { kind, labels, index })
    }

    /// Catalog whose names equal its codes.
    pub fn from_codes<S: AsRef<str>>(kind: impl Into<String>, codes: &[S]) -> MrioResult<Self> {
        let labels = codes.iter().map(|c| Label::new(c.as_ref(), c.as_ref())).collect();
        LabelCatalog::new(kind, labels)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label at `pos`; panics if `pos` is out of range.
    pub fn label(&self, pos: usize) -> &Label {
        &self.labels[pos]
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.code.as_str())
    }

    /// Resolve a code to its position.
    ///
    /// Errors
    /// ------
    /// - `MrioError::LabelNotFound` when `code` is not in the catalog.
    pub fn position(&self, code: &str) -> MrioResult<usize> {
        self.index.get(code).copied().ok_or_else(|| MrioError::LabelNotFound {
            catalog: self.kind.clone(),
            code: code.to_string(),
        })
    }

    /// Resolve a code, falling back to a match on the readable name.
    pub fn position_by_code_or_name(&self, key: &str) -> MrioResult<usize> {
        self.position(key).or_else(|err| {
            self.labels.iter().position(|l| l.name == key).ok_or(err)
        })
    }

    /// Return a new catalog ordered as `order`.
    ///
    /// Parameters
    /// ----------
    /// - `order`: `&[S]`
    ///   Codes in the desired order; must contain every catalog code exactly
    ///   once.
    ///
    /// Errors
    /// ------
    /// - `MrioError::LabelNotFound` for codes not in the catalog.
    /// - `MrioError::InvalidPermutation` when `order` is shorter, longer, or
    ///   repeats a code.
    pub fn reindexed<S: AsRef<str>>(&self, order: &[S]) -> MrioResult<Self> {
        let mut seen = vec![false; self.len()];
        let mut labels = Vec::with_capacity(order.len());
        for code in order {
            let pos = self.position(code.as_ref())?;
            if seen[pos] {
                break;
            }
            seen[pos] = true;
            labels.push(self.labels[pos].clone());
        }
        if labels.len() != self.len() || order.len() != self.len() {
            return Err(MrioError::InvalidPermutation {
                catalog: self.kind.clone(),
                expected: self.len(),
                found: labels.len(),
            });
        }
        LabelCatalog::new(self.kind.clone(), labels)
    }

    /// Check that `observed` lists the catalog codes in catalog order.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when lengths differ.
    /// - `MrioError::LabelOrderMismatch` at the first disagreeing position.
    pub fn check_order<S: AsRef<str>>(&self, observed: &[S]) -> MrioResult<()> {
        if observed.len() != self.len() {
            return Err(MrioError::DimensionMismatch {
                matrix: "label order",
                expected: (self.len(), 1),
                found: (observed.len(), 1),
            });
        }
        for (position, (label, found)) in self.labels.iter().zip(observed).enumerate() {
            if label.code != found.as_ref() {
                return Err(MrioError::LabelOrderMismatch {
                    catalog: self.kind.clone(),
                    position,
                    expected: label.code.clone(),
                    found: found.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Append labels, returning a new catalog (used for the waste row).
    pub fn extended(&self, extra: Vec<Label>) -> MrioResult<Self> {
        let mut labels = self.labels.clone();
        labels.extend(extra);
        LabelCatalog::new(self.kind.clone(), labels)
    }

    /// Replace the unit of the label at `pos`, returning a new catalog.
    pub fn with_unit_at(&self, pos: usize, unit: &str) -> MrioResult<Self> {
        let mut labels = self.labels.clone();
        match labels.get_mut(pos) {
            Some(label) => label.unit = Some(unit.to_string()),
            None => {
                return Err(MrioError::RowOutOfRange {
                    table: self.kind.clone(),
                    row: pos,
                    len: self.len(),
                });
            }
        }
        LabelCatalog::new(self.kind.clone(), labels)
    }
}

/// Serialized form of a catalog; the index is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogRecord {
    kind: String,
    labels: Vec<Label>,
}

impl TryFrom<CatalogRecord> for LabelCatalog {
    type Error = MrioError;

    fn try_from(record: CatalogRecord) -> MrioResult<Self> {
        LabelCatalog::new(record.kind, record.labels)
    }
}

impl From<LabelCatalog> for CatalogRecord {
    fn from(catalog: LabelCatalog) -> Self {
        CatalogRecord { kind: catalog.kind, labels: catalog.labels }
    }
}

/// `LabelSet` — the six catalogs that index an MRIO system.
///
/// Fields
/// ------
/// - `region` (nr), `industry` (ns), `final_demand` (ny), `primary` (nv),
///   `extension` (ne), `characterization` (nq).
///
/// Invariants
/// ----------
/// - `primary` lists the first `nv` rows of `extension`; this is checked by
///   [`LabelSet::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSet {
    pub region: LabelCatalog,
    pub industry: LabelCatalog,
    pub final_demand: LabelCatalog,
    pub primary: LabelCatalog,
    pub extension: LabelCatalog,
    pub characterization: LabelCatalog,
}

impl LabelSet {
    /// Bundle catalogs after checking that primary inputs lead the
    /// extension rows.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `primary` is longer than
    ///   `extension`.
    /// - `MrioError::LabelOrderMismatch` when a primary code differs from the
    ///   extension code at the same position.
    pub fn new(
        region: LabelCatalog, industry: LabelCatalog, final_demand: LabelCatalog,
        primary: LabelCatalog, extension: LabelCatalog, characterization: LabelCatalog,
    ) -> MrioResult<Self> {
        if primary.len() > extension.len() {
            return Err(MrioError::DimensionMismatch {
                matrix: "primary inputs",
                expected: (extension.len(), 1),
                found: (primary.len(), 1),
            });
        }
        let leading: Vec<&str> = extension.codes().take(primary.len()).collect();
        primary.check_order(&leading)?;
        Ok(LabelSet { region, industry, final_demand, primary, extension, characterization })
    }

    pub fn nr(&self) -> usize {
        self.region.len()
    }

    pub fn ns(&self) -> usize {
        self.industry.len()
    }

    pub fn ny(&self) -> usize {
        self.final_demand.len()
    }

    pub fn nv(&self) -> usize {
        self.primary.len()
    }

    pub fn ne(&self) -> usize {
        self.extension.len()
    }

    pub fn nq(&self) -> usize {
        self.characterization.len()
    }

    /// Number of region×sector rows (`nr * ns`).
    pub fn n_sectors(&self) -> usize {
        self.nr() * self.ns()
    }

    /// Number of region×final-demand columns (`nr * ny`).
    pub fn n_demands(&self) -> usize {
        self.nr() * self.ny()
    }

    /// Flat index of (region, sector).
    pub fn sector_index(&self, region: &str, sector: &str) -> MrioResult<usize> {
        Ok(self.region.position(region)? * self.ns() + self.industry.position(sector)?)
    }

    /// Flat index of (region, final-demand category).
    pub fn demand_index(&self, region: &str, category: &str) -> MrioResult<usize> {
        Ok(self.region.position(region)? * self.ny() + self.final_demand.position(category)?)
    }

    /// (region code, sector code) for every flat sector index, in order.
    pub fn region_sector_keys(&self) -> Vec<(String, String)> {
        let mut keys = Vec::with_capacity(self.n_sectors());
        for region in self.region.labels() {
            for sector in self.industry.labels() {
                keys.push((region.code.clone(), sector.code.clone()));
            }
        }
        keys
    }

    /// Copy of the set with a different characterization catalog.
    pub fn with_characterization(&self, characterization: LabelCatalog) -> LabelSet {
        LabelSet { characterization, ..self.clone() }
    }
}
