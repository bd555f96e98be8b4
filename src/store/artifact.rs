//! Artifact kinds and the storage trait.
//!
//! Every stage of the pipeline persists one artifact per reference year.
//! An [`Artifact`] type names its [`ArtifactKind`] and re-checks its own
//! invariants after loading; an [`ArtifactStore`] maps `(kind, year)` to
//! bytes somewhere.
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    background::assembly::Background,
    mrio::{
        errors::MrioResult,
        leontief::LeontiefSystem,
        system::{Mrio, ProcessedMrio},
        waste::WasteExtension,
    },
    statistics::national::NationalAccounts,
};

/// Kind of a persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Assembled MRIO tuple.
    Mrio,
    /// `A` and `L`.
    Leontief,
    /// MRIO with `x` and `Z`.
    Processed,
    /// Waste extension vectors.
    Waste,
    /// National accounts for the stimulus.
    NationalAccounts,
    /// Footprint background.
    Background,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Mrio,
        ArtifactKind::Leontief,
        ArtifactKind::Processed,
        ArtifactKind::Waste,
        ArtifactKind::NationalAccounts,
        ArtifactKind::Background,
    ];

    /// File stem used by file-backed stores.
    pub fn stem(self) -> &'static str {
        match self {
            ArtifactKind::Mrio => "exio",
            ArtifactKind::Leontief => "leontief",
            ArtifactKind::Processed => "mrio",
            ArtifactKind::Waste => "waste",
            ArtifactKind::NationalAccounts => "national_accounts",
            ArtifactKind::Background => "background",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.stem())
    }
}

/// A value the pipeline persists between stages.
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    /// Re-check invariants that serde alone cannot guarantee.
    fn validate(&self) -> MrioResult<()> {
        Ok(())
    }
}

impl Artifact for Mrio {
    const KIND: ArtifactKind = ArtifactKind::Mrio;

    fn validate(&self) -> MrioResult<()> {
        Mrio::validate(self)
    }
}

// `LeontiefSystem` is checked by its `TryFrom` on deserialization.
impl Artifact for LeontiefSystem {
    const KIND: ArtifactKind = ArtifactKind::Leontief;
}

impl Artifact for ProcessedMrio {
    const KIND: ArtifactKind = ArtifactKind::Processed;

    fn validate(&self) -> MrioResult<()> {
        ProcessedMrio::validate(self)
    }
}

impl Artifact for WasteExtension {
    const KIND: ArtifactKind = ArtifactKind::Waste;
}

impl Artifact for NationalAccounts {
    const KIND: ArtifactKind = ArtifactKind::NationalAccounts;
}

impl Artifact for Background {
    const KIND: ArtifactKind = ArtifactKind::Background;

    fn validate(&self) -> MrioResult<()> {
        Background::validate(self)
    }
}

/// Storage addressed by `(kind, year)`.
pub trait ArtifactStore {
    /// Persist `artifact`, replacing any previous value for the same key.
    fn save<A: Artifact>(&self, year: u16, artifact: &A) -> MrioResult<()>;

    /// Load and validate an artifact.
    fn load<A: Artifact>(&self, year: u16) -> MrioResult<A>;

    fn contains(&self, kind: ArtifactKind, year: u16) -> bool;
}
